//! Reference cases used to bootstrap an empty knowledge base

use anyhow::{anyhow, Result};

use crate::server::models::case::NewCase;

const REFERENCE_CASES: &str = include_str!("../../data/reference_cases.json");

/// The bundled reference cases, in insertion order
pub fn reference_cases() -> Result<Vec<NewCase>> {
  serde_json::from_str(REFERENCE_CASES).map_err(|e| anyhow!("Bundled reference cases are invalid: {e}"))
}
