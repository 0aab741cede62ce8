//! Database connection management for LanceDB

use lancedb::{connect, Connection};
use std::path::Path;

use crate::server::errors::StoreError;

/// Open a LanceDB connection, creating the data directory if needed
pub async fn create_connection(data_dir: &Path) -> Result<Connection, StoreError> {
  std::fs::create_dir_all(data_dir)
    .map_err(|e| StoreError::connection(format!("Failed to create data directory: {e}")))?;

  connect(&data_dir.to_string_lossy())
    .execute()
    .await
    .map_err(|e| StoreError::connection(format!("Failed to connect to LanceDB: {e}")))
}
