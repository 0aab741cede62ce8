//! Error taxonomy for ingestion and retrieval
//!
//! Only two categories ever reach a caller: validation failures and
//! persistence failures. Embedding provider trouble is absorbed by the
//! embedding adapter and never shows up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
  #[error("Validation failed: {message}")]
  Validation { message: String },

  #[error("Persistence failed: {0}")]
  Persistence(#[from] StoreError),
}

impl CaseError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation { message: message.into() }
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. })
  }

  pub fn is_persistence(&self) -> bool {
    matches!(self, Self::Persistence(_))
  }
}

/// Failures raised by a case store backend
#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Store connection failed: {message}")]
  Connection { message: String },

  #[error("Store constraint violated: {message}")]
  Constraint { message: String },

  #[error("Store backend error: {message}")]
  Backend { message: String },
}

impl StoreError {
  pub fn connection(message: impl Into<String>) -> Self {
    Self::Connection { message: message.into() }
  }

  pub fn constraint(message: impl Into<String>) -> Self {
    Self::Constraint { message: message.into() }
  }

  pub fn backend(message: impl Into<String>) -> Self {
    Self::Backend { message: message.into() }
  }
}
