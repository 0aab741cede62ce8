//! Runtime configuration for the server and CLI
//!
//! Every option can come from a flag or an environment variable, so the
//! server runs the same way from a shell, a container or a test.

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::server::auth::Credentials;

pub const DEFAULT_EMBEDDING_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Which case store backend the server opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreKind {
  /// Process-local store, lost on shutdown
  #[default]
  Memory,
  /// LanceDB table on disk (needs the `lancedb` feature)
  Lancedb,
}

/// Remote embedding provider settings
#[derive(Debug, Clone, Args)]
pub struct EmbeddingConfig {
  /// API key for the OpenAI-compatible embeddings endpoint
  #[arg(long = "embedding-api-key", env = "OPENROUTER_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// Base URL of the embeddings API
  #[arg(long = "embedding-url", env = "CASEBOOK_EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL)]
  pub base_url: String,

  /// Embedding model name
  #[arg(long = "embedding-model", env = "CASEBOOK_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
  pub model: String,

  /// Transport timeout for a single embedding request
  #[arg(long = "embedding-timeout-secs", env = "CASEBOOK_EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
  pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_EMBEDDING_URL.to_string(),
      model: DEFAULT_EMBEDDING_MODEL.to_string(),
      timeout_secs: 30,
    }
  }
}

/// Everything the REST server needs to start
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
  /// Server bind address
  #[arg(long, env = "CASEBOOK_BIND", default_value = "127.0.0.1:8000")]
  pub bind: SocketAddr,

  /// Case store backend
  #[arg(long, env = "CASEBOOK_STORE", value_enum, default_value_t = StoreKind::Memory)]
  pub store: StoreKind,

  /// Directory for store data and server logs (defaults to ~/.casebook/data)
  #[arg(long, env = "CASEBOOK_DATA_DIR")]
  pub data_dir: Option<PathBuf>,

  /// Username accepted by Basic authentication
  #[arg(long = "api-username", env = "API_USERNAME")]
  pub api_username: Option<String>,

  /// Password accepted by Basic authentication
  #[arg(long = "api-password", env = "API_PASSWORD", hide_env_values = true)]
  pub api_password: Option<String>,

  #[command(flatten)]
  pub embedding: EmbeddingConfig,
}

impl ServerConfig {
  /// Resolve the data directory, falling back to the casebook home
  pub fn data_dir(&self) -> Result<PathBuf> {
    match &self.data_dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(get_base()?.join("data")),
    }
  }

  /// Basic auth credentials, if both halves are configured
  pub fn credentials(&self) -> Option<Credentials> {
    match (&self.api_username, &self.api_password) {
      (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
        Some(Credentials::new(username, password))
      }
      _ => None,
    }
  }
}

/// Casebook home: `$CASEBOOK_HOME` or `~/.casebook`
pub fn get_base() -> Result<PathBuf> {
  if let Ok(dir) = env::var("CASEBOOK_HOME") {
    return Ok(PathBuf::from(dir));
  }

  dirs::home_dir()
    .map(|home| home.join(".casebook"))
    .ok_or_else(|| anyhow!("Could not determine home directory; set CASEBOOK_HOME"))
}
