use bentley::daemon_logs::DaemonLogs;
use std::sync::Arc;

use crate::server::auth::Credentials;
use crate::server::services::retrieval::RetrievalEngine;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
  pub engine: RetrievalEngine,
  pub logs: Arc<DaemonLogs>,
  pub credentials: Option<Credentials>,
}

impl AppState {
  pub fn new(engine: RetrievalEngine, logs: Arc<DaemonLogs>, credentials: Option<Credentials>) -> Self {
    Self { engine, logs, credentials }
  }
}
