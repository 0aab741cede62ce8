//! REST server startup and configuration

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::serve;
use bentley::daemon_logs::DaemonLogs;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{ServerConfig, StoreKind};
use crate::server::errors::StoreError;
use crate::server::models::case::{Case, NewCase};
use crate::server::routing::create_router;
use crate::server::services::case_store::{CaseQuery, CaseStore};
use crate::server::services::embeddings::EmbeddingAdapter;
use crate::server::services::memory_store::MemoryCaseStore;
use crate::server::services::retrieval::RetrievalEngine;
use crate::server::state::AppState;

const COMPONENT: &str = "casebook-server";

/// Open the configured case store backend
pub async fn open_store(kind: StoreKind, data_dir: &Path) -> Result<Arc<dyn CaseStore>> {
  match kind {
    StoreKind::Memory => Ok(Arc::new(MemoryCaseStore::new())),
    #[cfg(feature = "lancedb")]
    StoreKind::Lancedb => {
      let store = crate::server::services::lancedb::LanceDbCaseStore::open(data_dir).await?;
      Ok(Arc::new(store))
    }
    #[cfg(not(feature = "lancedb"))]
    StoreKind::Lancedb => Err(anyhow!(
      "LanceDB store requested for {} but casebook was built without the `lancedb` feature",
      data_dir.display()
    )),
  }
}

/// Stands in for a backend that failed to open; every call reports why
struct UnavailableStore {
  reason: String,
}

impl UnavailableStore {
  fn error(&self) -> StoreError {
    StoreError::connection(self.reason.clone())
  }
}

#[async_trait]
impl CaseStore for UnavailableStore {
  async fn insert(&self, _new_case: NewCase, _embedding: Option<Vec<f32>>) -> Result<Case, StoreError> {
    Err(self.error())
  }

  async fn fetch(&self, _query: &CaseQuery) -> Result<Vec<Case>, StoreError> {
    Err(self.error())
  }

  async fn get(&self, _id: i64) -> Result<Option<Case>, StoreError> {
    Err(self.error())
  }

  async fn count(&self) -> Result<usize, StoreError> {
    Err(self.error())
  }

  async fn health(&self) -> Result<(), StoreError> {
    Err(self.error())
  }
}

/// Probe the store once and log the outcome; serving continues either way
pub async fn startup_diagnostics(store: &dyn CaseStore, logs: &DaemonLogs) {
  match store.health().await {
    Ok(()) => {
      let count = store.count().await.unwrap_or(0);
      logs.success(&format!("Case store reachable ({count} case(s) stored)"), COMPONENT).await;
    }
    Err(e) => {
      logs.error(&format!("CRITICAL: case store is not reachable: {e}"), COMPONENT).await;
    }
  }
}

/// Wire the engine, logger and credentials together
pub async fn build_state(config: &ServerConfig, logs: Arc<DaemonLogs>) -> Result<AppState> {
  let data_dir = config.data_dir()?;
  let store = match open_store(config.store, &data_dir).await {
    Ok(store) => store,
    Err(e) => {
      logs.error(&format!("CRITICAL: failed to open the {:?} case store: {e}", config.store), COMPONENT).await;
      Arc::new(UnavailableStore { reason: e.to_string() })
    }
  };
  startup_diagnostics(store.as_ref(), &logs).await;

  let embeddings = Arc::new(EmbeddingAdapter::from_config(&config.embedding));
  let engine = RetrievalEngine::new(embeddings, store);

  let credentials = config.credentials();
  if credentials.is_none() {
    logs
      .warn("API_USERNAME / API_PASSWORD are not set; protected routes will answer 500", COMPONENT)
      .await;
  }

  Ok(AppState::new(engine, logs, credentials))
}

/// Start the REST server and run until ctrl-c
pub async fn start_server(config: ServerConfig) -> Result<()> {
  let logs_path = config.data_dir()?.join("logs").join("server.logs.jsonl");
  let daemon_logs = Arc::new(DaemonLogs::new(&logs_path)?);

  daemon_logs.info(&format!("Starting casebook REST server on {}", config.bind), COMPONENT).await;

  let state = build_state(&config, daemon_logs.clone()).await?;
  let app = create_router(state)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(config.bind).await?;
  daemon_logs.info(&format!("Server listening on {}", config.bind), COMPONENT).await;

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(()) => {
      daemon_logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      daemon_logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow!("Server error: {e}"))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    bentley::error!("Failed to listen for shutdown signal: {e}");
  }
}
