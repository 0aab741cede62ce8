//! Persistent daemon logs
//!
//! Structured log storage for long-running services:
//! - JSONL on disk, one entry per line, append only
//! - Safe to share across tasks (writes are serialized internally)
//! - Optional echo to the `tracing` pipeline (silent mode turns it off)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

// Types and Data Structures
// =========================

/// Severity recorded with every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Verbose,
  Info,
  Success,
  Warn,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Level::Verbose => "verbose",
      Level::Info => "info",
      Level::Success => "success",
      Level::Warn => "warn",
      Level::Error => "error",
    };
    f.write_str(name)
  }
}

impl FromStr for Level {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "verbose" => Ok(Level::Verbose),
      "info" => Ok(Level::Info),
      "success" => Ok(Level::Success),
      "warn" | "warning" => Ok(Level::Warn),
      "error" => Ok(Level::Error),
      other => Err(format!("unknown log level '{other}'")),
    }
  }
}

/// Request context information for logs
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  /// Request ID for correlation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  /// HTTP method
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  /// Request path
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  /// User agent
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_agent: Option<String>,

  /// Request duration in milliseconds
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,

  /// HTTP status code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
}

/// A structured log entry
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: Level,
  pub message: String,
  pub component: String,

  /// Optional request context
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

/// Filter for reading entries back
#[derive(Debug, Clone, Copy, Default)]
pub struct LogQuery {
  /// Keep only the newest `limit` entries
  pub limit: Option<usize>,
  /// Keep only entries of this level
  pub level: Option<Level>,
}

/// Thread-safe disk-based log storage using JSONL format
#[derive(Clone)]
pub struct DaemonLogs {
  path: Arc<PathBuf>,
  silent: bool,
  write_lock: Arc<tokio::sync::Mutex<()>>,
}

// Core API
// ========

impl DaemonLogs {
  /// Open (or create) log storage at the given file path
  pub fn new<P: AsRef<Path>>(log_file_path: P) -> std::io::Result<Self> {
    Self::new_with_silent(log_file_path, false)
  }

  /// Open log storage that never echoes to the tracing pipeline
  pub fn new_with_silent<P: AsRef<Path>>(log_file_path: P, silent: bool) -> std::io::Result<Self> {
    let path = log_file_path.as_ref().to_path_buf();

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    // Touch without truncating
    OpenOptions::new().create(true).append(true).open(&path)?;

    Ok(Self { path: Arc::new(path), silent, write_lock: Arc::new(tokio::sync::Mutex::new(())) })
  }

  /// Path of the backing JSONL file
  pub fn log_file_path(&self) -> &Path {
    &self.path
  }

  /// Append one entry to disk
  pub async fn append(
    &self,
    level: Level,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level,
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    let json_line = serde_json::to_string(&entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let _guard = self.write_lock.lock().await;
    let mut file = OpenOptions::new().create(true).append(true).open(self.path.as_ref())?;
    writeln!(file, "{json_line}")?;
    file.flush()
  }

  /// Append and echo, ignoring disk errors
  pub async fn log(&self, level: Level, message: &str, component: &str, context: Option<LogContext>) {
    let _ = self.append(level, message, component, context).await;

    if !self.silent {
      echo(level, message);
    }
  }

  /// Read entries back, oldest first, after applying the query
  pub async fn get_logs(&self, query: LogQuery) -> std::io::Result<Vec<LogEntry>> {
    let _guard = self.write_lock.lock().await;
    read_entries(&self.path, query)
  }

  /// Check if the log file has any content
  pub fn has_logs(&self) -> bool {
    std::fs::metadata(self.path.as_ref()).map(|m| m.len() > 0).unwrap_or(false)
  }
}

// Standard Logging Wrappers
// =========================

#[cfg(not(tarpaulin_include))]
impl DaemonLogs {
  pub async fn info(&self, message: &str, component: &str) {
    self.log(Level::Info, message, component, None).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    self.log(Level::Success, message, component, None).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    self.log(Level::Warn, message, component, None).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.log(Level::Error, message, component, None).await;
  }

  pub async fn verbose(&self, message: &str, component: &str) {
    self.log(Level::Verbose, message, component, None).await;
  }
}

fn echo(level: Level, message: &str) {
  match level {
    Level::Verbose => crate::verbose(message),
    Level::Info => crate::info(message),
    Level::Success => crate::success(message),
    Level::Warn => crate::warn(message),
    Level::Error => crate::error(message),
  }
}

fn read_entries(path: &Path, query: LogQuery) -> std::io::Result<Vec<LogEntry>> {
  if !path.exists() {
    return Ok(Vec::new());
  }

  let reader = BufReader::new(File::open(path)?);
  let mut entries = Vec::new();

  for line in reader.lines() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }

    // Malformed lines are skipped
    let Ok(entry) = serde_json::from_str::<LogEntry>(&line) else {
      continue;
    };

    if query.level.map_or(true, |level| entry.level == level) {
      entries.push(entry);
    }
  }

  if let Some(limit) = query.limit {
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
  }

  Ok(entries)
}

// Tests
// =====
