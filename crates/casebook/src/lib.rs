//! Casebook - diagnostic vehicle case knowledge base
//!
//! Workshops record faults and their fixes as cases. Cases are embedded on
//! ingestion and retrieved by hybrid search: cosine similarity when the
//! embedding provider answers, substring matching when it does not.

pub mod cli;
pub mod config;
pub mod server;
