//! REST API module for the casebook service
//!
//! HTTP endpoints over the retrieval engine. Uses axum for routing and
//! schemars for OpenAPI documentation generation.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routing;
pub mod services;
pub mod startup;
pub mod state;
pub mod types;
