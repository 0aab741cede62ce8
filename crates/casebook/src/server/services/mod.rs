pub mod case_store;
pub mod embeddings;
pub mod memory_store;
pub mod retrieval;

#[cfg(feature = "lancedb")]
pub mod lancedb;
