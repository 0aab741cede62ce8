//! Retrieval engine: ingestion and hybrid search
//!
//! Every search goes through the same state machine:
//! embed the query text, then take exactly one of two paths.
//! - semantic: cosine ordering, at most [`SEMANTIC_LIMIT`] results, score [`SEMANTIC_SCORE`]
//! - lexical: substring relevance, at most [`LEXICAL_LIMIT`] results, score [`LEXICAL_SCORE`]
//!
//! The query filters apply on both paths. The path is chosen once and never retried.

use chrono::{Datelike, Utc};
use std::sync::Arc;

use super::case_store::{CaseFilters, CaseQuery, CaseStore};
use super::embeddings::EmbeddingProvider;
use crate::server::errors::CaseError;
use crate::server::models::case::{
  embedding_source_text, validate_new_case, Case, ConstructionGroup, NewCase, SearchQuery,
  SearchResult,
};

pub const SEMANTIC_LIMIT: usize = 5;
pub const SEMANTIC_SCORE: f32 = 0.9;
pub const LEXICAL_LIMIT: usize = 10;
pub const LEXICAL_SCORE: f32 = 0.5;

/// Ranking path taken by a single search call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
  Semantic(Vec<f32>),
  Lexical,
}

impl SearchPath {
  pub fn limit(&self) -> usize {
    match self {
      SearchPath::Semantic(_) => SEMANTIC_LIMIT,
      SearchPath::Lexical => LEXICAL_LIMIT,
    }
  }

  pub fn score(&self) -> f32 {
    match self {
      SearchPath::Semantic(_) => SEMANTIC_SCORE,
      SearchPath::Lexical => LEXICAL_SCORE,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      SearchPath::Semantic(_) => "semantic",
      SearchPath::Lexical => "lexical",
    }
  }
}

#[derive(Clone)]
pub struct RetrievalEngine {
  embeddings: Arc<dyn EmbeddingProvider>,
  store: Arc<dyn CaseStore>,
}

impl RetrievalEngine {
  pub fn new(embeddings: Arc<dyn EmbeddingProvider>, store: Arc<dyn CaseStore>) -> Self {
    Self { embeddings, store }
  }

  /// Validate, embed and persist a new case
  ///
  /// Embedding unavailability never fails ingestion; the case is stored without one.
  pub async fn create_case(&self, input: NewCase) -> Result<Case, CaseError> {
    self.create_case_in_year(input, Utc::now().year()).await
  }

  /// Same as [`create_case`](Self::create_case) with an explicit current year
  pub async fn create_case_in_year(&self, input: NewCase, current_year: i32) -> Result<Case, CaseError> {
    validate_new_case(&input, current_year)?;

    let source = embedding_source_text(&input.problem_description, &input.solution_description);
    let embedding = self.embeddings.embed(&source).await;
    if embedding.is_none() {
      bentley::verbose!("Storing case '{}' without an embedding", input.title);
    }

    let case = self.store.insert(input, embedding).await?;
    bentley::info!("Created case {} ({} {})", case.id, case.vehicle_model, case.year);
    Ok(case)
  }

  /// Hybrid search over stored cases; an empty list is a normal outcome
  pub async fn search_cases(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, CaseError> {
    let path = match self.embeddings.embed(&query.text).await {
      Some(vector) => SearchPath::Semantic(vector),
      None => SearchPath::Lexical,
    };

    let base = CaseQuery::scan(CaseFilters {
      vehicle_model: query.model_filter.clone().filter(|model| !model.trim().is_empty()),
      construction_group: query.construction_group,
    });

    let limit = path.limit();
    let score = path.score();
    let mode = path.name();
    let store_query = match path {
      SearchPath::Semantic(vector) => base.order_by_distance(vector),
      SearchPath::Lexical => base.order_by_relevance(query.text.trim()),
    }
    .limit(limit);

    let cases = self.store.fetch(&store_query).await?;
    bentley::verbose!("Search '{}' took the {mode} path: {} result(s)", query.text, cases.len());

    Ok(cases.into_iter().map(|case| SearchResult::from_case(case, score)).collect())
  }

  pub async fn get_case(&self, id: i64) -> Result<Option<Case>, CaseError> {
    Ok(self.store.get(id).await?)
  }

  pub fn construction_groups(&self) -> Vec<ConstructionGroup> {
    ConstructionGroup::ALL.to_vec()
  }
}
