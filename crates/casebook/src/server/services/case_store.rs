//! Case store abstraction
//!
//! Stores own identity assignment, persistence and the three read shapes the
//! retrieval engine needs: a filtered scan, cosine-distance ordering and
//! text-relevance ordering. Backends can be swapped without touching the
//! engine or the HTTP layer.

use async_trait::async_trait;

use crate::server::errors::StoreError;
use crate::server::models::case::{Case, ConstructionGroup, NewCase};

/// Conjunctive scan filters; `None` imposes no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilters {
  /// Case-insensitive substring of the vehicle model
  pub vehicle_model: Option<String>,
  pub construction_group: Option<ConstructionGroup>,
}

impl CaseFilters {
  pub fn matches(&self, case: &Case) -> bool {
    let model_ok = self
      .vehicle_model
      .as_deref()
      .map_or(true, |model| contains_ignore_case(&case.vehicle_model, model));
    let group_ok = self.construction_group.map_or(true, |group| case.construction_group == group);
    model_ok && group_ok
  }
}

/// How a scan is ranked
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CaseOrdering {
  /// Ascending identifier
  #[default]
  Insertion,
  /// Ascending cosine distance to the vector; rows without an embedding are excluded
  Distance(Vec<f32>),
  /// Rows mentioning the text in the problem or solution description
  Relevance(String),
}

/// A scan with its ordering directive and optional cap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseQuery {
  pub filters: CaseFilters,
  pub ordering: CaseOrdering,
  pub limit: Option<usize>,
}

impl CaseQuery {
  pub fn scan(filters: CaseFilters) -> Self {
    Self { filters, ..Default::default() }
  }

  pub fn order_by_distance(mut self, vector: Vec<f32>) -> Self {
    self.ordering = CaseOrdering::Distance(vector);
    self
  }

  pub fn order_by_relevance(mut self, text: impl Into<String>) -> Self {
    self.ordering = CaseOrdering::Relevance(text.into());
    self
  }

  pub fn limit(mut self, n: usize) -> Self {
    self.limit = Some(n);
    self
  }
}

/// Structured repository of diagnostic cases
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseStore: Send + Sync {
  /// Persist a case, assigning its identifier and creation timestamp
  async fn insert(&self, new_case: NewCase, embedding: Option<Vec<f32>>) -> Result<Case, StoreError>;

  /// Run a filtered, ordered and capped scan
  async fn fetch(&self, query: &CaseQuery) -> Result<Vec<Case>, StoreError>;

  async fn get(&self, id: i64) -> Result<Option<Case>, StoreError>;

  async fn count(&self) -> Result<usize, StoreError>;

  /// Cheap connectivity probe used at startup
  async fn health(&self) -> Result<(), StoreError>;
}

/// Cosine distance (`1 - cosine similarity`); zero vectors are maximally distant
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 1.0;
  }

  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

  if norm_a == 0.0 || norm_b == 0.0 {
    return 1.0;
  }

  1.0 - dot / (norm_a * norm_b)
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rank of a case under relevance ordering, `None` when it does not match
///
/// Problem-description hits rank ahead of solution-only hits.
pub fn relevance_rank(case: &Case, text: &str) -> Option<u8> {
  if contains_ignore_case(&case.problem_description, text) {
    Some(0)
  } else if contains_ignore_case(&case.solution_description, text) {
    Some(1)
  } else {
    None
  }
}

/// Apply a query to an in-memory candidate set
///
/// Shared by backends that cannot push ordering down to their engine.
pub fn apply_query<'a, I>(cases: I, query: &CaseQuery) -> Vec<Case>
where
  I: IntoIterator<Item = &'a Case>,
{
  let filtered = cases.into_iter().filter(|case| query.filters.matches(case));

  let mut ranked: Vec<Case> = match &query.ordering {
    CaseOrdering::Insertion => {
      let mut rows: Vec<Case> = filtered.cloned().collect();
      rows.sort_by_key(|case| case.id);
      rows
    }
    CaseOrdering::Distance(vector) => {
      let mut rows: Vec<(f32, &Case)> = filtered
        .filter_map(|case| case.embedding.as_deref().map(|e| (cosine_distance(e, vector), case)))
        .collect();
      rows.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)));
      rows.into_iter().map(|(_, case)| case.clone()).collect()
    }
    CaseOrdering::Relevance(text) => {
      let mut rows: Vec<(u8, &Case)> =
        filtered.filter_map(|case| relevance_rank(case, text).map(|rank| (rank, case))).collect();
      rows.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.id.cmp(&b.id)));
      rows.into_iter().map(|(_, case)| case.clone()).collect()
    }
  };

  if let Some(limit) = query.limit {
    ranked.truncate(limit);
  }
  ranked
}
