//! Query execution against the cases table
//!
//! Filters and text relevance are pushed down as SQL predicates. The final
//! ordering runs in process so every backend ranks identically.

use arrow::record_batch::RecordBatch;
use futures::stream::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use super::records::{
  batch_to_cases, CONSTRUCTION_GROUP, EMBEDDING, HAS_EMBEDDING, ID, PROBLEM, SOLUTION, VEHICLE_MODEL,
};
use crate::server::errors::StoreError;
use crate::server::models::case::Case;
use crate::server::services::case_store::{apply_query, CaseFilters, CaseOrdering, CaseQuery};

/// Run a case query and return rows in final order
pub async fn run_query(table: &Table, query: &CaseQuery) -> Result<Vec<Case>, StoreError> {
  let predicate = build_predicate(&query.filters, &query.ordering);

  let candidates = match &query.ordering {
    CaseOrdering::Distance(vector) => vector_candidates(table, vector, predicate, query.limit).await?,
    _ => scan_candidates(table, predicate).await?,
  };

  Ok(apply_query(&candidates, query))
}

pub async fn find_by_id(table: &Table, id: i64) -> Result<Vec<Case>, StoreError> {
  scan_candidates(table, Some(format!("{ID} = {id}"))).await
}

async fn vector_candidates(
  table: &Table,
  vector: &[f32],
  predicate: Option<String>,
  limit: Option<usize>,
) -> Result<Vec<Case>, StoreError> {
  let mut search = table
    .vector_search(vector)
    .map_err(|e| StoreError::backend(format!("Invalid query vector: {e}")))?
    .column(EMBEDDING)
    .distance_type(DistanceType::Cosine);

  if let Some(predicate) = predicate {
    search = search.only_if(predicate);
  }
  if let Some(limit) = limit {
    search = search.limit(limit);
  }

  let batches: Vec<RecordBatch> = search
    .execute()
    .await
    .map_err(|e| StoreError::backend(format!("Vector search failed: {e}")))?
    .try_collect()
    .await
    .map_err(|e| StoreError::backend(format!("Error reading batch: {e}")))?;

  collect_cases(&batches)
}

async fn scan_candidates(table: &Table, predicate: Option<String>) -> Result<Vec<Case>, StoreError> {
  let mut scan = table.query();
  if let Some(predicate) = predicate {
    scan = scan.only_if(predicate);
  }

  let batches: Vec<RecordBatch> = scan
    .execute()
    .await
    .map_err(|e| StoreError::backend(format!("Scan failed: {e}")))?
    .try_collect()
    .await
    .map_err(|e| StoreError::backend(format!("Error reading batch: {e}")))?;

  collect_cases(&batches)
}

fn collect_cases(batches: &[RecordBatch]) -> Result<Vec<Case>, StoreError> {
  let mut cases = Vec::new();
  for batch in batches {
    cases.extend(batch_to_cases(batch)?);
  }
  Ok(cases)
}

/// SQL predicate for the filters and ordering, `None` when nothing constrains the scan
pub fn build_predicate(filters: &CaseFilters, ordering: &CaseOrdering) -> Option<String> {
  let mut clauses = Vec::new();

  if let Some(model) = &filters.vehicle_model {
    clauses.push(format!("lower({VEHICLE_MODEL}) LIKE {}", like_pattern(model)));
  }
  if let Some(group) = filters.construction_group {
    clauses.push(format!("{CONSTRUCTION_GROUP} = {}", sql_literal(group.as_str())));
  }

  match ordering {
    CaseOrdering::Distance(_) => clauses.push(format!("{HAS_EMBEDDING} = true")),
    CaseOrdering::Relevance(text) if !text.is_empty() => {
      let pattern = like_pattern(text);
      clauses.push(format!("(lower({PROBLEM}) LIKE {pattern} OR lower({SOLUTION}) LIKE {pattern})"));
    }
    _ => {}
  }

  if clauses.is_empty() {
    None
  } else {
    Some(clauses.join(" AND "))
  }
}

// `%` and `_` in user text only widen the match; the in-process pass re-checks it
fn like_pattern(text: &str) -> String {
  sql_literal(&format!("%{}%", text.to_lowercase()))
}

fn sql_literal(value: &str) -> String {
  format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::models::case::ConstructionGroup;

  #[test]
  fn test_no_constraints_means_no_predicate() {
    assert_eq!(build_predicate(&CaseFilters::default(), &CaseOrdering::Insertion), None);
    assert_eq!(build_predicate(&CaseFilters::default(), &CaseOrdering::Relevance(String::new())), None);
  }

  #[test]
  fn test_predicate_combines_filters_and_relevance() {
    let filters = CaseFilters {
      vehicle_model: Some("Tiguan".to_string()),
      construction_group: Some(ConstructionGroup::Suspension),
    };
    let predicate =
      build_predicate(&filters, &CaseOrdering::Relevance("O'Ring".to_string())).unwrap();

    assert_eq!(
      predicate,
      "lower(vehicle_model) LIKE '%tiguan%' AND construction_group = 'Suspensión' AND \
       (lower(problem_description) LIKE '%o''ring%' OR lower(solution_description) LIKE '%o''ring%')"
    );
  }

  #[test]
  fn test_distance_ordering_requires_embedding() {
    let predicate = build_predicate(&CaseFilters::default(), &CaseOrdering::Distance(vec![1.0]));
    assert_eq!(predicate.as_deref(), Some("has_embedding = true"));
  }
}
