use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::case_store::{apply_query, CaseQuery, CaseStore};
use crate::server::errors::StoreError;
use crate::server::models::case::{Case, NewCase, EMBEDDING_DIMENSION};

/// Process-local case store with sequential identifiers
pub struct MemoryCaseStore {
  cases: RwLock<Vec<Case>>,
  dimension: usize,
}

impl MemoryCaseStore {
  pub fn new() -> Self {
    Self::with_dimension(EMBEDDING_DIMENSION)
  }

  pub fn with_dimension(dimension: usize) -> Self {
    Self { cases: RwLock::new(Vec::new()), dimension }
  }
}

impl Default for MemoryCaseStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
  async fn insert(&self, new_case: NewCase, embedding: Option<Vec<f32>>) -> Result<Case, StoreError> {
    if let Some(vector) = &embedding {
      if vector.len() != self.dimension {
        return Err(StoreError::constraint(format!(
          "embedding has {} components, column expects {}",
          vector.len(),
          self.dimension
        )));
      }
    }

    let mut cases = self.cases.write().await;
    let id = cases.last().map_or(1, |last| last.id + 1);
    let case = Case::from_new(id, Utc::now(), new_case, embedding);
    cases.push(case.clone());
    Ok(case)
  }

  async fn fetch(&self, query: &CaseQuery) -> Result<Vec<Case>, StoreError> {
    let cases = self.cases.read().await;
    Ok(apply_query(cases.iter(), query))
  }

  async fn get(&self, id: i64) -> Result<Option<Case>, StoreError> {
    let cases = self.cases.read().await;
    Ok(cases.iter().find(|case| case.id == id).cloned())
  }

  async fn count(&self) -> Result<usize, StoreError> {
    Ok(self.cases.read().await.len())
  }

  async fn health(&self) -> Result<(), StoreError> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::models::case::ConstructionGroup;
  use crate::server::services::case_store::CaseFilters;

  fn new_case(model: &str) -> NewCase {
    NewCase {
      title: "Pérdida de potencia".to_string(),
      vehicle_model: model.to_string(),
      year: 2019,
      construction_group: ConstructionGroup::Motor,
      problem_description: "El motor pierde fuerza en subida".to_string(),
      solution_description: "Se limpió la válvula EGR".to_string(),
    }
  }

  #[tokio::test]
  async fn test_insert_assigns_sequential_ids() {
    let store = MemoryCaseStore::new();
    let first = store.insert(new_case("Jetta"), None).await.unwrap();
    let second = store.insert(new_case("Vento"), Some(vec![0.0; EMBEDDING_DIMENSION])).await.unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert!(second.created_at >= first.created_at);
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.get(2).await.unwrap().unwrap().vehicle_model, "Vento");
    assert!(store.get(99).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_insert_rejects_wrong_dimension() {
    let store = MemoryCaseStore::new();
    let err = store.insert(new_case("Golf"), Some(vec![1.0; 3])).await.unwrap_err();
    assert!(matches!(err, StoreError::Constraint { .. }));
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_fetch_scans_in_insertion_order() {
    let store = MemoryCaseStore::with_dimension(2);
    for model in ["Taos", "Tiguan", "tiguan allspace"] {
      store.insert(new_case(model), None).await.unwrap();
    }

    let query =
      CaseQuery::scan(CaseFilters { vehicle_model: Some("TIGUAN".to_string()), ..Default::default() });
    let ids: Vec<i64> = store.fetch(&query).await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 3]);
  }
}
