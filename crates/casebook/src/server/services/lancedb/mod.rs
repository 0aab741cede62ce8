//! LanceDB-backed case store
//!
//! Persists cases in a single `diagnosis_cases` table with a fixed-size
//! embedding column and serves cosine-distance search from it.

pub mod connection;
pub mod records;
pub mod search;
pub mod table_manager;

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::server::errors::StoreError;
use crate::server::models::case::{Case, NewCase, EMBEDDING_DIMENSION};
use crate::server::services::case_store::{CaseQuery, CaseStore};
use connection::create_connection;
use table_manager::TableManager;

pub const TABLE_NAME: &str = "diagnosis_cases";

pub struct LanceDbCaseStore {
  table_manager: TableManager,
  next_id: AtomicI64,
}

impl LanceDbCaseStore {
  pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
    Self::open_with(data_dir, TABLE_NAME, EMBEDDING_DIMENSION).await
  }

  pub async fn open_with(data_dir: &Path, table_name: &str, dimension: usize) -> Result<Self, StoreError> {
    let connection = create_connection(data_dir).await?;
    let table_manager = TableManager::new(connection, table_name, dimension);
    table_manager.ensure_table().await?;

    let last_id = table_manager.max_id().await?;
    bentley::verbose!("Opened '{table_name}' at {} (last id {last_id})", data_dir.display());

    Ok(Self { table_manager, next_id: AtomicI64::new(last_id + 1) })
  }
}

#[async_trait]
impl CaseStore for LanceDbCaseStore {
  async fn insert(&self, new_case: NewCase, embedding: Option<Vec<f32>>) -> Result<Case, StoreError> {
    if let Some(vector) = &embedding {
      if vector.len() != self.table_manager.dimension() {
        return Err(StoreError::constraint(format!(
          "embedding has {} components, column expects {}",
          vector.len(),
          self.table_manager.dimension()
        )));
      }
    }

    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
    let case = Case::from_new(id, Utc::now(), new_case, embedding);
    self.table_manager.add_case(&case).await?;
    Ok(case)
  }

  async fn fetch(&self, query: &CaseQuery) -> Result<Vec<Case>, StoreError> {
    let table = self.table_manager.get_table().await?;
    search::run_query(&table, query).await
  }

  async fn get(&self, id: i64) -> Result<Option<Case>, StoreError> {
    let table = self.table_manager.get_table().await?;
    let rows = search::find_by_id(&table, id).await?;
    Ok(rows.into_iter().next())
  }

  async fn count(&self) -> Result<usize, StoreError> {
    self.table_manager.count_rows().await
  }

  async fn health(&self) -> Result<(), StoreError> {
    self.table_manager.count_rows().await.map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::models::case::ConstructionGroup;
  use crate::server::services::case_store::CaseFilters;
  use tempfile::TempDir;

  fn new_case(model: &str, problem: &str) -> NewCase {
    NewCase {
      title: "Caja de cambios".to_string(),
      vehicle_model: model.to_string(),
      year: 2021,
      construction_group: ConstructionGroup::Transmision,
      problem_description: problem.to_string(),
      solution_description: "Reprogramación de la unidad de control".to_string(),
    }
  }

  #[tokio::test]
  async fn test_insert_fetch_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store = LanceDbCaseStore::open_with(temp_dir.path(), "cases", 3).await.unwrap();

    store.insert(new_case("Amarok", "Tirones en segunda"), Some(vec![1.0, 0.0, 0.0])).await.unwrap();
    store.insert(new_case("Amarok V6", "Cambios bruscos"), None).await.unwrap();
    store.insert(new_case("Saveiro", "Tirones al arrancar"), Some(vec![0.0, 1.0, 0.0])).await.unwrap();

    let semantic = CaseQuery::scan(CaseFilters::default()).order_by_distance(vec![0.1, 1.0, 0.0]).limit(5);
    let ids: Vec<i64> = store.fetch(&semantic).await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![3, 1]);

    let lexical = CaseQuery::scan(CaseFilters { vehicle_model: Some("amarok".to_string()), ..Default::default() })
      .order_by_relevance("tirones");
    let ids: Vec<i64> = store.fetch(&lexical).await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1]);

    drop(store);
    let reopened = LanceDbCaseStore::open_with(temp_dir.path(), "cases", 3).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 3);
    assert!(reopened.get(2).await.unwrap().unwrap().embedding.is_none());
    let next = reopened.insert(new_case("Golf", "x"), None).await.unwrap();
    assert_eq!(next.id, 4);
  }
}
