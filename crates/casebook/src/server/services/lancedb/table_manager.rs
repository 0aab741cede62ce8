//! Table management operations for LanceDB

use arrow::record_batch::RecordBatchIterator;
use futures::stream::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, Table};

use super::records::{case_schema, cases_to_batch, ID};
use crate::server::errors::StoreError;
use crate::server::models::case::Case;

/// Owns the cases table and creates it on first use
pub struct TableManager {
  connection: Connection,
  table_name: String,
  dimension: usize,
}

impl TableManager {
  pub fn new(connection: Connection, table_name: impl Into<String>, dimension: usize) -> Self {
    Self { connection, table_name: table_name.into(), dimension }
  }

  pub fn dimension(&self) -> usize {
    self.dimension
  }

  pub async fn table_exists(&self) -> Result<bool, StoreError> {
    let tables = self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| StoreError::connection(format!("Failed to list tables: {e}")))?;
    Ok(tables.contains(&self.table_name))
  }

  /// Create the empty table if it is missing
  pub async fn ensure_table(&self) -> Result<(), StoreError> {
    if self.table_exists().await? {
      return Ok(());
    }

    self
      .connection
      .create_empty_table(&self.table_name, case_schema(self.dimension))
      .execute()
      .await
      .map_err(|e| StoreError::backend(format!("Failed to create table '{}': {e}", self.table_name)))?;

    bentley::info!("Created table '{}' ({} dimensions)", self.table_name, self.dimension);
    Ok(())
  }

  pub async fn get_table(&self) -> Result<Table, StoreError> {
    self
      .connection
      .open_table(&self.table_name)
      .execute()
      .await
      .map_err(|e| StoreError::connection(format!("Failed to open table '{}': {e}", self.table_name)))
  }

  pub async fn add_case(&self, case: &Case) -> Result<(), StoreError> {
    let batch = cases_to_batch(std::slice::from_ref(case), self.dimension)?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    let table = self.get_table().await?;
    table
      .add(batch_iter)
      .execute()
      .await
      .map_err(|e| StoreError::backend(format!("Failed to store case {}: {e}", case.id)))?;

    bentley::verbose!("Stored case {} in '{}'", case.id, self.table_name);
    Ok(())
  }

  pub async fn count_rows(&self) -> Result<usize, StoreError> {
    let table = self.get_table().await?;
    table.count_rows(None).await.map_err(|e| StoreError::backend(format!("Failed to count rows: {e}")))
  }

  /// Highest stored identifier, 0 for an empty table
  pub async fn max_id(&self) -> Result<i64, StoreError> {
    let table = self.get_table().await?;
    let batches: Vec<_> = table
      .query()
      .select(Select::columns(&[ID]))
      .execute()
      .await
      .map_err(|e| StoreError::backend(format!("Failed to scan ids: {e}")))?
      .try_collect()
      .await
      .map_err(|e| StoreError::backend(format!("Failed to read ids: {e}")))?;

    let mut max = 0;
    for batch in &batches {
      if let Some(ids) =
        batch.column_by_name(ID).and_then(|c| c.as_any().downcast_ref::<arrow::array::Int64Array>())
      {
        max = ids.iter().flatten().fold(max, i64::max);
      }
    }
    Ok(max)
  }
}
