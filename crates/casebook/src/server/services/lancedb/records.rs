//! Arrow RecordBatch conversion for case rows
//!
//! LanceDB vector columns cannot be null, so a case without an embedding is
//! stored with a zero vector and `has_embedding = false`.

use arrow::array::{
  Array, BooleanArray, FixedSizeListArray, FixedSizeListBuilder, Float32Array, Int32Array,
  Int64Array, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::server::errors::StoreError;
use crate::server::models::case::Case;

pub const ID: &str = "id";
pub const TITLE: &str = "title";
pub const VEHICLE_MODEL: &str = "vehicle_model";
pub const YEAR: &str = "year";
pub const CONSTRUCTION_GROUP: &str = "construction_group";
pub const PROBLEM: &str = "problem_description";
pub const SOLUTION: &str = "solution_description";
pub const CREATED_AT: &str = "created_at";
pub const HAS_EMBEDDING: &str = "has_embedding";
pub const EMBEDDING: &str = "embedding";

/// Arrow schema of the cases table
pub fn case_schema(dimension: usize) -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new(ID, DataType::Int64, false),
    Field::new(TITLE, DataType::Utf8, false),
    Field::new(VEHICLE_MODEL, DataType::Utf8, false),
    Field::new(YEAR, DataType::Int32, false),
    Field::new(CONSTRUCTION_GROUP, DataType::Utf8, false),
    Field::new(PROBLEM, DataType::Utf8, false),
    Field::new(SOLUTION, DataType::Utf8, false),
    Field::new(CREATED_AT, DataType::Utf8, false),
    Field::new(HAS_EMBEDDING, DataType::Boolean, false),
    Field::new(
      EMBEDDING,
      DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
      false,
    ),
  ]))
}

/// Convert cases into a single RecordBatch
pub fn cases_to_batch(cases: &[Case], dimension: usize) -> Result<RecordBatch, StoreError> {
  if cases.is_empty() {
    return Err(StoreError::backend("Cannot create RecordBatch from empty records"));
  }

  let columns: Vec<Arc<dyn Array>> = vec![
    Arc::new(Int64Array::from(cases.iter().map(|c| c.id).collect::<Vec<_>>())),
    Arc::new(string_column(cases, |c| c.title.as_str())),
    Arc::new(string_column(cases, |c| c.vehicle_model.as_str())),
    Arc::new(Int32Array::from(cases.iter().map(|c| c.year).collect::<Vec<_>>())),
    Arc::new(string_column(cases, |c| c.construction_group.as_str())),
    Arc::new(string_column(cases, |c| c.problem_description.as_str())),
    Arc::new(string_column(cases, |c| c.solution_description.as_str())),
    Arc::new(StringArray::from(cases.iter().map(|c| c.created_at.to_rfc3339()).collect::<Vec<_>>())),
    Arc::new(BooleanArray::from(cases.iter().map(Case::has_embedding).collect::<Vec<_>>())),
    Arc::new(embedding_column(cases, dimension)?),
  ];

  RecordBatch::try_new(case_schema(dimension), columns)
    .map_err(|e| StoreError::backend(format!("Failed to create RecordBatch: {e}")))
}

fn string_column<F>(cases: &[Case], field: F) -> StringArray
where
  F: Fn(&Case) -> &str,
{
  StringArray::from(cases.iter().map(field).collect::<Vec<_>>())
}

fn embedding_column(cases: &[Case], dimension: usize) -> Result<FixedSizeListArray, StoreError> {
  let mut builder =
    FixedSizeListBuilder::new(Float32Array::builder(dimension * cases.len()), dimension as i32);

  for case in cases {
    match &case.embedding {
      Some(vector) if vector.len() == dimension => builder.values().append_slice(vector),
      Some(vector) => {
        return Err(StoreError::constraint(format!(
          "embedding has {} components, column expects {dimension}",
          vector.len()
        )))
      }
      None => builder.values().append_slice(&vec![0.0; dimension]),
    }
    builder.append(true);
  }

  Ok(builder.finish())
}

/// Convert a result batch back into cases
pub fn batch_to_cases(batch: &RecordBatch) -> Result<Vec<Case>, StoreError> {
  let ids = column::<Int64Array>(batch, ID)?;
  let titles = column::<StringArray>(batch, TITLE)?;
  let models = column::<StringArray>(batch, VEHICLE_MODEL)?;
  let years = column::<Int32Array>(batch, YEAR)?;
  let groups = column::<StringArray>(batch, CONSTRUCTION_GROUP)?;
  let problems = column::<StringArray>(batch, PROBLEM)?;
  let solutions = column::<StringArray>(batch, SOLUTION)?;
  let created = column::<StringArray>(batch, CREATED_AT)?;
  let flags = column::<BooleanArray>(batch, HAS_EMBEDDING)?;
  let embeddings = column::<FixedSizeListArray>(batch, EMBEDDING)?;

  (0..batch.num_rows())
    .map(|row| {
      let construction_group = groups
        .value(row)
        .parse()
        .map_err(|e| StoreError::backend(format!("Row {}: {e}", ids.value(row))))?;

      let created_at = DateTime::parse_from_rfc3339(created.value(row))
        .map_err(|e| StoreError::backend(format!("Row {}: bad created_at: {e}", ids.value(row))))?
        .with_timezone(&Utc);

      let embedding = if flags.value(row) { Some(embedding_at(embeddings, row)?) } else { None };

      Ok(Case {
        id: ids.value(row),
        title: titles.value(row).to_string(),
        vehicle_model: models.value(row).to_string(),
        year: years.value(row),
        construction_group,
        problem_description: problems.value(row).to_string(),
        solution_description: solutions.value(row).to_string(),
        created_at,
        embedding,
      })
    })
    .collect()
}

fn embedding_at(embeddings: &FixedSizeListArray, row: usize) -> Result<Vec<f32>, StoreError> {
  let values = embeddings.value(row);
  let floats = values
    .as_any()
    .downcast_ref::<Float32Array>()
    .ok_or_else(|| StoreError::backend("Failed to cast embedding values to Float32Array"))?;
  Ok(floats.values().to_vec())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, StoreError> {
  batch
    .column_by_name(name)
    .ok_or_else(|| StoreError::backend(format!("Missing '{name}' column")))?
    .as_any()
    .downcast_ref::<T>()
    .ok_or_else(|| StoreError::backend(format!("Unexpected type for '{name}' column")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::models::case::ConstructionGroup;

  fn case(id: i64, embedding: Option<Vec<f32>>) -> Case {
    Case {
      id,
      title: "Pantalla se reinicia".to_string(),
      vehicle_model: "ID.4".to_string(),
      year: 2023,
      construction_group: ConstructionGroup::Infoentretenimiento,
      problem_description: "La pantalla central se reinicia sola".to_string(),
      solution_description: "Actualización de software".to_string(),
      created_at: Utc::now(),
      embedding,
    }
  }

  #[test]
  fn test_batch_round_trip_keeps_missing_embeddings_absent() {
    let cases = vec![case(1, Some(vec![0.1, 0.2, 0.3])), case(2, None)];
    let batch = cases_to_batch(&cases, 3).unwrap();
    assert_eq!(batch.num_rows(), 2);

    let restored = batch_to_cases(&batch).unwrap();
    assert_eq!(restored[0].embedding, Some(vec![0.1, 0.2, 0.3]));
    assert_eq!(restored[1].embedding, None);
    assert_eq!(restored[1].construction_group, ConstructionGroup::Infoentretenimiento);
  }

  #[test]
  fn test_wrong_dimension_is_a_constraint_error() {
    let err = cases_to_batch(&[case(1, Some(vec![1.0]))], 3).unwrap_err();
    assert!(matches!(err, StoreError::Constraint { .. }));
  }
}
