//! Diagnostic case domain model
//!
//! A case is a short write-up of a vehicle fault: what the customer reported
//! and how the workshop fixed it. Cases are created once and never edited.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::server::errors::CaseError;

/// Dimension of every stored embedding (text-embedding-3-small)
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Oldest model year accepted at ingestion
pub const MIN_MODEL_YEAR: i32 = 1950;

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_VEHICLE_MODEL_CHARS: usize = 100;

/// Vehicle subsystem a case belongs to
///
/// Persisted as its display string so stores without native enums can hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ConstructionGroup {
  #[serde(rename = "Motor")]
  Motor,
  #[serde(rename = "Transmisión")]
  Transmision,
  #[serde(rename = "Eléctrico")]
  Electrico,
  #[serde(rename = "Suspensión")]
  Suspension,
  #[serde(rename = "Carrocería")]
  Carroceria,
  #[serde(rename = "Frenos")]
  Frenos,
  #[serde(rename = "Climatización")]
  Climatizacion,
  #[serde(rename = "Infoentretenimiento")]
  Infoentretenimiento,
}

impl ConstructionGroup {
  pub const ALL: [ConstructionGroup; 8] = [
    ConstructionGroup::Motor,
    ConstructionGroup::Transmision,
    ConstructionGroup::Electrico,
    ConstructionGroup::Suspension,
    ConstructionGroup::Carroceria,
    ConstructionGroup::Frenos,
    ConstructionGroup::Climatizacion,
    ConstructionGroup::Infoentretenimiento,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ConstructionGroup::Motor => "Motor",
      ConstructionGroup::Transmision => "Transmisión",
      ConstructionGroup::Electrico => "Eléctrico",
      ConstructionGroup::Suspension => "Suspensión",
      ConstructionGroup::Carroceria => "Carrocería",
      ConstructionGroup::Frenos => "Frenos",
      ConstructionGroup::Climatizacion => "Climatización",
      ConstructionGroup::Infoentretenimiento => "Infoentretenimiento",
    }
  }
}

impl fmt::Display for ConstructionGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ConstructionGroup {
  type Err = CaseError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    ConstructionGroup::ALL.into_iter().find(|group| group.as_str() == value).ok_or_else(|| {
      let allowed: Vec<&str> = ConstructionGroup::ALL.iter().map(|g| g.as_str()).collect();
      CaseError::validation(format!(
        "Unknown construction group '{value}'. Expected one of: {}",
        allowed.join(", ")
      ))
    })
  }
}

/// Input for creating a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewCase {
  /// Short summary of the problem
  pub title: String,
  pub vehicle_model: String,
  pub year: i32,
  pub construction_group: ConstructionGroup,
  pub problem_description: String,
  pub solution_description: String,
}

/// A persisted case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
  pub id: i64,
  pub title: String,
  pub vehicle_model: String,
  pub year: i32,
  pub construction_group: ConstructionGroup,
  pub problem_description: String,
  pub solution_description: String,
  pub created_at: DateTime<Utc>,
  pub embedding: Option<Vec<f32>>,
}

impl Case {
  /// Attach store-assigned identity to a validated input
  pub fn from_new(
    id: i64,
    created_at: DateTime<Utc>,
    new_case: NewCase,
    embedding: Option<Vec<f32>>,
  ) -> Self {
    Self {
      id,
      title: new_case.title,
      vehicle_model: new_case.vehicle_model,
      year: new_case.year,
      construction_group: new_case.construction_group,
      problem_description: new_case.problem_description,
      solution_description: new_case.solution_description,
      created_at,
      embedding,
    }
  }

  pub fn has_embedding(&self) -> bool {
    self.embedding.is_some()
  }
}

/// A search request, alive for one retrieval call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchQuery {
  /// Free text describing the fault
  pub text: String,
  /// Case-insensitive substring of the vehicle model
  #[serde(default)]
  pub model_filter: Option<String>,
  /// Exact construction group
  #[serde(default)]
  pub construction_group: Option<ConstructionGroup>,
}

impl SearchQuery {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), ..Default::default() }
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model_filter = Some(model.into());
    self
  }

  pub fn with_group(mut self, group: ConstructionGroup) -> Self {
    self.construction_group = Some(group);
    self
  }
}

/// A ranked case without its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
  pub id: i64,
  pub title: String,
  pub vehicle_model: String,
  pub year: i32,
  pub construction_group: ConstructionGroup,
  pub problem_description: String,
  pub solution_description: String,
  pub created_at: DateTime<Utc>,
  /// Relevance in [0, 1]
  pub score: f32,
}

impl SearchResult {
  pub fn from_case(case: Case, score: f32) -> Self {
    Self {
      id: case.id,
      title: case.title,
      vehicle_model: case.vehicle_model,
      year: case.year,
      construction_group: case.construction_group,
      problem_description: case.problem_description,
      solution_description: case.solution_description,
      created_at: case.created_at,
      score,
    }
  }
}

/// Inclusive range of accepted model years for a given current year
pub fn valid_year_range(current_year: i32) -> (i32, i32) {
  (MIN_MODEL_YEAR, current_year + 1)
}

/// Check a case input before anything leaves the process
pub fn validate_new_case(new_case: &NewCase, current_year: i32) -> Result<(), CaseError> {
  let (min, max) = valid_year_range(current_year);
  if new_case.year < min || new_case.year > max {
    return Err(CaseError::validation(format!(
      "Model year {} is out of range: the year must be between {min} and {max}",
      new_case.year
    )));
  }

  check_length("title", &new_case.title, MAX_TITLE_CHARS)?;
  check_length("vehicle_model", &new_case.vehicle_model, MAX_VEHICLE_MODEL_CHARS)?;
  Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), CaseError> {
  let chars = value.chars().count();
  if chars > max {
    return Err(CaseError::validation(format!(
      "Field '{field}' is {chars} characters long; the maximum is {max}"
    )));
  }
  Ok(())
}

/// Text the embedding is computed from: problem and solution, nothing else
pub fn embedding_source_text(problem: &str, solution: &str) -> String {
  format!("Problem: {problem}. Solution: {solution}.")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_case(year: i32) -> NewCase {
    NewCase {
      title: "Ruido en suspensión delantera".to_string(),
      vehicle_model: "Tiguan".to_string(),
      year,
      construction_group: ConstructionGroup::Suspension,
      problem_description: "Golpe seco al pasar por baches".to_string(),
      solution_description: "Se reemplazaron bujes de horquilla".to_string(),
    }
  }

  #[test]
  fn test_year_bounds_are_inclusive() {
    assert!(validate_new_case(&sample_case(1950), 2026).is_ok());
    assert!(validate_new_case(&sample_case(2027), 2026).is_ok());
    assert!(validate_new_case(&sample_case(1949), 2026).is_err());
    assert!(validate_new_case(&sample_case(2028), 2026).is_err());
  }

  #[test]
  fn test_year_error_names_the_range() {
    let err = validate_new_case(&sample_case(1800), 2026).unwrap_err();
    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("1950"), "{message}");
    assert!(message.contains("2027"), "{message}");
  }

  #[test]
  fn test_length_limits_count_characters() {
    let mut case = sample_case(2020);
    case.vehicle_model = "é".repeat(MAX_VEHICLE_MODEL_CHARS);
    assert!(validate_new_case(&case, 2026).is_ok());

    case.vehicle_model.push('x');
    let err = validate_new_case(&case, 2026).unwrap_err();
    assert!(err.to_string().contains("vehicle_model"));

    let mut case = sample_case(2020);
    case.title = "t".repeat(MAX_TITLE_CHARS + 1);
    assert!(validate_new_case(&case, 2026).is_err());
  }

  #[test]
  fn test_embedding_source_uses_only_problem_and_solution() {
    let text = embedding_source_text("No enfría", "Se cambió condensador");
    assert_eq!(text, "Problem: No enfría. Solution: Se cambió condensador.");
  }

  #[test]
  fn test_construction_group_round_trips_through_display_string() {
    for group in ConstructionGroup::ALL {
      let parsed: ConstructionGroup = group.as_str().parse().unwrap();
      assert_eq!(parsed, group);

      let json = serde_json::to_string(&group).unwrap();
      assert_eq!(json, format!("\"{}\"", group.as_str()));
    }
  }

  #[test]
  fn test_unknown_construction_group_is_rejected() {
    let err = "Motores".parse::<ConstructionGroup>().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("Infoentretenimiento"));
    assert!("motor".parse::<ConstructionGroup>().is_err());
  }

  #[test]
  fn test_search_result_drops_embedding() {
    let case = Case::from_new(3, Utc::now(), sample_case(2021), Some(vec![0.5; 4]));
    let result = SearchResult::from_case(case, 0.9);
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("embedding").is_none());
    assert!((json["score"].as_f64().unwrap() - 0.9).abs() < 1e-6);
  }
}
