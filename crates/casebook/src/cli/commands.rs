use anyhow::{anyhow, Result};
use colored::*;

use crate::cli::client::{CasebookClient, ClientConfig};
use crate::cli::display::{display_case, display_search_result};
use crate::cli::seed::reference_cases;
use crate::server::models::case::{ConstructionGroup, NewCase};

/// Register a new case
pub async fn add_case(config: ClientConfig, new_case: NewCase) -> Result<()> {
  let client = CasebookClient::with_config(config)?;
  let case = client.create_case(&new_case).await?;

  let note = if case.has_embedding() { "" } else { " (stored without embedding)" };
  println!("{} Added case #{} {}{}", "✓".green(), case.id.to_string().cyan(), case.title.yellow(), note.dimmed());
  Ok(())
}

/// Search cases and print them in rank order
pub async fn search_cases(
  config: ClientConfig,
  terms: &[String],
  model: Option<String>,
  group: Option<ConstructionGroup>,
) -> Result<()> {
  let client = CasebookClient::with_config(config)?;
  let query = terms.join(" ");
  let results = client.search(&query, model, group).await?;

  if results.is_empty() {
    println!("No cases found matching: {}", query.yellow());
    return Ok(());
  }

  for result in &results {
    display_search_result(result);
  }
  println!("{} {} case(s)", "Found".dimmed(), results.len());
  Ok(())
}

pub async fn get_case(config: ClientConfig, id: i64) -> Result<()> {
  let client = CasebookClient::with_config(config)?;
  let case = client.get_case(id).await?;
  display_case(&case);
  Ok(())
}

pub async fn list_groups(config: ClientConfig) -> Result<()> {
  let client = CasebookClient::with_config(config)?;
  let groups = client.groups().await?;

  println!("Construction groups:");
  for group in groups {
    println!("  {}", group.to_string().blue());
  }
  Ok(())
}

/// Load the bundled reference cases through the API
pub async fn seed(config: ClientConfig) -> Result<()> {
  let client = CasebookClient::with_config(config)?;
  client.health().await.map_err(|e| anyhow!("Server at {} is not reachable: {e}", client.base_url()))?;

  let cases = reference_cases()?;
  let total = cases.len();
  println!("Loading {total} reference cases into {}", client.base_url().cyan());

  let mut success_count = 0;
  for new_case in &cases {
    match client.create_case(new_case).await {
      Ok(case) => {
        success_count += 1;
        println!("  {} #{} {}", "✓".green(), case.id, new_case.title);
      }
      Err(e) => println!("  {} {}: {e}", "✗".red(), new_case.title),
    }
  }

  println!("Seed complete: {success_count}/{total} inserted");
  Ok(())
}
