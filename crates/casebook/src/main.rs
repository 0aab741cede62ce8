use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use casebook::cli::client::ClientConfig;
use casebook::cli::commands;
use casebook::server::models::case::{ConstructionGroup, NewCase};

#[derive(Parser)]
#[command(name = "casebook")]
#[command(about = "Casebook - diagnostic case knowledge base\nRecord vehicle faults and find how they were fixed")]
#[command(version)]
struct Cli {
  #[command(flatten)]
  client: ClientConfig,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Register a new diagnostic case
  Add {
    /// Short summary of the problem
    #[arg(long)]
    title: String,
    /// Vehicle model, e.g. Tiguan
    #[arg(long)]
    model: String,
    /// Model year
    #[arg(long)]
    year: i32,
    /// Construction group, e.g. Frenos
    #[arg(long, value_parser = parse_group)]
    group: ConstructionGroup,
    /// What the customer reported
    #[arg(long)]
    problem: String,
    /// How it was fixed
    #[arg(long)]
    solution: String,
  },
  /// Search cases by free text
  Search {
    /// Only cases whose vehicle model contains this text
    #[arg(short, long)]
    model: Option<String>,
    /// Only cases in this construction group
    #[arg(short, long, value_parser = parse_group)]
    group: Option<ConstructionGroup>,
    /// Search terms (space-separated)
    #[arg(required = true)]
    terms: Vec<String>,
  },
  /// Show a single case
  Get {
    id: i64,
  },
  /// List the construction groups
  Groups,
  /// Load the bundled reference cases
  Seed,
}

fn parse_group(value: &str) -> Result<ConstructionGroup, String> {
  value.parse().map_err(|e: casebook::server::errors::CaseError| e.to_string())
}

async fn handle(client: ClientConfig, command: Command) -> Result<()> {
  match command {
    Command::Add { title, model, year, group, problem, solution } => {
      let new_case = NewCase {
        title,
        vehicle_model: model,
        year,
        construction_group: group,
        problem_description: problem,
        solution_description: solution,
      };
      commands::add_case(client, new_case).await
    }
    Command::Search { model, group, terms } => commands::search_cases(client, &terms, model, group).await,
    Command::Get { id } => commands::get_case(client, id).await,
    Command::Groups => commands::list_groups(client).await,
    Command::Seed => commands::seed(client).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .init();

  let cli = Cli::parse();
  handle(cli.client, cli.command).await
}
