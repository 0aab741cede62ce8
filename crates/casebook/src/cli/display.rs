//! Display formatting utilities for CLI output

use colored::*;

use crate::server::models::case::{Case, SearchResult};

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(std::mem::take(&mut current_line));
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

fn print_section(label: &str, body: &str) {
  println!("{}", label.bold());
  for line in wrap_text(body, 80) {
    println!("  {line}");
  }
}

pub fn display_case(case: &Case) {
  println!(
    "=== #{} {} ===",
    case.id.to_string().cyan(),
    case.title.yellow().bold()
  );
  println!(
    "{} {} · {} · {}",
    "Vehicle:".dimmed(),
    case.vehicle_model.blue(),
    case.year,
    case.construction_group.to_string().magenta()
  );
  print_section("Problem", &case.problem_description);
  print_section("Solution", &case.solution_description);
  let embedded = if case.has_embedding() { "yes".green() } else { "no".yellow() };
  println!("{} {}  {} {}", "Created:".dimmed(), case.created_at.to_rfc3339(), "Embedded:".dimmed(), embedded);
  println!();
}

pub fn display_search_result(result: &SearchResult) {
  println!(
    "=== #{} {} ({} {}) [{:.2}] ===",
    result.id.to_string().cyan(),
    result.title.yellow().bold(),
    result.vehicle_model.blue(),
    result.year,
    result.score
  );
  print_section("Problem", &result.problem_description);
  print_section("Solution", &result.solution_description);
  println!();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wrap_text_respects_width() {
    let lines = wrap_text("uno dos tres cuatro cinco", 9);
    assert_eq!(lines, vec!["uno dos", "tres", "cuatro", "cinco"]);
  }

  #[test]
  fn test_wrap_text_counts_characters() {
    let lines = wrap_text("señal válida", 12);
    assert_eq!(lines, vec!["señal válida"]);
  }

  #[test]
  fn test_wrap_text_keeps_blank_paragraphs() {
    let lines = wrap_text("a\n\nb", 10);
    assert_eq!(lines, vec!["a", "", "b"]);
  }
}
