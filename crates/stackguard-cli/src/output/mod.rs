//! Output formatting for the gate's reports.

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use stackguard_core::{FailedTest, SyncConvergenceResult};
use std::path::Path;
use std::str::FromStr;
use tabled::{Table, Tabled};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Print a named list the way the pipeline logs expect: a header with the
/// item count, an underline, one item per line.
pub fn print_list(name: &str, items: &[String]) {
    let header = format!("{} ({}):", name, items.len());
    println!("\n{}", header.bold());
    println!("{}", "-".repeat(header.len()));
    for item in items {
        println!("{item}");
    }
}

/// Print a convergence result in pretty form
pub fn print_convergence(result: &SyncConvergenceResult) {
    let completed: Vec<String> = result.completed.iter().map(ToString::to_string).collect();
    let pending: Vec<String> = result.pending.iter().map(ToString::to_string).collect();
    print_list("Completed", &completed);
    print_list("Pending", &pending);

    if !result.never_observed.is_empty() {
        let never: Vec<String> = result.never_observed.iter().map(ToString::to_string).collect();
        print_list("Never reported by the backend (check the mapping table)", &never);
    }

    println!();
    let outcome = result.outcome.to_string();
    let outcome = if result.is_converged() {
        outcome.green().bold()
    } else {
        outcome.red().bold()
    };
    println!(
        "{} {} after {}s",
        "Refresh wait:".bold(),
        outcome,
        result.elapsed.as_secs()
    );
}

#[derive(Tabled)]
struct FailedTestRow {
    #[tabled(rename = "Rule")]
    rule: String,

    #[tabled(rename = "Severity")]
    severity: String,

    #[tabled(rename = "Failed Entities")]
    entities: String,
}

/// Print the failed-test report in pretty form
pub fn print_failed_tests(tests: &[FailedTest]) {
    if tests.is_empty() {
        println!("\n{}", "No failed rules for this scope :)".green().bold());
        return;
    }

    let rows: Vec<FailedTestRow> = tests
        .iter()
        .map(|test| FailedTestRow {
            rule: test.rule_name.clone(),
            severity: test.severity.to_string(),
            entities: test
                .entities
                .iter()
                .map(FailedTestRow::entity_line)
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect();

    println!("\n{}", "Failed Tests:".bold());
    println!("{}", Table::new(rows));

    for test in tests {
        if let Some(link) = test.rule_link() {
            println!("  {} {}", "Rule info:".dimmed(), link.dimmed());
        }
    }
    if let Some(link) = tests.iter().find_map(FailedTest::result_link) {
        println!("  {} {}", "Full result:".dimmed(), link.dimmed());
    }
}

impl FailedTestRow {
    fn entity_line(entity: &stackguard_core::FailedEntity) -> String {
        entity.describe()
    }
}

/// Serialize the failed-test report to a result file for the pipeline
pub fn write_result_file(path: &Path, tests: &[FailedTest]) -> Result<()> {
    let json = serde_json::to_string_pretty(tests)?;
    std::fs::write(path, json)
        .with_context(|| format!("could not write result file {}", path.display()))?;
    Ok(())
}
