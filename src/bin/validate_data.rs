//! Data Validation Binary
//!
//! Validates projects.json before the enrichment passes run:
//! - Duplicate project ids and missing titles are errors
//! - Missing abstracts, unknown booth prefixes and blank awards are warnings

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;

use isef_scout::categorize;
use isef_scout::config::Config;
use isef_scout::storage::Store;
use isef_scout::Project;

#[derive(Parser)]
#[command(name = "validate_data", about = "Check projects.json for duplicate and incomplete records")]
struct Cli {
    #[arg(long, env = "ROOT", default_value = ".")]
    root: PathBuf,
}

#[derive(Debug, Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn validate_projects(projects: &[Project]) -> Report {
    let mut report = Report::default();
    let mut seen = HashSet::new();

    for project in projects {
        if !seen.insert(project.id) {
            report.errors.push(format!("Project {} appears more than once", project.id));
        }

        if project.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            report.errors.push(format!("Project {} has no title", project.id));
        }

        if project.abstract_text.is_none() {
            report.warnings.push(format!("Project {} has no abstract", project.id));
        }

        if let Some(booth) = project.booth.as_deref() {
            match categorize::extract_booth_prefix(booth) {
                Some(prefix) if categorize::category_for_prefix(prefix).is_none() => {
                    report.warnings.push(format!(
                        "Project {} has unknown booth prefix '{}' ({})",
                        project.id, prefix, booth
                    ));
                }
                _ => {}
            }
        }

        if project.awards.iter().any(|a| a.trim().is_empty()) {
            report.warnings.push(format!("Project {} has a blank award entry", project.id));
        }
    }

    report
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("=== Project Data Validator ===");

    let config = Config::load(&cli.root)?;
    let projects = Store::from_config(&config)
        .require_projects()
        .context("Failed to load projects.json")?;

    let report = validate_projects(&projects);

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("✓ All {} projects are valid", projects.len());
        return Ok(());
    }

    if !report.errors.is_empty() {
        println!("\n❌ ERRORS (must fix):");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    if !report.warnings.is_empty() {
        println!("\n⚠️  WARNINGS:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    println!(
        "\nChecked {} projects: {} error(s), {} warning(s)",
        projects.len(),
        report.errors.len(),
        report.warnings.len()
    );

    if !report.errors.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
