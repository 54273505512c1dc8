use std::path::Path;

use anyhow::Context;
use loadcomb_core::actions::Relation;
use loadcomb_core::diagnostics::PatternWarning;
use loadcomb_core::load_input;
use serde::Serialize;

use crate::output::{print_banner, print_json, print_table};

#[derive(Serialize)]
struct CheckReport<'a> {
    project: Option<&'a str>,
    actions: usize,
    relations: Vec<Relation>,
    warnings: &'a [PatternWarning],
}

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let input = load_input(path)
        .with_context(|| format!("failed to load input {}", path.display()))?;
    let project = input.project.clone();
    let catalog = input
        .into_catalog()
        .and_then(|catalog| catalog.freeze())
        .context("invalid action catalog")?;

    let report = CheckReport {
        project: project.as_deref(),
        actions: catalog.len(),
        relations: catalog.relations(),
        warnings: catalog.warnings(),
    };

    if json {
        return print_json(&report);
    }

    print_banner(&format!("ACTION CATALOG - {}", report.project.unwrap_or("unnamed")));
    println!();

    let rows = catalog
        .actions()
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.category().code().to_string(),
                a.psi_group().or(a.origin_group()).unwrap_or("-").to_string(),
                a.name.clone(),
            ]
        })
        .collect();
    print_table(&["Id", "Cat", "Group", "Name"], rows);
    println!();

    if report.relations.is_empty() {
        println!("No relations.");
    } else {
        println!("Relations:");
        for relation in &report.relations {
            match relation {
                Relation::Incompatibility { a, b } => println!("  {} ✗ {}", a, b),
                Relation::Dependency { action, required } => {
                    println!("  {} requires one of [{}]", action, required.join(", "))
                }
            }
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in report.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    println!();
    println!("✓ {} actions OK", report.actions);
    Ok(())
}
