use std::path::PathBuf;

use anyhow::{bail, Context};
use loadcomb_core::combinations::FamilyStatus;
use loadcomb_core::diagnostics::FamilyOutcome;
use loadcomb_core::factors::{preset, CodeProfile};
use loadcomb_core::{load_input, load_profile, save_run, GenerationContext, LimitStateFamily, RunResult};

use crate::output::{print_banner, print_json, print_table};

pub struct GenerateArgs {
    pub input: PathBuf,
    pub profile: String,
    pub profile_file: Option<PathBuf>,
    pub families: Vec<LimitStateFamily>,
    pub triggers: Vec<String>,
    pub parallel: bool,
    pub out: Option<PathBuf>,
}

pub fn run(args: GenerateArgs, json: bool) -> anyhow::Result<()> {
    let input = load_input(&args.input)
        .with_context(|| format!("failed to load input {}", args.input.display()))?;
    let catalog = input
        .into_catalog()
        .and_then(|catalog| catalog.freeze())
        .context("invalid action catalog")?;

    let loaded: CodeProfile;
    let profile = match &args.profile_file {
        Some(path) => {
            loaded = load_profile(path)
                .with_context(|| format!("failed to load profile {}", path.display()))?;
            &loaded
        }
        None => preset(&args.profile).context("failed to select profile")?,
    };

    let families = if args.families.is_empty() {
        LimitStateFamily::ALL.to_vec()
    } else {
        args.families
    };

    let context = args
        .triggers
        .iter()
        .fold(GenerationContext::new(&catalog, profile), |ctx, t| {
            ctx.with_trigger(t.as_str())
        });

    let result = if args.parallel {
        context.run_parallel(&families)
    } else {
        context.run(&families)
    };

    if let Some(out) = &args.out {
        save_run(&result, out).with_context(|| format!("failed to save {}", out.display()))?;
    }

    if json {
        print_json(&result)?;
    } else {
        print_summary(&result, &families);
        if let Some(out) = &args.out {
            println!();
            println!("Saved to {}", out.display());
        }
    }

    let failed = result.diagnostics.failures().count();
    if failed > 0 {
        bail!("{} of {} families failed", failed, families.len());
    }
    Ok(())
}

fn print_summary(result: &RunResult, families: &[LimitStateFamily]) {
    let container = &result.container;

    print_banner(&format!("LOAD COMBINATIONS - {}", result.diagnostics.profile));
    println!();

    for family in LimitStateFamily::ALL.into_iter().filter(|f| families.contains(f)) {
        match result.diagnostics.outcome(family) {
            Some(FamilyOutcome::Failed { error }) => {
                println!("{} ({}): FAILED", family.display_name(), family);
                println!("  {}", error);
            }
            Some(FamilyOutcome::Generated { duplicates_discarded, .. }) => {
                match container.status(family) {
                    FamilyStatus::Populated { count } => {
                        println!(
                            "{} ({}): {} combinations, {} duplicates discarded",
                            family.display_name(),
                            family,
                            count,
                            duplicates_discarded
                        );
                    }
                    _ => println!("{} ({}): none", family.display_name(), family),
                }
                let rows = container
                    .family(family)
                    .iter()
                    .map(|c| {
                        vec![
                            c.label.clone(),
                            c.leading.clone().unwrap_or_else(|| "-".to_string()),
                            c.expression.clone(),
                        ]
                    })
                    .collect::<Vec<_>>();
                if !rows.is_empty() {
                    print_table(&["Label", "Leading", "Combination"], rows);
                }
            }
            None => {}
        }
        println!();
    }

    if !result.diagnostics.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.diagnostics.warnings {
            println!("  ⚠ {}", warning);
        }
        println!();
    }

    println!("Total: {} combinations", container.len());
}
