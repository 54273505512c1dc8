//! # Loadcomb CLI
//!
//! Generates design load combinations from an action catalog (JSON) and a
//! code profile, and prints or saves them.
//!
//! ```text
//! loadcomb generate --input roof.json --family uls-persistent --out roof.combinations.json
//! loadcomb check --input roof.json
//! loadcomb profiles
//! ```

mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loadcomb_core::LimitStateFamily;

#[derive(Parser)]
#[command(
    name = "loadcomb",
    about = "Generate limit-state load combinations from an action catalog",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Show debug logs (RUST_LOG overrides)
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate combinations for the requested families
    Generate {
        /// Input document with the action catalog
        #[arg(long, short = 'i', env = "LOADCOMB_INPUT")]
        input: PathBuf,

        /// Built-in code profile
        #[arg(long, short = 'p', env = "LOADCOMB_PROFILE", default_value = "en1990", conflicts_with = "profile_file")]
        profile: String,

        /// Code profile JSON file (instead of a built-in profile)
        #[arg(long)]
        profile_file: Option<PathBuf>,

        /// Family to generate, by slug or prefix (repeatable; default: all)
        #[arg(long = "family", short = 'f')]
        families: Vec<LimitStateFamily>,

        /// Pattern of not-determinant actions allowed to lead (repeatable)
        #[arg(long = "trigger", short = 't')]
        triggers: Vec<String>,

        /// Generate families in parallel
        #[arg(long)]
        parallel: bool,

        /// Save the run report to this file
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Validate an input document and show the resolved relations
    Check {
        /// Input document with the action catalog
        #[arg(long, short = 'i', env = "LOADCOMB_INPUT")]
        input: PathBuf,
    },

    /// List the built-in code profiles
    Profiles,

    /// Print a built-in code profile
    Profile { name: String },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate {
            input,
            profile,
            profile_file,
            families,
            triggers,
            parallel,
            out,
        } => cmd::generate::run(
            cmd::generate::GenerateArgs {
                input,
                profile,
                profile_file,
                families,
                triggers,
                parallel,
                out,
            },
            cli.json,
        ),
        Commands::Check { input } => cmd::check::run(&input, cli.json),
        Commands::Profiles => cmd::profile::list(cli.json),
        Commands::Profile { name } => cmd::profile::show(&name),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
