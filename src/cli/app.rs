//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::session::Session;
use super::{analyze, audit, transform};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "ccron")]
#[command(author, version, about = "Audits construction schedule exports")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file to use instead of the discovered .ccron/config.toml
    #[arg(long, global = true, env = "CCRON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service → coding cross-reference table (.json, .jsonl or .yaml)
    #[arg(long, global = true, env = "CCRON_CROSS_REFERENCE")]
    pub cross_reference: Option<PathBuf>,

    /// Reference macro-flow template (.json, .jsonl or .yaml)
    #[arg(long, global = true, env = "CCRON_TEMPLATE")]
    pub template: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ccron project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Normalize and code a schedule export
    Transform {
        /// Schedule rows as a JSON array or JSON Lines ("-" for stdin)
        input: PathBuf,
    },

    /// Find overlapping occurrences and long gaps per service
    Overlaps {
        /// Schedule rows as a JSON array or JSON Lines ("-" for stdin)
        input: PathBuf,

        /// Report gaps longer than this many days
        #[arg(long)]
        gap_threshold: Option<i64>,
    },

    /// Compare service predecessors against the reference template
    Macroflow {
        /// Schedule rows as a JSON array or JSON Lines ("-" for stdin)
        input: PathBuf,
    },

    /// Run every check and print the combined report
    Audit {
        /// Schedule rows as a JSON array or JSON Lines ("-" for stdin)
        input: PathBuf,

        /// Reference date for date checks, dd/mm/yyyy (defaults to today)
        #[arg(long)]
        as_of: Option<String>,

        /// Report gaps longer than this many days
        #[arg(long)]
        gap_threshold: Option<i64>,

        /// Exit with an error when anything is flagged
        #[arg(long)]
        strict: bool,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let session = Session::load(
        cli.config.as_deref(),
        cli.cross_reference.clone(),
        cli.template.clone(),
    )?;
    let format = cli
        .format
        .unwrap_or_else(|| session.config().global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("ccron starting");
    session.describe(&output);

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .ccron directory at: {}", project.project_dir().display()),
            );
            output.verbose_ctx(
                "init",
                &format!("Place reference datasets in: {}", project.reference_dir().display()),
            );
            output.success(&format!(
                "Initialized ccron project at {}",
                project.root().display()
            ));
        }

        Commands::Transform { input } => transform::run(&output, &session, &input)?,

        Commands::Overlaps { input, gap_threshold } => {
            output.verbose_ctx("overlaps", &format!("Gap threshold flag: {:?}", gap_threshold));
            analyze::overlaps(&output, &session, &input, gap_threshold)?
        }

        Commands::Macroflow { input } => analyze::macroflow(&output, &session, &input)?,

        Commands::Audit {
            input,
            as_of,
            gap_threshold,
            strict,
        } => {
            output.verbose_ctx(
                "audit",
                &format!("as_of={:?}, gap_threshold={:?}, strict={}", as_of, gap_threshold, strict),
            );
            audit::run(&output, &session, &input, as_of.as_deref(), gap_threshold, strict)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
