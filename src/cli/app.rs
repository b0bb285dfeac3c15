//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::query::UnlockedArgs;
use super::session::Session;
use super::{check, query, repair};
use crate::domain::ExerciseId;
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "exgraph")]
#[command(author, version, about = "Integrity checks and progression queries for exercise catalogs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Catalog document (overrides exgraph.toml)
    #[arg(long, short = 'c', global = true, env = "EXGRAPH_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default exgraph.toml
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Check references and cycles, and audit data quality
    Check {
        /// Also write the findings as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List prerequisite cycles
    Cycles,

    /// Replace every reference to WRONG with CORRECT
    Repair {
        wrong: ExerciseId,
        correct: ExerciseId,

        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove one prerequisite from an exercise
    Drop {
        exercise: ExerciseId,
        reference: ExerciseId,

        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Set an exercise's prerequisites (none clears them)
    Requires {
        exercise: ExerciseId,
        prerequisites: Vec<ExerciseId>,

        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply the configured corrections to dangling prerequisites
    Fix {
        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild progresses_to from prerequisites
    Sync {
        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Normalize display names ("Pull-up" -> "Pull-Up")
    Names {
        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge exercises from a JSON file
    Add {
        /// JSON array of exercises, or a catalog document
        file: PathBuf,

        /// Preview without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Show exercises unlocked by a mastered set
    Unlocked {
        /// Mastered exercise (repeatable)
        #[arg(long, short = 'm')]
        mastered: Vec<ExerciseId>,

        /// File of mastered IDs (JSON array or one per line)
        #[arg(long)]
        mastered_file: Option<PathBuf>,

        /// Only exercises that belong to a skill
        #[arg(long)]
        skills_only: bool,

        /// Show locked exercises and what they are missing instead
        #[arg(long)]
        locked: bool,
    },

    /// Show what follows an exercise
    Next { exercise: ExerciseId },

    /// List skill families ordered by difficulty
    Skills,

    /// Print progression trees
    Tree {
        /// Only this skill
        skill: Option<String>,
    },

    /// Show catalog statistics
    Stats,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        let output = Output::new(cli.format.unwrap_or_default(), cli.verbose);
        output.verbose_ctx("init", &format!("Initializing project at: {}", path.display()));
        let project = Project::init(path)?;
        output.success(&format!(
            "Initialized exgraph project at {}",
            project.root().display()
        ));
        return Ok(());
    }

    let project = Project::open_current()?;
    let format = cli.format.unwrap_or(project.config().global.default_format);
    let output = Output::new(format, cli.verbose);

    output.verbose_ctx(
        "config",
        &format!(
            "Project root: {} ({})",
            project.root().display(),
            if project.config().is_in_project() {
                "exgraph.toml found"
            } else {
                "no exgraph.toml"
            }
        ),
    );

    let session = Session::new(project, cli.catalog);
    output.verbose_ctx("config", &format!("Catalog: {}", session.catalog_path().display()));

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Check { report } => check::check(&session, &output, report.as_deref())?,
        Commands::Cycles => check::cycles(&session, &output)?,

        Commands::Repair { wrong, correct, dry_run } => {
            output.verbose_ctx("repair", &format!("{} -> {}", wrong, correct));
            repair::repair(&session, &output, &wrong, &correct, dry_run)?
        }
        Commands::Drop { exercise, reference, dry_run } => {
            repair::drop(&session, &output, &exercise, &reference, dry_run)?
        }
        Commands::Requires { exercise, prerequisites, dry_run } => {
            repair::requires(&session, &output, &exercise, prerequisites, dry_run)?
        }
        Commands::Fix { dry_run } => repair::fix(&session, &output, dry_run)?,
        Commands::Sync { dry_run } => repair::sync(&session, &output, dry_run)?,
        Commands::Names { dry_run } => repair::names(&session, &output, dry_run)?,
        Commands::Add { file, dry_run } => repair::add(&session, &output, &file, dry_run)?,

        Commands::Unlocked { mastered, mastered_file, skills_only, locked } => {
            let args = UnlockedArgs {
                mastered: &mastered,
                mastered_file: mastered_file.as_deref(),
                skills_only,
                locked,
            };
            query::unlocked(&session, &output, args)?
        }
        Commands::Next { exercise } => query::next(&session, &output, &exercise)?,
        Commands::Skills => query::skills(&session, &output)?,
        Commands::Tree { skill } => query::tree(&session, &output, skill.as_deref())?,
        Commands::Stats => query::stats(&session, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
