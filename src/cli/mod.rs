//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Integrity | Find broken references and cycles | `check`, `check --report`, `cycles` |
//! | Repair | Edit the catalog | `repair`, `drop`, `requires`, `fix`, `sync`, `names`, `add` |
//! | Query | Learner-facing views | `unlocked`, `next`, `skills`, `tree`, `stats` |
//!
//! ## Catalog Location
//!
//! `--catalog <PATH>` (or `EXGRAPH_CATALOG`) wins over the `catalog` key of
//! `exgraph.toml`, which wins over the global config. The fallback is
//! `exercises.json` next to `exgraph.toml` or in the current directory.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! exgraph --verbose check
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod session;
mod check;
mod repair;
mod query;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
