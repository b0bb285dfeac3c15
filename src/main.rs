//! exgraph - exercise catalog integrity and progression tool

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = exgraph::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
