//! Integrity commands (check, cycles)

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use super::output::Output;
use super::session::Session;
use crate::domain::AuditReport;

/// Run every check and audit rule
///
/// Fails when the catalog has dangling references or cycles, so the command
/// can gate a CI job. Warnings never fail.
pub fn check(session: &Session, output: &Output, report_path: Option<&Path>) -> Result<()> {
    let (store, catalog) = session.load(output)?;
    let rules = session.audit_rules();
    output.verbose_ctx(
        "check",
        &format!(
            "Auditing with min_skill_stages={}, {} allowed patterns",
            rules.min_skill_stages,
            rules.patterns.len()
        ),
    );

    let report = catalog.audit(&rules);
    output.verbose_ctx(
        "check",
        &format!(
            "Found {} violations, {} cycles, {} warnings",
            report.violations.len(),
            report.cycles.len(),
            report.warnings.len()
        ),
    );

    if let Some(path) = report_path {
        write_report(path, &store.path().display().to_string(), &report)?;
        output.verbose_ctx("check", &format!("Report written to {}", path.display()));
    }

    if output.is_json() {
        output.data(&report);
    } else {
        print_report(&store.path().display().to_string(), &report);
    }

    if report.has_errors() {
        bail!(
            "{} integrity error(s): {} dangling reference(s), {} cycle(s)",
            report.error_count(),
            report.violations.len(),
            report.cycles.len()
        );
    }

    if !output.is_json() {
        println!();
        println!("No integrity errors.");
    }

    Ok(())
}

/// List prerequisite cycles
pub fn cycles(session: &Session, output: &Output) -> Result<()> {
    let (_, catalog) = session.load(output)?;
    let cycles = catalog.detect_cycles();
    output.verbose_ctx("cycles", &format!("Found {} cycles", cycles.len()));

    if output.is_json() {
        output.data(&cycles);
    } else if cycles.is_empty() {
        println!("No cycles.");
    } else {
        println!("Cycles ({}):", cycles.len());
        for cycle in &cycles {
            println!("  {}", cycle);
        }
    }

    Ok(())
}

fn write_report(path: &Path, catalog: &str, report: &AuditReport) -> Result<()> {
    let document = serde_json::json!({
        "generated_at": Utc::now().to_rfc3339(),
        "catalog": catalog,
        "summary": {
            "total_exercises": report.total_exercises,
            "total_skills": report.total_skills,
            "errors": report.error_count(),
            "warnings": report.warnings.len(),
        },
        "violations": report.violations,
        "cycles": report.cycles,
        "warnings": report.warnings,
    });

    let content = serde_json::to_string_pretty(&document).context("Failed to serialize report")?;
    fs::write(path, content + "\n")
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

fn print_report(catalog: &str, report: &AuditReport) {
    println!("Catalog: {}", catalog);
    println!(
        "Exercises: {}  Skills: {}",
        report.total_exercises, report.total_skills
    );
    println!("{}", "=".repeat(60));

    println!();
    if report.violations.is_empty() {
        println!("Dangling references: none");
    } else {
        println!("Dangling references ({}):", report.violations.len());
        for violation in &report.violations {
            println!("  {}", violation);
        }
    }

    println!();
    if report.cycles.is_empty() {
        println!("Cycles: none");
    } else {
        println!("Cycles ({}):", report.cycles.len());
        for cycle in &report.cycles {
            println!("  {}", cycle);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  {:<22} {}", warning.kind.label(), warning.message);
        }
    }
}
