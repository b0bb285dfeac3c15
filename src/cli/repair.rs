//! Catalog editing commands
//!
//! Every command here loads the catalog, applies one mutation and writes it
//! back atomically. `--dry-run` reports what would change without writing.

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use super::session::Session;
use crate::domain::ExerciseId;
use crate::storage::read_exercise_batch;

fn dry_run_note(dry_run: bool) -> &'static str {
    if dry_run {
        " (dry run)"
    } else {
        ""
    }
}

/// Replace every reference to `wrong` with `correct`
pub fn repair(
    session: &Session,
    output: &Output,
    wrong: &ExerciseId,
    correct: &ExerciseId,
    dry_run: bool,
) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    if catalog.contains(wrong.as_str()) {
        output.warning(&format!(
            "\"{}\" exists in the catalog; its incoming references will move to \"{}\"",
            wrong, correct
        ));
    }

    let replaced = catalog.repair_reference(wrong, correct)?;
    output.verbose_ctx("repair", &format!("Replaced {} references", replaced));

    if replaced > 0 {
        session.save(&store, &catalog, dry_run, output)?;
    }

    // A repair may close a loop; say so rather than refuse
    let cycles: Vec<_> = catalog
        .detect_cycles()
        .into_iter()
        .filter(|cycle| cycle.contains(correct))
        .collect();
    for cycle in &cycles {
        output.warning(&format!("cycle through \"{}\": {}", correct, cycle));
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "wrong": wrong,
            "correct": correct,
            "replaced": replaced,
            "cycles": cycles,
            "dry_run": dry_run,
        }));
    } else if replaced == 0 {
        println!("No references to \"{}\" found.", wrong);
    } else {
        output.success(&format!(
            "Replaced {} reference(s) to \"{}\" with \"{}\"{}",
            replaced,
            wrong,
            correct,
            dry_run_note(dry_run)
        ));
    }

    Ok(())
}

/// Remove one prerequisite from one exercise
pub fn drop(
    session: &Session,
    output: &Output,
    exercise: &ExerciseId,
    reference: &ExerciseId,
    dry_run: bool,
) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    if catalog.contains(reference.as_str()) {
        output.warning(&format!(
            "\"{}\" exists; removing a valid prerequisite of \"{}\"",
            reference, exercise
        ));
    }

    let removed = catalog.drop_reference(exercise, reference)?;
    if removed {
        session.save(&store, &catalog, dry_run, output)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "exercise": exercise,
            "reference": reference,
            "removed": removed,
            "dry_run": dry_run,
        }));
    } else if removed {
        output.success(&format!(
            "Removed \"{}\" from the prerequisites of \"{}\"{}",
            reference,
            exercise,
            dry_run_note(dry_run)
        ));
    } else {
        println!("\"{}\" does not list \"{}\" as a prerequisite.", exercise, reference);
    }

    Ok(())
}

/// Replace an exercise's prerequisite list
pub fn requires(
    session: &Session,
    output: &Output,
    exercise: &ExerciseId,
    prerequisites: Vec<ExerciseId>,
    dry_run: bool,
) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    let old = catalog.set_prerequisites(exercise, prerequisites)?;
    let new = catalog
        .get(exercise.as_str())
        .map(|ex| ex.prerequisites.clone())
        .unwrap_or_default();

    let changed = old != new;
    if changed {
        session.save(&store, &catalog, dry_run, output)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "exercise": exercise,
            "old": old,
            "new": new,
            "changed": changed,
            "dry_run": dry_run,
        }));
    } else if changed {
        output.success(&format!(
            "{}: [{}] -> [{}]{}",
            exercise,
            join_ids(&old),
            join_ids(&new),
            dry_run_note(dry_run)
        ));
    } else {
        println!("Prerequisites of \"{}\" unchanged.", exercise);
    }

    Ok(())
}

/// Apply the configured corrections to every dangling prerequisite
pub fn fix(session: &Session, output: &Output, dry_run: bool) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;
    let corrections = session.corrections();
    output.verbose_ctx("fix", &format!("{} corrections configured", corrections.len()));

    let actions = catalog.apply_corrections(corrections);
    if !actions.is_empty() {
        session.save(&store, &catalog, dry_run, output)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "actions": actions,
            "dry_run": dry_run,
        }));
        return Ok(());
    }

    if actions.is_empty() {
        println!("No dangling prerequisites.");
        return Ok(());
    }

    for action in &actions {
        match &action.replacement {
            Some(replacement) => println!(
                "  {:<30} {} -> {}",
                action.exercise, action.reference, replacement
            ),
            None => println!("  {:<30} {} removed", action.exercise, action.reference),
        }
    }
    let replaced = actions.iter().filter(|a| a.replacement.is_some()).count();
    output.success(&format!(
        "Fixed {} dangling prerequisite(s): {} replaced, {} removed{}",
        actions.len(),
        replaced,
        actions.len() - replaced,
        dry_run_note(dry_run)
    ));

    Ok(())
}

/// Rebuild `progresses_to` from `prerequisites`
pub fn sync(session: &Session, output: &Output, dry_run: bool) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    let changed = catalog.rebuild_progressions();
    if !changed.is_empty() {
        session.save(&store, &catalog, dry_run, output)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "changed": changed,
            "dry_run": dry_run,
        }));
    } else if changed.is_empty() {
        println!("Progressions already match prerequisites.");
    } else {
        for id in &changed {
            output.verbose_ctx("sync", &format!("Rewrote progresses_to of {}", id));
        }
        output.success(&format!(
            "Rebuilt progresses_to for {} exercise(s){}",
            changed.len(),
            dry_run_note(dry_run)
        ));
    }

    Ok(())
}

/// Normalize display names
pub fn names(session: &Session, output: &Output, dry_run: bool) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    let changes = catalog.normalize_names();
    if !changes.is_empty() {
        session.save(&store, &catalog, dry_run, output)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "changes": changes,
            "dry_run": dry_run,
        }));
    } else if changes.is_empty() {
        println!("All display names follow the convention.");
    } else {
        for change in &changes {
            println!("  {:<30} {} -> {}", change.id, change.old, change.new);
        }
        output.success(&format!(
            "Renamed {} exercise(s){}",
            changes.len(),
            dry_run_note(dry_run)
        ));
    }

    Ok(())
}

/// Merge exercises from a JSON file
pub fn add(session: &Session, output: &Output, file: &Path, dry_run: bool) -> Result<()> {
    let (store, mut catalog) = session.load(output)?;

    let batch = read_exercise_batch(file)?;
    output.verbose_ctx("add", &format!("Read {} exercises from {}", batch.len(), file.display()));

    let report = catalog.merge(batch);
    if !report.added.is_empty() {
        session.save(&store, &catalog, dry_run, output)?;
    }

    let dangling: Vec<_> = catalog
        .validate_references()
        .into_iter()
        .filter(|v| report.added.contains(&v.exercise))
        .collect();
    for violation in &dangling {
        output.warning(&violation.to_string());
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "added": report.added,
            "skipped": report.skipped,
            "dangling": dangling,
            "dry_run": dry_run,
        }));
    } else {
        for id in &report.skipped {
            println!("  skipped {} (already present)", id);
        }
        output.success(&format!(
            "Added {} exercise(s), skipped {}{}",
            report.added.len(),
            report.skipped.len(),
            dry_run_note(dry_run)
        ));
    }

    Ok(())
}

fn join_ids(ids: &[ExerciseId]) -> String {
    ids.iter().map(ExerciseId::as_str).collect::<Vec<_>>().join(", ")
}
