//! Query commands (unlocked, next, skills, tree, stats)
//!
//! Read-only views over the catalog. None of these write the document.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Result};

use super::output::Output;
use super::session::Session;
use crate::domain::{Catalog, CatalogError, Exercise, ExerciseId};
use crate::storage::read_mastered;

fn score(exercise: &Exercise) -> String {
    exercise
        .difficulty_score
        .as_ref()
        .map(|s| s.value().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn describe(exercise: &Exercise) -> serde_json::Value {
    serde_json::json!({
        "id": exercise.id,
        "name": exercise.name,
        "skill": exercise.skill,
        "difficulty_score": exercise.difficulty_score,
    })
}

/// Options for `exgraph unlocked`
pub struct UnlockedArgs<'a> {
    pub mastered: &'a [ExerciseId],
    pub mastered_file: Option<&'a Path>,
    pub skills_only: bool,
    pub locked: bool,
}

/// Show what a learner can train next
pub fn unlocked(session: &Session, output: &Output, args: UnlockedArgs<'_>) -> Result<()> {
    let (_, catalog) = session.load(output)?;

    let mut mastered: HashSet<ExerciseId> = args.mastered.iter().cloned().collect();
    if let Some(path) = args.mastered_file {
        let from_file = read_mastered(path)?;
        output.verbose_ctx(
            "unlocked",
            &format!("Read {} mastered IDs from {}", from_file.len(), path.display()),
        );
        mastered.extend(from_file);
    }

    let mut unknown: Vec<&ExerciseId> = mastered
        .iter()
        .filter(|id| !catalog.contains(id.as_str()))
        .collect();
    unknown.sort();
    for id in unknown {
        output.warning(&format!("mastered exercise \"{}\" is not in the catalog", id));
    }

    if args.locked {
        return locked(&catalog, &mastered, args.skills_only, output);
    }

    let unlocked = catalog.evaluate_unlocked(&mastered);
    let exercises: Vec<&Exercise> = catalog
        .iter()
        .filter(|ex| unlocked.contains(&ex.id))
        .filter(|ex| !args.skills_only || ex.skill.is_some())
        .collect();
    output.verbose_ctx(
        "unlocked",
        &format!("{} mastered, {} unlocked", mastered.len(), exercises.len()),
    );

    if output.is_json() {
        let items: Vec<_> = exercises.iter().map(|ex| describe(ex)).collect();
        output.data(&items);
    } else if exercises.is_empty() {
        println!("Nothing unlocked.");
    } else {
        println!("Unlocked exercises ({}):", exercises.len());
        println!("{:<36} {:<24} {:>6}  NAME", "ID", "SKILL", "SCORE");
        println!("{}", "-".repeat(90));
        for ex in exercises {
            println!(
                "{:<36} {:<24} {:>6}  {}",
                ex.id,
                ex.skill.as_deref().unwrap_or("-"),
                score(ex),
                ex.name
            );
        }
    }

    Ok(())
}

fn locked(
    catalog: &Catalog,
    mastered: &HashSet<ExerciseId>,
    skills_only: bool,
    output: &Output,
) -> Result<()> {
    let statuses: Vec<_> = catalog
        .lock_status(mastered)
        .into_iter()
        .filter(|status| !status.is_unlocked())
        .filter(|status| {
            !skills_only
                || catalog
                    .get(status.id.as_str())
                    .is_some_and(|ex| ex.skill.is_some())
        })
        .collect();

    if output.is_json() {
        output.data(&statuses);
    } else if statuses.is_empty() {
        println!("Nothing locked.");
    } else {
        println!("Locked exercises ({}):", statuses.len());
        println!("{:<36} MISSING", "ID");
        println!("{}", "-".repeat(80));
        for status in statuses {
            let missing: Vec<&str> = status.missing.iter().map(ExerciseId::as_str).collect();
            println!("{:<36} {}", status.id, missing.join(", "));
        }
    }

    Ok(())
}

/// Show the exercises that follow one exercise
pub fn next(session: &Session, output: &Output, id: &ExerciseId) -> Result<()> {
    let (_, catalog) = session.load(output)?;

    if !catalog.contains(id.as_str()) {
        return Err(CatalogError::UnknownExercise(id.clone()).into());
    }
    if !catalog.progressions_consistent(id) {
        output.verbose_ctx(
            "next",
            &format!("Stored progresses_to of {} missing or stale; derived from prerequisites", id),
        );
    }

    let steps = catalog.next_steps(id);

    if output.is_json() {
        let items: Vec<_> = steps
            .iter()
            .map(|step| match catalog.get(step.as_str()) {
                Some(ex) => describe(ex),
                None => serde_json::json!({ "id": step }),
            })
            .collect();
        output.data(&items);
    } else if steps.is_empty() {
        println!("Nothing follows \"{}\".", id);
    } else {
        println!("After {}:", id);
        for step in &steps {
            match catalog.get(step.as_str()) {
                Some(ex) => println!("  {:<36} {}", ex.id, ex.name),
                None => println!("  {:<36} (not found)", step),
            }
        }
    }

    Ok(())
}

/// List skill families ordered by difficulty
pub fn skills(session: &Session, output: &Output) -> Result<()> {
    let (_, catalog) = session.load(output)?;
    let groups = catalog.group_by_skill();

    if output.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = groups
            .iter()
            .map(|(skill, exercises)| {
                let items: Vec<_> = exercises.iter().map(|ex| describe(ex)).collect();
                (skill.clone(), serde_json::Value::from(items))
            })
            .collect();
        output.data(&map);
    } else if groups.is_empty() {
        println!("No skills defined.");
    } else {
        for (skill, exercises) in &groups {
            println!("{} ({})", skill, exercises.len());
            for ex in exercises {
                println!("  {:>6}  {:<36} {}", score(ex), ex.id, ex.name);
            }
        }
    }

    Ok(())
}

/// Print progression trees, one per skill
pub fn tree(session: &Session, output: &Output, skill: Option<&str>) -> Result<()> {
    let (_, catalog) = session.load(output)?;
    let groups = catalog.group_by_skill();

    let skills: Vec<&str> = match skill {
        Some(name) if groups.contains_key(name) => vec![name],
        Some(name) => bail!("Unknown skill: {}", name),
        None => groups.keys().map(String::as_str).collect(),
    };

    if output.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = skills
            .iter()
            .map(|name| {
                let lines = serde_json::to_value(catalog.skill_tree(name))
                    .unwrap_or(serde_json::Value::Null);
                (name.to_string(), lines)
            })
            .collect();
        output.data(&map);
        return Ok(());
    }

    for (i, name) in skills.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", name);
        for line in catalog.skill_tree(name) {
            let indent = "  ".repeat(line.depth + 1);
            let label = catalog
                .get(line.id.as_str())
                .map(|ex| ex.name.as_str())
                .unwrap_or("");
            if line.repeated {
                println!("{}{} (see above)", indent, line.id);
            } else {
                println!("{}{} {}", indent, line.id, label);
            }
        }
    }

    Ok(())
}

/// Show catalog statistics
pub fn stats(session: &Session, output: &Output) -> Result<()> {
    let (_, catalog) = session.load(output)?;
    let stats = catalog.stats();

    if output.is_json() {
        output.data(&stats);
        return Ok(());
    }

    println!("Catalog Statistics");
    println!("{}", "=".repeat(40));
    println!();
    println!("Exercises:          {}", stats.total_exercises);
    println!("Root exercises:     {}", stats.roots);
    println!("Prerequisite links: {}", stats.prerequisite_links);
    match stats.max_difficulty {
        Some(max) => println!("Max difficulty:     {}", max),
        None => println!("Max difficulty:     -"),
    }

    if !stats.by_pattern.is_empty() {
        println!();
        println!("By pattern:");
        for (pattern, count) in &stats.by_pattern {
            println!("  {:<24} {}", pattern, count);
        }
    }

    if !stats.by_skill.is_empty() {
        println!();
        println!("By skill ({}):", stats.by_skill.len());
        for (skill, count) in &stats.by_skill {
            println!("  {:<24} {}", skill, count);
        }
    }

    Ok(())
}
