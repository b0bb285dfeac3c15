//! CLI integration tests for exgraph
//!
//! These tests drive the binary against catalogs in temporary directories,
//! covering the check, repair and query workflows end to end.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BROKEN: &str = r#"{
  "version": "1.1",
  "exercises": [
    {"id": "a", "name": "Wall Push-Up", "skill": "push_up", "pattern": "push", "difficulty_score": 1, "prerequisites": [], "progresses_to": ["b"]},
    {"id": "b", "name": "Knee Push-up", "skill": "push_up", "pattern": "push", "difficulty_score": 2, "prerequisites": ["a"], "progresses_to": ["c"]},
    {"id": "c", "name": "Push-Up", "skill": "push_up", "pattern": "push", "difficulty_score": 3, "prerequisites": ["b", "x"], "progresses_to": []}
  ],
  "indexes": {"by_id": {"a": 0, "b": 1, "c": 2}}
}
"#;

const CLEAN: &str = r#"{
  "exercises": [
    {"id": "a", "name": "Wall Push-Up", "skill": "push_up", "pattern": "push", "difficulty_score": 1, "prerequisites": [], "progresses_to": ["b"]},
    {"id": "b", "name": "Knee Push-Up", "skill": "push_up", "pattern": "push", "difficulty_score": 2, "prerequisites": ["a"], "progresses_to": ["c"]},
    {"id": "c", "name": "Push-Up", "skill": "push_up", "pattern": "push", "difficulty_score": 3, "prerequisites": ["b"], "progresses_to": []}
  ]
}
"#;

const CYCLIC: &str = r#"{
  "exercises": [
    {"id": "a", "name": "A", "prerequisites": ["b"]},
    {"id": "b", "name": "B", "prerequisites": ["a"]}
  ]
}
"#;

/// Get a command instance for the exgraph binary
fn exgraph_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("exgraph"));
    cmd.env_remove("EXGRAPH_CATALOG");
    cmd
}

/// Create an initialized project holding the given catalog
fn setup_catalog(document: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    exgraph_cmd().arg("init").arg(dir.path()).assert().success();
    fs::write(dir.path().join("exercises.json"), document).unwrap();
    dir
}

/// Command running inside the project, isolated from the user's global config
fn project_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = exgraph_cmd();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("HOME", dir.path());
    cmd
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn prerequisites_of(dir: &TempDir, index: usize) -> Vec<String> {
    let doc = read_json(&dir.path().join("exercises.json"));
    doc["exercises"][index]["prerequisites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_config() {
    let dir = TempDir::new().unwrap();

    exgraph_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized exgraph project"));

    let config = fs::read_to_string(dir.path().join("exgraph.toml")).unwrap();
    assert!(config.contains("[corrections]"));
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    exgraph_cmd().arg("init").arg(dir.path()).assert().success();
    fs::write(dir.path().join("exgraph.toml"), "catalog = \"mine.json\"\n").unwrap();

    exgraph_cmd().arg("init").arg(dir.path()).assert().success();

    let config = fs::read_to_string(dir.path().join("exgraph.toml")).unwrap();
    assert_eq!(config, "catalog = \"mine.json\"\n");
}

#[test]
fn test_missing_catalog_fails() {
    let dir = TempDir::new().unwrap();
    exgraph_cmd().arg("init").arg(dir.path()).assert().success();

    project_cmd(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Catalog not found"));
}

// =============================================================================
// Check Tests
// =============================================================================

#[test]
fn test_check_clean_catalog() {
    let dir = setup_catalog(CLEAN);

    project_cmd(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dangling references: none"))
        .stdout(predicate::str::contains("No integrity errors"));
}

#[test]
fn test_check_reports_dangling_reference() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("c --[prerequisites]--> x (not found)"))
        .stderr(predicate::str::contains("1 dangling reference(s)"));
}

#[test]
fn test_check_json_output() {
    let dir = setup_catalog(BROKEN);

    let output = project_cmd(&dir)
        .args(["--format", "json", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_exercises"], 3);
    assert_eq!(report["violations"][0]["exercise"], "c");
    assert_eq!(report["violations"][0]["reference"], "x");
    assert_eq!(report["violations"][0]["relation"], "prerequisites");
}

#[test]
fn test_check_writes_report() {
    let dir = setup_catalog(CLEAN);
    let report_path = dir.path().join("report.json");

    project_cmd(&dir)
        .arg("check")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success();

    let report = read_json(&report_path);
    assert!(report["generated_at"].is_string());
    assert_eq!(report["summary"]["errors"], 0);
    assert_eq!(report["summary"]["total_exercises"], 3);
}

#[test]
fn test_check_does_not_modify_catalog() {
    let dir = setup_catalog(BROKEN);
    let path = dir.path().join("exercises.json");

    project_cmd(&dir).arg("check").assert().failure();

    assert_eq!(fs::read_to_string(path).unwrap(), BROKEN);
}

#[test]
fn test_cycles_listed() {
    let dir = setup_catalog(CYCLIC);

    project_cmd(&dir)
        .arg("cycles")
        .assert()
        .success()
        .stdout(predicate::str::contains("a -> b -> a"));

    project_cmd(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 cycle(s)"));
}

#[test]
fn test_catalog_flag_and_env() {
    let dir = setup_catalog(CLEAN);
    let other = dir.path().join("other.json");
    fs::write(&other, CYCLIC).unwrap();

    project_cmd(&dir)
        .arg("cycles")
        .arg("--catalog")
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycles (1)"));

    project_cmd(&dir)
        .env("EXGRAPH_CATALOG", &other)
        .arg("cycles")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycles (1)"));
}

// =============================================================================
// Repair Tests
// =============================================================================

#[test]
fn test_repair_fixes_dangling_reference() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["repair", "x", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replaced 1 reference(s)"));

    assert_eq!(prerequisites_of(&dir, 2), vec!["b", "a"]);
    project_cmd(&dir).arg("check").assert().success();

    // Other top-level fields survive and the index is regenerated
    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["version"], "1.1");
    assert_eq!(doc["indexes"]["by_id"]["c"], 2);
}

#[test]
fn test_repair_unknown_target_fails() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["repair", "x", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown target exercise: nope"));
}

#[test]
fn test_repair_dry_run_leaves_file() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["repair", "x", "a", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry run"));

    assert_eq!(
        fs::read_to_string(dir.path().join("exercises.json")).unwrap(),
        BROKEN
    );
}

#[test]
fn test_repair_then_unlock() {
    let dir = setup_catalog(BROKEN);

    // c is held back by the dangling x
    project_cmd(&dir)
        .args(["unlocked", "-m", "a", "-m", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing unlocked"));

    project_cmd(&dir).args(["repair", "x", "a"]).assert().success();

    project_cmd(&dir)
        .args(["unlocked", "-m", "a", "-m", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Push-Up"));
}

#[test]
fn test_drop_removes_one_prerequisite() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["drop", "c", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed \"x\""));

    assert_eq!(prerequisites_of(&dir, 2), vec!["b"]);

    project_cmd(&dir)
        .args(["drop", "c", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("does not list"));
}

#[test]
fn test_drop_unknown_exercise_fails() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["drop", "zzz", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exercise not found: zzz"));
}

#[test]
fn test_requires_sets_prerequisites() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .args(["requires", "c", "a", "b", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[b, x] -> [a, b]"));

    assert_eq!(prerequisites_of(&dir, 2), vec!["a", "b"]);

    project_cmd(&dir)
        .args(["requires", "c", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown target exercise: ghost"));
}

#[test]
fn test_fix_uses_configured_corrections() {
    let dir = setup_catalog(BROKEN);
    fs::write(dir.path().join("exgraph.toml"), "[corrections]\nx = \"a\"\n").unwrap();

    project_cmd(&dir)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("x -> a"))
        .stdout(predicate::str::contains("1 replaced, 0 removed"));

    assert_eq!(prerequisites_of(&dir, 2), vec!["b", "a"]);
}

#[test]
fn test_fix_removes_unmapped_reference() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("x removed"));

    assert_eq!(prerequisites_of(&dir, 2), vec!["b"]);
}

#[test]
fn test_sync_rebuilds_progressions() {
    let dir = setup_catalog(BROKEN);
    project_cmd(&dir).args(["repair", "x", "a"]).assert().success();

    project_cmd(&dir)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt progresses_to for 1 exercise(s)"));

    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["exercises"][0]["progresses_to"], serde_json::json!(["b", "c"]));

    project_cmd(&dir)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("already match"));
}

#[test]
fn test_names_normalizes() {
    let dir = setup_catalog(BROKEN);

    project_cmd(&dir)
        .arg("names")
        .assert()
        .success()
        .stdout(predicate::str::contains("Knee Push-up -> Knee Push-Up"));

    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["exercises"][1]["name"], "Knee Push-Up");
}

#[test]
fn test_names_capitalizes_every_word_after_hyphen() {
    let dir = setup_catalog(
        r#"{"exercises": [{"id": "toes_to_bar", "name": "Toes-to-bar", "prerequisites": []}]}"#,
    );

    project_cmd(&dir)
        .arg("names")
        .assert()
        .success()
        .stdout(predicate::str::contains("Toes-to-bar -> Toes-To-Bar"));

    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["exercises"][0]["name"], "Toes-To-Bar");
}

#[test]
fn test_fix_keeps_repeated_valid_prerequisites() {
    let document = r#"{"exercises": [
    {"id": "a", "name": "A", "prerequisites": []},
    {"id": "b", "name": "B", "prerequisites": ["a", "a"]}
]}"#;
    let dir = setup_catalog(document);

    project_cmd(&dir)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("No dangling prerequisites."));

    assert_eq!(prerequisites_of(&dir, 1), vec!["a", "a"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("exercises.json")).unwrap(),
        document
    );
}

#[test]
fn test_add_merges_batch() {
    let dir = setup_catalog(CLEAN);
    let batch = dir.path().join("new.json");
    fs::write(
        &batch,
        r#"[
            {"id": "a", "name": "Duplicate"},
            {"id": "d", "name": "Decline Push-Up", "prerequisites": ["c"]}
        ]"#,
    )
    .unwrap();

    project_cmd(&dir)
        .arg("add")
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 exercise(s), skipped 1"));

    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["exercises"].as_array().unwrap().len(), 4);
    assert_eq!(doc["exercises"][0]["name"], "Wall Push-Up");
}

#[test]
fn test_add_first_duplicate_in_batch_wins() {
    let dir = setup_catalog(CLEAN);
    let batch = dir.path().join("new.json");
    fs::write(
        &batch,
        r#"[
            {"id": "d", "name": "Decline Push-Up", "prerequisites": ["c"]},
            {"id": "d", "name": "Second Decline"}
        ]"#,
    )
    .unwrap();

    project_cmd(&dir)
        .arg("add")
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 exercise(s), skipped 1"))
        .stdout(predicate::str::contains("skipped d (already present)"));

    let doc = read_json(&dir.path().join("exercises.json"));
    assert_eq!(doc["exercises"].as_array().unwrap().len(), 4);
    assert_eq!(doc["exercises"][3]["name"], "Decline Push-Up");
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_unlocked_empty_mastered_gives_roots() {
    let dir = setup_catalog(CLEAN);

    let output = project_cmd(&dir)
        .args(["-f", "json", "unlocked"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items, serde_json::json!([{
        "id": "a",
        "name": "Wall Push-Up",
        "skill": "push_up",
        "difficulty_score": 1
    }]));
}

#[test]
fn test_unlocked_from_file_and_locked_view() {
    let dir = setup_catalog(BROKEN);
    let mastered = dir.path().join("mastered.txt");
    fs::write(&mastered, "# done so far\na\n").unwrap();

    project_cmd(&dir)
        .arg("unlocked")
        .arg("--mastered-file")
        .arg(&mastered)
        .assert()
        .success()
        .stdout(predicate::str::contains("Knee Push-up"));

    project_cmd(&dir)
        .arg("unlocked")
        .arg("--locked")
        .arg("--mastered-file")
        .arg(&mastered)
        .assert()
        .success()
        .stdout(predicate::str::contains("b, x"));
}

#[test]
fn test_unlocked_warns_on_unknown_mastered() {
    let dir = setup_catalog(CLEAN);

    project_cmd(&dir)
        .args(["unlocked", "-m", "ghost"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"ghost\" is not in the catalog"));
}

#[test]
fn test_next_steps() {
    let dir = setup_catalog(CLEAN);

    project_cmd(&dir)
        .args(["next", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Knee Push-Up"));

    project_cmd(&dir)
        .args(["next", "c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing follows"));

    project_cmd(&dir)
        .args(["next", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exercise not found: ghost"));
}

#[test]
fn test_skills_and_tree() {
    let dir = setup_catalog(CLEAN);

    project_cmd(&dir)
        .arg("skills")
        .assert()
        .success()
        .stdout(predicate::str::contains("push_up (3)"));

    project_cmd(&dir)
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("      c Push-Up"));

    project_cmd(&dir)
        .args(["tree", "planche"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown skill: planche"));
}

#[test]
fn test_stats_json() {
    let dir = setup_catalog(CLEAN);

    let output = project_cmd(&dir)
        .args(["stats", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total_exercises"], 3);
    assert_eq!(stats["by_pattern"]["push"], 3);
    assert_eq!(stats["roots"], 1);
    assert_eq!(stats["max_difficulty"], 3.0);
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = setup_catalog(CLEAN);

    project_cmd(&dir)
        .args(["--verbose", "stats"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:catalog] Loaded 3 exercises"));
}
