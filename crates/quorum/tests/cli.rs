use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn quorum(dir: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("quorum").into();
    cmd.current_dir(dir);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("QUORUM_ENTITY_MIN_VOTES");
    cmd.env_remove("QUORUM_TRIPLE_MIN_VOTES");
    cmd.env_remove("QUORUM_TWO_STAGE");
    cmd.env_remove("QUORUM_MAX_CONCURRENT_DOCUMENTS");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn capitals(head: &str, entity_type: &str) -> Value {
    json!({
        "d1": {
            "title": "Capitals",
            "entities": [
                {"mentions": [head], "type": entity_type},
                {"mentions": ["France"], "type": "LOC"}
            ],
            "triples": [{"head": head, "relation": "capital_of", "tail": "France"}]
        }
    })
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    let mut cmd: Command = cargo_bin_cmd!("quorum").into();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("quorum"));
}

// --- Validate ---

#[test]
fn validate_passes_matching_files() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "results.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "reference.json", &capitals("Paris", "LOC"));

    quorum(tmp.path())
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("All validations passed"));
}

#[test]
fn validate_reports_raw_string_document() {
    let tmp = TempDir::new().unwrap();
    write_json(
        tmp.path(),
        "pred.json",
        &json!({"d1": "Here are the entities: Paris, France"}),
    );
    write_json(tmp.path(), "ref.json", &capitals("Paris", "LOC"));

    quorum(tmp.path())
        .args(["validate", "--prediction", "pred.json", "--reference", "ref.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("document d1"))
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn validate_reports_missing_ids() {
    let tmp = TempDir::new().unwrap();
    let mut reference = capitals("Paris", "LOC");
    reference["d2"] = json!({"title": "", "entities": [], "triples": []});
    write_json(tmp.path(), "results.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "reference.json", &reference);

    quorum(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing in prediction: d2"));
}

#[test]
fn validate_fails_on_missing_file() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "reference.json", &capitals("Paris", "LOC"));

    quorum(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prediction file"));
}

#[test]
fn validate_empty_mentions_flag() {
    let tmp = TempDir::new().unwrap();
    let payload = json!({"d1": {"entities": [{"mentions": [], "type": "X"}], "triples": []}});
    write_json(tmp.path(), "results.json", &payload);
    write_json(tmp.path(), "reference.json", &payload);

    quorum(tmp.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no mentions"));

    quorum(tmp.path())
        .args(["validate", "--allow-empty-mentions"])
        .assert()
        .success();
}

// --- Merge ---

#[test]
fn merge_deduplicates_and_creates_output_dir() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "a.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "b.json", &capitals("paris", "LOC"));

    quorum(tmp.path())
        .args(["merge", "a.json", "b.json", "a.json", "--output", "out/combined.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Used 3 of 3 sources"));

    let merged = read_json(&tmp.path().join("out/combined.json"));
    assert_eq!(merged["d1"]["title"], "Capitals");
    assert_eq!(merged["d1"]["entities"].as_array().unwrap().len(), 3);
    assert_eq!(
        merged["d1"]["triples"],
        json!([
            {"head": "Paris", "relation": "capital_of", "tail": "France"},
            {"head": "paris", "relation": "capital_of", "tail": "France"}
        ])
    );
}

#[test]
fn merge_skips_bad_sources() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "a.json", &capitals("Paris", "LOC"));
    fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();

    quorum(tmp.path())
        .args(["merge", "a.json", "broken.json", "missing.json", "-o", "combined.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Used 1 of 3 sources"));

    assert!(tmp.path().join("combined.json").exists());
}

// --- Ensemble ---

#[test]
fn ensemble_applies_quorum() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "m1.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "m2.json", &capitals("paris", "CITY"));
    write_json(tmp.path(), "m3.json", &capitals("PARIS", "LOC"));

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "m3.json", "-o", "ens.json", "--single-stage"])
        .assert()
        .success()
        .stderr(predicate::str::contains("from 3 producers"));

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["entities"],
        json!([
            {"mentions": ["France"], "type": "LOC"},
            {"mentions": ["PARIS", "Paris", "paris"], "type": "LOC"}
        ])
    );
    assert_eq!(
        out["d1"]["triples"],
        json!([{"head": "paris", "relation": "capital_of", "tail": "france"}])
    );
}

#[test]
fn ensemble_with_higher_quorum_drops_minority() {
    let tmp = TempDir::new().unwrap();
    let mut m2 = capitals("Paris", "LOC");
    m2["d1"]["entities"] = json!([{"mentions": ["Paris"], "type": "LOC"}]);
    write_json(tmp.path(), "m1.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "m2.json", &m2);

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--entity-votes", "2"])
        .assert()
        .success();

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["entities"],
        json!([{"mentions": ["Paris"], "type": "LOC"}])
    );
}

#[test]
fn ensemble_refines_candidate_triples() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "m1.json", &capitals("Paris", "LOC"));
    write_json(tmp.path(), "m2.json", &capitals("Paris", "LOC"));
    write_json(
        tmp.path(),
        "candidates.json",
        &json!({
            "d1": {
                "entities": [],
                "triples": [
                    {"head": "paris", "relation": "capital_of", "tail": "france"},
                    {"head": "berlin", "relation": "capital_of", "tail": "germany"}
                ]
            }
        }),
    );

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--refine", "candidates.json"])
        .assert()
        .success();

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["triples"],
        json!([{"head": "paris", "relation": "capital_of", "tail": "france"}])
    );
}

#[test]
fn ensemble_rejects_zero_quorum() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "m1.json", &capitals("Paris", "LOC"));

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "-o", "ens.json", "--triple-votes", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("triple_min_votes"));
}

/// Two producers that agree on Paris and France and on a Rome triple whose
/// endpoints are not entities. They spell the Paris head differently.
fn write_rome_producers(dir: &Path) {
    let rome = json!({"head": "Rome", "relation": "capital_of", "tail": "Italy"});
    let mut m1 = capitals("Paris", "LOC");
    m1["d1"]["triples"] = json!([
        {"head": "Paris", "relation": "capital_of", "tail": "France"},
        rome.clone()
    ]);
    let mut m2 = capitals("Paris", "LOC");
    m2["d1"]["triples"] = json!([
        {"head": "PARIS", "relation": "capital_of", "tail": "France"},
        rome
    ]);
    write_json(dir, "m1.json", &m1);
    write_json(dir, "m2.json", &m2);
}

#[test]
fn ensemble_two_stage_from_config_file() {
    let tmp = TempDir::new().unwrap();
    write_rome_producers(tmp.path());
    write_json(
        tmp.path(),
        "quorum.json",
        &json!({"two_stage": true, "refinement_extractor": "m2"}),
    );

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--config", "quorum.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("refined"));

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["triples"],
        json!([{"head": "PARIS", "relation": "capital_of", "tail": "France"}])
    );
}

#[test]
fn ensemble_two_stage_from_env_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    write_rome_producers(tmp.path());
    write_json(tmp.path(), "quorum.json", &json!({"two_stage": false}));

    quorum(tmp.path())
        .env("QUORUM_TWO_STAGE", "1")
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--config", "quorum.json"])
        .assert()
        .success();

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["triples"],
        json!([{"head": "Paris", "relation": "capital_of", "tail": "France"}])
    );
}

#[test]
fn ensemble_config_file_disables_two_stage() {
    let tmp = TempDir::new().unwrap();
    write_rome_producers(tmp.path());
    write_json(tmp.path(), "quorum.json", &json!({"two_stage": false}));

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--config", "quorum.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("refined").not());

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(
        out["d1"]["triples"],
        json!([
            {"head": "paris", "relation": "capital_of", "tail": "france"},
            {"head": "rome", "relation": "capital_of", "tail": "italy"}
        ])
    );
}

#[test]
fn ensemble_rejects_unknown_refinement_extractor() {
    let tmp = TempDir::new().unwrap();
    write_rome_producers(tmp.path());
    write_json(tmp.path(), "quorum.json", &json!({"refinement_extractor": "typo"}));

    quorum(tmp.path())
        .args(["ensemble", "m1.json", "m2.json", "-o", "ens.json", "--config", "quorum.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'typo' is not registered"));

    assert!(!tmp.path().join("ens.json").exists());
}

#[test]
fn ensemble_counts_a_repeated_input_once() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "m1.json", &capitals("Paris", "LOC"));
    let same = tmp.path().join("m1.json");

    quorum(tmp.path())
        .args(["ensemble", "m1.json"])
        .arg(&same)
        .args(["-o", "ens.json", "--entity-votes", "2", "--single-stage"])
        .assert()
        .success()
        .stderr(predicate::str::contains("listed more than once"))
        .stderr(predicate::str::contains("from 1 producers"));

    let out = read_json(&tmp.path().join("ens.json"));
    assert_eq!(out["d1"]["entities"], json!([]));
}

// --- Analyze ---

#[test]
fn analyze_reports_duplicates() {
    let tmp = TempDir::new().unwrap();
    write_json(tmp.path(), "a.json", &capitals("Paris", "LOC"));

    quorum(tmp.path())
        .args(["analyze", "a.json", "a.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("entities 4 -> 2 (-2)"));
}
