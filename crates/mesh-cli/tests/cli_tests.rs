//! Command-line tests running the built `partquote` binary.

use std::path::Path;
use std::process::{Command, Output};

fn partquote(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_partquote"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run partquote")
}

fn sample(dir: &Path, shape: &str) -> String {
    let path = dir.join(format!("{}.stl", shape));
    let path = path.to_str().unwrap().to_string();
    let out = partquote(&["--quiet", "sample", shape, "-o", &path, "--size", "30"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    path
}

fn json(out: &Output) -> serde_json::Value {
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).expect("stdout is not JSON")
}

#[test]
fn test_analyze_json() {
    let dir = tempfile::tempdir().unwrap();
    let cube = sample(dir.path(), "cube");

    let report = json(&partquote(&["--format", "json", "analyze", &cube]));
    let volume = report["analysis"]["volume"].as_f64().unwrap();
    assert!((volume - 27_000.0).abs() < 1.0);
    assert_eq!(report["analysis"]["complexity"], "low");
}

#[test]
fn test_dfm_with_tags() {
    let dir = tempfile::tempdir().unwrap();
    let plate = sample(dir.path(), "plate");

    let report = json(&partquote(&["--format", "json", "dfm", &plate, "--tags"]));
    assert!(report["manufacturability_score"].as_f64().unwrap() <= 80.0);
    assert!(report["tag_counts"]["thin-wall"].as_u64().unwrap() > 0);
}

#[test]
fn test_quote_uses_cache_on_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let cylinder = sample(dir.path(), "cylinder");
    let cache_dir = dir.path().join("cache");
    let cache_dir = cache_dir.to_str().unwrap();

    let args = [
        "--format", "json", "quote", &cylinder, "--material", "brass-360", "--quantity", "12",
        "--cache-dir", cache_dir,
    ];
    let first = json(&partquote(&args));
    let second = json(&partquote(&args));

    assert_eq!(first["part"]["from_cache"], false);
    assert_eq!(second["part"]["from_cache"], true);
    assert_eq!(first["estimate"], second["estimate"]);

    let stats = json(&partquote(&["--format", "json", "cache", "stats", "--cache-dir", cache_dir]));
    assert_eq!(stats["count"], 1);

    let cleared = json(&partquote(&["--format", "json", "cache", "clear", "--cache-dir", cache_dir]));
    assert_eq!(cleared["count"], 0);
    assert_eq!(cleared["cleared"], true);
}

#[test]
fn test_unknown_material_fails_with_code() {
    let dir = tempfile::tempdir().unwrap();
    let cube = sample(dir.path(), "cube");

    let out = partquote(&["quote", &cube, "--material", "unobtainium"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("PART-3001"), "{}", stderr);
}

#[test]
fn test_materials_lists_catalog() {
    let report = json(&partquote(&["--format", "json", "materials"]));
    assert!(report["materials"]["aluminum-6061"].is_object());
    assert!(report["finishes"]["as-machined"].is_object());
}
