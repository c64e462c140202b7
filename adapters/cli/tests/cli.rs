use std::{fs, process::Command};

fn snail_maze(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_snail-maze"))
        .args(args)
        .output()
        .expect("failed to launch snail-maze");
    assert!(
        output.status.success(),
        "snail-maze {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn maze_prints_one_line_per_edge() {
    let drawing = snail_maze(&["maze", "--width", "6", "--height", "4", "--seed", "2"]);
    let lines: Vec<&str> = drawing.lines().collect();
    assert_eq!(lines.len(), 9);
    assert!(lines.iter().all(|line| line.len() == 19));
    assert_eq!(drawing, snail_maze(&["maze", "--width", "6", "--height", "4", "--seed", "2"]));
}

#[test]
fn mesh_reports_consistent_counts() {
    let output = snail_maze(&["mesh", "--width", "5", "--height", "5"]);
    let summary: serde_json::Value = serde_json::from_str(&output).expect("json summary");
    let quads = summary["quads"].as_u64().expect("quad count");
    assert!(quads > 0);
    assert_eq!(summary["vertices"].as_u64(), Some(quads * 4));
    assert_eq!(summary["indices"].as_u64(), Some(quads * 6));
}

#[test]
fn run_prints_a_json_summary() {
    let output = snail_maze(&[
        "--log-level",
        "warn",
        "run",
        "--variant",
        "flying",
        "--count",
        "2",
        "--seconds",
        "5",
    ]);
    let summary: serde_json::Value = serde_json::from_str(&output).expect("json summary");
    assert_eq!(summary["populations"][0]["variant"], "flying");
    assert_eq!(summary["populations"][0]["solves"].as_u64(), Some(24));
    assert!(summary["currency"].as_u64().unwrap_or_default() > 0);
}

#[test]
fn run_reads_populations_from_a_config_file() {
    let path = std::env::temp_dir().join(format!("snail-maze-run-{}.toml", std::process::id()));
    fs::write(
        &path,
        r#"
        seconds = 3
        seed = 4

        [[population]]
        variant = "random-walk"
        count = 3

        [[population]]
        variant = "hold-left"
        count = 5
        width = 2
        "#,
    )
    .expect("temp file writable");
    let output = snail_maze(&["run", "--config", path.to_str().expect("utf-8 path")]);
    let _ = fs::remove_file(&path);

    let summary: serde_json::Value = serde_json::from_str(&output).expect("json summary");
    assert_eq!(summary["seconds"], 3);
    assert_eq!(summary["seed"], 4);
    let populations = summary["populations"].as_array().expect("populations");
    assert_eq!(populations.len(), 2);
    assert_eq!(populations[1]["variant"], "hold-left");
    assert_eq!(populations[1]["page_count"], 1);
}

#[test]
fn unknown_variants_are_rejected() {
    let status = Command::new(env!("CARGO_BIN_EXE_snail-maze"))
        .args(["run", "--variant", "wizard"])
        .output()
        .expect("failed to launch snail-maze")
        .status;
    assert!(!status.success());
}
