//! End-to-end tests that drive the `typegraph` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn typegraph(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typegraph"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to spawn typegraph")
}

fn sample_tree(root: &Path) {
    let dir = root.join("Geo");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("Shapes.cs"),
        "namespace Geo\n{\n    public interface IShape { }\n    public class Square : IShape { }\n}\n",
    )
    .unwrap();
}

#[test]
fn analyze_writes_run_directory() {
    let work = TempDir::new().unwrap();
    let src = work.path().join("src");
    let out = work.path().join("out");
    sample_tree(&src);

    let output = typegraph(
        work.path(),
        &[
            "analyze",
            "--source",
            src.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--no-run-dir",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), out.display().to_string());

    assert!(out.join("Geo/Square/metadata.json").is_file());
    assert!(out.join("Geo/IShape/syntaxtree.txt").is_file());
    assert!(out.join("run.json").is_file());
    assert!(out.join("typegraph.log").is_file());

    let graph = fs::read_to_string(out.join("Geo/graph.csv")).unwrap();
    assert!(graph.contains("edge,,Geo.Square,Geo.IShape,implement,\n"));

    let run: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("run.json")).unwrap()).unwrap();
    assert_eq!(run["summary"]["types"], 2);
    assert_eq!(run["summary"]["edges"], 1);
}

#[test]
fn analyze_creates_timestamped_runs() {
    let work = TempDir::new().unwrap();
    let src = work.path().join("src");
    let out = work.path().join("out");
    sample_tree(&src);

    let args = [
        "analyze",
        "--source",
        src.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ];
    let first = typegraph(work.path(), &args);
    let second = typegraph(work.path(), &args);
    assert!(first.status.success());
    assert!(second.status.success());

    let first_dir = String::from_utf8_lossy(&first.stdout).trim().to_string();
    let second_dir = String::from_utf8_lossy(&second.stdout).trim().to_string();
    assert_ne!(first_dir, second_dir);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 2);

    let a = fs::read_to_string(Path::new(&first_dir).join("Geo/graph.csv")).unwrap();
    let b = fs::read_to_string(Path::new(&second_dir).join("Geo/graph.csv")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn analyze_missing_source_fails() {
    let work = TempDir::new().unwrap();
    let out = work.path().join("out");
    let output = typegraph(
        work.path(),
        &[
            "analyze",
            "--source",
            work.path().join("missing").to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--no-run-dir",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let work = TempDir::new().unwrap();

    assert!(typegraph(work.path(), &["init"]).status.success());
    let config = work.path().join(".typegraph/config.toml");
    assert!(config.is_file());

    assert!(!typegraph(work.path(), &["init"]).status.success());
    assert!(typegraph(work.path(), &["init", "--force"]).status.success());
}

#[test]
fn analyze_uses_discovered_config() {
    let work = TempDir::new().unwrap();
    sample_tree(work.path());
    assert!(typegraph(work.path(), &["init"]).status.success());
    // point the project root at the directory holding .typegraph
    fs::write(
        work.path().join(".typegraph/config.toml"),
        "[project]\nroot = \"..\"\n\n[output]\nrun_subdir = false\n",
    )
    .unwrap();

    let output = typegraph(work.path(), &["analyze"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(work.path().join(".typegraph/output/Geo/graph.csv").is_file());
}

#[test]
fn show_prints_graph_tables() {
    let work = TempDir::new().unwrap();
    let src = work.path().join("src");
    let out = work.path().join("out");
    sample_tree(&src);
    let analyzed = typegraph(
        work.path(),
        &[
            "analyze",
            "--source",
            src.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--no-run-dir",
        ],
    );
    assert!(analyzed.status.success());

    let output = typegraph(work.path(), &["show", out.join("Geo/graph.csv").to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nodes (2):"));
    assert!(stdout.contains("Edges (1):"));
    assert!(stdout.contains("Geo.Square"));
}
