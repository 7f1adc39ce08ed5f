use clap::Parser;
use org_navigator::cli::{Cli, Commands};
use org_navigator::config::Config;
use org_navigator::main_lib::{
    load_snapshot_file, render_candidates_text, render_tree_text, write_output,
};
use org_navigator::move_target::CandidateOptions;
use org_navigator::screenshot::{generate_screenshot, ScreenshotOptions};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

const SNAPSHOT: &str = r#"{
    "items": [
        {"id": 1, "title": "Acme", "kind": "organization", "children": [
            {"id": 2, "title": "Finance", "kind": "department", "children": [
                {"id": 3, "title": "Accounting"},
                {"id": 4, "title": "Payroll", "is_active": false}
            ]},
            {"id": 5, "title": "Engineering", "kind": "department"}
        ]}
    ],
    "root_id": 1,
    "total": 5,
    "version": 42
}"#;

fn write_snapshot(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("tree.json");
    fs::write(&path, SNAPSHOT).unwrap();
    path
}

#[test]
fn test_load_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let snapshot = assert_ok!(load_snapshot_file(&write_snapshot(&dir)));
    assert_eq!(snapshot.roots.len(), 1);
    assert!(snapshot.inactive_ids.contains("4"));
    assert_eq!(snapshot.total, Some(5));

    assert_err!(load_snapshot_file(&dir.path().join("missing.json")));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"items\": [").unwrap();
    assert_err!(load_snapshot_file(&broken));
}

#[test]
fn test_dump_sorts_and_hides_inactive() {
    let dir = TempDir::new().unwrap();
    let snapshot = load_snapshot_file(&write_snapshot(&dir)).unwrap();
    let text = render_tree_text(snapshot, "", false).unwrap();
    assert_eq!(
        text,
        "◆ Acme [1]\n  ■ Engineering [5]\n  ■ Finance [2]\n    • Accounting [3]\n"
    );
}

#[test]
fn test_dump_with_query_marks_matches() {
    let dir = TempDir::new().unwrap();
    let snapshot = load_snapshot_file(&write_snapshot(&dir)).unwrap();
    let text = render_tree_text(snapshot, "ROLL", true).unwrap();
    assert_eq!(
        text,
        "◆ Acme [1]\n  ■ Finance [2]\n    • Payroll [4] (inactive) *\n"
    );
}

#[test]
fn test_candidates_listing() {
    let dir = TempDir::new().unwrap();
    let snapshot = load_snapshot_file(&write_snapshot(&dir)).unwrap();

    let text = render_candidates_text(snapshot.clone(), "3", &CandidateOptions::default());
    assert_eq!(
        text,
        "(no parent)\n1\tAcme\n5\tEngineering\n2\tFinance\n"
    );

    let options = CandidateOptions {
        include_inactive: true,
        filter: "pay".into(),
    };
    let text = render_candidates_text(snapshot, "3", &options);
    assert_eq!(text, "(no parent)\n4\tPayroll\n");
}

#[test]
fn test_write_output_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");
    assert_ok!(write_output("hello\n", Some(&path)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
}

#[test]
fn test_screenshot_command_writes_a_frame() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir);
    let output = dir.path().join("screen.txt");
    let options = ScreenshotOptions {
        width: 100,
        height: 20,
        query: Some("acc".into()),
        select: Some("3".into()),
    };

    assert_ok!(generate_screenshot(
        &Config::default(),
        &snapshot,
        Some(&output),
        &options
    ));
    let screen = fs::read_to_string(&output).unwrap();
    assert_eq!(screen.lines().count(), 20);
    assert!(screen.contains("Accounting"));
    assert!(screen.contains("Acme › Finance › Accounting"));
    assert!(screen.contains("v42"));
}

#[test]
fn test_cli_parses_dump_with_global_flags() {
    let cli = Cli::try_parse_from([
        "org-navigator",
        "--config",
        "/tmp/nav.toml",
        "dump",
        "--snapshot",
        "tree.json",
        "--query",
        "fin",
        "--show-inactive",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("/tmp/nav.toml")));
    match cli.command {
        Some(Commands::Dump {
            snapshot,
            query,
            show_inactive,
            output,
        }) => {
            assert_eq!(snapshot, PathBuf::from("tree.json"));
            assert_eq!(query, "fin");
            assert!(show_inactive);
            assert_eq!(output, None);
        }
        _ => panic!("expected dump"),
    }
}
