use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let holidays = dir.path().join("holidays.json");
        fs::write(&holidays, r#"{"2023-06-19": "Juneteenth"}"#).expect("holidays");
        let config = format!(
            "board_file: {}\nholidays_file: {}\nscreenshot_dir: {}\n",
            dir.path().join("calendar.json").display(),
            holidays.display(),
            dir.path().join("shots").display(),
        );
        fs::write(dir.path().join("config.yml"), config).expect("config");
        Workspace { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn board(&self) -> PathBuf {
        self.path().join("calendar.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("calboard").expect("binary");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path().join("config.yml"));
        cmd
    }
}

#[test]
fn help_works() {
    Command::cargo_bin("calboard")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Month calendar task board"));
}

#[test]
fn subcommand_help_works() {
    for cmd in [
        "init", "days", "show", "add", "edit", "move", "reorder", "label", "export", "import",
        "screenshot", "tui",
    ] {
        Command::cargo_bin("calboard")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn init_refuses_to_overwrite() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialized board"));
    assert!(ws.board().exists());

    ws.cmd()
        .arg("init")
        .assert()
        .failure()
        .stderr(contains("already exists"));
    ws.cmd().args(["init", "--force"]).assert().success();
}

#[test]
fn days_lists_grid_with_holidays() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["days", "--month", "2023-06"])
        .assert()
        .success()
        .stdout(contains("2023-05-28"))
        .stdout(contains("2023-07-01"))
        .stdout(contains("Juneteenth"));
}

#[test]
fn add_then_search() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["add", "2023-06-05", "Meeting"])
        .assert()
        .success()
        .stdout(contains("Added task 0 to 2023-06-05"));
    ws.cmd()
        .args(["add", "2023-06-05", "Team meeting"])
        .assert()
        .success()
        .stdout(contains("Added task 1"));

    ws.cmd()
        .args(["show", "--month", "2023-06", "--search", "mee"])
        .assert()
        .success()
        .stdout(contains("Filter: text \"mee\""))
        .stdout(contains("  - 0: Meeting"))
        .stdout(contains("Team meeting").not());
}

#[test]
fn labels_create_attach_and_filter() {
    let ws = Workspace::new();
    ws.cmd().args(["add", "2023-06-05", "Meeting"]).assert().success();
    ws.cmd().args(["add", "2023-06-06", "Lunch"]).assert().success();

    ws.cmd()
        .args(["label", "list"])
        .assert()
        .success()
        .stdout(contains("(no labels)"));
    ws.cmd()
        .args(["label", "create", "work", "--color", "#0079bf", "--to", "2023-06-05:0"])
        .assert()
        .success()
        .stdout(contains("Created label 0 (#0079bf work)"));
    ws.cmd()
        .args(["label", "list"])
        .assert()
        .success()
        .stdout(contains("#0079bf"))
        .stdout(contains("work"));

    ws.cmd()
        .args(["label", "attach", "2023-06-05", "0", "0"])
        .assert()
        .failure()
        .stderr(contains("already carries label 0"));

    ws.cmd()
        .args(["show", "--month", "2023-06", "--label", "0"])
        .assert()
        .success()
        .stdout(contains("labels: work #0079bf"))
        .stdout(contains("Lunch").not());
}

#[test]
fn move_and_reorder() {
    let ws = Workspace::new();
    ws.cmd().args(["add", "2023-06-05", "Ship"]).assert().success();
    ws.cmd().args(["add", "2023-06-07", "One"]).assert().success();
    ws.cmd().args(["add", "2023-06-07", "Two"]).assert().success();

    ws.cmd()
        .args(["move", "2023-06-05", "0", "2023-06-07"])
        .assert()
        .success()
        .stdout(contains("Moved task 0 from 2023-06-05 to 2023-06-07"));
    ws.cmd()
        .args(["move", "2023-06-05", "0", "2023-06-07"])
        .assert()
        .failure()
        .stderr(contains("not found"));

    ws.cmd()
        .args(["reorder", "2023-06-07", "0", "1"])
        .assert()
        .success()
        .stdout(contains("Swapped task 0 with task 1"));
    ws.cmd()
        .args(["show", "--month", "2023-06"])
        .assert()
        .success()
        .stdout(contains("  - 0: Ship\n  - 2: Two\n  - 1: One"));
}

#[test]
fn reorder_unknown_task_is_not_found() {
    let ws = Workspace::new();
    ws.cmd().args(["add", "2023-06-05", "A"]).assert().success();

    for args in [["2023-06-05", "99", "0"], ["2023-06-05", "0", "99"]] {
        ws.cmd()
            .arg("reorder")
            .args(args)
            .assert()
            .failure()
            .stderr(contains("task 99 not found on 2023-06-05"))
            .stderr(contains("drag position").not());
    }
}

#[test]
fn export_import_and_rejects_bad_snapshot() {
    let ws = Workspace::new();
    ws.cmd().args(["add", "2023-06-05", "Meeting"]).assert().success();

    let out = ws.path().join("backup.json");
    ws.cmd()
        .arg("export")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Exported board"));
    let exported = fs::read_to_string(&out).expect("export");
    assert!(exported.contains("\"isEditable\": false"));

    fs::remove_file(ws.board()).expect("remove board");
    ws.cmd()
        .arg("import")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Imported"));
    ws.cmd()
        .args(["show", "--month", "2023-06"])
        .assert()
        .success()
        .stdout(contains("  - 0: Meeting"));

    let bad = ws.path().join("bad.json");
    fs::write(
        &bad,
        r#"{"calendar":{"2023-06-05":{"1":{"id":1,"text":"a","isEditable":false,"order":0,"labels":[]}},
            "2023-06-06":{"1":{"id":1,"text":"b","isEditable":false,"order":0,"labels":[]}}},
            "labels":[]}"#,
    )
    .expect("bad snapshot");
    ws.cmd()
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(contains("duplicate task id 1"));
}

#[test]
fn screenshot_renders_month() {
    let ws = Workspace::new();
    ws.cmd().args(["add", "2023-06-05", "Meeting"]).assert().success();

    let shot = ws.path().join("shot.txt");
    ws.cmd()
        .args(["screenshot", "--month", "2023-06", "--width", "140", "--height", "40", "--out"])
        .arg(&shot)
        .assert()
        .success()
        .stdout(contains("Saved screenshot"));

    let text = fs::read_to_string(&shot).expect("screenshot");
    assert!(text.contains("June 2023"));
    assert!(text.contains("Meeting"));
    assert!(text.contains("Sun"));
}
