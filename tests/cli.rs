use std::path::Path;
use std::process::{Command, Output};

fn taskcli(home: &Path, store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskcli"))
        .arg("--file")
        .arg(store)
        .args(args)
        .env("HOME", home)
        .env_remove("TASKCLI_FILE")
        .env_remove("TASKCLI_LOG")
        .output()
        .expect("run taskcli")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn add_list_done_flow() {
    let td = tempfile::tempdir().expect("tempdir");
    let store = td.path().join("tasks.json");

    let out = taskcli(td.path(), &store, &["add", "買い物に行く", "--due", "2024-12-01", "--tag", "errand"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("Added task 1"));

    let out = taskcli(td.path(), &store, &["list"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("買い物に行く"));
    assert!(text.contains("errand"));

    let out = taskcli(td.path(), &store, &["done", "1"]);
    assert!(out.status.success());
    let out = taskcli(td.path(), &store, &["done", "1"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("already done"));

    let out = taskcli(td.path(), &store, &["list"]);
    assert!(stdout(&out).contains("No matching tasks"));
    let out = taskcli(td.path(), &store, &["list", "--done", "--json"]);
    let tasks: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(tasks[0]["id"], 1);
    assert_eq!(tasks[0]["done"], true);
}

#[test]
fn errors_get_distinct_exit_codes() {
    let td = tempfile::tempdir().expect("tempdir");
    let store = td.path().join("tasks.json");

    let out = taskcli(td.path(), &store, &["add", "x", "--due", "2024-13-40"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("2024-13-40"));
    assert!(!store.exists());

    let out = taskcli(td.path(), &store, &["done", "7"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("task 7 not found"));

    std::fs::write(&store, "[1, 2, 3]").expect("write");
    for args in [&["list"][..], &["add", "y"][..], &["delete", "1", "--yes"][..]] {
        let out = taskcli(td.path(), &store, args);
        assert_eq!(out.status.code(), Some(4), "{args:?}");
        assert!(stderr(&out).contains("corrupt"));
        assert!(!stderr(&out).contains("panicked"));
    }
    assert_eq!(std::fs::read_to_string(&store).expect("read"), "[1, 2, 3]");
}

#[test]
fn delete_without_confirmation_keeps_task() {
    let td = tempfile::tempdir().expect("tempdir");
    let store = td.path().join("tasks.json");
    assert!(taskcli(td.path(), &store, &["add", "keep"]).status.success());

    // stdin is empty when run via `output()`, which reads as "no".
    let out = taskcli(td.path(), &store, &["delete", "1"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Cancelled"));
    assert!(stdout(&taskcli(td.path(), &store, &["list"])).contains("keep"));

    let out = taskcli(td.path(), &store, &["delete", "1", "--yes"]);
    assert!(out.status.success());
    assert!(stdout(&taskcli(td.path(), &store, &["list"])).contains("No matching tasks"));
}
