use taskcli::error::TaskError;
use taskcli::task::query::{self, Filter, StatusFilter};
use taskcli::task::{NewTask, TaskStorage, TaskStore};
use time::macros::date;

fn open(dir: &tempfile::TempDir) -> TaskStore {
    TaskStore::open(TaskStorage::new(dir.path().join("tasks.json"))).expect("open store")
}

#[test]
fn add_then_reload_keeps_fields() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = open(&td);
    let added = store
        .add(NewTask::new("買い物に行く", Some("2024-12-01"), Some("errand")).expect("valid"))
        .expect("add");

    let reloaded = open(&td);
    let got = &reloaded.tasks()[0];
    assert_eq!(got.id, 1);
    assert_eq!(got.title, "買い物に行く");
    assert_eq!(got.due, Some(date!(2024 - 12 - 01)));
    assert_eq!(got.tag.as_deref(), Some("errand"));
    assert!(!got.done);
    assert_eq!(got, &added);

    let listed = query::filter(reloaded.tasks(), &Filter::default(), date!(2024 - 11 - 30));
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
}

#[test]
fn overdue_task_leaves_overdue_view_once_done() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = open(&td);
    store
        .add(NewTask::new("買い物に行く", Some("2024-12-01"), None).expect("valid"))
        .expect("add");

    let today = date!(2024 - 12 - 02);
    let overdue = Filter {
        overdue: true,
        ..Filter::default()
    };
    assert_eq!(query::filter(store.tasks(), &overdue, today).len(), 1);

    store.complete(1).expect("complete");
    let store = open(&td);
    assert!(query::filter(store.tasks(), &overdue, today).is_empty());

    let all_overdue = Filter {
        status: StatusFilter::All,
        ..overdue
    };
    assert!(query::filter(store.tasks(), &all_overdue, today).is_empty());
}

#[test]
fn search_finds_japanese_titles() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = open(&td);
    store
        .add(NewTask::new("買い物に行く", None, None).expect("valid"))
        .expect("add");
    store
        .add(NewTask::new("Pay Rent", None, None).expect("valid"))
        .expect("add");

    let hits = query::search(store.tasks(), "買い物");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "買い物に行く");
    assert_eq!(query::search(store.tasks(), "rent")[0].id, 2);
    assert!(query::search(store.tasks(), "xyz").is_empty());
}

#[test]
fn ids_keep_increasing_across_deletes_and_reopens() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = open(&td);
    let mut last = 0;
    for title in ["a", "b", "c"] {
        let t = store
            .add(NewTask::new(title, None, None).expect("valid"))
            .expect("add");
        assert!(t.id > last);
        last = t.id;
        store.delete(t.id, |_| true).expect("delete");
        store = open(&td);
    }
    assert_eq!(last, 3);
    assert!(store.tasks().is_empty());
}

#[test]
fn invalid_input_writes_nothing() {
    let td = tempfile::tempdir().expect("tempdir");
    let path = td.path().join("tasks.json");
    assert!(matches!(
        NewTask::new("x", Some("12/01/2024"), None),
        Err(TaskError::InvalidDate { .. })
    ));
    assert!(matches!(
        NewTask::new("", None, None),
        Err(TaskError::Validation(_))
    ));
    let _store = open(&td);
    assert!(!path.exists());
}

#[test]
fn corrupt_file_is_reported_and_left_alone() {
    let td = tempfile::tempdir().expect("tempdir");
    let path = td.path().join("tasks.json");
    let raw = br#"{"id": 1, "title": "not a list"}"#;
    std::fs::write(&path, raw).expect("write");

    let err = TaskStore::open(TaskStorage::new(path.clone())).unwrap_err();
    assert!(matches!(err, TaskError::CorruptStore { .. }), "{err}");
    assert!(err.to_string().contains("tasks.json"));
    assert_eq!(std::fs::read(&path).expect("read"), raw);
}
