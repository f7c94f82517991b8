//! Remote store against a mock HTTP server.

use mockito::Matcher;
use serde_json::json;
use studytrack_core::{
    ItemKind, Priority, RecordStore, RemoteStore, StoreError, StudySession, StudyTask, TaskRecord,
};

const NS: &str = "users/alice/tasks";

fn sample_task() -> StudyTask {
    StudyTask {
        subject: "Anatomy".into(),
        chapter: "Thorax".into(),
        short_notes: vec!["Pleura".into()],
        long_answers: vec!["Mediastinum".into()],
        priority: Priority::High,
        deadline: "2024-03-01".into(),
    }
}

#[test]
fn load_all_decodes_object_of_records() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/users/alice/tasks.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "k1": {
                    "task": {"Subject": "Anatomy", "Chapter": "Thorax", "SN": ["Pleura"], "LAQ": [],
                             "Priority": "High", "Deadline": "2024-03-01"},
                    "check": {"SN": [true], "LAQ": []}
                },
                "broken": {"unexpected": true}
            })
            .to_string(),
        )
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    let entries = store.load_all().unwrap();

    mock.assert();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "k1");
    assert_eq!(entries[0].task().chapter, "Thorax");
    assert!(entries[0].progress().completed);
}

#[test]
fn load_all_treats_null_as_empty() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/alice/tasks.json")
        .with_status(200)
        .with_body("null")
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn load_all_rejects_non_object_body() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/alice/tasks.json")
        .with_status(200)
        .with_body("[1, 2, 3]")
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    assert!(matches!(store.load_all(), Err(StoreError::Corrupt { .. })));
}

#[test]
fn put_sends_wire_format_with_auth() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PUT", "/users/alice/tasks/k1.json")
        .match_query(Matcher::UrlEncoded("auth".into(), "tok".into()))
        .match_body(Matcher::PartialJson(json!({
            "task": {"Subject": "Anatomy", "SN": ["Pleura"], "LAQ": ["Mediastinum"], "Priority": "High"},
            "check": {"SN": [false], "LAQ": [false]}
        })))
        .with_status(200)
        .with_body("{}")
        .create();

    let store = RemoteStore::new(&server.url(), NS, Some("tok".into())).unwrap();
    store.put("k1", &TaskRecord::new(sample_task())).unwrap();
    mock.assert();
}

#[test]
fn delete_hits_record_path() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/users/alice/tasks/k1.json")
        .with_status(200)
        .with_body("null")
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    store.delete("k1").unwrap();
    mock.assert();
}

#[test]
fn http_errors_carry_status_and_body() {
    let mut server = mockito::Server::new();
    server
        .mock("PUT", "/users/alice/tasks/k1.json")
        .with_status(401)
        .with_body("{\"error\": \"Permission denied\"}")
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    let err = store.put("k1", &TaskRecord::new(sample_task())).unwrap_err();
    match err {
        StoreError::Http { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Permission denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn session_write_through_to_remote() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/alice/tasks.json")
        .with_status(200)
        .with_body(
            json!({
                "k1": {
                    "task": {"Subject": "Anatomy", "Chapter": "Thorax", "SN": ["Pleura"], "LAQ": [],
                             "Priority": "Medium", "Deadline": ""},
                    "check": {"SN": [false], "LAQ": []}
                }
            })
            .to_string(),
        )
        .create();
    let put = server
        .mock("PUT", "/users/alice/tasks/k1.json")
        .match_body(Matcher::PartialJson(json!({"check": {"SN": [true]}})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();

    let store = RemoteStore::new(&server.url(), NS, None).unwrap();
    let mut session = StudySession::load(store, Some("Anatomy")).unwrap();
    assert_eq!(session.selected_subject(), Some("Anatomy"));

    session
        .set_item("k1", ItemKind::ShortNote, 0, true, 1_700_000_000_000)
        .unwrap();
    put.assert();
    assert!(session.get("k1").unwrap().progress().completed);
}

#[test]
fn unreachable_server_is_transport_error() {
    // Nothing listens on the discard port.
    let store = RemoteStore::new("http://127.0.0.1:9", NS, None).unwrap();
    assert!(matches!(store.load_all(), Err(StoreError::Transport(_))));
}
