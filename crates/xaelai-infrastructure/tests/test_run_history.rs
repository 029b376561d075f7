use std::fs;
use tempfile::TempDir;
use xaelai_core::{MessageRole, RunMessage, RunRecord, RunStore};
use xaelai_infrastructure::{
    ChatHistorySession, FileRunStore, InMemoryRunStore, RecordCodec, Settings,
};

#[test]
fn test_store_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

    store.create("run-42").unwrap();
    store
        .upsert(
            &RunRecord::new("run-42")
                .with_name("Trip planning")
                .with_messages(vec![RunMessage::user("Hi")]),
        )
        .unwrap();

    let loaded = store.read("run-42").unwrap().expect("record should exist");
    assert_eq!(loaded.run_name, "Trip planning");
    assert_eq!(loaded.messages.len(), 1);
    assert_eq!(loaded.messages[0].role, MessageRole::User);

    assert_eq!(store.list_ids(None).unwrap(), vec!["run-42".to_string()]);

    store.delete("run-42").unwrap();
    assert!(store.read("run-42").unwrap().is_none());
    store.delete("run-42").unwrap();
}

#[test]
fn test_same_contract_for_every_store() {
    let temp_dir = TempDir::new().unwrap();
    let stores: Vec<Box<dyn RunStore>> = vec![
        Box::new(FileRunStore::new(temp_dir.path().join("yaml"), RecordCodec::Yaml).unwrap()),
        Box::new(FileRunStore::new(temp_dir.path().join("json"), RecordCodec::Json).unwrap()),
        Box::new(InMemoryRunStore::new()),
    ];

    for store in stores {
        let mut record = RunRecord::new("shared").with_user("alice");
        record.push_message(MessageRole::User, "こんにちは");
        record
            .extra
            .insert("memory".to_string(), serde_json::json!({"summary": null}));

        store.create_new(&record).unwrap();
        assert!(store.create_new(&record).unwrap_err().is_already_exists());
        assert_eq!(store.read("shared").unwrap().unwrap(), record);
        assert_eq!(store.list_ids(Some("alice")).unwrap(), vec!["shared".to_string()]);
        assert!(store.list_ids(Some("bob")).unwrap().is_empty());
        assert_eq!(store.list_all().unwrap().records, vec![record.clone()]);

        let mut shadowed = record.clone();
        shadowed
            .extra
            .insert("user_id".to_string(), serde_json::json!("mallory"));
        assert!(store.upsert(&shadowed).unwrap_err().is_invalid_record());
        assert_eq!(store.read("shared").unwrap().unwrap(), record);
    }
}

#[test]
fn test_one_corrupt_file_does_not_hide_history() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileRunStore::new(temp_dir.path(), RecordCodec::Json).unwrap();

    store.upsert(&RunRecord::new("first").with_name("one")).unwrap();
    store.upsert(&RunRecord::new("second").with_name("two")).unwrap();
    fs::write(temp_dir.path().join("third.json"), "{\"run_id\": 12,").unwrap();

    let listing = store.list_all().unwrap();

    assert_eq!(listing.records.len(), 2);
    assert_eq!(listing.skipped.len(), 1);
    assert_eq!(listing.skipped[0].run_id, "third");
    assert!(store.read("third").unwrap_err().is_corrupt());
}

#[test]
fn test_session_rename_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::default()
        .with_env_overrides([("USER_DATA_PATH", temp_dir.path().to_str().unwrap())])
        .unwrap();
    let root = settings.chat_history_dir("alice").unwrap();

    let mut session = ChatHistorySession::create(&root, "trip", RecordCodec::Json).unwrap();
    assert!(session.file_name().contains("trip"));

    let store = session.store().unwrap();
    store.create(session.record_id()).unwrap();
    let old_path = session.path();
    assert!(old_path.exists());

    session.rename("trip-updated").unwrap();

    assert!(session.file_name().contains("trip-updated"));
    assert!(!session.file_name().starts_with("trip_"));
    assert!(!old_path.exists());
    assert!(session.path().exists());
    assert!(store.read(session.record_id()).unwrap().is_some());
}

#[test]
fn test_rename_after_external_delete() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        ChatHistorySession::create(temp_dir.path(), "trip", RecordCodec::Yaml).unwrap();
    session.store().unwrap().create(session.record_id()).unwrap();
    fs::remove_file(session.path()).unwrap();
    let file_name = session.file_name().to_string();

    let err = session.rename("new_label").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(session.file_name(), file_name);
}

#[test]
fn test_traversal_labels_never_leave_root() {
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("alice").join("chat_history");
    let mut session = ChatHistorySession::create(&root, "trip", RecordCodec::Json).unwrap();
    session.store().unwrap().create(session.record_id()).unwrap();

    for label in ["../../etc", "../alice", "/etc/passwd", "..\\..\\windows"] {
        let err = session.rename(label).unwrap_err();
        assert!(
            err.is_path_escape() || err.is_invalid_name(),
            "{} gave {:?}",
            label,
            err
        );
        assert!(session.path().exists());
    }

    // Nothing was written next to the root.
    let siblings: Vec<_> = fs::read_dir(root.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(siblings, vec![std::ffi::OsString::from("chat_history")]);
}
