use std::path::Path;

use cast_analyzer::session::{
    DroppedFile, IngestEvent, SessionClient, load_snapshot, save_snapshot, spawn_session_worker,
};
use cast_analyzer::{CancelToken, Session, SourceId, ValueKind};

/// Sheet "People": the three-row contact list; sheet "Hosts": one gateway row
const WORKBOOK: &[u8] = include_bytes!("fixtures/people.xlsx");
const CONTACT: &str = "Contact: J@X.com\n";

fn file(name: &str, content: &str) -> DroppedFile {
    DroppedFile::new(name, content.as_bytes().to_vec())
}

#[test]
fn test_shared_email_across_two_sources() {
    let mut session = Session::default();
    let report = session
        .ingest("people.xlsx", WORKBOOK, &SourceId::from(1))
        .unwrap();
    assert_eq!(report.rows_scanned, 4);
    assert_eq!(report.phones, 1);
    assert_eq!(report.emails, 1);
    assert_eq!(report.ips, 1);
    session
        .ingest("contact.txt", CONTACT.as_bytes(), &SourceId::from(2))
        .unwrap();

    assert_eq!(
        serde_json::to_value(session.shared_values()).unwrap(),
        serde_json::json!([{ "kind": "email", "value": "j@x.com", "count": 2 }])
    );

    let shared = session.cross_reference(ValueKind::Email);
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].count, 2);
    assert_eq!(shared[0].per_source_counts[&SourceId::from(1)], 2);
    assert_eq!(shared[0].per_source_counts[&SourceId::from(2)], 1);
    assert_eq!(shared[0].total_count, 3);

    // the phone exists only in source 1
    assert!(session.cross_reference(ValueKind::Phone).is_empty());

    let tile = session.tile(&SourceId::from(1)).unwrap();
    let rows: Vec<usize> = tile.values(ValueKind::Email)["j@x.com"]
        .iter()
        .map(|o| o.row_index)
        .collect();
    assert_eq!(rows, vec![1, 2]);
    assert_eq!(
        tile.values(ValueKind::Email)["j@x.com"][0].row_text,
        "John\t555-111-2222\tj@x.com"
    );
}

#[test]
fn test_worker_batch_survives_save_and_reload() {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let worker = spawn_session_worker(Session::default(), cmd_rx, event_tx, CancelToken::new());
    let client = SessionClient::new(cmd_tx);

    client
        .ingest(
            SourceId::from(1),
            vec![DroppedFile::new("people.xlsx", WORKBOOK.to_vec())],
        )
        .unwrap();
    client
        .ingest(
            SourceId::from(2),
            vec![
                file("contact.txt", CONTACT),
                file("empty.pdf", "not a pdf"),
                DroppedFile::read(Path::new("does/not/exist.csv")),
            ],
        )
        .unwrap();

    let shared = client.cross_reference().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].kind, ValueKind::Email);
    let snapshot = client.snapshot().unwrap();
    drop(client);
    worker.join().unwrap();

    let events: Vec<IngestEvent> = event_rx.iter().collect();
    let failures = events
        .iter()
        .filter(|e| matches!(e, IngestEvent::FileFailed { .. }))
        .count();
    assert_eq!(failures, 2);
    assert!(matches!(
        events.last(),
        Some(IngestEvent::BatchComplete {
            processed: 1,
            failed: 2,
            ..
        })
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cast.db");
    save_snapshot(&path, &snapshot).unwrap();

    let mut restored = Session::default();
    restored.restore(load_snapshot(&path).unwrap());
    let shared = restored.analyze_cross_reference();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].normalized_value, "j@x.com");
    assert_eq!(shared[0].count, 2);
    assert_eq!(shared[0].total_count, 3);
}
