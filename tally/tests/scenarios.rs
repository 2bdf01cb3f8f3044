//! End-to-end tally scenarios driven through the public API.

use std::sync::Arc;
use std::time::Duration;

use kinshu_tally::backend::domain::{compute_summary, Counts};
use kinshu_tally::{
    evaluate, initialize_backend, CreateNoteCommand, Currency, HeadlessSurface, KeyValueStorage,
    MemoryStorage, NoteService, StorageError, StoreError, TallyConfig, TallySession,
};
use rust_decimal::Decimal;
use shared::NotesDocument;
use tempfile::TempDir;

fn memory_session() -> (Arc<MemoryStorage>, TallySession<HeadlessSurface>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = NoteService::load(storage.clone(), &TallyConfig::for_directory("unused"));
    (storage, TallySession::new(store, HeadlessSurface::default()))
}

fn enter_count(session: &mut TallySession<HeadlessSurface>, denomination_id: &str, keys: &[&str]) {
    assert!(session.tap_cell(denomination_id));
    for key in keys {
        session.press_label(key).unwrap();
    }
    session.press_label("Enter").unwrap();
}

fn stored(storage: &MemoryStorage) -> NotesDocument {
    serde_json::from_str(&storage.get("notes_data").unwrap().unwrap()).unwrap()
}

#[test]
fn yen_bills_and_coins_add_up() {
    let (_, mut session) = memory_session();
    enter_count(&mut session, "jpy-1000", &["3"]);
    enter_count(&mut session, "jpy-100", &["5"]);

    let summary = session.summary();
    assert_eq!(summary.total, Decimal::from(3500));
    assert_eq!(summary.bill_count, Decimal::from(3));
    assert_eq!(summary.coin_count, Decimal::from(5));
}

#[test]
fn keypad_arithmetic_respects_precedence() {
    let (_, mut session) = memory_session();
    enter_count(&mut session, "jpy-10", &["2", "+", "3", "×", "4"]);
    assert_eq!(session.store().current_note().count_of("jpy-10"), "14");

    assert_eq!(evaluate("(2+3)×4"), "20");
    assert_eq!(evaluate("12+"), "12");
    assert_eq!(evaluate("8÷0"), "0");
}

#[test]
fn switching_notes_preserves_each_notes_counts() {
    let (_, mut session) = memory_session();
    let a = session.store().current_note_id().to_string();
    enter_count(&mut session, "jpy-1000", &["3"]);
    enter_count(&mut session, "jpy-100", &["5"]);

    let b = session
        .create_note(CreateNoteCommand::new("B", Currency::Cny))
        .unwrap()
        .id;
    session.switch_note(&b).unwrap();
    assert_eq!(session.surface().currency(), Some(Currency::Cny));
    assert!(session.surface().cells().iter().all(|cell| cell.count == "0"));
    assert_eq!(session.summary().total, Decimal::ZERO);
    enter_count(&mut session, "cny-100", &["2"]);

    session.switch_note(&a).unwrap();
    assert_eq!(session.surface().currency(), Some(Currency::Jpy));
    assert_eq!(session.surface().cell("jpy-1000").unwrap().count, "3");
    assert_eq!(session.surface().cell("jpy-100").unwrap().count, "5");
    assert_eq!(session.summary().total, Decimal::from(3500));

    session.switch_note(&b).unwrap();
    assert_eq!(session.surface().cell("cny-100").unwrap().count, "2");
}

#[test]
fn history_keeps_the_thirty_newest_save_points() {
    let (storage, mut session) = memory_session();
    for i in 0..35 {
        session.save_checkpoint(&format!("#{}", i)).unwrap();
    }

    let history = &session.store().current_note().saved_points;
    assert_eq!(history.len(), 30);
    assert_eq!(history.first().unwrap().memo, "#34");
    assert_eq!(history.last().unwrap().memo, "#5");
    assert_eq!(stored(&storage).notes[0].saved_points.len(), 30);
}

#[test]
fn deleting_notes_never_leaves_the_list_empty() {
    let (_, mut session) = memory_session();
    session
        .create_note(CreateNoteCommand::new("Second", Currency::Cny))
        .unwrap();

    for _ in 0..5 {
        let id = session.store().current_note_id().to_string();
        assert!(session.delete_note(&id).unwrap());
        assert!(!session.store().notes().is_empty());
        assert!(session
            .store()
            .note(session.store().current_note_id())
            .is_some());
    }
}

#[test]
fn deleted_save_point_is_gone_from_storage() {
    let (storage, mut session) = memory_session();
    let point = session.save_checkpoint("closing").unwrap().unwrap();
    assert_eq!(stored(&storage).notes[0].saved_points.len(), 1);

    assert!(session.delete_saved_point(&point.id).unwrap());
    assert!(stored(&storage).notes[0].saved_points.is_empty());
}

#[test]
fn restore_brings_back_saved_counts() {
    let (_, mut session) = memory_session();
    enter_count(&mut session, "jpy-10000", &["4"]);
    enter_count(&mut session, "jpy-1", &["7"]);
    let point = session.save_checkpoint("").unwrap().unwrap();

    session.reset_counts().unwrap();
    assert_eq!(session.summary().total, Decimal::ZERO);

    assert!(session.restore_saved_point(&point.id).unwrap());
    assert_eq!(session.summary(), point.summary());
    assert_eq!(session.summary().total, Decimal::from(40007));
}

#[test]
fn second_enter_does_not_touch_counts() {
    let (storage, mut session) = memory_session();
    enter_count(&mut session, "jpy-50", &["6"]);
    let writes = storage.write_count();

    session.press_label("Enter").unwrap();
    assert_eq!(session.store().current_note().count_of("jpy-50"), "6");
    assert_eq!(storage.write_count(), writes);
}

#[test]
fn failed_checkpoint_leaves_state_and_storage_unchanged() {
    let (storage, mut session) = memory_session();
    enter_count(&mut session, "jpy-1000", &["1"]);
    let before = storage.get("notes_data").unwrap();

    storage.set_quota(Some(64));
    let result = session.save_checkpoint("too big");
    assert!(matches!(
        result,
        Err(StoreError::Storage(StorageError::QuotaExceeded { .. }))
    ));
    assert!(session.store().current_note().saved_points.is_empty());
    assert_eq!(storage.get("notes_data").unwrap(), before);
}

#[test]
fn cny_counts_allow_sub_unit_coins() {
    let (_, mut session) = memory_session();
    let note = session
        .create_note(CreateNoteCommand::new("Shanghai", Currency::Cny))
        .unwrap();
    session.switch_note(&note.id).unwrap();

    enter_count(&mut session, "cny-01", &["3"]);
    enter_count(&mut session, "cny-05", &["1"]);
    enter_count(&mut session, "cny-1b", &["2"]);

    let summary = session.summary();
    assert_eq!(summary.total, Decimal::new(28, 1));
    assert_eq!(summary.bill_count, Decimal::from(2));
    assert_eq!(summary.coin_count, Decimal::from(4));
}

#[test]
fn summary_ignores_garbage_counts() {
    let mut counts = Counts::new();
    counts.insert("jpy-1000".to_string(), "abc".to_string());
    counts.insert("jpy-100".to_string(), "2".to_string());
    let summary = compute_summary(Currency::Jpy, &counts);
    assert_eq!(summary.total, Decimal::from(200));
}

#[test]
fn file_backed_notes_survive_restart() {
    let temp_dir = TempDir::new().unwrap();

    let app = initialize_backend(TallyConfig::for_directory(temp_dir.path())).unwrap();
    let mut session = app.into_session(HeadlessSurface::default());
    enter_count(&mut session, "jpy-500", &["1", "2"]);
    session.save_checkpoint("noon").unwrap();
    session.store_mut().flush_now().unwrap();
    drop(session);

    let app = initialize_backend(TallyConfig::for_directory(temp_dir.path())).unwrap();
    let note = app.note_service.current_note();
    assert_eq!(note.count_of("jpy-500"), "12");
    assert_eq!(note.saved_points.len(), 1);
    assert_eq!(note.saved_points[0].memo, "noon");
}

#[tokio::test(start_paused = true)]
async fn live_edit_survives_a_failed_checkpoint() {
    let (storage, mut session) = memory_session();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let before = storage.get("notes_data").unwrap().unwrap();

    storage.set_quota(Some(before.len() + 64));
    enter_count(&mut session, "jpy-1000", &["3"]);
    assert!(session.save_checkpoint("does not fit in the remaining quota at all, not even close to fitting").is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(stored(&storage).notes[0].counts["jpy-1000"], "3");
    assert!(session.store().take_deferred_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn live_edits_land_after_the_debounce_window() {
    let (storage, mut session) = memory_session();
    let writes = storage.write_count();

    enter_count(&mut session, "jpy-1000", &["1"]);
    enter_count(&mut session, "jpy-1000", &["2"]);
    enter_count(&mut session, "jpy-1000", &["3"]);
    assert_eq!(storage.write_count(), writes);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(storage.write_count(), writes + 1);
    assert_eq!(stored(&storage).notes[0].counts["jpy-1000"], "3");

    enter_count(&mut session, "jpy-1000", &["4"]);
    session.save_checkpoint("now").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let document = stored(&storage);
    assert_eq!(document.notes[0].counts["jpy-1000"], "4");
    assert_eq!(document.notes[0].saved_points.len(), 1);
}
