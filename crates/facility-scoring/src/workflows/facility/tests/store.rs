use super::common::*;

use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use rusqlite::{params, Connection};
use tempfile::TempDir;

use crate::workflows::facility::repository::{
    FacilityFilter, SubmissionId, SubmissionRecord, SubmissionStore,
};
use crate::workflows::facility::{
    FacilityCode, InMemorySubmissionStore, SqliteSubmissionStore, SubmissionPayload,
};

fn sqlite_store() -> (TempDir, SqliteSubmissionStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteSubmissionStore::open(dir.path().join("submissions.db")).expect("open store");
    (dir, store)
}

fn assert_latest_wins<S: SubmissionStore>(store: &S) {
    let first = store
        .upsert(new_submission(Some("DEL-07"), "E-1", 61.0))
        .expect("first upsert");
    let second = store
        .upsert(new_submission(Some(" DEL-07 "), "E-2", 74.5))
        .expect("second upsert");

    assert!(!first.was_update);
    assert!(second.was_update);
    assert_eq!(first.id, second.id);

    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].submitter_id, "E-2");
    assert_eq!(listing[0].total_score, 74.5);
    assert_eq!(
        listing[0].facility_code.as_ref().map(FacilityCode::as_str),
        Some("DEL-07")
    );
}

fn assert_uncoded_submissions_accumulate<S: SubmissionStore>(store: &S) {
    for attempt in 0..3 {
        let outcome = store
            .upsert(new_submission(None, &format!("E-{attempt}"), 40.0))
            .expect("upsert");
        assert!(!outcome.was_update);
    }
    store
        .upsert(new_submission(Some("   "), "E-blank", 40.0))
        .expect("blank code upsert");

    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    assert_eq!(listing.len(), 4);
    assert!(listing.iter().all(|record| record.facility_code.is_none()));
    assert!(store.facility_codes().expect("codes").is_empty());
}

fn assert_listing_is_most_recent_first<S: SubmissionStore>(store: &S) {
    let a = store
        .upsert(new_submission(Some("A"), "E-a", 10.0))
        .expect("upsert");
    let b = store
        .upsert(new_submission(Some("B"), "E-b", 20.0))
        .expect("upsert");
    let c = store
        .upsert(new_submission(None, "E-c", 30.0))
        .expect("upsert");
    let a_again = store
        .upsert(new_submission(Some("A"), "E-a2", 15.0))
        .expect("upsert");
    assert_eq!(a.id, a_again.id);

    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    let ids: Vec<SubmissionId> = listing.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![a.id, c.id, b.id]);

    let filtered = store
        .list_latest_per_facility(&FacilityFilter::parse_list("B,Z"))
        .expect("filtered listing");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, b.id);

    let codes: Vec<String> = store
        .facility_codes()
        .expect("codes")
        .iter()
        .map(|code| code.to_string())
        .collect();
    assert_eq!(codes, vec!["A", "B"]);
}

fn assert_uncoded_rows_never_collide_with_codes<S: SubmissionStore>(store: &S) {
    let uncoded = store
        .upsert(new_submission(None, "E-none", 30.0))
        .expect("uncoded upsert");
    let lookalike = format!("#{}", uncoded.id.0);
    let coded = store
        .upsert(new_submission(Some(&lookalike), "E-hash", 45.0))
        .expect("coded upsert");
    assert!(!coded.was_update);
    assert_ne!(coded.id, uncoded.id);

    let ids: Vec<SubmissionId> = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing")
        .iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![coded.id, uncoded.id]);
}

fn assert_concurrent_upserts_keep_one_record<S: SubmissionStore + 'static>(store: Arc<S>) {
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                store
                    .upsert(new_submission(
                        Some("HYD-02"),
                        &format!("E-{worker}"),
                        f64::from(worker),
                    ))
                    .expect("upsert")
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker finished"))
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| !outcome.was_update).count(), 1);
    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    assert_eq!(listing.len(), 1);
    assert!(outcomes.iter().all(|outcome| outcome.id == listing[0].id));
}

#[test]
fn memory_store_keeps_latest_submission_per_code() {
    assert_latest_wins(&InMemorySubmissionStore::default());
}

#[test]
fn memory_store_never_merges_uncoded_submissions() {
    assert_uncoded_submissions_accumulate(&InMemorySubmissionStore::default());
}

#[test]
fn memory_store_lists_most_recent_first() {
    assert_listing_is_most_recent_first(&InMemorySubmissionStore::default());
}

#[test]
fn memory_store_keeps_uncoded_rows_apart_from_hash_codes() {
    assert_uncoded_rows_never_collide_with_codes(&InMemorySubmissionStore::default());
}

#[test]
fn memory_store_serializes_upserts_per_code() {
    let store = Arc::new(InMemorySubmissionStore::default());
    assert_concurrent_upserts_keep_one_record(store.clone());
    assert_eq!(store.key_lock_count(), 0);
}

#[test]
fn memory_store_drops_code_locks_after_upserts() {
    let store = InMemorySubmissionStore::default();
    for index in 0..50 {
        store
            .upsert(new_submission(Some(&format!("SITE-{index}")), "E-1", 50.0))
            .expect("upsert");
    }
    assert_eq!(store.len(), 50);
    assert_eq!(store.key_lock_count(), 0);
}

#[test]
fn memory_store_lists_one_row_for_legacy_duplicates() {
    let base = Utc
        .with_ymd_and_hms(2024, 11, 2, 8, 30, 0)
        .single()
        .expect("valid timestamp");
    let legacy = |id: i64, minutes: i64| SubmissionRecord {
        id: SubmissionId(id),
        facility_code: FacilityCode::parse("PNQ-03"),
        submitter_id: format!("E-{id}"),
        latitude: 18.52,
        longitude: 73.85,
        reference_link: None,
        total_score: 55.0,
        created_at: base + Duration::minutes(minutes),
        answer_payload: None,
    };
    let store = InMemorySubmissionStore::with_records(vec![legacy(1, 5), legacy(2, 0)]);

    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, SubmissionId(1));

    let outcome = store
        .upsert(new_submission(Some("PNQ-03"), "E-new", 70.0))
        .expect("upsert");
    assert_eq!(outcome.id, SubmissionId(1));
    assert_eq!(store.len(), 2);
}

#[test]
fn sqlite_store_keeps_latest_submission_per_code() {
    let (_dir, store) = sqlite_store();
    assert_latest_wins(&store);
}

#[test]
fn sqlite_store_never_merges_uncoded_submissions() {
    let (_dir, store) = sqlite_store();
    assert_uncoded_submissions_accumulate(&store);
}

#[test]
fn sqlite_store_lists_most_recent_first() {
    let (_dir, store) = sqlite_store();
    assert_listing_is_most_recent_first(&store);
}

#[test]
fn sqlite_store_keeps_uncoded_rows_apart_from_hash_codes() {
    let (_dir, store) = sqlite_store();
    assert_uncoded_rows_never_collide_with_codes(&store);
}

#[test]
fn sqlite_store_serializes_upserts_per_code() {
    let (_dir, store) = sqlite_store();
    assert_concurrent_upserts_keep_one_record(Arc::new(store));
}

#[test]
fn sqlite_store_round_trips_payloads() {
    let (_dir, store) = sqlite_store();
    let (service, _) = build_service();
    let answers = answers("BLR-11");
    let scores = service.score(&answers);

    let mut submission = new_submission(Some("BLR-11"), "E-9", scores.total);
    submission.answer_payload = Some(SubmissionPayload::new(&answers, &scores));
    let outcome = store.upsert(submission).expect("upsert");

    let record = store.get(outcome.id).expect("get").expect("record exists");
    let payload = record.answer_payload.expect("payload kept");
    assert_eq!(payload.answers(), answers);
    assert_eq!(payload.stored_scores().total_score, Some(scores.total));
    assert!(store.get(SubmissionId(999)).expect("get").is_none());
}

#[test]
fn sqlite_store_reads_legacy_rows() {
    let (dir, store) = sqlite_store();
    let conn = Connection::open(dir.path().join("submissions.db")).expect("connect");
    let rows = [
        (" CCU-01 ", "2024-06-01 10:00:00", Some("not json")),
        ("CCU-01", "2024-06-01 09:00:00", None),
        ("", "2024-06-01 11:00:00", None),
    ];
    for (code, created_at, payload) in rows {
        conn.execute(
            "INSERT INTO submissions (facility_code, submitter_id, latitude, longitude,
                 total_score, created_at, answer_payload)
             VALUES (?1, 'E-old', 22.57, 88.36, 48.0, ?2, ?3)",
            params![code, created_at, payload],
        )
        .expect("insert legacy row");
    }

    let listing = store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing");
    assert_eq!(listing.len(), 2);
    assert!(listing[0].facility_code.is_none());
    assert_eq!(
        listing[1].facility_code.as_ref().map(FacilityCode::as_str),
        Some("CCU-01")
    );
    assert!(listing[1].answer_payload.is_none());
    assert_eq!(listing[1].summary().total_score, 48.0);

    let outcome = store
        .upsert(new_submission(Some("CCU-01"), "E-new", 66.0))
        .expect("upsert over legacy rows");
    assert!(outcome.was_update);
    assert_eq!(outcome.id, listing[1].id);
}

#[test]
fn sqlite_store_rejects_blank_submitter_ids() {
    let (_dir, store) = sqlite_store();
    let result = store.upsert(new_submission(Some("X-1"), "  ", 10.0));
    assert!(result.is_err());
    assert!(store
        .list_latest_per_facility(&FacilityFilter::all())
        .expect("listing")
        .is_empty());
}
