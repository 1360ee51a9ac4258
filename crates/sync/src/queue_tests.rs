// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::{memory_queue, START_MS};
use fieldsync_core::{fixtures, Payload};

fn report(id: &str) -> QueuedRecord {
    QueuedRecord::new(fixtures::report(id, "Meter reading"), fixtures::fixed_time())
}

fn location(id: &str) -> QueuedRecord {
    QueuedRecord::new(fixtures::location(id), fixtures::fixed_time())
}

fn ids(queue: &OfflineQueue, kind: RecordKind) -> Vec<String> {
    queue.drainable(kind).into_iter().map(|r| r.local_id).collect()
}

fn title(record: &QueuedRecord) -> &str {
    match &record.payload {
        Payload::Report(r) => &r.title,
        _ => "",
    }
}

#[test]
fn enqueue_keeps_insertion_order_per_kind() {
    let (queue, _, _) = memory_queue();
    queue.enqueue(report("offline_2")).unwrap();
    queue.enqueue(location("loc_1")).unwrap();
    queue.enqueue(report("offline_1")).unwrap();

    assert_eq!(ids(&queue, RecordKind::Report), vec!["offline_2", "offline_1"]);
    assert_eq!(ids(&queue, RecordKind::Location), vec!["loc_1"]);
    assert_eq!(queue.pending_count(), 3);
    assert!(!queue.is_empty());
}

#[test]
fn enqueue_stamps_queue_time() {
    let (queue, _, clock) = memory_queue();
    clock.advance(5_000);
    queue.enqueue(report("offline_1")).unwrap();
    assert_eq!(queue.drainable(RecordKind::Report)[0].queued_at.timestamp_millis(), START_MS + 5_000);
}

#[test]
fn queue_survives_reopen() {
    let (queue, store, clock) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    queue.enqueue(location("loc_1")).unwrap();
    queue.record_remap("offline_0", "srv_0").unwrap();
    queue.dead_letter(vec![report("offline_9")]).unwrap();
    drop(queue);

    let reopened = OfflineQueue::open(store, clock).unwrap();
    assert_eq!(ids(&reopened, RecordKind::Report), vec!["offline_1"]);
    assert_eq!(ids(&reopened, RecordKind::Location), vec!["loc_1"]);
    assert_eq!(reopened.resolve("offline_0"), "srv_0");
    assert_eq!(reopened.dead_letter_count(), 1);
}

#[test]
fn re_enqueue_replaces_in_place() {
    let (queue, _, _) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    queue.enqueue(report("offline_2")).unwrap();

    let mut edited = fixtures::report("offline_1", "Meter reading (corrected)");
    edited.description = "second visit".to_string();
    queue.enqueue(QueuedRecord::new(edited, fixtures::fixed_time())).unwrap();

    let records = queue.drainable(RecordKind::Report);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].local_id, "offline_1");
    assert_eq!(title(&records[0]), "Meter reading (corrected)");
}

#[test]
fn reconciled_ids_are_translated_on_enqueue() {
    let (queue, _, _) = memory_queue();
    queue.record_remap("offline_1", "srv_9").unwrap();

    let id = queue.enqueue(report("offline_1")).unwrap();
    let ocr = QueuedRecord::new(fixtures::ocr_result("ocr_1"), fixtures::fixed_time()).with_owner("offline_1");
    queue.enqueue(ocr).unwrap();

    assert_eq!(id, "srv_9");
    let queued = &queue.drainable(RecordKind::Report)[0];
    assert_eq!(queued.payload.id(), "srv_9");
    assert_eq!(queue.drainable(RecordKind::OcrResult)[0].owner_id.as_deref(), Some("srv_9"));
}

#[test]
fn remap_repoints_owner_references() {
    let (queue, store, clock) = memory_queue();
    let ocr = QueuedRecord::new(fixtures::ocr_result("ocr_1"), fixtures::fixed_time()).with_owner("offline_1");
    queue.enqueue(ocr).unwrap();

    queue.record_remap("offline_1", "srv_1").unwrap();

    assert_eq!(queue.remote_id_for("offline_1").as_deref(), Some("srv_1"));
    assert_eq!(queue.remote_id_for("offline_2"), None);
    assert_eq!(queue.resolve("offline_2"), "offline_2");
    let reopened = OfflineQueue::open(store, clock).unwrap();
    assert_eq!(reopened.drainable(RecordKind::OcrResult)[0].owner_id.as_deref(), Some("srv_1"));
}

#[test]
fn remove_drops_only_the_named_record() {
    let (queue, _, _) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    queue.enqueue(report("offline_2")).unwrap();

    queue.remove(RecordKind::Report, "offline_1").unwrap();
    queue.remove(RecordKind::Report, "offline_missing").unwrap();

    assert_eq!(ids(&queue, RecordKind::Report), vec!["offline_2"]);
}

#[test]
fn replace_all_overwrites_one_kind() {
    let (queue, _, _) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    queue.enqueue(location("loc_1")).unwrap();

    queue.replace_all(RecordKind::Location, vec![location("loc_7"), location("loc_8")]).unwrap();

    assert_eq!(ids(&queue, RecordKind::Location), vec!["loc_7", "loc_8"]);
    assert_eq!(ids(&queue, RecordKind::Report), vec!["offline_1"]);
}

#[test]
fn write_back_merges_with_concurrent_changes() {
    let (queue, _, _) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    queue.enqueue(report("offline_2")).unwrap();
    queue.enqueue(report("offline_3")).unwrap();
    let snapshot = queue.drainable(RecordKind::Report);

    // While the pass runs: offline_3 is edited and offline_4 is captured.
    queue
        .enqueue(QueuedRecord::new(fixtures::report("offline_3", "Edited"), fixtures::fixed_time()))
        .unwrap();
    queue.enqueue(report("offline_4")).unwrap();

    // The pass uploaded offline_1 and offline_3, and failed offline_2.
    let mut failed = snapshot[1].clone();
    failed.mark_failed("network error: timeout");
    queue.write_back(RecordKind::Report, &snapshot, vec![failed]).unwrap();

    let records = queue.drainable(RecordKind::Report);
    assert_eq!(
        records.iter().map(|r| r.local_id.as_str()).collect::<Vec<_>>(),
        vec!["offline_2", "offline_3", "offline_4"]
    );
    assert_eq!(records[0].attempt_count, 1);
    assert_eq!(title(&records[1]), "Edited");
    assert_eq!(records[2].attempt_count, 0);
}

#[test]
fn failed_write_leaves_memory_untouched() {
    let (queue, store, _) = memory_queue();
    queue.enqueue(report("offline_1")).unwrap();
    store.fail_writes(true);

    assert!(queue.enqueue(report("offline_2")).is_err());
    assert!(queue.remove(RecordKind::Report, "offline_1").is_err());

    assert_eq!(ids(&queue, RecordKind::Report), vec!["offline_1"]);
}

#[test]
fn unsaved_remap_is_kept_and_flushed_later() {
    let (queue, store, clock) = memory_queue();
    store.fail_writes(true);

    assert!(queue.record_remap("offline_1", "srv_1").is_err());
    assert_eq!(queue.remote_id_for("offline_1").as_deref(), Some("srv_1"));
    assert!(queue.flush_remap().is_err());

    store.fail_writes(false);
    queue.flush_remap().unwrap();

    let reopened = OfflineQueue::open(store, clock).unwrap();
    assert_eq!(reopened.resolve("offline_1"), "srv_1");
}

#[test]
fn flush_without_pending_remap_writes_nothing() {
    let (queue, store, _) = memory_queue();
    store.fail_writes(true);
    queue.flush_remap().unwrap();
}

#[test]
fn ocr_result_without_owner_is_rejected() {
    let (queue, _, _) = memory_queue();
    let orphan = QueuedRecord::new(fixtures::ocr_result("ocr_1"), fixtures::fixed_time());

    assert!(matches!(queue.enqueue(orphan), Err(Error::InvalidRecord(_))));
    assert!(queue.is_empty());
}

#[test]
fn failed_requeue_keeps_the_dead_letter() {
    let (queue, store, _) = memory_queue();
    let mut rejected = report("offline_1");
    rejected.mark_failed("validation error: title is required");
    queue.dead_letter(vec![rejected]).unwrap();
    store.fail_key(Some(RecordKind::Report.storage_key()));

    assert!(queue.requeue_dead_letter("offline_1").is_err());
    assert_eq!(queue.dead_letter_count(), 1);
    assert_eq!(queue.len(RecordKind::Report), 0);

    store.fail_key(None);
    queue.requeue_dead_letter("offline_1").unwrap();
    assert_eq!(queue.dead_letter_count(), 0);
    assert_eq!(ids(&queue, RecordKind::Report), vec!["offline_1"]);
}

#[test]
fn dead_letters_can_be_requeued() {
    let (queue, _, _) = memory_queue();
    let mut rejected = report("offline_1");
    rejected.mark_failed("validation error: title is required");
    rejected.mark_failed("validation error: title is required");
    rejected.mark_failed("validation error: title is required");
    queue.dead_letter(vec![rejected.clone()]).unwrap();
    queue.dead_letter(vec![rejected]).unwrap();
    assert_eq!(queue.dead_letter_count(), 1);

    queue.requeue_dead_letter("offline_1").unwrap();

    assert_eq!(queue.dead_letter_count(), 0);
    let requeued = &queue.drainable(RecordKind::Report)[0];
    assert_eq!(requeued.attempt_count, 0);
    assert_eq!(requeued.last_error, None);
}

#[test]
fn discarding_unknown_dead_letter_fails() {
    let (queue, _, _) = memory_queue();
    queue.dead_letter(vec![location("loc_1")]).unwrap();

    queue.discard_dead_letter("loc_1").unwrap();

    assert!(queue.dead_letters().is_empty());
    assert!(matches!(queue.discard_dead_letter("loc_1"), Err(Error::RecordNotFound(_))));
    assert!(matches!(queue.requeue_dead_letter("loc_2"), Err(Error::RecordNotFound(_))));
}

#[test]
fn corrupted_queue_fails_to_open() {
    let (_, store, clock) = memory_queue();
    store.set(RecordKind::Location.storage_key(), "{not json").unwrap();

    let err = OfflineQueue::open(store, clock).err().unwrap();
    assert!(matches!(err, Error::Storage(fieldsync_core::Error::CorruptedData { .. })));
}
