// ==========================================
// Batch traceability integration tests
// ==========================================
// Full lifecycle against a file-backed SQLite database
// ==========================================


use plant_ops::api::error::ApiError;
use plant_ops::demo;
use plant_ops::domain::{BatchEventType, BatchStatus, NewBatch, NewBatchEvent};
use test_helpers::{at, create_test_db, create_test_tracker};

#[test]
fn test_batch_lifecycle_persists_across_reopen() {
    let (_temp, db_path) = create_test_db().unwrap();
    let start = at(2024, 3, 1, 6, 0);
    let now = at(2024, 3, 5, 6, 0);

    let batch_id = {
        let tracker = create_test_tracker(&db_path);
        let created = tracker.create_batch(&demo::new_batch(start), start).unwrap();
        assert!(created.batch_id.starts_with("BATCH-20240301-BEE-FAR-"));

        for event in demo::batch_events(start) {
            tracker.record_event(&created.batch_id, &event, now).unwrap();
        }
        created.batch_id
    };

    // fresh connection sees the committed state
    let tracker = create_test_tracker(&db_path);
    let info = tracker.get_batch_info(&batch_id).unwrap();
    assert_eq!(info.event_count, 6);
    assert_eq!(info.batch.status, BatchStatus::InTransit);
    assert!((info.batch.current_quantity_kg - 1180.0).abs() < 1e-9);
    assert_eq!(info.batch.quality_grade, "PREMIUM");
    assert_eq!(info.events[0].event_type, BatchEventType::Shipment);

    let timeline = tracker.get_batch_timeline(&batch_id).unwrap();
    assert_eq!(timeline.current_status, BatchStatus::InTransit);
    assert!(timeline.timeline_analysis.analysis_available);
    assert!((timeline.total_duration_days - 3.0).abs() < 1e-9);

    let report = tracker.generate_batch_report(&batch_id, now).unwrap();
    assert!(report.temperature_analysis.data_available);
    assert!(report.report_id.starts_with("BATCH_REPORT-20240305-060000-"));
}

#[test]
fn test_duplicate_batch_on_same_day_is_rejected() {
    let (_temp, db_path) = create_test_db().unwrap();
    let tracker = create_test_tracker(&db_path);
    let now = at(2024, 3, 1, 9, 0);

    tracker.create_batch(&demo::new_batch(now), now).unwrap();
    match tracker.create_batch(&demo::new_batch(now), now) {
        Err(ApiError::AlreadyExists(message)) => assert!(message.ends_with("already exists")),
        other => panic!("unexpected result: {:?}", other.map(|c| c.batch_id)),
    }
}

#[test]
fn test_validation_messages() {
    let (_temp, db_path) = create_test_db().unwrap();
    let tracker = create_test_tracker(&db_path);
    let now = at(2024, 3, 1, 9, 0);

    let missing = NewBatch {
        product_type: Some("BEEF".into()),
        ..Default::default()
    };
    match tracker.create_batch(&missing, now) {
        Err(ApiError::InvalidInput(m)) => {
            assert_eq!(m, "Missing required fields: production_date, quantity_kg, origin_farm")
        }
        other => panic!("unexpected result: {:?}", other.map(|c| c.batch_id)),
    }

    let future = NewBatch {
        production_date: Some("2024-03-02".into()),
        ..demo::new_batch(now)
    };
    assert!(matches!(
        tracker.create_batch(&future, now),
        Err(ApiError::InvalidInput(m)) if m == "Production date cannot be in the future"
    ));

    let event = NewBatchEvent::new(BatchEventType::Storage, "COLD_STORAGE_1");
    assert!(matches!(
        tracker.record_event("BATCH-UNKNOWN", &event, now),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_qr_scan_and_listing() {
    let (_temp, db_path) = create_test_db().unwrap();
    let tracker = create_test_tracker(&db_path);
    let now = at(2024, 3, 1, 9, 0);

    let created = tracker.create_batch(&demo::new_batch(now), now).unwrap();
    let other = NewBatch {
        product_type: Some("LAMB".into()),
        ..demo::new_batch(now)
    };
    let second = tracker.create_batch(&other, now).unwrap();
    tracker
        .record_event(
            &second.batch_id,
            &NewBatchEvent::new(BatchEventType::Storage, "COLD_STORAGE_2"),
            now,
        )
        .unwrap();

    let scanned = tracker.scan_batch_qr(&created.qr_payload).unwrap();
    assert_eq!(scanned.batch.batch_id, created.batch_id);
    assert!(matches!(
        tracker.scan_batch_qr("not json"),
        Err(ApiError::InvalidInput(m)) if m == "Invalid QR code format"
    ));

    assert_eq!(tracker.list_batches(None).unwrap().len(), 2);
    let stored = tracker.list_batches(Some(BatchStatus::InStorage)).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].batch_id, second.batch_id);
}
