// ==========================================
// Production planning integration tests
// ==========================================
// Allocation, scheduling, quality and inventory on the demo inputs
// ==========================================


use plant_ops::config::{InventoryConfig, ScheduleConfig};
use plant_ops::demo;
use plant_ops::domain::{MovementType, QualityStatus};
use plant_ops::engine::{
    EngineError, EquipmentAllocator, InventoryManager, QualityTracker, ScheduleGenerator,
};
use plant_ops::domain::MovementRequest;
use test_helpers::at;

#[test]
fn test_demo_schedule() {
    let start = at(2024, 3, 1, 6, 0);
    let generator = ScheduleGenerator::with_default_fleet(ScheduleConfig::default(), start);

    let result = generator
        .generate(&demo::production_orders(), &demo::raw_materials(), None, start)
        .unwrap();

    let placed: Vec<(&str, &str, &str)> = result
        .schedule
        .iter()
        .map(|s| (s.product_type.as_str(), s.assigned_equipment.as_str(), s.start_time.as_str()))
        .collect();
    assert_eq!(
        placed,
        vec![
            ("SMOKED_OMUL", "SMOKER-01", "08:00"),
            ("FROZEN_SIG", "FREEZER-01", "08:00"),
            ("FROZEN_OMUL", "FREEZER-01", "10:00"),
        ]
    );
    assert_eq!(result.unscheduled.len(), 1);
    assert_eq!(result.unscheduled[0].product_type, "DRIED_GRAYLING");
}

#[test]
fn test_schedule_rejects_missing_fish() {
    let start = at(2024, 3, 1, 6, 0);
    let generator = ScheduleGenerator::with_default_fleet(ScheduleConfig::default(), start);
    let materials: Vec<_> = demo::raw_materials()
        .into_iter()
        .filter(|m| m.fish_type != "SIG")
        .collect();

    match generator.generate(&demo::production_orders(), &materials, None, start) {
        Err(EngineError::InsufficientRawMaterials { missing }) => {
            assert_eq!(missing.get("SIG"), Some(&300.0));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.schedule.len())),
    }
}

#[test]
fn test_allocation_of_demo_tasks() {
    let now = at(2024, 3, 1, 8, 0);
    let mut allocator = EquipmentAllocator::with_default_fleet(now);

    let mut assigned = Vec::new();
    for task in demo::production_tasks(now) {
        let outcome = allocator.allocate(&task, now).unwrap();
        assigned.push(outcome.allocation.allocated_equipment.equipment_id);
    }
    assert_eq!(assigned[1], "FREEZER-01");
    assert!(assigned[0].starts_with("SMOKER-"));

    allocator.release(&assigned[1]).unwrap();
    assert!(matches!(
        allocator.release("SMOKER-99"),
        Err(EngineError::EquipmentNotFound(_))
    ));
}

#[test]
fn test_quality_checks_raise_alert_on_critical_parameter() {
    let now = at(2024, 3, 1, 12, 0);
    let mut tracker = QualityTracker::new();

    let outcomes: Vec<_> = demo::quality_checks()
        .iter()
        .map(|check| tracker.record_check(check.request(), now).unwrap())
        .collect();

    assert_eq!(outcomes[0].quality_check.status, QualityStatus::Passed);
    assert_eq!(outcomes[1].quality_check.status, QualityStatus::Failed);
    assert_eq!(tracker.alerts().len(), 1);
    assert_eq!(tracker.alerts()[0].batch_id, "BATCH-2024-002");

    let summary = tracker.batch_summary(demo::DEMO_BATCH_ID).unwrap();
    assert_eq!(summary.total_checks, 1);
    assert_eq!(summary.passed_checks, 1);
}

#[test]
fn test_inventory_movements_and_yield() {
    let now = at(2024, 3, 1, 18, 0);
    let mut manager = InventoryManager::with_default_stock(InventoryConfig::default(), now);

    for request in demo::inventory_movements() {
        manager.record_movement(request, now).unwrap();
    }
    assert_eq!(manager.item("RAW-OMUL-001").map(|i| i.quantity), Some(100.0));
    assert_eq!(manager.item("FIN-SMOKED-OMUL-001").map(|i| i.quantity), Some(300.0));

    let report = manager
        .calculate_yield(demo::DEMO_BATCH_ID, "RAW-OMUL-001", "FIN-SMOKED-OMUL-001")
        .unwrap();
    assert!((report.yield_data.yield_percentage - 75.0).abs() < 1e-9);

    let overdraw = MovementRequest {
        item_id: "RAW-OMUL-001".to_string(),
        movement_type: MovementType::Consumption,
        quantity: 500.0,
        reference_id: demo::DEMO_BATCH_ID.to_string(),
        location: "PROCESSING_AREA_A".to_string(),
        notes: String::new(),
    };
    match manager.record_movement(overdraw, now) {
        Err(EngineError::InvalidMovement(errors)) => {
            assert_eq!(errors, vec!["Insufficient quantity. Available: 100, Requested: 500"]);
        }
        other => panic!("unexpected result: {:?}", other.map(|o| o.movement.movement_id)),
    }
}
