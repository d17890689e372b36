// ==========================================
// Plant operations - demo inputs
// ==========================================
// Sample records driving the CLI subcommands when no input
// file is given. Dates are relative to the caller's `now`.
// ==========================================

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde_json::json;

use crate::customs::client::CustomsDocument;
use crate::domain::batch::{NewBatch, NewBatchEvent};
use crate::domain::equipment::ProductionTask;
use crate::domain::export_order::{
    Customer, ExportOrder, Labeling, ProductCompliance, ProductLine, Shipment,
};
use crate::domain::inventory::MovementRequest;
use crate::domain::production::{ProductionOrder, RawMaterial};
use crate::domain::temperature::TemperatureReading;
use crate::domain::types::{BatchEventType, CheckType, EquipmentType, MovementType};
use crate::engine::plant_metrics::ProductionBatch;
use crate::engine::quality_tracker::CheckRequest;
use crate::engine::schedule_generator::{default_requirements, standard_processing_time};

pub const DEMO_BATCH_ID: &str = "BATCH-2024-001";

pub fn production_tasks(now: NaiveDateTime) -> Vec<ProductionTask> {
    vec![
        ProductionTask {
            task_id: "TASK-001".to_string(),
            product_type: "SMOKED_OMUL".to_string(),
            quantity_kg: 150.0,
            required_equipment: vec![EquipmentType::Smoker],
            estimated_duration_hours: 8.0,
            priority: 1,
            deadline: Some(now + Duration::hours(24)),
        },
        ProductionTask {
            task_id: "TASK-002".to_string(),
            product_type: "FROZEN_SIG".to_string(),
            quantity_kg: 400.0,
            required_equipment: vec![EquipmentType::Freezer],
            estimated_duration_hours: 2.0,
            priority: 2,
            deadline: None,
        },
    ]
}

fn production_order(product_type: &str, quantity_kg: f64, priority: i32) -> ProductionOrder {
    ProductionOrder {
        product_type: product_type.to_string(),
        quantity_kg,
        priority,
        processing_time_hours: standard_processing_time(product_type).unwrap_or(8.0),
        equipment_requirements: default_requirements(product_type),
    }
}

pub fn production_orders() -> Vec<ProductionOrder> {
    vec![
        production_order("SMOKED_OMUL", 200.0, 1),
        production_order("FROZEN_SIG", 300.0, 2),
        production_order("DRIED_GRAYLING", 150.0, 3),
        production_order("FROZEN_OMUL", 250.0, 3),
    ]
}

pub fn raw_materials() -> Vec<RawMaterial> {
    let lot = |id: &str, fish: &str, qty: f64, days: i32| RawMaterial {
        material_id: id.to_string(),
        fish_type: fish.to_string(),
        quantity_kg: qty,
        quality_grade: "EXCELLENT".to_string(),
        shelf_life_days: days,
    };
    vec![
        lot("RAW-OMUL-001", "OMUL", 600.0, 3),
        lot("RAW-SIG-001", "SIG", 500.0, 4),
        lot("RAW-GRAYLING-001", "GRAYLING", 200.0, 5),
    ]
}

/// Quality check inputs for one product
pub struct DemoCheck {
    pub batch_id: &'static str,
    pub product_type: &'static str,
    pub check_type: CheckType,
    pub parameters: BTreeMap<String, f64>,
}

impl DemoCheck {
    pub fn request(&self) -> CheckRequest<'_> {
        CheckRequest {
            batch_id: self.batch_id,
            product_type: self.product_type,
            check_type: self.check_type,
            parameters: self.parameters.clone(),
            inspector_id: "QC-INSPECTOR-01",
            comments: "",
        }
    }
}

fn params(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn quality_checks() -> Vec<DemoCheck> {
    vec![
        DemoCheck {
            batch_id: DEMO_BATCH_ID,
            product_type: "SMOKED_OMUL",
            check_type: CheckType::FinalProduct,
            parameters: params(&[
                ("appearance_score", 9.2),
                ("texture_score", 8.7),
                ("smell_score", 9.6),
                ("salt_content", 2.9),
                ("bacterial_count", 120.0),
            ]),
        },
        DemoCheck {
            batch_id: "BATCH-2024-002",
            product_type: "FROZEN_SIG",
            check_type: CheckType::InProcess,
            parameters: params(&[
                ("appearance_score", 8.1),
                ("texture_score", 8.8),
                ("temperature", -16.5),
                ("ice_crystal_size", 0.2),
            ]),
        },
    ]
}

pub fn inventory_movements() -> Vec<MovementRequest> {
    let movement = |item: &str, movement_type: MovementType, qty: f64, location: &str| {
        MovementRequest {
            item_id: item.to_string(),
            movement_type,
            quantity: qty,
            reference_id: DEMO_BATCH_ID.to_string(),
            location: location.to_string(),
            notes: String::new(),
        }
    };
    vec![
        movement("RAW-OMUL-001", MovementType::Consumption, 200.0, "PROCESSING_AREA_A"),
        movement("FIN-SMOKED-OMUL-001", MovementType::Production, 150.0, "FINISHED_GOODS"),
        movement("PKG-VACUUM-001", MovementType::Consumption, 300.0, "PACKAGING_LINE"),
    ]
}

pub fn export_order(now: NaiveDateTime) -> ExportOrder {
    let today = now.date();
    ExportOrder {
        order_id: Some("BO-2024-001".to_string()),
        customer: Customer {
            customer_id: Some("CUST-CN-001".to_string()),
            name: Some("China Meat Import Co.".to_string()),
            import_license: Some("CN-IMPORT-2024-001".to_string()),
            address: Some("Beijing, China".to_string()),
        },
        products: vec![ProductLine {
            product_id: Some("BEEF-001".to_string()),
            description: Some("Frozen Beef Carcass Grade A".to_string()),
            meat_type: Some("BEEF".to_string()),
            quantity_kg: Some(5000.0),
            unit_price: Some(5.5),
            production_date: Some((today - Duration::days(10)).format("%Y-%m-%d").to_string()),
            expiry_date: Some((today + Duration::days(355)).format("%Y-%m-%d").to_string()),
            current_temperature: Some(-18.5),
            quality_grade: Some("A".to_string()),
            halal_certified: true,
            lab_tests: vec![
                "Salmonella: Negative".to_string(),
                "Listeria: Negative".to_string(),
            ],
            ..Default::default()
        }],
        shipment: Some(Shipment {
            port_of_entry: Some("Manzhouli".to_string()),
            transport_method: Some("REFRIGERATED_TRUCK".to_string()),
            expected_departure: Some(
                (now + Duration::days(7)).format("%Y-%m-%dT%H:%M:%S").to_string(),
            ),
            insurance_value: Some(550.0),
            freight_cost: Some(1800.0),
        }),
        documents: vec![
            "health_certificate".to_string(),
            "veterinary_certificate".to_string(),
            "certificate_of_origin".to_string(),
            "customs_declaration".to_string(),
            "halal_certificate".to_string(),
        ],
        ..Default::default()
    }
}

pub fn product_compliance() -> ProductCompliance {
    let fields = [
        ("product_name", "Frozen Beef Carcass"),
        ("production_date", "2024-01-15"),
        ("expiry_date", "2025-01-15"),
        ("storage_conditions", "-18°C"),
        ("net_weight", "25 kg"),
        ("importer_information", "China Meat Import Co."),
        ("country_of_origin", "Russia"),
    ];
    ProductCompliance {
        meat_type: Some("beef".to_string()),
        current_temperature: Some(-18.0),
        documents: vec![
            "veterinary_certificate".to_string(),
            "health_certificate".to_string(),
            "certificate_of_origin".to_string(),
            "quality_inspection_certificate".to_string(),
        ],
        labeling: Labeling {
            languages: vec!["chinese".to_string(), "russian".to_string()],
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        },
        ..Default::default()
    }
}

/// Two days of 15-minute readings with one warm excursion
pub fn temperature_readings(now: NaiveDateTime) -> Vec<TemperatureReading> {
    let start = now - Duration::hours(48);
    (0..192)
        .map(|i| {
            let base = -18.5 + 0.4 * ((i as f64) / 12.0).sin();
            let temperature = if (100..106).contains(&i) { -13.5 } else { base };
            TemperatureReading {
                batch_id: DEMO_BATCH_ID.to_string(),
                sensor_id: "SENSOR-TRUCK-01".to_string(),
                temperature,
                timestamp: start + Duration::minutes(15 * i),
            }
        })
        .collect()
}

pub fn new_batch(now: NaiveDateTime) -> NewBatch {
    NewBatch {
        product_type: Some("BEEF".to_string()),
        production_date: Some(now.date().format("%Y-%m-%d").to_string()),
        quantity_kg: Some(1200.0),
        origin_farm: Some("FARM-KIZHINGA-01".to_string()),
        quality_grade: Some("PREMIUM".to_string()),
    }
}

/// Lifecycle after creation, hours after `start`
pub fn batch_events(start: NaiveDateTime) -> Vec<NewBatchEvent> {
    let event = |event_type, location: &str, hours: i64, temperature: Option<f64>| NewBatchEvent {
        timestamp: Some(start + Duration::hours(hours)),
        temperature,
        responsible_party: Some("BuryatMyasoprom".to_string()),
        ..NewBatchEvent::new(event_type, location)
    };

    let mut check = event(BatchEventType::QualityCheck, "QC_LAB", 4, Some(2.0));
    check.quality_metrics = Some(json!({"ph": 5.8, "bacterial_count": 150.0, "fat_content": 12.5}));

    // trimming loss
    let mut processing = event(BatchEventType::Processing, "PROCESSING_AREA_B", 8, Some(1.0));
    processing.quantity_change_kg = Some(-20.0);

    vec![
        check,
        processing,
        event(BatchEventType::Packaging, "PACKAGING_LINE", 12, Some(-2.0)),
        event(BatchEventType::Storage, "COLD_STORAGE_1", 16, Some(-18.5)),
        event(BatchEventType::Shipment, "LOADING_DOCK", 72, Some(-18.0)),
    ]
}

pub fn production_batches() -> Vec<ProductionBatch> {
    vec![
        ProductionBatch { units: 1200, defects: 18 },
        ProductionBatch { units: 950, defects: 9 },
        ProductionBatch { units: 1100, defects: 22 },
    ]
}

pub fn customs_documents(order: &ExportOrder) -> Vec<CustomsDocument> {
    let first = order.products.first();
    let text = |value: Option<&String>| json!(value.cloned().unwrap_or_default());

    let health = [
        ("exporter_name", json!("BuryatMyasoprom")),
        ("product_description", text(first.and_then(|p| p.description.as_ref()))),
        ("production_date", text(first.and_then(|p| p.production_date.as_ref()))),
        ("veterinary_inspection", json!("APPROVED")),
        ("china_importer", text(order.customer.name.as_ref())),
    ];
    let declaration = [
        ("hs_code", json!("0201.10")),
        ("product_value", json!(27500.0)),
        ("weight_kg", json!(order.total_quantity_kg())),
        ("country_of_origin", json!("RUSSIA")),
    ];

    let to_map = |pairs: &[(&str, serde_json::Value)]| -> BTreeMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };
    vec![
        CustomsDocument {
            doc_type: "health_certificate".to_string(),
            content: to_map(&health[..]),
        },
        CustomsDocument {
            doc_type: "customs_declaration".to_string(),
            content: to_map(&declaration[..]),
        },
    ]
}
