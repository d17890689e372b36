// ==========================================
// Plant operations - inventory manager
// ==========================================
// In-memory stock ledger: movements, yields, reports
// ==========================================

use crate::config::InventoryConfig;
use crate::domain::inventory::{InventoryItem, InventoryMovement, MovementRequest};
use crate::domain::types::{InventoryType, MovementType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{generate_id, round_to};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Default expected yield when the product has no standard
pub const DEFAULT_EXPECTED_YIELD: f64 = 85.0;

/// Expected yield (%) per finished product type
pub fn expected_yield(product_type: &str) -> f64 {
    match product_type {
        "SMOKED_OMUL" => 80.0,
        "FROZEN_SIG" => 91.0,
        "DRIED_GRAYLING" => 83.0,
        _ => DEFAULT_EXPECTED_YIELD,
    }
}

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub description: String,
    pub current_quantity: f64,
    pub unit: String,
    pub location: String,
    pub batch_id: Option<String>,
    pub quality_grade: Option<String>,
}

impl From<&InventoryItem> for ItemSnapshot {
    fn from(item: &InventoryItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            description: item.description.clone(),
            current_quantity: item.quantity,
            unit: item.unit.clone(),
            location: item.location.clone(),
            batch_id: item.batch_id.clone(),
            quality_grade: item.quality_grade.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementOutcome {
    pub movement: InventoryMovement,
    pub inventory_snapshot: ItemSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct YieldData {
    pub batch_id: String,
    pub raw_material_consumed_kg: f64,
    pub finished_product_produced_kg: f64,
    pub yield_percentage: f64,
    pub loss_percentage: f64,
    pub loss_kg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YieldComparison {
    pub product_type: Option<String>,
    pub expected_yield: f64,
    pub actual_yield: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub performance: String, // ABOVE_EXPECTED / BELOW_EXPECTED
}

#[derive(Debug, Clone, Serialize)]
pub struct YieldReport {
    pub yield_data: YieldData,
    pub comparison: YieldComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_quantity_kg: f64,
    pub low_stock_items: usize,
    pub recent_movements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub report_id: String,
    pub generated_at: NaiveDateTime,
    pub summary: InventorySummary,
    pub inventory_by_type: BTreeMap<InventoryType, Vec<ItemSnapshot>>,
    pub low_stock_alerts: Vec<ItemSnapshot>,
    pub reorder_alerts: Vec<String>,
    pub recent_movements: Vec<InventoryMovement>,
}

// ==========================================
// InventoryManager
// ==========================================
pub struct InventoryManager {
    config: InventoryConfig,
    items: BTreeMap<String, InventoryItem>,
    movements: Vec<InventoryMovement>,
}

impl InventoryManager {
    pub fn new(config: InventoryConfig, items: Vec<InventoryItem>) -> Self {
        Self {
            config,
            items: items.into_iter().map(|i| (i.item_id.clone(), i)).collect(),
            movements: Vec::new(),
        }
    }

    /// Manager seeded with the plant's opening stock
    pub fn with_default_stock(config: InventoryConfig, now: NaiveDateTime) -> Self {
        Self::new(config, default_stock(now))
    }

    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.items.get(item_id)
    }

    /// Validate and apply a stock movement
    ///
    /// # Returns
    /// - Err(InvalidMovement): every validation failure, collected
    pub fn record_movement(
        &mut self,
        request: MovementRequest,
        now: NaiveDateTime,
    ) -> EngineResult<MovementOutcome> {
        let errors = self.validate_movement(&request);
        if !errors.is_empty() {
            warn!(item_id = %request.item_id, ?errors, "movement rejected");
            return Err(EngineError::InvalidMovement(errors));
        }

        let item = self
            .items
            .get_mut(&request.item_id)
            .ok_or_else(|| EngineError::ItemNotFound(request.item_id.clone()))?;

        match request.movement_type {
            MovementType::Receipt | MovementType::Production => item.quantity += request.quantity,
            MovementType::Consumption => item.quantity -= request.quantity,
            MovementType::Adjustment => item.quantity = request.quantity,
            MovementType::Transfer => {}
        }
        item.location = request.location.clone();

        let movement = InventoryMovement {
            movement_id: generate_id("MOV", now),
            item_id: request.item_id,
            movement_type: request.movement_type,
            quantity: request.quantity,
            reference_id: request.reference_id,
            location: request.location,
            movement_time: now,
            notes: request.notes,
        };
        info!(
            movement_id = %movement.movement_id,
            item_id = %movement.item_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            on_hand = item.quantity,
            "movement recorded"
        );

        let snapshot = ItemSnapshot::from(&*item);
        self.movements.push(movement.clone());

        Ok(MovementOutcome {
            movement,
            inventory_snapshot: snapshot,
        })
    }

    fn validate_movement(&self, request: &MovementRequest) -> Vec<String> {
        let mut errors = Vec::new();
        let item = self.items.get(&request.item_id);

        if item.is_none() {
            errors.push(format!("Item {} not found", request.item_id));
        }
        if request.quantity <= 0.0 {
            errors.push("Quantity must be positive".to_string());
        }
        if let (MovementType::Consumption, Some(item)) = (request.movement_type, item) {
            if request.quantity > item.quantity {
                errors.push(format!(
                    "Insufficient quantity. Available: {}, Requested: {}",
                    item.quantity, request.quantity
                ));
            }
        }
        errors
    }

    /// Yield of a batch: finished kg produced over raw kg consumed
    pub fn calculate_yield(
        &self,
        batch_id: &str,
        raw_item_id: &str,
        finished_item_id: &str,
    ) -> EngineResult<YieldReport> {
        let total = |item_id: &str, movement_type: MovementType| -> f64 {
            self.movements
                .iter()
                .filter(|m| {
                    m.reference_id == batch_id
                        && m.item_id == item_id
                        && m.movement_type == movement_type
                })
                .map(|m| m.quantity)
                .sum()
        };

        let consumed = total(raw_item_id, MovementType::Consumption);
        let produced = total(finished_item_id, MovementType::Production);
        if consumed == 0.0 {
            return Err(EngineError::NoRawMaterialConsumption {
                batch_id: batch_id.to_string(),
            });
        }

        let yield_pct = produced / consumed * 100.0;
        let product_type = self
            .items
            .get(finished_item_id)
            .and_then(|i| i.product_type.clone());
        let expected = product_type
            .as_deref()
            .map(expected_yield)
            .unwrap_or(DEFAULT_EXPECTED_YIELD);
        let variance = yield_pct - expected;

        Ok(YieldReport {
            yield_data: YieldData {
                batch_id: batch_id.to_string(),
                raw_material_consumed_kg: consumed,
                finished_product_produced_kg: produced,
                yield_percentage: round_to(yield_pct, 1),
                loss_percentage: round_to(100.0 - yield_pct, 1),
                loss_kg: consumed - produced,
            },
            comparison: YieldComparison {
                product_type,
                expected_yield: expected,
                actual_yield: round_to(yield_pct, 1),
                variance: round_to(variance, 1),
                variance_percentage: round_to(variance / expected * 100.0, 1),
                performance: if variance > 0.0 {
                    "ABOVE_EXPECTED".to_string()
                } else {
                    "BELOW_EXPECTED".to_string()
                },
            },
        })
    }

    /// On-hand at or below the item's reorder point
    pub fn needs_reorder(&self, item_id: &str) -> EngineResult<bool> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))?;
        Ok(item.reorder_point.map_or(false, |point| item.quantity <= point))
    }

    pub fn inventory_report(&self, now: NaiveDateTime) -> InventoryReport {
        let mut by_type: BTreeMap<InventoryType, Vec<ItemSnapshot>> = BTreeMap::new();
        for item in self.items.values() {
            by_type.entry(item.item_type).or_default().push(item.into());
        }

        let low_stock: Vec<ItemSnapshot> = self
            .items
            .values()
            .filter(|i| i.quantity < self.config.low_stock_threshold_kg)
            .map(ItemSnapshot::from)
            .collect();

        let reorder_alerts: Vec<String> = self
            .items
            .values()
            .filter(|i| i.reorder_point.map_or(false, |p| i.quantity <= p))
            .map(|i| i.item_id.clone())
            .collect();

        let mut recent = self.movements.clone();
        recent.sort_by(|a, b| b.movement_time.cmp(&a.movement_time));
        recent.truncate(self.config.recent_movements_in_report);

        InventoryReport {
            report_id: format!("INV-REPORT-{}", now.format("%Y%m%d-%H%M%S")),
            generated_at: now,
            summary: InventorySummary {
                total_items: self.items.len(),
                total_quantity_kg: round_to(self.items.values().map(|i| i.quantity).sum(), 1),
                low_stock_items: low_stock.len(),
                recent_movements: recent.len(),
            },
            inventory_by_type: by_type,
            low_stock_alerts: low_stock,
            reorder_alerts,
            recent_movements: recent,
        }
    }
}

/// Opening stock relative to `now`
pub fn default_stock(now: NaiveDateTime) -> Vec<InventoryItem> {
    let today = now.date();
    vec![
        InventoryItem {
            item_id: "RAW-OMUL-001".to_string(),
            item_type: InventoryType::RawMaterial,
            description: "Fresh Omul Fish".to_string(),
            quantity: 300.0,
            unit: "kg".to_string(),
            location: "COLD_ROOM_A".to_string(),
            batch_id: None,
            product_type: None,
            expiry_date: Some(today + Duration::days(3)),
            quality_grade: Some("EXCELLENT".to_string()),
            reorder_point: Some(500.0),
        },
        InventoryItem {
            item_id: "RAW-SIG-001".to_string(),
            item_type: InventoryType::RawMaterial,
            description: "Fresh Sig Fish".to_string(),
            quantity: 400.0,
            unit: "kg".to_string(),
            location: "COLD_ROOM_B".to_string(),
            batch_id: None,
            product_type: None,
            expiry_date: Some(today + Duration::days(2)),
            quality_grade: Some("GOOD".to_string()),
            reorder_point: Some(300.0),
        },
        InventoryItem {
            item_id: "FIN-SMOKED-OMUL-001".to_string(),
            item_type: InventoryType::FinishedGood,
            description: "Smoked Omul Fish".to_string(),
            quantity: 150.0,
            unit: "kg".to_string(),
            location: "FINISHED_GOODS".to_string(),
            batch_id: Some("BATCH-2024-001".to_string()),
            product_type: Some("SMOKED_OMUL".to_string()),
            expiry_date: Some(today + Duration::days(14)),
            quality_grade: Some("PREMIUM".to_string()),
            reorder_point: None,
        },
        InventoryItem {
            item_id: "PKG-VACUUM-001".to_string(),
            item_type: InventoryType::Packaging,
            description: "Vacuum packaging bags".to_string(),
            quantity: 1200.0,
            unit: "pcs".to_string(),
            location: "PACKAGING_STORE".to_string(),
            batch_id: None,
            product_type: None,
            expiry_date: None,
            quality_grade: None,
            reorder_point: Some(1000.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn manager() -> InventoryManager {
        InventoryManager::with_default_stock(InventoryConfig::default(), now())
    }

    fn movement(item_id: &str, movement_type: MovementType, quantity: f64, location: &str) -> MovementRequest {
        MovementRequest {
            item_id: item_id.to_string(),
            movement_type,
            quantity,
            reference_id: "BATCH-2024-002".to_string(),
            location: location.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_consumption_and_production_update_stock() {
        let mut mgr = manager();
        let out = mgr
            .record_movement(movement("RAW-OMUL-001", MovementType::Consumption, 100.0, "PROCESSING_AREA_A"), now())
            .unwrap();
        assert_eq!(out.inventory_snapshot.current_quantity, 200.0);
        assert_eq!(out.inventory_snapshot.location, "PROCESSING_AREA_A");

        mgr.record_movement(movement("FIN-SMOKED-OMUL-001", MovementType::Production, 80.0, "FINISHED_GOODS"), now())
            .unwrap();
        assert_eq!(mgr.item("FIN-SMOKED-OMUL-001").unwrap().quantity, 230.0);
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let mut mgr = manager();
        let err = mgr
            .record_movement(movement("RAW-OMUL-001", MovementType::Consumption, 500.0, "X"), now())
            .unwrap_err();
        match err {
            EngineError::InvalidMovement(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("Insufficient quantity"));
            }
            other => panic!("unexpected error: {}", other),
        }

        let err = mgr
            .record_movement(movement("RAW-NONE", MovementType::Receipt, -1.0, "X"), now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidMovement(ref e) if e.len() == 2));
        // Stock untouched
        assert_eq!(mgr.item("RAW-OMUL-001").unwrap().quantity, 300.0);
    }

    #[test]
    fn test_adjustment_and_transfer() {
        let mut mgr = manager();
        mgr.record_movement(movement("RAW-SIG-001", MovementType::Adjustment, 390.0, "COLD_ROOM_B"), now())
            .unwrap();
        assert_eq!(mgr.item("RAW-SIG-001").unwrap().quantity, 390.0);

        mgr.record_movement(movement("RAW-SIG-001", MovementType::Transfer, 390.0, "COLD_ROOM_A"), now())
            .unwrap();
        let item = mgr.item("RAW-SIG-001").unwrap();
        assert_eq!(item.quantity, 390.0);
        assert_eq!(item.location, "COLD_ROOM_A");
    }

    #[test]
    fn test_yield_against_expected() {
        let mut mgr = manager();
        mgr.record_movement(movement("RAW-OMUL-001", MovementType::Consumption, 200.0, "A"), now())
            .unwrap();
        mgr.record_movement(movement("FIN-SMOKED-OMUL-001", MovementType::Production, 170.0, "B"), now())
            .unwrap();

        let report = mgr
            .calculate_yield("BATCH-2024-002", "RAW-OMUL-001", "FIN-SMOKED-OMUL-001")
            .unwrap();
        assert_eq!(report.yield_data.yield_percentage, 85.0);
        assert_eq!(report.yield_data.loss_percentage, 15.0);
        assert_eq!(report.yield_data.loss_kg, 30.0);
        assert_eq!(report.comparison.expected_yield, 80.0);
        assert_eq!(report.comparison.variance, 5.0);
        assert_eq!(report.comparison.variance_percentage, 6.3);
        assert_eq!(report.comparison.performance, "ABOVE_EXPECTED");

        assert!(matches!(
            mgr.calculate_yield("OTHER", "RAW-OMUL-001", "FIN-SMOKED-OMUL-001"),
            Err(EngineError::NoRawMaterialConsumption { .. })
        ));
    }

    #[test]
    fn test_report_and_reorder() {
        let mut mgr = manager();
        mgr.record_movement(movement("RAW-SIG-001", MovementType::Consumption, 360.0, "COLD_ROOM_B"), now())
            .unwrap();

        assert!(mgr.needs_reorder("RAW-OMUL-001").unwrap());
        assert!(mgr.needs_reorder("RAW-SIG-001").unwrap());
        assert!(!mgr.needs_reorder("FIN-SMOKED-OMUL-001").unwrap());
        assert!(!mgr.needs_reorder("PKG-VACUUM-001").unwrap());

        let report = mgr.inventory_report(now());
        assert_eq!(report.summary.total_items, 4);
        assert_eq!(report.summary.low_stock_items, 1);
        assert_eq!(report.low_stock_alerts[0].item_id, "RAW-SIG-001");
        assert_eq!(report.recent_movements.len(), 1);
        assert_eq!(report.inventory_by_type[&InventoryType::RawMaterial].len(), 2);
    }
}
