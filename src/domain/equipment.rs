// ==========================================
// Plant operations - equipment domain model
// ==========================================

use crate::domain::types::{EquipmentStatus, EquipmentType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Equipment - processing unit
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub equipment_id: String,            // e.g. SMOKER-01
    pub equipment_type: EquipmentType,
    pub capacity_kg: f64,                // maximum load per run
    pub status: EquipmentStatus,
    pub current_utilization: f64,        // percent, 0-100
    pub location: String,
    pub last_maintenance: NaiveDateTime,
    pub next_maintenance: NaiveDateTime,
}

impl Equipment {
    /// Whole days until the next scheduled maintenance (negative when overdue)
    pub fn maintenance_due_days(&self, now: NaiveDateTime) -> i64 {
        (self.next_maintenance - now).num_days()
    }
}

// ==========================================
// ProductionTask - allocation request
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTask {
    pub task_id: String,
    pub product_type: String,
    pub quantity_kg: f64,
    pub required_equipment: Vec<EquipmentType>,
    pub estimated_duration_hours: f64,
    pub priority: i32,                   // 1 = highest
    pub deadline: Option<NaiveDateTime>,
}
