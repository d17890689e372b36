// ==========================================
// Plant operations - inventory model
// ==========================================

use crate::domain::types::{InventoryType, MovementType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: String,
    pub item_type: InventoryType,
    pub description: String,
    pub quantity: f64,
    pub unit: String,                    // kg / pcs
    pub location: String,
    pub batch_id: Option<String>,
    pub product_type: Option<String>,    // finished goods only
    pub expiry_date: Option<NaiveDate>,
    pub quality_grade: Option<String>,
    pub reorder_point: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub movement_id: String,
    pub item_id: String,
    pub movement_type: MovementType,
    pub quantity: f64,
    pub reference_id: String,            // batch or order reference
    pub location: String,
    pub movement_time: NaiveDateTime,
    pub notes: String,
}

/// Movement request before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    pub item_id: String,
    pub movement_type: MovementType,
    pub quantity: f64,
    pub reference_id: String,
    pub location: String,
    #[serde(default)]
    pub notes: String,
}
