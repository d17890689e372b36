// ==========================================
// Plant operations - batch traceability model
// ==========================================
// Tables: batches / batch_events
// ==========================================

use crate::domain::types::{BatchEventType, BatchStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Batch - persisted production batch
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub product_type: String,
    pub production_date: NaiveDate,
    pub initial_quantity_kg: f64,
    pub current_quantity_kg: f64,
    pub origin_farm: String,
    pub quality_grade: String,
    pub status: BatchStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// BatchEvent - traceability event
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEvent {
    pub event_id: i64,
    pub batch_id: String,
    pub event_type: BatchEventType,
    pub location: String,
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub quality_metrics: Option<serde_json::Value>,
    pub responsible_party: Option<String>,
    pub quantity_change_kg: Option<f64>,
}

/// Batch creation request
///
/// Fields are optional so that presence can be validated with
/// explicit messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBatch {
    pub product_type: Option<String>,
    pub production_date: Option<String>, // YYYY-MM-DD or ISO date-time
    pub quantity_kg: Option<f64>,
    pub origin_farm: Option<String>,
    pub quality_grade: Option<String>,
}

/// Event recording request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatchEvent {
    pub event_type: BatchEventType,
    pub location: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub quality_metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub responsible_party: Option<String>,
    #[serde(default)]
    pub quantity_change_kg: Option<f64>,
}

impl NewBatchEvent {
    pub fn new(event_type: BatchEventType, location: &str) -> Self {
        Self {
            event_type,
            location: location.to_string(),
            timestamp: None,
            temperature: None,
            quality_metrics: None,
            responsible_party: None,
            quantity_change_kg: None,
        }
    }
}
