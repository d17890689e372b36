// ==========================================
// Plant operations - quality control model
// ==========================================

use crate::domain::types::{CheckType, QualityStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Acceptable band for one measured parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParameterLimit {
    pub min: f64,
    pub max: f64,
    pub target: f64,
}

impl ParameterLimit {
    pub fn new(min: f64, max: f64, target: f64) -> Self {
        Self { min, max, target }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Quality standard per product type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityStandard {
    pub product_type: String,
    pub parameter_limits: BTreeMap<String, ParameterLimit>,
    pub required_checks: Vec<CheckType>,
    pub compliance_threshold: f64,       // 0-100
}

/// Recorded quality check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheck {
    pub check_id: String,
    pub batch_id: String,
    pub product_type: String,
    pub check_type: CheckType,
    pub inspector_id: String,
    pub check_time: NaiveDateTime,
    pub parameters: BTreeMap<String, f64>,
    pub overall_score: f64,              // 0-100
    pub status: QualityStatus,
    pub comments: String,
}

/// Alert raised by a failed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAlert {
    pub alert_id: String,
    pub check_id: String,
    pub batch_id: String,
    pub product_type: String,
    pub severity: String,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub acknowledged: bool,
}
