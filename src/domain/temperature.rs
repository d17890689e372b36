// ==========================================
// Plant operations - cold chain readings
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One sensor sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub batch_id: String,
    pub sensor_id: String,
    pub temperature: f64,                // Celsius
    pub timestamp: NaiveDateTime,
}
