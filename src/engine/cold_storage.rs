// ==========================================
// Plant operations - fish cold storage monitor
// ==========================================
// Point checks of storage temperature for fish products,
// plus the text of operator alerts
// ==========================================

use crate::engine::compliance_checker::TemperatureRange;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded storage temperature check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageCheck {
    pub product: String, // frozen_fish / chilled_fish
    pub temperature: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageComplianceReport {
    pub compliance_rate: f64,
    pub total_checks: usize,
    pub violations: usize,
}

pub struct ColdStorageMonitor {
    limits: BTreeMap<String, TemperatureRange>,
}

impl Default for ColdStorageMonitor {
    fn default() -> Self {
        let limits = BTreeMap::from([
            ("frozen_fish".to_string(), TemperatureRange { min: -18.0, max: -15.0 }),
            ("chilled_fish".to_string(), TemperatureRange { min: 0.0, max: 4.0 }),
        ]);
        Self { limits }
    }
}

impl ColdStorageMonitor {
    /// Inclusive range check; unknown products never comply
    pub fn is_compliant(&self, product: &str, temperature: f64) -> bool {
        self.limits
            .get(product)
            .map_or(false, |r| r.min <= temperature && temperature <= r.max)
    }

    pub fn compliance_report(&self, checks: &[StorageCheck]) -> StorageComplianceReport {
        let compliant = checks
            .iter()
            .filter(|c| self.is_compliant(&c.product, c.temperature))
            .count();
        let rate = if checks.is_empty() {
            0.0
        } else {
            compliant as f64 / checks.len() as f64 * 100.0
        };

        StorageComplianceReport {
            compliance_rate: rate,
            total_checks: checks.len(),
            violations: checks.len() - compliant,
        }
    }
}

pub fn temperature_alert_message(sensor_id: &str, current_temp: f64, limit_temp: f64) -> String {
    format!(
        "ALERT: Sensor {} temperature {}°C exceeds limit {}°C",
        sensor_id, current_temp, limit_temp
    )
}

pub fn document_expiry_message(document_type: &str, days_until_expiry: i64) -> String {
    format!("REMINDER: {} expires in {} days", document_type, days_until_expiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_compliance() {
        let monitor = ColdStorageMonitor::default();
        assert!(monitor.is_compliant("frozen_fish", -15.0));
        assert!(!monitor.is_compliant("frozen_fish", -14.9));
        assert!(monitor.is_compliant("chilled_fish", 2.0));
        assert!(!monitor.is_compliant("smoked_fish", -16.0));
    }

    #[test]
    fn test_report() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let check = |product: &str, temperature: f64| StorageCheck {
            product: product.to_string(),
            temperature,
            timestamp: ts,
        };
        let monitor = ColdStorageMonitor::default();
        let report = monitor.compliance_report(&[
            check("frozen_fish", -16.0),
            check("chilled_fish", 2.0),
            check("chilled_fish", 6.0),
            check("frozen_fish", -17.0),
        ]);
        assert_eq!(report.compliance_rate, 75.0);
        assert_eq!(report.violations, 1);

        assert_eq!(monitor.compliance_report(&[]).compliance_rate, 0.0);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            temperature_alert_message("COLD-01", -12.5, -15.0),
            "ALERT: Sensor COLD-01 temperature -12.5°C exceeds limit -15°C"
        );
        assert_eq!(
            document_expiry_message("health_certificate", 3),
            "REMINDER: health_certificate expires in 3 days"
        );
    }
}
