// ==========================================
// Plant operations - quality tracker
// ==========================================
// Scores quality checks against per-product standards and
// keeps the check history and alerts in memory.
//
// Parameter score: 10 at target, linear to 0 at half-range deviation
// Overall score:  mean parameter score * 10 (0-100)
// ==========================================

use crate::domain::quality::{ParameterLimit, QualityAlert, QualityCheck, QualityStandard};
use crate::domain::types::{CheckType, QualityStatus};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{generate_id, round_to};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Parameters whose out-of-limit value fails the check outright
pub const CRITICAL_PARAMETERS: [&str; 2] = ["bacterial_count", "temperature"];

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct ParameterCompliance {
    pub value: f64,
    pub within_limits: bool,
    pub limits: ParameterLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequiredChecks {
    pub completed: Vec<CheckType>,
    pub missing: Vec<CheckType>,
    pub all_required_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub product_type: String,
    pub overall_compliance_score: f64,
    pub compliance_threshold: f64,
    pub meets_standard: bool,
    pub parameter_compliance: BTreeMap<String, ParameterCompliance>,
    pub required_checks: RequiredChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub quality_check: QualityCheck,
    pub compliance_report: ComplianceReport,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub check_id: String,
    pub check_type: CheckType,
    pub check_time: NaiveDateTime,
    pub score: f64,
    pub status: QualityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchQualitySummary {
    pub batch_id: String,
    pub batch_quality_status: QualityStatus,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub conditional_checks: usize,
    pub average_scores_by_type: BTreeMap<CheckType, f64>,
    pub quality_timeline: Vec<TimelineEntry>,
    pub recommendations: Vec<String>,
}

/// Quality check request
#[derive(Debug, Clone)]
pub struct CheckRequest<'a> {
    pub batch_id: &'a str,
    pub product_type: &'a str,
    pub check_type: CheckType,
    pub parameters: BTreeMap<String, f64>,
    pub inspector_id: &'a str,
    pub comments: &'a str,
}

// ==========================================
// QualityTracker
// ==========================================
pub struct QualityTracker {
    standards: BTreeMap<String, QualityStandard>,
    history: Vec<QualityCheck>,
    alerts: Vec<QualityAlert>,
}

impl Default for QualityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityTracker {
    pub fn new() -> Self {
        Self::with_standards(default_standards())
    }

    pub fn with_standards(standards: Vec<QualityStandard>) -> Self {
        Self {
            standards: standards
                .into_iter()
                .map(|s| (s.product_type.clone(), s))
                .collect(),
            history: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn standard(&self, product_type: &str) -> Option<&QualityStandard> {
        self.standards.get(product_type)
    }

    /// Record and evaluate a quality check
    ///
    /// # Returns
    /// - Err(UnknownProductType): no standard for the product
    /// - Err(InvalidParameters): parameter names not in the standard
    pub fn record_check(
        &mut self,
        request: CheckRequest<'_>,
        now: NaiveDateTime,
    ) -> EngineResult<CheckOutcome> {
        let standard = self
            .standards
            .get(request.product_type)
            .ok_or_else(|| EngineError::UnknownProductType(request.product_type.to_string()))?
            .clone();

        let unknown: Vec<String> = request
            .parameters
            .keys()
            .filter(|name| !standard.parameter_limits.contains_key(*name))
            .map(|name| format!("Unknown parameter: {}", name))
            .collect();
        if !unknown.is_empty() {
            return Err(EngineError::InvalidParameters(unknown));
        }
        if request.parameters.is_empty() {
            return Err(EngineError::InvalidParameters(vec![
                "no parameters supplied".to_string(),
            ]));
        }

        let overall_score = overall_score(&standard, &request.parameters);
        let status = determine_status(&standard, overall_score, &request.parameters);

        let check = QualityCheck {
            check_id: generate_id("QC", now),
            batch_id: request.batch_id.to_string(),
            product_type: request.product_type.to_string(),
            check_type: request.check_type,
            inspector_id: request.inspector_id.to_string(),
            check_time: now,
            parameters: request.parameters,
            overall_score,
            status,
            comments: request.comments.to_string(),
        };

        self.history.push(check.clone());
        info!(
            check_id = %check.check_id,
            batch_id = %check.batch_id,
            score = overall_score,
            status = %status,
            "quality check recorded"
        );

        if status == QualityStatus::Failed {
            self.raise_alert(&check, now);
        }

        Ok(CheckOutcome {
            compliance_report: self.compliance_report(&check, &standard),
            recommendations: check_recommendations(&check, &standard),
            quality_check: check,
        })
    }

    fn raise_alert(&mut self, check: &QualityCheck, now: NaiveDateTime) {
        let alert = QualityAlert {
            alert_id: generate_id("QUALITY-ALERT", now),
            check_id: check.check_id.clone(),
            batch_id: check.batch_id.clone(),
            product_type: check.product_type.clone(),
            severity: "HIGH".to_string(),
            message: format!(
                "Quality check {} failed for batch {}",
                check.check_id, check.batch_id
            ),
            created_at: now,
            acknowledged: false,
        };
        warn!(alert_id = %alert.alert_id, "{}", alert.message);
        self.alerts.push(alert);
    }

    /// Unacknowledged alerts
    pub fn alerts(&self) -> Vec<&QualityAlert> {
        self.alerts.iter().filter(|a| !a.acknowledged).collect()
    }

    pub fn acknowledge_alert(&mut self, alert_id: &str) -> EngineResult<()> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| EngineError::AlertNotFound(alert_id.to_string()))?;
        alert.acknowledged = true;
        Ok(())
    }

    fn compliance_report(&self, check: &QualityCheck, standard: &QualityStandard) -> ComplianceReport {
        let parameter_compliance = check
            .parameters
            .iter()
            .filter_map(|(name, value)| {
                standard.parameter_limits.get(name).map(|limits| {
                    (
                        name.clone(),
                        ParameterCompliance {
                            value: *value,
                            within_limits: limits.contains(*value),
                            limits: *limits,
                        },
                    )
                })
            })
            .collect();

        ComplianceReport {
            product_type: standard.product_type.clone(),
            overall_compliance_score: check.overall_score,
            compliance_threshold: standard.compliance_threshold,
            meets_standard: check.overall_score >= standard.compliance_threshold,
            parameter_compliance,
            required_checks: self.required_checks(&check.batch_id, standard),
        }
    }

    fn required_checks(&self, batch_id: &str, standard: &QualityStandard) -> RequiredChecks {
        let mut completed: Vec<CheckType> = self
            .history
            .iter()
            .filter(|c| c.batch_id == batch_id)
            .map(|c| c.check_type)
            .collect();
        completed.sort();
        completed.dedup();

        let missing: Vec<CheckType> = standard
            .required_checks
            .iter()
            .filter(|ct| !completed.contains(ct))
            .copied()
            .collect();

        RequiredChecks {
            all_required_completed: missing.is_empty(),
            completed,
            missing,
        }
    }

    /// Quality summary across every check of a batch
    pub fn batch_summary(&self, batch_id: &str) -> EngineResult<BatchQualitySummary> {
        let mut checks: Vec<&QualityCheck> =
            self.history.iter().filter(|c| c.batch_id == batch_id).collect();
        if checks.is_empty() {
            return Err(EngineError::NoChecksForBatch(batch_id.to_string()));
        }
        checks.sort_by_key(|c| c.check_time);

        let count = |status: QualityStatus| checks.iter().filter(|c| c.status == status).count();
        let failed = count(QualityStatus::Failed);
        let conditional = count(QualityStatus::Conditional);
        let batch_status = if failed > 0 {
            QualityStatus::Failed
        } else if conditional > 0 {
            QualityStatus::Conditional
        } else {
            QualityStatus::Passed
        };

        let mut by_type: BTreeMap<CheckType, Vec<f64>> = BTreeMap::new();
        for c in &checks {
            by_type.entry(c.check_type).or_default().push(c.overall_score);
        }
        let average_scores_by_type = by_type
            .into_iter()
            .map(|(t, scores)| (t, round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1)))
            .collect();

        Ok(BatchQualitySummary {
            batch_id: batch_id.to_string(),
            batch_quality_status: batch_status,
            total_checks: checks.len(),
            passed_checks: count(QualityStatus::Passed),
            failed_checks: failed,
            conditional_checks: conditional,
            average_scores_by_type,
            quality_timeline: checks
                .iter()
                .map(|c| TimelineEntry {
                    check_id: c.check_id.clone(),
                    check_type: c.check_type,
                    check_time: c.check_time,
                    score: c.overall_score,
                    status: c.status,
                })
                .collect(),
            recommendations: batch_recommendations(&checks),
        })
    }
}

// ==========================================
// Scoring
// ==========================================

/// Score of one parameter (0-10)
pub fn parameter_score(value: f64, limits: &ParameterLimit) -> f64 {
    if limits.min == limits.max {
        return if value == limits.target { 10.0 } else { 0.0 };
    }
    let normalized = (value - limits.target).abs() / (limits.range() / 2.0);
    (10.0 - normalized * 10.0).max(0.0)
}

/// Overall score (0-100, 1 decimal) over the known parameters
pub fn overall_score(standard: &QualityStandard, parameters: &BTreeMap<String, f64>) -> f64 {
    let scores: Vec<f64> = parameters
        .iter()
        .filter_map(|(name, value)| {
            standard
                .parameter_limits
                .get(name)
                .map(|limits| parameter_score(*value, limits))
        })
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    round_to(scores.iter().sum::<f64>() / scores.len() as f64 * 10.0, 1)
}

fn determine_status(
    standard: &QualityStandard,
    score: f64,
    parameters: &BTreeMap<String, f64>,
) -> QualityStatus {
    let critical_failure = CRITICAL_PARAMETERS.iter().any(|name| {
        match (parameters.get(*name), standard.parameter_limits.get(*name)) {
            (Some(value), Some(limits)) => !limits.contains(*value),
            _ => false,
        }
    });
    if critical_failure {
        return QualityStatus::Failed;
    }

    if score >= standard.compliance_threshold {
        QualityStatus::Passed
    } else if score >= standard.compliance_threshold - 10.0 {
        QualityStatus::Conditional
    } else {
        QualityStatus::Failed
    }
}

fn check_recommendations(check: &QualityCheck, standard: &QualityStandard) -> Vec<String> {
    let mut recommendations = Vec::new();

    for (name, value) in &check.parameters {
        let Some(limits) = standard.parameter_limits.get(name) else {
            continue;
        };
        if !limits.contains(*value) {
            recommendations.push(format!(
                "Adjust {}: current {}, target {}",
                name, value, limits.target
            ));
        } else if (value - limits.target).abs() > limits.range() * 0.1 {
            recommendations.push(format!(
                "Optimize {}: current {}, closer to target {}",
                name, value, limits.target
            ));
        }
    }

    if check.overall_score < standard.compliance_threshold {
        recommendations.push(format!(
            "Overall quality score {} below threshold {}",
            check.overall_score, standard.compliance_threshold
        ));
    }

    recommendations
}

fn batch_recommendations(checks: &[&QualityCheck]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for c in checks {
        for (name, value) in &c.parameters {
            values.entry(name.as_str()).or_default().push(*value);
        }
    }
    for (name, readings) in values {
        if readings.len() <= 2 {
            continue;
        }
        let avg = readings.iter().sum::<f64>() / readings.len() as f64;
        let max = readings.iter().copied().fold(f64::MIN, f64::max);
        let min = readings.iter().copied().fold(f64::MAX, f64::min);
        if max - min > avg * 0.2 {
            recommendations.push(format!(
                "High variance in {}: improve process consistency",
                name
            ));
        }
    }

    if checks.len() >= 3 {
        let recent: Vec<f64> = checks[checks.len() - 3..]
            .iter()
            .map(|c| c.overall_score)
            .collect();
        if recent[0] > recent[1] && recent[1] > recent[2] {
            recommendations
                .push("Declining quality scores detected - review process parameters".to_string());
        }
    }

    recommendations
}

/// Built-in standards for the plant's product range
pub fn default_standards() -> Vec<QualityStandard> {
    let limits = |entries: &[(&str, f64, f64, f64)]| {
        entries
            .iter()
            .map(|(name, min, max, target)| (name.to_string(), ParameterLimit::new(*min, *max, *target)))
            .collect::<BTreeMap<_, _>>()
    };
    let all_checks = vec![
        CheckType::RawMaterial,
        CheckType::InProcess,
        CheckType::FinalProduct,
    ];

    vec![
        QualityStandard {
            product_type: "SMOKED_OMUL".to_string(),
            parameter_limits: limits(&[
                ("appearance_score", 8.0, 10.0, 9.0),
                ("texture_score", 7.0, 10.0, 8.5),
                ("smell_score", 9.0, 10.0, 9.5),
                ("salt_content", 2.0, 3.5, 2.8),
                ("bacterial_count", 0.0, 1000.0, 100.0),
            ]),
            required_checks: all_checks.clone(),
            compliance_threshold: 90.0,
        },
        QualityStandard {
            product_type: "FROZEN_SIG".to_string(),
            parameter_limits: limits(&[
                ("appearance_score", 7.0, 10.0, 8.0),
                ("texture_score", 8.0, 10.0, 9.0),
                ("temperature", -25.0, -18.0, -20.0),
                ("ice_crystal_size", 0.0, 0.5, 0.1),
            ]),
            required_checks: vec![CheckType::RawMaterial, CheckType::FinalProduct],
            compliance_threshold: 85.0,
        },
        QualityStandard {
            product_type: "DRIED_GRAYLING".to_string(),
            parameter_limits: limits(&[
                ("appearance_score", 7.0, 10.0, 8.0),
                ("texture_score", 8.0, 10.0, 8.5),
                ("moisture_content", 15.0, 25.0, 20.0),
                ("salt_content", 3.0, 5.0, 4.0),
            ]),
            required_checks: all_checks,
            compliance_threshold: 88.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn params(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn request<'a>(
        batch_id: &'a str,
        product_type: &'a str,
        check_type: CheckType,
        parameters: BTreeMap<String, f64>,
    ) -> CheckRequest<'a> {
        CheckRequest {
            batch_id,
            product_type,
            check_type,
            parameters,
            inspector_id: "QC-001",
            comments: "",
        }
    }

    #[test]
    fn test_parameter_score() {
        let limits = ParameterLimit::new(8.0, 10.0, 9.0);
        assert_eq!(parameter_score(9.0, &limits), 10.0);
        assert!((parameter_score(8.5, &limits) - 5.0).abs() < 1e-9);
        assert_eq!(parameter_score(7.0, &limits), 0.0);

        let flag = ParameterLimit::new(1.0, 1.0, 1.0);
        assert_eq!(parameter_score(1.0, &flag), 10.0);
        assert_eq!(parameter_score(0.0, &flag), 0.0);
    }

    #[test]
    fn test_on_target_check_passes() {
        let mut tracker = QualityTracker::new();
        let outcome = tracker
            .record_check(
                request(
                    "BATCH-1",
                    "SMOKED_OMUL",
                    CheckType::RawMaterial,
                    params(&[("appearance_score", 9.0), ("smell_score", 9.5)]),
                ),
                at(8),
            )
            .unwrap();

        assert_eq!(outcome.quality_check.overall_score, 100.0);
        assert_eq!(outcome.quality_check.status, QualityStatus::Passed);
        assert!(outcome.compliance_report.meets_standard);
        assert_eq!(
            outcome.compliance_report.required_checks.missing,
            vec![CheckType::InProcess, CheckType::FinalProduct]
        );
        assert!(outcome.recommendations.is_empty());
    }

    #[test]
    fn test_conditional_band() {
        let mut tracker = QualityTracker::new();
        // appearance 8.5 -> 5.0, smell 9.5 -> 10.0: mean 7.5 -> 75.0, threshold 90 -> failed band
        let outcome = tracker
            .record_check(
                request(
                    "BATCH-1",
                    "SMOKED_OMUL",
                    CheckType::RawMaterial,
                    params(&[("appearance_score", 8.5), ("smell_score", 9.5)]),
                ),
                at(8),
            )
            .unwrap();
        assert_eq!(outcome.quality_check.overall_score, 75.0);
        assert_eq!(outcome.quality_check.status, QualityStatus::Failed);

        // appearance 8.3 against 8 +/- 1.5 -> 8.0; texture 9 -> 10: mean 9.0 -> 90.0 vs 85 -> passed
        let outcome = tracker
            .record_check(
                request(
                    "BATCH-2",
                    "FROZEN_SIG",
                    CheckType::RawMaterial,
                    params(&[("texture_score", 9.0), ("appearance_score", 8.3)]),
                ),
                at(9),
            )
            .unwrap();
        assert_eq!(outcome.quality_check.overall_score, 90.0);
        assert_eq!(outcome.quality_check.status, QualityStatus::Passed);

        // appearance 8.6 against 8 +/- 1.5 -> 6.0; texture 9 -> 10: mean 8.0 -> 80.0 vs 85 -> conditional
        let outcome = tracker
            .record_check(
                request(
                    "BATCH-2",
                    "FROZEN_SIG",
                    CheckType::FinalProduct,
                    params(&[("texture_score", 9.0), ("appearance_score", 8.6)]),
                ),
                at(10),
            )
            .unwrap();
        assert_eq!(outcome.quality_check.overall_score, 80.0);
        assert_eq!(outcome.quality_check.status, QualityStatus::Conditional);
        assert!(outcome.compliance_report.required_checks.all_required_completed);
    }

    #[test]
    fn test_critical_parameter_out_of_limits_fails_and_alerts() {
        let mut tracker = QualityTracker::new();
        let outcome = tracker
            .record_check(
                request(
                    "BATCH-3",
                    "FROZEN_SIG",
                    CheckType::FinalProduct,
                    params(&[("temperature", -15.0), ("appearance_score", 8.0)]),
                ),
                at(8),
            )
            .unwrap();

        assert_eq!(outcome.quality_check.status, QualityStatus::Failed);
        assert!(outcome.recommendations.iter().any(|r| r.starts_with("Adjust temperature")));
        assert_eq!(tracker.alerts().len(), 1);

        let alert_id = tracker.alerts()[0].alert_id.clone();
        tracker.acknowledge_alert(&alert_id).unwrap();
        assert!(tracker.alerts().is_empty());
    }

    #[test]
    fn test_rejects_unknown_product_and_parameter() {
        let mut tracker = QualityTracker::new();
        let err = tracker
            .record_check(
                request("B", "CANNED_OMUL", CheckType::RawMaterial, params(&[("x", 1.0)])),
                at(8),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownProductType(_)));

        let err = tracker
            .record_check(
                request("B", "SMOKED_OMUL", CheckType::RawMaterial, params(&[("colour", 1.0)])),
                at(8),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters(_)));
    }

    #[test]
    fn test_batch_summary_declining_and_variance() {
        let mut tracker = QualityTracker::new();
        let values = [9.0, 8.6, 8.2];
        for (i, v) in values.iter().enumerate() {
            tracker
                .record_check(
                    request(
                        "BATCH-9",
                        "SMOKED_OMUL",
                        CheckType::InProcess,
                        params(&[("appearance_score", *v), ("bacterial_count", 100.0 + 200.0 * i as f64)]),
                    ),
                    at(8) + Duration::hours(i as i64),
                )
                .unwrap();
        }

        let summary = tracker.batch_summary("BATCH-9").unwrap();
        assert_eq!(summary.total_checks, 3);
        assert_eq!(summary.quality_timeline.len(), 3);
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.starts_with("Declining quality")));
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.contains("High variance in bacterial_count")));
        assert!(!summary
            .recommendations
            .iter()
            .any(|r| r.contains("High variance in appearance_score")));

        assert!(matches!(
            tracker.batch_summary("NONE"),
            Err(EngineError::NoChecksForBatch(_))
        ));
    }
}
