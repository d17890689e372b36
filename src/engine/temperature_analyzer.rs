// ==========================================
// Plant operations - cold chain temperature analyzer
// ==========================================
// Input: sensor readings (in memory or CSV)
// Output: per-batch statistics, violation runs, trend,
//         shelf life prediction, risk and certification
// ==========================================

use crate::config::{TemperatureConfig, TemperatureLimits};
use crate::domain::temperature::TemperatureReading;
use crate::domain::types::RiskLevel;
use crate::engine::dates::parse_date_time;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{
    generate_id, linear_fit, mean, percentile, population_std, round_to, sample_std,
};
use chrono::{Duration, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Reference storage temperature for the Q10 shelf life model
const IDEAL_TEMP: f64 = -18.0;
const Q10: f64 = 2.0;
const MIN_ANOMALY_READINGS: usize = 10;
const MIN_PATTERN_READINGS: usize = 48;
const MIN_PREDICTION_READINGS: usize = 24;
const PREDICTION_FIT_WINDOW: usize = 12;
const PREDICTION_HORIZON: usize = 6;
const REPORT_VALIDITY_DAYS: i64 = 7;

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: f64, // readings * sampling interval
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureStatistics {
    pub mean_temperature: f64,
    pub temperature_std: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub temperature_range: f64,
    pub compliance_rate: f64, // %
    pub violation_count: usize,
}

/// Consecutive out-of-range readings
#[derive(Debug, Clone, Serialize)]
pub struct ViolationRun {
    #[serde(rename = "type")]
    pub severity: ViolationSeverity,
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub min_temp: f64,
    pub max_temp: f64,
    pub duration: usize, // readings
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalPatterns {
    pub detected: bool,
    pub patterns: Vec<String>,
    pub variation_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub predicted_trend: String, // warming / cooling / stable
    pub confidence: f64,
    pub next_6_readings_prediction: Vec<f64>,
    pub risk_of_violation: RiskLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    pub overall_trend: Trend,
    pub trend_strength: f64,
    pub stability_score: f64,
    pub anomalies_detected: usize,
    pub seasonal_patterns: SeasonalPatterns,
    pub predictive_insights: Option<Prediction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShelfLifePrediction {
    pub base_shelf_life_days: u32,
    pub predicted_shelf_life_days: f64,
    pub quality_loss_percent: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureRisk {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub primary_factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureAnalysis {
    pub batch_id: String,
    pub meat_type: String,
    pub analysis_period: AnalysisPeriod,
    pub statistics: TemperatureStatistics,
    pub violations: Vec<ViolationRun>,
    pub trend_analysis: Option<TrendAnalysis>, // None below 2 readings
    pub shelf_life_prediction: ShelfLifePrediction,
    pub risk_assessment: TemperatureRisk,
    pub recommendations: Vec<String>,
    pub analyzed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureAlert {
    pub alert_id: String,
    pub batch_id: String,
    #[serde(rename = "type")]
    pub severity: ViolationSeverity,
    pub message: String,
    pub timestamp: NaiveDateTime,
    pub violation_details: ViolationRun,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationStatus {
    FullyCompliant,
    ConditionallyCompliant,
    NonCompliant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub overall_status: String,
    pub key_metric: String,
    pub risk_level: RiskLevel,
    pub primary_concern: String,
    pub recommendation_priority: RiskLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceCertification {
    pub status: CertificationStatus,
    pub statement: String,
    pub compliance_rate: f64,
    pub violation_count: usize,
    pub certification_date: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureReport {
    pub report_id: String,
    pub batch_id: String,
    pub meat_type: String,
    pub executive_summary: ExecutiveSummary,
    pub compliance_certification: ComplianceCertification,
    pub next_steps: Vec<String>,
    pub detailed_analysis: TemperatureAnalysis,
    pub report_generated: NaiveDateTime,
    pub valid_until: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
struct CsvReading {
    batch_id: String,
    sensor_id: String,
    temperature: f64,
    timestamp: String,
}

// ==========================================
// TemperatureAnalyzer
// ==========================================
pub struct TemperatureAnalyzer {
    config: TemperatureConfig,
    readings: Vec<TemperatureReading>,
    alerts: Vec<TemperatureAlert>,
}

impl TemperatureAnalyzer {
    pub fn new(config: TemperatureConfig) -> Self {
        Self {
            config,
            readings: Vec::new(),
            alerts: Vec::new(),
        }
    }

    /// Replace the loaded readings; they are kept ordered by timestamp
    pub fn load_readings(&mut self, mut readings: Vec<TemperatureReading>) {
        if readings.is_empty() {
            warn!("no sensor data provided");
        }
        readings.sort_by_key(|r| r.timestamp);
        info!(count = readings.len(), "temperature readings loaded");
        self.readings = readings;
    }

    /// Load readings from a CSV file with columns
    /// `batch_id,sensor_id,temperature,timestamp`
    ///
    /// # Returns
    /// - Ok(number of readings loaded)
    /// - Err(InvalidInput) naming the first row with a bad timestamp or a
    ///   non-finite temperature; nothing is loaded in that case
    pub fn load_csv(&mut self, path: &Path) -> EngineResult<usize> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut readings = Vec::new();
        for (row_idx, row) in reader.deserialize::<CsvReading>().enumerate() {
            let row = row?;
            let timestamp = parse_date_time(&row.timestamp).ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "row {}: invalid timestamp '{}'",
                    row_idx + 2,
                    row.timestamp
                ))
            })?;
            if !row.temperature.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "row {}: temperature must be a finite number, got {}",
                    row_idx + 2,
                    row.temperature
                )));
            }
            readings.push(TemperatureReading {
                batch_id: row.batch_id,
                sensor_id: row.sensor_id,
                temperature: row.temperature,
                timestamp,
            });
        }

        let count = readings.len();
        self.load_readings(readings);
        Ok(count)
    }

    pub fn readings(&self) -> &[TemperatureReading] {
        &self.readings
    }

    fn limits(&self, meat_type: &str) -> EngineResult<TemperatureLimits> {
        self.config
            .limits
            .get(&meat_type.to_uppercase())
            .copied()
            .ok_or_else(|| EngineError::UnknownMeatType(meat_type.to_string()))
    }

    /// Analyze cold chain compliance for one batch
    ///
    /// Long violation runs raise alerts (see `active_alerts`).
    #[instrument(skip(self))]
    pub fn analyze(
        &mut self,
        batch_id: &str,
        meat_type: &str,
        now: NaiveDateTime,
    ) -> EngineResult<TemperatureAnalysis> {
        if self.readings.is_empty() {
            return Err(EngineError::NoTemperatureData);
        }
        let (temps, times): (Vec<f64>, Vec<NaiveDateTime>) = self
            .readings
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .map(|r| (r.temperature, r.timestamp))
            .unzip();
        let (Some(&start), Some(&end)) = (times.first(), times.last()) else {
            return Err(EngineError::NoDataForBatch(batch_id.to_string()));
        };
        let limits = self.limits(meat_type)?;

        let raw = RawStats::compute(&temps, &limits);
        let violations = detect_violations(&temps, &times, &limits, self.config.violation_threshold);

        let alert_threshold = self.config.violation_threshold * 2;
        for run in violations.iter().filter(|v| v.duration > alert_threshold) {
            self.raise_alert(batch_id, run, now);
        }

        let analysis = TemperatureAnalysis {
            batch_id: batch_id.to_string(),
            meat_type: meat_type.to_string(),
            analysis_period: AnalysisPeriod {
                start,
                end,
                duration_hours: temps.len() as f64 * self.config.sampling_interval_secs as f64
                    / 3600.0,
            },
            statistics: TemperatureStatistics {
                mean_temperature: round_to(raw.mean, 2),
                temperature_std: round_to(raw.std, 2),
                min_temperature: round_to(raw.min, 2),
                max_temperature: round_to(raw.max, 2),
                temperature_range: round_to(raw.max - raw.min, 2),
                compliance_rate: round_to(raw.compliance_rate, 1),
                violation_count: raw.violations,
            },
            trend_analysis: analyze_trend(&temps, &times, self.config.trend_window),
            shelf_life_prediction: predict_shelf_life(&temps, meat_type),
            risk_assessment: assess_risk(&raw, &violations),
            recommendations: recommendations(&raw, &violations),
            violations,
            analyzed_at: now,
        };

        info!(
            batch_id,
            readings = temps.len(),
            compliance_rate = analysis.statistics.compliance_rate,
            risk = %analysis.risk_assessment.risk_level,
            "temperature analysis complete"
        );
        Ok(analysis)
    }

    fn raise_alert(&mut self, batch_id: &str, run: &ViolationRun, now: NaiveDateTime) {
        let alert = TemperatureAlert {
            alert_id: generate_id("TEMP_ALERT", now),
            batch_id: batch_id.to_string(),
            severity: run.severity,
            message: format!(
                "Temperature violation detected: {}°C to {}°C for {} readings",
                run.min_temp, run.max_temp, run.duration
            ),
            timestamp: now,
            violation_details: run.clone(),
            acknowledged: false,
        };
        warn!(alert_id = %alert.alert_id, "{}", alert.message);
        self.alerts.push(alert);
    }

    pub fn active_alerts(&self) -> Vec<&TemperatureAlert> {
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

    pub fn temperature_report(
        &mut self,
        batch_id: &str,
        meat_type: &str,
        now: NaiveDateTime,
    ) -> EngineResult<TemperatureReport> {
        let analysis = self.analyze(batch_id, meat_type, now)?;
        let stats = &analysis.statistics;
        let risk = &analysis.risk_assessment;

        let executive_summary = ExecutiveSummary {
            overall_status: if stats.compliance_rate >= 95.0 {
                "COMPLIANT".to_string()
            } else {
                "NON-COMPLIANT".to_string()
            },
            key_metric: format!("{}% temperature compliance", stats.compliance_rate),
            risk_level: risk.risk_level,
            primary_concern: risk
                .primary_factors
                .first()
                .cloned()
                .unwrap_or_else(|| "None".to_string()),
            recommendation_priority: if risk.risk_level == RiskLevel::High {
                RiskLevel::High
            } else if !analysis.recommendations.is_empty() {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            },
        };

        let (status, statement) = if stats.compliance_rate >= 98.0 {
            (
                CertificationStatus::FullyCompliant,
                "Temperature control meets all regulatory requirements",
            )
        } else if stats.compliance_rate >= 95.0 {
            (
                CertificationStatus::ConditionallyCompliant,
                "Temperature control meets regulatory requirements with minor deviations",
            )
        } else {
            (
                CertificationStatus::NonCompliant,
                "Temperature control does not meet regulatory requirements",
            )
        };

        Ok(TemperatureReport {
            report_id: generate_id("TEMP_REPORT", now),
            batch_id: batch_id.to_string(),
            meat_type: meat_type.to_string(),
            executive_summary,
            compliance_certification: ComplianceCertification {
                status,
                statement: statement.to_string(),
                compliance_rate: stats.compliance_rate,
                violation_count: stats.violation_count,
                certification_date: now,
            },
            next_steps: analysis.recommendations.clone(),
            detailed_analysis: analysis,
            report_generated: now,
            valid_until: now + Duration::days(REPORT_VALIDITY_DAYS),
        })
    }
}

// ==========================================
// Analysis steps
// ==========================================

/// Unrounded statistics used by the risk rules
struct RawStats {
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
    violations: usize,
    compliance_rate: f64,
}

impl RawStats {
    fn compute(temps: &[f64], limits: &TemperatureLimits) -> Self {
        let violations = temps
            .iter()
            .filter(|t| **t < limits.min || **t > limits.max)
            .count();
        Self {
            mean: mean(temps),
            std: population_std(temps),
            min: temps.iter().copied().fold(f64::INFINITY, f64::min),
            max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            violations,
            compliance_rate: (1.0 - violations as f64 / temps.len() as f64) * 100.0,
        }
    }
}

/// Runs of consecutive out-of-range readings at least `threshold` long
///
/// A closed run ends at the first in-range reading after it; a run
/// still open at the end of the data ends at the last reading.
pub fn detect_violations(
    temps: &[f64],
    times: &[NaiveDateTime],
    limits: &TemperatureLimits,
    threshold: usize,
) -> Vec<ViolationRun> {
    let mut runs = Vec::new();
    let mut current: Option<ViolationRun> = None;

    for (i, (&temp, &time)) in temps.iter().zip(times).enumerate() {
        let out_of_range = temp < limits.min || temp > limits.max;
        let critical = temp < limits.critical_min || temp > limits.critical_max;

        if out_of_range {
            match current.as_mut() {
                None => {
                    current = Some(ViolationRun {
                        severity: if critical {
                            ViolationSeverity::Critical
                        } else {
                            ViolationSeverity::Warning
                        },
                        start_index: i,
                        end_index: i,
                        start_time: time,
                        end_time: time,
                        min_temp: temp,
                        max_temp: temp,
                        duration: 1,
                    });
                }
                Some(run) => {
                    run.min_temp = run.min_temp.min(temp);
                    run.max_temp = run.max_temp.max(temp);
                    run.duration += 1;
                    if critical {
                        run.severity = ViolationSeverity::Critical;
                    }
                }
            }
        } else if let Some(mut run) = current.take() {
            if run.duration >= threshold {
                run.end_index = i;
                run.end_time = time;
                runs.push(run);
            }
        }
    }

    if let (Some(mut run), Some(&last_time)) = (current, times.last()) {
        if run.duration >= threshold {
            run.end_index = temps.len() - 1;
            run.end_time = last_time;
            runs.push(run);
        }
    }
    runs
}

fn analyze_trend(
    temps: &[f64],
    times: &[NaiveDateTime],
    window: usize,
) -> Option<TrendAnalysis> {
    if temps.len() < 2 {
        return None;
    }

    let (slope, _) = linear_fit(temps);
    let overall_trend = if slope > 0.01 {
        Trend::Increasing
    } else if slope < -0.01 {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    Some(TrendAnalysis {
        overall_trend,
        trend_strength: slope.abs(),
        stability_score: 1.0 / (rolling_std_mean(temps, window) + 0.001),
        anomalies_detected: detect_anomalies(temps).len(),
        seasonal_patterns: seasonal_patterns(temps, times),
        predictive_insights: predict(temps),
    })
}

/// Mean of the sample std over every full window; falls back to the
/// whole-series sample std when the series is shorter than the window
fn rolling_std_mean(temps: &[f64], window: usize) -> f64 {
    let window = window.max(2);
    if temps.len() < window {
        return sample_std(temps).unwrap_or(0.0);
    }
    let stds: Vec<f64> = temps.windows(window).filter_map(sample_std).collect();
    mean(&stds)
}

/// Indices of readings outside 1.5 IQR
pub fn detect_anomalies(temps: &[f64]) -> Vec<usize> {
    if temps.len() < MIN_ANOMALY_READINGS {
        return Vec::new();
    }
    let q1 = percentile(temps, 25.0);
    let q3 = percentile(temps, 75.0);
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    temps
        .iter()
        .enumerate()
        .filter(|(_, t)| **t < lower || **t > upper)
        .map(|(i, _)| i)
        .collect()
}

fn seasonal_patterns(temps: &[f64], times: &[NaiveDateTime]) -> SeasonalPatterns {
    let none = SeasonalPatterns {
        detected: false,
        patterns: Vec::new(),
        variation_score: 0.0,
    };
    if temps.len() < MIN_PATTERN_READINGS {
        return none;
    }

    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (t, time) in temps.iter().zip(times) {
        by_hour.entry(time.hour()).or_default().push(*t);
    }
    let hourly: Vec<(u32, f64)> = by_hour.iter().map(|(h, v)| (*h, mean(v))).collect();
    let means: Vec<f64> = hourly.iter().map(|(_, m)| *m).collect();

    let variation = match sample_std(&means) {
        Some(v) if v > 0.5 => v,
        _ => return none,
    };

    // first hour wins on ties
    let mut peak = hourly[0];
    let mut low = hourly[0];
    for &(hour, m) in &hourly[1..] {
        if m > peak.1 {
            peak = (hour, m);
        }
        if m < low.1 {
            low = (hour, m);
        }
    }

    SeasonalPatterns {
        detected: true,
        patterns: vec![format!(
            "Daily pattern: peaks at {}:00, lows at {}:00",
            peak.0, low.0
        )],
        variation_score: variation,
    }
}

fn predict(temps: &[f64]) -> Option<Prediction> {
    if temps.len() < MIN_PREDICTION_READINGS {
        return None;
    }
    let recent = &temps[temps.len() - PREDICTION_FIT_WINDOW..];
    let (slope, intercept) = linear_fit(recent);

    let predicted: Vec<f64> = (recent.len()..recent.len() + PREDICTION_HORIZON)
        .map(|x| round_to(slope * x as f64 + intercept, 2))
        .collect();

    let risk = if predicted.iter().any(|t| *t > -12.0 || *t < -22.0) {
        RiskLevel::High
    } else if predicted.iter().any(|t| *t > -14.0 || *t < -20.0) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    Some(Prediction {
        predicted_trend: if slope > 0.1 {
            "warming"
        } else if slope < -0.1 {
            "cooling"
        } else {
            "stable"
        }
        .to_string(),
        confidence: (slope.abs() * 10.0).min(0.95),
        next_6_readings_prediction: predicted,
        risk_of_violation: risk,
    })
}

pub fn base_shelf_life_days(meat_type: &str) -> u32 {
    match meat_type.to_uppercase().as_str() {
        "BEEF" | "HORSE" => 365,
        "LAMB" => 180,
        _ => 270,
    }
}

/// Q10 model: every 10 °C above the reference doubles the spoilage rate
pub fn predict_shelf_life(temps: &[f64], meat_type: &str) -> ShelfLifePrediction {
    let base = base_shelf_life_days(meat_type) as f64;
    let factors: Vec<f64> = temps
        .iter()
        .filter(|t| **t > IDEAL_TEMP)
        .map(|t| Q10.powf((t - IDEAL_TEMP) / 10.0))
        .collect();

    let adjusted = if factors.is_empty() {
        base
    } else {
        base / mean(&factors)
    };

    let recommendation = if adjusted < 30.0 {
        "Immediate consumption"
    } else if adjusted < 90.0 {
        "Monitor closely"
    } else {
        "Normal storage"
    };

    ShelfLifePrediction {
        base_shelf_life_days: base as u32,
        predicted_shelf_life_days: round_to(adjusted, 1),
        quality_loss_percent: round_to((1.0 - adjusted / base) * 100.0, 1),
        recommendation: recommendation.to_string(),
    }
}

fn assess_risk(stats: &RawStats, violations: &[ViolationRun]) -> TemperatureRisk {
    let mut score = 0;

    if stats.compliance_rate < 90.0 {
        score += 3;
    } else if stats.compliance_rate < 95.0 {
        score += 1;
    }

    let critical = violations
        .iter()
        .filter(|v| v.severity == ViolationSeverity::Critical)
        .count();
    if critical > 0 {
        score += 3;
    } else if violations.len() > 5 {
        score += 2;
    } else if violations.len() > 2 {
        score += 1;
    }

    if stats.std > 2.0 {
        score += 2;
    } else if stats.std > 1.0 {
        score += 1;
    }

    let risk_level = match score {
        s if s >= 5 => RiskLevel::High,
        s if s >= 3 => RiskLevel::Medium,
        s if s >= 1 => RiskLevel::Low,
        _ => RiskLevel::VeryLow,
    };

    let mut factors = Vec::new();
    if stats.compliance_rate < 95.0 {
        factors.push(format!(
            "Low compliance rate ({}%)",
            round_to(stats.compliance_rate, 1)
        ));
    }
    if stats.std > 1.5 {
        factors.push("High temperature variability".to_string());
    }
    if critical > 0 {
        factors.push(format!("{} critical temperature violations", critical));
    }
    if stats.min < -20.0 {
        factors.push("Very low temperatures detected".to_string());
    }
    if stats.max > -12.0 {
        factors.push("Very high temperatures detected".to_string());
    }

    TemperatureRisk {
        risk_level,
        risk_score: score,
        primary_factors: factors,
    }
}

fn recommendations(stats: &RawStats, violations: &[ViolationRun]) -> Vec<String> {
    let mut recs = Vec::new();
    if stats.compliance_rate < 95.0 {
        recs.push("Review and calibrate temperature control equipment".to_string());
    }
    if stats.std > 1.5 {
        recs.push("Improve temperature stability in storage areas".to_string());
    }
    if violations
        .iter()
        .any(|v| v.severity == ViolationSeverity::Critical)
    {
        recs.push("Implement immediate corrective actions for critical violations".to_string());
    }
    if violations.len() > 5 {
        recs.push("Conduct staff training on proper temperature management".to_string());
        recs.push("Consider upgrading refrigeration equipment".to_string());
    }
    if stats.mean > -16.0 {
        recs.push("Lower average storage temperature to improve shelf life".to_string());
    }
    recs
}
