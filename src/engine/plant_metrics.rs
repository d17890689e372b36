// ==========================================
// Plant operations - plant KPI calculators
// ==========================================
// Quality yield, OEE, trend, ROI, demand and safety stock
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{mean, round_to};
use serde::{Deserialize, Serialize};

/// z-score for a 95 % service level
pub const DEFAULT_SERVICE_LEVEL: f64 = 1.65;

// ==========================================
// Quality
// ==========================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub units: u64,
    pub defects: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetricsReport {
    pub first_pass_yield: f64,
    pub defect_rate: f64,
    pub total_units: u64,
    pub defective_units: u64,
}

fn require_units(total_units: u64) -> EngineResult<f64> {
    if total_units == 0 {
        return Err(EngineError::InvalidInput(
            "total units must be positive".to_string(),
        ));
    }
    Ok(total_units as f64)
}

/// Share of units passing first time, in percent
pub fn first_pass_yield(total_units: u64, defective_units: u64) -> EngineResult<f64> {
    let total = require_units(total_units)?;
    Ok((total - defective_units as f64) / total * 100.0)
}

pub fn defect_rate(total_units: u64, defective_units: u64) -> EngineResult<f64> {
    let total = require_units(total_units)?;
    Ok(defective_units as f64 / total * 100.0)
}

pub fn quality_report(batches: &[ProductionBatch]) -> EngineResult<QualityMetricsReport> {
    let total_units: u64 = batches.iter().map(|b| b.units).sum();
    let defective_units: u64 = batches.iter().map(|b| b.defects).sum();

    Ok(QualityMetricsReport {
        first_pass_yield: first_pass_yield(total_units, defective_units)?,
        defect_rate: defect_rate(total_units, defective_units)?,
        total_units,
        defective_units,
    })
}

// ==========================================
// Performance
// ==========================================

/// Overall equipment effectiveness from percentage inputs
///
/// The result is a percentage as well: 90, 95 and 99 give 84.645.
pub fn oee(availability: f64, performance: f64, quality: f64) -> f64 {
    availability * performance * quality / 10_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Compare the last data point with the first
pub fn trend(points: &[f64]) -> MetricTrend {
    match (points.first(), points.last()) {
        _ if points.len() < 2 => MetricTrend::InsufficientData,
        (Some(first), Some(last)) if last > first => MetricTrend::Improving,
        (Some(first), Some(last)) if last < first => MetricTrend::Declining,
        _ => MetricTrend::Stable,
    }
}

// ==========================================
// ROI
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct RoiAnalysis {
    pub years: u32,
    pub total_savings: f64,
    pub net_benefit: f64,
    pub roi_percent: f64,
    pub monthly_savings: f64,
    pub payback_period_months: f64,
}

fn require_positive(value: f64, name: &str) -> EngineResult<f64> {
    if value <= 0.0 {
        return Err(EngineError::InvalidInput(format!("{} must be positive", name)));
    }
    Ok(value)
}

/// Annual savings as a percentage of the investment
pub fn roi_percent(investment: f64, annual_savings: f64) -> EngineResult<f64> {
    Ok(annual_savings / require_positive(investment, "investment")? * 100.0)
}

pub fn payback_period_months(investment: f64, monthly_savings: f64) -> EngineResult<f64> {
    Ok(investment / require_positive(monthly_savings, "monthly savings")?)
}

pub fn multi_year_roi(investment: f64, annual_savings: f64, years: u32) -> EngineResult<RoiAnalysis> {
    let investment = require_positive(investment, "investment")?;
    let monthly_savings = annual_savings / 12.0;
    let total_savings = annual_savings * years as f64;
    let net_benefit = total_savings - investment;

    Ok(RoiAnalysis {
        years,
        total_savings,
        net_benefit,
        roi_percent: round_to(net_benefit / investment * 100.0, 1),
        monthly_savings: round_to(monthly_savings, 2),
        payback_period_months: round_to(payback_period_months(investment, monthly_savings)?, 1),
    })
}

// ==========================================
// Demand
// ==========================================

/// Mean historical demand scaled by a seasonality factor
pub fn forecast_demand(history: &[f64], seasonality: f64) -> EngineResult<f64> {
    if history.is_empty() {
        return Err(EngineError::InvalidInput(
            "demand history is empty".to_string(),
        ));
    }
    Ok(mean(history) * seasonality)
}

/// `z * sqrt(avg_demand) * sqrt(lead_time)`
pub fn safety_stock(avg_demand: f64, lead_time: f64, service_level: f64) -> f64 {
    service_level * avg_demand.max(0.0).sqrt() * lead_time.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_metrics() {
        assert_eq!(first_pass_yield(200, 10).unwrap(), 95.0);
        assert_eq!(defect_rate(200, 10).unwrap(), 5.0);
        assert!(matches!(first_pass_yield(0, 0), Err(EngineError::InvalidInput(_))));

        let report = quality_report(&[
            ProductionBatch { units: 500, defects: 5 },
            ProductionBatch { units: 500, defects: 15 },
        ])
        .unwrap();
        assert_eq!(report.total_units, 1000);
        assert!((report.first_pass_yield - 98.0).abs() < 1e-9);
        assert!(quality_report(&[]).is_err());
    }

    #[test]
    fn test_oee_and_trend() {
        assert!((oee(90.0, 95.0, 99.0) - 84.645).abs() < 1e-9);
        assert_eq!(trend(&[80.0]), MetricTrend::InsufficientData);
        assert_eq!(trend(&[80.0, 70.0, 85.0]), MetricTrend::Improving);
        assert_eq!(trend(&[80.0, 90.0, 75.0]), MetricTrend::Declining);
        assert_eq!(trend(&[80.0, 90.0, 80.0]), MetricTrend::Stable);
    }

    #[test]
    fn test_roi() {
        assert_eq!(roi_percent(100_000.0, 25_000.0).unwrap(), 25.0);
        assert_eq!(payback_period_months(120_000.0, 10_000.0).unwrap(), 12.0);
        assert!(roi_percent(0.0, 1.0).is_err());

        let analysis = multi_year_roi(430_000.0, 619_000.0, 3).unwrap();
        assert_eq!(analysis.net_benefit, 1_427_000.0);
        assert_eq!(analysis.roi_percent, 331.9);
        assert_eq!(analysis.payback_period_months, 8.3);
    }

    #[test]
    fn test_demand() {
        assert_eq!(forecast_demand(&[100.0, 200.0, 300.0], 1.2).unwrap(), 240.0);
        assert!(forecast_demand(&[], 1.0).is_err());
        assert!((safety_stock(100.0, 4.0, DEFAULT_SERVICE_LEVEL) - 33.0).abs() < 1e-9);
    }
}
