// ==========================================
// Plant operations - batch traceability analytics
// ==========================================
// Pure functions over a batch and its events; no SQL here.
// ==========================================

use crate::domain::batch::{Batch, BatchEvent};
use crate::domain::types::{BatchEventType, BatchStatus};
use crate::engine::stats::{mean, population_std, round_to};
use serde::Serialize;
use std::collections::BTreeMap;

/// Safe frozen range for traceability events (Celsius)
pub const SAFE_TEMP_MIN: f64 = -20.0;
pub const SAFE_TEMP_MAX: f64 = -15.0;
/// Processing window beyond which timeliness scores zero
pub const IDEAL_MAX_PROCESSING_DAYS: f64 = 7.0;
/// Events needed for complete traceability
pub const COMPLETE_TIMELINE_EVENTS: usize = 5;

pub const MILESTONE_TYPES: [BatchEventType; 5] = [
    BatchEventType::Production,
    BatchEventType::QualityCheck,
    BatchEventType::Shipment,
    BatchEventType::Customs,
    BatchEventType::Delivery,
];

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct TimelineBottleneck {
    pub event_type: BatchEventType,
    pub location: String,
    pub delay_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineAnalysis {
    pub analysis_available: bool,
    pub total_events: usize,
    pub average_time_between_events_hours: Option<f64>,
    pub bottlenecks: Vec<TimelineBottleneck>,
    pub efficiency_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Milestone {
    pub event_type: BatchEventType,
    pub location: String,
    pub timestamp: chrono::NaiveDateTime,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricAggregate {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetricsSummary {
    pub data_available: bool,
    pub metrics: BTreeMap<String, MetricAggregate>,
    pub total_quality_checks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureSummary {
    pub data_available: bool,
    pub average_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub stability_score: Option<f64>,
    pub compliance_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceabilityCompliance {
    pub overall_score: f64,
    pub quality_documentation: String,
    pub temperature_monitoring: String,
    pub traceability: String,
}

// ==========================================
// Timeline
// ==========================================

fn sorted_by_time(events: &[BatchEvent]) -> Vec<&BatchEvent> {
    let mut sorted: Vec<&BatchEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    sorted
}

/// Milestone events in the order given
pub fn milestones(events: &[BatchEvent]) -> Vec<Milestone> {
    events
        .iter()
        .filter(|e| MILESTONE_TYPES.contains(&e.event_type))
        .map(|e| Milestone {
            event_type: e.event_type,
            location: e.location.clone(),
            timestamp: e.timestamp,
            status: "COMPLETED".to_string(),
        })
        .collect()
}

/// Gap analysis between consecutive events
pub fn analyze_timeline(events: &[BatchEvent]) -> TimelineAnalysis {
    if events.len() < 2 {
        return TimelineAnalysis {
            analysis_available: false,
            total_events: events.len(),
            average_time_between_events_hours: None,
            bottlenecks: Vec::new(),
            efficiency_score: None,
        };
    }

    let sorted = sorted_by_time(events);
    let gaps: Vec<(&BatchEvent, f64)> = sorted
        .windows(2)
        .map(|pair| {
            let secs = (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64;
            (pair[1], secs / 3600.0)
        })
        .collect();
    let avg = gaps.iter().map(|(_, h)| h).sum::<f64>() / gaps.len() as f64;

    let bottlenecks = gaps
        .iter()
        .filter(|(_, h)| *h > avg * 2.0)
        .map(|(event, h)| TimelineBottleneck {
            event_type: event.event_type,
            location: event.location.clone(),
            delay_hours: round_to(*h, 1),
        })
        .collect();

    TimelineAnalysis {
        analysis_available: true,
        total_events: events.len(),
        average_time_between_events_hours: Some(round_to(avg, 1)),
        bottlenecks,
        efficiency_score: Some(efficiency_score(events)),
    }
}

/// Batch processing efficiency (0-100)
///
/// 30 pts quality checks (up to 3), 40 pts temperature compliance,
/// 30 pts timeliness against a 7-day window.
pub fn efficiency_score(events: &[BatchEvent]) -> f64 {
    if events.len() < 3 {
        return 50.0;
    }
    let quality_events = events
        .iter()
        .filter(|e| e.event_type == BatchEventType::QualityCheck)
        .count()
        .min(3);

    let score = quality_events as f64 / 3.0 * 30.0
        + temperature_compliance(events) * 40.0
        + processing_timeliness(events) * 30.0;
    round_to(score, 1)
}

/// Share of temperature readings inside the safe range (0.5 without readings)
pub fn temperature_compliance(events: &[BatchEvent]) -> f64 {
    let readings: Vec<f64> = events.iter().filter_map(|e| e.temperature).collect();
    if readings.is_empty() {
        return 0.5;
    }
    let compliant = readings
        .iter()
        .filter(|t| (SAFE_TEMP_MIN..=SAFE_TEMP_MAX).contains(*t))
        .count();
    compliant as f64 / readings.len() as f64
}

fn span_seconds(events: &[BatchEvent]) -> Option<f64> {
    let first = events.iter().map(|e| e.timestamp).min()?;
    let last = events.iter().map(|e| e.timestamp).max()?;
    Some((last - first).num_seconds() as f64)
}

fn processing_timeliness(events: &[BatchEvent]) -> f64 {
    if events.len() < 2 {
        return 0.5;
    }
    let total = span_seconds(events).unwrap_or(0.0);
    let ideal = IDEAL_MAX_PROCESSING_DAYS * 24.0 * 3600.0;
    (1.0 - total / ideal).max(0.0)
}

/// First-to-last event span in days (1 decimal)
pub fn total_duration_days(events: &[BatchEvent]) -> f64 {
    if events.len() < 2 {
        return 0.0;
    }
    round_to(span_seconds(events).unwrap_or(0.0) / 86_400.0, 1)
}

// ==========================================
// Report sections
// ==========================================

/// Aggregate numeric quality metrics across events
pub fn aggregate_quality_metrics(events: &[BatchEvent]) -> QualityMetricsSummary {
    let with_metrics: Vec<&serde_json::Map<String, serde_json::Value>> = events
        .iter()
        .filter_map(|e| e.quality_metrics.as_ref().and_then(|m| m.as_object()))
        .filter(|m| !m.is_empty())
        .collect();

    // Keys with any non-numeric value are skipped
    let mut values: BTreeMap<String, Option<Vec<f64>>> = BTreeMap::new();
    for metrics in &with_metrics {
        for (key, value) in metrics.iter() {
            let slot = values.entry(key.clone()).or_insert_with(|| Some(Vec::new()));
            match (slot.as_mut(), value.as_f64()) {
                (Some(list), Some(v)) => list.push(v),
                _ => *slot = None,
            }
        }
    }

    let metrics = values
        .into_iter()
        .filter_map(|(key, list)| {
            let list = list?;
            Some((
                key,
                MetricAggregate {
                    average: round_to(mean(&list), 2),
                    min: list.iter().copied().fold(f64::INFINITY, f64::min),
                    max: list.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    count: list.len(),
                },
            ))
        })
        .collect();

    QualityMetricsSummary {
        data_available: !with_metrics.is_empty(),
        metrics,
        total_quality_checks: with_metrics.len(),
    }
}

/// Temperature statistics across events
pub fn analyze_temperatures(events: &[BatchEvent]) -> TemperatureSummary {
    let temps: Vec<f64> = events.iter().filter_map(|e| e.temperature).collect();
    if temps.is_empty() {
        return TemperatureSummary {
            data_available: false,
            average_temperature: None,
            min_temperature: None,
            max_temperature: None,
            stability_score: None,
            compliance_rate: None,
        };
    }

    let stability = if temps.len() < 2 {
        0.5
    } else {
        round_to((1.0 - population_std(&temps) / 5.0).max(0.0), 2)
    };

    TemperatureSummary {
        data_available: true,
        average_temperature: Some(round_to(mean(&temps), 1)),
        min_temperature: Some(temps.iter().copied().fold(f64::INFINITY, f64::min)),
        max_temperature: Some(temps.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        stability_score: Some(stability),
        compliance_rate: Some(temperature_compliance(events)),
    }
}

/// Documentation completeness of the batch record
pub fn assess_compliance(events: &[BatchEvent]) -> TraceabilityCompliance {
    let has_quality = events
        .iter()
        .any(|e| e.event_type == BatchEventType::QualityCheck);
    let has_temperature = events.iter().any(|e| e.temperature.is_some());
    let complete = events.len() >= COMPLETE_TIMELINE_EVENTS;

    let quality_factor = if has_quality { 1.0 } else { 0.3 };
    let temperature_factor = if has_temperature { 1.0 } else { 0.3 };
    let timeline_factor = if complete { 1.0 } else { 0.5 };
    let score = quality_factor * 0.4 + temperature_factor * 0.3 + timeline_factor * 0.3;

    let label = |ok: bool, missing: &str| {
        if ok {
            "COMPLETE".to_string()
        } else {
            missing.to_string()
        }
    };

    TraceabilityCompliance {
        overall_score: round_to(score, 2),
        quality_documentation: label(has_quality, "INCOMPLETE"),
        temperature_monitoring: label(has_temperature, "INCOMPLETE"),
        traceability: label(complete, "PARTIAL"),
    }
}

pub fn batch_recommendations(
    batch: &Batch,
    events: &[BatchEvent],
    timeline: &TimelineAnalysis,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let quality_events = events
        .iter()
        .filter(|e| e.event_type == BatchEventType::QualityCheck)
        .count();
    if quality_events < 2 {
        recommendations.push("Increase frequency of quality checks".to_string());
    }

    let temp_events = events.iter().filter(|e| e.temperature.is_some()).count();
    if (temp_events as f64) < events.len() as f64 * 0.3 {
        recommendations.push("Improve temperature monitoring coverage".to_string());
    }

    for b in &timeline.bottlenecks {
        recommendations.push(format!(
            "Address delay at {} ({} hours)",
            b.location, b.delay_hours
        ));
    }

    match batch.status {
        BatchStatus::InTransit => recommendations
            .push("Monitor shipment temperature closely during transit".to_string()),
        BatchStatus::CustomsClearance => recommendations
            .push("Ensure all customs documents are readily available".to_string()),
        _ => {}
    }

    recommendations
}
