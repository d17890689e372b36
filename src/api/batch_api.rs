// ==========================================
// Plant operations - batch traceability API
// ==========================================
// Farm-to-retail batch tracking on SQLite:
// creation with QR payload, lifecycle events, timeline, report
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::BatchConfig;
use crate::domain::batch::{Batch, BatchEvent, NewBatch, NewBatchEvent};
use crate::domain::types::{BatchEventType, BatchStatus};
use crate::engine::batch_analytics::{
    aggregate_quality_metrics, analyze_temperatures, analyze_timeline, assess_compliance,
    batch_recommendations, milestones, total_duration_days, Milestone, QualityMetricsSummary,
    TemperatureSummary, TimelineAnalysis, TraceabilityCompliance,
};
use crate::engine::dates::parse_date_time;
use crate::engine::stats::generate_id;
use crate::repository::batch_repo::{BatchRepository, BatchUpdate};
use crate::repository::error::RepositoryError;

const DEFAULT_QUALITY_GRADE: &str = "STANDARD";

// ==========================================
// Responses
// ==========================================

/// Content encoded in the batch QR code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub batch_id: String,
    pub product_type: String,
    pub production_date: String,
    pub origin_farm: String,
    pub tracking_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCreated {
    pub batch_id: String,
    pub qr_payload: String, // JSON text of QrPayload
    pub tracking_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecorded {
    pub event_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchInfo {
    pub batch: Batch,
    pub events: Vec<BatchEvent>, // newest first
    pub event_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchTimeline {
    pub batch_id: String,
    pub current_status: BatchStatus,
    pub milestones: Vec<Milestone>,
    pub timeline_analysis: TimelineAnalysis,
    pub total_duration_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub report_id: String,
    pub batch_summary: Batch,
    pub timeline_analysis: TimelineAnalysis,
    pub quality_metrics: QualityMetricsSummary,
    pub temperature_analysis: TemperatureSummary,
    pub compliance_status: TraceabilityCompliance,
    pub recommendations: Vec<String>,
    pub generated_at: NaiveDateTime,
}

// ==========================================
// BatchTracker
// ==========================================
pub struct BatchTracker {
    repo: Arc<BatchRepository>,
    config: BatchConfig,
}

impl BatchTracker {
    pub fn new(repo: Arc<BatchRepository>, config: BatchConfig) -> Self {
        Self { repo, config }
    }

    /// Create a batch and its initial PRODUCTION event
    ///
    /// # Returns
    /// - Ok(BatchCreated): batch id and QR payload
    /// - Err(InvalidInput): missing fields, bad or future date, quantity <= 0
    /// - Err(AlreadyExists): same id already generated today
    #[instrument(skip(self, request), fields(product = ?request.product_type))]
    pub fn create_batch(&self, request: &NewBatch, now: NaiveDateTime) -> ApiResult<BatchCreated> {
        let valid = validate_new_batch(request, now)?;
        let batch_id = generate_batch_id(
            &valid.product_type,
            &valid.origin_farm,
            &valid.production_date_raw,
            now.date(),
        );

        let batch = Batch {
            batch_id: batch_id.clone(),
            product_type: valid.product_type.clone(),
            production_date: valid.production_date,
            initial_quantity_kg: valid.quantity_kg,
            current_quantity_kg: valid.quantity_kg,
            origin_farm: valid.origin_farm.clone(),
            quality_grade: request
                .quality_grade
                .clone()
                .unwrap_or_else(|| DEFAULT_QUALITY_GRADE.to_string()),
            status: BatchStatus::Production,
            created_at: now,
            updated_at: now,
        };
        let initial_event = NewBatchEvent::new(BatchEventType::Production, &valid.origin_farm);

        match self
            .repo
            .insert_with_initial_event(&batch, &initial_event, now)
        {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ApiError::AlreadyExists(format!(
                    "Batch {} already exists",
                    batch_id
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let tracking_url = format!(
            "{}/{}",
            self.config.tracking_base_url.trim_end_matches('/'),
            batch_id
        );
        let payload = QrPayload {
            batch_id: batch_id.clone(),
            product_type: valid.product_type,
            production_date: valid.production_date_raw,
            origin_farm: valid.origin_farm,
            tracking_url: tracking_url.clone(),
        };
        let qr_payload = serde_json::to_string(&payload)
            .map_err(|e| ApiError::InvalidInput(format!("QR payload: {}", e)))?;

        info!(batch_id = %batch_id, quantity_kg = valid.quantity_kg, "batch created");
        Ok(BatchCreated {
            message: format!("Batch {} created successfully", batch_id),
            batch_id,
            qr_payload,
            tracking_url,
        })
    }

    /// Record a lifecycle event and update the batch status / quantity
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub fn record_event(
        &self,
        batch_id: &str,
        event: &NewBatchEvent,
        now: NaiveDateTime,
    ) -> ApiResult<EventRecorded> {
        self.find_batch(batch_id)?;
        if event.location.trim().is_empty() {
            return Err(ApiError::InvalidInput("Event location is required".to_string()));
        }

        let quantity_delta_kg = if event.event_type.changes_quantity() {
            event.quantity_change_kg.unwrap_or(0.0)
        } else {
            0.0
        };
        let update = BatchUpdate {
            status: event.event_type.resulting_status(),
            quantity_delta_kg,
            updated_at: now,
        };

        let timestamp = event.timestamp.unwrap_or(now);
        let event_id = self.repo.append_event(batch_id, event, timestamp, update)?;

        info!(batch_id, event_id, "batch event recorded");
        Ok(EventRecorded {
            event_id,
            message: format!("Event recorded for batch {}", batch_id),
        })
    }

    fn find_batch(&self, batch_id: &str) -> ApiResult<Batch> {
        self.repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch {} not found", batch_id)))
    }

    pub fn get_batch_info(&self, batch_id: &str) -> ApiResult<BatchInfo> {
        let batch = self.find_batch(batch_id)?;
        let events = self.repo.list_events(batch_id)?;
        Ok(BatchInfo {
            batch,
            event_count: events.len(),
            events,
        })
    }

    pub fn get_batch_timeline(&self, batch_id: &str) -> ApiResult<BatchTimeline> {
        let info = self.get_batch_info(batch_id)?;
        Ok(BatchTimeline {
            batch_id: info.batch.batch_id.clone(),
            current_status: info.batch.status,
            milestones: milestones(&info.events),
            timeline_analysis: analyze_timeline(&info.events),
            total_duration_days: total_duration_days(&info.events),
        })
    }

    pub fn generate_batch_report(&self, batch_id: &str, now: NaiveDateTime) -> ApiResult<BatchReport> {
        let info = self.get_batch_info(batch_id)?;
        let timeline = analyze_timeline(&info.events);

        Ok(BatchReport {
            report_id: generate_id("BATCH_REPORT", now),
            quality_metrics: aggregate_quality_metrics(&info.events),
            temperature_analysis: analyze_temperatures(&info.events),
            compliance_status: assess_compliance(&info.events),
            recommendations: batch_recommendations(&info.batch, &info.events, &timeline),
            timeline_analysis: timeline,
            batch_summary: info.batch,
            generated_at: now,
        })
    }

    /// Resolve a scanned QR payload to the batch it names
    pub fn scan_batch_qr(&self, payload: &str) -> ApiResult<BatchInfo> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|_| ApiError::InvalidInput("Invalid QR code format".to_string()))?;
        let batch_id = value
            .get("batch_id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidInput("Invalid QR code data".to_string()))?;
        self.get_batch_info(batch_id)
    }

    pub fn list_batches(&self, status: Option<BatchStatus>) -> ApiResult<Vec<Batch>> {
        Ok(self.repo.list(status)?)
    }
}

// ==========================================
// Validation and ids
// ==========================================

struct ValidBatch {
    product_type: String,
    origin_farm: String,
    production_date_raw: String,
    production_date: NaiveDate,
    quantity_kg: f64,
}

fn validate_new_batch(request: &NewBatch, now: NaiveDateTime) -> ApiResult<ValidBatch> {
    let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
    let mut missing = Vec::new();
    if !present(&request.product_type) {
        missing.push("product_type");
    }
    if !present(&request.production_date) {
        missing.push("production_date");
    }
    if request.quantity_kg.is_none() {
        missing.push("quantity_kg");
    }
    if !present(&request.origin_farm) {
        missing.push("origin_farm");
    }

    let (Some(product_type), Some(raw_date), Some(quantity_kg), Some(origin_farm)) = (
        request.product_type.clone(),
        request.production_date.clone(),
        request.quantity_kg,
        request.origin_farm.clone(),
    ) else {
        return Err(missing_fields(&missing));
    };
    if !missing.is_empty() {
        return Err(missing_fields(&missing));
    }

    let produced = parse_date_time(&raw_date)
        .ok_or_else(|| ApiError::InvalidInput("Invalid production date format".to_string()))?;
    if produced > now {
        return Err(ApiError::InvalidInput(
            "Production date cannot be in the future".to_string(),
        ));
    }
    if quantity_kg <= 0.0 {
        return Err(ApiError::InvalidInput(
            "Quantity must be greater than 0".to_string(),
        ));
    }

    Ok(ValidBatch {
        product_type,
        origin_farm,
        production_date_raw: raw_date,
        production_date: produced.date(),
        quantity_kg,
    })
}

fn missing_fields(fields: &[&str]) -> ApiError {
    ApiError::InvalidInput(format!("Missing required fields: {}", fields.join(", ")))
}

fn code3(value: &str) -> String {
    value.chars().take(3).collect::<String>().to_uppercase()
}

/// `BATCH-<YYYYMMDD>-<PRD>-<FRM>-<6 hex of SHA-256>`
pub fn generate_batch_id(
    product_type: &str,
    origin_farm: &str,
    production_date: &str,
    today: NaiveDate,
) -> String {
    let date = today.format("%Y%m%d").to_string();
    let product_code = code3(product_type);
    let farm_code = code3(origin_farm);

    let digest = Sha256::digest(
        format!("{}{}{}{}", date, product_code, farm_code, production_date).as_bytes(),
    );
    let suffix = hex::encode(digest)[..6].to_uppercase();

    format!("BATCH-{}-{}-{}-{}", date, product_code, farm_code, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let id = generate_batch_id("beef", "Buryat Farm 1", "2024-01-15", today);
        assert!(id.starts_with("BATCH-20240120-BEE-BUR-"));
        assert_eq!(id.len(), "BATCH-20240120-BEE-BUR-".len() + 6);
        assert_eq!(id, generate_batch_id("beef", "Buryat Farm 1", "2024-01-15", today));
        assert_ne!(id, generate_batch_id("beef", "Buryat Farm 1", "2024-01-16", today));
    }

    #[test]
    fn test_validation_messages() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let err = validate_new_batch(&NewBatch::default(), now).err().unwrap();
        assert_eq!(
            err.to_string(),
            "invalid input: Missing required fields: product_type, production_date, quantity_kg, origin_farm"
        );

        let mut request = NewBatch {
            product_type: Some("BEEF".into()),
            production_date: Some("2024-02-01".into()),
            quantity_kg: Some(100.0),
            origin_farm: Some("Farm".into()),
            quality_grade: None,
        };
        let err = validate_new_batch(&request, now).err().unwrap();
        assert!(err.to_string().contains("future"));

        request.production_date = Some("01.01.2024".into());
        let err = validate_new_batch(&request, now).err().unwrap();
        assert!(err.to_string().contains("Invalid production date format"));

        request.production_date = Some("2024-01-15".into());
        request.quantity_kg = Some(0.0);
        let err = validate_new_batch(&request, now).err().unwrap();
        assert!(err.to_string().contains("greater than 0"));
    }
}
