// ==========================================
// Plant operations - China customs client
// ==========================================
// Submission of export documents, status polling and pre-validation.
// Requests go through a CustomsTransport with bounded retry.
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::config::CustomsConfig;
use crate::customs::error::{CustomsError, CustomsResult, ErrorDetail, TransportError};
use crate::customs::hs_code::{is_valid_hs_code, meat_hs_code};
use crate::customs::transport::{CustomsRequest, CustomsResponse, CustomsTransport, HttpMethod};
use crate::documents::generator::{EXPORTER_ADDRESS, EXPORTER_NAME};
use crate::domain::export_order::ExportOrder;
use crate::engine::dates::parse_date_time;

type HmacSha256 = Hmac<Sha256>;

const USER_AGENT: &str = "BuryatMyasoprom-Export-System/1.0";
const PORT_OF_EXPORT: &str = "Zabaikalsk";
const SYSTEM_VERSION: &str = "1.0";
const TERMINAL_STATUSES: [&str; 3] = ["APPROVED", "REJECTED", "CANCELLED"];

// ==========================================
// Payloads
// ==========================================

/// Document handed to customs, content as generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomsDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub content: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExporterInfo {
    pub name: String,
    pub address: String,
    pub tax_id: String,
    pub export_license: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImporterInfo {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentInfo {
    pub port_of_export: String,
    pub port_of_entry: Option<String>,
    pub expected_arrival: Option<String>,
    pub transport_method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedProduct {
    pub description: Option<String>,
    pub hs_code: String,
    pub quantity: Option<f64>,
    pub value: f64,
    pub weight: Option<f64>,
    pub origin: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub content: BTreeMap<String, Value>,
    pub format: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionMetadata {
    pub submission_date: String,
    pub system_version: String,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub submission_type: String,
    pub exporter_info: ExporterInfo,
    pub importer_info: ImporterInfo,
    pub shipment_info: ShipmentInfo,
    pub products: Vec<SubmittedProduct>,
    pub documents: Vec<SubmittedDocument>,
    pub metadata: SubmissionMetadata,
}

// ==========================================
// Responses
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub customs_reference: Option<String>,
    pub status: String,
    pub estimated_processing_time: Option<Value>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptBody {
    submission_id: Option<String>,
    customs_reference: Option<String>,
    status: Option<String>,
    estimated_processing_time: Option<Value>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    error_message: Option<String>,
    error_details: Option<Value>,
    #[serde(default)]
    field_errors: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub submission_id: String,
    pub status: String,
    pub customs_reference: Option<String>,
    pub last_updated: Option<String>,
    pub estimated_completion: Option<String>,
    #[serde(default)]
    pub issues: Vec<Value>,
    #[serde(default)]
    pub actions_required: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorOutcome {
    pub submission_id: String,
    pub final_status: String,
    pub checks_performed: u32,
    pub details: SubmissionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationUpdates {
    #[serde(default)]
    pub updates: Vec<Value>,
    #[serde(default)]
    pub total_updates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentCheck {
    pub document_type: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total_documents: usize,
    pub valid_documents: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentValidationReport {
    pub valid: bool,
    pub documents: Vec<DocumentCheck>,
    pub summary: ValidationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub report_id: String,
    pub submission_id: String,
    pub generated_at: NaiveDateTime,
    pub status_overview: SubmissionStatus,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
}

// ==========================================
// CustomsClient
// ==========================================
pub struct CustomsClient {
    config: CustomsConfig,
    transport: Arc<dyn CustomsTransport>,
}

impl CustomsClient {
    pub fn new(config: CustomsConfig, transport: Arc<dyn CustomsTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CustomsConfig {
        &self.config
    }

    /// Build the submission body for an order and its documents
    pub fn prepare_submission(
        &self,
        documents: &[CustomsDocument],
        order: &ExportOrder,
        now: NaiveDateTime,
    ) -> CustomsResult<SubmissionPayload> {
        let shipment = order.shipment.clone().unwrap_or_default();

        let products = order
            .products
            .iter()
            .map(|p| SubmittedProduct {
                description: p.description.clone(),
                hs_code: meat_hs_code(p.meat_type.as_deref().unwrap_or("")).to_string(),
                quantity: p.quantity_kg,
                value: p.quantity_kg.unwrap_or(0.0) * p.unit_price.unwrap_or(0.0),
                weight: p.quantity_kg,
                origin: "RUSSIA".to_string(),
            })
            .collect();

        let documents = documents
            .iter()
            .map(|doc| {
                let content_json = serde_json::to_string(&doc.content)?;
                Ok(SubmittedDocument {
                    doc_type: doc.doc_type.clone(),
                    content: doc.content.clone(),
                    format: "JSON".to_string(),
                    checksum: hex::encode(Sha256::digest(content_json.as_bytes())),
                })
            })
            .collect::<CustomsResult<Vec<_>>>()?;

        Ok(SubmissionPayload {
            submission_type: "MEAT_EXPORT".to_string(),
            exporter_info: ExporterInfo {
                name: EXPORTER_NAME.to_string(),
                address: EXPORTER_ADDRESS.to_string(),
                tax_id: self.config.exporter_tax_id.clone(),
                export_license: self.config.export_license.clone(),
            },
            importer_info: ImporterInfo {
                name: order.customer.name.clone(),
                license_number: order.customer.import_license.clone(),
                address: order.customer.address.clone(),
            },
            shipment_info: ShipmentInfo {
                port_of_export: PORT_OF_EXPORT.to_string(),
                port_of_entry: shipment.port_of_entry,
                expected_arrival: shipment.expected_departure,
                transport_method: shipment.transport_method,
            },
            products,
            documents,
            metadata: SubmissionMetadata {
                submission_date: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
                system_version: SYSTEM_VERSION.to_string(),
                order_id: order.order_id.clone(),
            },
        })
    }

    /// Hex HMAC-SHA256 of `timestamp + data` keyed with the secret key
    pub fn sign(&self, data: &str, timestamp: &str) -> CustomsResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret_key.as_bytes())
            .map_err(|e| CustomsError::InvalidKey(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(data.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Submit documents for an order
    ///
    /// # Returns
    /// Receipt on HTTP 202; any other final status is `Rejected`
    #[instrument(skip(self, documents, order), fields(order_id = ?order.order_id, documents = documents.len()))]
    pub async fn submit(
        &self,
        documents: &[CustomsDocument],
        order: &ExportOrder,
        now: NaiveDateTime,
    ) -> CustomsResult<SubmissionReceipt> {
        if documents.is_empty() {
            return Err(CustomsError::NoDocuments);
        }

        let payload = self.prepare_submission(documents, order, now)?;
        // Value maps are ordered, so this text is stable for signing
        let body = serde_json::to_value(&payload)?.to_string();

        let mut request = self.request(HttpMethod::Post, "/submissions");
        if self.config.signature_required {
            let timestamp = now.format("%Y-%m-%dT%H:%M:%S").to_string();
            let signature = self.sign(&body, &timestamp)?;
            request.headers.insert("X-Timestamp".to_string(), timestamp);
            request.headers.insert("X-Signature".to_string(), signature);
        }
        request.body = Some(body);

        let response = self.send_with_retry(request).await?;
        if response.status != 202 {
            return Err(rejected(&response));
        }

        let parsed: ReceiptBody = serde_json::from_str(&response.body)
            .map_err(|e| CustomsError::MalformedResponse(e.to_string()))?;
        let submission_id = parsed.submission_id.ok_or_else(|| {
            CustomsError::MalformedResponse("receipt without submission_id".to_string())
        })?;

        info!(submission_id = %submission_id, "documents submitted to customs");
        Ok(SubmissionReceipt {
            submission_id,
            customs_reference: parsed.customs_reference,
            status: parsed.status.unwrap_or_else(|| "SUBMITTED".to_string()),
            estimated_processing_time: parsed.estimated_processing_time,
            message: parsed
                .message
                .unwrap_or_else(|| "Documents submitted successfully".to_string()),
        })
    }

    #[instrument(skip(self))]
    pub async fn check_status(&self, submission_id: &str) -> CustomsResult<SubmissionStatus> {
        let request = self.request(HttpMethod::Get, &format!("/submissions/{}", submission_id));
        let response = self.send_with_retry(request).await?;
        if response.status != 200 {
            return Err(rejected(&response));
        }

        let mut status: SubmissionStatus = serde_json::from_str(&response.body)
            .map_err(|e| CustomsError::MalformedResponse(e.to_string()))?;
        status.submission_id = submission_id.to_string();
        Ok(status)
    }

    /// Poll until the submission reaches APPROVED, REJECTED or CANCELLED
    #[instrument(skip(self))]
    pub async fn monitor(&self, submission_id: &str) -> CustomsResult<MonitorOutcome> {
        let max_checks = self.config.max_status_checks;
        let interval = Duration::from_secs(self.config.status_check_interval_secs);
        let mut last_status = String::from("UNKNOWN");

        for check in 1..=max_checks {
            let status = self.check_status(submission_id).await?;
            if TERMINAL_STATUSES.contains(&status.status.as_str()) {
                info!(status = %status.status, checks = check, "submission processing finished");
                return Ok(MonitorOutcome {
                    submission_id: submission_id.to_string(),
                    final_status: status.status.clone(),
                    checks_performed: check,
                    details: status,
                });
            }

            info!(
                status = %status.status,
                "submission still processing (check {}/{})",
                check,
                max_checks
            );
            last_status = status.status;
            if check < max_checks {
                tokio::time::sleep(interval).await;
            }
        }

        Err(CustomsError::MonitoringTimeout {
            submission_id: submission_id.to_string(),
            checks: max_checks,
            last_status,
        })
    }

    pub async fn regulation_updates(
        &self,
        since: Option<NaiveDateTime>,
    ) -> CustomsResult<RegulationUpdates> {
        let mut request = self.request(HttpMethod::Get, "/regulations");
        if let Some(since) = since {
            request.query.insert(
                "since".to_string(),
                since.format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
        }

        let response = self.send_with_retry(request).await?;
        if response.status != 200 {
            return Err(rejected(&response));
        }

        let mut updates: RegulationUpdates = serde_json::from_str(&response.body)
            .map_err(|e| CustomsError::MalformedResponse(e.to_string()))?;
        updates.total_updates = updates.updates.len();
        Ok(updates)
    }

    /// Pre-submission checks on document content
    pub fn validate_documents(
        &self,
        documents: &[CustomsDocument],
        now: NaiveDateTime,
    ) -> DocumentValidationReport {
        let checks: Vec<DocumentCheck> = documents
            .iter()
            .map(|doc| validate_document(doc, now))
            .collect();

        let summary = ValidationSummary {
            total_documents: documents.len(),
            valid_documents: checks.iter().filter(|c| c.valid).count(),
            total_errors: checks.iter().map(|c| c.errors.len()).sum(),
            total_warnings: checks.iter().map(|c| c.warnings.len()).sum(),
        };

        DocumentValidationReport {
            valid: checks.iter().all(|c| c.valid),
            documents: checks,
            summary,
        }
    }

    pub async fn submission_report(
        &self,
        submission_id: &str,
        now: NaiveDateTime,
    ) -> CustomsResult<SubmissionReport> {
        let status = self.check_status(submission_id).await?;
        Ok(SubmissionReport {
            report_id: format!("CUSTOMS_REPORT_{}", now.format("%Y%m%d_%H%M%S")),
            submission_id: submission_id.to_string(),
            generated_at: now,
            recommendations: recommendations(&status.status),
            next_steps: next_steps(&status.status),
            status_overview: status,
        })
    }

    // ===== Transport =====

    fn request(&self, method: HttpMethod, path: &str) -> CustomsRequest {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
        if !self.config.api_key.is_empty() {
            headers.insert(self.config.api_key_header.clone(), self.config.api_key.clone());
        }

        CustomsRequest {
            method,
            url: format!("{}{}", self.config.base_url.trim_end_matches('/'), path),
            headers,
            query: BTreeMap::new(),
            body: None,
        }
    }

    /// Transport errors, 429 and 5xx are retried `retry_attempts` more times
    async fn send_with_retry(&self, request: CustomsRequest) -> CustomsResult<CustomsResponse> {
        let max_retries = self.config.retry_attempts;
        let delay = Duration::from_secs(self.config.retry_delay_secs);
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(timeout, self.transport.send(request.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.config.timeout_secs)),
            };

            let failure = match outcome {
                Ok(response) if is_retryable(response.status) => {
                    format!("status {}", response.status)
                }
                Ok(response) => return Ok(response),
                Err(e) => e.to_string(),
            };

            if attempt > max_retries {
                warn!(attempts = attempt, error = %failure, "customs request failed, giving up");
                return Err(CustomsError::RetriesExhausted {
                    attempts: attempt,
                    last_error: failure,
                });
            }

            warn!(
                attempt,
                error = %failure,
                "customs request failed, retrying in {}s",
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn rejected(response: &CustomsResponse) -> CustomsError {
    CustomsError::Rejected {
        status: response.status,
        detail: parse_error_body(&response.body),
    }
}

fn parse_error_body(body: &str) -> ErrorDetail {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ErrorDetail {
            code: parsed.error_code,
            message: parsed.error_message,
            details: parsed.error_details,
            field_errors: parsed.field_errors,
        },
        Err(_) => ErrorDetail {
            code: Some("UNKNOWN".to_string()),
            message: Some(body.to_string()),
            details: None,
            field_errors: Vec::new(),
        },
    }
}

// ==========================================
// Document validation
// ==========================================

fn required_fields(doc_type: &str) -> &'static [&'static str] {
    match doc_type {
        "health_certificate" => &[
            "exporter_name",
            "product_description",
            "production_date",
            "veterinary_inspection",
            "china_importer",
        ],
        "customs_declaration" => &["hs_code", "product_value", "weight_kg", "country_of_origin"],
        "certificate_of_origin" => &["manufacturer", "origin_criteria", "export_license"],
        "veterinary_certificate" => &["veterinary_authority", "inspection_date", "animal_health"],
        _ => &[],
    }
}

/// Absent, null, empty, zero or false
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

fn validate_document(doc: &CustomsDocument, now: NaiveDateTime) -> DocumentCheck {
    let content = &doc.content;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in required_fields(&doc.doc_type) {
        if is_blank(content.get(*field)) {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    match doc.doc_type.as_str() {
        "health_certificate" => {
            if let Some(raw) = content.get("production_date").and_then(Value::as_str) {
                match parse_date_time(raw) {
                    Some(produced) => {
                        if produced > now {
                            errors.push("Production date cannot be in the future".to_string());
                        }
                        if (now - produced).num_days() > 30 {
                            warnings.push("Health certificate may be expiring soon".to_string());
                        }
                    }
                    None => errors.push("Invalid production date format".to_string()),
                }
            }
        }
        "customs_declaration" => {
            let number = |key: &str| content.get(key).and_then(Value::as_f64).unwrap_or(0.0);
            if number("product_value") <= 0.0 {
                errors.push("Product value must be greater than 0".to_string());
            }
            if number("weight_kg") <= 0.0 {
                errors.push("Product weight must be greater than 0".to_string());
            }
            let hs_code = content.get("hs_code").and_then(Value::as_str).unwrap_or("");
            if !is_valid_hs_code(hs_code) {
                errors.push("Invalid HS code format".to_string());
            }
        }
        _ => {}
    }

    DocumentCheck {
        document_type: doc.doc_type.clone(),
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

// ==========================================
// Guidance by status
// ==========================================

pub fn next_steps(status: &str) -> Vec<String> {
    let steps: &[&str] = match status {
        "SUBMITTED" => &["Wait for customs review", "Monitor status updates"],
        "UNDER_REVIEW" => &[
            "Continue monitoring",
            "Prepare for possible additional requests",
        ],
        "APPROVED" => &[
            "Proceed with shipment",
            "Update order status",
            "Notify customer",
        ],
        "REJECTED" => &[
            "Analyze rejection reasons",
            "Correct issues",
            "Prepare resubmission",
        ],
        _ => &["Contact support for guidance"],
    };
    steps.iter().map(|s| s.to_string()).collect()
}

pub fn recommendations(status: &str) -> Vec<String> {
    let items: &[&str] = match status {
        "UNDER_REVIEW" => &[
            "Monitor status regularly for updates",
            "Prepare additional documentation if requested",
        ],
        "ADDITIONAL_INFO_REQUIRED" => &[
            "Provide requested information within 48 hours",
            "Contact customs broker for assistance",
        ],
        "REJECTED" => &[
            "Review rejection reasons and correct issues",
            "Resubmit with corrected documentation",
        ],
        _ => &[],
    };
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests;
