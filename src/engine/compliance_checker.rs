// ==========================================
// Plant operations - China import compliance checker
// ==========================================
// Order-level checklist: products, documents, shipment.
// Violations block the export; warnings only lower the score.
// ==========================================

use crate::domain::export_order::{ExportOrder, ProductLine, Shipment};
use crate::domain::types::{ComplianceStatus, RiskLevel};
use crate::engine::dates::parse_date_time;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{instrument, warn};

pub const REGULATION_VERSION: &str = "2024.1.0";

const VIOLATION_PENALTY: f64 = 10.0;
const WARNING_PENALTY: f64 = 2.0;
const EXPIRY_WARNING_DAYS: i64 = 3;
const NEXT_AUDIT_DAYS: i64 = 90;

// ==========================================
// Rule tables
// ==========================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChinaImportRules {
    pub allowed_meat_types: Vec<String>,
    pub temperature_ranges: BTreeMap<String, TemperatureRange>, // key: frozen_<meat>
    pub allowed_deviation: f64,
    pub mandatory_documents: Vec<String>,
    pub validity_days: BTreeMap<String, i64>,
    pub valid_ports: Vec<String>,
    pub valid_transport: Vec<String>,
    pub max_shelf_life_days: i64,
}

impl Default for ChinaImportRules {
    fn default() -> Self {
        let frozen = TemperatureRange { min: -18.0, max: -15.0 };
        let temperature_ranges = BTreeMap::from([
            ("frozen_beef".to_string(), frozen),
            ("frozen_lamb".to_string(), frozen),
            ("frozen_horse".to_string(), TemperatureRange { min: -20.0, max: -18.0 }),
        ]);
        let validity_days = BTreeMap::from([
            ("health_certificate".to_string(), 30),
            ("veterinary_certificate".to_string(), 7),
            ("customs_declaration".to_string(), 15),
        ]);

        Self {
            allowed_meat_types: to_strings(&["BEEF", "LAMB", "HORSE", "POULTRY"]),
            temperature_ranges,
            allowed_deviation: 0.5,
            mandatory_documents: to_strings(&[
                "health_certificate",
                "veterinary_certificate",
                "certificate_of_origin",
                "customs_declaration",
            ]),
            validity_days,
            valid_ports: to_strings(&["manzhouli", "suifenhe", "dalian", "tianjin"]),
            valid_transport: to_strings(&["REFRIGERATED_TRUCK", "REFRIGERATED_CONTAINER"]),
            max_shelf_life_days: 365,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ==========================================
// Results
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceResult {
    pub compliance_status: ComplianceStatus,
    pub compliance_score: f64,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub required_actions: Vec<String>,
    pub risk_level: RiskLevel,
    pub checked_at: NaiveDateTime,
    pub regulation_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationRecord {
    pub order_id: String,
    pub timestamp: NaiveDateTime,
    pub violations: Vec<String>,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub order_id: Option<String>,
    pub compliance_summary: ComplianceResult,
    pub regulation_references: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_audit_date: NaiveDateTime,
    pub report_generated: NaiveDateTime,
}

#[derive(Default)]
struct Findings {
    violations: Vec<String>,
    warnings: Vec<String>,
}

// ==========================================
// ComplianceChecker
// ==========================================
pub struct ComplianceChecker {
    rules: ChinaImportRules,
    history: Vec<ViolationRecord>,
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        Self::new(ChinaImportRules::default())
    }
}

impl ComplianceChecker {
    pub fn new(rules: ChinaImportRules) -> Self {
        Self {
            rules,
            history: Vec::new(),
        }
    }

    pub fn rules(&self) -> &ChinaImportRules {
        &self.rules
    }

    /// Run the full checklist on one order
    ///
    /// Orders with violations are recorded in the violation history.
    #[instrument(skip(self, order), fields(order_id = ?order.order_id))]
    pub fn check_order(&mut self, order: &ExportOrder, now: NaiveDateTime) -> ComplianceResult {
        let mut findings = Findings::default();

        for (i, product) in order.products.iter().enumerate() {
            self.check_product(&format!("Product_{}", i + 1), product, now, &mut findings);
        }
        self.check_documents(order, now, &mut findings);
        self.check_shipment(order.shipment.as_ref(), &mut findings);

        let Findings {
            violations,
            warnings,
        } = findings;

        let result = ComplianceResult {
            compliance_status: if violations.is_empty() {
                ComplianceStatus::Compliant
            } else {
                ComplianceStatus::NonCompliant
            },
            compliance_score: compliance_score(violations.len(), warnings.len()),
            required_actions: required_actions(&violations),
            risk_level: risk_level(violations.len(), warnings.len()),
            violations,
            warnings,
            checked_at: now,
            regulation_version: REGULATION_VERSION.to_string(),
        };

        if !result.violations.is_empty() {
            let order_id = order.order_id.as_deref().unwrap_or("UNKNOWN").to_string();
            warn!(
                order_id = %order_id,
                violations = ?result.violations,
                "compliance violations detected"
            );
            self.history.push(ViolationRecord {
                order_id,
                timestamp: now,
                violations: result.violations.clone(),
                resolved: false,
            });
        }

        result
    }

    fn check_product(
        &self,
        label: &str,
        product: &ProductLine,
        now: NaiveDateTime,
        findings: &mut Findings,
    ) {
        let meat_type = product.meat_type.as_deref().unwrap_or("").to_uppercase();
        if !self.rules.allowed_meat_types.contains(&meat_type) {
            findings.violations.push(format!(
                "{}: Meat type '{}' not allowed for China export",
                label, meat_type
            ));
        }

        if product.from_quarantine_zone {
            findings.violations.push(format!(
                "{}: Product from quarantine zone - banned for export",
                label
            ));
        }
        if product.hormones_used {
            findings.violations.push(format!(
                "{}: Growth hormones used - banned for export",
                label
            ));
        }

        let temperature = self.check_temperature(product);
        findings
            .violations
            .extend(temperature.violations.into_iter().map(|v| format!("{}: {}", label, v)));
        findings
            .warnings
            .extend(temperature.warnings.into_iter().map(|w| format!("{}: {}", label, w)));

        for v in self.check_dates(product, now) {
            findings.violations.push(format!("{}: {}", label, v));
        }
    }

    fn check_temperature(&self, product: &ProductLine) -> Findings {
        let mut findings = Findings::default();

        let Some(temp) = product.current_temperature else {
            findings
                .warnings
                .push("No current temperature data available".to_string());
            return findings;
        };

        let meat_type = product.meat_type.as_deref().unwrap_or("").to_lowercase();
        let Some(range) = self.rules.temperature_ranges.get(&format!("frozen_{}", meat_type)) else {
            findings.warnings.push(format!(
                "No specific temperature requirements found for {}",
                meat_type
            ));
            return findings;
        };

        let deviation = self.rules.allowed_deviation;
        if temp < range.min - deviation || temp > range.max + deviation {
            findings.violations.push(format!(
                "Temperature {}°C outside safe range ({}°C to {}°C)",
                temp, range.min, range.max
            ));
        } else if temp < range.min || temp > range.max {
            findings.warnings.push(format!(
                "Temperature {}°C approaching limits ({}°C to {}°C)",
                temp, range.min, range.max
            ));
        }
        findings
    }

    fn check_dates(&self, product: &ProductLine, now: NaiveDateTime) -> Vec<String> {
        let (Some(production), Some(expiry)) = (&product.production_date, &product.expiry_date)
        else {
            return vec!["Missing production or expiry date".to_string()];
        };

        let (Some(production), Some(expiry)) =
            (parse_date_time(production), parse_date_time(expiry))
        else {
            return vec!["Invalid date format".to_string()];
        };

        let mut violations = Vec::new();
        if production > now {
            violations.push("Production date cannot be in the future".to_string());
        }
        if expiry < now {
            violations.push("Product has expired".to_string());
        }
        let shelf_life = (expiry - production).num_days();
        if shelf_life > self.rules.max_shelf_life_days {
            violations.push(format!(
                "Shelf life {} days exceeds maximum {} days",
                shelf_life, self.rules.max_shelf_life_days
            ));
        }
        violations
    }

    fn check_documents(&self, order: &ExportOrder, now: NaiveDateTime, findings: &mut Findings) {
        for doc in &self.rules.mandatory_documents {
            if !order.has_document(doc) {
                findings
                    .violations
                    .push(format!("Missing mandatory document: {}", doc));
            }
        }

        for product in &order.products {
            if product.organic_certified && !order.has_document("organic_certificate") {
                findings
                    .violations
                    .push("Organic certification required for organic products".to_string());
            }
            if product.halal_certified && !order.has_document("halal_certificate") {
                findings
                    .violations
                    .push("Halal certification required for halal products".to_string());
            }
            if matches!(product.quality_grade.as_deref(), Some("A") | Some("PREMIUM"))
                && !order.has_document("quality_grade_certificate")
            {
                findings
                    .warnings
                    .push("Quality grade certificate recommended for premium products".to_string());
            }
        }

        for (doc_type, days) in &self.rules.validity_days {
            let Some(issue_date) = order
                .documents_metadata
                .get(doc_type)
                .and_then(|meta| meta.issue_date.as_deref())
            else {
                continue;
            };

            match parse_date_time(issue_date) {
                Some(issued) => {
                    let expires = issued + Duration::days(*days);
                    if expires < now {
                        findings.violations.push(format!("{} has expired", doc_type));
                    } else {
                        let remaining = (expires - now).num_days();
                        if remaining < EXPIRY_WARNING_DAYS {
                            findings
                                .warnings
                                .push(format!("{} expiring in {} days", doc_type, remaining));
                        }
                    }
                }
                None => findings
                    .warnings
                    .push(format!("Invalid issue date format for {}", doc_type)),
            }
        }
    }

    fn check_shipment(&self, shipment: Option<&Shipment>, findings: &mut Findings) {
        let Some(shipment) = shipment else {
            findings
                .violations
                .push("Missing shipment information".to_string());
            return;
        };

        let port = shipment.port_of_entry.as_deref().unwrap_or("").to_lowercase();
        if !port.is_empty() && !self.rules.valid_ports.contains(&port) {
            findings
                .warnings
                .push(format!("Unusual port of entry: {}", port));
        }

        let transport = shipment
            .transport_method
            .as_deref()
            .unwrap_or("")
            .to_uppercase();
        if !self.rules.valid_transport.contains(&transport) {
            findings
                .violations
                .push(format!("Invalid transport method for meat: {}", transport));
        }

        if shipment.insurance_value.unwrap_or(0.0) <= 0.0 {
            findings
                .warnings
                .push("No insurance value specified".to_string());
        }
    }

    /// Violation records newer than `now - days`
    pub fn history(&self, days: i64, now: NaiveDateTime) -> Vec<&ViolationRecord> {
        let cutoff = now - Duration::days(days);
        self.history
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .collect()
    }

    pub fn compliance_report(&mut self, order: &ExportOrder, now: NaiveDateTime) -> ComplianceReport {
        let summary = self.check_order(order, now);
        let recommendations = report_recommendations(&summary);

        ComplianceReport {
            order_id: order.order_id.clone(),
            regulation_references: regulation_references(order),
            recommendations,
            compliance_summary: summary,
            next_audit_date: now + Duration::days(NEXT_AUDIT_DAYS),
            report_generated: now,
        }
    }
}

// ==========================================
// Scoring helpers
// ==========================================

pub fn compliance_score(violations: usize, warnings: usize) -> f64 {
    let score = 100.0 - violations as f64 * VIOLATION_PENALTY - warnings as f64 * WARNING_PENALTY;
    score.max(0.0)
}

pub fn risk_level(violations: usize, warnings: usize) -> RiskLevel {
    let total = violations + warnings;
    if violations > 0 {
        RiskLevel::High
    } else if total >= 3 {
        RiskLevel::Medium
    } else if total >= 1 {
        RiskLevel::Low
    } else {
        RiskLevel::VeryLow
    }
}

/// One action per violation, keyed on the violation text
pub fn required_actions(violations: &[String]) -> Vec<String> {
    violations
        .iter()
        .filter_map(|v| {
            let lower = v.to_lowercase();
            if lower.contains("temperature") {
                Some("Adjust storage temperature to required range".to_string())
            } else if lower.contains("missing mandatory document") {
                let doc = v.rsplit(':').next().unwrap_or("").trim();
                Some(format!("Prepare and include {}", doc))
            } else if lower.contains("expired") {
                Some("Renew expired documents".to_string())
            } else if lower.contains("banned") {
                Some("Remove banned products from shipment".to_string())
            } else {
                None
            }
        })
        .collect()
}

fn regulation_references(order: &ExportOrder) -> Vec<String> {
    let mut refs = BTreeSet::new();
    for product in &order.products {
        let meat_type = product.meat_type.as_deref().unwrap_or("").to_uppercase();
        refs.insert(format!("GB Standard for {} Import", meat_type));
        refs.insert("China Customs Meat Import Procedures".to_string());
        if product.organic_certified {
            refs.insert("Organic Food Import Regulations".to_string());
        }
        if product.halal_certified {
            refs.insert("Halal Food Certification Requirements".to_string());
        }
    }
    refs.into_iter().collect()
}

fn report_recommendations(result: &ComplianceResult) -> Vec<String> {
    let mut recs = Vec::new();
    if result.compliance_score < 90.0 {
        recs.push("Implement automated document validation system".to_string());
    }
    if result
        .violations
        .iter()
        .any(|v| v.to_lowercase().contains("temperature"))
    {
        recs.push("Upgrade temperature monitoring system with real-time alerts".to_string());
    }
    if result.violations.len() > 2 {
        recs.push("Conduct staff training on China import regulations".to_string());
        recs.push("Establish pre-shipment compliance checklist".to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::export_order::{Customer, DocumentMeta};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn compliant_order() -> ExportOrder {
        ExportOrder {
            order_id: Some("BO-2024-001".to_string()),
            customer: Customer {
                name: Some("China Meat Import Co.".to_string()),
                import_license: Some("CN-IMPORT-2024-001".to_string()),
                ..Default::default()
            },
            products: vec![ProductLine {
                product_id: Some("BEEF-001".to_string()),
                meat_type: Some("BEEF".to_string()),
                quantity_kg: Some(5000.0),
                production_date: Some("2024-01-10".to_string()),
                expiry_date: Some("2025-01-05".to_string()),
                current_temperature: Some(-16.5),
                halal_certified: true,
                ..Default::default()
            }],
            shipment: Some(Shipment {
                port_of_entry: Some("Manzhouli".to_string()),
                transport_method: Some("REFRIGERATED_TRUCK".to_string()),
                insurance_value: Some(1500.0),
                ..Default::default()
            }),
            documents: to_strings(&[
                "health_certificate",
                "veterinary_certificate",
                "customs_declaration",
                "certificate_of_origin",
                "halal_certificate",
            ]),
            documents_metadata: BTreeMap::from([(
                "health_certificate".to_string(),
                DocumentMeta {
                    issue_date: Some("2024-01-20".to_string()),
                    expiry_date: None,
                },
            )]),
        }
    }

    #[test]
    fn test_compliant_order() {
        let mut checker = ComplianceChecker::default();
        let result = checker.check_order(&compliant_order(), now());
        assert!(result.violations.is_empty(), "{:?}", result.violations);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(result.compliance_score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
        assert!(checker.history(30, now()).is_empty());
    }

    #[test]
    fn test_temperature_deviation_band() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();

        order.products[0].current_temperature = Some(-14.8);
        let result = checker.check_order(&order, now());
        assert!(result.violations.is_empty());
        assert_eq!(
            result.warnings,
            vec!["Product_1: Temperature -14.8°C approaching limits (-18°C to -15°C)"]
        );
        assert_eq!(result.risk_level, RiskLevel::Low);

        order.products[0].current_temperature = Some(-14.0);
        let result = checker.check_order(&order, now());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.required_actions,
            vec!["Adjust storage temperature to required range"]
        );
    }

    #[test]
    fn test_banned_and_missing_documents() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();
        order.products[0].hormones_used = true;
        order.documents.retain(|d| d != "veterinary_certificate");

        let result = checker.check_order(&order, now());
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
        assert_eq!(result.compliance_score, 80.0);
        assert!(result
            .required_actions
            .contains(&"Prepare and include veterinary_certificate".to_string()));
        assert!(result
            .required_actions
            .contains(&"Remove banned products from shipment".to_string()));

        let history = checker.history(30, now());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].order_id, "BO-2024-001");
        assert!(!history[0].resolved);
        assert!(checker.history(30, now() + Duration::days(31)).is_empty());
    }

    #[test]
    fn test_document_validity() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();
        order.documents_metadata.insert(
            "veterinary_certificate".to_string(),
            DocumentMeta {
                issue_date: Some("2024-01-20".to_string()),
                expiry_date: None,
            },
        );
        order.documents_metadata.insert(
            "customs_declaration".to_string(),
            DocumentMeta {
                issue_date: Some("2024-01-18".to_string()),
                expiry_date: None,
            },
        );

        let result = checker.check_order(&order, now());
        assert_eq!(result.violations, vec!["veterinary_certificate has expired"]);
        // 2024-01-18 + 15 days = 2024-02-02 00:00, 12 hours away
        assert_eq!(result.warnings, vec!["customs_declaration expiring in 0 days"]);
    }

    #[test]
    fn test_shipment_rules() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();
        order.shipment = Some(Shipment {
            port_of_entry: Some("Harbin".to_string()),
            transport_method: Some("air_freight".to_string()),
            ..Default::default()
        });

        let result = checker.check_order(&order, now());
        assert_eq!(result.violations, vec!["Invalid transport method for meat: AIR_FREIGHT"]);
        assert_eq!(
            result.warnings,
            vec!["Unusual port of entry: harbin", "No insurance value specified"]
        );

        order.shipment = None;
        let result = checker.check_order(&order, now());
        assert_eq!(result.violations, vec!["Missing shipment information"]);
    }

    #[test]
    fn test_dates() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();
        order.products[0].production_date = Some("2024-03-01".to_string());
        order.products[0].expiry_date = Some("2025-06-01".to_string());

        let result = checker.check_order(&order, now());
        assert!(result
            .violations
            .contains(&"Product_1: Production date cannot be in the future".to_string()));
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("exceeds maximum 365 days")));

        order.products[0].expiry_date = Some("soon".to_string());
        let result = checker.check_order(&order, now());
        assert_eq!(result.violations, vec!["Product_1: Invalid date format"]);
    }

    #[test]
    fn test_report() {
        let mut checker = ComplianceChecker::default();
        let mut order = compliant_order();
        order.products.push(ProductLine {
            meat_type: Some("beef".to_string()),
            organic_certified: true,
            ..Default::default()
        });

        let report = checker.compliance_report(&order, now());
        assert_eq!(
            report.regulation_references,
            vec![
                "China Customs Meat Import Procedures",
                "GB Standard for BEEF Import",
                "Organic Food Import Regulations",
            ]
        );
        assert!(report.compliance_summary.compliance_score < 90.0);
        assert_eq!(
            report.recommendations[0],
            "Implement automated document validation system"
        );
        assert_eq!(report.next_audit_date, now() + Duration::days(90));
    }
}
