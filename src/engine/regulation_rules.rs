// ==========================================
// Plant operations - product import regulations
// ==========================================
// Product-level rule set for meat imports into China:
// temperature, documentation, labeling, banned categories
// ==========================================

use crate::domain::export_order::ProductCompliance;
use crate::engine::compliance_checker::TemperatureRange;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentationRequirements {
    pub mandatory_documents: Vec<String>,
    pub additional_documents: BTreeMap<String, String>, // product attribute -> document
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelingRequirements {
    pub languages: Vec<String>,
    pub required_information: Vec<String>,
    pub font_size: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestingRequirements {
    pub microbiological_tests: Vec<String>,
    pub chemical_tests: Vec<String>,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequirements {
    pub temperature: Option<TemperatureRange>,
    pub documents: DocumentationRequirements,
    pub labeling: LabelingRequirements,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductComplianceResult {
    pub compliant: bool,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub required_actions: Vec<String>,
    pub validation_date: NaiveDateTime,
}

// ==========================================
// RegulationRules
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct RegulationRules {
    /// Ordered: the first key containing the meat type wins
    pub temperature: Vec<(String, TemperatureRange)>,
    pub documents: DocumentationRequirements,
    pub labeling: LabelingRequirements,
    pub testing: TestingRequirements,
}

impl Default for RegulationRules {
    fn default() -> Self {
        let frozen = TemperatureRange { min: -18.0, max: -15.0 };
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let pairs = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            temperature: vec![
                ("frozen_beef".to_string(), frozen),
                ("frozen_lamb".to_string(), frozen),
                ("frozen_horse".to_string(), TemperatureRange { min: -20.0, max: -18.0 }),
                ("chilled_meat".to_string(), TemperatureRange { min: 0.0, max: 4.0 }),
            ],
            documents: DocumentationRequirements {
                mandatory_documents: strings(&[
                    "health_certificate",
                    "veterinary_certificate",
                    "certificate_of_origin",
                    "customs_declaration",
                    "quality_inspection_certificate",
                ]),
                additional_documents: pairs(&[
                    ("organic_products", "organic_certification"),
                    ("halal_products", "halal_certification"),
                    ("premium_grade", "quality_grade_certificate"),
                ]),
            },
            labeling: LabelingRequirements {
                languages: strings(&["chinese", "russian"]),
                required_information: strings(&[
                    "product_name",
                    "production_date",
                    "expiry_date",
                    "storage_conditions",
                    "net_weight",
                    "importer_information",
                    "country_of_origin",
                ]),
                font_size: pairs(&[("chinese", ">=4mm"), ("russian", ">=3mm")]),
            },
            testing: TestingRequirements {
                microbiological_tests: strings(&[
                    "total_bacterial_count",
                    "salmonella",
                    "listeria",
                    "e_coli",
                ]),
                chemical_tests: strings(&[
                    "antibiotic_residues",
                    "pesticide_residues",
                    "heavy_metals",
                    "veterinary_drug_residues",
                ]),
                frequency: "each_batch".to_string(),
            },
        }
    }
}

impl RegulationRules {
    /// Temperature rule whose key contains `product_type`
    pub fn temperature_rule(&self, product_type: &str) -> Option<TemperatureRange> {
        let needle = product_type.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.temperature
            .iter()
            .find(|(key, _)| key.contains(&needle))
            .map(|(_, range)| *range)
    }

    pub fn validate_product(
        &self,
        product: &ProductCompliance,
        now: NaiveDateTime,
    ) -> ProductComplianceResult {
        let mut violations = Vec::new();

        // Temperature
        let meat_type = product.meat_type.as_deref().unwrap_or("");
        if let (Some(range), Some(temp)) =
            (self.temperature_rule(meat_type), product.current_temperature)
        {
            if temp < range.min || temp > range.max {
                violations.push(format!(
                    "Temperature {}°C outside required range ({}°C to {}°C)",
                    temp, range.min, range.max
                ));
            }
        }

        // Documentation
        let has = |doc: &str| product.documents.iter().any(|d| d == doc);
        for doc in &self.documents.mandatory_documents {
            if !has(doc) {
                violations.push(format!("Missing required document: {}", doc));
            }
        }
        if product.organic_certified && !has("organic_certification") {
            violations.push("Organic certification required for organic products".to_string());
        }
        if product.halal_certified && !has("halal_certification") {
            violations.push("Halal certification required for halal products".to_string());
        }

        // Labeling
        for info in &self.labeling.required_information {
            if !product.labeling.fields.contains_key(info) {
                violations.push(format!("Missing labeling information: {}", info));
            }
        }
        for lang in &self.labeling.languages {
            if !product.labeling.languages.contains(lang) {
                violations.push(format!("Missing required language: {}", lang));
            }
        }

        if is_banned(product) {
            violations.push("Product falls under banned categories".to_string());
        }

        ProductComplianceResult {
            compliant: violations.is_empty(),
            required_actions: required_actions(&violations),
            violations,
            warnings: Vec::new(),
            validation_date: now,
        }
    }

    pub fn import_requirements(&self, product_type: &str) -> ImportRequirements {
        ImportRequirements {
            temperature: self.temperature_rule(product_type),
            documents: self.documents.clone(),
            labeling: self.labeling.clone(),
        }
    }
}

fn is_banned(product: &ProductCompliance) -> bool {
    product.from_quarantine_zone || product.hormones_used || product.antibiotics_above_limit
}

fn required_actions(violations: &[String]) -> Vec<String> {
    violations
        .iter()
        .filter_map(|v| {
            let lower = v.to_lowercase();
            if lower.contains("temperature") {
                Some("Adjust storage temperature to required range".to_string())
            } else if lower.contains("missing required document") {
                let doc = v.rsplit(':').next().unwrap_or("").trim();
                Some(format!("Prepare and include {}", doc))
            } else if lower.contains("labeling") || lower.contains("language") {
                Some("Update product labeling to meet requirements".to_string())
            } else if lower.contains("banned") {
                Some(
                    "Product cannot be exported to China - consider alternative markets"
                        .to_string(),
                )
            } else {
                None
            }
        })
        .collect()
}
