// ==========================================
// Plant operations - export order model
// ==========================================
// Orders for meat exports to China. Most fields are optional:
// validators report missing keys instead of rejecting on parse.
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: Option<String>,
    pub name: Option<String>,
    pub import_license: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductLine {
    pub product_id: Option<String>,
    pub description: Option<String>,
    pub meat_type: Option<String>,       // BEEF / LAMB / HORSE / POULTRY
    pub quantity_kg: Option<f64>,
    pub unit_price: Option<f64>,         // USD per kg
    pub production_date: Option<String>, // YYYY-MM-DD
    pub expiry_date: Option<String>,
    pub current_temperature: Option<f64>,
    pub quality_grade: Option<String>,
    #[serde(default)]
    pub organic_certified: bool,
    #[serde(default)]
    pub halal_certified: bool,
    #[serde(default)]
    pub from_quarantine_zone: bool,
    #[serde(default)]
    pub hormones_used: bool,
    #[serde(default)]
    pub antibiotics_above_limit: bool,
    #[serde(default)]
    pub lab_tests: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub port_of_entry: Option<String>,
    pub transport_method: Option<String>,
    pub expected_departure: Option<String>, // ISO date-time
    pub insurance_value: Option<f64>,
    pub freight_cost: Option<f64>,
}

/// Issue / expiry dates of an attached document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOrder {
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub products: Vec<ProductLine>,
    pub shipment: Option<Shipment>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub documents_metadata: BTreeMap<String, DocumentMeta>,
}

impl ExportOrder {
    pub fn total_quantity_kg(&self) -> f64 {
        self.products.iter().filter_map(|p| p.quantity_kg).sum()
    }

    pub fn has_document(&self, doc_type: &str) -> bool {
        self.documents.iter().any(|d| d == doc_type)
    }
}

/// Label contents of a single product, as printed on the package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Labeling {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>, // product_name, net_weight, ...
}

/// Product-level record checked against import regulations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCompliance {
    pub meat_type: Option<String>, // e.g. "beef" or "frozen_beef"
    pub current_temperature: Option<f64>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub labeling: Labeling,
    #[serde(default)]
    pub organic_certified: bool,
    #[serde(default)]
    pub halal_certified: bool,
    #[serde(default)]
    pub from_quarantine_zone: bool,
    #[serde(default)]
    pub hormones_used: bool,
    #[serde(default)]
    pub antibiotics_above_limit: bool,
}
