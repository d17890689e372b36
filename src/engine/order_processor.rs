// ==========================================
// Plant operations - export order processor
// ==========================================
// Validates export orders, prices them and rates their risk
// ==========================================

use crate::config::OrderRules;
use crate::domain::export_order::{Customer, ExportOrder, ProductLine, Shipment};
use crate::domain::types::RiskLevel;
use crate::engine::dates::parse_date_time;
use crate::engine::stats::round_to;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

/// Total order quantity that counts as a risk factor
const LARGE_ORDER_RISK_KG: f64 = 20_000.0;

// ==========================================
// Catalogs
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct CatalogProduct {
    pub product_id: &'static str,
    pub name: &'static str,
    pub meat_type: &'static str,
    pub hs_code: &'static str,
    pub unit_price_usd: f64,
    pub shelf_life_days: i64,
    pub storage_temperature: f64,
    pub quality_grade: &'static str,
}

pub const PRODUCT_CATALOG: [CatalogProduct; 4] = [
    CatalogProduct {
        product_id: "BEEF-001",
        name: "Frozen Beef Carcass Grade A",
        meat_type: "BEEF",
        hs_code: "0201.10",
        unit_price_usd: 5.50,
        shelf_life_days: 365,
        storage_temperature: -18.0,
        quality_grade: "A",
    },
    CatalogProduct {
        product_id: "LAMB-001",
        name: "Frozen Lamb Carcass",
        meat_type: "LAMB",
        hs_code: "0204.10",
        unit_price_usd: 6.80,
        shelf_life_days: 180,
        storage_temperature: -18.0,
        quality_grade: "B",
    },
    CatalogProduct {
        product_id: "HORSE-001",
        name: "Frozen Horse Meat",
        meat_type: "HORSE",
        hs_code: "0205.00",
        unit_price_usd: 4.20,
        shelf_life_days: 365,
        storage_temperature: -20.0,
        quality_grade: "A",
    },
    CatalogProduct {
        product_id: "BEEF-002",
        name: "Frozen Beef Carcass Grade B",
        meat_type: "BEEF",
        hs_code: "0201.10",
        unit_price_usd: 4.80,
        shelf_life_days: 365,
        storage_temperature: -18.0,
        quality_grade: "B",
    },
];

pub const CUSTOMER_IDS: [&str; 3] = ["CUST-CN-001", "CUST-CN-002", "CUST-CN-003"];

pub fn catalog_product(product_id: &str) -> Option<&'static CatalogProduct> {
    PRODUCT_CATALOG.iter().find(|p| p.product_id == product_id)
}

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub required_documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingTimeline {
    pub document_preparation: NaiveDateTime,
    pub compliance_check: NaiveDateTime,
    pub ready_for_shipment: NaiveDateTime,
    pub customs_submission: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRisk {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub customer: String,
    pub total_quantity_kg: f64,
    pub total_value_usd: f64,
    pub validation_result: OrderValidation,
    pub processing_timeline: ProcessingTimeline,
    pub risk_assessment: OrderRisk,
    pub generated_at: NaiveDateTime,
}

// ==========================================
// OrderProcessor
// ==========================================
pub struct OrderProcessor {
    rules: OrderRules,
}

impl OrderProcessor {
    pub fn new(rules: OrderRules) -> Self {
        Self { rules }
    }

    /// Validate an order against business rules
    ///
    /// Required documents are listed only for valid orders.
    pub fn validate_order(&self, order: &ExportOrder, now: NaiveDateTime) -> OrderValidation {
        let mut result = OrderValidation::default();

        self.validate_customer(&order.customer, &mut result);
        self.validate_products(&order.products, &mut result);
        self.validate_shipment(order.shipment.as_ref(), now, &mut result);

        result.valid = result.errors.is_empty();
        if result.valid {
            result.required_documents = self.required_documents(order);
        }

        debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "order validated"
        );
        result
    }

    fn validate_customer(&self, customer: &Customer, result: &mut OrderValidation) {
        for field in &self.rules.required_customer_fields {
            let value = match field.as_str() {
                "name" => customer.name.as_deref(),
                "import_license" => customer.import_license.as_deref(),
                "address" => customer.address.as_deref(),
                "customer_id" => customer.customer_id.as_deref(),
                _ => None,
            };
            if value.map_or(true, str::is_empty) {
                result
                    .errors
                    .push(format!("Missing required customer field: {}", field));
            }
        }

        if let Some(id) = &customer.customer_id {
            if !CUSTOMER_IDS.contains(&id.as_str()) {
                result.errors.push(format!("Customer ID not found: {}", id));
            }
        }
    }

    fn validate_products(&self, products: &[ProductLine], result: &mut OrderValidation) {
        if products.is_empty() {
            result.errors.push("No products in order".to_string());
            return;
        }

        let mut total = 0.0;
        for (i, product) in products.iter().enumerate() {
            let n = i + 1;
            for field in &self.rules.required_product_fields {
                let present = match field.as_str() {
                    "meat_type" => product.meat_type.is_some(),
                    "quantity_kg" => product.quantity_kg.is_some(),
                    "production_date" => product.production_date.is_some(),
                    "product_id" => product.product_id.is_some(),
                    "unit_price" => product.unit_price.is_some(),
                    _ => false,
                };
                if !present {
                    result
                        .errors
                        .push(format!("Product {}: Missing required field: {}", n, field));
                }
            }

            let quantity = product.quantity_kg.unwrap_or(0.0);
            if quantity < self.rules.min_quantity_kg {
                result.errors.push(format!(
                    "Product {}: Quantity {}kg below minimum {}kg",
                    n, quantity, self.rules.min_quantity_kg
                ));
            }
            if quantity > self.rules.max_quantity_kg {
                result.errors.push(format!(
                    "Product {}: Quantity {}kg exceeds maximum {}kg",
                    n, quantity, self.rules.max_quantity_kg
                ));
            }
            total += quantity;

            if let Some(id) = &product.product_id {
                if catalog_product(id).is_none() {
                    result.warnings.push(format!("Product ID not found: {}", id));
                }
            }
        }

        if total > self.rules.large_order_warning_kg {
            result
                .warnings
                .push(format!("Large order detected: {}kg", total));
        }
    }

    fn validate_shipment(
        &self,
        shipment: Option<&Shipment>,
        now: NaiveDateTime,
        result: &mut OrderValidation,
    ) {
        let Some(shipment) = shipment else {
            result.errors.push("Missing shipment information".to_string());
            return;
        };

        if let Some(departure) = &shipment.expected_departure {
            match parse_date_time(departure) {
                Some(dep) => {
                    if dep < now + Duration::days(self.rules.lead_time_days) {
                        result.errors.push(format!(
                            "Departure date {} is too soon. Minimum lead time: {} days",
                            departure, self.rules.lead_time_days
                        ));
                    }
                }
                None => result
                    .errors
                    .push(format!("Invalid departure date format: {}", departure)),
            }
        }

        if let Some(method) = &shipment.transport_method {
            let method = method.to_uppercase();
            if !method.is_empty() && !self.rules.preferred_transport.contains(&method) {
                result
                    .warnings
                    .push(format!("Unusual transport method: {}", method));
            }
        }
    }

    /// Base documents plus certificates implied by the product lines
    pub fn required_documents(&self, order: &ExportOrder) -> Vec<String> {
        let mut docs = self.rules.base_documents.clone();
        let mut add = |doc: &str| {
            if !docs.iter().any(|d| d == doc) {
                docs.push(doc.to_string());
            }
        };

        for product in &order.products {
            if product.organic_certified {
                add("organic_certificate");
            }
            if product.halal_certified {
                add("halal_certificate");
            }
            if matches!(product.quality_grade.as_deref(), Some("A") | Some("PREMIUM")) {
                add("quality_grade_certificate");
            }
        }
        docs
    }

    /// Goods value plus insurance and freight (USD, 2 decimals)
    pub fn calculate_order_value(&self, order: &ExportOrder) -> f64 {
        let goods: f64 = order
            .products
            .iter()
            .map(|p| {
                let price = p
                    .product_id
                    .as_deref()
                    .and_then(catalog_product)
                    .map(|c| c.unit_price_usd)
                    .or(p.unit_price)
                    .unwrap_or(0.0);
                p.quantity_kg.unwrap_or(0.0) * price
            })
            .sum();

        let extras = order
            .shipment
            .as_ref()
            .map(|s| s.insurance_value.unwrap_or(0.0) + s.freight_cost.unwrap_or(0.0))
            .unwrap_or(0.0);

        round_to(goods + extras, 2)
    }

    pub fn order_summary(&self, order: &ExportOrder, now: NaiveDateTime) -> OrderSummary {
        let summary = OrderSummary {
            order_id: order
                .order_id
                .clone()
                .unwrap_or_else(|| format!("ORDER-{}", now.format("%Y%m%d-%H%M%S"))),
            customer: order
                .customer
                .name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            total_quantity_kg: order.total_quantity_kg(),
            total_value_usd: self.calculate_order_value(order),
            validation_result: self.validate_order(order, now),
            processing_timeline: ProcessingTimeline {
                document_preparation: now + Duration::hours(2),
                compliance_check: now + Duration::hours(4),
                ready_for_shipment: now + Duration::hours(6),
                customs_submission: now + Duration::hours(8),
            },
            risk_assessment: assess_order_risk(order),
            generated_at: now,
        };

        info!(
            order_id = %summary.order_id,
            valid = summary.validation_result.valid,
            value_usd = summary.total_value_usd,
            risk = %summary.risk_assessment.risk_level,
            "order summary generated"
        );
        summary
    }
}

pub fn assess_order_risk(order: &ExportOrder) -> OrderRisk {
    let mut score = 0;
    let mut factors = Vec::new();

    if order.total_quantity_kg() > LARGE_ORDER_RISK_KG {
        score += 2;
        factors.push("Large order quantity".to_string());
    }
    for product in &order.products {
        if product.meat_type.as_deref() == Some("HORSE") {
            score += 1;
            factors.push("Horse meat - special handling required".to_string());
        }
        if product.organic_certified {
            score += 1;
            factors.push("Organic certification requirements".to_string());
        }
    }

    let level = if score >= 3 {
        RiskLevel::High
    } else if score >= 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut recommendations = Vec::new();
    if score >= 2 {
        recommendations.push("Perform additional quality checks".to_string());
        recommendations.push("Verify all certifications are current".to_string());
    }
    if score >= 3 {
        recommendations.push("Consult with compliance team before shipment".to_string());
        recommendations.push("Consider splitting large orders".to_string());
    }

    OrderRisk {
        risk_level: level,
        risk_score: score,
        risk_factors: factors,
        recommendations,
    }
}
