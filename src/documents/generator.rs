// ==========================================
// Plant operations - export document generator
// ==========================================
// Renders export paperwork (health, customs, origin, veterinary)
// from jinja template files, or a built-in basic layout when a
// file is absent, to HTML files under the configured output dir
// ==========================================

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use minijinja::{context, path_loader, AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::config::DocumentConfig;
use crate::customs::hs_code::meat_hs_code;
use crate::documents::error::{DocumentError, DocumentResult};
use crate::documents::templates::{
    field_label, template, template_for_type, DocumentTemplate, OutputFormat, TEMPLATES,
};
use crate::domain::export_order::ExportOrder;

pub const EXPORTER_NAME: &str = "BuryatMyasoprom";
pub const EXPORTER_ADDRESS: &str = "Ulan-Ude, Republic of Buryatia, Russia";
pub const EXPORT_LICENSE: &str = "RU-MEAT-EXPORT-2024";

const DEFAULT_LAB_TESTS: &str = "Salmonella: Negative, E.coli: Within limits";

/// Field values keyed by field name; null counts as missing
pub type DocumentData = BTreeMap<String, Value>;

/// Where the rendered markup came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderSource {
    TemplateFile,
    BasicLayout,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub document_id: String,
    pub document_type: String,
    pub output_path: PathBuf,
    pub format: OutputFormat, // format actually written
    pub rendered_from: RenderSource,
    pub generated_at: NaiveDateTime,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPackage {
    pub package_id: String,
    pub order_id: Option<String>,
    pub total_documents: usize,
    pub generated_documents: usize,
    pub failed_documents: usize,
    pub documents: Vec<GeneratedDocument>,
    pub errors: Vec<String>,
    pub generated_at: NaiveDateTime,
}

pub struct DocumentGenerator {
    output_dir: PathBuf,
    templates_dir: Option<PathBuf>,
    env: Environment<'static>,
}

impl DocumentGenerator {
    pub fn new(config: &DocumentConfig) -> Self {
        Self::with_output_dir(&config.output_dir).with_templates_dir(&config.templates_dir)
    }

    /// Generator without template files: every document uses the basic layout
    pub fn with_output_dir(output_dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        // Field values are untrusted text, every document is HTML
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            templates_dir: None,
            env,
        }
    }

    /// Look up each template's `template_file` under `dir`
    pub fn with_templates_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        self.env.set_loader(path_loader(dir.clone()));
        self.templates_dir = Some(dir);
        self
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn available_templates(&self) -> &'static [DocumentTemplate] {
        &TEMPLATES
    }

    /// Render one document and write it to disk
    ///
    /// # Arguments
    /// * `template_id` - registry key, e.g. "health_certificate_cn"
    /// * `data` - field values; every required field must be non-null
    /// * `format` - PDF requests are written as HTML
    ///
    /// # Returns
    /// Location and id of the written document
    #[instrument(skip(self, data), fields(output_dir = %self.output_dir.display()))]
    pub fn generate_document(
        &self,
        template_id: &str,
        data: &DocumentData,
        format: OutputFormat,
        now: NaiveDateTime,
    ) -> DocumentResult<GeneratedDocument> {
        let template = template(template_id)
            .ok_or_else(|| DocumentError::TemplateNotFound(template_id.to_string()))?;

        let missing: Vec<String> = template
            .required_fields
            .iter()
            .filter(|field| data.get(**field).map_or(true, Value::is_null))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DocumentError::MissingFields(missing));
        }

        if format == OutputFormat::Pdf {
            warn!(
                template_id,
                "PDF rendering is not available, writing HTML instead"
            );
        }

        let (html, rendered_from) = self.render(template, data, now)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let base_id = format!(
            "DOC_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            template.doc_type
        );
        let (document_id, output_path) = self.unique_path(&base_id, "html");
        std::fs::write(&output_path, html)?;

        info!(
            document_id = %document_id,
            path = %output_path.display(),
            "document generated"
        );

        Ok(GeneratedDocument {
            document_id,
            document_type: template.doc_type.to_string(),
            output_path,
            format: OutputFormat::Html,
            rendered_from,
            generated_at: now,
            language: template.language.to_string(),
        })
    }

    /// Render the template file, falling back to the basic layout when
    /// the file does not exist
    ///
    /// File templates see every data field at the top level, the whole
    /// map as `data`, plus `generated_date` and `document_name`.
    fn render(
        &self,
        template: &DocumentTemplate,
        data: &DocumentData,
        now: NaiveDateTime,
    ) -> DocumentResult<(String, RenderSource)> {
        let generated_date = now.format("%Y-%m-%d %H:%M:%S").to_string();

        match self.env.get_template(template.template_file) {
            Ok(file_template) => {
                let mut ctx: BTreeMap<String, Value> = data.clone();
                ctx.insert("data".into(), json!(data));
                ctx.insert("generated_date".into(), json!(generated_date));
                ctx.insert("document_name".into(), json!(template.name));
                Ok((file_template.render(&ctx)?, RenderSource::TemplateFile))
            }
            Err(e) if e.kind() == ErrorKind::TemplateNotFound => {
                debug!(
                    template_file = template.template_file,
                    "template file not found, using basic layout"
                );
                let html = render_basic_layout(&self.env, template, data, &generated_date)?;
                Ok((html, RenderSource::BasicLayout))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Generate every required document for an order
    ///
    /// Failures are collected in `errors`; the package is returned
    /// even when nothing could be generated.
    #[instrument(skip(self, order, required_documents), fields(order_id = ?order.order_id))]
    pub fn generate_package(
        &self,
        order: &ExportOrder,
        required_documents: &[String],
        language: &str,
        format: OutputFormat,
        now: NaiveDateTime,
    ) -> DocumentPackage {
        let mut documents = Vec::new();
        let mut errors = Vec::new();

        for doc_type in required_documents {
            let Some(template) = template_for_type(doc_type, language) else {
                errors.push(format!("No template found for document type: {}", doc_type));
                continue;
            };

            let data = prepare_document_data(doc_type, order, now);
            match self.generate_document(template.template_id, &data, format, now) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    error!(doc_type = %doc_type, error = %e, "document generation failed");
                    errors.push(format!("Failed to generate {}: {}", doc_type, e));
                }
            }
        }

        info!(
            generated = documents.len(),
            failed = errors.len(),
            "document package assembled"
        );

        DocumentPackage {
            package_id: format!("PKG_{}", now.format("%Y%m%d_%H%M%S")),
            order_id: order.order_id.clone(),
            total_documents: required_documents.len(),
            generated_documents: documents.len(),
            failed_documents: errors.len(),
            documents,
            errors,
            generated_at: now,
        }
    }

    fn unique_path(&self, base_id: &str, extension: &str) -> (String, PathBuf) {
        let mut id = base_id.to_string();
        let mut path = self.output_dir.join(format!("{}.{}", id, extension));
        let mut suffix = 2;
        while path.exists() {
            id = format!("{}_{}", base_id, suffix);
            path = self.output_dir.join(format!("{}.{}", id, extension));
            suffix += 1;
        }
        (id, path)
    }
}

// ==========================================
// Data preparation
// ==========================================

fn opt_str(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.clone()))
}

fn opt_f64(value: Option<f64>) -> Value {
    value.map_or(Value::Null, |v| json!(v))
}

/// Field values for a document type, derived from an export order
pub fn prepare_document_data(
    doc_type: &str,
    order: &ExportOrder,
    now: NaiveDateTime,
) -> DocumentData {
    let today = now.format("%Y-%m-%d").to_string();
    let mut data = DocumentData::new();

    data.insert("order_id".into(), opt_str(order.order_id.as_ref()));
    data.insert("generation_date".into(), json!(today));
    data.insert("exporter_name".into(), json!(EXPORTER_NAME));
    data.insert("exporter_address".into(), json!(EXPORTER_ADDRESS));
    data.insert("export_license".into(), json!(EXPORT_LICENSE));

    let customer = &order.customer;
    data.insert("china_importer".into(), opt_str(customer.name.as_ref()));
    data.insert("importer_address".into(), opt_str(customer.address.as_ref()));
    data.insert(
        "importer_license".into(),
        opt_str(customer.import_license.as_ref()),
    );

    let first = order.products.first();
    if let Some(product) = first {
        let total_kg = order.total_quantity_kg();
        data.insert(
            "product_description".into(),
            opt_str(product.description.as_ref()),
        );
        data.insert("meat_type".into(), opt_str(product.meat_type.as_ref()));
        data.insert(
            "production_date".into(),
            opt_str(product.production_date.as_ref()),
        );
        data.insert("expiry_date".into(), opt_str(product.expiry_date.as_ref()));
        data.insert("quantity_kg".into(), json!(total_kg));
        data.insert("weight_kg".into(), json!(total_kg));
    }

    let insurance = order.shipment.as_ref().and_then(|s| s.insurance_value);
    let freight = order.shipment.as_ref().and_then(|s| s.freight_cost);
    if let Some(shipment) = &order.shipment {
        data.insert(
            "port_of_entry".into(),
            opt_str(shipment.port_of_entry.as_ref()),
        );
        data.insert(
            "transport_method".into(),
            opt_str(shipment.transport_method.as_ref()),
        );
        data.insert(
            "expected_departure".into(),
            opt_str(shipment.expected_departure.as_ref()),
        );
        data.insert("insurance_value".into(), opt_f64(insurance));
        data.insert("freight_cost".into(), opt_f64(freight));
    }

    match doc_type {
        "health_certificate" => {
            data.insert("veterinary_inspection".into(), json!("APPROVED"));
            data.insert("inspection_date".into(), json!(today));
            data.insert("storage_temperature".into(), json!("-18°C to -15°C"));
            data.insert(
                "quality_standards".into(),
                json!("GB Standards for Meat Import"),
            );
            if first.is_some() {
                data.insert(
                    "production_facility".into(),
                    json!("BuryatMyasoprom Processing Plant"),
                );
                data.insert(
                    "veterinary_authority".into(),
                    json!("Russian Federal Veterinary Service"),
                );
            }
        }
        "customs_declaration" => {
            let product_value: f64 = order
                .products
                .iter()
                .map(|p| p.quantity_kg.unwrap_or(0.0) * p.unit_price.unwrap_or(0.0))
                .sum();
            let customs_value =
                product_value + insurance.unwrap_or(0.0) + freight.unwrap_or(0.0);
            let hs_code = first
                .and_then(|p| p.meat_type.as_deref())
                .map_or(meat_hs_code(""), meat_hs_code);

            data.insert("hs_code".into(), json!(hs_code));
            data.insert("product_value".into(), json!(product_value));
            data.insert("customs_value".into(), json!(customs_value));
            data.insert("country_of_origin".into(), json!("RUSSIA"));
            data.insert("destination_country".into(), json!("CHINA"));
            data.insert("currency".into(), json!("USD"));
        }
        "certificate_of_origin" => {
            data.insert("manufacturer".into(), json!(EXPORTER_NAME));
            data.insert(
                "production_facility".into(),
                json!("Ulan-Ude Meat Processing Plant"),
            );
            data.insert("origin_criteria".into(), json!("Wholly Obtained"));
            data.insert(
                "certifying_authority".into(),
                json!("Chamber of Commerce and Industry of Buryatia"),
            );
            data.insert(
                "certificate_number".into(),
                json!(format!("COO-{}-001", now.format("%Y%m%d"))),
            );
        }
        "veterinary_certificate" => {
            let tests: BTreeSet<&str> = order
                .products
                .iter()
                .flat_map(|p| p.lab_tests.iter().map(String::as_str))
                .collect();
            let lab_tests = if tests.is_empty() {
                DEFAULT_LAB_TESTS.to_string()
            } else {
                tests.into_iter().collect::<Vec<_>>().join(", ")
            };

            data.insert(
                "veterinary_authority".into(),
                json!("Federal Service for Veterinary and Phytosanitary Surveillance"),
            );
            data.insert("inspection_date".into(), json!(today));
            data.insert(
                "animal_health".into(),
                json!("Healthy animals, disease-free zone"),
            );
            data.insert("laboratory_tests".into(), json!(lab_tests));
            data.insert(
                "quarantine_status".into(),
                json!("No quarantine restrictions"),
            );
            data.insert(
                "vaccination_status".into(),
                json!("All vaccinations current"),
            );
        }
        _ => {}
    }

    data
}

// ==========================================
// Rendering
// ==========================================

/// Layout used when a template's file is not in the templates directory
const BASIC_LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{{ title }}</title>
<style>
body { font-family: Arial, sans-serif; margin: 40px; }
.header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px; }
.field { margin: 10px 0; }
.field-label { font-weight: bold; }
.signature { margin-top: 50px; }
</style>
</head>
<body>
<div class="header">
<h1>{{ title }}</h1>
<p>Generated: {{ generated_date }}</p>
</div>
<div class="content">
{% for field in fields %}<div class="field"><span class="field-label">{{ field.label }}:</span> <span>{{ field.value }}</span></div>
{% endfor %}</div>
<div class="signature">
<p>Authorized Signature: _________________________</p>
<p>Date: _________________________</p>
</div>
</body>
</html>
"#;

#[derive(Serialize)]
struct FieldRow {
    label: String,
    value: String,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_basic_layout(
    env: &Environment<'static>,
    template: &DocumentTemplate,
    data: &DocumentData,
    generated_date: &str,
) -> DocumentResult<String> {
    let fields: Vec<FieldRow> = template
        .required_fields
        .iter()
        .map(|field| FieldRow {
            label: field_label(field),
            value: data
                .get(*field)
                .map(display_value)
                .unwrap_or_else(|| "NOT PROVIDED".to_string()),
        })
        .collect();

    let html = env.template_from_str(BASIC_LAYOUT)?.render(context! {
        title => template.name,
        generated_date => generated_date,
        fields => fields,
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::export_order::{Customer, ProductLine, Shipment};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn order() -> ExportOrder {
        ExportOrder {
            order_id: Some("BO-2024-001".into()),
            customer: Customer {
                customer_id: Some("CN-001".into()),
                name: Some("China Meat Import Co. <Beijing>".into()),
                import_license: Some("CN-IMPORT-2024-001".into()),
                address: Some("Beijing, China".into()),
            },
            products: vec![
                ProductLine {
                    description: Some("Frozen Beef Carcass".into()),
                    meat_type: Some("LAMB".into()),
                    quantity_kg: Some(5000.0),
                    unit_price: Some(5.5),
                    production_date: Some("2024-01-15".into()),
                    expiry_date: Some("2025-01-15".into()),
                    lab_tests: vec!["Listeria: Negative".into(), "Salmonella: Negative".into()],
                    ..Default::default()
                },
                ProductLine {
                    quantity_kg: Some(1000.0),
                    unit_price: Some(4.0),
                    lab_tests: vec!["Salmonella: Negative".into()],
                    ..Default::default()
                },
            ],
            shipment: Some(Shipment {
                port_of_entry: Some("Manzhouli".into()),
                transport_method: Some("REFRIGERATED_TRUCK".into()),
                expected_departure: Some("2024-02-20T08:00:00".into()),
                insurance_value: Some(500.0),
                freight_cost: Some(1200.0),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_customs_data_values() {
        let data = prepare_document_data("customs_declaration", &order(), now());
        assert_eq!(data["product_value"], json!(31500.0));
        assert_eq!(data["customs_value"], json!(33200.0));
        assert_eq!(data["hs_code"], json!("0204.10"));
        assert_eq!(data["weight_kg"], json!(6000.0));
    }

    #[test]
    fn test_veterinary_lab_tests_deduplicated() {
        let data = prepare_document_data("veterinary_certificate", &order(), now());
        assert_eq!(
            data["laboratory_tests"],
            json!("Listeria: Negative, Salmonella: Negative")
        );

        let mut bare = order();
        bare.products.iter_mut().for_each(|p| p.lab_tests.clear());
        let data = prepare_document_data("veterinary_certificate", &bare, now());
        assert_eq!(data["laboratory_tests"], json!(DEFAULT_LAB_TESTS));
    }

    #[test]
    fn test_generate_escapes_and_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let generator = DocumentGenerator::with_output_dir(dir.path());
        let data = prepare_document_data("health_certificate", &order(), now());

        let first = generator
            .generate_document("health_certificate_cn", &data, OutputFormat::Pdf, now())
            .unwrap();
        assert_eq!(first.document_id, "DOC_20240201_103000_health_certificate");
        assert_eq!(first.format, OutputFormat::Html);
        assert_eq!(first.rendered_from, RenderSource::BasicLayout);

        let html = std::fs::read_to_string(&first.output_path).unwrap();
        assert!(html.contains("China Meat Import Co. &lt;Beijing&gt;"));
        assert!(html.contains("Port Of Entry:"));
        assert!(html.contains("Authorized Signature"));

        let second = generator
            .generate_document("health_certificate_cn", &data, OutputFormat::Html, now())
            .unwrap();
        assert_eq!(second.document_id, "DOC_20240201_103000_health_certificate_2");
    }

    #[test]
    fn test_missing_and_null_fields() {
        let dir = tempfile::tempdir().unwrap();
        let generator = DocumentGenerator::with_output_dir(dir.path());
        let mut data = prepare_document_data("customs_declaration", &order(), now());
        data.insert("insurance_value".into(), Value::Null);
        data.remove("transport_method");

        match generator.generate_document("customs_declaration_cn", &data, OutputFormat::Html, now())
        {
            Err(DocumentError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["transport_method", "insurance_value"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            generator.generate_document("packing_list_cn", &data, OutputFormat::Html, now()),
            Err(DocumentError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_package_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        let generator = DocumentGenerator::with_output_dir(dir.path());
        let mut no_shipment = order();
        no_shipment.shipment = None;

        let required = vec![
            "health_certificate".to_string(),
            "customs_declaration".to_string(),
            "certificate_of_origin".to_string(),
            "packing_list".to_string(),
        ];
        let package =
            generator.generate_package(&no_shipment, &required, "chinese", OutputFormat::Html, now());

        assert_eq!(package.total_documents, 4);
        assert_eq!(package.generated_documents, 1);
        assert_eq!(package.failed_documents, 3);
        assert_eq!(package.package_id, "PKG_20240201_103000");
        assert!(package
            .errors
            .contains(&"No template found for document type: packing_list".to_string()));
        assert!(package
            .errors
            .iter()
            .any(|e| e.starts_with("Failed to generate health_certificate: Missing required fields")));
    }

    #[test]
    fn test_template_file_is_rendered_with_autoescape() {
        let templates = tempfile::tempdir().unwrap();
        std::fs::write(
            templates.path().join("health_certificate_cn.html"),
            "<h1>{{ document_name }}</h1><p>{{ china_importer }}</p>\
             <p>{{ data.port_of_entry }}</p><p>{{ generated_date }}</p>",
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator =
            DocumentGenerator::with_output_dir(out.path()).with_templates_dir(templates.path());
        let data = prepare_document_data("health_certificate", &order(), now());

        let doc = generator
            .generate_document("health_certificate_cn", &data, OutputFormat::Html, now())
            .unwrap();
        assert_eq!(doc.rendered_from, RenderSource::TemplateFile);

        let html = std::fs::read_to_string(&doc.output_path).unwrap();
        assert!(html.starts_with("<h1>Health Certificate (Chinese)</h1>"));
        assert!(html.contains("<p>China Meat Import Co. &lt;Beijing&gt;</p>"));
        assert!(html.contains("<p>Manzhouli</p>"));
        assert!(html.contains("<p>2024-02-01 10:30:00</p>"));
        assert!(!html.contains("Authorized Signature"));
    }

    #[test]
    fn test_missing_template_file_falls_back_to_basic_layout() {
        let templates = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator =
            DocumentGenerator::with_output_dir(out.path()).with_templates_dir(templates.path());
        let data = prepare_document_data("certificate_of_origin", &order(), now());

        let doc = generator
            .generate_document("certificate_of_origin_cn", &data, OutputFormat::Html, now())
            .unwrap();
        assert_eq!(doc.rendered_from, RenderSource::BasicLayout);
        let html = std::fs::read_to_string(&doc.output_path).unwrap();
        assert!(html.contains("Origin Criteria:</span> <span>Wholly Obtained</span>"));
    }

    #[test]
    fn test_broken_template_file_is_an_error() {
        let templates = tempfile::tempdir().unwrap();
        std::fs::write(
            templates.path().join("veterinary_certificate_cn.html"),
            "{% if animal_health %}unterminated",
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator =
            DocumentGenerator::with_output_dir(out.path()).with_templates_dir(templates.path());
        let data = prepare_document_data("veterinary_certificate", &order(), now());

        assert!(matches!(
            generator.generate_document("veterinary_certificate_cn", &data, OutputFormat::Html, now()),
            Err(DocumentError::Render(_))
        ));
    }

    #[test]
    fn test_bundled_templates_render() {
        let out = tempfile::tempdir().unwrap();
        let generator = DocumentGenerator::with_output_dir(out.path())
            .with_templates_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"));

        for template in TEMPLATES.iter() {
            let data = prepare_document_data(template.doc_type, &order(), now());
            let doc = generator
                .generate_document(template.template_id, &data, OutputFormat::Html, now())
                .unwrap();
            assert_eq!(doc.rendered_from, RenderSource::TemplateFile);

            let html = std::fs::read_to_string(&doc.output_path).unwrap();
            assert!(html.contains(template.name));
            assert!(html.contains("China Meat Import Co. &lt;Beijing&gt;"));
        }
    }
}
