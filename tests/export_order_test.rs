// ==========================================
// Export order integration tests
// ==========================================
// Order validation, China import compliance and the document
// package for the same order
// ==========================================


use plant_ops::config::{DocumentConfig, OrderRules};
use plant_ops::demo;
use plant_ops::documents::{DocumentGenerator, OutputFormat, RenderSource};
use plant_ops::domain::ComplianceStatus;
use plant_ops::engine::{ComplianceChecker, OrderProcessor, RegulationRules};
use test_helpers::at;

#[test]
fn test_demo_order_passes_validation_and_compliance() {
    let now = at(2024, 3, 1, 9, 0);
    let order = demo::export_order(now);

    let processor = OrderProcessor::new(OrderRules::default());
    let validation = processor.validate_order(&order, now);
    assert!(validation.valid, "errors: {:?}", validation.errors);
    assert_eq!(
        validation.required_documents,
        vec![
            "health_certificate",
            "customs_declaration",
            "certificate_of_origin",
            "halal_certificate",
            "quality_grade_certificate",
        ]
    );

    let mut checker = ComplianceChecker::default();
    let report = checker.compliance_report(&order, now);
    let summary = &report.compliance_summary;
    assert_eq!(summary.compliance_status, ComplianceStatus::Compliant);
    assert!(summary.violations.is_empty());
    assert_eq!(summary.warnings.len(), 2);
    assert!(checker.history(30, now).is_empty());
}

#[test]
fn test_banned_product_is_recorded_in_history() {
    let now = at(2024, 3, 1, 9, 0);
    let mut order = demo::export_order(now);
    order.products[0].hormones_used = true;
    order.documents.retain(|d| d != "veterinary_certificate");

    let mut checker = ComplianceChecker::default();
    let result = checker.check_order(&order, now);
    assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    assert!(result
        .violations
        .contains(&"Product_1: Growth hormones used - banned for export".to_string()));
    assert!(result
        .violations
        .contains(&"Missing mandatory document: veterinary_certificate".to_string()));
    assert!(!result.required_actions.is_empty());

    let history = checker.history(30, now);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order_id, "BO-2024-001");
}

#[test]
fn test_demo_product_meets_regulations() {
    let now = at(2024, 3, 1, 9, 0);
    let rules = RegulationRules::default();

    let result = rules.validate_product(&demo::product_compliance(), now);
    assert!(result.compliant, "violations: {:?}", result.violations);

    let mut unlabeled = demo::product_compliance();
    unlabeled.labeling.languages = vec!["russian".to_string()];
    assert!(!rules.validate_product(&unlabeled, now).compliant);
}

#[test]
fn test_document_package_for_demo_order() {
    let now = at(2024, 3, 1, 9, 0);
    let order = demo::export_order(now);
    let dir = tempfile::tempdir().unwrap();

    let config = DocumentConfig {
        output_dir: dir.path().to_string_lossy().to_string(),
        templates_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string(),
        ..DocumentConfig::default()
    };
    let generator = DocumentGenerator::new(&config);
    let required = OrderProcessor::new(OrderRules::default()).required_documents(&order);

    let package = generator.generate_package(
        &order,
        &required,
        &config.default_language,
        OutputFormat::Pdf,
        now,
    );

    assert_eq!(package.generated_documents, 3);
    assert_eq!(package.failed_documents, 2);
    for doc in &package.documents {
        assert!(doc.output_path.exists());
        assert_eq!(doc.output_path.extension().and_then(|e| e.to_str()), Some("html"));
        assert_eq!(doc.rendered_from, RenderSource::TemplateFile);
    }
    assert!(package
        .errors
        .contains(&"No template found for document type: halal_certificate".to_string()));
}
