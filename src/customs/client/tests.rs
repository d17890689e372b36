use super::*;
use crate::customs::transport::ScriptedTransport;
use crate::domain::export_order::{Customer, ProductLine, Shipment};
use chrono::NaiveDate;
use serde_json::json;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn config() -> CustomsConfig {
    CustomsConfig {
        base_url: "https://customs.test/api/v1/".to_string(),
        retry_delay_secs: 0,
        status_check_interval_secs: 0,
        api_key: "key-123".to_string(),
        secret_key: "secret".to_string(),
        ..CustomsConfig::default()
    }
}

fn client(transport: Arc<ScriptedTransport>, config: CustomsConfig) -> CustomsClient {
    CustomsClient::new(config, transport)
}

fn order() -> ExportOrder {
    ExportOrder {
        order_id: Some("BO-2024-001".into()),
        customer: Customer {
            name: Some("China Meat Import Co.".into()),
            import_license: Some("CN-IMPORT-2024-001".into()),
            address: Some("Beijing, China".into()),
            ..Default::default()
        },
        products: vec![ProductLine {
            description: Some("Frozen Beef Carcass".into()),
            meat_type: Some("BEEF".into()),
            quantity_kg: Some(5000.0),
            unit_price: Some(5.5),
            ..Default::default()
        }],
        shipment: Some(Shipment {
            port_of_entry: Some("Manzhouli".into()),
            transport_method: Some("REFRIGERATED_TRUCK".into()),
            expected_departure: Some("2024-02-20".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn document(doc_type: &str, content: Value) -> CustomsDocument {
    let content = match content {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    CustomsDocument {
        doc_type: doc_type.to_string(),
        content,
    }
}

fn declaration() -> CustomsDocument {
    document(
        "customs_declaration",
        json!({"hs_code": "0201.10", "weight_kg": 5000}),
    )
}

#[test]
fn test_signature_is_hmac_of_timestamp_and_body() {
    let c = client(Arc::new(ScriptedTransport::new()), config());
    let signature = c.sign(r#"{"a":1}"#, "2024-02-01T10:00:00").unwrap();
    assert_eq!(
        signature,
        "d1d5897913a1d865949869f032f0364dac77f904884254ae8d4c9e22aebe1824"
    );
}

#[test]
fn test_prepare_submission() {
    let c = client(Arc::new(ScriptedTransport::new()), config());
    let payload = c.prepare_submission(&[declaration()], &order(), now()).unwrap();

    assert_eq!(payload.shipment_info.port_of_export, "Zabaikalsk");
    assert_eq!(payload.products[0].hs_code, "0201.10");
    assert!((payload.products[0].value - 27500.0).abs() < 1e-9);
    assert_eq!(
        payload.documents[0].checksum,
        "37703ca083b3c1006923725d09f1acef79c926d8f6cee25ae3d842c57a7ebd90"
    );
    assert_eq!(payload.metadata.order_id.as_deref(), Some("BO-2024-001"));
}

#[tokio::test]
async fn test_submit_without_documents() {
    let transport = Arc::new(ScriptedTransport::new());
    let c = client(transport.clone(), config());
    let result = c.submit(&[], &order(), now()).await;
    assert!(matches!(result, Err(CustomsError::NoDocuments)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_submit_retries_server_errors() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::new(503, "busy"));
    transport.push_error(TransportError::Connection("reset".into()));
    transport.push_response(CustomsResponse::json(
        202,
        &json!({"submission_id": "SUB-1", "customs_reference": "CR-9"}),
    ));

    let c = client(transport.clone(), config());
    let receipt = c.submit(&[declaration()], &order(), now()).await.unwrap();

    assert_eq!(receipt.submission_id, "SUB-1");
    assert_eq!(receipt.status, "SUBMITTED");
    assert_eq!(receipt.customs_reference.as_deref(), Some("CR-9"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    let first = &requests[0];
    assert_eq!(first.method, HttpMethod::Post);
    assert_eq!(first.url, "https://customs.test/api/v1/submissions");
    assert_eq!(first.headers.get("X-API-Key").map(String::as_str), Some("key-123"));
    assert_eq!(
        first.headers.get("X-Timestamp").map(String::as_str),
        Some("2024-02-01T10:00:00")
    );

    let body = first.body.clone().unwrap();
    let expected = c.sign(&body, "2024-02-01T10:00:00").unwrap();
    assert_eq!(first.headers.get("X-Signature"), Some(&expected));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..10 {
        transport.push_response(CustomsResponse::new(500, "down"));
    }

    let c = client(transport.clone(), config());
    match c.submit(&[declaration()], &order(), now()).await {
        Err(CustomsError::RetriesExhausted { attempts, last_error }) => {
            assert_eq!(attempts, 4);
            assert_eq!(last_error, "status 500");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(transport.requests().len(), 4);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::json(
        400,
        &json!({"error_code": "E_HS", "error_message": "bad HS code", "field_errors": ["hs_code"]}),
    ));

    let c = client(transport.clone(), config());
    match c.submit(&[declaration()], &order(), now()).await {
        Err(CustomsError::Rejected { status, detail }) => {
            assert_eq!(status, 400);
            assert_eq!(detail.code.as_deref(), Some("E_HS"));
            assert_eq!(detail.field_errors.len(), 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_monitor_until_terminal_status() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::json(200, &json!({"status": "UNDER_REVIEW"})));
    transport.push_response(CustomsResponse::json(200, &json!({"status": "APPROVED"})));

    let c = client(transport, config());
    let outcome = c.monitor("SUB-1").await.unwrap();
    assert_eq!(outcome.final_status, "APPROVED");
    assert_eq!(outcome.checks_performed, 2);
    assert_eq!(outcome.details.submission_id, "SUB-1");
}

#[tokio::test]
async fn test_monitor_timeout() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..3 {
        transport.push_response(CustomsResponse::json(200, &json!({"status": "UNDER_REVIEW"})));
    }

    let mut cfg = config();
    cfg.max_status_checks = 2;
    let c = client(transport.clone(), cfg);
    match c.monitor("SUB-1").await {
        Err(CustomsError::MonitoringTimeout { checks, last_status, .. }) => {
            assert_eq!(checks, 2);
            assert_eq!(last_status, "UNDER_REVIEW");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_regulation_updates_with_since() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::json(
        200,
        &json!({"updates": [{"id": "GB-2707"}, {"id": "GB-4789"}]}),
    ));

    let c = client(transport.clone(), config());
    let updates = c.regulation_updates(Some(now())).await.unwrap();
    assert_eq!(updates.total_updates, 2);
    assert_eq!(
        transport.requests()[0].query.get("since").map(String::as_str),
        Some("2024-02-01T10:00:00")
    );
}

#[tokio::test]
async fn test_submission_report() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::json(200, &json!({"status": "REJECTED"})));

    let c = client(transport, config());
    let report = c.submission_report("SUB-1", now()).await.unwrap();
    assert_eq!(report.report_id, "CUSTOMS_REPORT_20240201_100000");
    assert_eq!(report.next_steps[0], "Analyze rejection reasons");
    assert_eq!(report.recommendations.len(), 2);
}

#[test]
fn test_validate_documents() {
    let c = client(Arc::new(ScriptedTransport::new()), config());
    let docs = vec![
        document(
            "health_certificate",
            json!({
                "exporter_name": "BuryatMyasoprom",
                "product_description": "Frozen Beef Carcass",
                "production_date": "2023-12-01",
                "veterinary_inspection": "APPROVED",
                "china_importer": "China Meat Import Co."
            }),
        ),
        document(
            "customs_declaration",
            json!({"hs_code": "201.1", "product_value": 0, "weight_kg": 5000, "country_of_origin": "RUSSIA"}),
        ),
    ];

    let report = c.validate_documents(&docs, now());
    assert!(!report.valid);
    assert!(report.documents[0].valid);
    assert_eq!(report.documents[0].warnings.len(), 1);

    let declaration = &report.documents[1];
    assert!(declaration
        .errors
        .contains(&"Missing required field: product_value".to_string()));
    assert!(declaration
        .errors
        .contains(&"Product value must be greater than 0".to_string()));
    assert!(declaration
        .errors
        .contains(&"Invalid HS code format".to_string()));
    assert_eq!(report.summary.valid_documents, 1);
    assert_eq!(report.summary.total_errors, 3);
}

#[test]
fn test_guidance_for_unknown_status() {
    assert_eq!(next_steps("ON_HOLD"), vec!["Contact support for guidance"]);
    assert!(recommendations("APPROVED").is_empty());
}
