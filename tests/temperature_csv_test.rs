// ==========================================
// Temperature log integration tests
// ==========================================
// CSV sensor log -> analysis -> compliance report
// ==========================================


use std::io::Write;

use chrono::Duration;
use plant_ops::config::TemperatureConfig;
use plant_ops::engine::temperature_analyzer::{CertificationStatus, ViolationSeverity};
use plant_ops::engine::{EngineError, TemperatureAnalyzer};
use tempfile::NamedTempFile;
use test_helpers::at;

/// 40 readings for BATCH-A every 5 minutes with a 5-reading warm spell
/// starting at index 20, plus a few readings for BATCH-B
fn write_sensor_log() -> NamedTempFile {
    let start = at(2024, 2, 10, 0, 0);
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "batch_id,sensor_id,temperature,timestamp").unwrap();
    for i in 0..40 {
        let temp = if (20..25).contains(&i) { -13.5 } else { -16.5 };
        let ts = start + Duration::minutes(5 * i);
        writeln!(file, "BATCH-A, CS-01, {}, {}", temp, ts.format("%Y-%m-%dT%H:%M:%S")).unwrap();
    }
    for i in 0..3 {
        let ts = start + Duration::minutes(5 * i);
        writeln!(file, "BATCH-B,CS-02,-19.0,{}", ts.format("%Y-%m-%d %H:%M:%S")).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_csv_report_flags_warm_spell() {
    let log = write_sensor_log();
    let mut analyzer = TemperatureAnalyzer::new(TemperatureConfig::default());
    assert_eq!(analyzer.load_csv(log.path()).unwrap(), 43);

    let now = at(2024, 2, 10, 12, 0);
    let report = analyzer.temperature_report("BATCH-A", "beef", now).unwrap();

    let analysis = &report.detailed_analysis;
    assert_eq!(analysis.statistics.violation_count, 5);
    assert!((analysis.statistics.compliance_rate - 87.5).abs() < 1e-9);
    assert_eq!(analysis.analysis_period.start, at(2024, 2, 10, 0, 0));

    assert_eq!(analysis.violations.len(), 1);
    let run = &analysis.violations[0];
    assert_eq!(run.severity, ViolationSeverity::Warning);
    assert_eq!(run.start_index, 20);
    assert_eq!(run.end_index, 25);
    assert_eq!(run.duration, 5);

    assert_eq!(report.executive_summary.overall_status, "NON-COMPLIANT");
    assert_eq!(
        report.compliance_certification.status,
        CertificationStatus::NonCompliant
    );
    assert_eq!(report.valid_until, now + Duration::days(7));

    // runs up to twice the threshold stay below the alert level
    assert!(analyzer.active_alerts().is_empty());
}

#[test]
fn test_csv_batches_are_analyzed_separately() {
    let log = write_sensor_log();
    let mut analyzer = TemperatureAnalyzer::new(TemperatureConfig::default());
    analyzer.load_csv(log.path()).unwrap();

    let now = at(2024, 2, 10, 12, 0);
    let horse = analyzer.analyze("BATCH-B", "HORSE", now).unwrap();
    assert_eq!(horse.statistics.violation_count, 0);
    assert!((horse.statistics.compliance_rate - 100.0).abs() < 1e-9);

    assert!(matches!(
        analyzer.analyze("BATCH-C", "BEEF", now),
        Err(EngineError::NoDataForBatch(_))
    ));
    assert!(matches!(
        analyzer.analyze("BATCH-A", "VENISON", now),
        Err(EngineError::UnknownMeatType(_))
    ));
}
