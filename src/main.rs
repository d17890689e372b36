// ==========================================
// Plant operations - command line entry point
// ==========================================
// Each subcommand runs one toolkit component on demo inputs
// (or a JSON/CSV file) and prints the result as pretty JSON.
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use plant_ops::api::BatchTracker;
use plant_ops::config::PlantConfig;
use plant_ops::customs::{CustomsClient, CustomsResponse, ScriptedTransport};
use plant_ops::demo;
use plant_ops::documents::{DocumentGenerator, OutputFormat};
use plant_ops::domain::{BatchEventType, BatchStatus, ExportOrder, NewBatch, NewBatchEvent};
use plant_ops::engine::cold_storage::StorageCheck;
use plant_ops::engine::{
    order_processor::assess_order_risk, plant_metrics, ColdStorageMonitor, ComplianceChecker,
    EquipmentAllocator, InventoryManager, OrderProcessor, QualityTracker, RegulationRules,
    ScheduleGenerator, TemperatureAnalyzer,
};
use plant_ops::logging;
use plant_ops::repository::BatchRepository;

#[derive(Parser)]
#[command(name = "plant-ops", about = "Fish processing and meat export plant toolkit", version)]
struct Cli {
    /// JSON configuration file (falls back to PLANT_OPS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate equipment to the demo production tasks
    Allocate,
    /// Generate a production schedule for the demo orders
    Schedule {
        #[arg(long)]
        horizon_days: Option<u32>,
    },
    /// Score the demo quality checks
    Quality,
    /// Apply demo stock movements and report inventory
    Inventory,
    /// Batch traceability on SQLite
    #[command(subcommand)]
    Batch(BatchCommands),
    /// Validate an export order and assess its risk
    Order(OrderArgs),
    /// Check an export order against China import rules
    Compliance(OrderArgs),
    /// Analyze cold chain temperature logs
    Temperature {
        /// CSV with batch_id,sensor_id,temperature,timestamp
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value = demo::DEMO_BATCH_ID)]
        batch_id: String,
        #[arg(long, default_value = "BEEF")]
        meat_type: String,
    },
    /// Plant quality, OEE and ROI metrics
    Metrics,
    /// Generate the export document package for an order
    Documents {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long, default_value = "html")]
        format: String,
    },
    /// Validate and submit documents through the scripted customs transport
    Customs(OrderArgs),
}

#[derive(Args)]
struct OrderArgs {
    /// Export order JSON file (demo order when absent)
    #[arg(long)]
    order: Option<PathBuf>,
}

#[derive(Subcommand)]
enum BatchCommands {
    /// Create a batch and walk it through its lifecycle
    Demo,
    Create {
        #[arg(long)]
        product_type: String,
        #[arg(long)]
        origin_farm: String,
        #[arg(long)]
        quantity_kg: f64,
        /// YYYY-MM-DD, today when absent
        #[arg(long)]
        production_date: Option<String>,
        #[arg(long)]
        quality_grade: Option<String>,
    },
    Event {
        #[arg(long)]
        batch_id: String,
        /// PRODUCTION, QUALITY_CHECK, PROCESSING, ...
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        quantity_change_kg: Option<f64>,
        #[arg(long)]
        responsible_party: Option<String>,
    },
    Info {
        #[arg(long)]
        batch_id: String,
    },
    Report {
        #[arg(long)]
        batch_id: String,
    },
    List {
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = match PlantConfig::resolve_path(cli.config.as_deref()) {
        Some(path) => PlantConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PlantConfig::default(),
    };
    let now = Local::now().naive_local();

    info!(version = plant_ops::VERSION, "{} starting", plant_ops::APP_NAME);

    match cli.command {
        Commands::Allocate => run_allocate(now),
        Commands::Schedule { horizon_days } => run_schedule(&config, horizon_days, now),
        Commands::Quality => run_quality(now),
        Commands::Inventory => run_inventory(&config, now),
        Commands::Batch(command) => run_batch(&config, command, now),
        Commands::Order(args) => run_order(&config, &load_order(&args, now)?, now),
        Commands::Compliance(args) => run_compliance(&load_order(&args, now)?, now),
        Commands::Temperature {
            csv,
            batch_id,
            meat_type,
        } => run_temperature(&config, csv.as_deref(), &batch_id, &meat_type, now),
        Commands::Metrics => run_metrics(now),
        Commands::Documents { order, format } => {
            run_documents(&config, &load_order(&order, now)?, &format, now)
        }
        Commands::Customs(args) => run_customs(&config, &load_order(&args, now)?, now).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_order(args: &OrderArgs, now: NaiveDateTime) -> Result<ExportOrder> {
    match &args.order {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read order {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid order JSON in {}", path.display()))
        }
        None => Ok(demo::export_order(now)),
    }
}

// ==========================================
// Production
// ==========================================

fn run_allocate(now: NaiveDateTime) -> Result<()> {
    let mut allocator = EquipmentAllocator::with_default_fleet(now);
    let mut allocations = Vec::new();
    for task in demo::production_tasks(now) {
        allocations.push(allocator.allocate(&task, now)?);
    }
    print_json(&json!({
        "allocations": allocations,
        "status_report": allocator.status_report(now),
    }))
}

fn run_schedule(config: &PlantConfig, horizon_days: Option<u32>, now: NaiveDateTime) -> Result<()> {
    let generator = ScheduleGenerator::with_default_fleet(config.schedule.clone(), now);
    let result = generator.generate(
        &demo::production_orders(),
        &demo::raw_materials(),
        horizon_days,
        now,
    )?;
    print_json(&result)
}

fn run_quality(now: NaiveDateTime) -> Result<()> {
    let mut tracker = QualityTracker::new();
    let mut outcomes = Vec::new();
    for check in demo::quality_checks() {
        outcomes.push(tracker.record_check(check.request(), now)?);
    }
    print_json(&json!({
        "checks": outcomes,
        "batch_summary": tracker.batch_summary(demo::DEMO_BATCH_ID)?,
        "alerts": tracker.alerts(),
    }))
}

fn run_inventory(config: &PlantConfig, now: NaiveDateTime) -> Result<()> {
    let mut manager = InventoryManager::with_default_stock(config.inventory.clone(), now);
    let mut movements = Vec::new();
    for request in demo::inventory_movements() {
        movements.push(manager.record_movement(request, now)?);
    }
    let yield_report = manager.calculate_yield(
        demo::DEMO_BATCH_ID,
        "RAW-OMUL-001",
        "FIN-SMOKED-OMUL-001",
    )?;
    print_json(&json!({
        "movements": movements,
        "yield": yield_report,
        "report": manager.inventory_report(now),
    }))
}

// ==========================================
// Batch traceability
// ==========================================

fn open_tracker(config: &PlantConfig) -> Result<BatchTracker> {
    let db_path = config.batch.resolved_database_path();
    let repo = BatchRepository::new(&db_path.to_string_lossy())
        .with_context(|| format!("failed to open batch database {}", db_path.display()))?;
    Ok(BatchTracker::new(Arc::new(repo), config.batch.clone()))
}

fn run_batch(config: &PlantConfig, command: BatchCommands, now: NaiveDateTime) -> Result<()> {
    let tracker = open_tracker(config)?;

    match command {
        BatchCommands::Demo => {
            let start = now - Duration::hours(96);
            let created = tracker.create_batch(&demo::new_batch(start), start)?;
            for event in demo::batch_events(start) {
                tracker.record_event(&created.batch_id, &event, now)?;
            }
            print_json(&json!({
                "created": created,
                "timeline": tracker.get_batch_timeline(&created.batch_id)?,
                "report": tracker.generate_batch_report(&created.batch_id, now)?,
            }))
        }
        BatchCommands::Create {
            product_type,
            origin_farm,
            quantity_kg,
            production_date,
            quality_grade,
        } => {
            let request = NewBatch {
                product_type: Some(product_type),
                production_date: Some(
                    production_date.unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
                ),
                quantity_kg: Some(quantity_kg),
                origin_farm: Some(origin_farm),
                quality_grade,
            };
            print_json(&tracker.create_batch(&request, now)?)
        }
        BatchCommands::Event {
            batch_id,
            event_type,
            location,
            temperature,
            quantity_change_kg,
            responsible_party,
        } => {
            let event_type = BatchEventType::from_str(&event_type)
                .ok_or_else(|| anyhow!("unknown event type: {}", event_type))?;
            let event = NewBatchEvent {
                temperature,
                quantity_change_kg,
                responsible_party,
                ..NewBatchEvent::new(event_type, &location)
            };
            print_json(&tracker.record_event(&batch_id, &event, now)?)
        }
        BatchCommands::Info { batch_id } => print_json(&tracker.get_batch_info(&batch_id)?),
        BatchCommands::Report { batch_id } => {
            print_json(&tracker.generate_batch_report(&batch_id, now)?)
        }
        BatchCommands::List { status } => {
            let status = match status {
                Some(s) => Some(
                    BatchStatus::from_str(&s).ok_or_else(|| anyhow!("unknown status: {}", s))?,
                ),
                None => None,
            };
            print_json(&tracker.list_batches(status)?)
        }
    }
}

// ==========================================
// Export orders and compliance
// ==========================================

fn run_order(config: &PlantConfig, order: &ExportOrder, now: NaiveDateTime) -> Result<()> {
    let processor = OrderProcessor::new(config.orders.clone());
    print_json(&json!({
        "validation": processor.validate_order(order, now),
        "summary": processor.order_summary(order, now),
        "risk": assess_order_risk(order),
    }))
}

fn run_compliance(order: &ExportOrder, now: NaiveDateTime) -> Result<()> {
    let mut checker = ComplianceChecker::default();
    let report = checker.compliance_report(order, now);

    let rules = RegulationRules::default();
    let product = demo::product_compliance();
    print_json(&json!({
        "order_report": report,
        "product_validation": rules.validate_product(&product, now),
        "import_requirements": rules.import_requirements("frozen_beef"),
    }))
}

fn run_temperature(
    config: &PlantConfig,
    csv: Option<&Path>,
    batch_id: &str,
    meat_type: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let mut analyzer = TemperatureAnalyzer::new(config.temperature.clone());
    match csv {
        Some(path) => {
            let count = analyzer
                .load_csv(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            info!(count, "temperature readings loaded");
        }
        None => analyzer.load_readings(demo::temperature_readings(now)),
    }
    let report = analyzer.temperature_report(batch_id, meat_type, now)?;
    print_json(&report)
}

fn run_metrics(now: NaiveDateTime) -> Result<()> {
    let storage = ColdStorageMonitor::default();
    let checks: Vec<StorageCheck> = [("frozen_fish", -17.2), ("frozen_fish", -14.1), ("chilled_fish", 2.5)]
        .iter()
        .enumerate()
        .map(|(i, (product, temperature))| StorageCheck {
            product: product.to_string(),
            temperature: *temperature,
            timestamp: now - Duration::hours(i as i64),
        })
        .collect();

    let monthly_demand = [1200.0, 1350.0, 1280.0, 1420.0];
    let forecast = plant_metrics::forecast_demand(&monthly_demand, 1.1)?;
    print_json(&json!({
        "quality": plant_metrics::quality_report(&demo::production_batches())?,
        "oee_percent": plant_metrics::oee(92.0, 88.0, 98.5),
        "yield_trend": plant_metrics::trend(&[82.0, 84.5, 85.1, 86.3]),
        "roi": plant_metrics::multi_year_roi(430_000.0, 619_000.0, 3)?,
        "demand_forecast_kg": forecast,
        "safety_stock_kg": plant_metrics::safety_stock(
            forecast / 30.0,
            5.0,
            plant_metrics::DEFAULT_SERVICE_LEVEL,
        ),
        "cold_storage": storage.compliance_report(&checks),
    }))
}

// ==========================================
// Documents and customs
// ==========================================

fn run_documents(
    config: &PlantConfig,
    order: &ExportOrder,
    format: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let format =
        OutputFormat::from_str(format).ok_or_else(|| anyhow!("unknown format: {}", format))?;
    let processor = OrderProcessor::new(config.orders.clone());
    let required = processor.required_documents(order);

    let generator = DocumentGenerator::new(&config.documents);
    let package = generator.generate_package(
        order,
        &required,
        &config.documents.default_language,
        format,
        now,
    );
    print_json(&package)
}

async fn run_customs(config: &PlantConfig, order: &ExportOrder, now: NaiveDateTime) -> Result<()> {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_response(CustomsResponse::json(
        202,
        &json!({
            "submission_id": "SUB-DEMO-001",
            "customs_reference": "CN-CUS-DEMO-001",
            "status": "SUBMITTED",
            "estimated_processing_time": "24h",
        }),
    ));
    transport.push_response(CustomsResponse::json(200, &json!({"status": "UNDER_REVIEW"})));
    transport.push_response(CustomsResponse::json(200, &json!({"status": "APPROVED"})));

    let mut customs_config = config.customs.clone();
    customs_config.status_check_interval_secs = 0;
    let client = CustomsClient::new(customs_config, transport);

    let documents = demo::customs_documents(order);
    let validation = client.validate_documents(&documents, now);
    if !validation.valid {
        return print_json(&json!({ "validation": validation }));
    }

    let receipt = client.submit(&documents, order, now).await?;
    let outcome = client.monitor(&receipt.submission_id).await?;
    print_json(&json!({
        "validation": validation,
        "receipt": receipt,
        "monitoring": outcome,
        "next_steps": plant_ops::customs::client::next_steps(&outcome.final_status),
    }))
}
