// ==========================================
// Plant operations - engine layer
// ==========================================
// Calculators over domain records. No SQL here:
// persistence lives in repository, orchestration in api.
// ==========================================

pub mod batch_analytics;
pub mod cold_storage;
pub mod compliance_checker;
pub mod dates;
pub mod equipment_allocator;
pub mod error;
pub mod inventory_manager;
pub mod order_processor;
pub mod plant_metrics;
pub mod quality_tracker;
pub mod regulation_rules;
pub mod schedule_generator;
pub mod stats;
pub mod temperature_analyzer;

// Re-export the calculators
pub use cold_storage::ColdStorageMonitor;
pub use compliance_checker::{ChinaImportRules, ComplianceChecker, ComplianceResult};
pub use equipment_allocator::EquipmentAllocator;
pub use error::{EngineError, EngineResult};
pub use inventory_manager::InventoryManager;
pub use order_processor::OrderProcessor;
pub use quality_tracker::QualityTracker;
pub use regulation_rules::RegulationRules;
pub use schedule_generator::{ScheduleGenerator, ScheduleResult};
pub use temperature_analyzer::TemperatureAnalyzer;
