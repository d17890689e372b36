// ==========================================
// Plant operations - core library
// ==========================================
// Fish processing and meat export toolkit:
// production planning, quality, inventory, cold chain,
// batch traceability, export compliance, documents, customs
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - records and enumerations
pub mod domain;

// Repository layer - SQLite batch store
pub mod repository;

// Engine layer - calculators
pub mod engine;

// Configuration
pub mod config;

// Database infrastructure (connection setup, PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// API layer - batch traceability service
pub mod api;

// Export paperwork
pub mod documents;

// Customs submission client
pub mod customs;

// Sample inputs for the CLI
pub mod demo;

// ==========================================
// Core re-exports
// ==========================================

pub use domain::types::{BatchStatus, RiskLevel};

pub use engine::{
    ComplianceChecker, EquipmentAllocator, InventoryManager, OrderProcessor, QualityTracker,
    ScheduleGenerator, TemperatureAnalyzer,
};

pub use api::BatchTracker;
pub use customs::CustomsClient;
pub use documents::DocumentGenerator;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Plant Operations Toolkit";
