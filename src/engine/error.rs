// ==========================================
// Plant operations - engine error types
// ==========================================
// Rejections raised by the calculators. Findings (violations,
// warnings) are returned inside Ok reports instead.
// ==========================================

use crate::config::ConfigError;
use crate::engine::schedule_generator::CapacityDeficit;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // ===== Equipment / scheduling =====
    #[error("no suitable equipment available for {product_type}")]
    NoSuitableEquipment { product_type: String },

    #[error("equipment not found: {0}")]
    EquipmentNotFound(String),

    #[error("insufficient raw materials: {missing:?}")]
    InsufficientRawMaterials { missing: BTreeMap<String, f64> },

    #[error("insufficient equipment capacity: {}", .bottlenecks.keys().cloned().collect::<Vec<_>>().join(", "))]
    InsufficientEquipmentCapacity {
        bottlenecks: BTreeMap<String, CapacityDeficit>,
    },

    // ===== Quality =====
    #[error("unknown product type: {0}")]
    UnknownProductType(String),

    #[error("invalid parameters: {}", .0.join(", "))]
    InvalidParameters(Vec<String>),

    #[error("no quality checks found for batch {0}")]
    NoChecksForBatch(String),

    #[error("alert not found: {0}")]
    AlertNotFound(String),

    // ===== Inventory =====
    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid movement: {}", .0.join("; "))]
    InvalidMovement(Vec<String>),

    #[error("no raw material consumption found for batch {batch_id}")]
    NoRawMaterialConsumption { batch_id: String },

    // ===== Cold chain =====
    #[error("no temperature data loaded")]
    NoTemperatureData,

    #[error("no temperature data for batch {0}")]
    NoDataForBatch(String),

    #[error("unknown meat type: {0}")]
    UnknownMeatType(String),

    // ===== General =====
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias
pub type EngineResult<T> = Result<T, EngineError>;
