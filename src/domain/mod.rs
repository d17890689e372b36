// ==========================================
// Plant operations - domain layer
// ==========================================
// Flat records and enumerations; no data access, no engine logic
// ==========================================

pub mod batch;
pub mod equipment;
pub mod export_order;
pub mod inventory;
pub mod production;
pub mod quality;
pub mod temperature;
pub mod types;

pub use batch::{Batch, BatchEvent, NewBatch, NewBatchEvent};
pub use equipment::{Equipment, ProductionTask};
pub use export_order::{
    Customer, DocumentMeta, ExportOrder, Labeling, ProductCompliance, ProductLine, Shipment,
};
pub use inventory::{InventoryItem, InventoryMovement, MovementRequest};
pub use production::{ProductionOrder, RawMaterial};
pub use quality::{ParameterLimit, QualityAlert, QualityCheck, QualityStandard};
pub use temperature::TemperatureReading;
pub use types::{
    BatchEventType, BatchStatus, CheckType, ComplianceStatus, EquipmentStatus, EquipmentType,
    InventoryType, MovementType, QualityStatus, RiskLevel,
};
