// ==========================================
// Plant operations - shared domain types
// ==========================================
// Enumerations shared across calculators.
// Serialized form: SCREAMING_SNAKE_CASE (same as SQLite storage)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Risk level
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "VERY_LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Compliance status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Conditional,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "COMPLIANT"),
            ComplianceStatus::NonCompliant => write!(f, "NON_COMPLIANT"),
            ComplianceStatus::Conditional => write!(f, "CONDITIONAL"),
        }
    }
}

// ==========================================
// Equipment type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    Smoker,
    Freezer,
    Packaging,
    Cutting,
    Drying,
}

impl EquipmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Smoker => "SMOKER",
            EquipmentType::Freezer => "FREEZER",
            EquipmentType::Packaging => "PACKAGING",
            EquipmentType::Cutting => "CUTTING",
            EquipmentType::Drying => "DRYING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SMOKER" => Some(EquipmentType::Smoker),
            "FREEZER" => Some(EquipmentType::Freezer),
            "PACKAGING" => Some(EquipmentType::Packaging),
            "CUTTING" => Some(EquipmentType::Cutting),
            "DRYING" => Some(EquipmentType::Drying),
            _ => None,
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Equipment status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Available,
    InUse,
    Maintenance,
    Broken,
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentStatus::Available => write!(f, "AVAILABLE"),
            EquipmentStatus::InUse => write!(f, "IN_USE"),
            EquipmentStatus::Maintenance => write!(f, "MAINTENANCE"),
            EquipmentStatus::Broken => write!(f, "BROKEN"),
        }
    }
}

// ==========================================
// Quality check type / status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckType {
    RawMaterial,
    InProcess,
    FinalProduct,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::RawMaterial => "RAW_MATERIAL",
            CheckType::InProcess => "IN_PROCESS",
            CheckType::FinalProduct => "FINAL_PRODUCT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RAW_MATERIAL" | "RAW" => Some(CheckType::RawMaterial),
            "IN_PROCESS" => Some(CheckType::InProcess),
            "FINAL_PRODUCT" | "FINAL" => Some(CheckType::FinalProduct),
            _ => None,
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Passed,
    Failed,
    Conditional,
    Pending,
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityStatus::Passed => write!(f, "PASSED"),
            QualityStatus::Failed => write!(f, "FAILED"),
            QualityStatus::Conditional => write!(f, "CONDITIONAL"),
            QualityStatus::Pending => write!(f, "PENDING"),
        }
    }
}

// ==========================================
// Inventory
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryType {
    RawMaterial,
    FinishedGood,
    Packaging,
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryType::RawMaterial => write!(f, "RAW_MATERIAL"),
            InventoryType::FinishedGood => write!(f, "FINISHED_GOOD"),
            InventoryType::Packaging => write!(f, "PACKAGING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,
    Consumption,
    Production,
    Transfer,
    Adjustment,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Receipt => write!(f, "RECEIPT"),
            MovementType::Consumption => write!(f, "CONSUMPTION"),
            MovementType::Production => write!(f, "PRODUCTION"),
            MovementType::Transfer => write!(f, "TRANSFER"),
            MovementType::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

// ==========================================
// Batch status (traceability lifecycle)
// ==========================================
// Stored in batches.status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Production,
    QualityControl,
    Processing,
    Packaged,
    InStorage,
    InTransit,
    CustomsClearance,
    Delivered,
    Consumed,
}

impl BatchStatus {
    /// Parse the value stored in the database
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PRODUCTION" => Some(BatchStatus::Production),
            "QUALITY_CONTROL" => Some(BatchStatus::QualityControl),
            "PROCESSING" => Some(BatchStatus::Processing),
            "PACKAGED" => Some(BatchStatus::Packaged),
            "IN_STORAGE" => Some(BatchStatus::InStorage),
            "IN_TRANSIT" => Some(BatchStatus::InTransit),
            "CUSTOMS_CLEARANCE" => Some(BatchStatus::CustomsClearance),
            "DELIVERED" => Some(BatchStatus::Delivered),
            "CONSUMED" => Some(BatchStatus::Consumed),
            _ => None,
        }
    }

    /// Value stored in the database
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchStatus::Production => "PRODUCTION",
            BatchStatus::QualityControl => "QUALITY_CONTROL",
            BatchStatus::Processing => "PROCESSING",
            BatchStatus::Packaged => "PACKAGED",
            BatchStatus::InStorage => "IN_STORAGE",
            BatchStatus::InTransit => "IN_TRANSIT",
            BatchStatus::CustomsClearance => "CUSTOMS_CLEARANCE",
            BatchStatus::Delivered => "DELIVERED",
            BatchStatus::Consumed => "CONSUMED",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Batch event type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchEventType {
    Production,
    QualityCheck,
    Processing,
    Packaging,
    Storage,
    Shipment,
    Customs,
    Delivery,
    Consumption,
    Transfer,
}

impl BatchEventType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PRODUCTION" => Some(BatchEventType::Production),
            "QUALITY_CHECK" => Some(BatchEventType::QualityCheck),
            "PROCESSING" => Some(BatchEventType::Processing),
            "PACKAGING" => Some(BatchEventType::Packaging),
            "STORAGE" => Some(BatchEventType::Storage),
            "SHIPMENT" => Some(BatchEventType::Shipment),
            "CUSTOMS" => Some(BatchEventType::Customs),
            "DELIVERY" => Some(BatchEventType::Delivery),
            "CONSUMPTION" => Some(BatchEventType::Consumption),
            "TRANSFER" => Some(BatchEventType::Transfer),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchEventType::Production => "PRODUCTION",
            BatchEventType::QualityCheck => "QUALITY_CHECK",
            BatchEventType::Processing => "PROCESSING",
            BatchEventType::Packaging => "PACKAGING",
            BatchEventType::Storage => "STORAGE",
            BatchEventType::Shipment => "SHIPMENT",
            BatchEventType::Customs => "CUSTOMS",
            BatchEventType::Delivery => "DELIVERY",
            BatchEventType::Consumption => "CONSUMPTION",
            BatchEventType::Transfer => "TRANSFER",
        }
    }

    /// Batch status reached after this event (TRANSFER keeps the current status)
    pub fn resulting_status(&self) -> Option<BatchStatus> {
        match self {
            BatchEventType::Production => Some(BatchStatus::Production),
            BatchEventType::QualityCheck => Some(BatchStatus::QualityControl),
            BatchEventType::Processing => Some(BatchStatus::Processing),
            BatchEventType::Packaging => Some(BatchStatus::Packaged),
            BatchEventType::Storage => Some(BatchStatus::InStorage),
            BatchEventType::Shipment => Some(BatchStatus::InTransit),
            BatchEventType::Customs => Some(BatchStatus::CustomsClearance),
            BatchEventType::Delivery => Some(BatchStatus::Delivered),
            BatchEventType::Consumption => Some(BatchStatus::Consumed),
            BatchEventType::Transfer => None,
        }
    }

    /// Events that carry a quantity change
    pub fn changes_quantity(&self) -> bool {
        matches!(
            self,
            BatchEventType::Transfer | BatchEventType::Processing | BatchEventType::Shipment
        )
    }
}

impl fmt::Display for BatchEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
