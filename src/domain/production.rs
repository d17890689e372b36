// ==========================================
// Plant operations - production planning model
// ==========================================

use crate::domain::types::EquipmentType;
use serde::{Deserialize, Serialize};

/// Production order placed into the schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub product_type: String,            // e.g. SMOKED_OMUL
    pub quantity_kg: f64,
    pub priority: i32,                   // 1 = highest
    pub processing_time_hours: f64,
    pub equipment_requirements: Vec<EquipmentType>,
}

impl ProductionOrder {
    /// Fish type consumed by the order (segment after the first `_`)
    pub fn fish_type(&self) -> &str {
        match self.product_type.split_once('_') {
            Some((_, rest)) => rest.split('_').next().unwrap_or(rest),
            None => &self.product_type,
        }
    }
}

/// Raw material lot on hand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    pub material_id: String,
    pub fish_type: String,               // e.g. OMUL
    pub quantity_kg: f64,
    pub quality_grade: String,
    pub shelf_life_days: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(product_type: &str) -> ProductionOrder {
        ProductionOrder {
            product_type: product_type.to_string(),
            quantity_kg: 10.0,
            priority: 1,
            processing_time_hours: 1.0,
            equipment_requirements: vec![],
        }
    }

    #[test]
    fn test_fish_type_from_product() {
        assert_eq!(order("SMOKED_OMUL").fish_type(), "OMUL");
        assert_eq!(order("DRIED_GRAYLING").fish_type(), "GRAYLING");
        assert_eq!(order("OMUL").fish_type(), "OMUL");
    }
}
