// ==========================================
// Plant operations - configuration layer
// ==========================================
// Source: JSON file (--config or PLANT_OPS_CONFIG)
// Every field has a default; a missing file yields defaults.
// ==========================================

pub mod plant_config;

pub use plant_config::{
    BatchConfig, ConfigError, CustomsConfig, DocumentConfig, InventoryConfig, OrderRules,
    PlantConfig, ScheduleConfig, TemperatureConfig, TemperatureLimits, CONFIG_ENV_VAR,
};
