// ==========================================
// Plant operations - configuration model
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "PLANT_OPS_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schedule config: {0}")]
    InvalidSchedule(String),
}

// ==========================================
// PlantConfig - root
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub schedule: ScheduleConfig,
    pub orders: OrderRules,
    pub temperature: TemperatureConfig,
    pub inventory: InventoryConfig,
    pub batch: BatchConfig,
    pub documents: DocumentConfig,
    pub customs: CustomsConfig,
}

impl PlantConfig {
    /// Load configuration from a JSON file
    ///
    /// # Returns
    /// - Ok(defaults) when the file does not exist
    /// - Err(ConfigError::Parse) when the file is not valid JSON for this model
    /// - Err(ConfigError::InvalidSchedule) when the shift does not fit in a day
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: PlantConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.schedule.validate()?;

        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Resolve the config path: explicit argument first, then the environment
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }
}

// ==========================================
// Production schedule
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub operating_hours_per_day: f64,
    pub shift_start_hour: u32,
    pub default_horizon_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            operating_hours_per_day: 16.0,
            shift_start_hour: 8,
            default_horizon_days: 7,
        }
    }
}

impl ScheduleConfig {
    /// The operating window must start and end within one calendar day
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shift_start_hour >= 24 {
            return Err(ConfigError::InvalidSchedule(format!(
                "shift_start_hour must be below 24, got {}",
                self.shift_start_hour
            )));
        }
        let hours = self.operating_hours_per_day;
        if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
            return Err(ConfigError::InvalidSchedule(format!(
                "operating_hours_per_day must be in (0, 24], got {}",
                hours
            )));
        }
        if f64::from(self.shift_start_hour) + hours > 24.0 {
            return Err(ConfigError::InvalidSchedule(format!(
                "shift starting at {}:00 for {}h runs past midnight",
                self.shift_start_hour, hours
            )));
        }
        Ok(())
    }
}

// ==========================================
// Export order rules
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRules {
    pub min_quantity_kg: f64,
    pub max_quantity_kg: f64,
    pub lead_time_days: i64,
    /// Orders above this total raise a capacity warning
    pub large_order_warning_kg: f64,
    pub required_customer_fields: Vec<String>,
    pub required_product_fields: Vec<String>,
    pub base_documents: Vec<String>,
    pub preferred_transport: Vec<String>,
}

impl Default for OrderRules {
    fn default() -> Self {
        Self {
            min_quantity_kg: 100.0,
            max_quantity_kg: 50_000.0,
            lead_time_days: 3,
            large_order_warning_kg: 100_000.0,
            required_customer_fields: strings(&["name", "import_license", "address"]),
            required_product_fields: strings(&["meat_type", "quantity_kg", "production_date"]),
            base_documents: strings(&[
                "health_certificate",
                "customs_declaration",
                "certificate_of_origin",
            ]),
            preferred_transport: strings(&[
                "REFRIGERATED_TRUCK",
                "REFRIGERATED_CONTAINER",
                "AIR_FREIGHT",
            ]),
        }
    }
}

// ==========================================
// Cold chain
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TemperatureLimits {
    pub min: f64,
    pub max: f64,
    pub critical_min: f64,
    pub critical_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    pub sampling_interval_secs: u64,
    /// Consecutive out-of-range readings that form a violation
    pub violation_threshold: usize,
    pub trend_window: usize,
    /// Keyed by meat type (BEEF / LAMB / HORSE)
    pub limits: BTreeMap<String, TemperatureLimits>,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        let mut limits = BTreeMap::new();
        let beef = TemperatureLimits {
            min: -18.0,
            max: -15.0,
            critical_min: -20.0,
            critical_max: -12.0,
        };
        limits.insert("BEEF".to_string(), beef);
        limits.insert("LAMB".to_string(), beef);
        limits.insert(
            "HORSE".to_string(),
            TemperatureLimits {
                min: -20.0,
                max: -18.0,
                critical_min: -22.0,
                critical_max: -15.0,
            },
        );
        Self {
            sampling_interval_secs: 300,
            violation_threshold: 3,
            trend_window: 24,
            limits,
        }
    }
}

// ==========================================
// Inventory
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub low_stock_threshold_kg: f64,
    pub recent_movements_in_report: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold_kg: 50.0,
            recent_movements_in_report: 10,
        }
    }
}

// ==========================================
// Batch tracking
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// None = platform data directory
    pub database_path: Option<String>,
    pub tracking_base_url: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            tracking_base_url: "https://track.buryatmyasoprom.com/batches".to_string(),
        }
    }
}

impl BatchConfig {
    /// Database path, falling back to the user data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return PathBuf::from(path);
        }

        let mut path = PathBuf::from("./plant_ops.db");
        if let Some(data_dir) = dirs::data_dir() {
            let dir = data_dir.join("plant-ops");
            if std::fs::create_dir_all(&dir).is_ok() {
                path = dir.join("plant_ops.db");
            }
        }
        path
    }
}

// ==========================================
// Document generation
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub output_dir: String,
    /// Directory holding each template's `template_file`
    pub templates_dir: String,
    pub default_language: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            output_dir: "generated_documents".to_string(),
            templates_dir: "templates".to_string(),
            default_language: "chinese".to_string(),
        }
    }
}

// ==========================================
// Customs submission
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Additional attempts after the first one
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub api_key_header: String,
    pub signature_required: bool,
    pub status_check_interval_secs: u64,
    pub max_status_checks: u32,
    pub api_key: String,
    pub secret_key: String,
    pub exporter_tax_id: String,
    pub export_license: String,
}

impl Default for CustomsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://customs.china.gov/api/v1".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 5,
            api_key_header: "X-API-Key".to_string(),
            signature_required: true,
            status_check_interval_secs: 300,
            max_status_checks: 144,
            api_key: String::new(),
            secret_key: String::new(),
            exporter_tax_id: String::new(),
            export_license: String::new(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
