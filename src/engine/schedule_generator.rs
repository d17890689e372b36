// ==========================================
// Plant operations - production schedule generator
// ==========================================
// 1) raw material check per fish type
// 2) equipment hour check per equipment type
// 3) sort by (priority, processing time)
// 4) first-fit per day over the horizon
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::equipment::Equipment;
use crate::domain::production::{ProductionOrder, RawMaterial};
use crate::domain::types::{EquipmentStatus, EquipmentType};
use crate::engine::dates::{add_duration, duration_from_hours};
use crate::engine::equipment_allocator::default_fleet;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::round_to;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};


/// Standard processing time (hours) per product type
pub fn standard_processing_time(product_type: &str) -> Option<f64> {
    match product_type {
        "SMOKED_OMUL" => Some(8.0),
        "FROZEN_OMUL" => Some(2.0),
        "SMOKED_SIG" => Some(7.0),
        "FROZEN_SIG" => Some(2.0),
        "DRIED_GRAYLING" => Some(24.0),
        _ => None,
    }
}

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct MaterialCheck {
    pub sufficient: bool,
    pub missing: BTreeMap<String, f64>,
    pub required: BTreeMap<String, f64>,
    pub available: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityDeficit {
    pub required_hours: f64,
    pub available_hours: f64,
    pub deficit_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityCheck {
    pub sufficient: bool,
    pub bottlenecks: BTreeMap<String, CapacityDeficit>,
    pub requirements: BTreeMap<String, f64>,
    pub available: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledOrder {
    pub order_reference: String,
    pub product_type: String,
    pub quantity_kg: f64,
    pub scheduled_date: NaiveDate,
    /// HH:MM on `scheduled_date`
    pub start_time: String,
    /// HH:MM on `scheduled_date`; a slot ending at midnight shows "24:00"
    pub end_time: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub assigned_equipment: String,
    pub processing_time_hours: f64,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnscheduledOrder {
    pub product_type: String,
    pub quantity_kg: f64,
    pub priority: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductSummary {
    pub quantity: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    pub total_orders: usize,
    pub total_quantity_kg: f64,
    pub total_processing_hours: f64,
    pub products_summary: BTreeMap<String, ProductSummary>,
    pub schedule_days: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentUsage {
    pub used_hours: f64,
    pub available_hours: f64,
    pub utilization_rate: f64,
    pub status: EquipmentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResult {
    pub schedule: Vec<ScheduledOrder>,
    pub unscheduled: Vec<UnscheduledOrder>,
    pub summary: ScheduleSummary,
    pub equipment_utilization: BTreeMap<String, EquipmentUsage>,
}

// ==========================================
// ScheduleGenerator
// ==========================================
pub struct ScheduleGenerator {
    config: ScheduleConfig,
    equipment: Vec<Equipment>,
}

impl ScheduleGenerator {
    pub fn new(config: ScheduleConfig, equipment: Vec<Equipment>) -> Self {
        Self { config, equipment }
    }

    /// Generator over the standard fleet with every packaging line up
    pub fn with_default_fleet(config: ScheduleConfig, now: NaiveDateTime) -> Self {
        let mut fleet = default_fleet(now);
        for unit in fleet.iter_mut() {
            if unit.equipment_id == "PACKAGING-01" {
                unit.status = EquipmentStatus::Available;
                unit.current_utilization = 0.0;
            }
        }
        Self::new(config, fleet)
    }

    /// Generate a production schedule
    ///
    /// # Arguments
    /// - `orders`: production orders
    /// - `materials`: raw material on hand
    /// - `horizon_days`: None = configured default horizon
    /// - `start`: first schedule day (date part used)
    ///
    /// # Returns
    /// - Err(Config) when the shift window does not fit in one day
    /// - Err(InvalidInput) for a negative or non-finite processing time
    /// - Err(InsufficientRawMaterials) / Err(InsufficientEquipmentCapacity) when
    ///   the pre-checks fail; no partial schedule is produced in that case
    #[instrument(skip_all, fields(orders = orders.len()))]
    pub fn generate(
        &self,
        orders: &[ProductionOrder],
        materials: &[RawMaterial],
        horizon_days: Option<u32>,
        start: NaiveDateTime,
    ) -> EngineResult<ScheduleResult> {
        self.config.validate()?;
        let horizon = horizon_days.unwrap_or(self.config.default_horizon_days);
        for order in orders {
            duration_from_hours(order.processing_time_hours)?;
        }

        let material_check = self.validate_raw_materials(orders, materials);
        if !material_check.sufficient {
            warn!(missing = ?material_check.missing, "insufficient raw materials");
            return Err(EngineError::InsufficientRawMaterials {
                missing: material_check.missing,
            });
        }

        let capacity_check = self.validate_equipment_capacity(orders);
        if !capacity_check.sufficient {
            warn!(bottlenecks = ?capacity_check.bottlenecks.keys().collect::<Vec<_>>(), "insufficient equipment capacity");
            return Err(EngineError::InsufficientEquipmentCapacity {
                bottlenecks: capacity_check.bottlenecks,
            });
        }

        let (schedule, unscheduled) = self.place_orders(orders, horizon, start.date())?;

        info!(
            scheduled = schedule.len(),
            unscheduled = unscheduled.len(),
            horizon,
            "schedule generated"
        );

        Ok(ScheduleResult {
            summary: summarize(&schedule),
            equipment_utilization: self.equipment_usage(&schedule, horizon),
            schedule,
            unscheduled,
        })
    }

    /// Required vs available kilograms per fish type
    pub fn validate_raw_materials(
        &self,
        orders: &[ProductionOrder],
        materials: &[RawMaterial],
    ) -> MaterialCheck {
        let mut required: BTreeMap<String, f64> = BTreeMap::new();
        for order in orders {
            *required.entry(order.fish_type().to_string()).or_default() += order.quantity_kg;
        }

        let mut available: BTreeMap<String, f64> = BTreeMap::new();
        for material in materials {
            *available.entry(material.fish_type.clone()).or_default() += material.quantity_kg;
        }

        let missing: BTreeMap<String, f64> = required
            .iter()
            .filter_map(|(fish, req)| {
                let have = available.get(fish).copied().unwrap_or(0.0);
                (*req > have).then(|| (fish.clone(), req - have))
            })
            .collect();

        MaterialCheck {
            sufficient: missing.is_empty(),
            missing,
            required,
            available,
        }
    }

    /// Required processing hours vs one operating day per available unit
    pub fn validate_equipment_capacity(&self, orders: &[ProductionOrder]) -> CapacityCheck {
        let mut requirements: BTreeMap<String, f64> = BTreeMap::new();
        for order in orders {
            for eq_type in &order.equipment_requirements {
                *requirements.entry(eq_type.to_string()).or_default() +=
                    order.processing_time_hours;
            }
        }

        let mut available: BTreeMap<String, f64> = BTreeMap::new();
        for unit in self.available_units() {
            *available.entry(unit.equipment_type.to_string()).or_default() +=
                self.config.operating_hours_per_day;
        }

        let bottlenecks: BTreeMap<String, CapacityDeficit> = requirements
            .iter()
            .filter_map(|(eq_type, req)| {
                let have = available.get(eq_type).copied().unwrap_or(0.0);
                (*req > have).then(|| {
                    (
                        eq_type.clone(),
                        CapacityDeficit {
                            required_hours: *req,
                            available_hours: have,
                            deficit_hours: req - have,
                        },
                    )
                })
            })
            .collect();

        CapacityCheck {
            sufficient: bottlenecks.is_empty(),
            bottlenecks,
            requirements,
            available,
        }
    }

    // ==========================================
    // Placement
    // ==========================================

    fn available_units(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment
            .iter()
            .filter(|e| e.status == EquipmentStatus::Available)
    }

    fn place_orders(
        &self,
        orders: &[ProductionOrder],
        horizon: u32,
        first_day: NaiveDate,
    ) -> EngineResult<(Vec<ScheduledOrder>, Vec<UnscheduledOrder>)> {
        let mut sorted: Vec<&ProductionOrder> = orders.iter().collect();
        // Stable: equal keys keep input order
        sorted.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.processing_time_hours.total_cmp(&b.processing_time_hours))
        });

        // (equipment_id, day) -> booked hours
        let mut booked: HashMap<(String, NaiveDate), f64> = HashMap::new();
        let mut schedule = Vec::new();
        let mut unscheduled = Vec::new();
        let shift_start = NaiveTime::from_hms_opt(self.config.shift_start_hour, 0, 0)
            .ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "shift_start_hour {} is not a time of day",
                    self.config.shift_start_hour
                ))
            })?;

        for order in sorted {
            match self.find_slot(order, horizon, first_day, &booked) {
                Some((equipment_id, day, already)) => {
                    let start =
                        add_duration(day.and_time(shift_start), duration_from_hours(already)?)?;
                    let end =
                        add_duration(start, duration_from_hours(order.processing_time_hours)?)?;
                    booked.insert(
                        (equipment_id.clone(), day),
                        already + order.processing_time_hours,
                    );

                    let sequence = schedule.len() + 1;
                    debug!(product = %order.product_type, %equipment_id, %day, "order placed");
                    schedule.push(ScheduledOrder {
                        order_reference: format!(
                            "PROD-{}-{}",
                            first_day.format("%Y%m%d"),
                            sequence
                        ),
                        product_type: order.product_type.clone(),
                        quantity_kg: order.quantity_kg,
                        scheduled_date: day,
                        start_time: clock_label(day, start),
                        end_time: clock_label(day, end),
                        starts_at: start,
                        ends_at: end,
                        assigned_equipment: equipment_id,
                        processing_time_hours: order.processing_time_hours,
                        priority: order.priority,
                    });
                }
                None => {
                    warn!(product = %order.product_type, "order does not fit the horizon");
                    unscheduled.push(UnscheduledOrder {
                        product_type: order.product_type.clone(),
                        quantity_kg: order.quantity_kg,
                        priority: order.priority,
                        reason: format!(
                            "no equipment slot of {}h within {} days",
                            order.processing_time_hours, horizon
                        ),
                    });
                }
            }
        }

        Ok((schedule, unscheduled))
    }

    /// First (day, unit) with room for the order; returns hours already booked
    fn find_slot(
        &self,
        order: &ProductionOrder,
        horizon: u32,
        first_day: NaiveDate,
        booked: &HashMap<(String, NaiveDate), f64>,
    ) -> Option<(String, NaiveDate, f64)> {
        for offset in 0..horizon {
            let day = first_day + Duration::days(offset as i64);
            for unit in self.available_units() {
                if !order.equipment_requirements.contains(&unit.equipment_type) {
                    continue;
                }
                let already = booked
                    .get(&(unit.equipment_id.clone(), day))
                    .copied()
                    .unwrap_or(0.0);
                if already + order.processing_time_hours <= self.config.operating_hours_per_day {
                    return Some((unit.equipment_id.clone(), day, already));
                }
            }
        }
        None
    }

    fn equipment_usage(
        &self,
        schedule: &[ScheduledOrder],
        horizon: u32,
    ) -> BTreeMap<String, EquipmentUsage> {
        let mut used: HashMap<&str, f64> = HashMap::new();
        for entry in schedule {
            *used.entry(entry.assigned_equipment.as_str()).or_default() +=
                entry.processing_time_hours;
        }

        let available_hours = self.config.operating_hours_per_day * horizon as f64;
        self.available_units()
            .map(|unit| {
                let used_hours = used.get(unit.equipment_id.as_str()).copied().unwrap_or(0.0);
                let rate = if available_hours > 0.0 {
                    used_hours / available_hours * 100.0
                } else {
                    0.0
                };
                (
                    unit.equipment_id.clone(),
                    EquipmentUsage {
                        used_hours,
                        available_hours,
                        utilization_rate: round_to(rate, 1),
                        status: unit.status,
                    },
                )
            })
            .collect()
    }
}

/// HH:MM measured from midnight of `day`, so midnight after it reads "24:00"
fn clock_label(day: NaiveDate, at: NaiveDateTime) -> String {
    let minutes = (at - day.and_time(NaiveTime::MIN)).num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn summarize(schedule: &[ScheduledOrder]) -> ScheduleSummary {
    let mut products: BTreeMap<String, ProductSummary> = BTreeMap::new();
    for entry in schedule {
        let p = products.entry(entry.product_type.clone()).or_default();
        p.quantity += entry.quantity_kg;
        p.orders += 1;
    }
    let days: BTreeSet<NaiveDate> = schedule.iter().map(|e| e.scheduled_date).collect();

    ScheduleSummary {
        total_orders: schedule.len(),
        total_quantity_kg: schedule.iter().map(|e| e.quantity_kg).sum(),
        total_processing_hours: schedule.iter().map(|e| e.processing_time_hours).sum(),
        products_summary: products,
        schedule_days: days.len(),
    }
}

/// Equipment types named by a product's processing route
pub fn default_requirements(product_type: &str) -> Vec<EquipmentType> {
    if product_type.starts_with("SMOKED") {
        vec![EquipmentType::Smoker, EquipmentType::Packaging]
    } else if product_type.starts_with("FROZEN") {
        vec![EquipmentType::Freezer, EquipmentType::Packaging]
    } else {
        vec![EquipmentType::Smoker]
    }
}
