// ==========================================
// Plant operations - equipment allocator
// ==========================================
// Scores the suitable units of an in-memory fleet and assigns
// the best one to a production task.
//
// Score (0-100):
//   40 * idle share
// + 30 * closeness of load ratio to 80%
// + 20 * maintenance freshness (30-day scale)
// + 10 * location factor (constant 1.0)
// ==========================================

use crate::domain::equipment::{Equipment, ProductionTask};
use crate::domain::types::{EquipmentStatus, EquipmentType};
use crate::engine::dates::{add_duration, duration_from_hours};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{generate_id, round_to};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

const UTILIZATION_WEIGHT: f64 = 40.0;
const CAPACITY_WEIGHT: f64 = 30.0;
const MAINTENANCE_WEIGHT: f64 = 20.0;
const LOCATION_WEIGHT: f64 = 10.0;
const IDEAL_LOAD_RATIO: f64 = 0.8;
const MAINTENANCE_SCALE_DAYS: f64 = 30.0;

// ==========================================
// Output types
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct AllocatedEquipment {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub capacity_kg: f64,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub allocation_id: String,
    pub task_id: String,
    pub product_type: String,
    pub quantity_kg: f64,
    pub allocated_equipment: AllocatedEquipment,
    pub score: f64,
    pub scheduled_duration_hours: f64,
    pub expected_completion: NaiveDateTime,
    pub utilization_percentage: f64,
    pub allocation_time: NaiveDateTime,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bottleneck {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub utilization: f64,
    pub status: String, // HIGH_UTILIZATION / UNDER_MAINTENANCE
}

#[derive(Debug, Clone, Serialize)]
pub struct UtilizationMetrics {
    pub total_equipment: usize,
    pub available_equipment: usize,
    pub in_use_equipment: usize,
    pub under_maintenance: usize,
    pub overall_utilization_rate: f64,
    pub utilization_by_type: BTreeMap<EquipmentType, f64>,
    pub bottleneck_equipment: Vec<Bottleneck>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationOutcome {
    pub allocation: Allocation,
    pub equipment_utilization: UtilizationMetrics,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentDetail {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub status: EquipmentStatus,
    pub utilization: f64,
    pub capacity_kg: f64,
    pub location: String,
    pub next_maintenance: NaiveDateTime,
    pub maintenance_due_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentStatusReport {
    pub report_id: String,
    pub generated_at: NaiveDateTime,
    pub equipment_summary: UtilizationMetrics,
    pub detailed_equipment_status: Vec<EquipmentDetail>,
    pub maintenance_recommendations: Vec<String>,
}

// ==========================================
// EquipmentAllocator
// ==========================================
pub struct EquipmentAllocator {
    equipment: Vec<Equipment>,
}

impl EquipmentAllocator {
    /// Build an allocator over an explicit fleet
    pub fn new(equipment: Vec<Equipment>) -> Self {
        Self { equipment }
    }

    /// Build an allocator over the standard plant fleet
    pub fn with_default_fleet(now: NaiveDateTime) -> Self {
        Self::new(default_fleet(now))
    }

    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    // ==========================================
    // Allocation
    // ==========================================

    /// Allocate the best suited unit to a task
    ///
    /// # Arguments
    /// - `task`: production task
    /// - `now`: allocation time
    ///
    /// # Returns
    /// - Ok(AllocationOutcome): allocation record, fleet metrics, recommendations
    /// - Err(NoSuitableEquipment): no unit passes the suitability filter
    /// - Err(InvalidInput): duration is negative, non-finite or runs past the date range
    #[instrument(skip(self, task), fields(task_id = %task.task_id))]
    pub fn allocate(
        &mut self,
        task: &ProductionTask,
        now: NaiveDateTime,
    ) -> EngineResult<AllocationOutcome> {
        let duration = duration_from_hours(task.estimated_duration_hours)?;
        let finish = add_duration(now, duration)?;

        let mut best: Option<(usize, f64)> = None;
        for (idx, equipment) in self.equipment.iter().enumerate() {
            if !is_suitable(equipment, task, finish) {
                continue;
            }
            let score = equipment_score(equipment, task, now);
            debug!(equipment_id = %equipment.equipment_id, score, "candidate");
            // Strictly greater: ties keep fleet order
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        let (idx, score) = best.ok_or_else(|| EngineError::NoSuitableEquipment {
            product_type: task.product_type.clone(),
        })?;

        let chosen = self.equipment[idx].clone();
        let load_pct = task.quantity_kg / chosen.capacity_kg * 100.0;

        let allocation = Allocation {
            allocation_id: generate_id("ALLOC", now),
            task_id: task.task_id.clone(),
            product_type: task.product_type.clone(),
            quantity_kg: task.quantity_kg,
            allocated_equipment: AllocatedEquipment {
                equipment_id: chosen.equipment_id.clone(),
                equipment_type: chosen.equipment_type,
                capacity_kg: chosen.capacity_kg,
                location: chosen.location.clone(),
            },
            score,
            scheduled_duration_hours: task.estimated_duration_hours,
            expected_completion: finish,
            utilization_percentage: round_to(load_pct, 1),
            allocation_time: now,
            priority: task.priority,
        };

        {
            let unit = &mut self.equipment[idx];
            unit.status = EquipmentStatus::InUse;
            unit.current_utilization = load_pct;
        }

        info!(
            equipment_id = %chosen.equipment_id,
            score,
            utilization = round_to(load_pct, 1),
            "equipment allocated"
        );

        Ok(AllocationOutcome {
            allocation,
            equipment_utilization: self.utilization_metrics(),
            recommendations: allocation_recommendations(task, &chosen, now),
        })
    }

    /// Return a unit to the available pool
    pub fn release(&mut self, equipment_id: &str) -> EngineResult<()> {
        let unit = self
            .equipment
            .iter_mut()
            .find(|e| e.equipment_id == equipment_id)
            .ok_or_else(|| EngineError::EquipmentNotFound(equipment_id.to_string()))?;
        unit.status = EquipmentStatus::Available;
        unit.current_utilization = 0.0;
        info!(equipment_id, "equipment released");
        Ok(())
    }

    // ==========================================
    // Metrics / reports
    // ==========================================

    pub fn utilization_metrics(&self) -> UtilizationMetrics {
        let total = self.equipment.len();
        let count = |status: EquipmentStatus| {
            self.equipment.iter().filter(|e| e.status == status).count()
        };

        let overall = if total == 0 {
            0.0
        } else {
            self.equipment.iter().map(|e| e.current_utilization).sum::<f64>() / total as f64
        };

        let mut by_type: BTreeMap<EquipmentType, Vec<f64>> = BTreeMap::new();
        for e in &self.equipment {
            by_type
                .entry(e.equipment_type)
                .or_default()
                .push(e.current_utilization);
        }
        let utilization_by_type = by_type
            .into_iter()
            .map(|(t, values)| {
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                (t, round_to(avg, 1))
            })
            .collect();

        UtilizationMetrics {
            total_equipment: total,
            available_equipment: count(EquipmentStatus::Available),
            in_use_equipment: count(EquipmentStatus::InUse),
            under_maintenance: count(EquipmentStatus::Maintenance),
            overall_utilization_rate: round_to(overall, 1),
            utilization_by_type,
            bottleneck_equipment: self.bottlenecks(),
        }
    }

    fn bottlenecks(&self) -> Vec<Bottleneck> {
        self.equipment
            .iter()
            .filter_map(|e| {
                let status = match e.status {
                    EquipmentStatus::InUse if e.current_utilization > 90.0 => "HIGH_UTILIZATION",
                    EquipmentStatus::Maintenance => "UNDER_MAINTENANCE",
                    _ => return None,
                };
                Some(Bottleneck {
                    equipment_id: e.equipment_id.clone(),
                    equipment_type: e.equipment_type,
                    utilization: e.current_utilization,
                    status: status.to_string(),
                })
            })
            .collect()
    }

    pub fn status_report(&self, now: NaiveDateTime) -> EquipmentStatusReport {
        let detailed = self
            .equipment
            .iter()
            .map(|e| EquipmentDetail {
                equipment_id: e.equipment_id.clone(),
                equipment_type: e.equipment_type,
                status: e.status,
                utilization: e.current_utilization,
                capacity_kg: e.capacity_kg,
                location: e.location.clone(),
                next_maintenance: e.next_maintenance,
                maintenance_due_days: e.maintenance_due_days(now),
            })
            .collect();

        EquipmentStatusReport {
            report_id: format!("EQUIP-REPORT-{}", now.format("%Y%m%d-%H%M%S")),
            generated_at: now,
            equipment_summary: self.utilization_metrics(),
            detailed_equipment_status: detailed,
            maintenance_recommendations: self.maintenance_recommendations(now),
        }
    }

    fn maintenance_recommendations(&self, now: NaiveDateTime) -> Vec<String> {
        let mut recommendations = Vec::new();
        for e in &self.equipment {
            let days = e.maintenance_due_days(now);
            if days <= 3 {
                recommendations.push(format!(
                    "URGENT: {} maintenance due in {} days",
                    e.equipment_id, days
                ));
            } else if days <= 7 {
                recommendations.push(format!(
                    "Schedule maintenance for {} within {} days",
                    e.equipment_id, days
                ));
            }

            if e.status == EquipmentStatus::InUse && e.current_utilization > 80.0 {
                recommendations.push(format!(
                    "{} running at high utilization ({:.1}%) - monitor for wear",
                    e.equipment_id, e.current_utilization
                ));
            }
        }
        recommendations
    }
}

// ==========================================
// Scoring helpers
// ==========================================

fn is_suitable(equipment: &Equipment, task: &ProductionTask, finish: NaiveDateTime) -> bool {
    task.required_equipment.contains(&equipment.equipment_type)
        && equipment.status == EquipmentStatus::Available
        && equipment.capacity_kg >= task.quantity_kg
        && equipment.next_maintenance >= finish
}

/// Selection score, rounded to 2 decimals
pub fn equipment_score(equipment: &Equipment, task: &ProductionTask, now: NaiveDateTime) -> f64 {
    let utilization_factor = (100.0 - equipment.current_utilization) / 100.0;

    let capacity_ratio = task.quantity_kg / equipment.capacity_kg;
    let capacity_efficiency = 1.0 - (capacity_ratio - IDEAL_LOAD_RATIO).abs();

    let days_since = (now - equipment.last_maintenance).num_days() as f64;
    let maintenance_factor = (1.0 - days_since / MAINTENANCE_SCALE_DAYS).max(0.0);

    let location_factor = 1.0;

    round_to(
        utilization_factor * UTILIZATION_WEIGHT
            + capacity_efficiency * CAPACITY_WEIGHT
            + maintenance_factor * MAINTENANCE_WEIGHT
            + location_factor * LOCATION_WEIGHT,
        2,
    )
}

fn allocation_recommendations(
    task: &ProductionTask,
    equipment: &Equipment,
    now: NaiveDateTime,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let utilization = round_to(task.quantity_kg / equipment.capacity_kg * 100.0, 1);
    if utilization > 90.0 {
        recommendations.push(format!(
            "High utilization ({}%) - consider splitting batch",
            utilization
        ));
    } else if utilization < 50.0 {
        recommendations.push(format!(
            "Low utilization ({}%) - consider combining with other tasks",
            utilization
        ));
    }

    let days = equipment.maintenance_due_days(now);
    if days < 7 {
        recommendations.push(format!(
            "Maintenance scheduled in {} days - plan accordingly",
            days
        ));
    }

    if task.estimated_duration_hours > 8.0 {
        recommendations.push("Long processing time - monitor equipment performance closely".to_string());
    }

    recommendations
}

/// Standard plant fleet relative to `now`
pub fn default_fleet(now: NaiveDateTime) -> Vec<Equipment> {
    let unit = |id: &str,
                equipment_type: EquipmentType,
                capacity_kg: f64,
                status: EquipmentStatus,
                utilization: f64,
                location: &str,
                last_days: i64,
                next_days: i64| Equipment {
        equipment_id: id.to_string(),
        equipment_type,
        capacity_kg,
        status,
        current_utilization: utilization,
        location: location.to_string(),
        last_maintenance: now - Duration::days(last_days),
        next_maintenance: now + Duration::days(next_days),
    };

    vec![
        unit("SMOKER-01", EquipmentType::Smoker, 200.0, EquipmentStatus::Available, 0.0, "PROCESSING_AREA_A", 15, 15),
        unit("SMOKER-02", EquipmentType::Smoker, 200.0, EquipmentStatus::Available, 0.0, "PROCESSING_AREA_A", 10, 20),
        unit("FREEZER-01", EquipmentType::Freezer, 500.0, EquipmentStatus::Available, 0.0, "COLD_STORAGE", 30, 60),
        unit("PACKAGING-01", EquipmentType::Packaging, 300.0, EquipmentStatus::InUse, 75.0, "PACKAGING_LINE", 5, 25),
        unit("PACKAGING-02", EquipmentType::Packaging, 300.0, EquipmentStatus::Maintenance, 0.0, "MAINTENANCE_BAY", 1, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn smoking_task(quantity_kg: f64, hours: f64) -> ProductionTask {
        ProductionTask {
            task_id: "TASK-001".to_string(),
            product_type: "SMOKED_OMUL".to_string(),
            quantity_kg,
            required_equipment: vec![EquipmentType::Smoker],
            estimated_duration_hours: hours,
            priority: 1,
            deadline: None,
        }
    }

    #[test]
    fn test_prefers_recently_maintained_smoker() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        let outcome = allocator.allocate(&smoking_task(150.0, 8.0), now()).unwrap();

        // SMOKER-02 was maintained 10 days ago vs 15 for SMOKER-01
        assert_eq!(outcome.allocation.allocated_equipment.equipment_id, "SMOKER-02");
        assert_eq!(outcome.allocation.utilization_percentage, 75.0);
        // 40 + 30*(1-0.05) + 20*(1-10/30) + 10
        assert!((outcome.allocation.score - 91.83).abs() < 1e-9);

        let unit = &allocator.equipment()[1];
        assert_eq!(unit.status, EquipmentStatus::InUse);
        assert!((unit.current_utilization - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_allocation_uses_remaining_unit() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        allocator.allocate(&smoking_task(150.0, 4.0), now()).unwrap();
        let second = allocator.allocate(&smoking_task(100.0, 4.0), now()).unwrap();
        assert_eq!(second.allocation.allocated_equipment.equipment_id, "SMOKER-01");

        let third = allocator.allocate(&smoking_task(100.0, 4.0), now());
        assert!(matches!(third, Err(EngineError::NoSuitableEquipment { .. })));
    }

    #[test]
    fn test_capacity_and_maintenance_filters() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        // Over capacity for every smoker
        assert!(allocator.allocate(&smoking_task(250.0, 2.0), now()).is_err());
        // SMOKER-01 maintenance in 15 days, SMOKER-02 in 20: 16 days only fits SMOKER-02
        let outcome = allocator.allocate(&smoking_task(100.0, 16.0 * 24.0), now()).unwrap();
        assert_eq!(outcome.allocation.allocated_equipment.equipment_id, "SMOKER-02");
    }

    #[test]
    fn test_unusable_duration_is_rejected() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        for hours in [1e300, f64::NAN, -2.0] {
            assert!(matches!(
                allocator.allocate(&smoking_task(100.0, hours), now()),
                Err(EngineError::InvalidInput(_))
            ));
        }
        // nothing was booked by the rejected tasks
        assert_eq!(allocator.utilization_metrics().available_equipment, 3);
    }

    #[test]
    fn test_recommendations() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        let outcome = allocator.allocate(&smoking_task(190.0, 10.0), now()).unwrap();
        assert!(outcome.recommendations.iter().any(|r| r.contains("splitting batch")));
        assert!(outcome.recommendations.iter().any(|r| r.contains("monitor equipment")));

        let outcome = allocator.allocate(&smoking_task(50.0, 2.0), now()).unwrap();
        assert!(outcome.recommendations.iter().any(|r| r.contains("combining")));
    }

    #[test]
    fn test_utilization_metrics_and_bottlenecks() {
        let allocator = EquipmentAllocator::with_default_fleet(now());
        let metrics = allocator.utilization_metrics();
        assert_eq!(metrics.total_equipment, 5);
        assert_eq!(metrics.available_equipment, 3);
        assert_eq!(metrics.in_use_equipment, 1);
        assert_eq!(metrics.under_maintenance, 1);
        assert_eq!(metrics.overall_utilization_rate, 15.0);
        assert_eq!(metrics.utilization_by_type[&EquipmentType::Packaging], 37.5);
        assert_eq!(metrics.bottleneck_equipment.len(), 1);
        assert_eq!(metrics.bottleneck_equipment[0].status, "UNDER_MAINTENANCE");
    }

    #[test]
    fn test_status_report_flags_urgent_maintenance() {
        let allocator = EquipmentAllocator::with_default_fleet(now());
        let report = allocator.status_report(now());
        assert_eq!(report.detailed_equipment_status.len(), 5);
        assert!(report
            .maintenance_recommendations
            .iter()
            .any(|r| r.starts_with("URGENT: PACKAGING-02")));
    }

    #[test]
    fn test_release_unknown_equipment() {
        let mut allocator = EquipmentAllocator::with_default_fleet(now());
        assert!(matches!(
            allocator.release("SMOKER-99"),
            Err(EngineError::EquipmentNotFound(_))
        ));
        allocator.release("PACKAGING-01").unwrap();
        assert_eq!(allocator.utilization_metrics().available_equipment, 4);
    }
}
