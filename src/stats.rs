// 📊 Aggregation Engine - statistics over a garage snapshot
//
// Pure functions: nothing is cached or persisted, every call recomputes
// from the groups it is given. Counts are integer sums of `quantity` that
// saturate at the i64 bounds; values are f64 sums of `unit_value × quantity`.
// No rounding happens here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::entities::{Condition, Family, Garage, Vehicle, VehicleGroup};

fn members(groups: &[VehicleGroup]) -> impl Iterator<Item = &Vehicle> {
    groups.iter().flat_map(|g| g.members.iter())
}

fn saturating_sum(counts: impl Iterator<Item = i64>) -> i64 {
    counts.fold(0i64, i64::saturating_add)
}

// ============================================================================
// FAMILY-WIDE AGGREGATES
// ============================================================================

/// Sum of `quantity` over every member of every group
pub fn total_count(groups: &[VehicleGroup]) -> i64 {
    saturating_sum(members(groups).map(|v| v.quantity))
}

/// Sum of `unit_value × quantity` over every member of every group
pub fn total_value(groups: &[VehicleGroup]) -> f64 {
    members(groups).map(Vehicle::total_value).sum()
}

pub fn count_by_condition(groups: &[VehicleGroup], condition: Condition) -> i64 {
    saturating_sum(
        members(groups)
            .filter(|v| v.condition == condition)
            .map(|v| v.quantity),
    )
}

/// Quantity weighted by each condition's excellent contribution
pub fn excellent_count(groups: &[VehicleGroup]) -> i64 {
    saturating_sum(
        members(groups).map(|v| v.quantity.saturating_mul(v.condition.excellent_weight())),
    )
}

/// Quantity of members whose type tag equals `tag`
pub fn count_by_type(groups: &[VehicleGroup], tag: &str) -> i64 {
    saturating_sum(
        members(groups)
            .filter(|v| v.type_tag == tag)
            .map(|v| v.quantity),
    )
}

/// Quantity of members tagged `tag` with a unit value of at least `min_value`
pub fn count_by_type_above(groups: &[VehicleGroup], tag: &str, min_value: f64) -> i64 {
    saturating_sum(
        members(groups)
            .filter(|v| v.type_tag == tag && v.unit_value >= min_value)
            .map(|v| v.quantity),
    )
}

/// Condition → quantity, every condition present (zero if unused)
pub fn condition_breakdown(groups: &[VehicleGroup]) -> Vec<(Condition, i64)> {
    Condition::ALL
        .into_iter()
        .map(|c| (c, count_by_condition(groups, c)))
        .collect()
}

/// Tag → quantity for the tags actually present
pub fn type_breakdown(groups: &[VehicleGroup]) -> BTreeMap<String, i64> {
    let mut breakdown = BTreeMap::new();
    for v in members(groups) {
        let count = breakdown.entry(v.type_tag.clone()).or_insert(0i64);
        *count = count.saturating_add(v.quantity);
    }
    breakdown
}

// ============================================================================
// PER-GROUP AGGREGATES
// ============================================================================

pub fn group_count(group: &VehicleGroup) -> i64 {
    total_count(std::slice::from_ref(group))
}

pub fn group_value(group: &VehicleGroup) -> f64 {
    total_value(std::slice::from_ref(group))
}

// ============================================================================
// CROSS-FAMILY AGGREGATES
// ============================================================================

/// Distinct type tags across both families combined
pub fn unique_type_count(garage: &Garage) -> usize {
    Family::ALL
        .iter()
        .flat_map(|family| garage.members(*family))
        .map(|v| v.type_tag.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn combined_count(garage: &Garage) -> i64 {
    Family::ALL
        .iter()
        .map(|family| total_count(garage.groups(*family)))
        .fold(0, i64::saturating_add)
}

pub fn combined_value(garage: &Garage) -> f64 {
    Family::ALL
        .iter()
        .map(|family| total_value(garage.groups(*family)))
        .sum()
}

pub fn combined_condition_count(garage: &Garage, condition: Condition) -> i64 {
    Family::ALL
        .iter()
        .map(|family| count_by_condition(garage.groups(*family), condition))
        .fold(0, i64::saturating_add)
}

// ============================================================================
// STATISTICS RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub total_count: i64,
    pub total_value: f64,
    pub excellent_count: i64,
    pub good_count: i64,
    pub type_count: usize,
}

impl GroupStatistics {
    pub fn compute(group: &VehicleGroup) -> Self {
        let groups = std::slice::from_ref(group);

        GroupStatistics {
            total_count: total_count(groups),
            total_value: total_value(groups),
            excellent_count: excellent_count(groups),
            good_count: count_by_condition(groups, Condition::Good),
            type_count: group
                .members
                .iter()
                .map(|v| v.type_tag.as_str())
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyStatistics {
    pub group_count: usize,
    pub total_count: i64,
    pub total_value: f64,
    pub excellent_count: i64,
    /// Integer average; 0 with no groups
    pub average_per_group: i64,
}

impl FamilyStatistics {
    pub fn compute(groups: &[VehicleGroup]) -> Self {
        let total = total_count(groups);

        FamilyStatistics {
            group_count: groups.len(),
            total_count: total,
            total_value: total_value(groups),
            excellent_count: excellent_count(groups),
            average_per_group: if groups.is_empty() {
                0
            } else {
                total / groups.len() as i64
            },
        }
    }
}

/// Both families side by side, plus the combined figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarageSummary {
    pub cars: FamilyStatistics,
    pub motorcycles: FamilyStatistics,
    pub combined_count: i64,
    pub combined_value: f64,
    pub unique_types: usize,
}

impl GarageSummary {
    pub fn compute(garage: &Garage) -> Self {
        GarageSummary {
            cars: FamilyStatistics::compute(&garage.cars),
            motorcycles: FamilyStatistics::compute(&garage.motorcycles),
            combined_count: combined_count(garage),
            combined_value: combined_value(garage),
            unique_types: unique_type_count(garage),
        }
    }
}

/// Presentation-only currency formatting: "$1,234,567"
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(members: Vec<Vehicle>) -> VehicleGroup {
        let mut group = VehicleGroup::new("G", "L", "");
        for m in members {
            group.add_member(m);
        }
        group
    }

    fn sample_garage() -> Garage {
        let mut garage = Garage::new();
        garage.cars.push(group_with(vec![
            Vehicle::new("Model S", "🚗").with_quantity(2).with_value(50_000.0),
            Vehicle::new("F-150", "🚛")
                .with_value(40_000.0)
                .with_condition(Condition::Good),
        ]));
        garage.cars.push(group_with(vec![
            Vehicle::new("Phantom", "🚗").with_value(2_000_000.0),
        ]));
        garage.motorcycles.push(group_with(vec![
            Vehicle::new("Panigale", "🏎️").with_quantity(3).with_value(25_000.0),
            Vehicle::new("Vespa", "🛵")
                .with_value(5_000.0)
                .with_condition(Condition::Poor),
        ]));
        garage
    }

    #[test]
    fn test_totals() {
        let garage = sample_garage();

        assert_eq!(total_count(&garage.cars), 4);
        assert_eq!(total_value(&garage.cars), 2_140_000.0);
        assert_eq!(total_count(&garage.motorcycles), 4);
        assert_eq!(total_value(&garage.motorcycles), 80_000.0);
        assert_eq!(combined_count(&garage), 8);
        assert_eq!(combined_value(&garage), 2_220_000.0);
    }

    #[test]
    fn test_empty_totals() {
        assert_eq!(total_count(&[]), 0);
        assert_eq!(total_value(&[]), 0.0);
        assert_eq!(unique_type_count(&Garage::new()), 0);
    }

    #[test]
    fn test_group_scoped_totals() {
        let garage = sample_garage();
        let first = &garage.cars[0];

        assert_eq!(group_count(first), 3);
        assert_eq!(group_value(first), 140_000.0);
    }

    #[test]
    fn test_count_by_condition() {
        let garage = sample_garage();

        assert_eq!(count_by_condition(&garage.cars, Condition::Excellent), 3);
        assert_eq!(count_by_condition(&garage.cars, Condition::Good), 1);
        assert_eq!(count_by_condition(&garage.cars, Condition::Damaged), 0);
        assert_eq!(combined_condition_count(&garage, Condition::Excellent), 6);
        assert_eq!(excellent_count(&garage.cars), 3);
    }

    #[test]
    fn test_count_by_type_matches_tag() {
        let garage = sample_garage();

        assert_eq!(count_by_type(&garage.cars, "🚗"), 3);
        assert_eq!(count_by_type(&garage.cars, "🚛"), 1);
        assert_eq!(count_by_type(&garage.cars, "🏎️"), 0);
        assert_eq!(count_by_type(&garage.motorcycles, "🏎️"), 3);
        assert_eq!(count_by_type_above(&garage.cars, "🚗", 100_000.0), 1);
    }

    #[test]
    fn test_unique_types_span_families() {
        let garage = sample_garage();

        // 🚗 🚛 (cars) + 🏎️ 🛵 (bikes)
        assert_eq!(unique_type_count(&garage), 4);

        let mut shared = Garage::new();
        shared.cars.push(group_with(vec![Vehicle::new("Coupe", "🏎️")]));
        shared.motorcycles.push(group_with(vec![Vehicle::new("R1", "🏎️")]));
        assert_eq!(unique_type_count(&shared), 1);
    }

    #[test]
    fn test_breakdowns() {
        let garage = sample_garage();

        let conditions = condition_breakdown(&garage.motorcycles);
        assert_eq!(conditions.len(), 5);
        assert_eq!(conditions[0], (Condition::Excellent, 3));
        assert_eq!(conditions[3], (Condition::Poor, 1));

        let types = type_breakdown(&garage.cars);
        assert_eq!(types.get("🚗"), Some(&3));
        assert_eq!(types.get("🚛"), Some(&1));
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_group_statistics() {
        let garage = sample_garage();
        let stats = GroupStatistics::compute(&garage.cars[0]);

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.total_value, 140_000.0);
        assert_eq!(stats.excellent_count, 2);
        assert_eq!(stats.good_count, 1);
        assert_eq!(stats.type_count, 2);
    }

    #[test]
    fn test_family_statistics() {
        let garage = sample_garage();
        let stats = FamilyStatistics::compute(&garage.cars);

        assert_eq!(stats.group_count, 2);
        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.average_per_group, 2);

        let empty = FamilyStatistics::compute(&[]);
        assert_eq!(empty.average_per_group, 0);
        assert_eq!(empty.group_count, 0);
    }

    #[test]
    fn test_garage_summary() {
        let summary = GarageSummary::compute(&sample_garage());

        assert_eq!(summary.cars.total_count, 4);
        assert_eq!(summary.motorcycles.total_count, 4);
        assert_eq!(summary.combined_value, 2_220_000.0);
        assert_eq!(summary.unique_types, 4);
    }

    #[test]
    fn test_counts_saturate_instead_of_overflowing() {
        let mut garage = Garage::new();
        garage.cars.push(group_with(vec![
            Vehicle::new("Fleet", "🚗").with_quantity(i64::MAX),
            Vehicle::new("Spare", "🚗"),
        ]));
        garage.motorcycles.push(group_with(vec![
            Vehicle::new("Swarm", "🛵").with_quantity(i64::MAX),
        ]));

        assert_eq!(total_count(&garage.cars), i64::MAX);
        assert_eq!(count_by_condition(&garage.cars, Condition::Excellent), i64::MAX);
        assert_eq!(excellent_count(&garage.cars), i64::MAX);
        assert_eq!(count_by_type(&garage.cars, "🚗"), i64::MAX);
        assert_eq!(type_breakdown(&garage.cars).get("🚗"), Some(&i64::MAX));
        assert_eq!(combined_count(&garage), i64::MAX);

        let negative = group_with(vec![
            Vehicle::new("Debt", "🚗").with_quantity(i64::MIN),
            Vehicle::new("More", "🚗").with_quantity(-1),
        ]);
        assert_eq!(group_count(&negative), i64::MIN);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(2_100_000.0), "$2,100,000");
        assert_eq!(format_currency(-12_345.0), "-$12,345");
    }
}
