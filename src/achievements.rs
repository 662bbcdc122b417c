// 🏆 Achievement Engine - Rules as Data
//
// A fixed table of milestone rules evaluated against aggregation outputs.
// State is derived, never stored:
//   measure  = metric(garage)
//   unlocked = measure >= target
//   progress = min(measure, target)
// There is no "unlock moment"; callers that want one diff two evaluations.

use serde::{Deserialize, Serialize};

use crate::entities::{CarType, Condition, Family, Garage, MotorcycleType};
use crate::stats;

/// Unit value from which a car counts as luxury
pub const LUXURY_MIN_VALUE: f64 = 100_000.0;

/// Divisor for the collection value milestone
pub const MILLION: f64 = 1_000_000.0;

// ============================================================================
// RARITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    pub fn medal(&self) -> &'static str {
        match self {
            Rarity::Common => "🥉",
            Rarity::Rare => "🥈",
            Rarity::Epic => "🥇",
            Rarity::Legendary => "💎",
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// What a rule measures. Every variant is computed from `stats`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// Total member quantity in one family
    FamilyCount(Family),
    /// Number of groups in one family
    GroupCount(Family),
    /// Whole millions of combined value across both families
    CombinedValueMillions,
    /// Quantity in a condition across both families
    CombinedCondition(Condition),
    /// Distinct type tags across both families
    UniqueTypes,
    /// Total member quantity across both families
    CombinedCount,
    /// Quantity in one family with a tag and a minimum unit value
    TaggedAbove {
        family: Family,
        tag: &'static str,
        min_value: f64,
    },
    /// Quantity in one family with a tag
    Tagged { family: Family, tag: &'static str },
}

impl Metric {
    pub fn measure(&self, garage: &Garage) -> i64 {
        match *self {
            Metric::FamilyCount(family) => stats::total_count(garage.groups(family)),
            Metric::GroupCount(family) => garage.groups(family).len() as i64,
            Metric::CombinedValueMillions => (stats::combined_value(garage) / MILLION).floor() as i64,
            Metric::CombinedCondition(condition) => stats::combined_condition_count(garage, condition),
            Metric::UniqueTypes => stats::unique_type_count(garage) as i64,
            Metric::CombinedCount => stats::combined_count(garage),
            Metric::TaggedAbove {
                family,
                tag,
                min_value,
            } => stats::count_by_type_above(garage.groups(family), tag, min_value),
            Metric::Tagged { family, tag } => stats::count_by_type(garage.groups(family), tag),
        }
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: Rarity,
    pub metric: Metric,
    /// Progress denominator; unlocked once the measure reaches it
    pub target: i64,
}

impl AchievementRule {
    pub fn evaluate(&self, garage: &Garage) -> AchievementStatus {
        let measure = self.metric.measure(garage);

        AchievementStatus {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            rarity: self.rarity,
            unlocked: measure >= self.target,
            progress: measure.min(self.target),
            target: self.target,
        }
    }
}

/// The milestone table. Fixed; not user-configurable.
pub const RULES: &[AchievementRule] = &[
    AchievementRule {
        id: "first_car",
        title: "First Ride",
        description: "Add your first car to any collection",
        icon: "🚗",
        rarity: Rarity::Common,
        metric: Metric::FamilyCount(Family::Cars),
        target: 1,
    },
    AchievementRule {
        id: "first_bike",
        title: "Speed Demon",
        description: "Add your first motorcycle to any collection",
        icon: "🏍️",
        rarity: Rarity::Common,
        metric: Metric::FamilyCount(Family::Motorcycles),
        target: 1,
    },
    AchievementRule {
        id: "car_collector",
        title: "Car Collector",
        description: "Create 3 car collections",
        icon: "🏆",
        rarity: Rarity::Rare,
        metric: Metric::GroupCount(Family::Cars),
        target: 3,
    },
    AchievementRule {
        id: "bike_collector",
        title: "Bike Enthusiast",
        description: "Create 3 motorcycle collections",
        icon: "⚡",
        rarity: Rarity::Rare,
        metric: Metric::GroupCount(Family::Motorcycles),
        target: 3,
    },
    AchievementRule {
        id: "valuable_collection",
        title: "Millionaire",
        description: "Reach $1M total collection value",
        icon: "💰",
        rarity: Rarity::Epic,
        metric: Metric::CombinedValueMillions,
        target: 1,
    },
    AchievementRule {
        id: "excellent_condition",
        title: "Perfectionist",
        description: "Have 10 vehicles in excellent condition",
        icon: "✨",
        rarity: Rarity::Rare,
        metric: Metric::CombinedCondition(Condition::Excellent),
        target: 10,
    },
    AchievementRule {
        id: "diverse_collection",
        title: "Diversity Master",
        description: "Own vehicles of 5 different types",
        icon: "🌈",
        rarity: Rarity::Epic,
        metric: Metric::UniqueTypes,
        target: 5,
    },
    AchievementRule {
        id: "veteran_collector",
        title: "Veteran Collector",
        description: "Own 50 total vehicles",
        icon: "🎖️",
        rarity: Rarity::Legendary,
        metric: Metric::CombinedCount,
        target: 50,
    },
    AchievementRule {
        id: "luxury_owner",
        title: "Luxury Owner",
        description: "Own 5 luxury cars",
        icon: "👑",
        rarity: Rarity::Epic,
        metric: Metric::TaggedAbove {
            family: Family::Cars,
            tag: CarType::Luxury.tag(),
            min_value: LUXURY_MIN_VALUE,
        },
        target: 5,
    },
    AchievementRule {
        id: "speed_king",
        title: "Speed King",
        description: "Own 5 sport motorcycles",
        icon: "🏎️",
        rarity: Rarity::Epic,
        metric: Metric::Tagged {
            family: Family::Motorcycles,
            tag: MotorcycleType::Sport.tag(),
        },
        target: 5,
    },
];

// ============================================================================
// EVALUATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub rarity: Rarity,
    pub unlocked: bool,
    pub progress: i64,
    pub target: i64,
}

impl AchievementStatus {
    pub fn summary(&self) -> String {
        format!(
            "{} {} [{}] {}/{}{}",
            self.icon,
            self.title,
            self.rarity.as_str(),
            self.progress,
            self.target,
            if self.unlocked { " ✓" } else { "" }
        )
    }
}

/// Evaluate every rule, in table order
pub fn evaluate(garage: &Garage) -> Vec<AchievementStatus> {
    RULES.iter().map(|rule| rule.evaluate(garage)).collect()
}

pub fn evaluate_one(id: &str, garage: &Garage) -> Option<AchievementStatus> {
    RULES
        .iter()
        .find(|rule| rule.id == id)
        .map(|rule| rule.evaluate(garage))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSummary {
    pub unlocked: usize,
    pub total: usize,
    /// Whole percent unlocked
    pub percent: u32,
}

impl AchievementSummary {
    pub fn from_statuses(statuses: &[AchievementStatus]) -> Self {
        let unlocked = statuses.iter().filter(|s| s.unlocked).count();
        let total = statuses.len();
        let percent = if total == 0 {
            0
        } else {
            (unlocked * 100 / total) as u32
        };

        AchievementSummary {
            unlocked,
            total,
            percent,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
