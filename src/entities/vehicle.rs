// 🚗 Vehicle Entity - a single catalogued vehicle (a group member)
//
// "Identity is the UUID, everything else is a value that can be edited"
//
// Both families share this shape. The `usage` metric means mileage for cars
// and engine displacement for motorcycles; `type_tag` is the icon tag the
// catalogue assigns and is what type aggregation matches on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CONDITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
    Damaged,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
        Condition::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
            Condition::Damaged => "Damaged",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Condition::Excellent => "#10B981",
            Condition::Good => "#3B82F6",
            Condition::Fair => "#F59E0B",
            Condition::Poor => "#EF4444",
            Condition::Damaged => "#6B7280",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Condition::Excellent => "✨",
            Condition::Good => "👍",
            Condition::Fair => "⚠️",
            Condition::Poor => "🔧",
            Condition::Damaged => "💥",
        }
    }

    /// Contribution to "excellent count" queries
    pub fn excellent_weight(&self) -> i64 {
        match self {
            Condition::Excellent => 1,
            _ => 0,
        }
    }

    /// Case-insensitive parse of the display label
    pub fn parse(label: &str) -> Option<Condition> {
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

// ============================================================================
// FUEL TYPE (cars)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Gasoline,
    Diesel,
    Electric,
    Hybrid,
    Other,
}

impl FuelType {
    pub const ALL: [FuelType; 5] = [
        FuelType::Gasoline,
        FuelType::Diesel,
        FuelType::Electric,
        FuelType::Hybrid,
        FuelType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasoline => "Gasoline",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
            FuelType::Other => "Other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            FuelType::Gasoline => "⛽",
            FuelType::Diesel => "🛢️",
            FuelType::Electric => "🔌",
            FuelType::Hybrid => "🔋",
            FuelType::Other => "❓",
        }
    }

    pub fn parse(label: &str) -> Option<FuelType> {
        FuelType::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

// ============================================================================
// TYPE CATALOGUES
// ============================================================================

/// Car body types. Several types share one tag, so tag-based counts
/// group them together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarType {
    Sedan,
    Suv,
    Coupe,
    Convertible,
    Hatchback,
    Truck,
    Sports,
    Luxury,
    Other,
}

impl CarType {
    pub const ALL: [CarType; 9] = [
        CarType::Sedan,
        CarType::Suv,
        CarType::Coupe,
        CarType::Convertible,
        CarType::Hatchback,
        CarType::Truck,
        CarType::Sports,
        CarType::Luxury,
        CarType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Sedan => "Sedan",
            CarType::Suv => "SUV",
            CarType::Coupe => "Coupe",
            CarType::Convertible => "Convertible",
            CarType::Hatchback => "Hatchback",
            CarType::Truck => "Truck",
            CarType::Sports => "Sports",
            CarType::Luxury => "Luxury",
            CarType::Other => "Other",
        }
    }

    pub const fn tag(&self) -> &'static str {
        match self {
            CarType::Suv => "🚙",
            CarType::Coupe | CarType::Sports => "🏎️",
            CarType::Truck => "🚛",
            CarType::Sedan
            | CarType::Convertible
            | CarType::Hatchback
            | CarType::Luxury
            | CarType::Other => "🚗",
        }
    }

    pub fn default_brand(&self) -> &'static str {
        match self {
            CarType::Sedan => "Toyota",
            CarType::Suv => "Honda",
            CarType::Coupe => "BMW",
            CarType::Convertible => "Mazda",
            CarType::Hatchback => "Volkswagen",
            CarType::Truck => "Ford",
            CarType::Sports => "Ferrari",
            CarType::Luxury => "Mercedes-Benz",
            CarType::Other => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotorcycleType {
    Sport,
    Cruiser,
    Touring,
    Dirt,
    Street,
    Chopper,
    Scooter,
    Adventure,
    Other,
}

impl MotorcycleType {
    pub const ALL: [MotorcycleType; 9] = [
        MotorcycleType::Sport,
        MotorcycleType::Cruiser,
        MotorcycleType::Touring,
        MotorcycleType::Dirt,
        MotorcycleType::Street,
        MotorcycleType::Chopper,
        MotorcycleType::Scooter,
        MotorcycleType::Adventure,
        MotorcycleType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MotorcycleType::Sport => "Sport",
            MotorcycleType::Cruiser => "Cruiser",
            MotorcycleType::Touring => "Touring",
            MotorcycleType::Dirt => "Dirt",
            MotorcycleType::Street => "Street",
            MotorcycleType::Chopper => "Chopper",
            MotorcycleType::Scooter => "Scooter",
            MotorcycleType::Adventure => "Adventure",
            MotorcycleType::Other => "Other",
        }
    }

    pub const fn tag(&self) -> &'static str {
        match self {
            MotorcycleType::Sport => "🏎️",
            MotorcycleType::Cruiser | MotorcycleType::Other => "🏍️",
            MotorcycleType::Touring => "🛣️",
            MotorcycleType::Dirt => "🏔️",
            MotorcycleType::Street => "🏙️",
            MotorcycleType::Chopper => "🔥",
            MotorcycleType::Scooter => "🛵",
            MotorcycleType::Adventure => "🌍",
        }
    }

    pub fn default_brand(&self) -> &'static str {
        match self {
            MotorcycleType::Sport => "Yamaha",
            MotorcycleType::Cruiser => "Harley-Davidson",
            MotorcycleType::Touring => "Honda",
            MotorcycleType::Dirt => "KTM",
            MotorcycleType::Street => "Kawasaki",
            MotorcycleType::Chopper => "Custom",
            MotorcycleType::Scooter => "Vespa",
            MotorcycleType::Adventure => "BMW",
            MotorcycleType::Other => "Unknown",
        }
    }
}

// ============================================================================
// VEHICLE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identity - assigned once, never reused
    pub id: Uuid,

    pub name: String,

    /// Icon tag (e.g. "🚗"); type aggregation matches on this
    pub type_tag: String,

    /// Units owned; expected >= 1 but not enforced
    pub quantity: i64,

    /// Estimated value of one unit
    pub unit_value: f64,

    pub brand: String,
    pub year: i32,

    /// Mileage (cars) or engine displacement (motorcycles)
    pub usage: f64,

    pub condition: Condition,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,

    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Create a vehicle with a fresh identity and the catalogue defaults
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        let now = Utc::now();

        Vehicle {
            id: Uuid::new_v4(),
            name: name.into(),
            type_tag: type_tag.into(),
            quantity: 1,
            unit_value: 0.0,
            brand: String::new(),
            year: 2020,
            usage: 0.0,
            condition: Condition::Excellent,
            fuel_type: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Car from the catalogue: tag and default brand come from the type
    pub fn car(name: impl Into<String>, car_type: CarType) -> Self {
        let mut car = Self::new(name, car_type.tag());
        car.brand = car_type.default_brand().to_string();
        car.fuel_type = Some(FuelType::Gasoline);
        car
    }

    pub fn motorcycle(name: impl Into<String>, motorcycle_type: MotorcycleType) -> Self {
        let mut bike = Self::new(name, motorcycle_type.tag());
        bike.brand = motorcycle_type.default_brand().to_string();
        bike
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_value(mut self, unit_value: f64) -> Self {
        self.unit_value = unit_value;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_details(mut self, brand: impl Into<String>, year: i32, usage: f64) -> Self {
        self.brand = brand.into();
        self.year = year;
        self.usage = usage;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// `unit_value × quantity`, recomputed on every call
    pub fn total_value(&self) -> f64 {
        self.unit_value * self.quantity as f64
    }

    /// Refresh `updated_at` without ever moving it backwards
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
