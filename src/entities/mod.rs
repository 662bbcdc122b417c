// Entity Models
// Identity persists, values change.
//
// Each entity has:
// - Stable identity (UUID) assigned once at creation
// - Editable values with created/updated timestamps
// - Vehicles belong to exactly one group; groups belong to one family

pub mod group;
pub mod vehicle;

pub use group::{Family, Garage, VehicleGroup};
pub use vehicle::{CarType, Condition, FuelType, MotorcycleType, Vehicle};
