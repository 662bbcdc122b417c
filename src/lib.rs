// RideRoad - Core Library
// Local garage store for vehicle groups, used by the CLI, TUI and API server

pub mod achievements;   // Milestone rules evaluated against the garage
pub mod codec;          // Collection blob encode/decode
pub mod config;         // Data directory + file locations
pub mod db;             // Settings slots (SQLite / in-memory)
pub mod entities;       // Vehicle, VehicleGroup, Family, Garage
pub mod error;
pub mod inventory_csv;  // Spreadsheet import/export
pub mod profile;        // Reset collaborators: onboarding, profile, image
pub mod stats;          // Aggregation engine
pub mod store;          // GarageStore: mutate → persist → notify

// Re-export commonly used types
pub use achievements::{
    AchievementRule, AchievementStatus, AchievementSummary, Metric, Rarity, RULES,
};
pub use config::AppConfig;
pub use db::{keys, setup_database, MemorySettings, SettingsStore, SqliteSettings};
pub use entities::{
    CarType, Condition, Family, FuelType, Garage, MotorcycleType, Vehicle, VehicleGroup,
};
pub use error::{Result, StoreError};
pub use inventory_csv::{export_members, load_members, InventoryRow};
pub use profile::{CollectorProfile, OnboardingState, ProfileImage, ResetCollaborator};
pub use stats::{FamilyStatistics, GarageSummary, GroupStatistics};
pub use store::{
    CollaboratorSettings, EventType, GarageStore, Observer, StoreEvent, SubscriptionId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
