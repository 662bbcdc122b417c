// 📄 Inventory CSV - spreadsheet export and bulk import of group members
//
// One row per member. Export writes every member of every group in a family
// (the `group` column names its owner); import reads rows back into fresh
// vehicles with new identities, ready to be added to a group.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, warn};

use crate::entities::{Condition, Family, FuelType, Vehicle, VehicleGroup};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    #[serde(default)]
    pub group: String,
    pub name: String,
    pub type_tag: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub unit_value: f64,
    #[serde(default)]
    pub brand: String,
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub usage: f64,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub notes: String,
}

fn default_quantity() -> i64 {
    1
}

fn default_year() -> i32 {
    2020
}

impl InventoryRow {
    pub fn from_member(group: &VehicleGroup, member: &Vehicle) -> Self {
        InventoryRow {
            group: group.name.clone(),
            name: member.name.clone(),
            type_tag: member.type_tag.clone(),
            quantity: member.quantity,
            unit_value: member.unit_value,
            brand: member.brand.clone(),
            year: member.year,
            usage: member.usage,
            condition: member.condition.as_str().to_string(),
            fuel_type: member
                .fuel_type
                .map(|f| f.as_str().to_string())
                .unwrap_or_default(),
            notes: member.notes.clone(),
        }
    }

    /// Build a new vehicle (fresh id, fresh timestamps) from this row.
    /// Unrecognised conditions fall back to Excellent; fuel is only kept for cars.
    pub fn into_vehicle(self, family: Family) -> Vehicle {
        let condition = match Condition::parse(&self.condition) {
            Some(c) => c,
            None => {
                if !self.condition.trim().is_empty() {
                    warn!(name = %self.name, condition = %self.condition, "Unknown condition, using Excellent");
                }
                Condition::Excellent
            }
        };

        let mut vehicle = Vehicle::new(self.name, self.type_tag)
            .with_quantity(self.quantity)
            .with_value(self.unit_value)
            .with_condition(condition)
            .with_details(self.brand, self.year, self.usage)
            .with_notes(self.notes);

        if family == Family::Cars {
            vehicle.fuel_type = FuelType::parse(&self.fuel_type);
        }

        vehicle
    }
}

/// Write every member of `groups` as CSV rows. Returns the number of rows written.
pub fn export_members<W: Write>(family: Family, groups: &[VehicleGroup], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut written = 0;

    for group in groups {
        for member in &group.members {
            wtr.serialize(InventoryRow::from_member(group, member))?;
            written += 1;
        }
    }

    wtr.flush()?;
    debug!(family = family.as_str(), rows = written, "Exported inventory");
    Ok(written)
}

/// Read CSV rows into new vehicles for `family`
pub fn load_members<R: Read>(reader: R, family: Family) -> Result<Vec<Vehicle>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut vehicles = Vec::new();

    for result in rdr.deserialize() {
        let row: InventoryRow = result?;
        vehicles.push(row.into_vehicle(family));
    }

    debug!(family = family.as_str(), rows = vehicles.len(), "Loaded inventory");
    Ok(vehicles)
}

// ============================================================================
// TESTS
// ============================================================================
