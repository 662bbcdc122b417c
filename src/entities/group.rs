// 🏠 Vehicle Group Entity - a named, located collection of vehicles
//
// A group owns its members: deleting the group deletes them too.
// `updated_at` moves forward on every member change and never back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vehicle::Vehicle;
use crate::db::keys;

// ============================================================================
// FAMILY
// ============================================================================

/// The two parallel entity families. Each is stored, aggregated and
/// rewarded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Four-wheeled vehicles
    Cars,
    /// Two-wheeled vehicles
    Motorcycles,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Cars, Family::Motorcycles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Cars => "cars",
            Family::Motorcycles => "motorcycles",
        }
    }

    /// Settings key holding this family's encoded collection
    pub fn storage_key(&self) -> &'static str {
        match self {
            Family::Cars => keys::CAR_COLLECTIONS,
            Family::Motorcycles => keys::MOTORCYCLE_COLLECTIONS,
        }
    }

    /// What `Vehicle::usage` measures in this family
    pub fn usage_label(&self) -> &'static str {
        match self {
            Family::Cars => "Mileage",
            Family::Motorcycles => "Engine size",
        }
    }

    pub fn parse(value: &str) -> Option<Family> {
        match value.trim().to_lowercase().as_str() {
            "cars" | "car" => Some(Family::Cars),
            "motorcycles" | "motorcycle" | "bikes" | "bike" => Some(Family::Motorcycles),
            _ => None,
        }
    }
}

// ============================================================================
// VEHICLE GROUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleGroup {
    /// Stable identity - NEVER changes
    pub id: Uuid,

    pub name: String,
    pub location: String,
    pub description: String,

    /// Insertion order is kept for display
    pub members: Vec<Vehicle>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VehicleGroup {
    /// Create an empty group with a fresh identity
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        VehicleGroup {
            id: Uuid::new_v4(),
            name: name.into(),
            location: location.into(),
            description: description.into(),
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn member(&self, member_id: Uuid) -> Option<&Vehicle> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn contains_member(&self, member_id: Uuid) -> bool {
        self.member(member_id).is_some()
    }

    pub fn add_member(&mut self, member: Vehicle) {
        self.members.push(member);
        self.touch();
    }

    /// Replace the member with the same id. Returns false when absent.
    pub fn update_member(&mut self, mut member: Vehicle) -> bool {
        let Some(slot) = self.members.iter_mut().find(|m| m.id == member.id) else {
            return false;
        };

        member.created_at = slot.created_at;
        if member.updated_at < slot.updated_at {
            member.updated_at = slot.updated_at;
        }
        member.touch();

        *slot = member;
        self.touch();
        true
    }

    /// Remove the member with `member_id`. Returns false when absent.
    pub fn remove_member(&mut self, member_id: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != member_id);

        if self.members.len() == before {
            return false;
        }

        self.touch();
        true
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
// GARAGE (both families)
// ============================================================================

/// Snapshot of both families; the input to aggregation and achievements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Garage {
    pub cars: Vec<VehicleGroup>,
    pub motorcycles: Vec<VehicleGroup>,
}

impl Garage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self, family: Family) -> &[VehicleGroup] {
        match family {
            Family::Cars => &self.cars,
            Family::Motorcycles => &self.motorcycles,
        }
    }

    pub fn groups_mut(&mut self, family: Family) -> &mut Vec<VehicleGroup> {
        match family {
            Family::Cars => &mut self.cars,
            Family::Motorcycles => &mut self.motorcycles,
        }
    }

    pub fn group(&self, family: Family, id: Uuid) -> Option<&VehicleGroup> {
        self.groups(family).iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, family: Family, id: Uuid) -> Option<&mut VehicleGroup> {
        self.groups_mut(family).iter_mut().find(|g| g.id == id)
    }

    /// Every member of one family, in group then insertion order
    pub fn members(&self, family: Family) -> impl Iterator<Item = &Vehicle> {
        self.groups(family).iter().flat_map(|g| g.members.iter())
    }

    /// True if any group or member in either family uses `id`
    pub fn contains_id(&self, id: Uuid) -> bool {
        Family::ALL.iter().any(|family| {
            self.groups(*family)
                .iter()
                .any(|g| g.id == id || g.contains_member(id))
        })
    }

    /// True if `id` is used by any group, or by a member of any group other
    /// than `group_id` in `family`
    pub fn id_used_outside(&self, family: Family, group_id: Uuid, id: Uuid) -> bool {
        Family::ALL.iter().any(|f| {
            self.groups(*f).iter().any(|g| {
                let own = *f == family && g.id == group_id;
                g.id == id || (!own && g.contains_member(id))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty() && self.motorcycles.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
