// 🗄️ Garage Store - canonical owner of both vehicle families
//
// Every applied mutation runs three visible steps:
//   1. update the in-memory garage
//   2. write the affected family through the codec into the settings store
//   3. notify every observer
//
// A failed write is logged and remembered per family, never retried or
// surfaced: memory stays ahead of disk until the next successful write of
// that family. Observers are notified either way.
//
// Unknown identities change nothing, write nothing and notify nobody; the
// mutator returns `false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::db::SettingsStore;
use crate::entities::{Family, Garage, Vehicle, VehicleGroup};
use crate::error::{Result, StoreError};
use crate::profile::ResetCollaborator;

// ============================================================================
// CHANGE EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    GroupCreated,
    GroupUpdated,
    GroupDeleted,
    MemberAdded,
    MemberUpdated,
    MemberRemoved,
    GarageCleared,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::GroupCreated => "group_created",
            EventType::GroupUpdated => "group_updated",
            EventType::GroupDeleted => "group_deleted",
            EventType::MemberAdded => "member_added",
            EventType::MemberUpdated => "member_updated",
            EventType::MemberRemoved => "member_removed",
            EventType::GarageCleared => "garage_cleared",
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            EventType::GroupCreated | EventType::GroupUpdated | EventType::GroupDeleted => "group",
            EventType::MemberAdded | EventType::MemberUpdated | EventType::MemberRemoved => "vehicle",
            EventType::GarageCleared => "garage",
        }
    }
}

/// Change notification delivered to observers after each applied mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    /// None when both families changed
    pub family: Option<Family>,
    /// Group or vehicle the event is about
    pub entity_id: Option<Uuid>,
    /// Whether the write-through for this change succeeded
    pub persisted: bool,
}

impl StoreEvent {
    fn new(event_type: EventType, family: Option<Family>, entity_id: Option<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            family,
            entity_id,
            persisted: false,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.event_type.entity_type()
    }
}

pub type SubscriptionId = u64;

pub type Observer = Box<dyn FnMut(&StoreEvent) + Send>;

// ============================================================================
// COLLABORATOR SETTINGS
// ============================================================================

/// Settings handle for collaborator-owned slots. Writes to a family
/// collection key are refused with `WriteRejected`.
pub struct CollaboratorSettings<'a> {
    inner: &'a mut dyn SettingsStore,
}

impl<'a> CollaboratorSettings<'a> {
    fn new(inner: &'a mut dyn SettingsStore) -> Self {
        CollaboratorSettings { inner }
    }

    fn guard(key: &str) -> Result<()> {
        if Family::ALL.iter().any(|family| family.storage_key() == key) {
            warn!(key, "collaborator tried to write a family collection");
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        Ok(())
    }
}

impl SettingsStore for CollaboratorSettings<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        Self::guard(key)?;
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        Self::guard(key)?;
        self.inner.remove(key)
    }
}

// ============================================================================
// GARAGE STORE
// ============================================================================

/// Construct one per process and hand it to every consumer.
pub struct GarageStore {
    garage: Garage,
    settings: Box<dyn SettingsStore>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
    /// Outstanding write failure per family, cleared by that family's next good write
    write_errors: HashMap<Family, String>,
}

impl GarageStore {
    /// Load both families from `settings`. Missing or corrupt data starts
    /// that family empty.
    pub fn open(settings: Box<dyn SettingsStore>) -> Self {
        let mut garage = Garage::new();
        for family in Family::ALL {
            *garage.groups_mut(family) = load_family(settings.as_ref(), family);
        }

        debug!(
            cars = garage.cars.len(),
            motorcycles = garage.motorcycles.len(),
            "garage loaded"
        );

        GarageStore {
            garage,
            settings,
            observers: Vec::new(),
            next_subscription: 1,
            write_errors: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Read-only snapshot of both families
    pub fn garage(&self) -> &Garage {
        &self.garage
    }

    pub fn groups(&self, family: Family) -> &[VehicleGroup] {
        self.garage.groups(family)
    }

    pub fn get_group(&self, family: Family, id: Uuid) -> Option<&VehicleGroup> {
        self.garage.group(family, id)
    }

    /// Members of a group in insertion order; empty if the group is unknown
    pub fn get_members(&self, family: Family, group_id: Uuid) -> &[Vehicle] {
        self.garage
            .group(family, group_id)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    /// Any outstanding write failure, cars first. None once every family
    /// has been written successfully since its last failure.
    pub fn last_write_error(&self) -> Option<&str> {
        Family::ALL
            .iter()
            .find_map(|family| self.write_error(*family))
    }

    /// Outstanding write failure for one family
    pub fn write_error(&self, family: Family) -> Option<&str> {
        self.write_errors.get(&family).map(String::as_str)
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    /// For collaborator-owned slots (onboarding, profile). Family
    /// collections only change through the mutators below.
    pub fn settings_mut(&mut self) -> CollaboratorSettings<'_> {
        CollaboratorSettings::new(self.settings.as_mut())
    }

    // ------------------------------------------------------------------------
    // Group mutators
    // ------------------------------------------------------------------------

    /// Create an empty group and return its identity. Names and locations
    /// are not validated here.
    pub fn create_group(
        &mut self,
        family: Family,
        name: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Uuid {
        let group = VehicleGroup::new(name, location, description);
        let id = group.id;

        self.garage.groups_mut(family).push(group);

        self.commit(family, StoreEvent::new(EventType::GroupCreated, Some(family), Some(id)));
        id
    }

    /// Replace the stored group with the same id. Identity and `created_at`
    /// are kept from the stored group; `updated_at` only moves forward.
    /// Rejected when a member id repeats inside `group` or is already used
    /// anywhere outside it.
    pub fn update_group(&mut self, family: Family, mut group: VehicleGroup) -> bool {
        if self.garage.group(family, group.id).is_none() {
            debug!(family = family.as_str(), group_id = %group.id, "update_group: unknown group");
            return false;
        }

        let mut seen = HashSet::new();
        let collision = group.members.iter().find(|m| {
            !seen.insert(m.id) || self.garage.id_used_outside(family, group.id, m.id)
        });
        if let Some(member) = collision {
            warn!(group_id = %group.id, member_id = %member.id, "update_group: identity already in use");
            return false;
        }

        let Some(slot) = self.garage.group_mut(family, group.id) else {
            return false;
        };

        group.created_at = slot.created_at;
        if group.updated_at < slot.updated_at {
            group.updated_at = slot.updated_at;
        }
        group.touch();

        let id = group.id;
        *slot = group;

        self.commit(family, StoreEvent::new(EventType::GroupUpdated, Some(family), Some(id)));
        true
    }

    /// Delete a group together with all of its members
    pub fn delete_group(&mut self, family: Family, id: Uuid) -> bool {
        let groups = self.garage.groups_mut(family);
        let before = groups.len();
        groups.retain(|g| g.id != id);

        if groups.len() == before {
            debug!(family = family.as_str(), group_id = %id, "delete_group: unknown group");
            return false;
        }

        self.commit(family, StoreEvent::new(EventType::GroupDeleted, Some(family), Some(id)));
        true
    }

    // ------------------------------------------------------------------------
    // Member mutators
    // ------------------------------------------------------------------------

    /// Append `member` to a group. Rejected when the group is unknown or the
    /// member's identity is already used anywhere in the store.
    pub fn add_member(&mut self, family: Family, group_id: Uuid, member: Vehicle) -> bool {
        if self.garage.contains_id(member.id) {
            warn!(member_id = %member.id, "add_member: identity already in use");
            return false;
        }

        let Some(group) = self.garage.group_mut(family, group_id) else {
            debug!(family = family.as_str(), %group_id, "add_member: unknown group");
            return false;
        };

        let member_id = member.id;
        group.add_member(member);

        self.commit(family, StoreEvent::new(EventType::MemberAdded, Some(family), Some(member_id)));
        true
    }

    /// Replace the member with `member.id` inside the named group
    pub fn update_member(&mut self, family: Family, group_id: Uuid, member: Vehicle) -> bool {
        let member_id = member.id;
        let applied = self
            .garage
            .group_mut(family, group_id)
            .map(|group| group.update_member(member))
            .unwrap_or(false);

        if !applied {
            debug!(family = family.as_str(), %group_id, %member_id, "update_member: unknown id");
            return false;
        }

        self.commit(family, StoreEvent::new(EventType::MemberUpdated, Some(family), Some(member_id)));
        true
    }

    pub fn remove_member(&mut self, family: Family, group_id: Uuid, member_id: Uuid) -> bool {
        let applied = self
            .garage
            .group_mut(family, group_id)
            .map(|group| group.remove_member(member_id))
            .unwrap_or(false);

        if !applied {
            debug!(family = family.as_str(), %group_id, %member_id, "remove_member: unknown id");
            return false;
        }

        self.commit(family, StoreEvent::new(EventType::MemberRemoved, Some(family), Some(member_id)));
        true
    }

    // ------------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------------

    /// Delete every group of both families, then ask each collaborator to
    /// clear the state it owns. A failing collaborator does not stop the rest.
    pub fn clear_all(&mut self, collaborators: &mut [&mut dyn ResetCollaborator]) {
        let removed = self.garage.cars.len() + self.garage.motorcycles.len();
        self.garage = Garage::new();

        let mut event = StoreEvent::new(EventType::GarageCleared, None, None);
        event.persisted = Family::ALL
            .iter()
            .fold(true, |ok, family| self.persist(*family) && ok);
        self.notify(&event);

        for collaborator in collaborators.iter_mut() {
            let mut settings = CollaboratorSettings::new(self.settings.as_mut());
            if let Err(e) = collaborator.reset(&mut settings) {
                warn!(collaborator = collaborator.name(), error = %e, "reset collaborator failed");
            }
        }

        info!(groups_removed = removed, "garage cleared");
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ------------------------------------------------------------------------
    // Write-through + notify
    // ------------------------------------------------------------------------

    fn commit(&mut self, family: Family, mut event: StoreEvent) {
        event.persisted = self.persist(family);

        debug!(
            event = event.event_type.as_str(),
            family = family.as_str(),
            persisted = event.persisted,
            "mutation applied"
        );

        self.notify(&event);
    }

    /// Write one family through the codec. Failures are swallowed.
    fn persist(&mut self, family: Family) -> bool {
        let result = codec::encode(self.garage.groups(family))
            .and_then(|blob| self.settings.set(family.storage_key(), &blob));

        match result {
            Ok(()) => {
                self.write_errors.remove(&family);
                true
            }
            Err(e) => {
                warn!(family = family.as_str(), error = %e, "write-through failed; memory is ahead of disk");
                self.write_errors.insert(family, e.to_string());
                false
            }
        }
    }

    fn notify(&mut self, event: &StoreEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

fn load_family(settings: &dyn SettingsStore, family: Family) -> Vec<VehicleGroup> {
    let blob = match settings.get(family.storage_key()) {
        Ok(blob) => blob,
        Err(e) => {
            warn!(family = family.as_str(), error = %e, "could not read collection; starting empty");
            return Vec::new();
        }
    };

    let Some(bytes) = blob else {
        return Vec::new();
    };

    match codec::try_decode(&bytes) {
        Ok(groups) => groups,
        Err(e) => {
            warn!(family = family.as_str(), error = %e, "corrupt collection; starting empty");
            Vec::new()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{keys, MemorySettings, SqliteSettings};
    use crate::entities::Condition;
    use crate::profile::{CollectorProfile, OnboardingState};
    use crate::stats;
    use std::sync::{Arc, Mutex};

    fn open_memory() -> (GarageStore, MemorySettings) {
        let settings = MemorySettings::new();
        let store = GarageStore::open(Box::new(settings.clone()));
        (store, settings)
    }

    /// Full persisted state of both families, for byte-for-byte comparison
    fn encoded_state(store: &GarageStore) -> (Vec<u8>, Vec<u8>) {
        (
            codec::encode(store.groups(Family::Cars)).unwrap(),
            codec::encode(store.groups(Family::Motorcycles)).unwrap(),
        )
    }

    fn populated() -> (GarageStore, MemorySettings, Uuid, Uuid) {
        let (mut store, settings) = open_memory();
        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");
        let car = Vehicle::new("Model S", "🚗").with_quantity(2).with_value(50_000.0);
        let car_id = car.id;
        assert!(store.add_member(Family::Cars, group, car));

        let shed = store.create_group(Family::Motorcycles, "Shed", "LA", "");
        assert!(store.add_member(Family::Motorcycles, shed, Vehicle::new("Ducati", "🏎️")));

        (store, settings, group, car_id)
    }

    #[test]
    fn test_create_group_persists_and_returns_id() {
        let (mut store, settings) = open_memory();

        let id = store.create_group(Family::Cars, "Garage A", "NYC", "Main");

        let group = store.get_group(Family::Cars, id).unwrap();
        assert_eq!(group.name, "Garage A");
        assert_eq!(group.location, "NYC");
        assert!(group.members.is_empty());
        assert!(store.groups(Family::Motorcycles).is_empty());

        let blob = settings.raw(keys::CAR_COLLECTIONS).unwrap();
        assert_eq!(codec::decode(Some(&blob)), store.groups(Family::Cars));
        assert_eq!(settings.raw(keys::MOTORCYCLE_COLLECTIONS), None);
    }

    #[test]
    fn test_empty_names_are_accepted() {
        let (mut store, _) = open_memory();
        let id = store.create_group(Family::Motorcycles, "", "", "");
        assert!(store.get_group(Family::Motorcycles, id).is_some());
    }

    #[test]
    fn test_reopen_restores_state() {
        let (store, settings, group, car_id) = populated();

        let reopened = GarageStore::open(Box::new(settings.clone()));

        assert_eq!(reopened.garage(), store.garage());
        assert_eq!(reopened.get_members(Family::Cars, group)[0].id, car_id);
    }

    #[test]
    fn test_reopen_with_sqlite() {
        let dir = std::env::temp_dir().join(format!("rideroad-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garage.db");

        let snapshot = {
            let mut store = GarageStore::open(Box::new(SqliteSettings::open(&path).unwrap()));
            let group = store.create_group(Family::Cars, "Garage A", "NYC", "");
            store.add_member(Family::Cars, group, Vehicle::new("Civic", "🚗"));
            store.garage().clone()
        };

        let reopened = GarageStore::open(Box::new(SqliteSettings::open(&path).unwrap()));
        assert_eq!(reopened.garage(), &snapshot);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_blob_opens_empty() {
        let settings = MemorySettings::new()
            .with_value(keys::CAR_COLLECTIONS, b"\x00garbage")
            .with_value(keys::MOTORCYCLE_COLLECTIONS, b"[]");

        let store = GarageStore::open(Box::new(settings));

        assert!(store.garage().is_empty());
    }

    #[test]
    fn test_add_member_exact_aggregate_contribution() {
        let (mut store, _) = open_memory();
        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");

        let count_before = stats::total_count(store.groups(Family::Cars));
        let value_before = stats::total_value(store.groups(Family::Cars));

        let car = Vehicle::new("Model S", "🚗").with_quantity(2).with_value(50_000.0);
        assert!(store.add_member(Family::Cars, group, car));

        let cars = store.groups(Family::Cars);
        assert_eq!(stats::total_count(cars) - count_before, 2);
        assert_eq!(stats::total_value(cars) - value_before, 100_000.0);
    }

    #[test]
    fn test_add_member_bumps_group_updated_at() {
        let (mut store, _) = open_memory();
        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");
        let before = store.get_group(Family::Cars, group).unwrap().updated_at;

        store.add_member(Family::Cars, group, Vehicle::new("Civic", "🚗"));

        let g = store.get_group(Family::Cars, group).unwrap();
        assert!(g.updated_at >= before);
        assert!(g.created_at <= g.updated_at);
    }

    #[test]
    fn test_add_member_to_unknown_group_is_noop() {
        let (mut store, settings, _, _) = populated();
        let state = encoded_state(&store);
        let blob = settings.raw(keys::CAR_COLLECTIONS);

        assert!(!store.add_member(Family::Cars, Uuid::new_v4(), Vehicle::new("Ghost", "🚗")));

        assert_eq!(encoded_state(&store), state);
        assert_eq!(settings.raw(keys::CAR_COLLECTIONS), blob);
    }

    #[test]
    fn test_add_member_rejects_reused_identity() {
        let (mut store, _, group, car_id) = populated();
        let other = store.create_group(Family::Cars, "Garage B", "SF", "");

        let mut dup = Vehicle::new("Clone", "🚗");
        dup.id = car_id;

        assert!(!store.add_member(Family::Cars, other, dup.clone()));
        assert!(!store.add_member(Family::Cars, group, dup));
        assert!(store.get_members(Family::Cars, other).is_empty());
    }

    #[test]
    fn test_add_member_family_mismatch_is_noop() {
        let (mut store, _, car_group, _) = populated();

        assert!(!store.add_member(Family::Motorcycles, car_group, Vehicle::new("Vespa", "🛵")));
        assert!(store.get_members(Family::Motorcycles, car_group).is_empty());
    }

    #[test]
    fn test_update_member() {
        let (mut store, _, group, car_id) = populated();
        let original = store.get_members(Family::Cars, group)[0].clone();

        let mut edited = original.clone();
        edited.name = "Model S Plaid".to_string();
        edited.condition = Condition::Good;

        assert!(store.update_member(Family::Cars, group, edited));

        let stored = &store.get_members(Family::Cars, group)[0];
        assert_eq!(stored.id, car_id);
        assert_eq!(stored.name, "Model S Plaid");
        assert_eq!(stored.condition, Condition::Good);
        assert_eq!(stored.created_at, original.created_at);
        assert!(stored.updated_at >= original.updated_at);
    }

    #[test]
    fn test_update_member_unknown_ids_are_noop() {
        let (mut store, _, group, car_id) = populated();
        let state = encoded_state(&store);

        let stranger = Vehicle::new("Stranger", "🚗");
        assert!(!store.update_member(Family::Cars, group, stranger));

        let mut known = store.get_members(Family::Cars, group)[0].clone();
        known.name = "Moved".to_string();
        assert_eq!(known.id, car_id);
        assert!(!store.update_member(Family::Cars, Uuid::new_v4(), known));

        assert_eq!(encoded_state(&store), state);
    }

    #[test]
    fn test_update_group_keeps_identity_and_created_at() {
        let (mut store, _, group, _) = populated();
        let stored = store.get_group(Family::Cars, group).unwrap().clone();

        let mut edited = stored.clone();
        edited.name = "Garage Prime".to_string();
        edited.location = "Brooklyn".to_string();
        edited.created_at = Utc::now() + chrono::Duration::days(1);
        edited.updated_at = stored.updated_at - chrono::Duration::days(1);

        assert!(store.update_group(Family::Cars, edited));

        let g = store.get_group(Family::Cars, group).unwrap();
        assert_eq!(g.name, "Garage Prime");
        assert_eq!(g.location, "Brooklyn");
        assert_eq!(g.created_at, stored.created_at);
        assert!(g.updated_at >= stored.updated_at);
        assert_eq!(g.members, stored.members);
    }

    #[test]
    fn test_update_group_unknown_is_noop() {
        let (mut store, _, _, _) = populated();
        let state = encoded_state(&store);

        let stranger = VehicleGroup::new("Nowhere", "", "");
        assert!(!store.update_group(Family::Cars, stranger));

        assert_eq!(encoded_state(&store), state);
    }

    #[test]
    fn test_remove_member() {
        let (mut store, settings, group, car_id) = populated();

        assert!(store.remove_member(Family::Cars, group, car_id));

        assert!(store.get_members(Family::Cars, group).is_empty());
        assert_eq!(stats::total_count(store.groups(Family::Cars)), 0);
        let blob = settings.raw(keys::CAR_COLLECTIONS).unwrap();
        assert_eq!(codec::decode(Some(&blob)), store.groups(Family::Cars));
    }

    #[test]
    fn test_remove_random_identity_leaves_state_unchanged() {
        let (mut store, settings, group, _) = populated();
        let state = encoded_state(&store);
        let cars_blob = settings.raw(keys::CAR_COLLECTIONS);
        let bikes_blob = settings.raw(keys::MOTORCYCLE_COLLECTIONS);

        let random = Uuid::new_v4();
        assert!(!store.remove_member(Family::Cars, group, random));
        assert!(!store.remove_member(Family::Motorcycles, group, random));

        assert_eq!(encoded_state(&store), state);
        assert_eq!(settings.raw(keys::CAR_COLLECTIONS), cars_blob);
        assert_eq!(settings.raw(keys::MOTORCYCLE_COLLECTIONS), bikes_blob);
    }

    #[test]
    fn test_delete_group_removes_members() {
        let (mut store, _, group, car_id) = populated();

        assert!(store.delete_group(Family::Cars, group));
        assert!(!store.delete_group(Family::Cars, group));

        assert!(store.get_group(Family::Cars, group).is_none());
        assert!(store.get_members(Family::Cars, group).is_empty());
        assert!(!store.garage().contains_id(car_id));
        assert_eq!(store.groups(Family::Motorcycles).len(), 1);
    }

    #[test]
    fn test_get_members_unknown_group_is_empty() {
        let (store, _, _, _) = populated();
        assert!(store.get_members(Family::Cars, Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let (mut store, _) = open_memory();
        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");
        for name in ["first", "second", "third"] {
            store.add_member(Family::Cars, group, Vehicle::new(name, "🚗"));
        }

        let names: Vec<&str> = store
            .get_members(Family::Cars, group)
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_observers_receive_events_in_order() {
        let (mut store, _) = open_memory();
        let seen: Arc<Mutex<Vec<EventType>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.event_type));

        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");
        let car = Vehicle::new("Civic", "🚗");
        let car_id = car.id;
        store.add_member(Family::Cars, group, car);
        store.remove_member(Family::Cars, group, car_id);
        store.remove_member(Family::Cars, group, car_id);
        store.delete_group(Family::Cars, group);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                EventType::GroupCreated,
                EventType::MemberAdded,
                EventType::MemberRemoved,
                EventType::GroupDeleted,
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (mut store, _) = open_memory();
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let sub = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.create_group(Family::Cars, "A", "", "");
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.create_group(Family::Cars, "B", "", "");

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn test_write_failure_is_swallowed_and_still_notifies() {
        let (mut store, settings) = open_memory();
        let events: Arc<Mutex<Vec<StoreEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        settings.set_fail_writes(true);
        let group = store.create_group(Family::Cars, "Garage A", "NYC", "");

        // Memory is ahead of disk
        assert!(store.get_group(Family::Cars, group).is_some());
        assert_eq!(settings.raw(keys::CAR_COLLECTIONS), None);
        assert!(store.last_write_error().is_some());

        let recorded = events.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].persisted);

        // Next good write catches disk up
        settings.set_fail_writes(false);
        store.add_member(Family::Cars, group, Vehicle::new("Civic", "🚗"));
        assert!(store.last_write_error().is_none());
        let blob = settings.raw(keys::CAR_COLLECTIONS).unwrap();
        assert_eq!(codec::decode(Some(&blob)), store.groups(Family::Cars));
    }

    #[test]
    fn test_write_error_is_tracked_per_family() {
        let (mut store, settings) = open_memory();

        settings.set_fail_writes(true);
        let cars = store.create_group(Family::Cars, "Garage A", "NYC", "");
        assert!(store.write_error(Family::Cars).is_some());

        // A good motorcycle write does not hide the pending car failure
        settings.set_fail_writes(false);
        store.create_group(Family::Motorcycles, "Shed", "LA", "");
        assert_eq!(settings.raw(keys::CAR_COLLECTIONS), None);
        assert!(store.write_error(Family::Motorcycles).is_none());
        assert!(store.write_error(Family::Cars).is_some());
        assert!(store.last_write_error().is_some());

        store.add_member(Family::Cars, cars, Vehicle::new("Civic", "🚗"));
        assert!(store.last_write_error().is_none());
        let blob = settings.raw(keys::CAR_COLLECTIONS).unwrap();
        assert_eq!(codec::decode(Some(&blob)), store.groups(Family::Cars));
    }

    #[test]
    fn test_non_finite_member_keeps_previous_blob() {
        let (mut store, settings) = open_memory();
        let keep = store.create_group(Family::Cars, "Keep", "NYC", "");
        store.add_member(Family::Cars, keep, Vehicle::new("Civic", "🚗").with_value(20_000.0));
        let saved = settings.raw(keys::CAR_COLLECTIONS);

        let hyper_group = store.create_group(Family::Cars, "Hyper", "", "");
        let hyper = Vehicle::new("Hyper", "🏎️").with_value("1e400".parse().unwrap());
        assert!(store.add_member(Family::Cars, hyper_group, hyper));

        let err = store.last_write_error().unwrap();
        assert!(err.contains("non-finite"), "{}", err);

        // The blob written after the last good change is still on disk
        let reopened = GarageStore::open(Box::new(settings.clone()));
        assert_eq!(reopened.groups(Family::Cars).len(), 2);
        assert_ne!(settings.raw(keys::CAR_COLLECTIONS), saved);
        assert_eq!(reopened.get_members(Family::Cars, keep).len(), 1);
        assert!(reopened.get_members(Family::Cars, hyper_group).is_empty());
    }

    #[test]
    fn test_update_group_rejects_colliding_member_ids() {
        let (mut store, _, group, car_id) = populated();
        let other = store.create_group(Family::Cars, "Garage B", "SF", "");
        let bike_id = store.garage().members(Family::Motorcycles).next().unwrap().id;
        let state = encoded_state(&store);

        // Id already used by a member of another group
        let mut stolen = store.get_group(Family::Cars, other).unwrap().clone();
        let mut copy = Vehicle::new("Copy", "🚗");
        copy.id = car_id;
        stolen.members.push(copy);
        assert!(!store.update_group(Family::Cars, stolen));

        // Id used in the other family
        let mut cross = store.get_group(Family::Cars, other).unwrap().clone();
        let mut bike = Vehicle::new("Bike", "🏎️");
        bike.id = bike_id;
        cross.members.push(bike);
        assert!(!store.update_group(Family::Cars, cross));

        // Same id twice inside the group
        let mut doubled = store.get_group(Family::Cars, group).unwrap().clone();
        let twin = doubled.members[0].clone();
        doubled.members.push(twin);
        assert!(!store.update_group(Family::Cars, doubled));

        assert_eq!(encoded_state(&store), state);

        // Keeping its own members is fine
        let mut renamed = store.get_group(Family::Cars, group).unwrap().clone();
        renamed.name = "Garage Prime".to_string();
        renamed.members.push(Vehicle::new("Fresh", "🚗"));
        assert!(store.update_group(Family::Cars, renamed));
        assert_eq!(store.get_members(Family::Cars, group).len(), 2);
    }

    #[test]
    fn test_collaborator_settings_refuse_family_keys() {
        let (mut store, settings, _, _) = populated();
        let cars = settings.raw(keys::CAR_COLLECTIONS);

        let mut handle = store.settings_mut();
        assert!(matches!(
            handle.set(keys::CAR_COLLECTIONS, b"[]"),
            Err(StoreError::WriteRejected(_))
        ));
        assert!(handle.remove(keys::MOTORCYCLE_COLLECTIONS).is_err());

        let profile = CollectorProfile {
            name: Some("Ada".to_string()),
            age: None,
            vehicle_type: None,
        };
        profile.save(&mut handle).unwrap();
        OnboardingState.complete(&mut handle).unwrap();

        assert_eq!(settings.raw(keys::CAR_COLLECTIONS), cars);
        assert!(settings.raw(keys::MOTORCYCLE_COLLECTIONS).is_some());
        assert!(settings.get_bool(keys::ONBOARDING_COMPLETED).unwrap());
        assert_eq!(CollectorProfile::load(store.settings()).unwrap().display_name(), "Ada");
    }

    #[test]
    fn test_clear_all_reports_failed_family_write() {
        let (mut store, settings, _, _) = populated();
        settings.set_fail_writes(true);

        store.clear_all(&mut []);

        assert!(store.write_error(Family::Cars).is_some());
        assert!(store.write_error(Family::Motorcycles).is_some());
        assert!(store.last_write_error().is_some());
        settings.set_fail_writes(false);
        assert!(!GarageStore::open(Box::new(settings.clone())).garage().is_empty());
    }

    #[test]
    fn test_clear_all_resets_families_and_collaborators() {
        let (mut store, settings, _, _) = populated();
        let mut writer = settings.clone();
        writer.set_bool(keys::ONBOARDING_COMPLETED, true).unwrap();

        let mut onboarding = OnboardingState;
        store.clear_all(&mut [&mut onboarding]);

        assert!(store.garage().is_empty());
        assert!(!settings.get_bool(keys::ONBOARDING_COMPLETED).unwrap());

        let reopened = GarageStore::open(Box::new(settings.clone()));
        assert!(reopened.garage().is_empty());
    }

    #[test]
    fn test_clear_all_notifies_once() {
        let (mut store, _, _, _) = populated();
        let seen: Arc<Mutex<Vec<StoreEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.clear_all(&mut []);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].event_type, EventType::GarageCleared);
        assert_eq!(seen[0].family, None);
        assert!(seen[0].persisted);
    }
}
