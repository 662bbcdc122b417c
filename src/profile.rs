// Collaborator-owned state that the garage reset clears
//
// The store does not own these; `GarageStore::clear_all` only invokes them.
// - onboarding completion flag (settings slot)
// - collector profile: name, age, preferred vehicle type (settings slots)
// - profile image (a file in the data directory)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::db::{keys, SettingsStore};

/// External owner of state that must be wiped on a full reset
pub trait ResetCollaborator {
    fn name(&self) -> &'static str;

    fn reset(&mut self, settings: &mut dyn SettingsStore) -> Result<()>;
}

// ============================================================================
// ONBOARDING FLAG
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct OnboardingState;

impl OnboardingState {
    pub fn is_completed(&self, settings: &dyn SettingsStore) -> bool {
        settings
            .get_bool(keys::ONBOARDING_COMPLETED)
            .unwrap_or(false)
    }

    pub fn complete(&self, settings: &mut dyn SettingsStore) -> Result<()> {
        settings
            .set_bool(keys::ONBOARDING_COMPLETED, true)
            .context("Failed to mark onboarding completed")
    }
}

impl ResetCollaborator for OnboardingState {
    fn name(&self) -> &'static str {
        "onboarding"
    }

    fn reset(&mut self, settings: &mut dyn SettingsStore) -> Result<()> {
        settings
            .set_bool(keys::ONBOARDING_COMPLETED, false)
            .context("Failed to reset onboarding flag")
    }
}

// ============================================================================
// COLLECTOR PROFILE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectorProfile {
    pub name: Option<String>,
    pub age: Option<String>,
    pub vehicle_type: Option<String>,
}

impl CollectorProfile {
    pub fn load(settings: &dyn SettingsStore) -> Result<Self> {
        Ok(CollectorProfile {
            name: settings.get_string(keys::COLLECTOR_NAME)?,
            age: settings.get_string(keys::COLLECTOR_AGE)?,
            vehicle_type: settings.get_string(keys::VEHICLE_TYPE)?,
        })
    }

    /// Write the set fields; unset fields are left as stored
    pub fn save(&self, settings: &mut dyn SettingsStore) -> Result<()> {
        let fields = [
            (keys::COLLECTOR_NAME, &self.name),
            (keys::COLLECTOR_AGE, &self.age),
            (keys::VEHICLE_TYPE, &self.vehicle_type),
        ];

        for (key, value) in fields {
            if let Some(value) = value {
                settings
                    .set_string(key, value)
                    .with_context(|| format!("Failed to save profile field {}", key))?;
            }
        }

        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Collector")
    }

    pub fn display_age(&self) -> &str {
        self.age.as_deref().unwrap_or("0")
    }

    pub fn display_vehicle_type(&self) -> &str {
        self.vehicle_type.as_deref().unwrap_or("Car Enthusiast")
    }
}

impl ResetCollaborator for CollectorProfile {
    fn name(&self) -> &'static str {
        "collector profile"
    }

    fn reset(&mut self, settings: &mut dyn SettingsStore) -> Result<()> {
        for key in [keys::COLLECTOR_NAME, keys::COLLECTOR_AGE, keys::VEHICLE_TYPE] {
            settings
                .remove(key)
                .with_context(|| format!("Failed to clear profile field {}", key))?;
        }
        *self = CollectorProfile::default();
        Ok(())
    }
}

// ============================================================================
// PROFILE IMAGE
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProfileImage {
    path: PathBuf,
}

impl ProfileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProfileImage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write profile image {}", self.path.display()))
    }

    pub fn load(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read profile image {}", self.path.display())),
        }
    }
}

impl ResetCollaborator for ProfileImage {
    fn name(&self) -> &'static str {
        "profile image"
    }

    fn reset(&mut self, _settings: &mut dyn SettingsStore) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove profile image {}", self.path.display())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
