// Durable key-value settings store
//
// The garage persists into independent keyed slots (one blob per family,
// the onboarding flag, the collector profile). `SettingsStore` is the seam;
// SQLite (WAL) is the on-disk backend, `MemorySettings` backs tests and
// ephemeral sessions.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, StoreError};

/// Keyed slots the application reads and writes
pub mod keys {
    pub const CAR_COLLECTIONS: &str = "carCollections";
    pub const MOTORCYCLE_COLLECTIONS: &str = "motorcycleCollections";
    pub const ONBOARDING_COMPLETED: &str = "onboardingCompleted";
    pub const COLLECTOR_NAME: &str = "collectorName";
    pub const COLLECTOR_AGE: &str = "collectorAge";
    pub const VEHICLE_TYPE: &str = "vehicleType";
}

/// Local key-value settings store
pub trait SettingsStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Absent or unreadable flags read as false
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(matches!(self.get(key)?.as_deref(), Some(b"1") | Some(b"true")))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.set(key, if value { b"1" } else { b"0" })
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .and_then(|bytes| String::from_utf8(bytes).ok()))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.as_bytes())
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_row| Ok(()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub struct SqliteSettings {
    conn: Connection,
}

impl SqliteSettings {
    /// Open (or create) the settings database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteSettings { conn })
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM settings ORDER BY key")?;

        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(keys)
    }
}

impl SettingsStore for SqliteSettings {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;

        Ok(())
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, Vec<u8>>,
    fail_writes: bool,
}

/// In-memory settings store
///
/// Clones share the same slots, so a handle kept outside the store sees
/// every write-through and can reopen a fresh store over the same data.
#[derive(Clone, Default)]
pub struct MemorySettings {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a slot directly (bypasses the write failure switch)
    pub fn with_value(self, key: &str, value: &[u8]) -> Self {
        self.lock().values.insert(key.to_string(), value.to_vec());
        self
    }

    /// Make every subsequent `set`/`remove` fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().values.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        inner.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        inner.values.remove(key);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_get_overwrite() {
        let mut settings = SqliteSettings::open_in_memory().unwrap();

        assert_eq!(settings.get("missing").unwrap(), None);

        settings.set(keys::CAR_COLLECTIONS, b"first").unwrap();
        settings.set(keys::CAR_COLLECTIONS, b"second").unwrap();

        assert_eq!(
            settings.get(keys::CAR_COLLECTIONS).unwrap(),
            Some(b"second".to_vec())
        );
        assert_eq!(settings.keys().unwrap(), vec![keys::CAR_COLLECTIONS.to_string()]);
    }

    #[test]
    fn test_sqlite_remove() {
        let mut settings = SqliteSettings::open_in_memory().unwrap();
        settings.set("k", b"v").unwrap();

        settings.remove("k").unwrap();
        settings.remove("k").unwrap();

        assert_eq!(settings.get("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_bool_slots() {
        let mut settings = SqliteSettings::open_in_memory().unwrap();

        assert!(!settings.get_bool(keys::ONBOARDING_COMPLETED).unwrap());
        settings.set_bool(keys::ONBOARDING_COMPLETED, true).unwrap();
        assert!(settings.get_bool(keys::ONBOARDING_COMPLETED).unwrap());
        settings.set_bool(keys::ONBOARDING_COMPLETED, false).unwrap();
        assert!(!settings.get_bool(keys::ONBOARDING_COMPLETED).unwrap());
    }

    #[test]
    fn test_string_slots() {
        let mut settings = MemorySettings::new();

        settings.set_string(keys::COLLECTOR_NAME, "Ada").unwrap();
        assert_eq!(
            settings.get_string(keys::COLLECTOR_NAME).unwrap(),
            Some("Ada".to_string())
        );

        settings.set(keys::COLLECTOR_AGE, &[0xff, 0xfe]).unwrap();
        assert_eq!(settings.get_string(keys::COLLECTOR_AGE).unwrap(), None);
    }

    #[test]
    fn test_memory_clones_share_slots() {
        let handle = MemorySettings::new();
        let mut writer = handle.clone();

        writer.set("k", b"v").unwrap();

        assert_eq!(handle.raw("k"), Some(b"v".to_vec()));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_memory_write_failure() {
        let handle = MemorySettings::new().with_value("k", b"old");
        let mut writer = handle.clone();

        handle.set_fail_writes(true);

        assert!(matches!(
            writer.set("k", b"new"),
            Err(StoreError::WriteRejected(_))
        ));
        assert!(writer.remove("k").is_err());
        assert_eq!(handle.raw("k"), Some(b"old".to_vec()));
    }
}
