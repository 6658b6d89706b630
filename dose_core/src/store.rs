//! Medication and reminder persistence with file locking.
//!
//! The store keeps two independent JSON array files under one data directory
//! and writes them atomically. There is no schema version field; corrupt or
//! unreadable content degrades to an empty collection with a warning rather
//! than surfacing an error to the user.

use crate::{Medication, Reminder, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// File name of the medication collection
pub const MEDICATIONS_FILE: &str = "medications.json";
/// File name of the reminder collection
pub const REMINDERS_FILE: &str = "reminders.json";

/// Persistence collaborator contract.
///
/// Implementations must round-trip all date/time fields losslessly. A failed
/// or corrupt load yields an empty collection, never an error the caller has
/// to translate for the user.
pub trait MedicationStore {
    fn load_medications(&self) -> Result<Vec<Medication>>;
    fn save_medications(&self, medications: &[Medication]) -> Result<()>;
    fn load_reminders(&self) -> Result<Vec<Reminder>>;
    fn save_reminders(&self, reminders: &[Reminder]) -> Result<()>;
}

/// JSON-file-backed store
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn medications_path(&self) -> PathBuf {
        self.dir.join(MEDICATIONS_FILE)
    }

    pub fn reminders_path(&self) -> PathBuf {
        self.dir.join(REMINDERS_FILE)
    }

    /// Load a JSON array collection with shared locking.
    ///
    /// Missing file, unreadable file and parse failure all degrade to an
    /// empty collection.
    fn load_collection<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            tracing::debug!("No collection file at {:?}, treating as empty", path);
            return Ok(Vec::new());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Treating as empty.", path, e);
                return Ok(Vec::new());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Treating as empty.", path, e);
            return Ok(Vec::new());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Treating as empty.", path, e);
            return Ok(Vec::new());
        }

        file.unlock()?;

        match serde_json::from_str::<Vec<T>>(&contents) {
            Ok(items) => {
                tracing::debug!("Loaded {} items from {:?}", items.len(), path);
                Ok(items)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
                Ok(Vec::new())
            }
        }
    }

    /// Save a collection atomically: write a locked temp file in the same
    /// directory, sync it, then rename over the original.
    fn save_collection<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(items)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Saved {} items to {:?}", items.len(), path);
        Ok(())
    }
}

impl MedicationStore for JsonFileStore {
    fn load_medications(&self) -> Result<Vec<Medication>> {
        self.load_collection(&self.medications_path())
    }

    fn save_medications(&self, medications: &[Medication]) -> Result<()> {
        self.save_collection(&self.medications_path(), medications)
    }

    fn load_reminders(&self) -> Result<Vec<Reminder>> {
        self.load_collection(&self.reminders_path())
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> Result<()> {
        self.save_collection(&self.reminders_path(), reminders)
    }
}

/// In-memory store for tests and the tick scheduler's unit harness
#[derive(Default)]
pub struct MemoryStore {
    medications: Mutex<Vec<Medication>>,
    reminders: Mutex<Vec<Reminder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_medications(medications: Vec<Medication>) -> Self {
        let store = Self::default();
        *store.medications.lock().unwrap_or_else(|e| e.into_inner()) = medications;
        store
    }
}

impl MedicationStore for MemoryStore {
    fn load_medications(&self) -> Result<Vec<Medication>> {
        Ok(self
            .medications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save_medications(&self, medications: &[Medication]) -> Result<()> {
        *self.medications.lock().unwrap_or_else(|e| e.into_inner()) = medications.to_vec();
        Ok(())
    }

    fn load_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self
            .reminders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> Result<()> {
        *self.reminders.lock().unwrap_or_else(|e| e.into_inner()) = reminders.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MedicationSchedule;
    use chrono::Local;

    fn test_medication(name: &str) -> Medication {
        Medication::new(
            name,
            1,
            vec![MedicationSchedule::with_preset(3, 7).unwrap()],
            Local::now().date_naive(),
            None,
            Local::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let med = test_medication("Refresh Drops");
        store.save_medications(&[med.clone()]).unwrap();

        let loaded = store.load_medications().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, med.id);
        assert_eq!(loaded[0].name, "Refresh Drops");
        assert_eq!(loaded[0].start_date, med.start_date);
        assert_eq!(loaded[0].created_at, med.created_at);
        assert_eq!(loaded[0].schedules, med.schedules);
    }

    #[test]
    fn test_reminder_timestamps_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let now = Local::now();

        let reminder = Reminder {
            id: "med-2024-06-01-0".into(),
            medication_id: "med".into(),
            scheduled_time: now,
            completed: true,
            completed_at: Some(now),
        };
        store.save_reminders(&[reminder.clone()]).unwrap();

        let loaded = store.load_reminders().unwrap();
        assert_eq!(loaded, vec![reminder]);
    }

    #[test]
    fn test_load_missing_files_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("never_created"));

        assert!(store.load_medications().unwrap().is_empty());
        assert!(store.load_reminders().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_collection_degrades_to_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        std::fs::write(store.medications_path(), "{ not an array ]").unwrap();

        assert!(store.load_medications().unwrap().is_empty());
    }

    #[test]
    fn test_non_array_json_degrades_to_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        std::fs::write(store.medications_path(), r#"{"id": "lonely"}"#).unwrap();

        assert!(store.load_medications().unwrap().is_empty());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        store.save_medications(&[test_medication("A")]).unwrap();
        store.save_reminders(&[]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name();
                name != MEDICATIONS_FILE && name != REMINDERS_FILE
            })
            .collect();
        assert!(extras.is_empty(), "unexpected leftovers: {:?}", extras);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let med = test_medication("Latanoprost");

        store.save_medications(&[med.clone()]).unwrap();
        assert_eq!(store.load_medications().unwrap()[0].id, med.id);

        store.save_reminders(&[]).unwrap();
        assert!(store.load_reminders().unwrap().is_empty());
    }
}
