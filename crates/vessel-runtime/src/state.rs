//! Persistent container records.
//!
//! One directory per container id under the runtime's `containers/`
//! directory, holding `record.json` next to the unpacked bundle. Records
//! survive orchestrator restarts and are read back by `list`, `exec`, and
//! `stop`.

use std::path::{Path, PathBuf};

use vessel_common::types::ContainerId;

use crate::container::ContainerRecord;
use crate::error::{Result, RuntimeError};

/// File name of the per-container record.
const RECORD_FILE: &str = "record.json";

/// The on-disk container record store.
#[derive(Debug)]
pub struct StateStore {
    containers_dir: PathBuf,
}

impl StateStore {
    /// Opens the store rooted at `containers_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(containers_dir: impl Into<PathBuf>) -> Result<Self> {
        let containers_dir = containers_dir.into();
        std::fs::create_dir_all(&containers_dir).map_err(|e| RuntimeError::Io {
            path: containers_dir.clone(),
            source: e,
        })?;
        Ok(Self { containers_dir })
    }

    /// Directory of one container's state.
    #[must_use]
    pub fn container_dir(&self, id: &ContainerId) -> PathBuf {
        self.containers_dir.join(id.as_str())
    }

    fn record_path(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join(RECORD_FILE)
    }

    /// Persists a record, replacing any previous one for the same id.
    ///
    /// The write goes to a temporary file in the same directory and is
    /// renamed into place, so readers never observe a torn record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn save(&self, record: &ContainerRecord) -> Result<()> {
        let dir = self.container_dir(&record.id);
        std::fs::create_dir_all(&dir).map_err(|e| RuntimeError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let payload = serde_json::to_vec_pretty(record)?;
        let tmp = dir.join(format!("{RECORD_FILE}.tmp"));
        std::fs::write(&tmp, payload).map_err(|e| RuntimeError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        let path = self.record_path(&record.id);
        std::fs::rename(&tmp, &path).map_err(|e| RuntimeError::Io {
            path,
            source: e,
        })?;
        tracing::debug!(id = %record.id, "container record saved");
        Ok(())
    }

    /// Loads the record for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] if no record exists, or a
    /// decode/read error otherwise.
    pub fn load(&self, id: &ContainerId) -> Result<ContainerRecord> {
        let path = self.record_path(id);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RuntimeError::NotFound { id: id.to_string() });
            }
            Err(e) => return Err(RuntimeError::Io { path, source: e }),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Deletes a container's record and its entire state directory
    /// (bundle included). Absence is not an error, so repeated stops
    /// converge.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn delete(&self, id: &ContainerId) -> Result<()> {
        let dir = self.container_dir(id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!(id = %id, "container state removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RuntimeError::Io { path: dir, source: e }),
        }
    }

    /// Loads every readable record, sorted by creation time.
    ///
    /// Unreadable or partially-written entries are skipped with a
    /// warning rather than failing the whole listing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the containers directory itself cannot
    /// be read.
    pub fn list(&self) -> Result<Vec<ContainerRecord>> {
        let entries = std::fs::read_dir(&self.containers_dir).map_err(|e| RuntimeError::Io {
            path: self.containers_dir.clone(),
            source: e,
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let id = ContainerId::new(entry.file_name().to_string_lossy());
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping unreadable container record");
                }
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    /// Root directory of the store.
    #[must_use]
    pub fn containers_dir(&self) -> &Path {
        &self.containers_dir
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use vessel_common::types::{ContainerState, PortMapping, ResourceLimits};

    use super::*;

    fn sample(id: &str) -> ContainerRecord {
        ContainerRecord {
            id: ContainerId::new(id),
            image: "alpine".into(),
            command: vec!["echo".into(), "hi".into()],
            volumes: vec!["/data:/mnt".parse().expect("volume")],
            ports: vec![PortMapping {
                host_port: 8080,
                container_port: 80,
            }],
            address: Ipv4Addr::new(10, 67, 0, 2),
            pid: 1234,
            state: ContainerState::Running,
            limits: ResourceLimits::default(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn save_then_load_round_trips_all_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open");
        let record = sample("round-trip");
        store.save(&record).expect("save");

        let loaded = store.load(&record.id).expect("load");
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.image, record.image);
        assert_eq!(loaded.command, record.command);
        assert_eq!(loaded.volumes, record.volumes);
        assert_eq!(loaded.ports, record.ports);
        assert_eq!(loaded.address, record.address);
        assert_eq!(loaded.pid, record.pid);
    }

    #[test]
    fn load_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open");
        assert!(matches!(
            store.load(&ContainerId::new("ghost")),
            Err(RuntimeError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open");
        let record = sample("deleted");
        store.save(&record).expect("save");

        store.delete(&record.id).expect("first delete");
        store.delete(&record.id).expect("second delete is a no-op");
        assert!(matches!(
            store.load(&record.id),
            Err(RuntimeError::NotFound { .. })
        ));
    }

    #[test]
    fn list_returns_saved_records_and_skips_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open");
        store.save(&sample("a")).expect("save a");
        store.save(&sample("b")).expect("save b");
        // A directory without a record must not break the listing.
        std::fs::create_dir_all(dir.path().join("broken")).expect("mkdir");

        let records = store.list().expect("list");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn save_replaces_previous_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open");
        let mut record = sample("update");
        store.save(&record).expect("save");
        record.state = ContainerState::Stopped;
        store.save(&record).expect("resave");

        let loaded = store.load(&record.id).expect("load");
        assert_eq!(loaded.state, ContainerState::Stopped);
    }
}
