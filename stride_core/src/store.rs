//! Persistent session slots with file locking.
//!
//! The coordinator keeps three logical slots — generation settings, the
//! plan, and the full versioned document — as separate JSON files so a
//! restarted process can reconstruct the session. Writes are atomic
//! (temp file + rename) and serialized with exclusive locks.

use crate::{Plan, PlanDocument, PlanSettings, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Slot file carrying the generation parameters
pub const SETTINGS_FILE: &str = "settings.json";
/// Slot file carrying the bare plan
pub const PLAN_FILE: &str = "plan.json";
/// Slot file carrying the versioned wrapper (settings and plan included)
pub const DOCUMENT_FILE: &str = "document.json";

/// File-backed storage for the session's three slots
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn load_settings(&self) -> Result<Option<PlanSettings>> {
        read_slot(&self.slot_path(SETTINGS_FILE))
    }

    pub fn load_plan(&self) -> Result<Option<Plan>> {
        read_slot(&self.slot_path(PLAN_FILE))
    }

    pub fn load_document(&self) -> Result<Option<PlanDocument>> {
        read_slot(&self.slot_path(DOCUMENT_FILE))
    }

    pub fn save_settings(&self, settings: &PlanSettings) -> Result<()> {
        write_slot(&self.slot_path(SETTINGS_FILE), settings)
    }

    pub fn save_plan(&self, plan: &Plan) -> Result<()> {
        write_slot(&self.slot_path(PLAN_FILE), plan)
    }

    pub fn save_document(&self, doc: &PlanDocument) -> Result<()> {
        write_slot(&self.slot_path(DOCUMENT_FILE), doc)
    }

    /// Remove all three slots (session reset)
    pub fn clear(&self) -> Result<()> {
        for name in [SETTINGS_FILE, PLAN_FILE, DOCUMENT_FILE] {
            let path = self.slot_path(name);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        tracing::debug!("cleared session slots in {:?}", self.dir);
        Ok(())
    }
}

/// Load one slot with shared locking.
///
/// A missing, unreadable, or corrupt slot degrades to `None` with a
/// warning; the session then starts empty instead of failing to open.
fn read_slot<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("unable to open slot {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("unable to lock slot {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("failed to read slot {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("failed to parse slot {:?}: {}. Treating as empty.", path, e);
            Ok(None)
        }
    }
}

/// Write one slot atomically:
/// 1. Write to a locked temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the slot file
fn write_slot<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "slot path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| crate::Error::Io(e.error))?;

    tracing::debug!("saved slot {:?}", path);
    Ok(())
}
