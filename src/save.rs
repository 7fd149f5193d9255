//! Save slots on disk.
//!
//! Only the player position is persisted. Everything else (velocity, regime,
//! grab, gravity) comes back at defaults when a slot is loaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_MAX_SLOTS: usize = 3;

/// Contents of one save file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub position: [f32; 3],
    pub level: String,
    pub saved_at: DateTime<Utc>,
}

/// Summary of an occupied slot, for listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveInfo {
    pub slot: usize,
    pub level: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Invalid save slot {slot}: available slots are 0-{}", .max_slots.saturating_sub(1))]
    SlotOutOfRange { slot: usize, max_slots: usize },
    #[error("No save in slot {0}")]
    Empty(usize),
    #[error("Save file I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupt save file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub struct SaveManager {
    dir: PathBuf,
    max_slots: usize,
}

impl SaveManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_slots(dir, DEFAULT_MAX_SLOTS)
    }

    pub fn with_slots(dir: impl Into<PathBuf>, max_slots: usize) -> Self {
        Self {
            dir: dir.into(),
            max_slots,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    fn check_slot(&self, slot: usize) -> Result<(), SaveError> {
        if slot >= self.max_slots {
            return Err(SaveError::SlotOutOfRange {
                slot,
                max_slots: self.max_slots,
            });
        }
        Ok(())
    }

    fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("save_{}.json", slot))
    }

    /// Writes the position to a slot, replacing what was there.
    pub fn save(&self, slot: usize, position: [f32; 3], level: &str) -> Result<SaveData, SaveError> {
        self.check_slot(slot)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| SaveError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let data = SaveData {
            position,
            level: level.to_string(),
            saved_at: Utc::now(),
        };
        let path = self.slot_path(slot);
        let json = serde_json::to_string_pretty(&data).map_err(|source| SaveError::Json {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;

        info!(slot, ?position, "Game saved");
        Ok(data)
    }

    pub fn load(&self, slot: usize) -> Result<SaveData, SaveError> {
        self.check_slot(slot)?;
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::Empty(slot));
        }
        let content = std::fs::read_to_string(&path).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;
        let data = serde_json::from_str(&content).map_err(|source| SaveError::Json {
            path: path.clone(),
            source,
        })?;
        info!(slot, "Game loaded");
        Ok(data)
    }

    /// False for empty or out-of-range slots
    pub fn has_save(&self, slot: usize) -> bool {
        slot < self.max_slots && self.slot_path(slot).exists()
    }

    /// Removes a slot. Returns whether there was anything to remove.
    pub fn delete(&self, slot: usize) -> Result<bool, SaveError> {
        self.check_slot(slot)?;
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|source| SaveError::Io { path, source })?;
        info!(slot, "Save deleted");
        Ok(true)
    }

    /// Summary of a slot; unreadable files count as empty.
    pub fn info(&self, slot: usize) -> Option<SaveInfo> {
        if !self.has_save(slot) {
            return None;
        }
        match self.load(slot) {
            Ok(data) => Some(SaveInfo {
                slot,
                level: data.level,
                saved_at: data.saved_at,
            }),
            Err(e) => {
                warn!(slot, error = %e, "Skipping unreadable save");
                None
            }
        }
    }

    /// Every occupied, readable slot in slot order
    pub fn all_infos(&self) -> Vec<SaveInfo> {
        (0..self.max_slots).filter_map(|slot| self.info(slot)).collect()
    }
}
