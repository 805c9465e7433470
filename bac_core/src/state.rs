//! Tracker state persistence with file locking.
//!
//! The whole tracker — profile, drink log, and the id high-water mark — is
//! one JSON document (`tracker.json`), saved atomically and guarded with
//! advisory locks so concurrent invocations cannot tear the file.

use crate::{Beverage, Error, Result, UserProfile, VolumeUnit};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The persisted tracker state: the user's profile and the drink log.
///
/// `last_beverage_id` is a high-water mark: it only ever grows, so ids
/// survive deletions and `clear` without reuse.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerState {
    pub profile: Option<UserProfile>,
    pub beverages: Vec<Beverage>,
    pub last_beverage_id: i64,
}

impl TrackerState {
    /// Load tracker state from a file with shared locking.
    ///
    /// Returns default state if the file doesn't exist. If the file is
    /// corrupted or unreadable, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No tracker file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open tracker file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock tracker file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read tracker file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<TrackerState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded tracker state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse tracker file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save tracker state to a file with exclusive locking.
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "tracker path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old tracker file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved tracker state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back atomically.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut TrackerState) -> Result<T>,
    {
        let mut state = Self::load(path)?;
        let out = f(&mut state)?;
        state.save(path)?;
        Ok(out)
    }

    /// Set or replace the profile, rejecting incomplete or invalid ones.
    pub fn set_profile(&mut self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        self.profile = Some(profile);
        Ok(())
    }

    /// Log a drink and return its assigned id.
    ///
    /// Ids are millisecond timestamps bumped past the persisted high-water
    /// mark, so they stay strictly monotonic even for rapid adds.
    pub fn add_beverage(
        &mut self,
        amount: f64,
        volume_unit: VolumeUnit,
        abv: f64,
        consumed_time: DateTime<Utc>,
    ) -> Result<i64> {
        let id = Utc::now()
            .timestamp_millis()
            .max(self.last_beverage_id + 1);
        let beverage = Beverage {
            id,
            amount,
            volume_unit,
            abv,
            consumed_time,
        };
        beverage.validate()?;

        self.beverages.push(beverage);
        self.last_beverage_id = id;
        tracing::debug!(id, "logged drink");
        Ok(id)
    }

    /// Remove a drink by id. Returns whether anything was removed.
    pub fn delete_beverage(&mut self, id: i64) -> bool {
        let before = self.beverages.len();
        self.beverages.retain(|b| b.id != id);
        self.beverages.len() < before
    }

    /// Drop the profile and the drink log. The id high-water mark is kept
    /// so future drinks never reuse an old id.
    pub fn clear(&mut self) {
        self.profile = None;
        self.beverages.clear();
    }

    /// The drink log in display order: newest first.
    pub fn beverages_newest_first(&self) -> Vec<&Beverage> {
        let mut sorted: Vec<&Beverage> = self.beverages.iter().collect();
        sorted.sort_by(|a, b| b.consumed_time.cmp(&a.consumed_time).then(b.id.cmp(&a.id)));
        sorted
    }
}
