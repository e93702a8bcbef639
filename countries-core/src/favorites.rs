//! Persistent favorites store.
//!
//! Favorites are full [`Country`] snapshots keyed by code, kept in
//! insertion order and mirrored to a JSON file on every mutation. The
//! snapshot (rather than just the code) keeps a favorite displayable even
//! if it disappears from a later catalog fetch.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use tracing::warn;

use crate::model::Country;

const FAVORITES_FILE: &str = "favorites.json";

/// Owns the favorite set for the lifetime of the process.
///
/// Loaded once at startup; every toggle updates memory and disk in the
/// same call, so favorite status reads are never stale within a session.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    entries: Vec<Country>,
    codes: HashSet<String>,
}

impl FavoritesStore {
    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(Self::favorites_file_path()?))
    }

    /// Open the store backed by `path`. A missing or unparsable file
    /// yields an empty set; corrupt content is never an error here.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<Country>>(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), %err, "discarding unparsable favorites file");
                    Vec::new()
                }
            },
            // First run, or the file was removed: start empty.
            Err(_) => Vec::new(),
        };

        let codes = entries.iter().map(|c| c.code.clone()).collect();
        Self { path, entries, codes }
    }

    /// Add the country if absent, remove it if present (matching by code).
    /// The full set is re-serialized to disk before this returns; returns
    /// whether the country is a favorite afterwards.
    pub fn toggle(&mut self, country: &Country) -> Result<bool> {
        let now_favorite = if self.codes.remove(&country.code) {
            self.entries.retain(|c| c.code != country.code);
            false
        } else {
            self.codes.insert(country.code.clone());
            self.entries.push(country.clone());
            true
        };

        self.save()?;
        Ok(now_favorite)
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Current favorites in insertion order.
    pub fn list(&self) -> &[Country] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the whole set via a temp file and rename, so a concurrent
    /// reader never observes a half-written list.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize favorites to JSON")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write favorites file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace favorites file: {}", self.path.display()))?;

        Ok(())
    }

    /// Path to the favorites file.
    pub fn favorites_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "country-explorer", "countries")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join(FAVORITES_FILE))
    }
}
