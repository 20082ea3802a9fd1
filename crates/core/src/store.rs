//! On-disk storage of saved notes.
//!
//! Notes are stored verbatim as JSON under
//! `{data_dir}/notes/{identity}/{timestamp}.json`, where the timestamp is
//! milliseconds since the Unix epoch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::note::NoteDocument;
use crate::{NoteError, Result};

/// Directory name used under the platform data directory.
const APP_DIR: &str = "noteify";

/// Identity used when the caller does not supply one.
pub const DEFAULT_IDENTITY: &str = "default";

/// A note read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedNote {
    /// Storage key, the millisecond timestamp of when it was saved.
    pub id: u64,
    pub path: PathBuf,
    pub note: NoteDocument,
}

/// JSON file store for notes, partitioned by identity.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    /// Store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { root: data_dir.into() }
    }

    /// Platform data directory for the application, e.g.
    /// `~/.local/share/noteify` on Linux.
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR))
    }

    pub fn data_dir(&self) -> &Path {
        &self.root
    }

    /// Persist `note` for `identity` and return its storage id.
    pub fn save(&self, identity: &str, note: &NoteDocument) -> Result<SavedNote> {
        let dir = self.identity_dir(identity)?;
        fs::create_dir_all(&dir)?;

        // keep ids unique when two saves land in the same millisecond
        let mut id = now_millis();
        while dir.join(file_name(id)).exists() {
            id += 1;
        }

        let path = dir.join(file_name(id));
        fs::write(&path, serde_json::to_string_pretty(note)?)?;
        info!(identity, path = %path.display(), "saved note");

        Ok(SavedNote { id, path, note: note.clone() })
    }

    /// All notes saved for `identity`, newest first.
    pub fn list(&self, identity: &str) -> Result<Vec<SavedNote>> {
        let dir = self.identity_dir(identity)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(id) = parse_id(&path) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            notes.push(SavedNote { id, path, note: serde_json::from_str(&raw)? });
        }

        notes.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(notes)
    }

    /// Load a single note.
    pub fn get(&self, identity: &str, id: u64) -> Result<SavedNote> {
        let path = self.identity_dir(identity)?.join(file_name(id));
        if !path.exists() {
            return Err(NoteError::FileNotFound(path));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(SavedNote { id, note: serde_json::from_str(&raw)?, path })
    }

    /// Delete a note; fails with [`NoteError::FileNotFound`] if it does not exist.
    pub fn delete(&self, identity: &str, id: u64) -> Result<()> {
        let path = self.identity_dir(identity)?.join(file_name(id));
        if !path.exists() {
            return Err(NoteError::FileNotFound(path));
        }
        fs::remove_file(&path)?;
        info!(identity, id, "deleted note");
        Ok(())
    }

    fn identity_dir(&self, identity: &str) -> Result<PathBuf> {
        let valid = !identity.is_empty()
            && identity.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            && !identity.starts_with('.');
        if !valid {
            return Err(NoteError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid identity: {identity:?}"),
            )));
        }
        Ok(self.root.join("notes").join(identity))
    }
}

fn file_name(id: u64) -> String {
    format!("{id}.json")
}

fn parse_id(path: &Path) -> Option<u64> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}
