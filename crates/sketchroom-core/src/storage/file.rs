//! File-based storage implementation.

use super::{BoxFuture, Persistence, PersistenceError, PersistenceResult, StoredDocument};
use crate::scene::SceneDocument;
use std::fs;
use std::path::PathBuf;

/// File-based storage.
///
/// Stores one JSON file per document in a base directory.
pub struct FilePersistence {
    /// Base directory for document storage.
    base_path: PathBuf,
}

impl FilePersistence {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> PersistenceResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                PersistenceError::Io(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/sketchroom/documents/`
    /// On Windows: `%APPDATA%\sketchroom\documents\`
    pub fn default_location() -> PersistenceResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| PersistenceError::Io("Could not determine home directory".to_string()))?;

        let path = base.join("sketchroom").join("documents");
        Self::new(path)
    }

    /// Get the file path for a document ID.
    fn document_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Persistence for FilePersistence {
    fn save<'a>(
        &'a self,
        id: &str,
        document: &SceneDocument,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'a, PersistenceResult<()>> {
        let path = self.document_path(id);
        let stored = StoredDocument {
            document: document.clone(),
            thumbnail: thumbnail.map(str::to_string),
        };
        let json = match serde_json::to_string_pretty(&stored) {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(PersistenceError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json)
                .map_err(|e| PersistenceError::Io(format!("Failed to write {}: {e}", path.display())))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<SceneDocument>> {
        let path = self.document_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(PersistenceError::NotFound(id_owned));
            }

            let json = fs::read_to_string(&path)
                .map_err(|e| PersistenceError::Io(format!("Failed to read {}: {e}", path.display())))?;

            let stored: StoredDocument = serde_json::from_str(&json).map_err(|e| {
                PersistenceError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })?;
            Ok(stored.document)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let path = self.document_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    PersistenceError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| PersistenceError::Io(format!("Failed to read directory: {e}")))?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                if let Some(name) = entry.path().file_stem() {
                    if let Some(name_str) = name.to_str() {
                        // Only include .json files
                        if entry.path().extension().map(|e| e == "json").unwrap_or(false) {
                            ids.push(name_str.to_string());
                        }
                    }
                }
            }
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>> {
        let path = self.document_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}
