//! Checkpoint and catalog persistence.
//!
//! Both documents are plain JSON, written atomically (temp file in the same
//! directory, then persist over the target) so an interrupted write never
//! leaves a torn file behind. Absent or malformed persisted state is treated
//! as absence: a warning is logged and defaults are used.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::crawl::Cursor;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to persist temp file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Persisted crawl progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub cursor: Cursor,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            saved_at: Utc::now(),
        }
    }

    /// Load a checkpoint, falling back to `origin` when the file is absent
    /// or malformed.
    pub fn load_or(path: &Path, origin: Cursor) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no checkpoint file; starting from origin");
                return Self::new(origin);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "checkpoint unreadable; starting from origin");
                return Self::new(origin);
            }
        };

        match serde_json::from_str(&contents) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "checkpoint malformed; starting from origin");
                Self::new(origin)
            }
        }
    }

    /// Unconditionally overwrite the checkpoint file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json_atomic(path, self)?;
        info!(path = %path.display(), cursor = ?self.cursor, "checkpoint saved");
        Ok(())
    }
}

/// On-disk shape of the catalog output file.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub last_updated: DateTime<Utc>,
    pub projects: Vec<CatalogEntry>,
}

/// Seed an in-memory catalog from a pre-existing output file, so known ids
/// are skipped on re-processing. Absent or malformed files yield an empty
/// catalog.
pub fn load_catalog_seed(path: &Path) -> Catalog {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Catalog::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "existing catalog unreadable; starting empty");
            return Catalog::new();
        }
    };

    match serde_json::from_str::<CatalogDocument>(&contents) {
        Ok(document) => {
            let catalog: Catalog = document.projects.into_iter().collect();
            info!(path = %path.display(), entries = catalog.len(), "seeded catalog from existing output");
            catalog
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "existing catalog malformed; starting empty");
            Catalog::new()
        }
    }
}

/// Write the full catalog, freshness timestamp first, entries ordered by
/// demand index descending.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<(), StoreError> {
    let document = CatalogDocument {
        last_updated: Utc::now(),
        projects: catalog.sorted_by_demand().into_iter().cloned().collect(),
    };
    write_json_atomic(path, &document)?;
    info!(path = %path.display(), entries = catalog.len(), "catalog saved");
    Ok(())
}

/// Serialize `value` and atomically replace `path` with it.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut temp = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    temp.write_all(json.as_bytes())?;
    temp.flush()?;
    temp.persist(path)?;

    Ok(())
}
