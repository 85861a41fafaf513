//! Persistent project store backed by sled.
//!
//! Four trees:
//! - `projects`: project id -> [`Project`]
//! - `pages`: project id ‖ big-endian page number -> [`TranslatedPage`]
//! - `blobs`: project id -> source PDF bytes
//! - `settings`: name -> JSON value
//!
//! Page records are always replaced whole.

mod project;

pub use project::{NewProject, Project};

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::{Batch, Db, Tree};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::segment::TranslatedPage;

/// Handle to the project store; cheap to clone
#[derive(Clone)]
pub struct ProjectStore {
    db: Db,
    projects: Tree,
    pages: Tree,
    blobs: Tree,
    settings: Tree,
}

fn page_key(project_id: Uuid, page_number: u32) -> [u8; 20] {
    let mut key = [0u8; 20];
    key[..16].copy_from_slice(project_id.as_bytes());
    key[16..].copy_from_slice(&page_number.to_be_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::StoreWrite(format!("Failed to serialize: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::StoreRead(format!("Corrupt record: {e}")))
}

fn read_err(e: sled::Error) -> Error {
    Error::StoreRead(e.to_string())
}

fn write_err(e: sled::Error) -> Error {
    Error::StoreWrite(e.to_string())
}

impl ProjectStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StoreOpen(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("WouldBlock") || err_str.contains("lock") {
                Error::StoreOpen(format!(
                    "Store locked at {}\n\n\
                    Another process is using it, or a previous instance crashed.\n\
                    To fix: rm {}/db/LOCK",
                    path.display(),
                    path.display()
                ))
            } else {
                Error::StoreOpen(format!("Failed to open store at {}: {}", path.display(), e))
            }
        })?;

        debug!("Opened project store at {}", path.display());
        Self::from_db(db)
    }

    /// In-memory store that disappears on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| Error::StoreOpen(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let open = |name: &str| {
            db.open_tree(name)
                .map_err(|e| Error::StoreOpen(format!("Failed to open tree {name}: {e}")))
        };
        Ok(Self {
            projects: open("projects")?,
            pages: open("pages")?,
            blobs: open("blobs")?,
            settings: open("settings")?,
            db,
        })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::StoreWrite(format!("Flush failed: {e}")))?;
        Ok(())
    }

    // ----- projects -----

    /// Persist a new project and its source PDF.
    pub fn create_project(&self, new: NewProject) -> Result<Project> {
        let (project, pdf_bytes) = new.into_parts();
        self.put_blob(project.id, &pdf_bytes)?;
        self.put_project(&project)?;
        info!(
            "Created project {} ({}, {} pages)",
            project.id, project.name, project.page_count
        );
        Ok(project)
    }

    pub fn put_project(&self, project: &Project) -> Result<()> {
        self.projects
            .insert(project.id.as_bytes(), encode(project)?)
            .map_err(write_err)?;
        self.flush()
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        self.projects
            .get(id.as_bytes())
            .map_err(read_err)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Like [`get_project`](Self::get_project), but absence is an error.
    pub fn require_project(&self, id: Uuid) -> Result<Project> {
        self.get_project(id)?
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects = self
            .projects
            .iter()
            .values()
            .map(|value| decode::<Project>(&value.map_err(read_err)?))
            .collect::<Result<Vec<_>>>()?;
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        Ok(projects)
    }

    /// Remove a project's metadata, source PDF and every page record.
    ///
    /// Returns whether the project existed.
    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let mut batch = Batch::default();
        let mut removed_pages = 0usize;
        for key in self.pages.scan_prefix(id.as_bytes()).keys() {
            batch.remove(key.map_err(read_err)?);
            removed_pages += 1;
        }
        self.pages.apply_batch(batch).map_err(write_err)?;

        self.blobs.remove(id.as_bytes()).map_err(write_err)?;
        let existed = self.projects.remove(id.as_bytes()).map_err(write_err)?.is_some();
        self.flush()?;

        info!("Deleted project {} ({} pages)", id, removed_pages);
        Ok(existed)
    }

    // ----- pages -----

    pub fn put_page(&self, project_id: Uuid, page: &TranslatedPage) -> Result<()> {
        self.pages
            .insert(page_key(project_id, page.page_number), encode(page)?)
            .map_err(write_err)?;
        self.flush()
    }

    pub fn get_page(&self, project_id: Uuid, page_number: u32) -> Result<Option<TranslatedPage>> {
        self.pages
            .get(page_key(project_id, page_number))
            .map_err(read_err)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Every stored page of a project, in page order.
    pub fn pages_for_project(&self, project_id: Uuid) -> Result<Vec<TranslatedPage>> {
        self.pages
            .scan_prefix(project_id.as_bytes())
            .values()
            .map(|value| decode(&value.map_err(read_err)?))
            .collect()
    }

    pub fn delete_page(&self, project_id: Uuid, page_number: u32) -> Result<bool> {
        let existed = self
            .pages
            .remove(page_key(project_id, page_number))
            .map_err(write_err)?
            .is_some();
        self.flush()?;
        Ok(existed)
    }

    // ----- blobs -----

    pub fn put_blob(&self, project_id: Uuid, bytes: &[u8]) -> Result<()> {
        self.blobs
            .insert(project_id.as_bytes(), bytes)
            .map_err(write_err)?;
        self.flush()
    }

    pub fn get_blob(&self, project_id: Uuid) -> Result<Option<Vec<u8>>> {
        Ok(self
            .blobs
            .get(project_id.as_bytes())
            .map_err(read_err)?
            .map(|bytes| bytes.to_vec()))
    }

    // ----- settings -----

    pub fn put_setting<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.settings
            .insert(name.as_bytes(), encode(value)?)
            .map_err(write_err)?;
        self.flush()
    }

    /// Returns whether the setting existed.
    pub fn delete_setting(&self, name: &str) -> Result<bool> {
        let existed = self
            .settings
            .remove(name.as_bytes())
            .map_err(write_err)?
            .is_some();
        self.flush()?;
        Ok(existed)
    }

    pub fn get_setting<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.settings
            .get(name.as_bytes())
            .map_err(read_err)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}

impl std::fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("projects", &self.projects.len())
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}
