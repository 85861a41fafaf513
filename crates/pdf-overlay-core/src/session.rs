//! In-memory view of one project's pages, written through to the store.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::segment::{TextSegment, TranslatedPage};
use crate::store::{Project, ProjectStore};

/// A project plus every translated page loaded from the store
#[derive(Debug, Clone)]
pub struct ProjectSession {
    store: ProjectStore,
    project: Project,
    pages: BTreeMap<u32, TranslatedPage>,
}

impl ProjectSession {
    /// Load a project and its pages.
    pub fn load(store: ProjectStore, project_id: Uuid) -> Result<Self> {
        let project = store.require_project(project_id)?;
        let pages = store
            .pages_for_project(project_id)?
            .into_iter()
            .map(|page| (page.page_number, page))
            .collect::<BTreeMap<_, _>>();

        debug!(
            "Loaded project {} with {}/{} translated pages",
            project.id,
            pages.len(),
            project.page_count
        );

        Ok(Self {
            store,
            project,
            pages,
        })
    }

    /// Re-read pages from the store, e.g. after a translation pass.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::load(self.store.clone(), self.project.id)?;
        Ok(())
    }

    pub const fn project(&self) -> &Project {
        &self.project
    }

    pub const fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn page(&self, page_number: u32) -> Option<&TranslatedPage> {
        self.pages.get(&page_number)
    }

    pub fn pages(&self) -> impl Iterator<Item = &TranslatedPage> {
        self.pages.values()
    }

    pub fn translated_page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    pub fn is_translated(&self, page_number: u32) -> bool {
        self.pages.contains_key(&page_number)
    }

    /// First page after `after` with no translation, if any.
    pub fn first_untranslated(&self, after: u32) -> Option<u32> {
        (after.saturating_add(1)..=self.project.page_count).find(|n| !self.pages.contains_key(n))
    }

    /// Replace a page's segments wholesale and persist the page.
    pub fn save_page_segments(&mut self, page_number: u32, segments: Vec<TextSegment>) -> Result<()> {
        let page = self
            .pages
            .get_mut(&page_number)
            .ok_or(Error::PdfInvalidPage {
                page: page_number,
                total: self.project.page_count,
            })?;
        page.replace_segments(segments);
        self.store.put_page(self.project.id, page)?;
        debug!("Saved segments of page {}", page_number);
        Ok(())
    }
}
