use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Lang;
use crate::error::Result;
use crate::pdf::PdfDocument;

/// Project metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub file_name: String,
    pub page_count: u32,
    pub source_lang: Lang,
    pub target_lang: Lang,
    /// Unix seconds
    pub created_at: u64,
}

/// Everything needed to create a project, including the source PDF itself.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub file_name: String,
    pub pdf_bytes: Vec<u8>,
    pub page_count: u32,
    pub source_lang: Lang,
    pub target_lang: Lang,
}

impl NewProject {
    /// Validate `pdf_bytes` as a PDF and read its page count.
    ///
    /// An empty `name` falls back to the file stem.
    pub fn from_pdf(
        name: impl Into<String>,
        file_name: impl Into<String>,
        pdf_bytes: Vec<u8>,
        source_lang: Lang,
        target_lang: Lang,
    ) -> Result<Self> {
        let file_name = file_name.into();
        let mut name = name.into();
        if name.trim().is_empty() {
            name = file_name
                .rsplit_once('.')
                .map_or(file_name.as_str(), |(stem, _)| stem)
                .to_string();
        }

        let page_count = PdfDocument::from_bytes(pdf_bytes.clone())?.page_count();

        Ok(Self {
            name,
            file_name,
            pdf_bytes,
            page_count,
            source_lang,
            target_lang,
        })
    }

    pub(crate) fn into_parts(self) -> (Project, Vec<u8>) {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let project = Project {
            id: Uuid::new_v4(),
            name: self.name,
            file_name: self.file_name,
            page_count: self.page_count,
            source_lang: self.source_lang,
            target_lang: self.target_lang,
            created_at,
        };
        (project, self.pdf_bytes)
    }
}
