//! Page index newtype bridging 1-based page numbers and mupdf's i32 indices.
//!
//! Projects, stored pages and the selection state all speak 1-based page
//! numbers; mupdf wants a 0-based `i32`. This type is the only place the
//! two meet.

use std::fmt;

use crate::error::Error;

/// A validated 0-based page index that can be handed to mupdf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the 1-based page number this index refers to.
    #[must_use]
    pub const fn page_number(self) -> u32 {
        self.0.cast_unsigned() + 1
    }

    /// Validate a 1-based page number against the document's page count.
    pub fn from_page_number(page_number: u32, total_pages: u32) -> Result<Self, Error> {
        let invalid = || Error::PdfInvalidPage {
            page: page_number,
            total: total_pages,
        };

        if page_number == 0 || page_number > total_pages {
            return Err(invalid());
        }

        let index = i32::try_from(page_number - 1).map_err(|_| invalid())?;
        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
