//! Working copy for reviewing and correcting several segments at once.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::segment::TranslatedPage;

/// One segment under edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub original_text: String,
    /// Text as it was when the batch began
    pub as_translated: String,
    pub current: String,
}

impl BatchEntry {
    pub fn is_changed(&self) -> bool {
        self.current != self.as_translated
    }
}

/// Pending edits for the selected segments of one page.
///
/// Nothing touches the page until [`commit`](Self::commit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEdit {
    page_number: u32,
    entries: BTreeMap<usize, BatchEntry>,
}

impl BatchEdit {
    /// Snapshot the selected segments; indices outside the page are ignored.
    pub fn begin(page: &TranslatedPage, selected: &BTreeSet<usize>) -> Self {
        let entries = selected
            .iter()
            .filter_map(|&index| {
                let segment = page.segments.get(index)?;
                Some((
                    index,
                    BatchEntry {
                        original_text: segment.original_text().to_string(),
                        as_translated: segment.text.clone(),
                        current: segment.text.clone(),
                    },
                ))
            })
            .collect();

        Self {
            page_number: page.page_number,
            entries,
        }
    }

    pub const fn page_number(&self) -> u32 {
        self.page_number
    }

    pub const fn entries(&self) -> &BTreeMap<usize, BatchEntry> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `false` when `index` is not part of the batch.
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        self.entries
            .get_mut(&index)
            .map(|entry| entry.current = text.into())
            .is_some()
    }

    /// Back to the untranslated text.
    pub fn revert(&mut self, index: usize) -> bool {
        self.entries
            .get_mut(&index)
            .map(|entry| entry.current.clone_from(&entry.original_text))
            .is_some()
    }

    /// Back to the text the batch started with.
    pub fn reset(&mut self, index: usize) -> bool {
        self.entries
            .get_mut(&index)
            .map(|entry| entry.current.clone_from(&entry.as_translated))
            .is_some()
    }

    pub fn changed(&self) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_changed())
            .map(|(&index, _)| index)
            .collect()
    }

    /// Write every entry into `page`; returns the number of segments changed.
    ///
    /// A page other than the one the batch began on is left untouched.
    pub fn commit(self, page: &mut TranslatedPage) -> usize {
        if page.page_number != self.page_number {
            return 0;
        }
        let mut changed = 0;
        for (index, entry) in self.entries {
            if let Some(segment) = page.segments.get_mut(index)
                && segment.text != entry.current
            {
                segment.text = entry.current;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::TextSegment;

    fn page() -> TranslatedPage {
        let seg = |orig: &str, text: &str| {
            TextSegment::new(orig, 0.1, 0.1, 0.1, 0.02, 10.0, 612.0, 792.0).with_text(text)
        };
        TranslatedPage::new(
            2,
            String::new(),
            vec![seg("Bonjour", "Hello"), seg("Monde", "World"), seg("Chat", "Cat")],
        )
    }

    #[test]
    fn test_begin_ignores_unknown_indices() {
        let batch = BatchEdit::begin(&page(), &BTreeSet::from([0, 2, 9]));
        assert_eq!(batch.entries().keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert!(batch.changed().is_empty());
    }

    #[test]
    fn test_revert_and_reset() {
        let mut batch = BatchEdit::begin(&page(), &BTreeSet::from([0]));
        assert!(batch.set_text(0, "Hi"));
        assert_eq!(batch.changed(), vec![0]);

        assert!(batch.revert(0));
        assert_eq!(batch.entries()[&0].current, "Bonjour");

        assert!(batch.reset(0));
        assert_eq!(batch.entries()[&0].current, "Hello");
        assert!(batch.changed().is_empty());

        assert!(!batch.set_text(1, "not selected"));
    }

    #[test]
    fn test_commit_writes_only_batch_entries() {
        let mut target = page();
        let mut batch = BatchEdit::begin(&target, &BTreeSet::from([1, 2]));
        batch.set_text(1, "Earth");
        batch.revert(2);

        assert_eq!(batch.commit(&mut target), 2);
        assert_eq!(target.segments[0].text, "Hello");
        assert_eq!(target.segments[1].text, "Earth");
        assert_eq!(target.segments[2].text, "Chat");
        assert!(!target.segments[2].is_translated());
        assert_eq!(target.segments[1].original_text(), "Monde");
    }

    #[test]
    fn test_commit_to_other_page_is_noop() {
        let mut batch = BatchEdit::begin(&page(), &BTreeSet::from([0]));
        batch.set_text(0, "Hi");
        let mut other = page();
        other.page_number = 3;
        assert_eq!(batch.commit(&mut other), 0);
        assert_eq!(other.segments[0].text, "Hello");
    }
}
