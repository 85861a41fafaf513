//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's data directory following XDG conventions.
///
/// Returns `$XDG_DATA_HOME` if set, otherwise `$HOME/.local/share`.
pub fn data_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
        })
}

/// Get the default project store path.
pub fn default_store_path() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join("pdf-overlay")
}

/// Parse a page selection such as `"1-3,5"` into sorted, deduplicated
/// 1-based page numbers within `1..=total`.
///
/// Out-of-range numbers are dropped; malformed parts are reported.
pub fn parse_page_list(spec: &str, total: u32) -> Result<Vec<u32>, String> {
    let mut pages = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range start in '{part}'"))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range end in '{part}'"))?;
            pages.extend(start.max(1)..=end.min(total));
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| format!("invalid page number '{part}'"))?;
            if (1..=total).contains(&page) {
                pages.push(page);
            }
        }
    }

    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_range_is_clamped_to_document() {
        assert_eq!(parse_page_list("1-4294967295", 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_page_list("3-1", 5).unwrap(), Vec::<u32>::new());
        assert_eq!(parse_page_list("7-9", 5).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_parse_page_list_ranges_and_singles() {
        assert_eq!(parse_page_list("1-3,5", 10).unwrap(), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_parse_page_list_clamps_and_dedups() {
        assert_eq!(parse_page_list("0,2,2,4-12", 5).unwrap(), vec![2, 4, 5]);
    }

    #[test]
    fn test_parse_page_list_rejects_garbage() {
        assert!(parse_page_list("a-3", 5).is_err());
        assert!(parse_page_list("x", 5).is_err());
    }
}
