use tracing::warn;

/// Pair each original with its translation by index.
///
/// Missing translations fall back to the original text and surplus ones
/// are dropped, so the result always has `originals.len()` entries.
pub fn merge_translations(originals: &[String], translated: Vec<String>) -> Vec<String> {
    if translated.len() != originals.len() {
        warn!(
            "Translation count mismatch: sent {}, received {}; falling back to originals",
            originals.len(),
            translated.len()
        );
    }

    let mut translated = translated.into_iter();
    originals
        .iter()
        .map(|original| translated.next().unwrap_or_else(|| original.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_short_response_falls_back() {
        let merged = merge_translations(&strings(&["a", "b", "c"]), strings(&["x", "y"]));
        assert_eq!(merged, strings(&["x", "y", "c"]));
    }

    #[test]
    fn test_long_response_is_truncated() {
        let merged = merge_translations(&strings(&["a"]), strings(&["x", "y"]));
        assert_eq!(merged, strings(&["x"]));
    }

    #[test]
    fn test_empty_response() {
        let merged = merge_translations(&strings(&["a", "b"]), Vec::new());
        assert_eq!(merged, strings(&["a", "b"]));
    }
}
