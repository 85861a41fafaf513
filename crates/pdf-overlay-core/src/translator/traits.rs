use async_trait::async_trait;
use crate::config::Lang;
use crate::error::Result;

/// Information about a translator backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
}

/// Trait for translation backends
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get information about this translator
    fn info(&self) -> TranslatorInfo;

    /// Get the translator name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate an ordered list of strings.
    ///
    /// Backends should return one string per input in the same order, but
    /// callers must not rely on it: pass the result through
    /// [`merge_translations`](super::merge_translations).
    async fn translate_batch(
        &self,
        texts: &[String],
        source: &Lang,
        target: &Lang,
    ) -> Result<Vec<String>>;
}

/// Whether a request can be answered without calling the backend.
pub(crate) fn is_passthrough(source: &Lang, target: &Lang) -> bool {
    !source.is_auto() && source == target
}
