mod free;
mod merge;
mod openai;
mod protect;
mod retry;
mod traits;

pub use free::{DEFAULT_FREE_ENDPOINT, FreeTranslator, MAX_CHUNK_CHARS};
pub use merge::merge_translations;
pub use openai::OpenAiTranslator;
pub use protect::ProtectedText;
pub use retry::{DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS, RetryPolicy};
pub use traits::{Translator, TranslatorInfo};

use crate::config::{BackendKind, TranslatorConfig};
use crate::error::Result;
use std::sync::Arc;

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let retry = RetryPolicy::new(config.retry_count, config.retry_delay_ms);

    let translator: Arc<dyn Translator> = match config.backend {
        BackendKind::Free => Arc::new(FreeTranslator::new(config.free_endpoint.clone(), retry)?),
        BackendKind::OpenAi => Arc::new(OpenAiTranslator::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.model.clone(),
            retry,
        )?),
    };

    tracing::debug!("Using translator backend: {}", translator.name());
    Ok(translator)
}
