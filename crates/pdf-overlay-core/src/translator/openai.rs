use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Lang;
use crate::error::{Error, Result};
use super::merge::merge_translations;
use super::retry::{RetryPolicy, send_with_retry};
use super::traits::{Translator, TranslatorInfo, is_passthrough};

/// Strings sent per chat request
const BATCH_SIZE: usize = 40;

/// OpenAI-compatible API translator
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    pub retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        model: String,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::TranslationRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            api_key,
            model,
            retry,
        })
    }

    /// Create translation prompt for a JSON array of strings
    fn create_prompt(texts: &[String], source: &Lang, target: &Lang) -> Result<String> {
        let source_hint = if source.is_auto() {
            String::new()
        } else {
            format!(" from {}", language_name(source))
        };
        let payload = serde_json::to_string(texts)
            .map_err(|e| Error::TranslationRequest(format!("Failed to encode batch: {e}")))?;

        Ok(format!(
            "Translate each string of the following JSON array{} into {}. \
             Reply with only a JSON array of exactly {} strings in the same order, \
             no explanations. Keep numbers, URLs and placeholders unchanged.\n\n{}",
            source_hint,
            language_name(target),
            texts.len(),
            payload
        ))
    }

    async fn request_batch(&self, texts: &[String], source: &Lang, target: &Lang) -> Result<Vec<String>> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::create_prompt(texts, source, target)?,
            }],
            temperature: Some(0.3), // Lower temperature for more consistent translations
        };

        let response = send_with_retry("OpenAI", self.retry, || {
            let req = self.client.post(&url).json(&request);
            match &self.api_key {
                Some(key) => req.header("Authorization", format!("Bearer {key}")),
                None => req,
            }
        })
        .await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;
        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::TranslationInvalidResponse("No choices in response".to_string()))?;

        parse_string_array(content)
    }
}

/// Extract the JSON string array from a model reply, tolerating code
/// fences and surrounding chatter.
fn parse_string_array(content: &str) -> Result<Vec<String>> {
    let start = content.find('[');
    let end = content.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(Error::TranslationInvalidResponse(
                "reply contains no JSON array".to_string(),
            ));
        }
    };

    serde_json::from_str(json).map_err(|e| {
        warn!("Unparseable translation reply: {}", content);
        Error::TranslationInvalidResponse(e.to_string())
    })
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source: &Lang,
        target: &Lang,
    ) -> Result<Vec<String>> {
        if is_passthrough(source, target) || texts.iter().all(|t| t.trim().is_empty()) {
            return Ok(texts.to_vec());
        }

        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            debug!("Translating {} string(s) with {}", batch.len(), self.model);
            let translated = self.request_batch(batch, source, target).await?;
            out.extend(merge_translations(batch, translated));
        }
        Ok(out)
    }
}

/// Convert language code to human-readable name for prompts
fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "zh-CN" => "Simplified Chinese",
        "zh-TW" => "Traditional Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        // For unknown languages, the LLM should still understand most ISO codes
        _ => "the specified language",
    }
}
