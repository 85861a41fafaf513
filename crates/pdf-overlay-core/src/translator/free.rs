use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Lang;
use crate::error::{Error, Result};
use super::merge::merge_translations;
use super::protect::ProtectedText;
use super::retry::{RetryPolicy, send_with_retry};
use super::traits::{Translator, TranslatorInfo, is_passthrough};

/// Default public endpoint
pub const DEFAULT_FREE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Longest query sent in one request, in characters
pub const MAX_CHUNK_CHARS: usize = 4500;

/// Keyless web translation endpoint (`translate_a/single?client=gtx`)
pub struct FreeTranslator {
    client: Client,
    pub endpoint: String,
    pub retry: RetryPolicy,
}

impl FreeTranslator {
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::TranslationRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    async fn translate_chunk(&self, query: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(source.as_str()),
            urlencoding::encode(target.as_str()),
            urlencoding::encode(query)
        );

        let response = send_with_retry("Free translator", self.retry, || self.client.get(&url)).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        parse_gtx_response(&body)
    }
}

/// Concatenate the translated sentences of a gtx response.
///
/// The payload looks like `[[["Hello","Bonjour",...],["world","monde",...]],...]`.
fn parse_gtx_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::TranslationInvalidResponse("missing sentence list".to_string()))?;

    Ok(sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect())
}

/// Group lines into newline-joined queries of at most `limit` characters.
///
/// A single line longer than `limit` travels alone.
fn chunk_lines(lines: &[String], limit: usize) -> Vec<Vec<String>> {
    let mut chunks: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for line in lines {
        let len = line.chars().count();
        let joined_len = if current.is_empty() { len } else { current_len + 1 + len };
        if !current.is_empty() && joined_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = len;
        } else {
            current_len = joined_len;
        }
        current.push(line.clone());
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl Translator for FreeTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "Free web translator",
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source: &Lang,
        target: &Lang,
    ) -> Result<Vec<String>> {
        if is_passthrough(source, target) {
            return Ok(texts.to_vec());
        }

        // Blank entries are never sent; newlines would shift every later index.
        let pending: Vec<(usize, ProtectedText)> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, text)| (index, ProtectedText::new(&text.replace(['\r', '\n'], " "))))
            .collect();

        let lines: Vec<String> = pending.iter().map(|(_, p)| p.text.clone()).collect();
        let mut translated_lines = Vec::with_capacity(lines.len());

        for chunk in chunk_lines(&lines, MAX_CHUNK_CHARS) {
            debug!("Sending {} line(s) to free translator", chunk.len());
            let response = self.translate_chunk(&chunk.join("\n"), source, target).await?;
            let received = response.lines().map(|l| l.trim().to_string()).collect();
            translated_lines.extend(merge_translations(&chunk, received));
        }

        let mut out = texts.to_vec();
        for ((index, protected), line) in pending.iter().zip(translated_lines) {
            out[*index] = protected.restore(&line);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_gtx_response() {
        let body: Value = serde_json::from_str(
            r#"[[["Hello ","Bonjour ",null,null,10],["world\n","monde\n",null,null,10],["again","encore",null,null,10]],null,"fr"]"#,
        )
        .unwrap();
        assert_eq!(parse_gtx_response(&body).unwrap(), "Hello world\nagain");
    }

    #[test]
    fn test_parse_gtx_rejects_garbage() {
        let body: Value = serde_json::from_str(r#"{"error": "nope"}"#).unwrap();
        assert!(matches!(
            parse_gtx_response(&body),
            Err(Error::TranslationInvalidResponse(_))
        ));
    }

    #[test]
    fn test_chunk_lines_respects_limit() {
        let chunks = chunk_lines(&lines(&["aaaa", "bbbb", "cc", "dddddddddddd"]), 10);
        assert_eq!(
            chunks,
            vec![lines(&["aaaa", "bbbb"]), lines(&["cc"]), lines(&["dddddddddddd"])]
        );
        for chunk in &chunks[..2] {
            assert!(chunk.join("\n").chars().count() <= 10);
        }
    }

    #[test]
    fn test_chunk_lines_empty() {
        assert!(chunk_lines(&[], 10).is_empty());
    }

    #[tokio::test]
    async fn test_same_language_is_passthrough() {
        let translator = FreeTranslator::new("http://127.0.0.1:9", RetryPolicy::new(1, 1)).unwrap();
        let texts = lines(&["Bonjour", ""]);
        let out = translator
            .translate_batch(&texts, &Lang::new("fr"), &Lang::new("fr"))
            .await
            .unwrap();
        assert_eq!(out, texts);
    }

    #[tokio::test]
    async fn test_blank_batch_makes_no_request() {
        let translator = FreeTranslator::new("http://127.0.0.1:9", RetryPolicy::new(1, 1)).unwrap();
        let texts = lines(&["  ", ""]);
        let out = translator
            .translate_batch(&texts, &Lang::new("auto"), &Lang::new("en"))
            .await
            .unwrap();
        assert_eq!(out, texts);
    }
}
