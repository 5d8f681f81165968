// src/backend/gemini.rs
//! Gemini provider over the Generative Language REST API.
//!
//! Batch: `models/{model}:generateContent`. Detail: `models/{model}:streamGenerateContent?alt=sse`,
//! where every `data:` line is a full response object carrying the next text delta.

use anyhow::{anyhow, bail, Context, Result};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{FragmentStream, Generation, NewsBackend};
use crate::config::GeminiConfig;
use crate::sources::Source;

const USER_AGENT: &str = "mideast-kaleidoscope/0.1";
const ERROR_BODY_EXCERPT: usize = 300;

pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    web_search: bool,
}

impl GeminiBackend {
    pub fn new(cfg: &GeminiConfig) -> Result<Self> {
        // Connect timeout only: detail streams legitimately run for a long time.
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            web_search: cfg.web_search,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut { text: prompt }],
            }],
            tools: if self.web_search {
                vec![Tool {
                    google_search: EmptyObject {},
                }]
            } else {
                Vec::new()
            },
        }
    }

    async fn post(&self, url: &str, prompt: &str) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .context("sending gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            bail!("gemini returned {status}: {excerpt}");
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl NewsBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let resp = self.post(&self.endpoint("generateContent"), prompt).await?;
        let body: GenerateResponse = resp.json().await.context("decoding gemini response")?;
        if let Some(err) = body.error {
            bail!("gemini error: {}", err.message);
        }
        let generation = Generation {
            text: body.text(),
            citations: body.citations(),
        };
        debug!(
            chars = generation.text.len(),
            citations = generation.citations.len(),
            "gemini batch response"
        );
        Ok(generation)
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let resp = self.post(&url, prompt).await?;

        let fragments = async_stream::stream! {
            let mut body = Box::pin(resp.bytes_stream());
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(anyhow::Error::new(e).context("reading gemini stream"));
                        return;
                    }
                };
                for line in decoder.push(&chunk) {
                    match decode_sse_line(&line) {
                        Ok(Some(text)) => yield Ok(text),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
            if let Some(line) = decoder.finish() {
                match decode_sse_line(&line) {
                    Ok(Some(text)) => yield Ok(text),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };
        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Wire types
// ------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Debug, Default, Deserialize)]
struct PartIn {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, thought parts excluded.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn citations(&self) -> Vec<Source> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|gm| {
                gm.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| Source::from_citation(web.title.as_deref(), web.uri.as_deref()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ------------------------------------------------------------
// SSE framing
// ------------------------------------------------------------

/// Splits a byte stream into lines. Bytes are buffered until a newline so a
/// multi-byte character cut across chunks is decoded whole.
#[derive(Debug, Default)]
struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim_end().to_string());
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end().to_string())
    }
}

/// `Some(text)` for a `data:` line carrying text, `None` for anything else.
fn decode_sse_line(line: &str) -> Result<Option<String>> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    let resp: GenerateResponse =
        serde_json::from_str(payload).context("decoding gemini stream event")?;
    if let Some(err) = resp.error {
        return Err(anyhow!("gemini stream error: {}", err.message));
    }
    let text = resp.text();
    Ok((!text.is_empty()).then_some(text))
}
