// src/backend/mod.rs
//! Upstream AI query interface: one batch call returning text plus grounding
//! citations, and one streaming call returning body fragments.

pub mod gemini;
pub mod mock;

use anyhow::{bail, Result};
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::KaleidoscopeConfig;
use crate::sources::Source;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

/// Result of a batch (non-streaming) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub citations: Vec<Source>,
}

/// Fragments of a streamed body, terminated by stream end or an `Err`.
pub type FragmentStream = BoxStream<'static, Result<String>>;

#[async_trait::async_trait]
pub trait NewsBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation>;
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynBackend = Arc<dyn NewsBackend>;

/// Used when no API key is configured; every call fails.
pub struct DisabledBackend;

#[async_trait::async_trait]
impl NewsBackend for DisabledBackend {
    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        bail!("backend disabled: no GEMINI_API_KEY configured")
    }
    async fn generate_stream(&self, _prompt: &str) -> Result<FragmentStream> {
        bail!("backend disabled: no GEMINI_API_KEY configured")
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Factory: build a backend according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns the deterministic mock backend.
/// * Else without an API key, returns a disabled backend.
/// * Else the Gemini backend.
pub fn build_backend(cfg: &KaleidoscopeConfig) -> Result<DynBackend> {
    if std::env::var("AI_TEST_MODE").is_ok_and(|v| v == "mock") {
        info!("backend: mock (AI_TEST_MODE=mock)");
        return Ok(Arc::new(MockBackend::default()));
    }
    if !cfg.gemini.has_key() {
        warn!("backend: disabled, GEMINI_API_KEY is not set");
        return Ok(Arc::new(DisabledBackend));
    }
    // Safe diagnostics: only model + search flag + key length
    info!(
        model = %cfg.gemini.model,
        web_search = cfg.gemini.web_search,
        key_len = cfg.gemini.api_key.len(),
        "backend: gemini"
    );
    Ok(Arc::new(GeminiBackend::new(&cfg.gemini)?))
}
