// src/config/mod.rs
pub mod gemini;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompt::DEFAULT_MIN_ARTICLES;
use crate::topic::Topic;
pub use gemini::GeminiConfig;

pub const ENV_CONFIG_PATH: &str = "KALEIDOSCOPE_CONFIG_PATH";
pub const ENV_METRICS: &str = "KALEIDOSCOPE_METRICS";

fn default_min_articles() -> u32 {
    DEFAULT_MIN_ARTICLES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaleidoscopeConfig {
    /// Region label shown first; unknown labels fall back to 阿曼.
    #[serde(default)]
    pub default_topic: Option<String>,
    #[serde(default = "default_min_articles")]
    pub min_articles: u32,
    /// Expose `/metrics`.
    #[serde(default)]
    pub metrics: bool,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl Default for KaleidoscopeConfig {
    fn default() -> Self {
        Self {
            default_topic: None,
            min_articles: default_min_articles(),
            metrics: false,
            gemini: GeminiConfig::default(),
        }
    }
}

impl KaleidoscopeConfig {
    pub fn initial_topic(&self) -> Topic {
        self.default_topic
            .as_deref()
            .map(Topic::from_label_or_default)
            .unwrap_or_default()
    }

    /// Apply env overrides and resolve secrets.
    fn finish(mut self) -> Self {
        self.gemini.resolve();
        if std::env::var(ENV_METRICS).is_ok_and(|v| v == "1") {
            self.metrics = true;
        }
        if self.min_articles == 0 {
            self.min_articles = default_min_articles();
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<KaleidoscopeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg.finish())
}

/// Load config using env var + fallbacks:
/// 1) $KALEIDOSCOPE_CONFIG_PATH
/// 2) config/kaleidoscope.toml
/// 3) config/kaleidoscope.json
/// 4) built-in defaults
pub fn load_default() -> Result<KaleidoscopeConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/kaleidoscope.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/kaleidoscope.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(KaleidoscopeConfig::default().finish())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<KaleidoscopeConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            if let Ok(v) = toml::from_str(s) {
                return Ok(v);
            }
            bail!("unsupported config format")
        }
    }
}
