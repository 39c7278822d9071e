//! Application configuration for FeedForge.
//!
//! User config lives at `~/.feedforge/feedforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeedForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "feedforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".feedforge";

// ---------------------------------------------------------------------------
// Config structs (matching feedforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingSection,

    /// Proposition-decomposition LLM settings.
    #[serde(default)]
    pub llm: LlmSection,

    /// Boundary detection thresholds.
    #[serde(default)]
    pub boundary: BoundarySection,

    /// Video segment duration bounds.
    #[serde(default)]
    pub video: VideoSection,

    /// Feed pacing.
    #[serde(default)]
    pub feed: FeedSection,
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSection {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible embeddings API.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Maximum texts per embedding request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// HTTP timeout per request.
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            api_key_env: default_embedding_key_env(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_batch_size() -> usize {
    100
}
fn default_embedding_timeout() -> u64 {
    30
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Name of the env var holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model used for proposition decomposition.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Inputs longer than this (in chars) are split before decomposition.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout per request.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_input_chars: default_max_input_chars(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_llm_model() -> String {
    "google/gemini-2.0-flash-001".into()
}
fn default_max_input_chars() -> usize {
    30_000
}
fn default_temperature() -> f32 {
    0.2
}
fn default_llm_timeout() -> u64 {
    120
}

/// `[boundary]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySection {
    /// How many standard deviations below the mean a similarity must fall.
    #[serde(default = "default_std_dev_multiplier")]
    pub std_dev_multiplier: f64,

    /// Absolute similarity drop below the mean that also qualifies.
    #[serde(default = "default_min_similarity_drop")]
    pub min_similarity_drop: f64,
}

impl Default for BoundarySection {
    fn default() -> Self {
        Self {
            std_dev_multiplier: default_std_dev_multiplier(),
            min_similarity_drop: default_min_similarity_drop(),
        }
    }
}

fn default_std_dev_multiplier() -> f64 {
    1.0
}
fn default_min_similarity_drop() -> f64 {
    0.1
}

/// `[video]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSection {
    #[serde(default = "default_target_duration")]
    pub target_duration_secs: f64,
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
}

impl Default for VideoSection {
    fn default() -> Self {
        Self {
            target_duration_secs: default_target_duration(),
            min_duration_secs: default_min_duration(),
            max_duration_secs: default_max_duration(),
        }
    }
}

fn default_target_duration() -> f64 {
    300.0
}
fn default_min_duration() -> f64 {
    180.0
}
fn default_max_duration() -> f64 {
    600.0
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSection {
    /// Content units consumed between synthesis checkpoints.
    #[serde(default = "default_synthesis_interval")]
    pub synthesis_interval: usize,

    /// Raw-text fallback length for fact cards.
    #[serde(default = "default_fact_max_chars")]
    pub fact_max_chars: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            synthesis_interval: default_synthesis_interval(),
            fact_max_chars: default_fact_max_chars(),
        }
    }
}

fn default_synthesis_interval() -> usize {
    5
}
fn default_fact_max_chars() -> usize {
    200
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime boundary detection configuration.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    pub std_dev_multiplier: f64,
    pub min_similarity_drop: f64,
    /// Texts per embedding request.
    pub batch_size: usize,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for BoundaryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            std_dev_multiplier: config.boundary.std_dev_multiplier,
            min_similarity_drop: config.boundary.min_similarity_drop,
            batch_size: config.embedding.batch_size,
        }
    }
}

/// Runtime video segmentation configuration.
#[derive(Debug, Clone)]
pub struct VideoSegmenterConfig {
    /// Informational only; the optimizer works against min/max.
    pub target_duration_secs: f64,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl Default for VideoSegmenterConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for VideoSegmenterConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_duration_secs: config.video.target_duration_secs,
            min_duration_secs: config.video.min_duration_secs,
            max_duration_secs: config.video.max_duration_secs,
        }
    }
}

impl VideoSegmenterConfig {
    /// Reject bounds the optimizer cannot honor.
    pub fn validate(&self) -> Result<()> {
        let not_positive = |secs: f64| secs.is_nan() || secs <= 0.0;
        if not_positive(self.min_duration_secs) || not_positive(self.max_duration_secs) {
            return Err(FeedForgeError::initialization(format!(
                "segment duration bounds must be positive (min={}, max={})",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(FeedForgeError::initialization(format!(
                "min_duration_secs ({}) exceeds max_duration_secs ({})",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        Ok(())
    }
}

/// Runtime feed assembly configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub synthesis_interval: usize,
    pub fact_max_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FeedConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            synthesis_interval: config.feed.synthesis_interval.max(1),
            fact_max_chars: config.feed.fact_max_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.feedforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FeedForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.feedforge/feedforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FeedForgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        FeedForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FeedForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FeedForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FeedForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a provider API key from the named env var.
///
/// Fails with `API_KEY_MISSING` when the variable is unset or blank.
pub fn resolve_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(FeedForgeError::api_key_missing(format!(
            "set the {var_name} environment variable"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("batch_size"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("min_duration_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.embedding.batch_size, 100);
        assert_eq!(parsed.llm.max_input_chars, 30_000);
        assert_eq!(parsed.feed.synthesis_interval, 5);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[video]
min_duration_secs = 120.0

[boundary]
std_dev_multiplier = 1.5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.video.min_duration_secs, 120.0);
        assert_eq!(config.video.max_duration_secs, 600.0);
        assert_eq!(config.boundary.std_dev_multiplier, 1.5);
        assert_eq!(config.boundary.min_similarity_drop, 0.1);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn runtime_configs_from_app_config() {
        let mut app = AppConfig::default();
        app.embedding.batch_size = 16;
        app.feed.synthesis_interval = 0;

        let boundary = BoundaryConfig::from(&app);
        assert_eq!(boundary.batch_size, 16);
        assert_eq!(boundary.std_dev_multiplier, 1.0);

        let video = VideoSegmenterConfig::from(&app);
        assert_eq!(video.target_duration_secs, 300.0);

        let feed = FeedConfig::from(&app);
        assert_eq!(feed.synthesis_interval, 1);
    }

    #[test]
    fn video_config_validation() {
        let ok = VideoSegmenterConfig::default();
        assert!(ok.validate().is_ok());

        let inverted = VideoSegmenterConfig {
            target_duration_secs: 300.0,
            min_duration_secs: 700.0,
            max_duration_secs: 600.0,
        };
        let err = inverted.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InitializationFailed);

        let zero = VideoSegmenterConfig {
            target_duration_secs: 0.0,
            min_duration_secs: 0.0,
            max_duration_secs: 600.0,
        };
        assert!(zero.validate().is_err());

        let nan = VideoSegmenterConfig {
            max_duration_secs: f64::NAN,
            ..VideoSegmenterConfig::default()
        };
        assert_eq!(
            nan.validate().unwrap_err().code(),
            ErrorCode::InitializationFailed
        );
    }

    #[test]
    fn api_key_resolution() {
        // Use a unique env var name to avoid interfering with other tests
        let result = resolve_api_key("FF_TEST_NONEXISTENT_KEY_12345");
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ApiKeyMissing);
        assert!(err.to_string().contains("FF_TEST_NONEXISTENT_KEY_12345"));
    }
}
