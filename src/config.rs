//! Configuration management with layered sources.
//!
//! Settings are resolved with figment in priority order:
//! 1. Environment variables (`RELICDEX_*`, highest priority)
//! 2. A `relicdex.toml` file in the working directory
//! 3. Built-in defaults
//!
//! Nested fields use `__` in environment names, e.g.
//! `RELICDEX_SEARCH__IMAGE_WEIGHT=0.5`.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{RetrievalError, RetrievalResult};
use crate::types::VECTOR_DIMENSION_300;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "relicdex.toml";

/// Top-level settings for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Settings schema version, for future migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the index and document artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Path of the tabular catalog source.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Enable debug diagnostics.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub recognition: RecognitionConfig,
}

/// Embedding table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Path of the word2vec text table. When absent or unreadable, the
    /// engine runs in degraded mode with zero vectors.
    #[serde(default)]
    pub table_path: Option<PathBuf>,

    /// Vector dimension; must match the table when one is configured.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Search behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count when the caller does not specify one.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Default blend weight for image-enhanced search, in [0, 1].
    #[serde(default = "default_image_weight")]
    pub image_weight: f32,
}

/// Image recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Call the recognizer during corpus builds.
    #[serde(default)]
    pub enabled: bool,

    /// Per-image timeout for recognizer calls.
    #[serde(default = "default_recognition_timeout")]
    pub timeout_secs: u64,
}

fn default_version() -> u32 {
    1
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/catalog.csv")
}

fn default_dimension() -> usize {
    VECTOR_DIMENSION_300
}

fn default_top_k() -> usize {
    5
}

fn default_image_weight() -> f32 {
    0.3
}

fn default_recognition_timeout() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            source_path: default_source_path(),
            debug: false,
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            recognition: RecognitionConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            table_path: None,
            dimension: default_dimension(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            image_weight: default_image_weight(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_recognition_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `relicdex.toml`, and the environment.
    pub fn load() -> RetrievalResult<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load settings with an explicit config file path, for tests.
    pub fn load_from(config_path: impl AsRef<std::path::Path>) -> RetrievalResult<Self> {
        let settings: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path.as_ref()))
            .merge(Env::prefixed("RELICDEX_").split("__"))
            .extract()
            .map_err(|e| RetrievalError::ConfigError {
                reason: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> RetrievalResult<()> {
        if self.embedding.dimension == 0 {
            return Err(RetrievalError::ConfigError {
                reason: "embedding.dimension must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.search.image_weight) {
            return Err(RetrievalError::ConfigError {
                reason: format!(
                    "search.image_weight must be in [0, 1], got {}",
                    self.search.image_weight
                ),
            });
        }
        if self.search.default_top_k == 0 {
            return Err(RetrievalError::ConfigError {
                reason: "search.default_top_k must be positive".to_string(),
            });
        }
        Ok(())
    }
}
