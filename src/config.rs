//! Configuration parsing and validation.
//!
//! Smart Librarian reads a TOML file (default `./config/librarian.toml`).
//! Every section is optional; a missing file yields the built-in defaults.
//! A handful of environment variables are applied on top of the file, then
//! the result is validated.
//!
//! # Example
//!
//! ```toml
//! [index]
//! path = "./data/librarian.sqlite"
//! collection = "books"
//! distance = "cosine"
//!
//! [corpus]
//! path = "./data/books.json"
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! batch_size = 128
//!
//! [completion]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! temperature = 0.6
//!
//! [retrieval]
//! top_k = 5
//!
//! [prompt]
//! language = "Romanian"
//!
//! [server]
//! bind = "127.0.0.1:7341"
//!
//! [pricing.chat.gpt-4o-mini]
//! input_per_million = 0.60
//! output_per_million = 2.40
//!
//! [pricing.embedding]
//! text-embedding-3-small = 0.02
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `OPENAI_MODEL_GPT` | `completion.model` |
//! | `OPENAI_MODEL_EMB` | `embedding.model` |
//! | `LIBRARIAN_INDEX_PATH` | `index.path` |
//! | `LIBRARIAN_COLLECTION` | `index.collection` |
//! | `LIBRARIAN_TOP_K` | `retrieval.top_k` |
//! | `LIBRARIAN_BOOKS_JSON` | `corpus.path` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use librarian_core::embedding::Distance;
use librarian_core::ingest::{IngestParams, DEFAULT_BATCH_SIZE};
use librarian_core::librarian::DEFAULT_TEMPERATURE;
use librarian_core::pricing::{ChatPrice, PriceTable};
use librarian_core::retrieve::{RetrievalParams, DEFAULT_TOP_K};
use librarian_core::LibrarianSettings;

/// Base URL of the hosted OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub distance: Distance,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            collection: default_collection(),
            distance: Distance::default(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/librarian.sqlite")
}
fn default_collection() -> String {
    "books".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("./data/books.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
            base_url: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_completion_model(),
            temperature: DEFAULT_TEMPERATURE,
            max_retries: default_max_retries(),
            timeout_secs: default_completion_timeout(),
            base_url: None,
        }
    }
}

impl CompletionConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_completion_timeout() -> u64 {
    60
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "Romanian".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Price overrides, merged over the built-in table.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PricingConfig {
    #[serde(default)]
    pub chat: HashMap<String, ChatPrice>,
    #[serde(default)]
    pub embedding: HashMap<String, f64>,
}

impl Config {
    /// Built-in prices with any configured entries layered on top.
    pub fn price_table(&self) -> PriceTable {
        let mut table = PriceTable::default();
        table.chat.extend(self.pricing.chat.clone());
        table.embedding.extend(self.pricing.embedding.clone());
        table
    }

    pub fn ingest_params(&self) -> IngestParams {
        IngestParams {
            collection: self.index.collection.clone(),
            distance: self.index.distance,
            batch_size: self.embedding.batch_size,
        }
    }

    pub fn retrieval_params(&self) -> RetrievalParams {
        RetrievalParams {
            collection: self.index.collection.clone(),
            top_k: self.retrieval.top_k,
        }
    }

    pub fn librarian_settings(&self) -> LibrarianSettings {
        LibrarianSettings {
            collection: self.index.collection.clone(),
            top_k: self.retrieval.top_k,
            temperature: self.completion.temperature,
            language: self.prompt.language.clone(),
            prices: self.price_table(),
        }
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENAI_MODEL_GPT") {
            self.completion.model = v;
        }
        if let Some(v) = lookup("OPENAI_MODEL_EMB") {
            self.embedding.model = v;
        }
        if let Some(v) = lookup("LIBRARIAN_INDEX_PATH") {
            self.index.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LIBRARIAN_COLLECTION") {
            self.index.collection = v;
        }
        if let Some(v) = lookup("LIBRARIAN_TOP_K") {
            self.retrieval.top_k = v
                .trim()
                .parse()
                .with_context(|| format!("LIBRARIAN_TOP_K is not a number: '{}'", v))?;
        }
        if let Some(v) = lookup("LIBRARIAN_BOOKS_JSON") {
            self.corpus.path = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.collection.trim().is_empty() {
            bail!("index.collection must not be empty");
        }

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }

        if self.embedding.batch_size < 1 {
            bail!("embedding.batch_size must be >= 1");
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            bail!("completion.temperature must be in [0.0, 2.0]");
        }

        for (section, provider, model) in [
            ("embedding", &self.embedding.provider, &self.embedding.model),
            ("completion", &self.completion.provider, &self.completion.model),
        ] {
            match provider.as_str() {
                "openai" | "disabled" => {}
                other => bail!(
                    "Unknown {} provider: '{}'. Must be openai or disabled.",
                    section,
                    other
                ),
            }
            if model.trim().is_empty() {
                bail!("{}.model must not be empty", section);
            }
        }

        for (model, price) in &self.pricing.chat {
            for (field, value) in [
                ("input_per_million", price.input_per_million),
                ("output_per_million", price.output_per_million),
            ] {
                if !valid_price(value) {
                    bail!(
                        "pricing.chat.{}.{} must be a finite number >= 0, got {}",
                        model,
                        field,
                        value
                    );
                }
            }
        }
        for (model, &value) in &self.pricing.embedding {
            if !valid_price(value) {
                bail!(
                    "pricing.embedding.{} must be a finite number >= 0, got {}",
                    model,
                    value
                );
            }
        }

        Ok(())
    }
}

fn valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Load the config file (or defaults if it does not exist), apply
/// environment overrides from the process environment, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: &Path, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env(lookup)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = load_config_with(Path::new("/nonexistent/librarian.toml"), no_env).unwrap();
        assert_eq!(cfg.index.collection, "books");
        assert_eq!(cfg.index.distance, Distance::Cosine);
        assert_eq!(cfg.embedding.model, "text-embedding-3-small");
        assert_eq!(cfg.embedding.batch_size, 128);
        assert_eq!(cfg.completion.model, "gpt-4o-mini");
        assert!((cfg.completion.temperature - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.prompt.language, "Romanian");
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
        assert_eq!(cfg.completion.base_url(), OPENAI_BASE_URL);
    }

    #[test]
    fn test_example_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/librarian.example.toml");
        let cfg = load_config_with(&path, no_env).unwrap();
        assert_eq!(cfg.index.collection, "books");
        assert_eq!(cfg.price_table(), PriceTable::default());
    }

    #[test]
    fn test_partial_file() {
        let file = write_config(
            r#"
            [index]
            collection = "novels"
            distance = "l2"

            [retrieval]
            top_k = 3

            [embedding]
            base_url = "http://localhost:9999/v1"
            "#,
        );
        let cfg = load_config_with(file.path(), no_env).unwrap();
        assert_eq!(cfg.index.collection, "novels");
        assert_eq!(cfg.index.distance, Distance::L2);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.embedding.base_url(), "http://localhost:9999/v1");
        assert_eq!(cfg.index.path, PathBuf::from("./data/librarian.sqlite"));
    }

    #[test]
    fn test_env_overrides() {
        let env = |key: &str| match key {
            "OPENAI_MODEL_GPT" => Some("gpt-4o".to_string()),
            "OPENAI_MODEL_EMB" => Some("text-embedding-3-large".to_string()),
            "LIBRARIAN_TOP_K" => Some("7".to_string()),
            "LIBRARIAN_COLLECTION" => Some("shelf".to_string()),
            "LIBRARIAN_BOOKS_JSON" => Some("/tmp/books.json".to_string()),
            _ => None,
        };
        let cfg = load_config_with(Path::new("/nonexistent.toml"), env).unwrap();
        assert_eq!(cfg.completion.model, "gpt-4o");
        assert_eq!(cfg.embedding.model, "text-embedding-3-large");
        assert_eq!(cfg.retrieval.top_k, 7);
        assert_eq!(cfg.index.collection, "shelf");
        assert_eq!(cfg.corpus.path, PathBuf::from("/tmp/books.json"));
    }

    #[test]
    fn test_bad_top_k_env() {
        let env = |key: &str| (key == "LIBRARIAN_TOP_K").then(|| "many".to_string());
        assert!(load_config_with(Path::new("/nonexistent.toml"), env).is_err());
    }

    #[test]
    fn test_validation_failures() {
        for body in [
            "[retrieval]\ntop_k = 0",
            "[embedding]\nbatch_size = 0",
            "[completion]\ntemperature = 2.5",
            "[embedding]\nprovider = \"local\"",
            "[completion]\nmodel = \"  \"",
            "[index]\ncollection = \"\"",
            "[index]\ndistance = \"manhattan\"",
            "[pricing.chat.gpt-4o]\ninput_per_million = -5.0\noutput_per_million = 1.0",
            "[pricing.chat.gpt-4o]\ninput_per_million = 5.0\noutput_per_million = -1.0",
            "[pricing.chat.gpt-4o]\ninput_per_million = nan\noutput_per_million = 1.0",
            "[pricing.embedding]\ntext-embedding-3-small = -0.02",
            "[pricing.embedding]\ntext-embedding-3-small = inf",
        ] {
            let file = write_config(body);
            assert!(
                load_config_with(file.path(), no_env).is_err(),
                "expected failure for {:?}",
                body
            );
        }
    }

    #[test]
    fn test_invalid_toml_fails() {
        let file = write_config("[index\ncollection = ");
        assert!(load_config_with(file.path(), no_env).is_err());
    }

    #[test]
    fn test_pricing_merges_over_defaults() {
        let file = write_config(
            r#"
            [pricing.chat.local-model]
            input_per_million = 1.0
            output_per_million = 2.0

            [pricing.embedding]
            text-embedding-3-small = 0.5
            "#,
        );
        let cfg = load_config_with(file.path(), no_env).unwrap();
        let table = cfg.price_table();
        assert!(table.chat.contains_key("gpt-4o"));
        assert!(table.chat.contains_key("local-model"));
        assert_eq!(table.embedding["text-embedding-3-small"], 0.5);
    }

    #[test]
    fn test_core_params() {
        let cfg = Config::default();
        let ingest = cfg.ingest_params();
        assert_eq!(ingest.collection, "books");
        assert_eq!(ingest.batch_size, 128);
        let settings = cfg.librarian_settings();
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.language, "Romanian");
        assert_eq!(cfg.retrieval_params().top_k, 5);
    }
}
