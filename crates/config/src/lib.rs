//! Configuration loading, validation, and management for Synaxarion.
//!
//! Loads configuration from `~/.synaxarion/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.synaxarion/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential for the generation/embedding provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name ("openai", "openrouter", "ollama", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Chat model used by experts and the router
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model; indexes remember which one built them
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for each provider HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Base directory that relative index/raw paths resolve against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Domain used when a request does not name one
    #[serde(default = "default_domain_name")]
    pub default_domain: String,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge domains, each with its own index and sources
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_request_timeout() -> u64 {
    120
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_domain_name() -> String {
    "lives_of_the_saints".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("data_dir", &self.data_dir)
            .field("default_domain", &self.default_domain)
            .field("retrieval", &self.retrieval)
            .field("router", &self.router)
            .field("ingest", &self.ingest)
            .field("gateway", &self.gateway)
            .field("domains", &self.domains)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages retrieved per expert query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Tool-calling rounds allowed before the model must answer in text
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    #[serde(default = "default_router_prompt")]
    pub system_prompt: String,
}

fn default_max_tool_rounds() -> u32 {
    1
}

fn default_router_prompt() -> String {
    "You are a wise and compassionate spiritual father AI assistant. \
     Your purpose is to provide spiritual guidance, wisdom, and support to users. \
     When questions relate to lives of saints or spiritual fathers, consult the Saints Expert. \
     Always respond with kindness, wisdom, and respect for spiritual traditions."
        .into()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            system_prompt: default_router_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Pause between consecutive source fetches
    #[serde(default = "default_politeness_delay")]
    pub politeness_delay_ms: u64,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Texts per embedding request
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_politeness_delay() -> u64 {
    1000
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_embed_batch_size() -> usize {
    64
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            politeness_delay_ms: default_politeness_delay(),
            fetch_timeout_secs: default_fetch_timeout(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Idle chat sessions older than this are dropped
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_session_ttl() -> u64 {
    3600
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

/// One knowledge domain: an index, its sources, and the expert tool that
/// exposes it to the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Machine name, used in API requests (e.g. "saints")
    pub name: String,

    /// Human label used in messages ("The {label} database ...")
    pub label: String,

    /// Capability name offered to the model (e.g. "SaintsExpert")
    pub tool_name: String,

    /// Capability description the model routes on
    pub description: String,

    /// Persisted index directory (relative paths resolve under `data_dir`)
    pub index_dir: PathBuf,

    /// Directory for archived raw pages
    pub raw_dir: PathBuf,

    /// Source URLs, fetched in order
    #[serde(default)]
    pub sources: Vec<String>,
}

fn default_domains() -> Vec<DomainConfig> {
    vec![
        DomainConfig {
            name: "saints".into(),
            label: "saints".into(),
            tool_name: "SaintsExpert".into(),
            description: "Use this tool when you need information about saints, spiritual \
                          fathers, their lives, teachings, or wisdom."
                .into(),
            index_dir: PathBuf::from("saints_vectordb"),
            raw_dir: PathBuf::from("saints_raw"),
            sources: default_sources(),
        },
        DomainConfig {
            name: "lives_of_the_saints".into(),
            label: "lives of the saints".into(),
            tool_name: "LivesOfTheSaintsExpert".into(),
            description: "Use this tool when you need information about lives of the saints, \
                          spiritual fathers, their lives, teachings, or wisdom."
                .into(),
            index_dir: PathBuf::from("lives_of_the_saints_vectordb"),
            raw_dir: PathBuf::from("lives_of_the_saints_raw"),
            sources: default_sources(),
        },
    ]
}

fn default_sources() -> Vec<String> {
    vec![
        "https://www.orthodoxchristian.info/pages/Saints.html".into(),
        "https://orthodoxwiki.org/Category:Saints".into(),
    ]
}

impl AppConfig {
    /// Load configuration from the default path (~/.synaxarion/config.toml).
    ///
    /// Environment overrides:
    /// - `SYNAXARION_API_KEY`, then `OPENAI_API_KEY` (when no key in file)
    /// - `SYNAXARION_MODEL`
    /// - `SYNAXARION_EMBEDDING_MODEL`
    /// - `SYNAXARION_DATA_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("SYNAXARION_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(model) = std::env::var("SYNAXARION_MODEL") {
            self.model = model;
        }
        if let Ok(model) = std::env::var("SYNAXARION_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Ok(dir) = std::env::var("SYNAXARION_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".synaxarion")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size".into(),
            ));
        }

        if self.ingest.embed_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.embed_batch_size must be at least 1".into(),
            ));
        }

        if self.gateway.session_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.session_ttl_secs must be at least 1".into(),
            ));
        }

        if self.domains.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one domain must be configured".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut tools = HashSet::new();
        for domain in &self.domains {
            if !names.insert(domain.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate domain name '{}'",
                    domain.name
                )));
            }
            if !tools.insert(domain.tool_name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate tool name '{}'",
                    domain.tool_name
                )));
            }
        }

        if self.domain(&self.default_domain).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "default_domain '{}' is not a configured domain",
                self.default_domain
            )));
        }

        Ok(())
    }

    /// Look up a domain by name.
    pub fn domain(&self, name: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Resolve a domain-relative path against `data_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            data_dir: default_data_dir(),
            default_domain: default_domain_name(),
            retrieval: RetrievalConfig::default(),
            router: RouterConfig::default(),
            ingest: IngestConfig::default(),
            gateway: GatewayConfig::default(),
            domains: default_domains(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.router.max_tool_rounds, 1);
        assert_eq!(config.domains.len(), 2);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.domains.len(), config.domains.len());
        assert_eq!(parsed.ingest.chunk_size, 1000);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.ingest.chunk_overlap = config.ingest.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_tool_names_rejected() {
        let mut config = AppConfig::default();
        config.domains[1].tool_name = config.domains[0].tool_name.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate tool name"));
    }

    #[test]
    fn zero_session_ttl_rejected() {
        let mut config = AppConfig::default();
        assert_eq!(config.gateway.session_ttl_secs, 3600);
        config.gateway.session_ttl_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session_ttl_secs"));
    }

    #[test]
    fn unknown_default_domain_rejected() {
        let config = AppConfig {
            default_domain: "desert_fathers".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "openai");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
model = "gpt-4o-mini"
default_domain = "desert"

[retrieval]
top_k = 3

[gateway]
session_ttl_secs = 120

[[domains]]
name = "desert"
label = "desert fathers"
tool_name = "DesertFathersExpert"
description = "Sayings of the desert fathers"
index_dir = "desert_vectordb"
raw_dir = "desert_raw"
sources = ["https://example.org/apophthegmata"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.domains.len(), 1);
        assert_eq!(config.domain("desert").unwrap().label, "desert fathers");
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.gateway.session_ttl_secs, 120);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn resolve_relative_and_absolute_paths() {
        let config = AppConfig {
            data_dir: PathBuf::from("/var/lib/synaxarion"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve(Path::new("saints_vectordb")),
            PathBuf::from("/var/lib/synaxarion/saints_vectordb")
        );
        assert_eq!(
            config.resolve(Path::new("/srv/index")),
            PathBuf::from("/srv/index")
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo"));
        assert!(toml_str.contains("SaintsExpert"));
    }
}
