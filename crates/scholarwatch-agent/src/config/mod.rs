//! Configuration loading for scholarwatch.
//! Reads config/scholarwatch.toml, or the path given by `--config` or the
//! SCHOLARWATCH_CONFIG env var. A commented template is written on first run.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use scholarwatch_common::WatchError;
use scholarwatch_ingestion::query;
use scholarwatch_ingestion::sources::wos::WOS_MAX_PAGE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/scholarwatch.toml";
pub const RUN_AT_FORMAT: &str = "%H:%M";

const ENV_CONFIG:         &str = "SCHOLARWATCH_CONFIG";
const ENV_WOS_API_KEY:    &str = "SCHOLARWATCH_WOS_API_KEY";
const ENV_OPENAI_API_KEY: &str = "SCHOLARWATCH_OPENAI_API_KEY";
const ENV_SMTP_PASSWORD:  &str = "SCHOLARWATCH_SMTP_PASSWORD";

pub const DEFAULT_TEMPLATE: &str = r#"# scholarwatch configuration.
# Secrets may be left empty here and supplied through the environment
# (or a .env file): SCHOLARWATCH_WOS_API_KEY, SCHOLARWATCH_OPENAI_API_KEY,
# SCHOLARWATCH_SMTP_PASSWORD.

[api]
wos_key = ""
openai_key = ""

[llm]
# "openai" or "ollama"
provider = "openai"
openai_model = "gpt-4o-mini"
ollama_model = "phi3.5"
ollama_url = "http://localhost:11434"
# Language of summaries and of the literature review.
language = "English"

[email]
smtp_server = "smtp.gmail.com"
smtp_port = 587
sender_email = "your-email-here@mail.com"
sender_password = ""
recipient_email = "your-email-here@mail.com"

[search]
topics = ["machine learning", "deep learning"]
days_lookback = 1
max_results = 10

[schedule]
# Local wall-clock time of the daily run.
run_at = "08:00"

[system]
temp_dir = "temp"
log_dir = "logs"
thesis_path = "config/ThesisSubject.md"
"#;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    pub email: EmailConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    pub wos_key: Option<SecretString>,
    pub openai_key: Option<SecretString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Ollama,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_provider()     -> String { "openai".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_ollama_model() -> String { "phi3.5".to_string() }
fn default_ollama_url()   -> String { "http://localhost:11434".to_string() }
fn default_language()     -> String { "English".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai_model: default_openai_model(),
            ollama_model: default_ollama_model(),
            ollama_url: default_ollama_url(),
            language: default_language(),
        }
    }
}

impl LlmConfig {
    pub fn provider(&self) -> Result<Provider, WatchError> {
        match self.provider.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => Err(WatchError::Config(format!(
                "llm.provider must be \"openai\" or \"ollama\", got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: Option<SecretString>,
    pub recipient_email: String,
}

fn default_smtp_server() -> String { "smtp.gmail.com".to_string() }
fn default_smtp_port()   -> u16    { 587 }

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    pub topics: Vec<String>,
    #[serde(default = "default_days_lookback")]
    pub days_lookback: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_days_lookback() -> u32   { 1 }
fn default_max_results()   -> usize { 10 }

#[derive(Debug, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_run_at")]
    pub run_at: String,
}

fn default_run_at() -> String { "08:00".to_string() }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { run_at: default_run_at() }
    }
}

impl ScheduleConfig {
    pub fn run_at_time(&self) -> Result<NaiveTime, WatchError> {
        NaiveTime::parse_from_str(self.run_at.trim(), RUN_AT_FORMAT).map_err(|e| {
            WatchError::Config(format!("schedule.run_at must be HH:MM, got {:?}: {e}", self.run_at))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_thesis_path")]
    pub thesis_path: PathBuf,
}

fn default_temp_dir()    -> PathBuf { PathBuf::from("temp") }
fn default_log_dir()     -> PathBuf { PathBuf::from("logs") }
fn default_thesis_path() -> PathBuf { PathBuf::from("config/ThesisSubject.md") }

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            log_dir: default_log_dir(),
            thesis_path: default_thesis_path(),
        }
    }
}


impl Config {
    /// `--config` wins over SCHOLARWATCH_CONFIG, which wins over the default path.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Write the commented template if nothing exists at `path`.
    /// Returns whether a file was created.
    pub fn write_default_if_missing(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_TEMPLATE)?;
        Ok(true)
    }

    /// Parse `path` and apply environment overrides for secrets.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.api.wos_key = non_empty(config.api.wos_key.take());
        config.api.openai_key = non_empty(config.api.openai_key.take());
        config.email.sender_password = non_empty(config.email.sender_password.take());
        Ok(config)
    }

    /// Non-empty environment values replace the file's secrets.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(SecretString::from);
        if let Some(key) = secret(ENV_WOS_API_KEY) {
            self.api.wos_key = Some(key);
        }
        if let Some(key) = secret(ENV_OPENAI_API_KEY) {
            self.api.openai_key = Some(key);
        }
        if let Some(password) = secret(ENV_SMTP_PASSWORD) {
            self.email.sender_password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.api.wos_key.is_none() {
            return Err(WatchError::Config(format!(
                "api.wos_key is empty; set it or {ENV_WOS_API_KEY}"
            )));
        }
        if self.llm.provider()? == Provider::OpenAi && self.api.openai_key.is_none() {
            return Err(WatchError::Config(format!(
                "llm.provider is \"openai\" but api.openai_key is empty; set it or {ENV_OPENAI_API_KEY}"
            )));
        }
        if self.search.days_lookback == 0 {
            return Err(WatchError::Config("search.days_lookback must be at least 1".to_string()));
        }
        if !(1..=WOS_MAX_PAGE).contains(&self.search.max_results) {
            return Err(WatchError::Config(format!(
                "search.max_results must be between 1 and {WOS_MAX_PAGE}, got {}",
                self.search.max_results
            )));
        }
        query::validate_topics(&self.search.topics)
            .map_err(|e| WatchError::Config(format!("search.topics: {e}")))?;
        self.schedule.run_at_time()?;
        Ok(())
    }
}

fn non_empty(secret: Option<SecretString>) -> Option<SecretString> {
    secret.filter(|s| !s.expose_secret().trim().is_empty())
}
