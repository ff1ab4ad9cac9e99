//! Process configuration.
//!
//! Built once at startup from defaults, an optional TOML file and the
//! environment, then handed by reference to the components that need it.
//! Nothing here is mutated after [`AppConfig::load`] returns.

use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const CONFIG_PATH_VAR: &str = "REDSCRIBE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "redscribe.toml";

pub const REDDIT_CLIENT_ID_VAR: &str = "REDDIT_CLIENT_ID";
pub const REDDIT_CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";
pub const REDDIT_USER_AGENT_VAR: &str = "REDDIT_USER_AGENT";
pub const LLM_PROVIDER_VAR: &str = "REDSCRIBE_LLM_PROVIDER";
pub const LLM_MODEL_VAR: &str = "REDSCRIBE_LLM_MODEL";

/// Reddit serves at most this many items in one listing page.
pub const REDDIT_LISTING_CAP: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditSettings,
    pub llm: LlmSettings,
    pub ui: UiSettings,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub api_base: String,
    pub token_url: String,
    pub timeout_secs: u64,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: None,
            api_base: "https://oauth.reddit.com".to_string(),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for RedditSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("api_base", &self.api_base)
            .field("token_url", &self.token_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// The three values needed for app-only Reddit access.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RedditSettings {
    pub fn credentials(&self) -> Result<RedditCredentials, ConfigError> {
        fn required(value: &Option<String>, var_name: &str) -> Result<String, ConfigError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: var_name.to_string(),
                })
        }

        Ok(RedditCredentials {
            client_id: required(&self.client_id, REDDIT_CLIENT_ID_VAR)?,
            client_secret: required(&self.client_secret, REDDIT_CLIENT_SECRET_VAR)?,
            user_agent: required(&self.user_agent, REDDIT_USER_AGENT_VAR)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => f.write_str("OpenAI"),
            ProviderKind::Anthropic => f.write_str("Anthropic"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(ConfigError::InvalidValue {
                field: "llm.provider".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            api_base: None,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_base())
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub max_fetch_limit: u32,
    pub default_fetch_limit: u32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            max_fetch_limit: 50,
            default_fetch_limit: 10,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(&lookup)?;
        config.validate()?;

        if let Err(e) = config.reddit.credentials() {
            warn!("Reddit credentials incomplete, searches will fail: {}", e);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidValue {
                field: CONFIG_PATH_VAR.to_string(),
                value: format!("{}: {}", path.display(), e),
            },
        })?;
        info!("Loading configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(REDDIT_CLIENT_ID_VAR) {
            self.reddit.client_id = Some(v);
        }
        if let Some(v) = non_empty(REDDIT_CLIENT_SECRET_VAR) {
            self.reddit.client_secret = Some(v);
        }
        if let Some(v) = non_empty(REDDIT_USER_AGENT_VAR) {
            self.reddit.user_agent = Some(v);
        }
        if let Some(v) = non_empty(LLM_PROVIDER_VAR) {
            self.llm.provider = v.parse()?;
        }
        if let Some(v) = non_empty(LLM_MODEL_VAR) {
            self.llm.model = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ui = &self.ui;
        if ui.max_fetch_limit == 0 || ui.max_fetch_limit > REDDIT_LISTING_CAP {
            return Err(ConfigError::InvalidValue {
                field: "ui.max_fetch_limit".to_string(),
                value: ui.max_fetch_limit.to_string(),
            });
        }
        if ui.default_fetch_limit == 0 || ui.default_fetch_limit > ui.max_fetch_limit {
            return Err(ConfigError::InvalidValue {
                field: "ui.default_fetch_limit".to_string(),
                value: ui.default_fetch_limit.to_string(),
            });
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
