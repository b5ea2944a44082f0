// Config module
// 設定ファイル管理

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub success_rate: f64,
    pub latency_min_ms: u32,
    pub latency_max_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultClient {
    Gemini,
    Opencode,
    Custom,
}

impl std::fmt::Display for DefaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            DefaultClient::Gemini => "gemini",
            DefaultClient::Opencode => "opencode",
            DefaultClient::Custom => "custom",
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: ThemeMode,
    pub theme_file: Option<String>,
    pub notification_ms: u64,
    pub default_client: DefaultClient,
    pub auto_update: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 8000,
            success_rate: 0.9,
            latency_min_ms: 10,
            latency_max_ms: 209,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            theme_file: None,
            notification_ms: 3000,
            default_client: DefaultClient::Gemini,
            auto_update: true,
        }
    }
}

impl UiConfig {
    /// Status bar label, e.g. `client gemini · auto-update`.
    pub fn client_label(&self) -> String {
        if self.auto_update {
            format!("client {} · auto-update", self.default_client)
        } else {
            format!("client {}", self.default_client)
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        if self.ui.notification_ms == 0 {
            return Err(ConfigError::Invalid("ui.notification_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn theme_path(&self) -> Option<PathBuf> {
        self.ui.theme_file.as_ref().map(PathBuf::from)
    }

    fn expand_env_vars(&mut self) {
        if let Some(theme_file) = &self.ui.theme_file {
            self.ui.theme_file = Some(expand_env_vars_in_string(theme_file));
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("gateway.interval_ms must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(ConfigError::Invalid(format!(
                "gateway.success_rate must be within 0..=1, got {}",
                self.success_rate
            )));
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(ConfigError::Invalid(format!(
                "gateway.latency_min_ms ({}) exceeds latency_max_ms ({})",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        Ok(())
    }
}

/// Config file candidates, lowest precedence first.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(".mcpdeck").join("config.toml"));
    }
    candidates.push(PathBuf::from(".").join(".mcpdeck").join("config.toml"));
    candidates
}

/// Loads the last existing candidate. A candidate that fails to load is
/// reported and skipped.
pub fn load_config(candidates: &[PathBuf]) -> Config {
    let mut config = None;
    for path in candidates {
        if path.exists() {
            match Config::load(path) {
                Ok(loaded) => config = Some(loaded),
                Err(err) => tracing::warn!("ignoring config: {}", err),
            }
        }
    }
    config.unwrap_or_default()
}

fn expand_env_vars_in_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            output.push(ch);
            continue;
        }

        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                while let Some(&next_ch) = chars.peek() {
                    chars.next();
                    if next_ch == '}' {
                        break;
                    }
                    name.push(next_ch);
                }
                match std::env::var(&name) {
                    Ok(val) if !name.is_empty() => output.push_str(&val),
                    _ => {
                        output.push_str("${");
                        output.push_str(&name);
                        output.push('}');
                    }
                }
            }
            Some(next_ch) if is_env_var_char(*next_ch) => {
                let mut name = String::new();
                while let Some(&next_ch) = chars.peek() {
                    if !is_env_var_char(next_ch) {
                        break;
                    }
                    name.push(next_ch);
                    chars.next();
                }
                match std::env::var(&name) {
                    Ok(val) => output.push_str(&val),
                    Err(_) => {
                        output.push('$');
                        output.push_str(&name);
                    }
                }
            }
            _ => output.push('$'),
        }
    }

    output
}

fn is_env_var_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
