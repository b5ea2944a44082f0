use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Launch configuration of one MCP server.
///
/// This is the exact shape written under `mcpServers.<id>` in an exported
/// manifest, so field names and optionality must not drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

impl ServerConfig {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: None,
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Returns a copy with `key` set. Existing keys are overwritten.
    pub fn set_env(&self, key: &str, value: &str) -> Self {
        self.clone().with_env(key, value)
    }

    /// Returns a copy without `key`. The `env` map is kept (possibly empty)
    /// so the shape of an edited config stays stable.
    pub fn remove_env(&self, key: &str) -> Self {
        let mut next = self.clone();
        let mut env = next.env.take().unwrap_or_default();
        env.remove(key);
        next.env = Some(env);
        next
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// `command arg1 arg2` as a single line for listings.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// One callable capability exposed by a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
}

impl Skill {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Utility,
    Database,
    DevTools,
    #[serde(rename = "AI")]
    Ai,
    Communication,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Utility => "Utility",
            Category::Database => "Database",
            Category::DevTools => "DevTools",
            Category::Ai => "AI",
            Category::Communication => "Communication",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Active,
    Inactive,
    Error,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerStatus::Active => "active",
            ServerStatus::Inactive => "inactive",
            ServerStatus::Error => "error",
        };
        f.pad(label)
    }
}

/// A catalog entry for an installable tool provider.
///
/// `status` is advisory display state. Whether a server is installed is not
/// stored here; it is derived from the active project, see
/// [`crate::store::project_view`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub category: Category,
    pub status: ServerStatus,
    pub config: ServerConfig,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u32>,
}

impl Server {
    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Read-only template for a pre-populated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub server_ids: Vec<String>,
}

impl Blueprint {
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// `google-search-mcp` -> `Google Search Mcp`, used when a blueprint lists an
/// id the catalog does not know.
pub fn display_name_for_id(id: &str) -> String {
    id.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_without_env_omits_the_key() {
        let config = ServerConfig::new("npx", &["-y", "pkg"]);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value, serde_json::json!({ "command": "npx", "args": ["-y", "pkg"] }));
    }

    #[test]
    fn missing_args_default_to_empty() {
        let config: ServerConfig = serde_json::from_str(r#"{ "command": "uvx" }"#).unwrap();
        assert!(config.args.is_empty());
        assert_eq!(config.env, None);
    }

    #[test]
    fn remove_env_keeps_an_empty_map() {
        let config = ServerConfig::new("npx", &[]).with_env("TOKEN", "x");
        let edited = config.remove_env("TOKEN");
        assert_eq!(edited.env, Some(BTreeMap::new()));
        assert_eq!(config.env.as_ref().map(|e| e.len()), Some(1));
    }

    #[test]
    fn category_uses_original_labels() {
        assert_eq!(serde_json::to_string(&Category::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&Category::DevTools).unwrap(), "\"DevTools\"");
    }

    #[test]
    fn display_name_title_cases_segments() {
        assert_eq!(display_name_for_id("arxiv-mcp"), "Arxiv Mcp");
        assert_eq!(display_name_for_id("google-calendar-mcp"), "Google Calendar Mcp");
    }
}
