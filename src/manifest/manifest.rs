// Manifest module
// プロジェクトマニフェストのエクスポート・インポート

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::ServerConfig;
use crate::store::ProjectServer;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest must be a JSON object")]
    NotAnObject,
    #[error("manifest has no mcpServers object")]
    MissingServers,
    #[error("invalid config for {id}: {source}")]
    Entry {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a project exports: configs of its installed servers plus its
/// secret overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Manifest {
    pub fn from_view(view: &[ProjectServer<'_>], overrides: &BTreeMap<String, String>) -> Self {
        let mcp_servers = view
            .iter()
            .filter(|entry| entry.installed)
            .map(|entry| (entry.server.id.clone(), entry.server.config.clone()))
            .collect();
        Self {
            mcp_servers,
            overrides: overrides.clone(),
        }
    }

    pub fn to_pretty_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let content = self.to_pretty_json()?;
        std::fs::write(path, content).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Receives the `mcpServers` part of an imported manifest.
pub trait ImportSink {
    fn import_servers(&mut self, servers: BTreeMap<String, ServerConfig>) -> ImportReport;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub updated: Vec<String>,
    pub installed: Vec<String>,
    pub unknown: Vec<String>,
}

/// `mcp-config-<name>.json` with the name lower-cased and each whitespace
/// run replaced by one hyphen.
pub fn export_filename(project_name: &str) -> String {
    let mut slug = String::with_capacity(project_name.len());
    let mut in_space = false;
    for ch in project_name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(ch);
            in_space = false;
        }
    }
    format!("mcp-config-{}.json", slug)
}

/// Extracts `mcpServers` from manifest text. Every entry must have the
/// server config shape; the first bad entry fails the whole import.
pub fn parse_import(text: &str) -> Result<BTreeMap<String, ServerConfig>, ManifestError> {
    let value: Value = serde_json::from_str(text)?;
    let object = value.as_object().ok_or(ManifestError::NotAnObject)?;
    let servers = object
        .get("mcpServers")
        .and_then(Value::as_object)
        .ok_or(ManifestError::MissingServers)?;

    let mut parsed = BTreeMap::new();
    for (id, entry) in servers {
        let config = ServerConfig::deserialize(entry).map_err(|source| ManifestError::Entry {
            id: id.clone(),
            source,
        })?;
        parsed.insert(id.clone(), config);
    }
    Ok(parsed)
}

pub fn read_import(path: &Path) -> Result<BTreeMap<String, ServerConfig>, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_import(&text)
}

/// Parses then hands the servers to `sink`.
pub fn import_into<S: ImportSink + ?Sized>(sink: &mut S, text: &str) -> Result<ImportReport, ManifestError> {
    let servers = parse_import(text)?;
    Ok(sink.import_servers(servers))
}
