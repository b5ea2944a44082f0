// Gateway simulator
// 疑似的なプロトコル呼び出しイベントを生成する

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use uuid::Builder;

use crate::catalog::Server;
use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::{EventStatus, LiveEvent};
use crate::store::Project;

/// Method reported for servers that declare no skills.
pub const DEFAULT_METHOD: &str = "ping";

/// Stand-in for a real gateway: each tick manufactures one plausible call
/// against a server installed in the active project.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: GatewayConfig,
}

impl Simulator {
    /// Rejects configs whose rate or latency range the RNG cannot sample.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    /// Returns `None` when the project has nothing installed or the drawn id
    /// is not in the catalog.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        project: &Project,
        servers: &[Server],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<LiveEvent> {
        if project.server_ids.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..project.server_ids.len());
        let server_id = &project.server_ids[pick];
        let server = servers.iter().find(|s| &s.id == server_id)?;

        let method = server
            .skills
            .first()
            .map(|skill| skill.name.clone())
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());
        let status = if rng.gen_bool(self.config.success_rate) {
            EventStatus::Success
        } else {
            EventStatus::Error
        };
        let latency_ms =
            rng.gen_range(self.config.latency_min_ms..=self.config.latency_max_ms);
        let id = Builder::from_random_bytes(rng.gen()).into_uuid();

        Some(LiveEvent {
            id: id.simple().to_string(),
            timestamp: now,
            server_id: server.id.clone(),
            server_name: server.name.clone(),
            method,
            params: json!({ "q": "How to build an MCP server" }),
            result: Some(json!({ "status": "ok", "data": "Found 12 results" })),
            status,
            latency_ms,
        })
    }
}
