use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;

/// Number of events the live log keeps. Older events are evicted by recency.
pub const EVENT_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Success,
    Error,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventStatus::Pending => "pending",
            EventStatus::Success => "success",
            EventStatus::Error => "error",
        };
        f.pad(label)
    }
}

/// One protocol call seen by the gateway. Never mutated once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub server_id: String,
    pub server_name: String,
    pub method: String,
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub status: EventStatus,
    #[serde(rename = "latency")]
    pub latency_ms: u32,
}

/// Bounded log of live events, newest first.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: VecDeque<LiveEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts at the head and evicts past [`EVENT_LOG_CAPACITY`].
    ///
    /// A timestamp older than the current head (wall clock stepped back) is
    /// raised to the head's so the log stays in descending order.
    pub fn push(&mut self, mut event: LiveEvent) {
        if let Some(head) = self.events.front() {
            if event.timestamp < head.timestamp {
                event.timestamp = head.timestamp;
            }
        }
        self.events.push_front(event);
        self.events.truncate(EVENT_LOG_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&LiveEvent> {
        self.events.front()
    }

    /// Events whose server is in `server_ids`, newest first.
    pub fn for_servers<'a>(&'a self, server_ids: &'a [String]) -> impl Iterator<Item = &'a LiveEvent> {
        self.events
            .iter()
            .filter(move |e| server_ids.iter().any(|id| *id == e.server_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn event(n: usize, timestamp: DateTime<Utc>) -> LiveEvent {
        LiveEvent {
            id: format!("ev-{}", n),
            timestamp,
            server_id: "srv".to_string(),
            server_name: "Server".to_string(),
            method: "ping".to_string(),
            params: json!({}),
            result: None,
            status: EventStatus::Success,
            latency_ms: 10,
        }
    }

    #[test]
    fn keeps_newest_fifty() {
        let mut log = EventLog::new();
        let start = Utc::now();
        for n in 0..75 {
            log.push(event(n, start + Duration::seconds(n as i64)));
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log.latest().map(|e| e.id.as_str()), Some("ev-74"));
        assert_eq!(log.iter().last().map(|e| e.id.as_str()), Some("ev-25"));
    }

    #[test]
    fn clock_step_back_does_not_break_order() {
        let mut log = EventLog::new();
        let now = Utc::now();
        log.push(event(0, now));
        log.push(event(1, now - Duration::seconds(30)));
        let stamps: Vec<_> = log.iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn latency_serializes_under_original_name() {
        let value = serde_json::to_value(event(0, Utc::now())).unwrap();
        assert_eq!(value["latency"], json!(10));
        assert_eq!(value["serverId"], json!("srv"));
    }
}
