//! Probe configuration.
//!
//! Defaults come from [`crate::constants`], environment variables override
//! them, and CLI flags (applied by the binary) take final precedence. The
//! credential is never serialized.

use std::time::Duration;

use serde::Serialize;

use crate::constants::{
    DEFAULT_ENTITY, DEFAULT_MAX_EVENTS, DEFAULT_TIMEOUT_SECS, DEFAULT_URL, KEEPALIVE_INTERVAL,
    KEEPALIVE_TIMEOUT,
};

/// Configuration for one probe run.
#[derive(Serialize, Clone, Debug)]
pub struct ProbeConfig {
    /// WebSocket endpoint URL. `http(s)://` URLs are converted to `ws(s)://`.
    pub url: String,
    /// Long-lived access token - NOT serialized.
    #[serde(skip)]
    pub token: String,
    /// Entity whose state changes are subscribed to and queried.
    pub entity_id: String,
    /// Message budget: the run ends after this many received frames.
    pub max_events: u32,
    /// Per-receive timeout.
    pub receive_timeout: Duration,
    /// Interval between keep-alive pings.
    pub keepalive_interval: Duration,
    /// Deadline for the pong answering a keep-alive ping.
    pub keepalive_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            token: String::new(),
            entity_id: DEFAULT_ENTITY.to_string(),
            max_events: DEFAULT_MAX_EVENTS,
            receive_timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            keepalive_interval: KEEPALIVE_INTERVAL,
            keepalive_timeout: KEEPALIVE_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("HAPROBE_URL") {
            self.url = url;
        }

        // Token from env var (for CI and shell history hygiene)
        if let Ok(token) = std::env::var("HAPROBE_TOKEN") {
            self.token = token;
        }

        if let Ok(entity_id) = std::env::var("HAPROBE_ENTITY") {
            self.entity_id = entity_id;
        }
    }

    /// Check whether a credential is present.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}
