//! Application-wide constants for haprobe.
//!
//! This module centralizes timeouts and CLI defaults so the probe's timing
//! behavior is discoverable in one place. Constants are grouped by domain
//! with documentation explaining their purpose.

use std::time::Duration;

// ============================================================================
// Keep-alive
// ============================================================================

/// Interval between WebSocket pings sent by the session.
///
/// The peer is expected to answer each ping with a pong; 30 seconds keeps
/// NAT/proxy mappings warm without measurable traffic overhead.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a pong after sending a ping.
///
/// A missing pong past this deadline is treated as transport loss and
/// fails the connection.
pub const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the closing handshake when the session shuts down.
///
/// After this, the stream is dropped whether or not the peer acknowledged
/// the close frame.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// CLI defaults
// ============================================================================

/// Default endpoint URL (the platform-standard WebSocket API path).
pub const DEFAULT_URL: &str = "ws://homeassistant.local:8123/api/websocket";

/// Default target entity for the subscription and the templated query.
pub const DEFAULT_ENTITY: &str = "light.living_room";

/// Default message budget before the run ends.
pub const DEFAULT_MAX_EVENTS: u32 = 40;

/// Default per-receive timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
