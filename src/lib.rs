//! haprobe - diagnostic WebSocket probe for Home Assistant-style backends.
//!
//! Connects to a message-framed, bidirectional WebSocket API,
//! authenticates with a long-lived token, registers a state-change
//! subscription plus a one-shot templated query, and echoes every frame
//! crossing the boundary while demultiplexing the interleaved reply/event
//! stream. Runs are bounded: a message budget, a quiet-period timeout, or
//! a fatal protocol error ends the conversation.
//!
//! # Architecture
//!
//! ```text
//!   probe::run
//!      │  handshake → bootstrap → ready loop
//!      ▼
//!   Session (session.rs)          Protocol state (protocol.rs)
//!      │  send / recv(timeout)       phases, correlation ids,
//!      │  keep-alive, close          pending-request table
//!      ▼                               │
//!   ws.rs (tokio-tungstenite)          ▼
//!                                  demux.rs — sink classification
//! ```
//!
//! The receive call is the crate's only suspension point; the pending
//! table and phase are mutated solely by the dispatch path, so no state
//! is shared across tasks.

// Library modules
pub mod config;
pub mod constants;
pub mod demux;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod session;
pub mod trace;
pub mod wire;
pub mod ws;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use demux::{RunSummary, Sink};
pub use error::ProbeError;
pub use protocol::Phase;
