//! Transport session.
//!
//! Owns the duplex connection for one probe run. [`Session::recv`] is the
//! crate's sole suspension point: the per-receive deadline, keep-alive
//! ping origination, and pong-deadline enforcement are all layered onto it
//! with `tokio::select!`, so no second task and no shared mutable state
//! exist. Decode failure of a single frame is surfaced as a [`Recv`]
//! variant, not an error — only transport loss fails the session.

use std::time::Duration;

use anyhow::anyhow;
use serde_json::Value;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::constants::CLOSE_TIMEOUT;
use crate::error::ProbeError;
use crate::protocol::Phase;
use crate::trace;
use crate::ws::{self, WsMessage, WsReader, WsWriter};

/// Stand-in deadline while no pong is outstanding.
const FAR_FUTURE: Duration = Duration::from_secs(3600);

/// Outcome of one receive attempt.
#[derive(Debug)]
pub enum Recv {
    /// One complete, well-formed JSON frame.
    Frame {
        /// Raw wire text, retained for byte-length reporting.
        raw: String,
        /// Decoded payload.
        value: Value,
    },
    /// A frame arrived but its payload is not well-formed JSON. The raw
    /// bytes are retained for manual inspection; the session stays usable.
    Undecodable {
        /// Raw wire text (lossy-decoded for binary frames).
        raw: String,
    },
    /// The per-receive timeout elapsed with no frame.
    TimedOut,
}

/// Keep-alive tuning for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Interval between client-originated pings.
    pub keepalive_interval: Duration,
    /// Deadline for the pong answering each ping.
    pub keepalive_timeout: Duration,
}

/// One live connection to the peer.
#[derive(Debug)]
pub struct Session {
    writer: WsWriter,
    reader: WsReader,
    ping_timer: Interval,
    keepalive_timeout: Duration,
    pong_deadline: Option<Instant>,
}

impl Session {
    /// Establish the connection and arm the keep-alive timer.
    pub async fn connect(url: &str, options: SessionOptions) -> Result<Self, ProbeError> {
        let (writer, reader) = ws::connect(url).await.map_err(|cause| ProbeError::Connection {
            phase: Phase::Unauthenticated,
            cause,
        })?;
        println!("connected url={url}");

        let start = Instant::now() + options.keepalive_interval;
        let mut ping_timer = tokio::time::interval_at(start, options.keepalive_interval);
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            writer,
            reader,
            ping_timer,
            keepalive_timeout: options.keepalive_timeout,
            pong_deadline: None,
        })
    }

    /// Serialize `value`, echo it as a TX record, and write it.
    pub async fn send(&mut self, phase: Phase, label: &str, value: &Value) -> Result<(), ProbeError> {
        let wire = trace::compact(value);
        trace::tx(label, &wire, value);
        self.writer
            .send_text(&wire)
            .await
            .map_err(|cause| ProbeError::Send { phase, cause })
    }

    /// Wait for one complete frame or the deadline, whichever comes first.
    ///
    /// Pings from the peer are answered inline; keep-alive pings are sent
    /// on schedule; a pong missing past the keep-alive timeout fails the
    /// connection. `phase` tags any fatal error with where it happened.
    pub async fn recv(&mut self, phase: Phase, timeout: Duration) -> Result<Recv, ProbeError> {
        let deadline = Instant::now() + timeout;
        loop {
            let pong_deadline = self
                .pong_deadline
                .unwrap_or_else(|| Instant::now() + FAR_FUTURE);

            tokio::select! {
                msg = self.reader.recv() => match msg {
                    Some(Ok(WsMessage::Text(raw))) => {
                        return Ok(decode_frame(raw));
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        return Ok(decode_frame(String::from_utf8_lossy(&data).into_owned()));
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        self.writer
                            .send_pong(data)
                            .await
                            .map_err(|cause| ProbeError::Connection { phase, cause })?;
                    }
                    Some(Ok(WsMessage::Pong(_))) => {
                        self.pong_deadline = None;
                    }
                    Some(Ok(WsMessage::Close { code, reason })) => {
                        return Err(ProbeError::Connection {
                            phase,
                            cause: anyhow!("peer closed connection (code={code} reason={reason:?})"),
                        });
                    }
                    Some(Err(cause)) => {
                        return Err(ProbeError::Connection { phase, cause });
                    }
                    None => {
                        return Err(ProbeError::Connection {
                            phase,
                            cause: anyhow!("stream ended"),
                        });
                    }
                },
                () = tokio::time::sleep_until(deadline) => {
                    return Ok(Recv::TimedOut);
                }
                _ = self.ping_timer.tick() => {
                    if self.pong_deadline.is_none() {
                        self.pong_deadline = Some(Instant::now() + self.keepalive_timeout);
                    }
                    self.writer
                        .send_ping(Vec::new())
                        .await
                        .map_err(|cause| ProbeError::Connection { phase, cause })?;
                }
                () = tokio::time::sleep_until(pong_deadline), if self.pong_deadline.is_some() => {
                    return Err(ProbeError::Connection {
                        phase,
                        cause: anyhow!(
                            "keep-alive timeout: no pong within {:?}",
                            self.keepalive_timeout
                        ),
                    });
                }
            }
        }
    }

    /// Release the connection: bounded closing handshake, then drop.
    ///
    /// Invoked on every exit path of a run. Failures here are logged, not
    /// propagated — the run's outcome is already decided.
    pub async fn close(&mut self) {
        match tokio::time::timeout(CLOSE_TIMEOUT, self.writer.close()).await {
            Ok(Ok(())) => log::debug!("connection closed"),
            Ok(Err(e)) => log::debug!("close failed: {e}"),
            Err(_) => log::debug!("close timed out after {CLOSE_TIMEOUT:?}"),
        }
    }
}

/// Decode a raw frame, preserving the bytes when decoding fails.
fn decode_frame(raw: String) -> Recv {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => Recv::Frame { raw, value },
        Err(_) => Recv::Undecodable { raw },
    }
}
