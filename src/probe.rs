//! Probe orchestration.
//!
//! Drives one bounded diagnostic conversation: connect, authenticate,
//! issue the two bootstrap requests, then demultiplex the interleaved
//! reply/event stream until the message budget is met, the peer goes
//! quiet, or a fatal error ends the run. The connection is released on
//! every exit path, including operator abort.

use std::time::Duration;

use serde_json::Value;

use crate::config::ProbeConfig;
use crate::demux::{self, RunSummary, Sink};
use crate::error::ProbeError;
use crate::protocol::{CorrelationIds, PendingRequests, Phase, RequestKind};
use crate::session::{Recv, Session, SessionOptions};
use crate::trace;
use crate::wire::{self, MessageKind};

/// Run one probe conversation against `config.url`.
///
/// Returns the traffic summary on normal completion (budget reached or
/// steady-state quiet period). All fatal outcomes — transport loss, auth
/// rejection, handshake protocol errors, operator abort — arrive as
/// [`ProbeError`] values; the stream is released before this returns.
pub async fn run(config: &ProbeConfig) -> Result<RunSummary, ProbeError> {
    let options = SessionOptions {
        keepalive_interval: config.keepalive_interval,
        keepalive_timeout: config.keepalive_timeout,
    };
    let mut session = Session::connect(&config.url, options).await?;

    let result = tokio::select! {
        result = drive(&mut session, config) => result,
        _ = tokio::signal::ctrl_c() => Err(ProbeError::Interrupted),
    };

    // Scoped release: runs for completion, fatal error, and interrupt alike.
    session.close().await;

    if let Ok(summary) = &result {
        summary.log();
    }
    result
}

/// Handshake, bootstrap, and steady-state loop for one connection.
async fn drive(session: &mut Session, config: &ProbeConfig) -> Result<RunSummary, ProbeError> {
    handshake(session, config).await?;

    // Ready: issue the two bootstrap requests in fixed order. Each id is
    // recorded as pending before its message is transmitted, so a reply
    // can never arrive for an unrecorded id.
    let mut ids = CorrelationIds::new();
    let mut pending = PendingRequests::new();

    let sub_id = ids.allocate();
    pending.insert(sub_id, RequestKind::Subscribe);
    session
        .send(
            Phase::Ready,
            "subscribe_trigger",
            &wire::subscribe_trigger(sub_id, &config.entity_id),
        )
        .await?;

    let query_id = ids.allocate();
    pending.insert(query_id, RequestKind::RenderQuery);
    session
        .send(
            Phase::Ready,
            "render_template",
            &wire::render_template(query_id, &config.entity_id),
        )
        .await?;

    ready_loop(session, config, &mut pending).await
}

/// Drive Unauthenticated → AwaitingAuthResult → Ready.
///
/// The peer speaks first. Each inbound frame is echoed before it is
/// validated, so the offending message of a failed handshake is always
/// visible on stdout as well as in the error.
async fn handshake(session: &mut Session, config: &ProbeConfig) -> Result<(), ProbeError> {
    let (raw, value) = expect_frame(session, Phase::Unauthenticated, config.receive_timeout).await?;
    trace::rx("auth_required", raw.len(), &value);
    let kind = MessageKind::of(&value);
    if kind != MessageKind::AuthRequired {
        return Err(ProbeError::UnexpectedMessage {
            phase: Phase::Unauthenticated,
            kind: kind.to_string(),
            message: raw,
        });
    }

    session
        .send(Phase::Unauthenticated, "auth", &wire::auth(&config.token))
        .await?;

    let (raw, value) =
        expect_frame(session, Phase::AwaitingAuthResult, config.receive_timeout).await?;
    trace::rx("auth_result", raw.len(), &value);
    if MessageKind::of(&value) != MessageKind::AuthOk {
        return Err(ProbeError::Authentication {
            phase: Phase::AwaitingAuthResult,
            message: raw,
        });
    }

    Ok(())
}

/// Receive one frame during the handshake, where every message is
/// required: timeouts and undecodable frames are fatal here.
async fn expect_frame(
    session: &mut Session,
    phase: Phase,
    timeout: Duration,
) -> Result<(String, Value), ProbeError> {
    match session.recv(phase, timeout).await? {
        Recv::Frame { raw, value } => Ok((raw, value)),
        Recv::Undecodable { raw } => Err(ProbeError::Decode {
            phase,
            bytes: raw.len(),
            preview: trace::clip(&raw, trace::RAW_PREVIEW_BYTES).to_string(),
        }),
        Recv::TimedOut => Err(ProbeError::Timeout { phase, timeout }),
    }
}

/// Steady-state demultiplexing until the budget, a quiet period, or a
/// transport failure ends the run.
async fn ready_loop(
    session: &mut Session,
    config: &ProbeConfig,
    pending: &mut PendingRequests,
) -> Result<RunSummary, ProbeError> {
    let mut summary = RunSummary::default();

    while summary.received < config.max_events {
        match session.recv(Phase::Ready, config.receive_timeout).await? {
            Recv::TimedOut => {
                // The budget can no longer be met; end cleanly.
                log::warn!(
                    "no traffic for {:?} after {} of {} messages; ending run",
                    config.receive_timeout,
                    summary.received,
                    config.max_events
                );
                break;
            }
            Recv::Undecodable { raw } => {
                summary.record_undecodable();
                trace::rx_raw(summary.received, &raw);
            }
            Recv::Frame { raw, value } => {
                let kind = MessageKind::of(&value);
                let id = wire::correlation_id(&value);
                let sink = demux::classify(&kind, id, pending);
                summary.record(sink);
                let seq = summary.received;

                if sink == Sink::Unclassified {
                    let id_label = id.map_or_else(|| "none".to_string(), |id| id.to_string());
                    if matches!(kind, MessageKind::Result | MessageKind::Event) {
                        log::warn!(
                            "protocol violation: {kind} message with unrecorded id {id_label}"
                        );
                    }
                    trace::rx(&format!("[{seq}] type={kind} id={id_label}"), raw.len(), &value);
                } else {
                    trace::rx(&format!("[{seq}] {}", sink.label()), raw.len(), &value);
                }

                // The query is one-shot: its terminal result retires the id.
                // The subscription stays pending for the run's duration.
                if sink == Sink::QueryResult {
                    if let Some(id) = id {
                        pending.retire(id);
                    }
                }
            }
        }
    }

    Ok(summary)
}
