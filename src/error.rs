//! Probe error taxonomy.
//!
//! Fatal failures carry the session phase they occurred in and, where one
//! exists, the raw message that triggered them, so a single error line is
//! enough to diagnose a broken handshake. Steady-state anomalies
//! (unclassified kinds, undecodable frames) are not errors — they are
//! echoed and counted by the demultiplexer without ending the run.

use std::time::Duration;

use crate::protocol::Phase;

/// Fatal error ending a probe run.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Transport-level failure: connect handshake, read/write IO, stream
    /// close, or keep-alive expiry.
    #[error("connection error in {phase} phase: {cause:#}")]
    Connection {
        /// Phase the transport failed in.
        phase: Phase,
        /// Underlying transport cause.
        cause: anyhow::Error,
    },

    /// A write was rejected or the stream was already closed.
    #[error("send failed in {phase} phase: {cause:#}")]
    Send {
        /// Phase the send was attempted in.
        phase: Phase,
        /// Underlying transport cause.
        cause: anyhow::Error,
    },

    /// No frame arrived within the per-receive timeout while a handshake
    /// reply was required.
    #[error("timed out after {timeout:?} waiting in {phase} phase")]
    Timeout {
        /// Phase the probe was waiting in.
        phase: Phase,
        /// The configured per-receive timeout.
        timeout: Duration,
    },

    /// The peer rejected the credential, or answered the auth message with
    /// anything other than `auth_ok`.
    #[error("authentication failed in {phase} phase: {message}")]
    Authentication {
        /// Phase the rejection arrived in.
        phase: Phase,
        /// Raw peer message that rejected the credential.
        message: String,
    },

    /// A message of the wrong kind arrived during the handshake.
    #[error("unexpected {kind} message in {phase} phase: {message}")]
    UnexpectedMessage {
        /// Phase the message arrived in.
        phase: Phase,
        /// Raw `type` field of the offending message.
        kind: String,
        /// Full raw message for diagnosis.
        message: String,
    },

    /// A frame that is not well-formed JSON arrived during the handshake.
    #[error("undecodable frame in {phase} phase ({bytes} bytes): {preview}")]
    Decode {
        /// Phase the frame arrived in.
        phase: Phase,
        /// Byte length of the raw frame.
        bytes: usize,
        /// Leading bytes of the raw frame.
        preview: String,
    },

    /// Operator abort (ctrl-c).
    #[error("interrupted")]
    Interrupted,
}

impl ProbeError {
    /// Process exit code for this error.
    ///
    /// `130` for an external interrupt, `1` for every reported failure.
    /// (Exit `2` is reserved for usage errors and never reaches this type.)
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_exit_code() {
        assert_eq!(ProbeError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn fatal_errors_exit_one() {
        let err = ProbeError::Authentication {
            phase: Phase::AwaitingAuthResult,
            message: "{\"type\":\"auth_invalid\"}".to_string(),
        };
        assert_eq!(err.exit_code(), 1);

        let err = ProbeError::Timeout {
            phase: Phase::Unauthenticated,
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn display_names_phase_and_raw_message() {
        let err = ProbeError::UnexpectedMessage {
            phase: Phase::Unauthenticated,
            kind: "event".to_string(),
            message: "{\"type\":\"event\"}".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("unauthenticated"));
        assert!(rendered.contains("{\"type\":\"event\"}"));
    }
}
