//! Event demultiplexer.
//!
//! Every frame received in the Ready phase is classified by the pair
//! (message kind, correlation id) against the pending-request table and
//! routed to exactly one [`Sink`]. Unknown kinds and unknown ids land in
//! the unclassified sink — reported, counted, never fatal.

use crate::protocol::{PendingRequests, RequestKind};
use crate::wire::MessageKind;

/// Logical destination of a classified message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// `result` acknowledging the subscription request.
    SubscribeAck,
    /// Terminal `result` of the one-shot templated query; retires its id.
    QueryResult,
    /// `event` streamed by the templated query before its terminal result.
    QueryEvent,
    /// `event` produced by the long-lived state-change subscription.
    TriggerEvent,
    /// Unknown kind or unrecorded id; tagged with both for diagnosis.
    Unclassified,
}

impl Sink {
    /// Display label used on the stdout echo.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SubscribeAck => "subscribe_result",
            Self::QueryResult => "bootstrap_result",
            Self::QueryEvent => "bootstrap_event",
            Self::TriggerEvent => "trigger_event",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Classify one Ready-phase message against the outstanding requests.
#[must_use]
pub fn classify(kind: &MessageKind, id: Option<u64>, pending: &PendingRequests) -> Sink {
    let target = id.and_then(|id| pending.get(id));
    match (kind, target) {
        (MessageKind::Result, Some(RequestKind::Subscribe)) => Sink::SubscribeAck,
        (MessageKind::Result, Some(RequestKind::RenderQuery)) => Sink::QueryResult,
        (MessageKind::Event, Some(RequestKind::RenderQuery)) => Sink::QueryEvent,
        (MessageKind::Event, Some(RequestKind::Subscribe)) => Sink::TriggerEvent,
        _ => Sink::Unclassified,
    }
}

/// Per-run traffic accounting, logged when the run ends.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Total frames received in the Ready phase (decoded or not).
    pub received: u32,
    /// Subscription acknowledgments.
    pub subscribe_acks: u32,
    /// Terminal query results.
    pub query_results: u32,
    /// Streamed query events.
    pub query_events: u32,
    /// Triggered state-change events.
    pub trigger_events: u32,
    /// Messages no sink claimed.
    pub unclassified: u32,
    /// Frames whose payload was not well-formed JSON.
    pub undecodable: u32,
    /// Sink sequence in arrival order, for post-run inspection.
    pub routed: Vec<Sink>,
}

impl RunSummary {
    /// Account for one classified frame.
    pub fn record(&mut self, sink: Sink) {
        self.received += 1;
        self.routed.push(sink);
        match sink {
            Sink::SubscribeAck => self.subscribe_acks += 1,
            Sink::QueryResult => self.query_results += 1,
            Sink::QueryEvent => self.query_events += 1,
            Sink::TriggerEvent => self.trigger_events += 1,
            Sink::Unclassified => self.unclassified += 1,
        }
    }

    /// Account for one undecodable frame.
    pub fn record_undecodable(&mut self) {
        self.received += 1;
        self.undecodable += 1;
    }

    /// Log the final accounting.
    pub fn log(&self) {
        log::info!(
            "run summary: received={} subscribe_acks={} query_results={} query_events={} \
             trigger_events={} unclassified={} undecodable={}",
            self.received,
            self.subscribe_acks,
            self.query_results,
            self.query_events,
            self.trigger_events,
            self.unclassified,
            self.undecodable,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingRequests {
        let mut table = PendingRequests::new();
        table.insert(2, RequestKind::Subscribe);
        table.insert(3, RequestKind::RenderQuery);
        table
    }

    #[test]
    fn result_routes_by_request_kind() {
        let table = pending();
        assert_eq!(
            classify(&MessageKind::Result, Some(2), &table),
            Sink::SubscribeAck
        );
        assert_eq!(
            classify(&MessageKind::Result, Some(3), &table),
            Sink::QueryResult
        );
    }

    #[test]
    fn event_routes_by_request_kind() {
        let table = pending();
        assert_eq!(
            classify(&MessageKind::Event, Some(2), &table),
            Sink::TriggerEvent
        );
        assert_eq!(
            classify(&MessageKind::Event, Some(3), &table),
            Sink::QueryEvent
        );
    }

    #[test]
    fn unknown_id_is_unclassified() {
        let table = pending();
        assert_eq!(
            classify(&MessageKind::Result, Some(99), &table),
            Sink::Unclassified
        );
        assert_eq!(classify(&MessageKind::Event, None, &table), Sink::Unclassified);
    }

    #[test]
    fn unknown_kind_is_unclassified() {
        let table = pending();
        let kind = MessageKind::Unknown("pong".to_string());
        assert_eq!(classify(&kind, Some(2), &table), Sink::Unclassified);
    }

    #[test]
    fn interleavings_route_independently() {
        let table = pending();
        let feed = [
            (MessageKind::Event, Some(2), Sink::TriggerEvent),
            (MessageKind::Result, Some(3), Sink::QueryResult),
            (MessageKind::Event, Some(3), Sink::QueryEvent),
            (MessageKind::Result, Some(2), Sink::SubscribeAck),
            (MessageKind::Event, Some(7), Sink::Unclassified),
            (MessageKind::Event, Some(2), Sink::TriggerEvent),
        ];
        for (kind, id, expected) in feed {
            assert_eq!(classify(&kind, id, &table), expected);
        }
    }

    #[test]
    fn summary_counts_by_sink() {
        let mut summary = RunSummary::default();
        summary.record(Sink::SubscribeAck);
        summary.record(Sink::TriggerEvent);
        summary.record(Sink::TriggerEvent);
        summary.record_undecodable();

        assert_eq!(summary.received, 4);
        assert_eq!(summary.subscribe_acks, 1);
        assert_eq!(summary.trigger_events, 2);
        assert_eq!(summary.undecodable, 1);
        assert_eq!(summary.routed, vec![
            Sink::SubscribeAck,
            Sink::TriggerEvent,
            Sink::TriggerEvent,
        ]);
    }
}
