//! Frame echo for the diagnostic stdout stream.
//!
//! Every frame crossing the transport boundary is surfaced as a
//! length-prefixed record: `>> TX <label> bytes=N` or `<< RX <label>
//! bytes=N`, followed by the pretty-printed body. Undecodable frames get a
//! raw-bytes record so the payload is still inspectable by hand. Logging
//! (`log`/`env_logger`) goes to stderr and never interleaves with these
//! records.

use serde_json::Value;

/// Maximum payload bytes shown for an undecodable frame.
pub const RAW_PREVIEW_BYTES: usize = 200;

/// Compact wire rendering of a JSON value.
#[must_use]
pub fn compact(value: &Value) -> String {
    serde_json::to_string(value).expect("JSON serialization cannot fail")
}

/// Human-readable rendering of a JSON value.
#[must_use]
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).expect("JSON serialization cannot fail")
}

/// Echo a transmitted frame.
pub fn tx(label: &str, wire: &str, value: &Value) {
    println!("\n>> TX {label} bytes={}", wire.len());
    println!("{}", pretty(value));
}

/// Echo a received, decoded frame.
pub fn rx(label: &str, raw_len: usize, value: &Value) {
    println!("\n<< RX {label} bytes={raw_len}");
    println!("{}", pretty(value));
}

/// Echo a received frame whose payload is not well-formed JSON.
pub fn rx_raw(seq: u32, raw: &str) {
    println!(
        "\n<< RX [{seq}] non-json bytes={} payload={:?}",
        raw.len(),
        clip(raw, RAW_PREVIEW_BYTES)
    );
}

/// Clip `s` to at most `max` bytes without splitting a character.
#[must_use]
pub fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_matches_wire_framing() {
        let value = json!({"type": "auth", "access_token": "tok"});
        let wire = compact(&value);
        assert!(!wire.contains('\n'));
        assert!(!wire.contains(": "));
    }

    #[test]
    fn pretty_is_multiline() {
        let value = json!({"id": 2, "type": "result"});
        assert!(pretty(&value).contains('\n'));
    }

    #[test]
    fn clip_short_string_unchanged() {
        assert_eq!(clip("abc", 200), "abc");
    }

    #[test]
    fn clip_respects_char_boundaries() {
        // "é" is two bytes; clipping at 1 must not split it
        let s = "é";
        assert_eq!(clip(s, 1), "");
        assert_eq!(clip(s, 2), "é");
    }
}
