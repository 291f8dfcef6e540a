//! Per-run event history and bounded transcript assembly.

use std::collections::BTreeMap;

use crate::core::packet::reconstruct_http_packet;
use crate::core::types::{Event, OperatorResult, PayloadValue};

/// Default number of most recent exchanges kept in a match transcript.
pub const TRANSCRIPT_WINDOW: usize = 5;

const URL_KEY: &str = "url";

/// Append-only log of the exchanges seen during one `execute` call.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    window: usize,
}

impl EventLog {
    pub fn new(window: usize) -> Self {
        Self {
            events: Vec::new(),
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The retained window, oldest first, ending with the latest event.
    pub fn recent(&self) -> &[Event] {
        let start = self.events.len().saturating_sub(self.window);
        &self.events[start..]
    }

    /// Replace the transcript stored in `result` with the current window.
    ///
    /// Slots `req0` up to the larger of the configured and default window are
    /// cleared first, so a smaller window never leaves keys from an earlier
    /// match behind. Any other key is left to its owner.
    pub fn attach_transcript(&self, result: &mut OperatorResult) {
        let map = result.payload_req_resp.get_or_insert_with(BTreeMap::new);
        for i in 0..self.window.max(TRANSCRIPT_WINDOW) {
            map.remove(&format!("req{i}"));
        }

        let recent = self.recent();
        for (i, event) in recent.iter().enumerate() {
            map.insert(
                format!("req{i}"),
                PayloadValue::Packet(reconstruct_http_packet(event)),
            );
        }

        if !map.is_empty() {
            let host = recent
                .last()
                .and_then(|event| event.host.clone())
                .unwrap_or_default();
            map.insert(URL_KEY.to_string(), PayloadValue::Url(host));
        }
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(TRANSCRIPT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exchange(n: usize) -> Event {
        Event::default()
            .with_request(format!("GET /{n} HTTP/1.1"))
            .with_response("HTTP/1.1 200 OK")
            .with_host(format!("http://host-{n}"))
    }

    fn request_keys(result: &OperatorResult) -> Vec<String> {
        result
            .payload_req_resp
            .as_ref()
            .map(|map| {
                map.keys()
                    .filter(|k| k.starts_with("req") && *k != "request")
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn request_line(result: &OperatorResult, key: &str) -> String {
        let map = result.payload_req_resp.as_ref().expect("transcript");
        map[key].as_packet().expect("packet").request_packet.clone()
    }

    #[test]
    fn recent_is_capped_at_window() {
        let mut log = EventLog::new(3);
        for n in 0..7 {
            log.push(exchange(n));
        }
        let hosts: Vec<_> = log.recent().iter().map(|e| e.host.clone()).collect();
        assert_eq!(
            hosts,
            vec![
                Some(json!("http://host-4")),
                Some(json!("http://host-5")),
                Some(json!("http://host-6")),
            ]
        );
        assert_eq!(log.len(), 7);
    }

    #[test]
    fn first_match_keeps_all_events_when_fewer_than_window() {
        let mut log = EventLog::default();
        log.push(exchange(0));
        log.push(exchange(1));

        let mut result = OperatorResult::default();
        log.attach_transcript(&mut result);

        assert_eq!(request_keys(&result), vec!["req0", "req1"]);
        assert_eq!(request_line(&result, "req0"), "GET /0 HTTP/1.1\r\n\r\n");
        assert_eq!(request_line(&result, "req1"), "GET /1 HTTP/1.1\r\n\r\n");
        let map = result.payload_req_resp.as_ref().expect("transcript");
        assert_eq!(map["url"], PayloadValue::Url(json!("http://host-1")));
    }

    #[test]
    fn match_after_many_events_keeps_last_five_in_order() {
        let mut log = EventLog::default();
        for n in 0..8 {
            log.push(exchange(n));
        }

        let mut result = OperatorResult::default();
        log.attach_transcript(&mut result);

        assert_eq!(
            request_keys(&result),
            vec!["req0", "req1", "req2", "req3", "req4"]
        );
        assert_eq!(request_line(&result, "req0"), "GET /3 HTTP/1.1\r\n\r\n");
        assert_eq!(request_line(&result, "req4"), "GET /7 HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn smaller_window_discards_stale_request_keys() {
        let mut wide = EventLog::default();
        for n in 0..5 {
            wide.push(exchange(n));
        }
        let mut result = OperatorResult::default();
        wide.attach_transcript(&mut result);
        assert_eq!(request_keys(&result).len(), 5);

        let mut narrow = EventLog::default();
        narrow.push(exchange(9));
        narrow.attach_transcript(&mut result);

        assert_eq!(request_keys(&result), vec!["req0"]);
        assert_eq!(request_line(&result, "req0"), "GET /9 HTTP/1.1\r\n\r\n");
        let map = result.payload_req_resp.as_ref().expect("transcript");
        assert_eq!(map["url"], PayloadValue::Url(json!("http://host-9")));
    }

    #[test]
    fn unrelated_keys_survive_rebuild() {
        let mut log = EventLog::default();
        log.push(exchange(0));

        let mut map = BTreeMap::new();
        map.insert("request".to_string(), PayloadValue::Url(json!("kept")));
        map.insert("req7".to_string(), PayloadValue::Url(json!("stale")));
        let mut result = OperatorResult {
            payload_req_resp: Some(map),
            ..OperatorResult::default()
        };
        log.attach_transcript(&mut result);

        let map = result.payload_req_resp.as_ref().expect("transcript");
        assert_eq!(map["request"], PayloadValue::Url(json!("kept")));
        assert_eq!(map["req7"], PayloadValue::Url(json!("stale")));
        assert!(map.contains_key("req0"));
    }

    #[test]
    fn narrow_window_still_clears_default_slots() {
        let mut stale = BTreeMap::new();
        for i in 0..TRANSCRIPT_WINDOW {
            stale.insert(format!("req{i}"), PayloadValue::Url(json!("stale")));
        }
        let mut result = OperatorResult {
            payload_req_resp: Some(stale),
            ..OperatorResult::default()
        };

        let mut log = EventLog::new(2);
        for n in 0..3 {
            log.push(exchange(n));
        }
        log.attach_transcript(&mut result);

        assert_eq!(request_keys(&result), vec!["req0", "req1"]);
        assert_eq!(request_line(&result, "req0"), "GET /1 HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn wide_window_clears_every_slot_it_may_have_written() {
        let mut wide = EventLog::new(8);
        for n in 0..8 {
            wide.push(exchange(n));
        }
        let mut result = OperatorResult::default();
        wide.attach_transcript(&mut result);
        assert_eq!(request_keys(&result).len(), 8);

        let mut narrow = EventLog::new(8);
        narrow.push(exchange(9));
        narrow.attach_transcript(&mut result);
        assert_eq!(request_keys(&result), vec!["req0"]);
    }

    #[test]
    fn missing_host_records_null_url() {
        let mut log = EventLog::default();
        log.push(Event::default().with_request("GET / HTTP/1.1"));

        let mut result = OperatorResult::default();
        log.attach_transcript(&mut result);

        let map = result.payload_req_resp.as_ref().expect("transcript");
        assert_eq!(map["url"], PayloadValue::Url(serde_json::Value::Null));
    }
}
