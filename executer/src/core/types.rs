//! Shared record types exchanged between the executer and request collaborators.
//!
//! Events arrive loosely typed from protocol executors. The fields this crate
//! reads are named and typed; anything else is kept in [`Event::extra`] and
//! ignored. Mistyped known fields deserialize as absent instead of failing.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Header name to header values, as reported by a protocol executor.
pub type ResponseHeaders = BTreeMap<String, Vec<String>>;

/// One network exchange as reported by a request step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub request: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub reqbody: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub respbody: Option<String>,
    /// Target the exchange was sent to. Any JSON type is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_headers",
        skip_serializing_if = "Option::is_none"
    )]
    pub respheaders: Option<ResponseHeaders>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn with_reqbody(mut self, body: impl Into<String>) -> Self {
        self.reqbody = Some(body.into());
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_respbody(mut self, body: impl Into<String>) -> Self {
        self.respbody = Some(body.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<Value>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.respheaders
            .get_or_insert_with(ResponseHeaders::new)
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }
}

/// An exchange together with the verdict of the match stage, if it matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrappedEvent {
    pub internal_event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators_result: Option<OperatorResult>,
}

impl WrappedEvent {
    /// Wrap an exchange that did not match.
    pub fn miss(event: Event) -> Self {
        Self {
            internal_event: event,
            operators_result: None,
        }
    }

    /// Wrap an exchange that produced an operator result.
    pub fn matched(event: Event, result: OperatorResult) -> Self {
        Self {
            internal_event: event,
            operators_result: Some(result),
        }
    }
}

/// Verdict produced by the match stage for one exchange.
///
/// Only `payload_req_resp` is written by the executer; the remaining fields
/// belong to the match stage and are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorResult {
    pub template_id: Option<String>,
    pub matched: bool,
    pub extracts: BTreeMap<String, Value>,
    /// Transcript of the exchanges leading to the match (`req0`.., `url`).
    pub payload_req_resp: Option<BTreeMap<String, PayloadValue>>,
}

/// Value stored in a transcript map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Packet(HttpPacketResult),
    Url(Value),
}

impl PayloadValue {
    pub fn as_packet(&self) -> Option<&HttpPacketResult> {
        match self {
            PayloadValue::Packet(packet) => Some(packet),
            PayloadValue::Url(_) => None,
        }
    }
}

/// Human-readable reconstruction of one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPacketResult {
    pub request_packet: String,
    pub response_packet: String,
    pub execution_time: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_headers<'de, D>(deserializer: D) -> Result<Option<ResponseHeaders>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = value else {
        return Ok(None);
    };
    let mut headers = ResponseHeaders::new();
    for (name, values) in map {
        let values = match values {
            Value::String(text) => vec![text],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect(),
            _ => continue,
        };
        headers.insert(name, values);
    }
    Ok(Some(headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mistyped_known_fields_deserialize_as_absent() {
        let event: Event = serde_json::from_value(json!({
            "duration": 1.5,
            "request": ["GET /"],
            "response": "HTTP/1.1 200 OK",
            "host": 42,
        }))
        .expect("parse event");

        assert_eq!(event.duration, None);
        assert_eq!(event.request, None);
        assert_eq!(event.response.as_deref(), Some("HTTP/1.1 200 OK"));
        assert_eq!(event.host, Some(json!(42)));
    }

    #[test]
    fn unknown_fields_are_preserved_in_extra() {
        let event: Event = serde_json::from_value(json!({
            "request": "GET /",
            "matcher-name": "status",
            "ip": "127.0.0.1",
        }))
        .expect("parse event");

        assert_eq!(event.extra.get("matcher-name"), Some(&json!("status")));
        assert_eq!(event.extra.get("ip"), Some(&json!("127.0.0.1")));
        assert!(!event.extra.contains_key("request"));
    }

    #[test]
    fn respheaders_accepts_single_values_and_skips_garbage() {
        let event: Event = serde_json::from_value(json!({
            "respheaders": {
                "content-type": "text/html",
                "set-cookie": ["a=1", 7, "b=2"],
                "x-broken": {"nested": true},
            }
        }))
        .expect("parse event");

        let headers = event.respheaders.expect("headers");
        assert_eq!(headers["content-type"], vec!["text/html"]);
        assert_eq!(headers["set-cookie"], vec!["a=1", "b=2"]);
        assert!(!headers.contains_key("x-broken"));
    }

    #[test]
    fn respheaders_of_wrong_type_is_absent() {
        let event: Event =
            serde_json::from_value(json!({ "respheaders": "content-type: x" })).expect("parse");
        assert_eq!(event.respheaders, None);
    }

    #[test]
    fn payload_value_serializes_untagged() {
        let packet = PayloadValue::Packet(HttpPacketResult {
            request_packet: "GET / HTTP/1.1\r\n\r\n".to_string(),
            response_packet: "HTTP/1.1 200 OK\r\n\r\n".to_string(),
            execution_time: "12ms".to_string(),
        });
        let url = PayloadValue::Url(json!("http://example.com"));

        assert_eq!(
            serde_json::to_value(&packet).expect("packet"),
            json!({
                "request_packet": "GET / HTTP/1.1\r\n\r\n",
                "response_packet": "HTTP/1.1 200 OK\r\n\r\n",
                "execution_time": "12ms",
            })
        );
        assert_eq!(
            serde_json::to_value(&url).expect("url"),
            json!("http://example.com")
        );
    }
}
