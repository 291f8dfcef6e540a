//! Reconstruction of readable request/response packets from exchange records.

use crate::core::types::{Event, HttpPacketResult, ResponseHeaders};

pub const REQUEST_PLACEHOLDER: &str = "Error: Request packet could not be reconstructed.";
pub const RESPONSE_PLACEHOLDER: &str = "Error: Response packet could not be reconstructed.";

const CRLF: &str = "\r\n";

/// Rebuild the request and response text of one exchange.
///
/// Never fails: a missing `request` or `response` field yields the
/// corresponding placeholder, and a missing `duration` yields empty text.
pub fn reconstruct_http_packet(event: &Event) -> HttpPacketResult {
    HttpPacketResult {
        request_packet: request_packet(event).unwrap_or_else(|| REQUEST_PLACEHOLDER.to_string()),
        response_packet: response_packet(event)
            .unwrap_or_else(|| RESPONSE_PLACEHOLDER.to_string()),
        execution_time: event.duration.clone().unwrap_or_default(),
    }
}

fn request_packet(event: &Event) -> Option<String> {
    let head = event.request.as_deref()?;
    let mut packet = strip_brackets(head.trim());
    packet.push_str(CRLF);
    packet.push_str(CRLF);
    if let Some(body) = event.reqbody.as_deref().filter(|body| !body.is_empty()) {
        packet.push_str(body);
    }
    Some(packet)
}

fn response_packet(event: &Event) -> Option<String> {
    let status = event.response.as_deref()?;
    let mut packet = strip_brackets(status.trim());
    packet.push_str(CRLF);
    if let Some(headers) = &event.respheaders {
        push_headers(&mut packet, headers);
    }
    packet.push_str(CRLF);
    if let Some(body) = event.respbody.as_deref().filter(|body| !body.is_empty()) {
        packet.push_str(body.trim());
    }
    Some(packet)
}

/// Upstream header serialization wraps values in `[`/`]`; drop every bracket.
fn strip_brackets(text: &str) -> String {
    text.chars().filter(|c| *c != '[' && *c != ']').collect()
}

fn push_headers(packet: &mut String, headers: &ResponseHeaders) {
    for (name, values) in headers {
        packet.push_str(&canonical_header_key(name));
        packet.push_str(": ");
        packet.push_str(&values.join(", "));
        packet.push_str(CRLF);
    }
}

/// Capitalize the first letter of each `-` or space separated segment and
/// lowercase the rest (`content-TYPE` becomes `Content-Type`).
pub fn canonical_header_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment_start = true;
    for c in name.chars() {
        if c == '-' || c == ' ' {
            out.push(c);
            segment_start = true;
        } else if segment_start {
            out.extend(c.to_uppercase());
            segment_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
