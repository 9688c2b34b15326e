//! Frame codec
//!
//! Every frame is a single text message with the layout
//!
//! ```text
//! <packet type: 1 digit>[<event type: 1 digit>]<content: rest>
//! ```
//!
//! Outbound application events are `"42" + json([name, ...args])`, the
//! keepalive probe is `"2probe"`, and the server answers with a PONG (`3...`).
//! Decoding mirrors the pattern `^(\d)(\d?)(.*)$` including its edges: the
//! second digit is optional and greedy, and the content may not contain a
//! line terminator.

use crate::error::{Result, SocketError};
use serde_json::Value;

/// Content carried by the keepalive probe
pub const PROBE: &str = "probe";

/// Transport-level packet kind (engine.io)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    Open = 0,
    Close = 1,
    Ping = 2,
    Pong = 3,
    Message = 4,
    Upgrade = 5,
    Noop = 6,
}

impl PacketType {
    /// Map a decoded digit to a packet type
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(PacketType::Open),
            1 => Some(PacketType::Close),
            2 => Some(PacketType::Ping),
            3 => Some(PacketType::Pong),
            4 => Some(PacketType::Message),
            5 => Some(PacketType::Upgrade),
            6 => Some(PacketType::Noop),
            _ => None,
        }
    }

    #[inline]
    pub fn digit(self) -> u8 {
        self as u8
    }
}

/// Socket.io-level kind carried inside a MESSAGE packet
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Connect = 0,
    Disconnect = 1,
    Event = 2,
    Ack = 3,
    Error = 4,
    BinaryEvent = 5,
    BinaryAck = 6,
}

impl EventType {
    /// Map a decoded digit to an event type
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(EventType::Connect),
            1 => Some(EventType::Disconnect),
            2 => Some(EventType::Event),
            3 => Some(EventType::Ack),
            4 => Some(EventType::Error),
            5 => Some(EventType::BinaryEvent),
            6 => Some(EventType::BinaryAck),
            _ => None,
        }
    }

    #[inline]
    pub fn digit(self) -> u8 {
        self as u8
    }
}

/// A decoded frame
///
/// Digits are kept raw: `7`, `8` and `9` match the framing pattern even
/// though no packet or event type uses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet: u8,
    pub event: Option<u8>,
    pub content: String,
}

/// What an inbound packet means to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// PONG or empty content: reschedule the next probe, dispatch nothing
    Keepalive,
    /// Application event to dispatch to listeners
    Event { name: String, args: Vec<Value> },
    /// Dropped without error
    Ignored(&'static str),
}

impl Packet {
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_digit(self.packet)
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.event.and_then(EventType::from_digit)
    }

    /// Apply the inbound policy to this packet
    ///
    /// Checks run in a fixed order: keepalive first (PONG or empty content,
    /// whatever the event digit), then the event digit must be EVENT, then
    /// the packet must be MESSAGE, then the content must be a JSON array
    /// whose first element is a string.
    pub fn classify(&self) -> Inbound {
        if self.packet_type() == Some(PacketType::Pong) || self.content.is_empty() {
            return Inbound::Keepalive;
        }

        if self.event_type() != Some(EventType::Event) {
            return Inbound::Ignored("event type is not EVENT");
        }

        if self.packet_type() != Some(PacketType::Message) {
            return Inbound::Ignored("packet type is not MESSAGE");
        }

        let value: Value = match serde_json::from_str(&self.content) {
            Ok(value) => value,
            Err(_) => return Inbound::Ignored("content is not JSON"),
        };

        if is_falsy(&value) {
            return Inbound::Ignored("content is empty");
        }

        let mut items = match value {
            Value::Array(items) => items.into_iter(),
            _ => return Inbound::Ignored("content is not an array"),
        };

        match items.next() {
            Some(Value::String(name)) => Inbound::Event {
                name,
                args: items.collect(),
            },
            _ => Inbound::Ignored("event name is not a string"),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Encode a frame from its parts
pub fn encode(packet: PacketType, event: Option<EventType>, content: Option<&str>) -> String {
    let content = content.unwrap_or("");
    let mut frame = String::with_capacity(2 + content.len());
    frame.push(char::from(b'0' + packet.digit()));
    if let Some(event) = event {
        frame.push(char::from(b'0' + event.digit()));
    }
    frame.push_str(content);
    frame
}

/// Encode an application event as `42[name, ...args]`
pub fn encode_event(name: &str, args: &[Value]) -> Result<String> {
    let mut data = Vec::with_capacity(args.len() + 1);
    data.push(Value::String(name.to_string()));
    data.extend_from_slice(args);
    let content = serde_json::to_string(&data)?;
    Ok(encode(PacketType::Message, Some(EventType::Event), Some(&content)))
}

/// The keepalive probe frame, `2probe`
pub fn ping_probe() -> String {
    encode(PacketType::Ping, None, Some(PROBE))
}

/// Decode a frame
///
/// Fails when the frame does not start with a digit or when the content
/// contains a line terminator.
pub fn decode(frame: &str) -> Result<Packet> {
    let bytes = frame.as_bytes();

    let packet = match bytes.first() {
        Some(b) if b.is_ascii_digit() => b - b'0',
        _ => {
            return Err(SocketError::Parse(format!(
                "frame does not start with a digit: {:?}",
                truncate(frame)
            )))
        }
    };

    let (event, rest) = match bytes.get(1) {
        Some(b) if b.is_ascii_digit() => (Some(b - b'0'), &frame[2..]),
        _ => (None, &frame[1..]),
    };

    if rest.contains(|c: char| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')) {
        return Err(SocketError::Parse(format!(
            "frame content contains a line terminator: {:?}",
            truncate(frame)
        )));
    }

    Ok(Packet {
        packet,
        event,
        content: rest.to_string(),
    })
}

fn truncate(frame: &str) -> &str {
    match frame.char_indices().nth(64) {
        Some((idx, _)) => &frame[..idx],
        None => frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_ping_probe() {
        assert_eq!(ping_probe(), "2probe");
    }

    #[test]
    fn test_encode_event_frame() {
        let frame = encode_event("leave", &[json!({"name": "A"})]).unwrap();
        assert_eq!(frame, "42[\"leave\",{\"name\":\"A\"}]");
    }

    #[test]
    fn test_encode_event_without_args() {
        assert_eq!(encode_event("ready", &[]).unwrap(), "42[\"ready\"]");
    }

    #[test]
    fn test_encode_omits_missing_parts() {
        assert_eq!(encode(PacketType::Pong, None, None), "3");
        assert_eq!(encode(PacketType::Message, Some(EventType::Connect), None), "40");
    }

    #[test]
    fn test_round_trip_supported_triples() {
        let cases = [
            (PacketType::Ping, None, "probe"),
            (PacketType::Pong, None, ""),
            (PacketType::Message, Some(EventType::Event), "[\"hello\",1,2]"),
            (PacketType::Message, Some(EventType::Ack), "[]"),
            (PacketType::Open, None, "{\"sid\":\"abc\"}"),
        ];

        for (packet, event, content) in cases {
            let decoded = decode(&encode(packet, event, Some(content))).unwrap();
            assert_eq!(decoded.packet_type(), Some(packet));
            assert_eq!(decoded.event_type(), event);
            assert_eq!(decoded.content, content);
        }
    }

    #[test]
    fn test_decode_second_digit_is_optional() {
        let packet = decode("3probe").unwrap();
        assert_eq!(packet.packet, 3);
        assert_eq!(packet.event, None);
        assert_eq!(packet.content, "probe");

        let packet = decode("1").unwrap();
        assert_eq!(packet.packet, 1);
        assert_eq!(packet.event, None);
        assert_eq!(packet.content, "");
    }

    #[test]
    fn test_decode_second_digit_is_greedy() {
        let packet = decode("4211").unwrap();
        assert_eq!(packet.event, Some(2));
        assert_eq!(packet.content, "11");
    }

    #[test]
    fn test_decode_keeps_unknown_digits() {
        let packet = decode("98x").unwrap();
        assert_eq!(packet.packet, 9);
        assert_eq!(packet.packet_type(), None);
        assert_eq!(packet.event, Some(8));
        assert_eq!(packet.event_type(), None);
    }

    #[test]
    fn test_decode_rejects_non_digit_start() {
        assert!(matches!(decode(""), Err(SocketError::Parse(_))));
        assert!(matches!(decode("hello"), Err(SocketError::Parse(_))));
        assert!(matches!(decode(" 42[]"), Err(SocketError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_line_terminators() {
        assert!(decode("42[\"a\",\n1]").is_err());
        assert!(decode("42[\"a\"]\r").is_err());
        assert!(decode("42[\"a\u{2028}\"]").is_err());
    }

    #[test]
    fn test_classify_pong_is_keepalive() {
        assert_eq!(decode("3").unwrap().classify(), Inbound::Keepalive);
        assert_eq!(decode("3probe").unwrap().classify(), Inbound::Keepalive);
    }

    #[test]
    fn test_classify_empty_content_is_keepalive() {
        // "40" is the socket.io CONNECT packet; empty content wins over the event digit
        assert_eq!(decode("40").unwrap().classify(), Inbound::Keepalive);
        assert_eq!(decode("2").unwrap().classify(), Inbound::Keepalive);
        assert_eq!(decode("1").unwrap().classify(), Inbound::Keepalive);
    }

    #[test]
    fn test_classify_event() {
        let inbound = decode("42[\"hello\",1,2]").unwrap().classify();
        assert_eq!(
            inbound,
            Inbound::Event {
                name: "hello".to_string(),
                args: vec![json!(1), json!(2)],
            }
        );
    }

    #[test]
    fn test_classify_ignores_other_event_types() {
        assert!(matches!(decode("43[\"hello\"]").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("45[\"hello\"]").unwrap().classify(), Inbound::Ignored(_)));
        // "0{...}" has no event digit at all
        assert!(matches!(
            decode("0{\"sid\":\"abc\"}").unwrap().classify(),
            Inbound::Ignored(_)
        ));
    }

    #[test]
    fn test_classify_requires_message_packet() {
        assert!(matches!(decode("52[\"hello\"]").unwrap().classify(), Inbound::Ignored(_)));
    }

    #[test]
    fn test_classify_drops_bad_json() {
        assert!(matches!(decode("42[\"hello\"").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42null").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42false").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42\"\"").unwrap().classify(), Inbound::Ignored(_)));
    }

    #[test]
    fn test_classify_fails_closed_on_unresolvable_name() {
        assert!(matches!(decode("42[]").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42[1,2]").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42\"hello\"").unwrap().classify(), Inbound::Ignored(_)));
        assert!(matches!(decode("42{\"a\":1}").unwrap().classify(), Inbound::Ignored(_)));
    }
}
