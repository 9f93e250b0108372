//! Envelope codec: wraps typed `{type, message}` pairs into host chat
//! messages and beeps, and unwraps them again on the way in.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::host::{BeepMessage, ChatMessage, MemberId};

/// Host message type used for protocol traffic inside the room.
pub const HIDDEN_KIND: &str = "Hidden";
/// Content marker identifying our hidden messages.
pub const HIDDEN_CONTENT: &str = "BackchannelMsg";
/// Key of the envelope inside a beep payload.
pub const BEEP_PAYLOAD_KEY: &str = "Backchannel";

pub const TAG_QUERY: &str = "query";
pub const TAG_QUERY_ANSWER: &str = "queryAnswer";
pub const TAG_CHANGED: &str = "somethingChanged";

/// The two direct sub-channels a beep can travel on. They differ only in
/// the beep type the host itself interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepChannel {
    Direct,
    Leash,
}

impl BeepChannel {
    pub fn beep_type(self) -> &'static str {
        match self {
            BeepChannel::Direct => "Backchannel",
            BeepChannel::Leash => "Leash",
        }
    }

    pub fn parse(beep_type: &str) -> Option<Self> {
        match beep_type {
            "Backchannel" => Some(BeepChannel::Direct),
            "Leash" => Some(BeepChannel::Leash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, message: Value) -> Self {
        Self {
            kind: kind.into(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl AnswerEnvelope {
    pub fn success(id: String, data: Value) -> Self {
        Self {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: String, error: Option<Value>) -> Self {
        Self {
            id,
            ok: false,
            data: None,
            error,
        }
    }
}

pub fn wrap_hidden(envelope: &Envelope, target: Option<MemberId>) -> ChatMessage {
    ChatMessage {
        kind: HIDDEN_KIND.to_string(),
        content: HIDDEN_CONTENT.to_string(),
        target,
        dictionary: Some(json!({
            "type": envelope.kind,
            "message": envelope.message,
        })),
    }
}

/// Classification of an inbound chat message.
#[derive(Debug, PartialEq)]
pub enum Unwrapped {
    /// Not protocol traffic; leave it to the host.
    Foreign,
    /// Marked as ours but structurally invalid.
    Malformed(String),
    Envelope(Envelope),
}

pub fn unwrap_hidden(message: &ChatMessage) -> Unwrapped {
    if message.kind != HIDDEN_KIND || message.content != HIDDEN_CONTENT {
        return Unwrapped::Foreign;
    }
    decode_envelope(message.dictionary.as_ref())
}

pub fn wrap_beep(envelope: &Envelope, target: MemberId, channel: BeepChannel) -> BeepMessage {
    BeepMessage {
        target,
        beep_type: channel.beep_type().to_string(),
        payload: Some(json!({
            BEEP_PAYLOAD_KEY: {
                "type": envelope.kind,
                "message": envelope.message,
            }
        })),
    }
}

pub fn unwrap_beep(beep: &BeepMessage) -> Unwrapped {
    if BeepChannel::parse(&beep.beep_type).is_none() {
        return Unwrapped::Foreign;
    }
    let Some(inner) = beep.payload.as_ref().and_then(|p| p.get(BEEP_PAYLOAD_KEY)) else {
        return Unwrapped::Foreign;
    };
    decode_envelope(Some(inner))
}

fn decode_envelope(raw: Option<&Value>) -> Unwrapped {
    let Some(raw) = raw else {
        return Unwrapped::Malformed("missing envelope".to_string());
    };
    match serde_json::from_value::<Envelope>(raw.clone()) {
        Ok(envelope) => Unwrapped::Envelope(envelope),
        Err(e) => Unwrapped::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_message_wraps_into_host_dictionary() {
        let env = Envelope::new("somethingChanged", Value::Null);
        let msg = wrap_hidden(&env, Some(7));
        assert_eq!(msg.kind, HIDDEN_KIND);
        assert_eq!(msg.target, Some(7));
        assert_eq!(unwrap_hidden(&msg), Unwrapped::Envelope(env));
    }

    #[test]
    fn ordinary_chat_is_foreign() {
        let msg = ChatMessage {
            kind: "Chat".to_string(),
            content: "hello".to_string(),
            target: None,
            dictionary: None,
        };
        assert_eq!(unwrap_hidden(&msg), Unwrapped::Foreign);
    }

    #[test]
    fn marked_message_without_type_is_malformed() {
        let msg = ChatMessage {
            kind: HIDDEN_KIND.to_string(),
            content: HIDDEN_CONTENT.to_string(),
            target: None,
            dictionary: Some(json!({ "message": 1 })),
        };
        assert!(matches!(unwrap_hidden(&msg), Unwrapped::Malformed(_)));
    }

    #[test]
    fn beep_sub_channels_only_differ_in_beep_type() {
        let env = Envelope::new("ping", json!({ "n": 1 }));
        let direct = wrap_beep(&env, 5, BeepChannel::Direct);
        let leash = wrap_beep(&env, 5, BeepChannel::Leash);
        assert_ne!(direct.beep_type, leash.beep_type);
        assert_eq!(direct.payload, leash.payload);
        assert_eq!(unwrap_beep(&leash), Unwrapped::Envelope(env));
    }

    #[test]
    fn answer_failure_omits_data() {
        let answer = AnswerEnvelope::failure("q1".to_string(), None);
        let wire = serde_json::to_value(&answer).expect("serialize");
        assert_eq!(wire, json!({ "id": "q1", "ok": false }));
    }
}
