use serde_json::Value;
use thiserror::Error;

use crate::host::MemberId;

/// Failures surfaced by the protocol layer.
///
/// None of these are fatal: a misbehaving or outdated peer can only ever
/// cause a rejected query or a dropped message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("protocol is not initialized yet")]
    NotInitialized,
    #[error("query '{query}' to {target} timed out")]
    Timeout { query: String, target: MemberId },
    #[error("query '{query}' was rejected by the peer")]
    Rejected { query: String, error: Option<Value> },
    #[error("invalid response to '{query}': {reason}")]
    Decode {
        query: String,
        reason: String,
        raw: Value,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("protocol was unloaded")]
    Unloaded,
    #[error("character {0} is not known in the current session")]
    UnknownCharacter(MemberId),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProtocolError {
    pub(crate) fn decode(query: &str, reason: impl Into<String>, raw: Value) -> Self {
        ProtocolError::Decode {
            query: query.to_string(),
            reason: reason.into(),
            raw,
        }
    }

    /// Raw peer payload attached to the error, if any.
    pub fn raw_value(&self) -> Option<&Value> {
        match self {
            ProtocolError::Decode { raw, .. } => Some(raw),
            ProtocolError::Rejected { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ProtocolError {
    fn from(e: toml::de::Error) -> Self {
        ProtocolError::Config(e.to_string())
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
