//! Shape checks for answers coming back from another client.
//!
//! Typed decoding already rejects wrong types, unknown enum values and
//! malformed arrays; [`CheckResponse`] adds the cross-field rules serde
//! cannot express.

use std::collections::{BTreeMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{ProtocolError, ProtocolResult};
use crate::moderation::types::{
    AccessLevel, ConditionsCategoryData, LogAllowedActions, LogEntry, RoleEntry, RolesData,
};

pub trait CheckResponse {
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl CheckResponse for bool {}
impl CheckResponse for AccessLevel {}
impl CheckResponse for LogAllowedActions {}
impl CheckResponse for Vec<LogEntry> {}

impl<V> CheckResponse for BTreeMap<String, V> {
    fn check(&self) -> Result<(), String> {
        if self.keys().any(|k| k.is_empty()) {
            return Err("empty key".to_string());
        }
        Ok(())
    }
}

impl CheckResponse for RolesData {
    fn check(&self) -> Result<(), String> {
        unique_members("owners", &self.owners)?;
        unique_members("mistresses", &self.mistresses)
    }
}

impl CheckResponse for ConditionsCategoryData {
    fn check(&self) -> Result<(), String> {
        self.conditions.check()?;
        self.limits.check()?;
        if let Some((name, _)) = self
            .conditions
            .iter()
            .find(|(_, state)| state.timer_remove && state.timer.is_none())
        {
            return Err(format!("condition '{}' removes on a timer it does not have", name));
        }
        Ok(())
    }
}

fn unique_members(list: &str, entries: &[RoleEntry]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for RoleEntry(id, _) in entries {
        if !seen.insert(*id) {
            return Err(format!("member {} listed twice in {}", id, list));
        }
    }
    Ok(())
}

/// Decode `raw` as the answer to `query`, reporting the offending value
/// when it does not have the expected shape.
pub fn decode_response<T>(query: &str, raw: Value) -> ProtocolResult<T>
where
    T: DeserializeOwned + CheckResponse,
{
    let checked = serde_json::from_value::<T>(raw.clone())
        .map_err(|e| e.to_string())
        .and_then(|value| value.check().map(|_| value));
    checked.map_err(|reason| {
        warn!(
            "[Character] invalid '{}' response: {} (raw: {})",
            query, reason, raw
        );
        ProtocolError::decode(query, reason, raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrong_type_is_a_decode_error_carrying_the_raw_value() {
        let err = decode_response::<Vec<LogEntry>>("logData", json!("oops")).unwrap_err();
        match err {
            ProtocolError::Decode { query, raw, .. } => {
                assert_eq!(query, "logData");
                assert_eq!(raw, json!("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_role_members_fail_the_check() {
        let raw = json!({
            "owners": [[1, "A"], [1, "A again"]],
            "mistresses": [],
            "allowAddOwner": false,
            "allowRemoveOwner": false,
            "allowAddMistress": false,
            "allowRemoveMistress": false
        });
        assert!(decode_response::<RolesData>("rolesData", raw).is_err());
    }

    #[test]
    fn timer_remove_without_timer_is_rejected() {
        let raw = json!({
            "accessNormal": true,
            "accessLimited": true,
            "accessConfigure": false,
            "accessChangeLimits": false,
            "conditions": { "gag": { "active": true, "timerRemove": true } },
            "limits": {}
        });
        assert!(decode_response::<ConditionsCategoryData>("conditionsGet", raw).is_err());
    }

    #[test]
    fn valid_access_level_decodes() {
        let level: AccessLevel = decode_response("myAccessLevel", json!(2)).expect("valid");
        assert_eq!(level, AccessLevel::Owner);
    }
}
