//! Wire types shared by the moderation features.
//!
//! Enumerations travel as integers and are checked for membership on
//! decode; log entries travel as positional arrays.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::MemberId;

/// Standing of one member over another. Lower is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccessLevel {
    OwnSelf = 0,
    ClubOwner = 1,
    Owner = 2,
    Lover = 3,
    Mistress = 4,
    Whitelist = 5,
    Friend = 6,
    Public = 7,
}

impl TryFrom<u8> for AccessLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => AccessLevel::OwnSelf,
            1 => AccessLevel::ClubOwner,
            2 => AccessLevel::Owner,
            3 => AccessLevel::Lover,
            4 => AccessLevel::Mistress,
            5 => AccessLevel::Whitelist,
            6 => AccessLevel::Friend,
            7 => AccessLevel::Public,
            other => return Err(format!("unknown access level {}", other)),
        })
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> Self {
        level as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LogAccessLevel {
    None = 0,
    Normal = 1,
    Protected = 2,
}

impl TryFrom<u8> for LogAccessLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LogAccessLevel::None),
            1 => Ok(LogAccessLevel::Normal),
            2 => Ok(LogAccessLevel::Protected),
            other => Err(format!("unknown log access level {}", other)),
        }
    }
}

impl From<LogAccessLevel> for u8 {
    fn from(level: LogAccessLevel) -> Self {
        level as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ConditionLimit {
    Normal = 0,
    Limited = 1,
    Blocked = 2,
}

impl TryFrom<u8> for ConditionLimit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ConditionLimit::Normal),
            1 => Ok(ConditionLimit::Limited),
            2 => Ok(ConditionLimit::Blocked),
            other => Err(format!("unknown condition limit {}", other)),
        }
    }
}

impl From<ConditionLimit> for u8 {
    fn from(limit: ConditionLimit) -> Self {
        limit as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCategory {
    Curses,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub category: String,
    pub name: String,
    /// Whether the member may use this permission on themselves.
    #[serde(rename = "self")]
    pub self_access: bool,
    /// Weakest access level still allowed to use it.
    pub min: AccessLevel,
}

pub type PermissionsMap = BTreeMap<String, PermissionInfo>;

/// Which side of a permission an edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionAxis {
    #[serde(rename = "self")]
    SelfAccess,
    #[serde(rename = "min")]
    MinLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionValue {
    Flag(bool),
    Level(AccessLevel),
}

/// A permission edit whose value shape matches its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPermissionEdit")]
pub struct PermissionEdit {
    #[serde(rename = "edit")]
    axis: PermissionAxis,
    #[serde(rename = "target")]
    value: PermissionValue,
}

#[derive(Deserialize)]
struct RawPermissionEdit {
    edit: PermissionAxis,
    target: PermissionValue,
}

impl TryFrom<RawPermissionEdit> for PermissionEdit {
    type Error = String;

    fn try_from(raw: RawPermissionEdit) -> Result<Self, Self::Error> {
        PermissionEdit::new(raw.edit, raw.target)
    }
}

impl PermissionEdit {
    pub fn new(axis: PermissionAxis, value: PermissionValue) -> Result<Self, String> {
        match (axis, value) {
            (PermissionAxis::SelfAccess, PermissionValue::Flag(_))
            | (PermissionAxis::MinLevel, PermissionValue::Level(_)) => Ok(Self { axis, value }),
            (PermissionAxis::SelfAccess, other) => {
                Err(format!("'self' edit needs a boolean, got {:?}", other))
            }
            (PermissionAxis::MinLevel, other) => {
                Err(format!("'min' edit needs an access level, got {:?}", other))
            }
        }
    }

    pub fn axis(&self) -> PermissionAxis {
        self.axis
    }

    pub fn value(&self) -> PermissionValue {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Mistress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleAction {
    Add,
    Remove,
}

/// `[member, name]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry(pub MemberId, pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesData {
    pub owners: Vec<RoleEntry>,
    pub mistresses: Vec<RoleEntry>,
    pub allow_add_owner: bool,
    pub allow_remove_owner: bool,
    pub allow_add_mistress: bool,
    pub allow_remove_mistress: bool,
}

/// One behaviour log line: `[time, level, message, extra?]`.
///
/// `message` is opaque to the protocol; the log feature renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct LogEntry {
    pub time: u64,
    pub level: LogAccessLevel,
    pub message: Value,
    pub extra: Option<Value>,
}

impl TryFrom<Vec<Value>> for LogEntry {
    type Error = String;

    fn try_from(raw: Vec<Value>) -> Result<Self, Self::Error> {
        if raw.len() < 3 || raw.len() > 4 {
            return Err(format!("log entry has {} fields, expected 3 or 4", raw.len()));
        }
        let mut fields = raw.into_iter();
        let time = fields
            .next()
            .and_then(|v| v.as_u64())
            .ok_or_else(|| "log entry time is not a non-negative integer".to_string())?;
        let level = fields
            .next()
            .and_then(|v| v.as_u64())
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| "log entry level is not an integer".to_string())
            .and_then(LogAccessLevel::try_from)?;
        let message = fields.next().unwrap_or(Value::Null);
        Ok(LogEntry {
            time,
            level,
            message,
            extra: fields.next(),
        })
    }
}

impl From<LogEntry> for Vec<Value> {
    fn from(entry: LogEntry) -> Self {
        let mut out = vec![
            Value::from(entry.time),
            Value::from(u8::from(entry.level)),
            entry.message,
        ];
        if let Some(extra) = entry.extra {
            out.push(extra);
        }
        out
    }
}

pub type LogConfig = BTreeMap<String, LogAccessLevel>;

/// Positive, neutral or negative praise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Praise {
    Scold = -1,
    Neutral = 0,
    Praise = 1,
}

impl TryFrom<i8> for Praise {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Praise::Scold),
            0 => Ok(Praise::Neutral),
            1 => Ok(Praise::Praise),
            other => Err(format!("praise must be -1, 0 or 1, got {}", other)),
        }
    }
}

impl From<Praise> for i8 {
    fn from(praise: Praise) -> Self {
        praise as i8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAllowedActions {
    pub delete: bool,
    pub configure: bool,
    pub praise: bool,
    pub leave_message: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionState {
    pub active: bool,
    /// Expiry as a unix timestamp in milliseconds.
    #[serde(default)]
    pub timer: Option<u64>,
    #[serde(default)]
    pub timer_remove: bool,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsCategoryData {
    pub access_normal: bool,
    pub access_limited: bool,
    pub access_configure: bool,
    pub access_change_limits: bool,
    pub conditions: BTreeMap<String, ConditionState>,
    pub limits: BTreeMap<String, ConditionLimit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn access_level_rejects_out_of_range() {
        assert_eq!(
            serde_json::from_value::<AccessLevel>(json!(4)).expect("valid"),
            AccessLevel::Mistress
        );
        assert!(serde_json::from_value::<AccessLevel>(json!(8)).is_err());
        assert!(serde_json::from_value::<AccessLevel>(json!("4")).is_err());
    }

    #[test]
    fn log_entry_keeps_positional_shape() {
        let raw = json!([1000, 2, 3, null]);
        let entry: LogEntry = serde_json::from_value(raw.clone()).expect("valid entry");
        assert_eq!(entry.time, 1000);
        assert_eq!(entry.level, LogAccessLevel::Protected);
        assert_eq!(serde_json::to_value(&entry).expect("serialize"), raw);

        let short: LogEntry = serde_json::from_value(json!([5, 0, "hi"])).expect("valid");
        assert_eq!(short.extra, None);
    }

    #[test]
    fn log_entry_rejects_bad_fields() {
        assert!(serde_json::from_value::<LogEntry>(json!([-1, 1, "x"])).is_err());
        assert!(serde_json::from_value::<LogEntry>(json!([1, 9, "x"])).is_err());
        assert!(serde_json::from_value::<LogEntry>(json!([1, 1])).is_err());
        assert!(serde_json::from_value::<LogEntry>(json!("oops")).is_err());
    }

    #[test]
    fn permission_edit_checks_axis_against_value() {
        assert!(PermissionEdit::new(PermissionAxis::SelfAccess, PermissionValue::Flag(true)).is_ok());
        assert!(PermissionEdit::new(
            PermissionAxis::SelfAccess,
            PermissionValue::Level(AccessLevel::Owner)
        )
        .is_err());

        let decoded: PermissionEdit =
            serde_json::from_value(json!({ "edit": "min", "target": 4 })).expect("valid edit");
        assert_eq!(decoded.value(), PermissionValue::Level(AccessLevel::Mistress));
        assert!(serde_json::from_value::<PermissionEdit>(json!({ "edit": "min", "target": true }))
            .is_err());
    }

    #[test]
    fn role_entries_are_pairs() {
        let roles = RolesData {
            owners: vec![RoleEntry(7, "Ann".to_string())],
            ..RolesData::default()
        };
        let wire = serde_json::to_value(&roles).expect("serialize");
        assert_eq!(wire["owners"], json!([[7, "Ann"]]));
        assert_eq!(wire["allowAddMistress"], json!(false));
    }
}
