//! Query tags and argument payloads of the moderation surface.

use serde::{Deserialize, Serialize};

use crate::host::MemberId;

use super::types::{
    ConditionCategory, ConditionLimit, ConditionState, LogAccessLevel, PermissionAxis,
    PermissionValue, Praise, Role, RoleAction,
};

pub const PERMISSIONS: &str = "permissions";
pub const PERMISSION_ACCESS: &str = "permissionAccess";
pub const MY_ACCESS_LEVEL: &str = "myAccessLevel";
pub const EDIT_PERMISSION: &str = "editPermission";
pub const ROLES_DATA: &str = "rolesData";
pub const EDIT_ROLE: &str = "editRole";
pub const LOG_DATA: &str = "logData";
pub const LOG_DELETE: &str = "logDelete";
pub const LOG_CONFIG_GET: &str = "logConfigGet";
pub const LOG_CONFIG_EDIT: &str = "logConfigEdit";
pub const LOG_CLEAR: &str = "logClear";
pub const LOG_PRAISE: &str = "logPraise";
pub const LOG_ALLOWED_ACTIONS: &str = "logGetAllowedActions";
pub const CURSE_ITEM: &str = "curseItem";
pub const CURSE_LIFT: &str = "curseLift";
pub const CURSE_LIFT_ALL: &str = "curseLiftAll";
pub const CONDITIONS_GET: &str = "conditionsGet";
pub const CONDITION_SET_LIMIT: &str = "conditionSetLimit";
pub const CONDITION_UPDATE: &str = "conditionUpdate";
pub const RULE_CREATE: &str = "ruleCreate";
pub const RULE_DELETE: &str = "ruleDelete";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPermissionArgs {
    pub permission: String,
    pub edit: PermissionAxis,
    pub target: PermissionValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRoleArgs {
    pub role: Role,
    pub action: RoleAction,
    pub target: MemberId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfigEditArgs {
    pub category: String,
    pub target: LogAccessLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PraiseArgs {
    pub value: Praise,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurseItemArgs {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "curseProperties", default)]
    pub curse_properties: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionLimitArgs {
    pub category: ConditionCategory,
    pub condition: String,
    pub limit: ConditionLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionUpdateArgs {
    pub category: ConditionCategory,
    pub condition: String,
    pub data: ConditionState,
}
