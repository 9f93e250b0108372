use crate::host::MemberId;

use super::types::{
    AccessLevel, ConditionCategory, ConditionLimit, ConditionState, ConditionsCategoryData,
    LogAccessLevel, LogAllowedActions, LogConfig, LogEntry, PermissionEdit, PermissionsMap,
    Praise, Role, RoleAction, RolesData,
};

/// Local authoritative functions of the moderation features.
///
/// Every call names the `actor` on whose behalf it runs: the local player
/// for direct calls, the asking member for calls arriving as queries.
/// Implementations enforce their own permission rules; a refused edit
/// returns `false` and a refused read returns `None`.
pub trait ModerationBackend: Send + Sync {
    fn permissions(&self, actor: MemberId) -> PermissionsMap;
    fn permission_access(&self, actor: MemberId, permission: &str) -> bool;
    fn access_level(&self, actor: MemberId) -> AccessLevel;
    fn set_permission(&self, actor: MemberId, permission: &str, edit: PermissionEdit) -> bool;

    fn roles(&self, actor: MemberId) -> Option<RolesData>;
    fn edit_role(&self, actor: MemberId, role: Role, action: RoleAction, target: MemberId) -> bool;

    fn log_entries(&self, actor: MemberId) -> Option<Vec<LogEntry>>;
    fn delete_log_entries(&self, actor: MemberId, times: &[u64]) -> bool;
    fn log_config(&self, actor: MemberId) -> Option<LogConfig>;
    fn set_log_config(&self, actor: MemberId, category: &str, level: LogAccessLevel) -> bool;
    fn clear_log(&self, actor: MemberId) -> bool;
    fn praise(&self, actor: MemberId, praise: Praise, message: Option<&str>) -> bool;
    fn log_allowed_actions(&self, actor: MemberId) -> LogAllowedActions;

    fn curse_item(&self, actor: MemberId, group: &str, curse_properties: Option<bool>) -> bool;
    fn curse_lift(&self, actor: MemberId, group: &str) -> bool;
    fn curse_lift_all(&self, actor: MemberId) -> bool;

    fn conditions(
        &self,
        actor: MemberId,
        category: ConditionCategory,
    ) -> Option<ConditionsCategoryData>;
    fn set_condition_limit(
        &self,
        actor: MemberId,
        category: ConditionCategory,
        condition: &str,
        limit: ConditionLimit,
    ) -> bool;
    fn update_condition(
        &self,
        actor: MemberId,
        category: ConditionCategory,
        condition: &str,
        update: ConditionState,
    ) -> bool;

    fn rule_create(&self, actor: MemberId, rule: &str) -> bool;
    fn rule_delete(&self, actor: MemberId, rule: &str) -> bool;
}

/// Decides whether `sender` has standing authority over the local player.
pub trait AccessCheck: Send + Sync {
    fn has_access(&self, sender: MemberId) -> bool;
}

impl<F> AccessCheck for F
where
    F: Fn(MemberId) -> bool + Send + Sync,
{
    fn has_access(&self, sender: MemberId) -> bool {
        self(sender)
    }
}
