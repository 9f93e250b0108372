//! In-memory moderation backend.
//!
//! Holds one player's roles, permission table, behaviour log, curses,
//! rules and condition limits. Nothing is persisted. Used by the tests and
//! the simulator as the local authoritative side of the protocol.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::host::MemberId;

use super::backend::{AccessCheck, ModerationBackend};
use super::types::{
    AccessLevel, ConditionCategory, ConditionLimit, ConditionState, ConditionsCategoryData,
    LogAccessLevel, LogAllowedActions, LogConfig, LogEntry, PermissionEdit, PermissionInfo,
    PermissionValue, PermissionsMap, Praise, Role, RoleAction, RoleEntry, RolesData,
};

pub const AUTHORITY_VIEW_ROLES: &str = "authority_view_roles";
pub const AUTHORITY_GRANT_OWNER: &str = "authority_grant_owner";
pub const AUTHORITY_REVOKE_OWNER: &str = "authority_revoke_owner";
pub const AUTHORITY_GRANT_MISTRESS: &str = "authority_grant_mistress";
pub const AUTHORITY_REVOKE_MISTRESS: &str = "authority_revoke_mistress";
pub const AUTHORITY_EDIT_PERMISSIONS: &str = "authority_edit_permissions";
pub const LOG_VIEW_NORMAL: &str = "log_view_normal";
pub const LOG_VIEW_PROTECTED: &str = "log_view_protected";
pub const LOG_CONFIGURE: &str = "log_configure";
pub const LOG_DELETE_ENTRIES: &str = "log_delete";
pub const LOG_PRAISE_PERMISSION: &str = "log_praise";
pub const LOG_LEAVE_MESSAGE: &str = "log_leaveMessage";

/// Built-in permission table: `(key, category, name, self, min)`.
const DEFAULT_PERMISSIONS: &[(&str, &str, &str, bool, AccessLevel)] = &[
    (AUTHORITY_VIEW_ROLES, "authority", "View owners and mistresses", true, AccessLevel::Mistress),
    (AUTHORITY_GRANT_OWNER, "authority", "Add owners", false, AccessLevel::Owner),
    (AUTHORITY_REVOKE_OWNER, "authority", "Remove owners", true, AccessLevel::Owner),
    (AUTHORITY_GRANT_MISTRESS, "authority", "Add mistresses", false, AccessLevel::Owner),
    (AUTHORITY_REVOKE_MISTRESS, "authority", "Remove mistresses", true, AccessLevel::Owner),
    (AUTHORITY_EDIT_PERMISSIONS, "authority", "Edit permissions", true, AccessLevel::Owner),
    (LOG_VIEW_NORMAL, "log", "See normal log entries", true, AccessLevel::Mistress),
    (LOG_VIEW_PROTECTED, "log", "See protected log entries", true, AccessLevel::Owner),
    (LOG_CONFIGURE, "log", "Configure logged categories", true, AccessLevel::Owner),
    (LOG_DELETE_ENTRIES, "log", "Delete log entries", true, AccessLevel::Owner),
    (LOG_PRAISE_PERMISSION, "log", "Praise or scold", false, AccessLevel::Mistress),
    (LOG_LEAVE_MESSAGE, "log", "Leave a note in the log", false, AccessLevel::Mistress),
    ("curses_normal", "curses", "Curse and lift unrestricted groups", true, AccessLevel::Mistress),
    ("curses_limited", "curses", "Curse and lift limited groups", false, AccessLevel::Owner),
    ("curses_configure", "curses", "Change curse limits", true, AccessLevel::Owner),
    ("rules_normal", "rules", "Create and delete unrestricted rules", false, AccessLevel::Mistress),
    ("rules_limited", "rules", "Create and delete limited rules", false, AccessLevel::Owner),
    ("rules_configure", "rules", "Change rule limits", true, AccessLevel::Owner),
];

/// Log categories and the level their entries are written at.
const DEFAULT_LOG_CONFIG: &[(&str, LogAccessLevel)] = &[
    ("permissionChange", LogAccessLevel::Protected),
    ("roleChange", LogAccessLevel::Protected),
    ("logConfigChange", LogAccessLevel::Protected),
    ("logDeleted", LogAccessLevel::Normal),
    ("praise", LogAccessLevel::Normal),
    ("userNote", LogAccessLevel::Normal),
    ("curseChange", LogAccessLevel::Normal),
    ("ruleChange", LogAccessLevel::Normal),
    ("conditionLimitChange", LogAccessLevel::Protected),
];

#[derive(Default)]
struct CategoryState {
    conditions: BTreeMap<String, ConditionState>,
    limits: BTreeMap<String, ConditionLimit>,
}

struct MemoryState {
    owners: Vec<RoleEntry>,
    mistresses: Vec<RoleEntry>,
    permissions: PermissionsMap,
    log: Vec<LogEntry>,
    log_config: LogConfig,
    categories: BTreeMap<ConditionCategory, CategoryState>,
}

pub struct MemoryModeration {
    player: MemberId,
    state: Mutex<MemoryState>,
}

impl MemoryModeration {
    pub fn new(player: MemberId) -> Self {
        let permissions = DEFAULT_PERMISSIONS
            .iter()
            .map(|(key, category, name, self_access, min)| {
                (
                    key.to_string(),
                    PermissionInfo {
                        category: category.to_string(),
                        name: name.to_string(),
                        self_access: *self_access,
                        min: *min,
                    },
                )
            })
            .collect();
        let log_config = DEFAULT_LOG_CONFIG
            .iter()
            .map(|(category, level)| (category.to_string(), *level))
            .collect();
        Self {
            player,
            state: Mutex::new(MemoryState {
                owners: Vec::new(),
                mistresses: Vec::new(),
                permissions,
                log: Vec::new(),
                log_config,
                categories: BTreeMap::new(),
            }),
        }
    }

    /// Seed an owner without any permission check.
    pub fn add_owner(&self, id: MemberId, name: &str) {
        let mut state = self.lock();
        state.mistresses.retain(|RoleEntry(m, _)| *m != id);
        if !state.owners.iter().any(|RoleEntry(m, _)| *m == id) {
            state.owners.push(RoleEntry(id, name.to_string()));
        }
    }

    /// Seed a mistress without any permission check.
    pub fn add_mistress(&self, id: MemberId, name: &str) {
        let mut state = self.lock();
        if state.owners.iter().any(|RoleEntry(m, _)| *m == id) {
            return;
        }
        if !state.mistresses.iter().any(|RoleEntry(m, _)| *m == id) {
            state.mistresses.push(RoleEntry(id, name.to_string()));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn level_of(&self, state: &MemoryState, actor: MemberId) -> AccessLevel {
        if actor == self.player {
            AccessLevel::OwnSelf
        } else if state.owners.iter().any(|RoleEntry(m, _)| *m == actor) {
            AccessLevel::Owner
        } else if state.mistresses.iter().any(|RoleEntry(m, _)| *m == actor) {
            AccessLevel::Mistress
        } else {
            AccessLevel::Public
        }
    }

    fn allowed(&self, state: &MemoryState, actor: MemberId, permission: &str) -> bool {
        let Some(info) = state.permissions.get(permission) else {
            return false;
        };
        match self.level_of(state, actor) {
            AccessLevel::OwnSelf => info.self_access,
            level => level <= info.min,
        }
    }

    /// Permission gating actions on `condition` given its limit.
    fn allowed_on_condition(
        &self,
        state: &MemoryState,
        actor: MemberId,
        category: ConditionCategory,
        condition: &str,
    ) -> bool {
        let limit = state
            .categories
            .get(&category)
            .and_then(|c| c.limits.get(condition).copied())
            .unwrap_or(ConditionLimit::Normal);
        match limit {
            ConditionLimit::Normal => {
                self.allowed(state, actor, &category_permission(category, "normal"))
            }
            ConditionLimit::Limited => {
                self.allowed(state, actor, &category_permission(category, "limited"))
            }
            ConditionLimit::Blocked => false,
        }
    }

    fn append_log(state: &mut MemoryState, category: &str, message: Value) {
        let level = state
            .log_config
            .get(category)
            .copied()
            .unwrap_or(LogAccessLevel::None);
        if level == LogAccessLevel::None {
            return;
        }
        // Entries are addressed by time, keep it strictly increasing.
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let time = state.log.last().map_or(now, |last| now.max(last.time + 1));
        state.log.push(LogEntry {
            time,
            level,
            message,
            extra: None,
        });
    }
}

fn category_permission(category: ConditionCategory, suffix: &str) -> String {
    let prefix = match category {
        ConditionCategory::Curses => "curses",
        ConditionCategory::Rules => "rules",
    };
    format!("{}_{}", prefix, suffix)
}

impl ModerationBackend for MemoryModeration {
    fn permissions(&self, _actor: MemberId) -> PermissionsMap {
        self.lock().permissions.clone()
    }

    fn permission_access(&self, actor: MemberId, permission: &str) -> bool {
        let state = self.lock();
        self.allowed(&state, actor, permission)
    }

    fn access_level(&self, actor: MemberId) -> AccessLevel {
        let state = self.lock();
        self.level_of(&state, actor)
    }

    fn set_permission(&self, actor: MemberId, permission: &str, edit: PermissionEdit) -> bool {
        let mut state = self.lock();
        if !state.permissions.contains_key(permission)
            || !self.allowed(&state, actor, AUTHORITY_EDIT_PERMISSIONS)
            || !self.allowed(&state, actor, permission)
        {
            return false;
        }
        let level = self.level_of(&state, actor);
        let Some(info) = state.permissions.get_mut(permission) else {
            return false;
        };
        match edit.value() {
            PermissionValue::Flag(flag) => info.self_access = flag,
            // Nobody can lock themselves out of a permission they hold.
            PermissionValue::Level(min) if level != AccessLevel::OwnSelf && min < level => {
                return false;
            }
            PermissionValue::Level(min) => info.min = min,
        }
        info!("[Moderation] {} edited permission '{}'", actor, permission);
        Self::append_log(
            &mut state,
            "permissionChange",
            json!({ "by": actor, "permission": permission, "edit": edit.axis(), "target": edit.value() }),
        );
        true
    }

    fn roles(&self, actor: MemberId) -> Option<RolesData> {
        let state = self.lock();
        if !self.allowed(&state, actor, AUTHORITY_VIEW_ROLES) {
            return None;
        }
        Some(RolesData {
            owners: state.owners.clone(),
            mistresses: state.mistresses.clone(),
            allow_add_owner: self.allowed(&state, actor, AUTHORITY_GRANT_OWNER),
            allow_remove_owner: self.allowed(&state, actor, AUTHORITY_REVOKE_OWNER),
            allow_add_mistress: self.allowed(&state, actor, AUTHORITY_GRANT_MISTRESS),
            allow_remove_mistress: self.allowed(&state, actor, AUTHORITY_REVOKE_MISTRESS),
        })
    }

    fn edit_role(&self, actor: MemberId, role: Role, action: RoleAction, target: MemberId) -> bool {
        let permission = match (role, action) {
            (Role::Owner, RoleAction::Add) => AUTHORITY_GRANT_OWNER,
            (Role::Owner, RoleAction::Remove) => AUTHORITY_REVOKE_OWNER,
            (Role::Mistress, RoleAction::Add) => AUTHORITY_GRANT_MISTRESS,
            (Role::Mistress, RoleAction::Remove) => AUTHORITY_REVOKE_MISTRESS,
        };
        let mut state = self.lock();
        if target == self.player || !self.allowed(&state, actor, permission) {
            return false;
        }
        let changed = match action {
            RoleAction::Add => {
                state.owners.retain(|RoleEntry(m, _)| *m != target);
                state.mistresses.retain(|RoleEntry(m, _)| *m != target);
                let list = match role {
                    Role::Owner => &mut state.owners,
                    Role::Mistress => &mut state.mistresses,
                };
                list.push(RoleEntry(target, String::new()));
                true
            }
            RoleAction::Remove => {
                let list = match role {
                    Role::Owner => &mut state.owners,
                    Role::Mistress => &mut state.mistresses,
                };
                let before = list.len();
                list.retain(|RoleEntry(m, _)| *m != target);
                list.len() != before
            }
        };
        if changed {
            Self::append_log(
                &mut state,
                "roleChange",
                json!({ "by": actor, "role": role, "action": action, "target": target }),
            );
        }
        changed
    }

    fn log_entries(&self, actor: MemberId) -> Option<Vec<LogEntry>> {
        let state = self.lock();
        let normal = self.allowed(&state, actor, LOG_VIEW_NORMAL);
        let protected = self.allowed(&state, actor, LOG_VIEW_PROTECTED);
        if !normal && !protected {
            return None;
        }
        Some(
            state
                .log
                .iter()
                .filter(|e| match e.level {
                    LogAccessLevel::Normal => normal,
                    LogAccessLevel::Protected => protected,
                    LogAccessLevel::None => false,
                })
                .cloned()
                .collect(),
        )
    }

    fn delete_log_entries(&self, actor: MemberId, times: &[u64]) -> bool {
        let mut state = self.lock();
        if !self.allowed(&state, actor, LOG_DELETE_ENTRIES) {
            return false;
        }
        let before = state.log.len();
        state.log.retain(|e| !times.contains(&e.time));
        let deleted = before - state.log.len();
        debug!("[Moderation] {} deleted {} log entries", actor, deleted);
        if deleted > 0 {
            Self::append_log(&mut state, "logDeleted", json!({ "by": actor, "count": deleted }));
        }
        true
    }

    fn log_config(&self, actor: MemberId) -> Option<LogConfig> {
        let state = self.lock();
        self.allowed(&state, actor, LOG_CONFIGURE)
            .then(|| state.log_config.clone())
    }

    fn set_log_config(&self, actor: MemberId, category: &str, level: LogAccessLevel) -> bool {
        let mut state = self.lock();
        if !self.allowed(&state, actor, LOG_CONFIGURE) || !state.log_config.contains_key(category)
        {
            return false;
        }
        state.log_config.insert(category.to_string(), level);
        Self::append_log(
            &mut state,
            "logConfigChange",
            json!({ "by": actor, "category": category, "level": level }),
        );
        true
    }

    fn clear_log(&self, actor: MemberId) -> bool {
        let mut state = self.lock();
        if !self.allowed(&state, actor, LOG_DELETE_ENTRIES)
            || !self.allowed(&state, actor, LOG_CONFIGURE)
        {
            return false;
        }
        state.log.clear();
        info!("[Moderation] {} cleared the log", actor);
        true
    }

    fn praise(&self, actor: MemberId, praise: Praise, message: Option<&str>) -> bool {
        let mut state = self.lock();
        let praising = praise != Praise::Neutral;
        if !praising && message.is_none() {
            return false;
        }
        if praising && !self.allowed(&state, actor, LOG_PRAISE_PERMISSION) {
            return false;
        }
        if message.is_some() && !self.allowed(&state, actor, LOG_LEAVE_MESSAGE) {
            return false;
        }
        if praising {
            Self::append_log(
                &mut state,
                "praise",
                json!({ "by": actor, "value": praise, "message": message }),
            );
        } else {
            Self::append_log(&mut state, "userNote", json!({ "by": actor, "message": message }));
        }
        true
    }

    fn log_allowed_actions(&self, actor: MemberId) -> LogAllowedActions {
        let state = self.lock();
        LogAllowedActions {
            delete: self.allowed(&state, actor, LOG_DELETE_ENTRIES),
            configure: self.allowed(&state, actor, LOG_CONFIGURE),
            praise: self.allowed(&state, actor, LOG_PRAISE_PERMISSION),
            leave_message: self.allowed(&state, actor, LOG_LEAVE_MESSAGE),
        }
    }

    fn curse_item(&self, actor: MemberId, group: &str, curse_properties: Option<bool>) -> bool {
        let mut state = self.lock();
        if !self.allowed_on_condition(&state, actor, ConditionCategory::Curses, group) {
            return false;
        }
        let curse = ConditionState {
            active: true,
            timer: None,
            timer_remove: false,
            data: json!({ "curseProperties": curse_properties.unwrap_or(false) }),
        };
        state
            .categories
            .entry(ConditionCategory::Curses)
            .or_default()
            .conditions
            .insert(group.to_string(), curse);
        Self::append_log(&mut state, "curseChange", json!({ "by": actor, "cursed": group }));
        true
    }

    fn curse_lift(&self, actor: MemberId, group: &str) -> bool {
        let mut state = self.lock();
        if !self.allowed_on_condition(&state, actor, ConditionCategory::Curses, group) {
            return false;
        }
        let removed = state
            .categories
            .get_mut(&ConditionCategory::Curses)
            .and_then(|c| c.conditions.remove(group))
            .is_some();
        if removed {
            Self::append_log(&mut state, "curseChange", json!({ "by": actor, "lifted": group }));
        }
        removed
    }

    fn curse_lift_all(&self, actor: MemberId) -> bool {
        let mut state = self.lock();
        let groups: Vec<String> = state
            .categories
            .get(&ConditionCategory::Curses)
            .map(|c| c.conditions.keys().cloned().collect())
            .unwrap_or_default();
        if groups
            .iter()
            .any(|g| !self.allowed_on_condition(&state, actor, ConditionCategory::Curses, g))
        {
            return false;
        }
        if let Some(curses) = state.categories.get_mut(&ConditionCategory::Curses) {
            curses.conditions.clear();
        }
        Self::append_log(&mut state, "curseChange", json!({ "by": actor, "liftedAll": true }));
        true
    }

    fn conditions(
        &self,
        actor: MemberId,
        category: ConditionCategory,
    ) -> Option<ConditionsCategoryData> {
        let state = self.lock();
        let access_normal = self.allowed(&state, actor, &category_permission(category, "normal"));
        let access_limited =
            self.allowed(&state, actor, &category_permission(category, "limited"));
        let access_configure =
            self.allowed(&state, actor, &category_permission(category, "configure"));
        if !access_normal && !access_limited && !access_configure {
            return None;
        }
        let (conditions, limits) = state
            .categories
            .get(&category)
            .map(|c| (c.conditions.clone(), c.limits.clone()))
            .unwrap_or_default();
        Some(ConditionsCategoryData {
            access_normal,
            access_limited,
            access_configure,
            access_change_limits: access_configure,
            conditions,
            limits,
        })
    }

    fn set_condition_limit(
        &self,
        actor: MemberId,
        category: ConditionCategory,
        condition: &str,
        limit: ConditionLimit,
    ) -> bool {
        let mut state = self.lock();
        if !self.allowed(&state, actor, &category_permission(category, "configure")) {
            return false;
        }
        let limits = &mut state.categories.entry(category).or_default().limits;
        if limit == ConditionLimit::Normal {
            limits.remove(condition);
        } else {
            limits.insert(condition.to_string(), limit);
        }
        Self::append_log(
            &mut state,
            "conditionLimitChange",
            json!({ "by": actor, "category": category, "condition": condition, "limit": limit }),
        );
        true
    }

    fn update_condition(
        &self,
        actor: MemberId,
        category: ConditionCategory,
        condition: &str,
        update: ConditionState,
    ) -> bool {
        if update.timer_remove && update.timer.is_none() {
            return false;
        }
        let mut state = self.lock();
        if !self.allowed_on_condition(&state, actor, category, condition) {
            return false;
        }
        let Some(existing) = state
            .categories
            .get_mut(&category)
            .and_then(|c| c.conditions.get_mut(condition))
        else {
            return false;
        };
        *existing = update;
        true
    }

    fn rule_create(&self, actor: MemberId, rule: &str) -> bool {
        let mut state = self.lock();
        if !self.allowed_on_condition(&state, actor, ConditionCategory::Rules, rule) {
            return false;
        }
        let rules = &mut state
            .categories
            .entry(ConditionCategory::Rules)
            .or_default()
            .conditions;
        if rules.contains_key(rule) {
            return false;
        }
        rules.insert(
            rule.to_string(),
            ConditionState {
                active: true,
                timer: None,
                timer_remove: false,
                data: Value::Null,
            },
        );
        Self::append_log(&mut state, "ruleChange", json!({ "by": actor, "created": rule }));
        true
    }

    fn rule_delete(&self, actor: MemberId, rule: &str) -> bool {
        let mut state = self.lock();
        if !self.allowed_on_condition(&state, actor, ConditionCategory::Rules, rule) {
            return false;
        }
        let removed = state
            .categories
            .get_mut(&ConditionCategory::Rules)
            .and_then(|c| c.conditions.remove(rule))
            .is_some();
        if removed {
            Self::append_log(&mut state, "ruleChange", json!({ "by": actor, "deleted": rule }));
        }
        removed
    }
}

impl AccessCheck for MemoryModeration {
    /// Owners and mistresses have standing authority; the public does not.
    fn has_access(&self, sender: MemberId) -> bool {
        let state = self.lock();
        self.level_of(&state, sender) < AccessLevel::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::types::PermissionAxis;
    use pretty_assertions::assert_eq;

    const PLAYER: MemberId = 1;
    const OWNER: MemberId = 2;
    const STRANGER: MemberId = 3;

    fn backend() -> MemoryModeration {
        let backend = MemoryModeration::new(PLAYER);
        backend.add_owner(OWNER, "Olive");
        backend
    }

    #[test]
    fn access_levels_follow_roles() {
        let backend = backend();
        assert_eq!(backend.access_level(PLAYER), AccessLevel::OwnSelf);
        assert_eq!(backend.access_level(OWNER), AccessLevel::Owner);
        assert_eq!(backend.access_level(STRANGER), AccessLevel::Public);
        assert!(backend.has_access(OWNER));
        assert!(!backend.has_access(STRANGER));
    }

    #[test]
    fn roles_are_hidden_from_strangers() {
        let backend = backend();
        assert!(backend.roles(STRANGER).is_none());
        let roles = backend.roles(OWNER).expect("owner sees roles");
        assert_eq!(roles.owners, vec![RoleEntry(OWNER, "Olive".to_string())]);
        assert!(roles.allow_add_mistress);
    }

    #[test]
    fn owner_can_add_a_mistress_and_it_is_logged() {
        let backend = backend();
        assert!(backend.edit_role(OWNER, Role::Mistress, RoleAction::Add, 9));
        assert_eq!(backend.access_level(9), AccessLevel::Mistress);
        assert!(!backend.edit_role(9, Role::Owner, RoleAction::Add, 10));

        let log = backend.log_entries(OWNER).expect("owner sees the log");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].level, LogAccessLevel::Protected);
        // protected entries stay hidden from a mistress
        assert_eq!(backend.log_entries(9).map(|l| l.len()), Some(0));
    }

    #[test]
    fn min_level_cannot_be_raised_above_the_editor() {
        let backend = backend();
        let stronger = PermissionEdit::new(
            PermissionAxis::MinLevel,
            PermissionValue::Level(AccessLevel::ClubOwner),
        )
        .expect("valid edit");
        assert!(!backend.set_permission(OWNER, LOG_PRAISE_PERMISSION, stronger));

        let weaker = PermissionEdit::new(
            PermissionAxis::MinLevel,
            PermissionValue::Level(AccessLevel::Friend),
        )
        .expect("valid edit");
        assert!(backend.set_permission(OWNER, LOG_PRAISE_PERMISSION, weaker));
        assert_eq!(
            backend.permissions(OWNER)[LOG_PRAISE_PERMISSION].min,
            AccessLevel::Friend
        );
    }

    #[test]
    fn blocked_conditions_cannot_be_touched() {
        let backend = backend();
        assert!(backend.set_condition_limit(
            OWNER,
            ConditionCategory::Curses,
            "ItemArms",
            ConditionLimit::Blocked
        ));
        assert!(!backend.curse_item(OWNER, "ItemArms", None));
        assert!(backend.curse_item(OWNER, "ItemLegs", Some(true)));

        let curses = backend
            .conditions(OWNER, ConditionCategory::Curses)
            .expect("owner sees curses");
        assert!(curses.conditions.contains_key("ItemLegs"));
        assert_eq!(curses.limits.get("ItemArms"), Some(&ConditionLimit::Blocked));
        assert!(backend.curse_lift_all(OWNER));
    }

    #[test]
    fn rules_are_created_once() {
        let backend = backend();
        assert!(backend.rule_create(OWNER, "speech_no_swearing"));
        assert!(!backend.rule_create(OWNER, "speech_no_swearing"));
        assert!(!backend.rule_delete(STRANGER, "speech_no_swearing"));
        assert!(backend.rule_delete(OWNER, "speech_no_swearing"));
    }

    #[test]
    fn log_times_are_unique() {
        let backend = backend();
        assert!(backend.praise(OWNER, Praise::Praise, Some("good")));
        assert!(backend.praise(OWNER, Praise::Scold, None));
        let log = backend.log_entries(OWNER).expect("visible");
        assert_eq!(log.len(), 2);
        assert!(log[1].time > log[0].time);

        assert!(backend.delete_log_entries(OWNER, &[log[0].time]));
        let remaining = backend.log_entries(OWNER).expect("visible");
        assert!(remaining.iter().all(|e| e.time != log[0].time));
    }
}
