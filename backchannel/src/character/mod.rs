//! Character proxies: one capability surface for every member in the room.
//!
//! The local player's proxy calls the moderation backend directly. Every
//! other proxy turns each call into one query and validates the answer
//! before handing it out, since it was produced by a process we do not
//! control.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::effects::Effects;
use crate::error::{ProtocolError, ProtocolResult};
use crate::host::MemberId;
use crate::messaging::Correlator;
use crate::moderation::queries::*;
use crate::moderation::types::{
    AccessLevel, ConditionCategory, ConditionLimit, ConditionState, ConditionsCategoryData,
    LogAccessLevel, LogAllowedActions, LogConfig, LogEntry, PermissionAxis, PermissionEdit,
    PermissionValue, PermissionsMap, Praise, Role, RoleAction, RolesData,
};
use crate::moderation::ModerationBackend;

pub mod registry;
pub mod validate;

pub use registry::CharacterRegistry;
pub use validate::{decode_response, CheckResponse};

pub struct LocalCharacter {
    backend: Arc<dyn ModerationBackend>,
}

pub struct RemoteCharacter {
    correlator: Arc<Correlator>,
}

pub enum CharacterVariant {
    Local(LocalCharacter),
    Remote(RemoteCharacter),
}

pub struct Character {
    id: MemberId,
    name: String,
    version: Option<String>,
    effects: Mutex<Effects>,
    variant: CharacterVariant,
}

impl Character {
    pub fn local(
        id: MemberId,
        name: String,
        version: String,
        backend: Arc<dyn ModerationBackend>,
    ) -> Self {
        Self {
            id,
            name,
            version: Some(version),
            effects: Mutex::new(Effects::default()),
            variant: CharacterVariant::Local(LocalCharacter { backend }),
        }
    }

    pub fn remote(id: MemberId, name: String, correlator: Arc<Correlator>) -> Self {
        Self {
            id,
            name,
            version: None,
            effects: Mutex::new(Effects::default()),
            variant: CharacterVariant::Remote(RemoteCharacter { correlator }),
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol version; only known for the local player.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_player(&self) -> bool {
        matches!(self.variant, CharacterVariant::Local(_))
    }

    pub fn effects(&self) -> Effects {
        self.effects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn set_effects(&self, effects: Effects) {
        *self.effects.lock().unwrap_or_else(|e| e.into_inner()) = effects;
    }

    async fn remote_query<T>(
        &self,
        remote: &RemoteCharacter,
        query: &str,
        args: impl Serialize,
    ) -> ProtocolResult<T>
    where
        T: DeserializeOwned + CheckResponse,
    {
        let data = serde_json::to_value(args)
            .map_err(|e| ProtocolError::InvalidArgument(format!("{}: {}", query, e)))?;
        let raw = remote.correlator.send_query(query, data, self.id).await?;
        decode_response(query, raw)
    }

    pub async fn get_permissions(&self) -> ProtocolResult<PermissionsMap> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.permissions(self.id)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, PERMISSIONS, Value::Null).await
            }
        }
    }

    pub async fn get_permission_access(&self, permission: &str) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.permission_access(self.id, permission))
            }
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, PERMISSION_ACCESS, permission).await
            }
        }
    }

    /// Our access level as seen by this character.
    pub async fn get_my_access_level(&self) -> ProtocolResult<AccessLevel> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.access_level(self.id)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, MY_ACCESS_LEVEL, Value::Null).await
            }
        }
    }

    /// Edit either the self-access flag or the minimum access level of a
    /// permission. A value that does not fit `axis` is refused here,
    /// before anything is sent.
    pub async fn set_permission(
        &self,
        permission: &str,
        axis: PermissionAxis,
        value: PermissionValue,
    ) -> ProtocolResult<bool> {
        let edit = PermissionEdit::new(axis, value).map_err(ProtocolError::InvalidArgument)?;
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.set_permission(self.id, permission, edit))
            }
            CharacterVariant::Remote(remote) => {
                let args = EditPermissionArgs {
                    permission: permission.to_string(),
                    edit: edit.axis(),
                    target: edit.value(),
                };
                self.remote_query(remote, EDIT_PERMISSION, args).await
            }
        }
    }

    pub async fn get_roles(&self) -> ProtocolResult<RolesData> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                refused_if_none(ROLES_DATA, local.backend.roles(self.id))
            }
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, ROLES_DATA, Value::Null).await
            }
        }
    }

    pub async fn edit_role(
        &self,
        role: Role,
        action: RoleAction,
        target: MemberId,
    ) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.edit_role(self.id, role, action, target))
            }
            CharacterVariant::Remote(remote) => {
                let args = EditRoleArgs {
                    role,
                    action,
                    target,
                };
                self.remote_query(remote, EDIT_ROLE, args).await
            }
        }
    }

    pub async fn get_log_entries(&self) -> ProtocolResult<Vec<LogEntry>> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                refused_if_none(LOG_DATA, local.backend.log_entries(self.id))
            }
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, LOG_DATA, Value::Null).await
            }
        }
    }

    /// Delete the log entries with the given timestamps.
    pub async fn delete_log_entries(&self, times: &[u64]) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.delete_log_entries(self.id, times))
            }
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, LOG_DELETE, times).await
            }
        }
    }

    pub async fn get_log_config(&self) -> ProtocolResult<LogConfig> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                refused_if_none(LOG_CONFIG_GET, local.backend.log_config(self.id))
            }
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, LOG_CONFIG_GET, Value::Null).await
            }
        }
    }

    pub async fn set_log_config(
        &self,
        category: &str,
        level: LogAccessLevel,
    ) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.set_log_config(self.id, category, level))
            }
            CharacterVariant::Remote(remote) => {
                let args = LogConfigEditArgs {
                    category: category.to_string(),
                    target: level,
                };
                self.remote_query(remote, LOG_CONFIG_EDIT, args).await
            }
        }
    }

    pub async fn clear_log(&self) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.clear_log(self.id)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, LOG_CLEAR, Value::Null).await
            }
        }
    }

    pub async fn praise(&self, praise: Praise, message: Option<&str>) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.praise(self.id, praise, message))
            }
            CharacterVariant::Remote(remote) => {
                let args = PraiseArgs {
                    value: praise,
                    message: message.map(str::to_string),
                };
                self.remote_query(remote, LOG_PRAISE, args).await
            }
        }
    }

    pub async fn get_log_allowed_actions(&self) -> ProtocolResult<LogAllowedActions> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.log_allowed_actions(self.id)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, LOG_ALLOWED_ACTIONS, Value::Null)
                    .await
            }
        }
    }

    pub async fn curse_item(
        &self,
        group: &str,
        curse_properties: Option<bool>,
    ) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => {
                Ok(local.backend.curse_item(self.id, group, curse_properties))
            }
            CharacterVariant::Remote(remote) => {
                let args = CurseItemArgs {
                    group: group.to_string(),
                    curse_properties,
                };
                self.remote_query(remote, CURSE_ITEM, args).await
            }
        }
    }

    pub async fn curse_lift(&self, group: &str) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.curse_lift(self.id, group)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, CURSE_LIFT, group).await
            }
        }
    }

    pub async fn curse_lift_all(&self) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.curse_lift_all(self.id)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, CURSE_LIFT_ALL, Value::Null).await
            }
        }
    }

    pub async fn get_conditions(
        &self,
        category: ConditionCategory,
    ) -> ProtocolResult<ConditionsCategoryData> {
        match &self.variant {
            CharacterVariant::Local(local) => refused_if_none(
                CONDITIONS_GET,
                local.backend.conditions(self.id, category),
            ),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, CONDITIONS_GET, category).await
            }
        }
    }

    pub async fn set_condition_limit(
        &self,
        category: ConditionCategory,
        condition: &str,
        limit: ConditionLimit,
    ) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local
                .backend
                .set_condition_limit(self.id, category, condition, limit)),
            CharacterVariant::Remote(remote) => {
                let args = ConditionLimitArgs {
                    category,
                    condition: condition.to_string(),
                    limit,
                };
                self.remote_query(remote, CONDITION_SET_LIMIT, args).await
            }
        }
    }

    pub async fn update_condition(
        &self,
        category: ConditionCategory,
        condition: &str,
        update: ConditionState,
    ) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local
                .backend
                .update_condition(self.id, category, condition, update)),
            CharacterVariant::Remote(remote) => {
                let args = ConditionUpdateArgs {
                    category,
                    condition: condition.to_string(),
                    data: update,
                };
                self.remote_query(remote, CONDITION_UPDATE, args).await
            }
        }
    }

    pub async fn rule_create(&self, rule: &str) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.rule_create(self.id, rule)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, RULE_CREATE, rule).await
            }
        }
    }

    pub async fn rule_delete(&self, rule: &str) -> ProtocolResult<bool> {
        match &self.variant {
            CharacterVariant::Local(local) => Ok(local.backend.rule_delete(self.id, rule)),
            CharacterVariant::Remote(remote) => {
                self.remote_query(remote, RULE_DELETE, rule).await
            }
        }
    }
}

impl std::fmt::Debug for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Character")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("player", &self.is_player())
            .finish()
    }
}

fn refused_if_none<T>(query: &str, value: Option<T>) -> ProtocolResult<T> {
    value.ok_or_else(|| ProtocolError::Rejected {
        query: query.to_string(),
        error: None,
    })
}
