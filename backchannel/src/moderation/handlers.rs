//! Query handlers exposing a [`ModerationBackend`] to other clients.
//!
//! Each handler decodes its typed arguments, runs the backend on behalf
//! of the asking member and answers with the result. Malformed arguments
//! and refused reads are answered `ok:false`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::character::Character;
use crate::host::MemberId;
use crate::messaging::{Messaging, QueryHandler, QueryReply};

use super::backend::ModerationBackend;
use super::queries::*;
use super::types::{ConditionCategory, PermissionEdit};

/// Register a handler for every moderation query tag.
pub fn register_moderation_queries(messaging: &Messaging, backend: Arc<dyn ModerationBackend>) {
    serve(messaging, PERMISSIONS, &backend, |b, actor, ()| {
        Some(b.permissions(actor))
    });
    serve(messaging, PERMISSION_ACCESS, &backend, |b, actor, permission: String| {
        Some(b.permission_access(actor, &permission))
    });
    serve(messaging, MY_ACCESS_LEVEL, &backend, |b, actor, ()| {
        Some(b.access_level(actor))
    });
    serve(messaging, EDIT_PERMISSION, &backend, |b, actor, args: EditPermissionArgs| {
        let edit = PermissionEdit::new(args.edit, args.target).ok()?;
        Some(b.set_permission(actor, &args.permission, edit))
    });

    serve(messaging, ROLES_DATA, &backend, |b, actor, ()| b.roles(actor));
    serve(messaging, EDIT_ROLE, &backend, |b, actor, args: EditRoleArgs| {
        Some(b.edit_role(actor, args.role, args.action, args.target))
    });

    serve(messaging, LOG_DATA, &backend, |b, actor, ()| b.log_entries(actor));
    serve(messaging, LOG_DELETE, &backend, |b, actor, times: Vec<u64>| {
        Some(b.delete_log_entries(actor, &times))
    });
    serve(messaging, LOG_CONFIG_GET, &backend, |b, actor, ()| b.log_config(actor));
    serve(messaging, LOG_CONFIG_EDIT, &backend, |b, actor, args: LogConfigEditArgs| {
        Some(b.set_log_config(actor, &args.category, args.target))
    });
    serve(messaging, LOG_CLEAR, &backend, |b, actor, ()| Some(b.clear_log(actor)));
    serve(messaging, LOG_PRAISE, &backend, |b, actor, args: PraiseArgs| {
        Some(b.praise(actor, args.value, args.message.as_deref()))
    });
    serve(messaging, LOG_ALLOWED_ACTIONS, &backend, |b, actor, ()| {
        Some(b.log_allowed_actions(actor))
    });

    serve(messaging, CURSE_ITEM, &backend, |b, actor, args: CurseItemArgs| {
        Some(b.curse_item(actor, &args.group, args.curse_properties))
    });
    serve(messaging, CURSE_LIFT, &backend, |b, actor, group: String| {
        Some(b.curse_lift(actor, &group))
    });
    serve(messaging, CURSE_LIFT_ALL, &backend, |b, actor, ()| {
        Some(b.curse_lift_all(actor))
    });

    serve(messaging, CONDITIONS_GET, &backend, |b, actor, category: ConditionCategory| {
        b.conditions(actor, category)
    });
    serve(messaging, CONDITION_SET_LIMIT, &backend, |b, actor, args: ConditionLimitArgs| {
        Some(b.set_condition_limit(actor, args.category, &args.condition, args.limit))
    });
    serve(messaging, CONDITION_UPDATE, &backend, |b, actor, args: ConditionUpdateArgs| {
        Some(b.update_condition(actor, args.category, &args.condition, args.data))
    });

    serve(messaging, RULE_CREATE, &backend, |b, actor, rule: String| {
        Some(b.rule_create(actor, &rule))
    });
    serve(messaging, RULE_DELETE, &backend, |b, actor, rule: String| {
        Some(b.rule_delete(actor, &rule))
    });
}

fn serve<A, R, F>(messaging: &Messaging, tag: &str, backend: &Arc<dyn ModerationBackend>, call: F)
where
    A: DeserializeOwned + 'static,
    R: Serialize + 'static,
    F: Fn(&dyn ModerationBackend, MemberId, A) -> Option<R> + Send + Sync + 'static,
{
    let backend = backend.clone();
    let handler: QueryHandler = Arc::new(
        move |sender: Arc<Character>, reply: QueryReply, data: Value| {
            let args = match serde_json::from_value::<A>(data) {
                Ok(args) => args,
                Err(e) => {
                    warn!(
                        "[Moderation] invalid '{}' arguments from {}: {}",
                        reply.query(),
                        sender.id(),
                        e
                    );
                    reply.fail(Some(Value::String(e.to_string())));
                    return;
                }
            };
            match call(backend.as_ref(), sender.id(), args).map(serde_json::to_value) {
                Some(Ok(value)) => reply.ok(value),
                Some(Err(e)) => {
                    warn!("[Moderation] failed to encode '{}' result: {}", reply.query(), e);
                    reply.fail(None);
                }
                None => reply.fail(None),
            }
        },
    );
    messaging.register_query_handler(tag, handler);
}
