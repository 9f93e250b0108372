mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use backchannel::host::LoopbackRoom;
use backchannel::moderation::types::{
    AccessLevel, ConditionCategory, ConditionLimit, PermissionAxis, PermissionValue, Praise, Role,
    RoleAction, RoleEntry,
};
use backchannel::ProtocolError;

use common::*;

#[tokio::test]
async fn test_player_proxy_calls_backend_directly() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);
    let sent_before = owner.host.sent_chat_count();

    let player = owner.client.player();
    assert!(player.is_player());
    assert_eq!(player.version(), Some(backchannel::PROTOCOL_VERSION));
    assert_eq!(
        player.get_my_access_level().await.expect("local"),
        AccessLevel::OwnSelf
    );
    assert!(player.curse_item("ItemHands", None).await.expect("local"));
    assert_eq!(owner.host.sent_chat_count(), sent_before);
}

#[tokio::test]
async fn test_remote_proxy_reads_roles_over_the_wire() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);

    let subject = owner.client.get_character(SUBJECT).expect("in room");
    assert!(!subject.is_player());
    assert_eq!(subject.name(), "Sam");

    let roles = subject.get_roles().await.expect("owner may view roles");
    assert_eq!(roles.owners, vec![RoleEntry(OWNER, "Olive".to_string())]);
    assert!(roles.allow_add_mistress);
    assert_eq!(
        subject.get_my_access_level().await.expect("answered"),
        AccessLevel::Owner
    );
}

#[tokio::test]
async fn test_remote_edits_apply_on_the_answering_side() {
    let room = LoopbackRoom::new();
    let (owner, subject) = owner_and_subject(&room);
    let proxy = owner.client.get_character(SUBJECT).expect("in room");

    assert!(proxy
        .edit_role(Role::Mistress, RoleAction::Add, 9)
        .await
        .expect("answered"));
    assert!(proxy.praise(Praise::Praise, Some("well done")).await.expect("answered"));
    assert!(proxy
        .set_condition_limit(ConditionCategory::Curses, "ItemNeck", ConditionLimit::Blocked)
        .await
        .expect("answered"));
    assert!(!proxy.curse_item("ItemNeck", Some(true)).await.expect("answered"));
    assert!(proxy.curse_item("ItemFeet", None).await.expect("answered"));

    let curses = proxy
        .get_conditions(ConditionCategory::Curses)
        .await
        .expect("answered");
    assert!(curses.conditions.contains_key("ItemFeet"));
    assert_eq!(curses.limits.get("ItemNeck"), Some(&ConditionLimit::Blocked));

    let log = subject.client.player().get_log_entries().await.expect("local");
    assert!(log.len() >= 3);
    let times: Vec<u64> = log.iter().map(|e| e.time).collect();
    assert!(proxy.delete_log_entries(&times[..1]).await.expect("answered"));
}

#[tokio::test]
async fn test_permission_edit_with_wrong_shape_is_refused_locally() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);
    let proxy = owner.client.get_character(SUBJECT).expect("in room");
    let sent_before = owner.host.sent_chat_count();

    let err = proxy
        .set_permission(
            "log_praise",
            PermissionAxis::SelfAccess,
            PermissionValue::Level(AccessLevel::Owner),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidArgument(_)));
    assert_eq!(owner.host.sent_chat_count(), sent_before);

    assert!(proxy
        .set_permission(
            "log_praise",
            PermissionAxis::MinLevel,
            PermissionValue::Level(AccessLevel::Whitelist),
        )
        .await
        .expect("answered"));
    let permissions = proxy.get_permissions().await.expect("answered");
    assert_eq!(permissions["log_praise"].min, AccessLevel::Whitelist);
}

#[tokio::test]
async fn test_refused_remote_read_is_rejected() {
    let room = LoopbackRoom::new();
    let (owner, subject) = owner_and_subject(&room);
    // A mistress has access but may not configure the log.
    let mistress = member(&room, 5, "Mira");
    subject.backend.add_mistress(5, "Mira");
    mistress.client.start();

    let proxy = mistress.client.get_character(SUBJECT).expect("in room");
    let err = proxy.get_log_config().await.unwrap_err();
    assert!(matches!(err, ProtocolError::Rejected { .. }));

    let allowed = proxy.get_log_allowed_actions().await.expect("answered");
    assert!(allowed.praise);
    assert!(!allowed.configure);

    // The owner still can.
    let proxy = owner.client.get_character(SUBJECT).expect("in room");
    assert!(proxy.get_log_config().await.is_ok());
}

#[tokio::test]
async fn test_malformed_arguments_are_answered_with_failure() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);

    let err = owner
        .client
        .send_query("editRole", json!({ "role": "queen", "action": "add", "target": 9 }), SUBJECT)
        .await
        .unwrap_err();
    match err {
        ProtocolError::Rejected { error, .. } => assert!(error.is_some()),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_registry_evicts_departed_members_on_next_lookup() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);
    let _stranger = member(&room, STRANGER, "Stan");

    assert!(owner.client.get_character(SUBJECT).is_some());
    assert_eq!(owner.client.characters().cached_count(), 1);

    room.leave(SUBJECT);
    assert!(owner.client.get_character(STRANGER).is_some());
    assert_eq!(owner.client.characters().cached_count(), 1);
    assert!(owner.client.get_character(SUBJECT).is_none());
    assert!(owner.client.get_character(42).is_none());
    assert!(matches!(
        owner.client.character(SUBJECT),
        Err(ProtocolError::UnknownCharacter(SUBJECT))
    ));
}

#[tokio::test]
async fn test_player_lookup_also_evicts_departed_members() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);
    assert!(owner.client.get_character(SUBJECT).is_some());
    assert_eq!(owner.client.characters().cached_count(), 1);

    room.leave(SUBJECT);
    assert!(owner.client.get_character(OWNER).expect("player").is_player());
    assert_eq!(owner.client.characters().cached_count(), 0);
}

#[tokio::test]
async fn test_same_member_gets_the_same_proxy() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);

    let first = owner.client.get_character(SUBJECT).expect("in room");
    let second = owner.client.get_character(SUBJECT).expect("in room");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(std::sync::Arc::ptr_eq(
        &owner.client.get_character(OWNER).expect("player"),
        &owner.client.player()
    ));
}

#[tokio::test]
async fn test_all_characters_in_room() {
    let room = LoopbackRoom::new();
    let (owner, _subject) = owner_and_subject(&room);

    let ids: Vec<_> = owner
        .client
        .all_characters_in_room()
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(ids, vec![OWNER, SUBJECT]);

    room.leave(OWNER);
    let alone = owner.client.all_characters_in_room();
    assert_eq!(alone.len(), 1);
    assert!(alone[0].is_player());
}
