mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use backchannel::host::LoopbackRoom;
use backchannel::messaging::ChangeSubscriber;
use backchannel::{Effects, MemberId};

use common::*;

fn recorder() -> (Arc<Mutex<Vec<MemberId>>>, ChangeSubscriber) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscriber: ChangeSubscriber =
        Arc::new(move |origin: MemberId| sink.lock().unwrap().push(origin));
    (seen, subscriber)
}

#[tokio::test]
async fn test_notify_reaches_local_and_remote_subscribers() {
    let room = LoopbackRoom::new();
    let owner = member(&room, OWNER, "Olive");
    let subject = member(&room, SUBJECT, "Sam");
    let (owner_seen, owner_subscriber) = recorder();
    let (subject_seen, subject_subscriber) = recorder();
    owner.client.register_change_subscriber(owner_subscriber);
    subject.client.register_change_subscriber(subject_subscriber);
    owner.client.start();
    subject.client.start();

    subject.client.notify_of_change();

    assert_eq!(*subject_seen.lock().unwrap(), vec![SUBJECT]);
    assert_eq!(*owner_seen.lock().unwrap(), vec![SUBJECT]);
}

#[tokio::test]
async fn test_notify_before_ready_does_nothing() {
    let room = LoopbackRoom::new();
    let subject = member(&room, SUBJECT, "Sam");
    let (seen, subscriber) = recorder();
    subject.client.register_change_subscriber(subscriber);

    subject.client.notify_of_change();

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(subject.host.sent_chat_count(), 0);
}

#[tokio::test]
async fn test_unchanged_effects_do_not_refresh() {
    let room = LoopbackRoom::new();
    let (owner, subject) = owner_and_subject(&room);
    let (owner_seen, owner_subscriber) = recorder();
    owner.client.register_change_subscriber(owner_subscriber);
    subject
        .client
        .register_effect_contributor(Arc::new(|effects: &mut Effects| effects.push("blindfold")));

    assert!(subject.client.rebuild_effects());
    assert!(!subject.client.rebuild_effects());

    assert_eq!(subject.host.refresh_count(), 1);
    assert_eq!(
        subject.client.player().effects().markers,
        vec!["blindfold".to_string()]
    );
    assert_eq!(*owner_seen.lock().unwrap(), vec![SUBJECT]);
}

#[tokio::test]
async fn test_new_contributor_output_refreshes_once() {
    let room = LoopbackRoom::new();
    let (_owner, subject) = owner_and_subject(&room);
    let gagged = Arc::new(AtomicBool::new(false));
    let flag = gagged.clone();
    subject
        .client
        .register_effect_contributor(Arc::new(move |effects: &mut Effects| {
            if flag.load(Ordering::SeqCst) {
                effects.push("gag");
            }
        }));

    // Empty effects equal the initial record.
    assert!(!subject.client.rebuild_effects());
    assert_eq!(subject.host.refresh_count(), 0);

    gagged.store(true, Ordering::SeqCst);
    assert!(subject.client.rebuild_effects());
    assert!(!subject.client.rebuild_effects());
    assert_eq!(subject.host.refresh_count(), 1);
    assert!(subject.client.player().effects().contains("gag"));
}

#[tokio::test]
async fn test_effect_order_is_significant() {
    let room = LoopbackRoom::new();
    let (_owner, subject) = owner_and_subject(&room);
    let swapped = Arc::new(AtomicBool::new(false));
    let flag = swapped.clone();
    subject
        .client
        .register_effect_contributor(Arc::new(move |effects: &mut Effects| {
            let (a, b) = if flag.load(Ordering::SeqCst) {
                ("b", "a")
            } else {
                ("a", "b")
            };
            effects.push(a);
            effects.push(b);
        }));

    assert!(subject.client.rebuild_effects());
    swapped.store(true, Ordering::SeqCst);
    assert!(subject.client.rebuild_effects());
    assert_eq!(subject.host.refresh_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_effect_loop_ticks_until_unload() {
    let room = LoopbackRoom::new();
    let (_owner, subject) = owner_and_subject(&room);
    let enabled = Arc::new(AtomicBool::new(true));
    let flag = enabled.clone();
    subject
        .client
        .register_effect_contributor(Arc::new(move |effects: &mut Effects| {
            if flag.load(Ordering::SeqCst) {
                effects.push("leash");
            }
        }));

    subject.client.spawn_effect_loop();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(subject.host.refresh_count(), 1);

    enabled.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(subject.host.refresh_count(), 2);

    subject.client.unload();
    enabled.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(subject.host.refresh_count(), 2);
}
