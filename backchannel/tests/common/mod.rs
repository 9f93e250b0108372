#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use backchannel::envelope::{
    unwrap_hidden, wrap_hidden, Envelope, QueryEnvelope, Unwrapped, TAG_QUERY, TAG_QUERY_ANSWER,
};
use backchannel::host::{ChatHost, HostEvent, HostOperation, LoopbackHost, LoopbackRoom};
use backchannel::{BackchannelClient, BackchannelConfig, MemberId, MemoryModeration};

pub const OWNER: MemberId = 1;
pub const SUBJECT: MemberId = 2;
pub const STRANGER: MemberId = 3;
pub const RAW_PEER: MemberId = 4;

pub struct Member {
    pub host: Arc<LoopbackHost>,
    pub backend: Arc<MemoryModeration>,
    pub client: BackchannelClient,
}

/// A client that has joined `room`, not yet started.
pub fn member(room: &LoopbackRoom, id: MemberId, name: &str) -> Member {
    let host = room.join(id, name);
    let backend = Arc::new(MemoryModeration::new(id));
    let client = BackchannelClient::new(
        host.clone(),
        backend.clone(),
        backend.clone(),
        BackchannelConfig::default(),
    )
    .expect("default config is valid");
    Member {
        host,
        backend,
        client,
    }
}

/// Owner and subject in one room, both started. The subject is owned.
pub fn owner_and_subject(room: &LoopbackRoom) -> (Member, Member) {
    let owner = member(room, OWNER, "Olive");
    let subject = member(room, SUBJECT, "Sam");
    subject.backend.add_owner(OWNER, "Olive");
    owner.client.start();
    subject.client.start();
    (owner, subject)
}

/// A bare host that answers every query addressed to it with `answer(tag)`,
/// bypassing the client library entirely.
pub fn raw_peer(
    room: &LoopbackRoom,
    id: MemberId,
    answer: impl Fn(&str) -> Value + Send + Sync + 'static,
) -> Arc<LoopbackHost> {
    let host = room.join(id, "Raw");
    let responder = host.clone();
    host.intercept(
        HostOperation::ChatRoomMessage,
        Arc::new(move |event: &HostEvent| {
            let HostEvent::Chat(chat) = event else {
                return;
            };
            let Unwrapped::Envelope(envelope) = unwrap_hidden(&chat.message) else {
                return;
            };
            if envelope.kind != TAG_QUERY {
                return;
            }
            let Ok(query) = serde_json::from_value::<QueryEnvelope>(envelope.message) else {
                return;
            };
            let reply = Envelope::new(
                TAG_QUERY_ANSWER,
                json!({ "id": query.id, "ok": true, "data": answer(&query.query) }),
            );
            responder.send_chat(wrap_hidden(&reply, Some(chat.sender)));
        }),
    );
    host
}
