//! Host collaborator: the chat session this protocol rides on.
//!
//! The host owns the real transports (room broadcast and direct beeps),
//! knows who is in the room, and lets us intercept its inbound traffic.
//! [`LoopbackRoom`] is an in-process host used by tests and the simulator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Platform-wide member number.
pub type MemberId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub id: MemberId,
    pub name: String,
}

/// A chat-room message as the host transmits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Host message type, e.g. `Chat`, `Emote` or `Hidden`.
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Content")]
    pub content: String,
    /// Restricts delivery to one member; `None` reaches the whole room.
    #[serde(rename = "Target", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<MemberId>,
    #[serde(rename = "Dictionary", default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundChat {
    /// Sender as asserted by the host transport.
    pub sender: MemberId,
    pub message: ChatMessage,
}

/// A direct, room-independent account beep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeepMessage {
    #[serde(rename = "MemberNumber")]
    pub target: MemberId,
    #[serde(rename = "BeepType")]
    pub beep_type: String,
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundBeep {
    pub sender: MemberId,
    pub beep: BeepMessage,
}

/// Host operations we can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    ChatRoomMessage,
    AccountBeep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Chat(InboundChat),
    Beep(InboundBeep),
}

pub type InboundHook = Arc<dyn Fn(&HostEvent) + Send + Sync>;

pub trait ChatHost: Send + Sync {
    fn player_id(&self) -> MemberId;
    fn player_name(&self) -> String;
    /// Members of the room the player is in, or `None` outside any room.
    fn room_members(&self) -> Option<Vec<RoomMember>>;
    fn send_chat(&self, message: ChatMessage);
    fn send_beep(&self, beep: BeepMessage);
    /// Run `hook` before the host processes `operation`.
    fn intercept(&self, operation: HostOperation, hook: InboundHook);
    fn release_intercepts(&self);
    /// Redraw the player after derived state changed.
    fn refresh_character(&self);
}

#[derive(Default)]
struct Endpoint {
    name: String,
    chat_hooks: Vec<InboundHook>,
    beep_hooks: Vec<InboundHook>,
    muted: bool,
    refreshes: u64,
    sent_chat: u64,
}

#[derive(Default)]
struct RoomState {
    /// Members present in the room, in join order.
    present: Vec<MemberId>,
    endpoints: HashMap<MemberId, Endpoint>,
}

/// One shared room plus the accounts connected to it.
#[derive(Clone, Default)]
pub struct LoopbackRoom {
    state: Arc<Mutex<RoomState>>,
}

impl LoopbackRoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect an account without entering the room.
    pub fn connect(&self, id: MemberId, name: &str) -> Arc<LoopbackHost> {
        let mut state = self.lock();
        state.endpoints.entry(id).or_default().name = name.to_string();
        Arc::new(LoopbackHost {
            id,
            state: self.state.clone(),
        })
    }

    /// Connect an account and enter the room.
    pub fn join(&self, id: MemberId, name: &str) -> Arc<LoopbackHost> {
        let host = self.connect(id, name);
        self.enter(id);
        host
    }

    pub fn enter(&self, id: MemberId) {
        let mut state = self.lock();
        if !state.present.contains(&id) {
            state.present.push(id);
        }
    }

    pub fn leave(&self, id: MemberId) {
        self.lock().present.retain(|m| *m != id);
    }

    /// Silently drop everything addressed to `id`.
    pub fn set_muted(&self, id: MemberId, muted: bool) {
        if let Some(endpoint) = self.lock().endpoints.get_mut(&id) {
            endpoint.muted = muted;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct LoopbackHost {
    id: MemberId,
    state: Arc<Mutex<RoomState>>,
}

impl LoopbackHost {
    fn lock(&self) -> std::sync::MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn refresh_count(&self) -> u64 {
        self.lock()
            .endpoints
            .get(&self.id)
            .map(|e| e.refreshes)
            .unwrap_or(0)
    }

    pub fn sent_chat_count(&self) -> u64 {
        self.lock()
            .endpoints
            .get(&self.id)
            .map(|e| e.sent_chat)
            .unwrap_or(0)
    }
}

impl ChatHost for LoopbackHost {
    fn player_id(&self) -> MemberId {
        self.id
    }

    fn player_name(&self) -> String {
        self.lock()
            .endpoints
            .get(&self.id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    fn room_members(&self) -> Option<Vec<RoomMember>> {
        let state = self.lock();
        if !state.present.contains(&self.id) {
            return None;
        }
        Some(
            state
                .present
                .iter()
                .map(|id| RoomMember {
                    id: *id,
                    name: state
                        .endpoints
                        .get(id)
                        .map(|e| e.name.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        )
    }

    fn send_chat(&self, message: ChatMessage) {
        let hooks: Vec<InboundHook> = {
            let mut state = self.lock();
            if let Some(endpoint) = state.endpoints.get_mut(&self.id) {
                endpoint.sent_chat += 1;
            }
            if !state.present.contains(&self.id) {
                return;
            }
            state
                .present
                .iter()
                .filter(|id| **id != self.id)
                .filter(|id| message.target.map_or(true, |t| t == **id))
                .filter_map(|id| state.endpoints.get(id))
                .filter(|e| !e.muted)
                .flat_map(|e| e.chat_hooks.iter().cloned())
                .collect()
        };
        let event = HostEvent::Chat(InboundChat {
            sender: self.id,
            message,
        });
        for hook in hooks {
            hook(&event);
        }
    }

    fn send_beep(&self, beep: BeepMessage) {
        let hooks: Vec<InboundHook> = {
            let state = self.lock();
            match state.endpoints.get(&beep.target) {
                Some(e) if !e.muted => e.beep_hooks.clone(),
                _ => Vec::new(),
            }
        };
        let event = HostEvent::Beep(InboundBeep {
            sender: self.id,
            beep,
        });
        for hook in hooks {
            hook(&event);
        }
    }

    fn intercept(&self, operation: HostOperation, hook: InboundHook) {
        let mut state = self.lock();
        let endpoint = state.endpoints.entry(self.id).or_default();
        match operation {
            HostOperation::ChatRoomMessage => endpoint.chat_hooks.push(hook),
            HostOperation::AccountBeep => endpoint.beep_hooks.push(hook),
        }
    }

    fn release_intercepts(&self) {
        if let Some(endpoint) = self.lock().endpoints.get_mut(&self.id) {
            endpoint.chat_hooks.clear();
            endpoint.beep_hooks.clear();
        }
    }

    fn refresh_character(&self) {
        if let Some(endpoint) = self.lock().endpoints.get_mut(&self.id) {
            endpoint.refreshes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_hook(counter: Arc<AtomicUsize>) -> InboundHook {
        Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn hidden(target: Option<MemberId>) -> ChatMessage {
        ChatMessage {
            kind: "Hidden".to_string(),
            content: "x".to_string(),
            target,
            dictionary: None,
        }
    }

    #[test]
    fn broadcast_skips_sender_and_respects_target() {
        let room = LoopbackRoom::new();
        let a = room.join(1, "A");
        let b = room.join(2, "B");
        let c = room.join(3, "C");
        let (na, nb, nc) = (
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        );
        a.intercept(HostOperation::ChatRoomMessage, counting_hook(na.clone()));
        b.intercept(HostOperation::ChatRoomMessage, counting_hook(nb.clone()));
        c.intercept(HostOperation::ChatRoomMessage, counting_hook(nc.clone()));

        a.send_chat(hidden(None));
        a.send_chat(hidden(Some(3)));

        assert_eq!(na.load(Ordering::SeqCst), 0);
        assert_eq!(nb.load(Ordering::SeqCst), 1);
        assert_eq!(nc.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn beeps_reach_connected_accounts_outside_the_room() {
        let room = LoopbackRoom::new();
        let a = room.connect(1, "A");
        let b = room.connect(2, "B");
        let count = Arc::new(AtomicUsize::new(0));
        b.intercept(HostOperation::AccountBeep, counting_hook(count.clone()));

        assert!(a.room_members().is_none());
        a.send_beep(BeepMessage {
            target: 2,
            beep_type: "Leash".to_string(),
            payload: None,
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn leaving_updates_membership() {
        let room = LoopbackRoom::new();
        let a = room.join(1, "A");
        room.join(2, "B");
        assert_eq!(a.room_members().map(|m| m.len()), Some(2));
        room.leave(2);
        let members = a.room_members().expect("in room");
        assert_eq!(members, vec![RoomMember { id: 1, name: "A".to_string() }]);
    }
}
