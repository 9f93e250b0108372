//! Inbound dispatch and the hidden-message protocol built on top of it.
//!
//! Traffic arrives through host intercepts, is unwrapped by the envelope
//! codec and routed by tag: queries and answers go through the correlator,
//! change signals to the change bus, everything else to the registered
//! handler tables. Nothing a peer sends can make this module fail; bad
//! input is logged and dropped, or answered with a rejection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::character::CharacterRegistry;
use crate::envelope::{
    unwrap_beep, unwrap_hidden, Envelope, QueryEnvelope, Unwrapped, TAG_CHANGED, TAG_QUERY,
    TAG_QUERY_ANSWER,
};
use crate::host::{HostEvent, InboundBeep, InboundChat, MemberId};
use crate::moderation::AccessCheck;

pub mod changes;
pub mod channel;
pub mod correlator;
pub mod handlers;

pub use changes::{ChangeBus, ChangeSubscriber};
pub use channel::HiddenChannel;
pub use correlator::{Correlator, QueryReply};
pub use handlers::{BeepHandler, HandlerTable, HiddenMessageHandler, QueryHandler};

pub struct Messaging {
    channel: Arc<HiddenChannel>,
    correlator: Arc<Correlator>,
    characters: Arc<CharacterRegistry>,
    changes: Arc<ChangeBus>,
    access: Arc<dyn AccessCheck>,
    hidden_handlers: HandlerTable<HiddenMessageHandler>,
    beep_handlers: HandlerTable<BeepHandler>,
    query_handlers: HandlerTable<QueryHandler>,
    recent_queries: Mutex<VecDeque<(MemberId, String)>>,
    duplicate_window: usize,
}

impl Messaging {
    pub fn new(
        channel: Arc<HiddenChannel>,
        correlator: Arc<Correlator>,
        characters: Arc<CharacterRegistry>,
        changes: Arc<ChangeBus>,
        access: Arc<dyn AccessCheck>,
        duplicate_window: usize,
    ) -> Self {
        Self {
            channel,
            correlator,
            characters,
            changes,
            access,
            hidden_handlers: HandlerTable::new("hidden message"),
            beep_handlers: HandlerTable::new("beep"),
            query_handlers: HandlerTable::new("query"),
            recent_queries: Mutex::new(VecDeque::new()),
            duplicate_window,
        }
    }

    pub fn channel(&self) -> &Arc<HiddenChannel> {
        &self.channel
    }

    pub fn correlator(&self) -> &Arc<Correlator> {
        &self.correlator
    }

    pub fn characters(&self) -> &Arc<CharacterRegistry> {
        &self.characters
    }

    pub fn changes(&self) -> &Arc<ChangeBus> {
        &self.changes
    }

    pub fn register_hidden_message_handler(&self, tag: &str, handler: HiddenMessageHandler) {
        self.warn_late_registration("hidden message", tag);
        self.hidden_handlers.register(tag, handler);
    }

    pub fn register_hidden_beep_handler(&self, tag: &str, handler: BeepHandler) {
        self.warn_late_registration("beep", tag);
        self.beep_handlers.register(tag, handler);
    }

    pub fn register_query_handler(&self, tag: &str, handler: QueryHandler) {
        self.warn_late_registration("query", tag);
        self.query_handlers.register(tag, handler);
    }

    pub fn has_query_handler(&self, tag: &str) -> bool {
        self.query_handlers.contains(tag)
    }

    /// Drop every handler and forget recently seen queries.
    pub fn clear(&self) {
        self.hidden_handlers.clear();
        self.beep_handlers.clear();
        self.query_handlers.clear();
        self.lock_recent().clear();
    }

    /// Entry point for host intercepts.
    pub fn handle_host_event(&self, event: &HostEvent) {
        match event {
            HostEvent::Chat(chat) => self.handle_chat(chat),
            HostEvent::Beep(beep) => self.handle_beep(beep),
        }
    }

    pub fn handle_chat(&self, chat: &InboundChat) {
        let envelope = match unwrap_hidden(&chat.message) {
            Unwrapped::Foreign => return,
            Unwrapped::Malformed(reason) => {
                warn!(
                    "[Messaging] malformed hidden message from {}: {}",
                    chat.sender, reason
                );
                return;
            }
            Unwrapped::Envelope(envelope) => envelope,
        };
        if !self.accepts_inbound(chat.sender, &envelope) {
            return;
        }
        let player = self.channel.player_id();
        if chat.message.target.map_or(false, |target| target != player) {
            debug!(
                "[Messaging] '{}' from {} is addressed to someone else",
                envelope.kind, chat.sender
            );
            return;
        }
        self.dispatch_hidden(chat.sender, envelope);
    }

    pub fn handle_beep(&self, beep: &InboundBeep) {
        let envelope = match unwrap_beep(&beep.beep) {
            Unwrapped::Foreign => return,
            Unwrapped::Malformed(reason) => {
                warn!("[Messaging] malformed beep from {}: {}", beep.sender, reason);
                return;
            }
            Unwrapped::Envelope(envelope) => envelope,
        };
        if !self.accepts_inbound(beep.sender, &envelope) {
            return;
        }
        match self.beep_handlers.get(&envelope.kind) {
            Some(handler) => handler(beep.sender, envelope.message),
            None => warn!(
                "[Messaging] no beep handler for '{}' from {}",
                envelope.kind, beep.sender
            ),
        }
    }

    fn accepts_inbound(&self, sender: MemberId, envelope: &Envelope) -> bool {
        if sender == self.channel.player_id() {
            return false;
        }
        if !self.channel.lifecycle().is_initialized() {
            debug!(
                "[Messaging] '{}' from {} arrived before initialization",
                envelope.kind, sender
            );
            return false;
        }
        true
    }

    fn dispatch_hidden(&self, sender: MemberId, envelope: Envelope) {
        match envelope.kind.as_str() {
            TAG_QUERY => self.handle_query(sender, envelope.message),
            TAG_QUERY_ANSWER => self.correlator.handle_answer(sender, envelope.message),
            TAG_CHANGED => self.changes.dispatch(sender),
            tag => match self.hidden_handlers.get(tag) {
                Some(handler) => handler(sender, envelope.message),
                None => warn!(
                    "[Messaging] no hidden message handler for '{}' from {}",
                    tag, sender
                ),
            },
        }
    }

    /// Answer side of a query. Every path that knows the correlation id
    /// replies, so a refused peer learns it immediately.
    fn handle_query(&self, sender: MemberId, message: Value) {
        let query: QueryEnvelope = match serde_json::from_value(message) {
            Ok(query) => query,
            Err(e) => {
                warn!("[Messaging] malformed query from {}: {}", sender, e);
                return;
            }
        };
        if !self.remember_query(sender, &query.id) {
            debug!(
                "[Messaging] duplicate query {} from {} dropped",
                query.id, sender
            );
            return;
        }

        let reply = QueryReply::new(
            query.id.clone(),
            query.query.clone(),
            sender,
            self.channel.clone(),
        );

        let Some(character) = self.characters.get(sender) else {
            warn!(
                "[Messaging] query '{}' from {} who is not in the room",
                query.query, sender
            );
            reply.fail(None);
            return;
        };
        if !self.access.has_access(sender) {
            info!(
                "[Messaging] query '{}' from {} rejected: no access",
                query.query, sender
            );
            reply.fail(None);
            return;
        }
        let Some(handler) = self.query_handlers.get(&query.query) else {
            warn!(
                "[Messaging] no query handler for '{}' from {}",
                query.query, sender
            );
            reply.fail(None);
            return;
        };
        handler(character, reply, query.data);
    }

    /// Returns false when this `(sender, id)` was seen recently.
    fn remember_query(&self, sender: MemberId, id: &str) -> bool {
        if self.duplicate_window == 0 {
            return true;
        }
        let mut recent = self.lock_recent();
        if recent.iter().any(|(s, seen)| *s == sender && seen == id) {
            return false;
        }
        if recent.len() >= self.duplicate_window {
            recent.pop_front();
        }
        recent.push_back((sender, id.to_string()));
        true
    }

    fn warn_late_registration(&self, namespace: &str, tag: &str) {
        if !self.channel.lifecycle().accepts_registration() {
            warn!(
                "[Messaging] {} handler '{}' registered after load",
                namespace, tag
            );
        }
    }

    fn lock_recent(&self) -> std::sync::MutexGuard<'_, VecDeque<(MemberId, String)>> {
        self.recent_queries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
