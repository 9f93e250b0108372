use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::envelope::{wrap_beep, wrap_hidden, BeepChannel, Envelope};
use crate::host::{ChatHost, MemberId};
use crate::lifecycle::Lifecycle;

/// Outbound half of the envelope codec.
pub struct HiddenChannel {
    host: Arc<dyn ChatHost>,
    lifecycle: Arc<Lifecycle>,
}

impl HiddenChannel {
    pub fn new(host: Arc<dyn ChatHost>, lifecycle: Arc<Lifecycle>) -> Self {
        Self { host, lifecycle }
    }

    pub fn host(&self) -> &Arc<dyn ChatHost> {
        &self.host
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn player_id(&self) -> MemberId {
        self.host.player_id()
    }

    /// Send through the room broadcast. `target = None` reaches every member.
    ///
    /// Silently does nothing before first-time initialization, after unload
    /// has begun or outside a room.
    pub fn send_hidden_message(&self, kind: &str, message: Value, target: Option<MemberId>) {
        if self.lifecycle.is_unloading() {
            debug!("[Messaging] dropping '{}' after unload", kind);
            return;
        }
        if !self.lifecycle.is_initialized() {
            debug!("[Messaging] dropping '{}' before initialization", kind);
            return;
        }
        if self.host.room_members().is_none() {
            debug!("[Messaging] dropping '{}' outside of a room", kind);
            return;
        }
        let envelope = Envelope::new(kind, message);
        self.host.send_chat(wrap_hidden(&envelope, target));
    }

    /// Send through the direct beep channel. No room is required.
    pub fn send_hidden_beep(
        &self,
        kind: &str,
        message: Value,
        target: MemberId,
        channel: BeepChannel,
    ) {
        if self.lifecycle.is_unloading() {
            debug!("[Messaging] dropping beep '{}' after unload", kind);
            return;
        }
        let envelope = Envelope::new(kind, message);
        self.host.send_beep(wrap_beep(&envelope, target, channel));
    }
}
