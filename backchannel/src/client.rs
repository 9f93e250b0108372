//! Client facade: wires the protocol components onto one host session and
//! drives them through their lifecycle.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::character::{Character, CharacterRegistry};
use crate::config::BackchannelConfig;
use crate::effects::{EffectContributor, EffectRebuilder};
use crate::envelope::BeepChannel;
use crate::error::{ProtocolError, ProtocolResult};
use crate::host::{ChatHost, HostEvent, HostOperation, InboundHook, MemberId};
use crate::lifecycle::{Lifecycle, ModulePhase};
use crate::messaging::{
    BeepHandler, ChangeBus, ChangeSubscriber, Correlator, HiddenChannel, HiddenMessageHandler,
    Messaging, QueryHandler,
};
use crate::moderation::{register_moderation_queries, AccessCheck, ModerationBackend};

/// Protocol version reported by the local player's proxy.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct BackchannelClient {
    config: BackchannelConfig,
    host: Arc<dyn ChatHost>,
    lifecycle: Arc<Lifecycle>,
    messaging: Arc<Messaging>,
    effects: Arc<EffectRebuilder>,
    effect_loop: Mutex<Option<JoinHandle<()>>>,
}

impl BackchannelClient {
    /// Build a client for `host`. The moderation query handlers are
    /// registered here; nothing is intercepted until [`start`](Self::start).
    pub fn new(
        host: Arc<dyn ChatHost>,
        backend: Arc<dyn ModerationBackend>,
        access: Arc<dyn AccessCheck>,
        config: BackchannelConfig,
    ) -> ProtocolResult<Self> {
        config.validate()?;

        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.set_phase(ModulePhase::Init);

        let channel = Arc::new(HiddenChannel::new(host.clone(), lifecycle.clone()));
        let correlator = Arc::new(Correlator::new(
            channel.clone(),
            config.query_timeout(),
            config.verify_answer_origin,
        ));
        let characters = Arc::new(CharacterRegistry::new(
            host.clone(),
            correlator.clone(),
            backend.clone(),
            PROTOCOL_VERSION,
        ));
        let changes = Arc::new(ChangeBus::new(channel.clone()));
        let messaging = Arc::new(Messaging::new(
            channel,
            correlator,
            characters.clone(),
            changes.clone(),
            access,
            config.duplicate_query_window,
        ));
        let effects = Arc::new(EffectRebuilder::new(
            host.clone(),
            characters,
            changes,
            lifecycle.clone(),
        ));

        lifecycle.set_phase(ModulePhase::Load);
        register_moderation_queries(&messaging, backend);

        Ok(Self {
            config,
            host,
            lifecycle,
            messaging,
            effects,
            effect_loop: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &BackchannelConfig {
        &self.config
    }

    pub fn phase(&self) -> ModulePhase {
        self.lifecycle.phase()
    }

    pub fn player_id(&self) -> MemberId {
        self.host.player_id()
    }

    /// Install the host intercepts and enter the ready phase.
    pub fn start(&self) {
        if self.lifecycle.phase() != ModulePhase::Load {
            warn!(
                "[Backchannel] start called in phase {:?}, ignored",
                self.lifecycle.phase()
            );
            return;
        }
        self.lifecycle.set_phase(ModulePhase::Start);

        let hook = inbound_hook(Arc::downgrade(&self.messaging));
        self.host
            .intercept(HostOperation::ChatRoomMessage, hook.clone());
        self.host.intercept(HostOperation::AccountBeep, hook);

        self.lifecycle.set_phase(ModulePhase::Ready);
        info!(
            "[Backchannel] client {} ready (protocol {})",
            self.host.player_id(),
            PROTOCOL_VERSION
        );
    }

    /// Spawn the effect rebuild loop on the current tokio runtime.
    pub fn spawn_effect_loop(&self) {
        let mut slot = self.effect_loop.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            warn!("[Backchannel] effect loop already running");
            return;
        }
        let period = self.config.effect_rebuild_interval();
        *slot = Some(tokio::spawn(self.effects.clone().run(period)));
    }

    /// Run one rebuild outside of the loop. Returns whether effects changed.
    pub fn rebuild_effects(&self) -> bool {
        self.effects.tick()
    }

    /// Tear everything down. Pending queries fail with `Unloaded`.
    pub fn unload(&self) {
        if self.lifecycle.is_unloading() {
            return;
        }
        self.lifecycle.set_phase(ModulePhase::Destroy);

        if let Some(handle) = self
            .effect_loop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
        self.messaging.correlator().reject_all();
        self.messaging.clear();
        self.messaging.changes().clear();
        self.messaging.characters().clear();
        self.effects.clear();
        self.host.release_intercepts();

        self.lifecycle.set_phase(ModulePhase::Destroyed);
        info!("[Backchannel] client {} unloaded", self.host.player_id());
    }

    pub async fn send_query(&self, query: &str, data: Value, target: MemberId) -> ProtocolResult<Value> {
        self.messaging.correlator().send_query(query, data, target).await
    }

    pub async fn send_query_with_timeout(
        &self,
        query: &str,
        data: Value,
        target: MemberId,
        timeout: Duration,
    ) -> ProtocolResult<Value> {
        self.messaging
            .correlator()
            .send_query_with_timeout(query, data, target, timeout)
            .await
    }

    pub fn pending_queries(&self) -> usize {
        self.messaging.correlator().pending_count()
    }

    pub fn send_hidden_message(&self, kind: &str, message: Value, target: Option<MemberId>) {
        self.messaging
            .channel()
            .send_hidden_message(kind, message, target);
    }

    pub fn send_hidden_beep(
        &self,
        kind: &str,
        message: Value,
        target: MemberId,
        channel: BeepChannel,
    ) {
        self.messaging
            .channel()
            .send_hidden_beep(kind, message, target, channel);
    }

    pub fn notify_of_change(&self) {
        self.messaging.changes().notify_of_change();
    }

    pub fn player(&self) -> Arc<Character> {
        self.messaging.characters().player()
    }

    pub fn get_character(&self, id: MemberId) -> Option<Arc<Character>> {
        self.messaging.characters().get(id)
    }

    /// Like [`get_character`](Self::get_character), for callers that need
    /// an error to propagate.
    pub fn character(&self, id: MemberId) -> ProtocolResult<Arc<Character>> {
        self.get_character(id)
            .ok_or(ProtocolError::UnknownCharacter(id))
    }

    pub fn all_characters_in_room(&self) -> Vec<Arc<Character>> {
        self.messaging.characters().all_in_room()
    }

    pub fn characters(&self) -> &Arc<CharacterRegistry> {
        self.messaging.characters()
    }

    pub fn register_query_handler(&self, tag: &str, handler: QueryHandler) {
        self.messaging.register_query_handler(tag, handler);
    }

    pub fn register_hidden_message_handler(&self, tag: &str, handler: HiddenMessageHandler) {
        self.messaging.register_hidden_message_handler(tag, handler);
    }

    pub fn register_hidden_beep_handler(&self, tag: &str, handler: BeepHandler) {
        self.messaging.register_hidden_beep_handler(tag, handler);
    }

    pub fn register_change_subscriber(&self, subscriber: ChangeSubscriber) {
        self.messaging.changes().subscribe(subscriber);
    }

    pub fn register_effect_contributor(&self, contributor: EffectContributor) {
        self.effects.register(contributor);
    }
}

impl Drop for BackchannelClient {
    fn drop(&mut self) {
        self.unload();
    }
}

fn inbound_hook(messaging: Weak<Messaging>) -> InboundHook {
    Arc::new(move |event: &HostEvent| {
        if let Some(messaging) = messaging.upgrade() {
            messaging.handle_host_event(event);
        }
    })
}
