//! Effect rebuild loop.
//!
//! Every tick recomputes the player's effects from the registered
//! contributors and only installs the result when it differs from what is
//! already applied. Contributors must be deterministic, otherwise every
//! tick looks like a change.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::character::CharacterRegistry;
use crate::host::ChatHost;
use crate::lifecycle::Lifecycle;
use crate::messaging::ChangeBus;

/// Ordered list of opaque effect markers. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    pub markers: Vec<String>,
}

impl Effects {
    pub fn push(&mut self, marker: impl Into<String>) {
        self.markers.push(marker.into());
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

pub type EffectContributor = Arc<dyn Fn(&mut Effects) + Send + Sync>;

pub struct EffectRebuilder {
    host: Arc<dyn ChatHost>,
    characters: Arc<CharacterRegistry>,
    changes: Arc<ChangeBus>,
    lifecycle: Arc<Lifecycle>,
    contributors: Mutex<Vec<EffectContributor>>,
}

impl EffectRebuilder {
    pub fn new(
        host: Arc<dyn ChatHost>,
        characters: Arc<CharacterRegistry>,
        changes: Arc<ChangeBus>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            host,
            characters,
            changes,
            lifecycle,
            contributors: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, contributor: EffectContributor) {
        self.lock().push(contributor);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Rebuild once. Returns whether the applied effects changed.
    pub fn tick(&self) -> bool {
        let contributors: Vec<EffectContributor> = self.lock().clone();
        let mut effects = Effects::default();
        for contributor in &contributors {
            contributor(&mut effects);
        }

        let player = self.characters.player();
        if player.effects() == effects {
            return false;
        }

        debug!("[Effects] applying {:?}", effects.markers);
        player.set_effects(effects);
        self.host.refresh_character();
        self.changes.notify_of_change();
        true
    }

    /// Tick every `period` until the client is unloaded.
    pub async fn run(self: Arc<Self>, period: Duration) {
        info!("[Effects] starting rebuild loop every {:?}", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.lifecycle.is_unloading() {
                info!("[Effects] rebuild loop stopped");
                return;
            }
            self.tick();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EffectContributor>> {
        self.contributors.lock().unwrap_or_else(|e| e.into_inner())
    }
}
