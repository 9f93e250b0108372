use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::envelope::TAG_CHANGED;
use crate::host::MemberId;

use super::channel::HiddenChannel;

/// Called with the member whose state changed. Subscribers re-query
/// whatever they care about; no payload travels with the signal.
pub type ChangeSubscriber = Arc<dyn Fn(MemberId) + Send + Sync>;

pub struct ChangeBus {
    channel: Arc<HiddenChannel>,
    subscribers: Mutex<Vec<ChangeSubscriber>>,
}

impl ChangeBus {
    pub fn new(channel: Arc<HiddenChannel>) -> Self {
        Self {
            channel,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, subscriber: ChangeSubscriber) {
        self.lock().push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Tell the room our state changed, then tell ourselves: the sender
    /// never receives its own broadcast.
    pub fn notify_of_change(&self) {
        if !self.channel.lifecycle().is_ready() {
            debug!("[ChangeBus] not ready, change notification skipped");
            return;
        }
        self.channel
            .send_hidden_message(TAG_CHANGED, Value::Null, None);
        self.dispatch(self.channel.player_id());
    }

    /// Invoke every subscriber with `origin`.
    pub fn dispatch(&self, origin: MemberId) {
        let subscribers: Vec<ChangeSubscriber> = self.lock().clone();
        for subscriber in subscribers {
            subscriber(origin);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChangeSubscriber>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
