use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::warn;

use crate::character::Character;
use crate::host::MemberId;

use super::correlator::QueryReply;

/// Receives the sender and the envelope message of a hidden message.
pub type HiddenMessageHandler = Arc<dyn Fn(MemberId, Value) + Send + Sync>;
/// Receives the sender and the envelope message of a beep.
pub type BeepHandler = Arc<dyn Fn(MemberId, Value) + Send + Sync>;
/// Answers one query. The reply must be consumed exactly once.
pub type QueryHandler = Arc<dyn Fn(Arc<Character>, QueryReply, Value) + Send + Sync>;

/// One namespace of tag -> handler. At most one handler per tag.
pub struct HandlerTable<H: Clone> {
    namespace: &'static str,
    handlers: Mutex<HashMap<String, H>>,
}

impl<H: Clone> HandlerTable<H> {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true when an earlier handler for `tag` was replaced.
    pub fn register(&self, tag: &str, handler: H) -> bool {
        let replaced = self.lock().insert(tag.to_string(), handler).is_some();
        if replaced {
            warn!(
                "[Messaging] {} handler for '{}' replaced an existing one",
                self.namespace, tag
            );
        }
        replaced
    }

    pub fn get(&self, tag: &str) -> Option<H> {
        self.lock().get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lock().contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, H>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_registration_replaces_previous_handler() {
        let table: HandlerTable<&'static str> = HandlerTable::new("test");
        assert!(!table.register("ping", "first"));
        assert!(table.register("ping", "second"));
        assert_eq!(table.get("ping"), Some("second"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn namespaces_are_independent() {
        let hidden: HandlerTable<u8> = HandlerTable::new("hidden");
        let beep: HandlerTable<u8> = HandlerTable::new("beep");
        hidden.register("ping", 1);
        assert!(hidden.contains("ping"));
        assert!(!beep.contains("ping"));
    }
}
