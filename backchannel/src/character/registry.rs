use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::host::{ChatHost, MemberId, RoomMember};
use crate::messaging::Correlator;
use crate::moderation::ModerationBackend;

use super::Character;

/// Cache of character proxies, one per member.
///
/// The player's proxy lives for the whole client. Proxies of members who
/// left the room are evicted on the next lookup of any member, the player
/// included; there is no sweep timer.
pub struct CharacterRegistry {
    host: Arc<dyn ChatHost>,
    correlator: Arc<Correlator>,
    player: Arc<Character>,
    others: Mutex<HashMap<MemberId, Arc<Character>>>,
}

impl CharacterRegistry {
    pub fn new(
        host: Arc<dyn ChatHost>,
        correlator: Arc<Correlator>,
        backend: Arc<dyn ModerationBackend>,
        version: &str,
    ) -> Self {
        let player = Arc::new(Character::local(
            host.player_id(),
            host.player_name(),
            version.to_string(),
            backend,
        ));
        Self {
            host,
            correlator,
            player,
            others: Mutex::new(HashMap::new()),
        }
    }

    pub fn player(&self) -> Arc<Character> {
        self.player.clone()
    }

    /// Proxy for `id`, or `None` when `id` is neither the player nor a
    /// member of the current room.
    pub fn get(&self, id: MemberId) -> Option<Arc<Character>> {
        let members = self.host.room_members();
        let mut others = self.lock();
        evict_departed(&mut others, members.as_deref());

        if id == self.player.id() {
            return Some(self.player.clone());
        }

        if let Some(existing) = others.get(&id) {
            return Some(existing.clone());
        }

        let member = members?.into_iter().find(|m| m.id == id)?;
        let character = Arc::new(Character::remote(
            member.id,
            member.name,
            self.correlator.clone(),
        ));
        others.insert(id, character.clone());
        Some(character)
    }

    /// Every member of the current room, or just the player outside one.
    pub fn all_in_room(&self) -> Vec<Arc<Character>> {
        match self.host.room_members() {
            None => vec![self.player()],
            Some(members) => members.iter().filter_map(|m| self.get(m.id)).collect(),
        }
    }

    /// Number of cached non-player proxies.
    pub fn cached_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MemberId, Arc<Character>>> {
        self.others.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn evict_departed(cache: &mut HashMap<MemberId, Arc<Character>>, members: Option<&[RoomMember]>) {
    let before = cache.len();
    cache.retain(|id, _| members.map_or(false, |m| m.iter().any(|member| member.id == *id)));
    let evicted = before - cache.len();
    if evicted > 0 {
        debug!("[Characters] evicted {} departed characters", evicted);
    }
}
