use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Giveaway, GiveawayError, GiveawayId};

#[derive(Default)]
struct Entries {
    giveaways: HashMap<GiveawayId, Giveaway>,
    /// Insertion order, oldest first.
    order: Vec<GiveawayId>,
}

/// In-memory owner of every giveaway.
///
/// All access goes through one lock, so a mutation always sees the latest
/// state of its entry and two mutations of the same giveaway never interleave.
#[derive(Default)]
pub struct GiveawayRegistry {
    entries: Mutex<Entries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub open: usize,
    pub closed: usize,
}

impl GiveawayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, giveaway: Giveaway) -> Result<(), GiveawayError> {
        let mut entries = self.entries.lock().await;
        let id = giveaway.id;
        if entries.giveaways.contains_key(&id) {
            return Err(GiveawayError::DuplicateId(id));
        }
        entries.giveaways.insert(id, giveaway);
        entries.order.push(id);
        debug!("Registered giveaway {}", id);
        Ok(())
    }

    /// Snapshot of a giveaway. The copy is not kept in sync with the registry.
    pub async fn get(&self, id: GiveawayId) -> Option<Giveaway> {
        self.entries.lock().await.giveaways.get(&id).cloned()
    }

    pub async fn contains(&self, id: GiveawayId) -> bool {
        self.entries.lock().await.giveaways.contains_key(&id)
    }

    /// Run `f` against a single giveaway while holding the registry lock.
    pub async fn mutate<T, F>(&self, id: GiveawayId, f: F) -> Result<T, GiveawayError>
    where
        F: FnOnce(&mut Giveaway) -> T,
    {
        let mut entries = self.entries.lock().await;
        let giveaway = entries
            .giveaways
            .get_mut(&id)
            .ok_or(GiveawayError::NotFound(id))?;
        Ok(f(giveaway))
    }

    /// The most recently created giveaway in `chat_id` that is still open.
    pub async fn latest_open_in_chat(&self, chat_id: i64) -> Option<GiveawayId> {
        let entries = self.entries.lock().await;
        entries
            .order
            .iter()
            .rev()
            .filter(|id| id.chat_id == chat_id)
            .find(|id| entries.giveaways.get(*id).is_some_and(Giveaway::is_open))
            .copied()
    }

    pub async fn stats(&self) -> RegistryStats {
        let entries = self.entries.lock().await;
        let open = entries.giveaways.values().filter(|g| g.is_open()).count();
        RegistryStats {
            open,
            closed: entries.giveaways.len() - open,
        }
    }

    /// Drop closed giveaways that closed before `cutoff`. Returns how many went.
    pub async fn prune_closed_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.giveaways.len();
        entries
            .giveaways
            .retain(|_, g| g.closed_at.map_or(true, |closed| closed >= cutoff));
        let Entries { giveaways, order } = &mut *entries;
        order.retain(|id| giveaways.contains_key(id));
        before - giveaways.len()
    }
}
