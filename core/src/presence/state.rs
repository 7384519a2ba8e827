//! Presence state management
//!
//! Tracks where every connected peer's cursor is. Selections are kept in
//! the coordinates of the local document and moved through every
//! operation applied locally.

use super::clock::IncreasingClock;
use crate::ot::{Operation, Selection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Time tracking only available on non-WASM targets
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// What a peer shares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerPresence {
    /// Six-digit hex color its cursor is drawn with
    pub color: String,
    pub selection: Selection,
}

/// Presence of a single peer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerState {
    pub client_id: String,

    pub presence: PeerPresence,

    /// Logical clock of the update that produced this state
    pub clock: u64,

    /// Last update timestamp (for timeout detection)
    /// Not available in WASM builds
    #[cfg(not(target_arch = "wasm32"))]
    #[serde(skip)]
    pub last_updated: Option<Instant>,
}

/// Presence change to broadcast or apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    pub client_id: String,
    /// `None` = peer left
    pub presence: Option<PeerPresence>,
    pub clock: u64,
}

/// What applying a [`PresenceUpdate`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    /// The peer's selection should be (re)drawn
    Updated(PeerState),
    /// The peer left; its rendering should be disposed
    Left(String),
    /// Stale or self-addressed update; nothing changed
    Ignored,
}

impl PartialEq for PeerState {
    fn eq(&self, other: &Self) -> bool {
        // transient timestamps are not part of the state
        self.client_id == other.client_id
            && self.presence == other.presence
            && self.clock == other.clock
    }
}

impl Eq for PeerState {}

/// Presence of all remote peers plus the local client's clock
#[derive(Debug)]
pub struct Presence {
    client_id: String,
    peers: HashMap<String, PeerState>,
    clock: IncreasingClock,
}

impl Presence {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            peers: HashMap::new(),
            clock: IncreasingClock::new(),
        }
    }

    /// Get the local client ID
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn peers(&self) -> &HashMap<String, PeerState> {
        &self.peers
    }

    pub fn peer(&self, client_id: &str) -> Option<&PeerState> {
        self.peers.get(client_id)
    }

    /// Stamp the local selection (returns update to broadcast)
    pub fn local_update(&mut self, selection: Selection, color: &str) -> PresenceUpdate {
        PresenceUpdate {
            client_id: self.client_id.clone(),
            presence: Some(PeerPresence {
                color: color.to_string(),
                selection,
            }),
            clock: self.clock.increment(),
        }
    }

    /// Create update to signal the local client leaving
    pub fn leave_update(&mut self) -> PresenceUpdate {
        PresenceUpdate {
            client_id: self.client_id.clone(),
            presence: None,
            clock: self.clock.increment(),
        }
    }

    /// Apply a peer's update; updates older than what is known are dropped
    pub fn apply_update(&mut self, update: PresenceUpdate) -> PresenceChange {
        self.clock.update_to_max(update.clock);

        if update.client_id == self.client_id {
            return PresenceChange::Ignored;
        }
        if let Some(existing) = self.peers.get(&update.client_id) {
            if update.clock <= existing.clock {
                log::warn!(
                    "stale presence update from {} (clock {} <= {})",
                    update.client_id,
                    update.clock,
                    existing.clock
                );
                return PresenceChange::Ignored;
            }
        }

        match update.presence {
            Some(presence) => {
                let state = PeerState {
                    client_id: update.client_id.clone(),
                    presence,
                    clock: update.clock,
                    #[cfg(not(target_arch = "wasm32"))]
                    last_updated: Some(Instant::now()),
                };
                self.peers.insert(update.client_id, state.clone());
                PresenceChange::Updated(state)
            }
            None => match self.peers.remove(&update.client_id) {
                Some(_) => PresenceChange::Left(update.client_id),
                None => PresenceChange::Ignored,
            },
        }
    }

    /// Move every peer selection through an operation applied locally.
    /// Returns the peers whose selection moved.
    pub fn transform(&mut self, operation: &Operation) -> Vec<String> {
        let mut moved = Vec::new();
        for state in self.peers.values_mut() {
            let selection = state.presence.selection.transform(operation);
            if selection != state.presence.selection {
                state.presence.selection = selection;
                moved.push(state.client_id.clone());
            }
        }
        moved
    }

    /// Forget every peer (after a resync)
    pub fn clear(&mut self) -> Vec<String> {
        self.peers.drain().map(|(client_id, _)| client_id).collect()
    }

    /// Remove peers that haven't updated within timeout
    /// Returns list of removed client IDs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn remove_stale_peers(&mut self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut removed = Vec::new();

        self.peers.retain(|client_id, state| {
            if let Some(last_updated) = state.last_updated {
                if now.duration_since(last_updated) > timeout {
                    removed.push(client_id.clone());
                    return false;
                }
            }
            true
        });

        removed
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
