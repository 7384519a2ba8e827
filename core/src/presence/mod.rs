//! Presence - where remote peers' cursors are
//!
//! Unlike operations, which must reach every replica, presence tracks
//! ephemeral state:
//! - Who's online
//! - Cursor positions and selections
//! - The color each peer is drawn with
//!
//! Key differences from document sync:
//! - No persistence (in-memory only)
//! - Peers silent for longer than [`DEFAULT_TIMEOUT`] are pruned by
//!   `EditorClient::remove_stale_peers` (native targets)
//! - Per-peer increasing clock instead of revisions
//! - Selections are moved through applied operations, never transformed
//!   on the server

mod clock;
mod state;

pub use clock::IncreasingClock;
pub use state::{PeerPresence, PeerState, Presence, PresenceChange, PresenceUpdate};

use std::time::Duration;

/// Default timeout for marking peers offline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fresh random client identifier
pub fn new_client_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
