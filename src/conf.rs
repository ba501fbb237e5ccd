//! This module defines types used to configure the engine and its parts.

use std::time::Duration;

use crate::PeerId;

/// The default client id announced to trackers and peers.
pub const CLIENT_ID: &PeerId = b"-ST0001-000000000000";

/// The fixed announce port put in the tracker query string. No listening
/// socket is actually opened on this port.
pub const ANNOUNCE_PORT: u16 = 6881;

/// The global configuration for the download engine.
///
/// Centralizes the tunables named throughout the design (block size,
/// pipelining backlog, per-piece deadline) instead of scattering them as
/// magic numbers across the piece worker and peer client.
#[derive(Clone, Debug)]
pub struct Conf {
    /// The 20-byte id this client announces to trackers and peers.
    pub client_id: PeerId,

    /// The port advertised to the tracker.
    pub port: u16,

    /// The largest block size we will ever request from a peer, in bytes.
    pub max_block_size: u32,

    /// The maximum number of outstanding block requests per connection.
    pub max_backlog: usize,

    /// The read deadline that spans an entire piece download on one
    /// connection.
    pub piece_deadline: Duration,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            client_id: *CLIENT_ID,
            port: ANNOUNCE_PORT,
            max_block_size: 16384,
            max_backlog: 5,
            piece_deadline: Duration::from_secs(30),
        }
    }
}
