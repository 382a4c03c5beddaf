//! Network layer for Freebooter.
//!
//! The network layer owns exactly one background thread. That thread runs
//! its own Tokio runtime and does all of the socket work: accepting TCP
//! connections, upgrading them to WebSocket, reading frames and writing
//! frames. It never touches game state.
//!
//! The simulation thread only ever sees two things:
//!
//! - [`NetworkEvent`]s (a connection appeared, a connection went away),
//!   delivered through the callback installed with [`NetworkService::new`].
//! - [`Connection`] values, which carry an outbound sender and an inbound
//!   receiver. Both sides are non-blocking, so the main loop never waits
//!   on a socket.
//!
//! ```text
//! I/O thread (tokio)                    main thread
//! ──────────────────                    ───────────
//! accept ─┬─ NetworkEvent::Connected ─→ callback queue ─→ registry
//!         │
//! reader ─┼─ frames ──────────────────→ Connection::try_recv
//! writer ←┼─ frames ←───────────────── ConnectionSender::send
//!         │
//! close  ─┴─ NetworkEvent::Lost ──────→ callback queue ─→ registry
//! ```

mod connection;
mod error;
mod service;

pub use connection::{Connection, ConnectionSender, LoopbackPeer, loopback};
pub use error::TransportError;
pub use service::{NetworkEvent, NetworkService};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Ids are unique for the lifetime of the process; the network thread
/// hands them out from a global counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "kilgore");
        map.insert(ConnectionId::new(2), "trout");
        assert_eq!(map[&ConnectionId::new(1)], "kilgore");
    }
}
