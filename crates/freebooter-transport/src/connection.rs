//! Main-thread handles for a single connection.
//!
//! A [`Connection`] is created on the I/O thread and then *moved* to the
//! main thread inside a queued callback. From then on the main thread is
//! its only owner. Frames flow through two unbounded channels, so neither
//! side ever blocks on the other:
//!
//! - inbound: I/O reader task → `Connection::try_recv`
//! - outbound: `ConnectionSender::send` → I/O writer task
//!
//! A shared liveness flag lets the main thread notice that the peer is
//! gone before the matching "lost" notification has been processed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::ConnectionId;

/// Cloneable outbound half of a connection.
///
/// Players, sessions and broadcasts all hold one of these. Sending never
/// blocks; frames are queued for the I/O thread's writer task.
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    open: Arc<AtomicBool>,
}

impl ConnectionSender {
    /// The connection this sender writes to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a frame for delivery.
    ///
    /// Returns `false` if the connection is already closed. A `true`
    /// result only means the frame was queued, not that it arrived.
    pub fn send(&self, frame: Vec<u8>) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        self.tx.send(frame).is_ok()
    }

    /// Whether the peer is still connected.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }
}

/// The main thread's view of one connection.
#[derive(Debug)]
pub struct Connection {
    sender: ConnectionSender,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Connection {
    /// Builds the main-thread half plus the channel ends the I/O thread
    /// keeps for itself.
    pub(crate) fn new(
        id: ConnectionId,
    ) -> (
        Self,
        mpsc::UnboundedSender<Vec<u8>>,
        mpsc::UnboundedReceiver<Vec<u8>>,
        Arc<AtomicBool>,
    ) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let connection = Self {
            sender: ConnectionSender {
                id,
                tx: outbound_tx,
                open: Arc::clone(&open),
            },
            inbound: inbound_rx,
        };

        (connection, inbound_tx, outbound_rx, open)
    }

    /// The connection's unique id.
    pub fn id(&self) -> ConnectionId {
        self.sender.id
    }

    /// A cloneable handle for writing to this connection.
    pub fn sender(&self) -> ConnectionSender {
        self.sender.clone()
    }

    /// Takes the next inbound frame, if one has already arrived.
    ///
    /// Never waits. Frames come out in the order the peer sent them.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.try_recv().ok()
    }

    /// Whether the peer is still connected.
    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }
}

/// The far end of a [`loopback`] connection.
///
/// Plays the role of a remote client: whatever it sends shows up in
/// [`Connection::try_recv`], and whatever the server sends can be read
/// back with [`LoopbackPeer::recv`].
#[derive(Debug)]
pub struct LoopbackPeer {
    id: ConnectionId,
    to_server: mpsc::UnboundedSender<Vec<u8>>,
    from_server: mpsc::UnboundedReceiver<Vec<u8>>,
    open: Arc<AtomicBool>,
}

impl LoopbackPeer {
    /// Id of the connection this peer is attached to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends a frame to the server side.
    pub fn send(&self, frame: Vec<u8>) -> bool {
        self.open.load(Ordering::Acquire) && self.to_server.send(frame).is_ok()
    }

    /// Takes the next frame the server sent, if any.
    pub fn recv(&mut self) -> Option<Vec<u8>> {
        self.from_server.try_recv().ok()
    }

    /// Takes every frame the server has sent so far.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.recv() {
            frames.push(frame);
        }
        frames
    }

    /// Simulates the remote side hanging up.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// Creates an in-memory connection with no socket behind it.
///
/// Used by tests and by tools that want to drive the server without a
/// network.
pub fn loopback(id: ConnectionId) -> (Connection, LoopbackPeer) {
    let (connection, to_server, from_server, open) = Connection::new(id);
    let peer = LoopbackPeer {
        id,
        to_server,
        from_server,
        open,
    };
    (connection, peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_peer_frames_reach_connection_in_order() {
        let (mut conn, peer) = loopback(ConnectionId::new(1));

        assert!(peer.send(b"first".to_vec()));
        assert!(peer.send(b"second".to_vec()));

        assert_eq!(conn.try_recv().as_deref(), Some(&b"first"[..]));
        assert_eq!(conn.try_recv().as_deref(), Some(&b"second"[..]));
        assert_eq!(conn.try_recv(), None);
    }

    #[test]
    fn test_sender_frames_reach_peer() {
        let (conn, mut peer) = loopback(ConnectionId::new(2));

        let sender = conn.sender();
        assert!(sender.send(b"hello".to_vec()));

        assert_eq!(peer.drain(), vec![b"hello".to_vec()]);
    }

    #[test]
    fn test_send_after_close_returns_false() {
        let (conn, peer) = loopback(ConnectionId::new(3));
        let sender = conn.sender();

        peer.close();

        assert!(!conn.is_open());
        assert!(!sender.send(b"late".to_vec()));
    }

    #[test]
    fn test_sender_keeps_connection_id() {
        let (conn, _peer) = loopback(ConnectionId::new(9));
        assert_eq!(conn.sender().id(), ConnectionId::new(9));
        assert_eq!(conn.id(), ConnectionId::new(9));
    }
}
