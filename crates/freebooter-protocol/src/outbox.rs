//! Typed outbound handle and the inbound listener seam.

use freebooter_transport::{ConnectionId, ConnectionSender};

use crate::{Codec, JsonCodec, Message};

/// A cloneable handle for sending [`Message`]s to one connection.
///
/// Sessions, players and broadcasts hold an `Outbox` rather than the
/// connection itself, so the registry stays the connection's only owner.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: ConnectionSender,
}

impl Outbox {
    pub fn new(sender: ConnectionSender) -> Self {
        Self { sender }
    }

    /// The connection this outbox writes to.
    pub fn id(&self) -> ConnectionId {
        self.sender.id()
    }

    /// Encodes and queues a message.
    ///
    /// Returns `false` if the message could not be encoded or the
    /// connection is closed. Never blocks.
    pub fn send(&self, message: &Message) -> bool {
        match JsonCodec.encode(message) {
            Ok(frame) => self.sender.send(frame),
            Err(e) => {
                tracing::error!(connection = %self.id(), error = %e, "failed to encode message");
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }
}

/// Receives decoded messages from logged-in connections.
///
/// The registry calls this after the connection's authentication session
/// has seen the message. The world implements it to route chat and
/// application commands.
pub trait MessageListener {
    fn on_message(&mut self, connection: ConnectionId, message: &Message);
}
