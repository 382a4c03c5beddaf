//! Logged-in players.

use std::collections::HashMap;

use freebooter_protocol::{Command, ConnectionId, Message, ObjectId, Outbox};

use crate::{CommandHandler, CommandOutcome};

/// Sender name used for messages the server itself writes.
pub const SERVER_SENDER: &str = "server";

/// Every logged-in player, keyed by connection.
pub type Players = HashMap<ConnectionId, Player>;

/// A connection that finished logging in.
#[derive(Debug)]
pub struct Player {
    outbox: Outbox,
    name: String,
    object_id: Option<ObjectId>,
}

impl Player {
    pub fn new(name: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            outbox,
            name: name.into(),
            object_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connection this player is logged in on.
    pub fn id(&self) -> ConnectionId {
        self.outbox.id()
    }

    /// The object currently under this player's control, if any.
    pub fn object_id(&self) -> Option<ObjectId> {
        self.object_id
    }

    pub fn send(&self, message: &Message) -> bool {
        self.outbox.send(message)
    }

    /// Hands `object_id` to this player and tells the client.
    pub fn assign_object(&mut self, object_id: ObjectId) {
        self.object_id = Some(object_id);
        self.send(&Message::ObjectAssigned { object_id });
        tracing::debug!(connection = %self.id(), username = %self.name, %object_id, "object assigned");
    }

    /// Runs `command` through `commands` on behalf of this player.
    ///
    /// A failure is reported back to the player as a chat message from
    /// the server; success is silent.
    pub fn run_command(&mut self, commands: &CommandHandler, command: &Command) -> CommandOutcome {
        let outcome = commands.execute(command, self);
        if !outcome.success {
            tracing::debug!(
                connection = %self.id(),
                command = command.name(),
                message = %outcome.message,
                "command failed"
            );
            self.send(&Message::chat(
                format!("{}: {}", command.name(), outcome.message),
                SERVER_SENDER,
            ));
        }
        outcome
    }
}

/// Sends `message` to every player. Returns how many sends were queued.
pub fn broadcast(players: &Players, message: &Message) -> usize {
    players
        .values()
        .filter(|player| player.send(message))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use freebooter_protocol::{Codec, JsonCodec};
    use freebooter_transport::{LoopbackPeer, loopback};

    fn player(id: u64, name: &str) -> (Player, LoopbackPeer) {
        let (conn, peer) = loopback(ConnectionId::new(id));
        (Player::new(name, Outbox::new(conn.sender())), peer)
    }

    fn received(peer: &mut LoopbackPeer) -> Vec<Message> {
        peer.drain()
            .iter()
            .map(|frame| JsonCodec.decode_message(frame).unwrap())
            .collect()
    }

    #[test]
    fn test_new_player_has_no_object() {
        let (player, _peer) = player(1, "Kilgore");
        assert_eq!(player.object_id(), None);
        assert_eq!(player.name(), "Kilgore");
        assert_eq!(player.id(), ConnectionId::new(1));
    }

    #[test]
    fn test_assign_object_sends_object_assigned() {
        let (mut player, mut peer) = player(1, "Kilgore");
        player.assign_object(ObjectId(12));

        assert_eq!(player.object_id(), Some(ObjectId(12)));
        assert_eq!(
            received(&mut peer),
            vec![Message::ObjectAssigned {
                object_id: ObjectId(12)
            }]
        );
    }

    #[test]
    fn test_run_command_failure_sends_chat_with_command_name() {
        let (mut player, mut peer) = player(1, "Kilgore");
        let commands = CommandHandler::new();

        let outcome = player.run_command(&commands, &Command::new("explode", ["now"]));

        assert!(!outcome.success);
        assert_eq!(
            received(&mut peer),
            vec![Message::chat(
                "explode: Unknown command: explode",
                SERVER_SENDER
            )]
        );
    }

    #[test]
    fn test_run_command_success_is_silent() {
        let (mut player, mut peer) = player(1, "Kilgore");
        let mut commands = CommandHandler::new();
        commands.register_handler("wave", |_, _| CommandOutcome::ok());

        assert!(player.run_command(&commands, &Command::new("wave", Vec::<String>::new())).success);
        assert!(peer.drain().is_empty());
    }

    #[test]
    fn test_broadcast_reaches_every_player() {
        let (a, mut peer_a) = player(1, "a");
        let (b, mut peer_b) = player(2, "b");
        let players: Players = [(a.id(), a), (b.id(), b)].into_iter().collect();

        assert_eq!(broadcast(&players, &Message::chat("hi", "a")), 2);
        assert_eq!(received(&mut peer_a), vec![Message::chat("hi", "a")]);
        assert_eq!(received(&mut peer_b), vec![Message::chat("hi", "a")]);
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let (a, peer_a) = player(1, "a");
        let (b, _peer_b) = player(2, "b");
        let players: Players = [(a.id(), a), (b.id(), b)].into_iter().collect();

        peer_a.close();
        assert_eq!(broadcast(&players, &Message::chat("hi", "b")), 1);
    }
}
