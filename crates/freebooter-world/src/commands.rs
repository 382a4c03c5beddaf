//! Application command dispatch.
//!
//! Commands are registered by name during setup and looked up per call.
//! A handler gets the command and the player who sent it, and answers
//! with a [`CommandOutcome`]. Handlers run on the main thread inside the
//! tick, so they must return quickly.

use std::collections::HashMap;
use std::fmt;

use freebooter_protocol::Command;

use crate::Player;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A registered command handler.
pub type Handler = Box<dyn Fn(&Command, &mut Player) -> CommandOutcome + Send + Sync>;

/// Name → handler registry.
#[derive(Default)]
pub struct CommandHandler {
    handlers: HashMap<String, Handler>,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `name`. Registering the same name again
    /// replaces the previous handler.
    pub fn register_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&Command, &mut Player) -> CommandOutcome + Send + Sync + 'static,
    ) {
        let name = name.into();
        tracing::debug!(command = %name, "command handler registered");
        if self.handlers.insert(name.clone(), Box::new(handler)).is_some() {
            tracing::debug!(command = %name, "previous command handler replaced");
        }
    }

    /// Runs the handler registered for `command`'s name.
    ///
    /// An unknown name fails with `"Unknown command: <name>"` and has no
    /// side effects.
    pub fn execute(&self, command: &Command, player: &mut Player) -> CommandOutcome {
        let Some(handler) = self.handlers.get(command.name()) else {
            return CommandOutcome::failed(format!("Unknown command: {}", command.name()));
        };
        tracing::trace!(command = command.name(), username = player.name(), "executing command");
        handler(command, player)
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("CommandHandler")
            .field("commands", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freebooter_protocol::{ConnectionId, Outbox};
    use freebooter_transport::{LoopbackPeer, loopback};

    fn player() -> (Player, LoopbackPeer) {
        let (conn, peer) = loopback(ConnectionId::new(1));
        (Player::new("Kilgore", Outbox::new(conn.sender())), peer)
    }

    #[test]
    fn test_execute_unknown_command_fails_with_name() {
        let commands = CommandHandler::new();
        let (mut player, mut peer) = player();

        let outcome = commands.execute(&Command::new("explode", ["now"]), &mut player);

        assert_eq!(outcome, CommandOutcome::failed("Unknown command: explode"));
        assert!(peer.drain().is_empty(), "execute itself sends nothing");
    }

    #[test]
    fn test_execute_returns_handler_result_verbatim() {
        let mut commands = CommandHandler::new();
        commands.register_handler("dock", |command, _| {
            CommandOutcome::failed(format!("no station {}", command.parameters().join(" ")))
        });
        let (mut player, _peer) = player();

        let outcome = commands.execute(&Command::new("dock", ["Tralfamadore"]), &mut player);
        assert_eq!(outcome, CommandOutcome::failed("no station Tralfamadore"));
    }

    #[test]
    fn test_execute_handler_can_mutate_player() {
        let mut commands = CommandHandler::new();
        commands.register_handler("take", |_, player| {
            player.assign_object(freebooter_protocol::ObjectId(7));
            CommandOutcome::ok()
        });
        let (mut player, _peer) = player();

        assert!(commands.execute(&Command::new("take", Vec::<String>::new()), &mut player).success);
        assert_eq!(player.object_id(), Some(freebooter_protocol::ObjectId(7)));
    }

    #[test]
    fn test_register_handler_twice_last_wins() {
        let mut commands = CommandHandler::new();
        commands.register_handler("ping", |_, _| CommandOutcome::failed("first"));
        commands.register_handler("ping", |_, _| CommandOutcome::failed("second"));
        let (mut player, _peer) = player();

        let outcome = commands.execute(&Command::new("ping", Vec::<String>::new()), &mut player);
        assert_eq!(outcome.message, "second");
        assert!(commands.has_handler("ping"));
        assert!(!commands.has_handler("pong"));
    }
}
