//! Player and object lifecycle orchestration.
//!
//! The [`World`] owns the player table and the live object table. It never
//! gets called by the code that produces events. Instead it subscribes to
//! two buses and applies what arrived at well-defined points of the tick:
//!
//! ```text
//! session bus ── PlayerLoggedIn / PlayerLoggedOut ──┐
//!                                                   ├─→ process_events()
//! engine bus ── ObjectCreated / DeleteObject ───────┤        │
//!               PlayerKilled ───────────────────────┘        ↓
//!                                                    Deferred queue
//!                                                            │
//!                                         process_deferred() ↓
//!                                                    object table
//! ```
//!
//! Event handling may touch the player table and the clients, but every
//! change to the object table goes through [`Deferred`].

use std::sync::Arc;

use freebooter_dispatch::Subscription;
use freebooter_protocol::{ConnectionId, Message, MessageListener, ObjectId, Outbox, names};
use freebooter_session::{SessionBus, SessionEvent, SessionEventKind};

use crate::deferred::{Deferred, WorldState};
use crate::player::{Player, Players, SERVER_SENDER, broadcast};
use crate::ship::{HELP_TEXT, SHIP_COMMAND, ship_handler};
use crate::{
    CommandHandler, EngineBus, EngineEvent, EngineEventKind, Notifier, ObjectFactory, ObjectTable,
    WorldError,
};

/// World settings.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Object type every player gets on login and on respawn.
    pub player_object_type: String,

    /// Whether new players receive the command help text.
    pub send_help: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player_object_type: "ship".to_string(),
            send_help: true,
        }
    }
}

pub struct World {
    state: WorldState,
    deferred: Deferred,
    commands: CommandHandler,
    factory: Arc<dyn ObjectFactory>,
    notifier: Notifier,
    session_events: Subscription<SessionEvent>,
    engine_events: Subscription<EngineEvent>,
    config: WorldConfig,
}

impl World {
    /// Creates a world listening on both buses.
    ///
    /// The `ship` command is registered here; more handlers can be added
    /// through [`commands_mut`](World::commands_mut) before traffic
    /// starts.
    pub fn new(
        session_bus: &SessionBus,
        engine_bus: &EngineBus,
        factory: Arc<dyn ObjectFactory>,
        notifier: Notifier,
        config: WorldConfig,
    ) -> Self {
        let session_events = session_bus.subscribe(&[
            SessionEventKind::PlayerLoggedIn,
            SessionEventKind::PlayerLoggedOut,
        ]);
        let engine_events = engine_bus.subscribe(&[
            EngineEventKind::ObjectCreated,
            EngineEventKind::DeleteObject,
            EngineEventKind::PlayerKilled,
        ]);

        let deferred = Deferred::new();
        let mut commands = CommandHandler::new();
        commands.register_handler(
            SHIP_COMMAND,
            ship_handler(Arc::clone(&factory), deferred.clone()),
        );

        Self {
            state: WorldState::default(),
            deferred,
            commands,
            factory,
            notifier,
            session_events,
            engine_events,
            config,
        }
    }

    pub fn commands_mut(&mut self) -> &mut CommandHandler {
        &mut self.commands
    }

    pub fn players(&self) -> &Players {
        &self.state.players
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.state.players.get(&id)
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.state.objects
    }

    /// Table changes waiting for the next [`process_deferred`](World::process_deferred).
    pub fn pending_changes(&self) -> usize {
        self.deferred.pending()
    }

    /// Applies every event that arrived on either bus. Returns how many
    /// were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.session_events.try_next() {
            log_failure(self.apply_session_event(event));
            handled += 1;
        }
        while let Some(event) = self.engine_events.try_next() {
            log_failure(self.apply_engine_event(event));
            handled += 1;
        }
        handled
    }

    /// Applies every scheduled object table change.
    pub fn process_deferred(&mut self) -> usize {
        self.deferred.process(&mut self.state)
    }

    /// One world step: events first, then the table changes they caused.
    pub fn tick(&mut self) {
        self.process_events();
        self.process_deferred();
    }

    // -- Event handlers ----------------------------------------------------

    fn apply_session_event(&mut self, event: SessionEvent) -> Result<(), WorldError> {
        match event {
            SessionEvent::PlayerLoggedIn {
                connection,
                id,
                name,
            } => self.handle_player_logged_in(connection, id, name),
            SessionEvent::PlayerLoggedOut { id } => self.handle_player_logged_out(id),
        }
    }

    fn apply_engine_event(&mut self, event: EngineEvent) -> Result<(), WorldError> {
        match event {
            EngineEvent::ObjectCreated(object) => {
                self.deferred.add_object(object);
                Ok(())
            }
            EngineEvent::DeleteObject(id) => {
                self.deferred.delete_object(id);
                Ok(())
            }
            EngineEvent::PlayerKilled(id) => self.handle_player_killed(id),
        }
    }

    fn handle_player_logged_in(
        &mut self,
        connection: Outbox,
        id: ConnectionId,
        name: String,
    ) -> Result<(), WorldError> {
        if self.state.players.contains_key(&id) {
            tracing::debug!(connection = %id, username = %name, "connection already has a player");
            return Ok(());
        }

        let kind = &self.config.player_object_type;
        let object = self
            .factory
            .create_a(kind)
            .ok_or_else(|| WorldError::ObjectCreationFailed(kind.clone()))?;

        let mut player = Player::new(name.clone(), connection);
        player.assign_object(object.id());
        self.deferred.add_object(object);
        self.state.players.insert(id, player);

        let notification = format!("New player logged in: {name}");
        tracing::info!(connection = %id, username = %name, "player joined the world");
        broadcast(&self.state.players, &Message::chat(&notification, SERVER_SENDER));

        if self.config.send_help {
            if let Some(player) = self.state.players.get(&id) {
                player.send(&Message::chat(HELP_TEXT, SERVER_SENDER));
            }
        }

        self.notifier.send(&notification)?;
        Ok(())
    }

    fn handle_player_logged_out(&mut self, id: ConnectionId) -> Result<(), WorldError> {
        let player = self
            .state
            .players
            .remove(&id)
            .ok_or(WorldError::UnknownPlayer(id))?;

        if let Some(object_id) = player.object_id() {
            self.deferred.delete_object(object_id);
        }
        tracing::info!(connection = %id, username = player.name(), "player left the world");
        Ok(())
    }

    fn handle_player_killed(&mut self, object_id: ObjectId) -> Result<(), WorldError> {
        let player = self
            .state
            .players
            .values_mut()
            .find(|player| player.object_id() == Some(object_id))
            .ok_or(WorldError::NoPlayerForObject(object_id))?;

        let kind = &self.config.player_object_type;
        let object = self
            .factory
            .create_a(kind)
            .ok_or_else(|| WorldError::ObjectCreationFailed(kind.clone()))?;

        tracing::info!(username = player.name(), %object_id, new_object_id = %object.id(), "player respawned");
        self.deferred.replace_object(player, object);
        Ok(())
    }
}

impl MessageListener for World {
    /// Routes a message from a logged-in connection.
    ///
    /// Pending events are applied first so a login triggered by the
    /// previous message already has a player.
    fn on_message(&mut self, connection: ConnectionId, message: &Message) {
        self.process_events();

        let Some(player) = self.state.players.get_mut(&connection) else {
            return;
        };

        match message {
            Message::ChatMessage { text, .. } => {
                let chat = Message::chat(text.as_str(), player.name());
                broadcast(&self.state.players, &chat);
            }
            Message::Command(command) if is_handshake(command.name()) => {}
            Message::Command(command) => {
                player.run_command(&self.commands, command);
            }
            Message::ObjectAssigned { .. } | Message::DeleteObject { .. } => {
                tracing::debug!(%connection, "server-only message from client ignored");
            }
        }
    }
}

fn log_failure(result: Result<(), WorldError>) {
    match result {
        Ok(()) => {}
        Err(e @ WorldError::ObjectCreationFailed(_)) => {
            tracing::error!(error = %e, "world event aborted");
        }
        Err(e @ WorldError::Notify(_)) => {
            tracing::warn!(error = %e, "login notification not written");
        }
        Err(e) => {
            tracing::warn!(error = %e, "world event ignored");
        }
    }
}

/// Handshake commands belong to the authentication session.
fn is_handshake(name: &str) -> bool {
    matches!(
        name,
        names::REGISTRATION_REQUEST | names::LOGIN_REQUEST | names::AUTHENTICATION_RESPONSE
    )
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("players", &self.state.players.len())
            .field("objects", &self.state.objects.len())
            .field("pending_changes", &self.deferred.pending())
            .field("config", &self.config)
            .finish()
    }
}
