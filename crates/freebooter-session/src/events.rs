//! Events the authentication flow publishes.

use freebooter_dispatch::{Event, EventBus};
use freebooter_protocol::{ConnectionId, Outbox};

/// Login lifecycle of one connection.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The connection proved its identity, by registering or by answering
    /// a challenge.
    PlayerLoggedIn {
        connection: Outbox,
        id: ConnectionId,
        name: String,
    },

    /// The connection's session was closed. Published once per session,
    /// whether or not it ever logged in.
    PlayerLoggedOut { id: ConnectionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEventKind {
    PlayerLoggedIn,
    PlayerLoggedOut,
}

impl Event for SessionEvent {
    type Kind = SessionEventKind;

    fn kind(&self) -> SessionEventKind {
        match self {
            Self::PlayerLoggedIn { .. } => SessionEventKind::PlayerLoggedIn,
            Self::PlayerLoggedOut { .. } => SessionEventKind::PlayerLoggedOut,
        }
    }
}

/// Bus carrying [`SessionEvent`]s.
pub type SessionBus = EventBus<SessionEvent>;
