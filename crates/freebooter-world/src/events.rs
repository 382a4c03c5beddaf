//! Events the simulation publishes about objects.

use freebooter_dispatch::{Event, EventBus};
use freebooter_protocol::ObjectId;

use crate::Object;

/// Object lifecycle requests raised by simulation code (projectiles,
/// collisions, scripted missions).
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A new object should join the world.
    ObjectCreated(Object),
    /// An object should leave the world.
    DeleteObject(ObjectId),
    /// A player's object was destroyed.
    PlayerKilled(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEventKind {
    ObjectCreated,
    DeleteObject,
    PlayerKilled,
}

impl Event for EngineEvent {
    type Kind = EngineEventKind;

    fn kind(&self) -> EngineEventKind {
        match self {
            Self::ObjectCreated(_) => EngineEventKind::ObjectCreated,
            Self::DeleteObject(_) => EngineEventKind::DeleteObject,
            Self::PlayerKilled(_) => EngineEventKind::PlayerKilled,
        }
    }
}

/// Bus carrying [`EngineEvent`]s.
pub type EngineBus = EventBus<EngineEvent>;
