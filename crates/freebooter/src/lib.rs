//! # Freebooter
//!
//! Server core for a multiplayer space game.
//!
//! Clients connect over WebSocket, register or answer a login challenge,
//! and then fly an object in a shared world. Network I/O runs on its own
//! thread; everything that touches game state runs on the thread that
//! drives [`Server::tick`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use freebooter::prelude::*;
//!
//! # async fn start() -> Result<(), FreebooterError> {
//! let server = Server::builder().bind("0.0.0.0:9000").build()?;
//! server.run().await
//! # }
//! ```

mod error;
mod registry;
mod server;

pub use error::FreebooterError;
pub use registry::{ConnectionRegistry, Connections, NetworkQueue};
pub use server::{Server, ServerBuilder};

pub use freebooter_dispatch as dispatch;
pub use freebooter_protocol as protocol;
pub use freebooter_session as session;
pub use freebooter_tick as tick;
pub use freebooter_transport as transport;
pub use freebooter_world as world;

/// The types most servers need.
pub mod prelude {
    pub use crate::{ConnectionRegistry, FreebooterError, Server, ServerBuilder};
    pub use freebooter_protocol::{Command, ConnectionId, Message, ObjectId};
    pub use freebooter_session::{CredentialStore, MemoryStore};
    pub use freebooter_tick::TickConfig;
    pub use freebooter_world::{
        CommandOutcome, CreatorRegistry, EngineEvent, Notifier, Object, ObjectFactory, Player,
        WorldConfig,
    };
}
