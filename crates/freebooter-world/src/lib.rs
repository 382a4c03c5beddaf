//! The game world for Freebooter.
//!
//! Once a connection has logged in, everything that happens to it happens
//! here: it becomes a [`Player`], gets an [`Object`] to fly, chats, runs
//! commands, dies and respawns, and eventually logs out.
//!
//! # Key types
//!
//! - [`World`]: subscribes to session and engine events and owns the
//!   player and object tables
//! - [`Deferred`]: the only way objects enter or leave the live table
//! - [`CommandHandler`]: name → handler registry for player commands
//! - [`ObjectFactory`] / [`CreatorRegistry`]: builds objects by type name
//! - [`Notifier`]: writes login notifications to an operator stream

mod commands;
mod deferred;
mod error;
mod events;
mod notifier;
mod object;
mod player;
mod ship;
mod world;

pub use commands::{CommandHandler, CommandOutcome, Handler};
pub use deferred::{Deferred, WorldState};
pub use error::WorldError;
pub use events::{EngineBus, EngineEvent, EngineEventKind};
pub use notifier::Notifier;
pub use object::{Creator, CreatorRegistry, Object, ObjectFactory, ObjectTable};
pub use player::{Player, Players, SERVER_SENDER, broadcast};
pub use ship::{HELP_TEXT, SHIP_COMMAND, ship_handler};
pub use world::{World, WorldConfig};
