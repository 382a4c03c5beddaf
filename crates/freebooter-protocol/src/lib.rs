//! Wire protocol for Freebooter.
//!
//! This crate defines what travels over a connection and how it is
//! turned into bytes:
//!
//! - **Types** ([`Message`], [`Command`], [`ObjectId`]) are the JSON
//!   shapes clients and server exchange.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converts them to and from
//!   bytes.
//! - **Outbox** wraps a connection's outbound sender so callers send
//!   typed messages instead of frames.
//! - **[`MessageListener`]** is the seam through which decoded inbound
//!   messages reach game logic.
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Session / World
//! ```

mod codec;
mod error;
mod outbox;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use outbox::{MessageListener, Outbox};
pub use types::{Command, Message, ObjectId, names};

pub use freebooter_transport::ConnectionId;
