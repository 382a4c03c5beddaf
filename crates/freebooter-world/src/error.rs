//! Error types for the world layer.

use freebooter_protocol::{ConnectionId, ObjectId};

/// Why a world event could not be applied.
///
/// These never escape the tick. The world logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The object factory has no creator for this type.
    #[error("object factory could not create a {0:?}")]
    ObjectCreationFailed(String),

    /// A `PlayerKilled` named an object no player owns.
    #[error("no player owns object {0}")]
    NoPlayerForObject(ObjectId),

    /// A logout for a connection that never produced a player.
    #[error("no player for connection {0}")]
    UnknownPlayer(ConnectionId),

    /// Writing a login notification failed.
    #[error("notification failed: {0}")]
    Notify(#[from] std::io::Error),
}
