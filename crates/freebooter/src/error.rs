//! Unified error type for the Freebooter server.

use freebooter_session::StoreError;
use freebooter_transport::TransportError;
use freebooter_world::WorldError;

/// Wraps every crate-specific error so setup code can use `?` throughout.
///
/// Only setup and shutdown return these. Failures while serving traffic
/// are logged and answered on the wire instead.
#[derive(Debug, thiserror::Error)]
pub enum FreebooterError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    World(#[from] WorldError),

    /// The shutdown signal could not be awaited.
    #[error("server runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: FreebooterError = TransportError::NotListening.into();
        assert!(matches!(err, FreebooterError::Transport(_)));
        assert_eq!(err.to_string(), TransportError::NotListening.to_string());
    }

    #[test]
    fn test_from_store_error() {
        let err: FreebooterError = StoreError::Unavailable("redis down".into()).into();
        assert!(matches!(err, FreebooterError::Store(_)));
        assert!(err.to_string().contains("redis down"));
    }

    #[test]
    fn test_from_world_error() {
        let err: FreebooterError = WorldError::ObjectCreationFailed("ship".into()).into();
        assert!(matches!(err, FreebooterError::World(_)));
        assert!(err.to_string().contains("ship"));
    }

    #[test]
    fn test_from_io_error() {
        let err: FreebooterError = std::io::Error::other("no signal").into();
        assert!(matches!(err, FreebooterError::Runtime(_)));
    }
}
