/// Errors that can occur in the network layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The I/O runtime or thread could not be started.
    #[error("network thread failed to start: {0}")]
    StartFailed(#[source] std::io::Error),

    /// `start()` was called before `listen()`.
    #[error("network service is not listening")]
    NotListening,

    /// `start()` was called twice.
    #[error("network service already started")]
    AlreadyStarted,
}
