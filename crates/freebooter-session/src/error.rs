//! Error types for the session layer.

/// A credential store operation failed.
///
/// Stores are external collaborators, so the detail is whatever the
/// backend reported. It is logged, never shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the request.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Why a registration or login step was rejected.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The username is empty or contains a disallowed character.
    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    /// Registration for a name that is already taken.
    #[error("user {0:?} already exists")]
    AlreadyRegistered(String),

    /// Login for a name that was never registered.
    #[error("unknown username {0:?}")]
    UnknownUser(String),

    /// The response did not match `auth_hash(challenge + token)`.
    #[error("authentication response did not match")]
    InvalidResponse,

    /// The credential store failed mid-request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Prefix shared by every login error sent to a client.
pub const LOGIN_ERROR: &str = "Unable to log in.";

impl AuthError {
    /// The text of the `error` command sent back to the client.
    ///
    /// Store failures collapse into a generic message.
    pub fn client_message(&self) -> String {
        let detail = match self {
            Self::InvalidUsername(_) => {
                "Invalid username. Username must not contain whitespace or any of !.$%^&*()#"
            }
            Self::AlreadyRegistered(_) => "User already exists, please choose another username.",
            Self::UnknownUser(_) => "Unknown username.",
            Self::InvalidResponse => "Invalid authentication.",
            Self::Store(_) => "Please try again later.",
        };
        format!("{LOGIN_ERROR} additional information: {detail}")
    }
}
