//! The per-connection authentication state machine.
//!
//! Every accepted connection gets one [`AuthenticationSession`]. It reads
//! three commands and ignores everything else:
//!
//! ```text
//!                    login_request
//!   ┌──────┐ ─────────────────────────────→ ┌──────────────────────┐
//!   │ Idle │                                │ AwaitingAuthResponse │
//!   └──────┘ ←───────────────────────────── └──────────────────────┘
//!      │       authentication_response
//!      │       (match or mismatch, the challenge is spent either way)
//!      │
//!      └── registration_request: no challenge, logs in directly
//! ```
//!
//! Success is reported by publishing [`SessionEvent::PlayerLoggedIn`].
//! The session never creates a player itself. Failures go back to the
//! client as an `error` command and never propagate as `Err`.

use std::sync::Arc;

use freebooter_protocol::{Command, ConnectionId, Message, Outbox, names};

use crate::crypto::{auth_hash, digests_match, generate_challenge};
use crate::store::{AUTH_TOKEN_FIELD, CredentialStore, USERS_SET, user_key};
use crate::{AuthError, SessionBus, SessionEvent};

/// Punctuation a username may not contain. Whitespace of any kind is
/// rejected as well.
const INVALID_USERNAME_CHARS: &[char] = &['!', '.', '$', '%', '^', '&', '*', '(', ')', '#'];

/// Where a session is in the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No challenge outstanding.
    Idle,
    /// A challenge was sent and the next `authentication_response` will
    /// consume it.
    AwaitingAuthResponse,
}

/// Checks a username against the allowed character set.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty()
        || username.chars().any(char::is_whitespace)
        || username.contains(INVALID_USERNAME_CHARS)
    {
        return Err(AuthError::InvalidUsername(username.to_owned()));
    }
    Ok(())
}

pub struct AuthenticationSession {
    outbox: Outbox,
    store: Arc<dyn CredentialStore>,
    bus: SessionBus,
    username: Option<String>,
    challenge: Option<String>,
    closed: bool,
}

impl AuthenticationSession {
    /// Creates a session for a freshly accepted connection.
    pub fn new(outbox: Outbox, store: Arc<dyn CredentialStore>, bus: SessionBus) -> Self {
        Self {
            outbox,
            store,
            bus,
            username: None,
            challenge: None,
            closed: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.outbox.id()
    }

    pub fn phase(&self) -> AuthPhase {
        if self.challenge.is_some() {
            AuthPhase::AwaitingAuthResponse
        } else {
            AuthPhase::Idle
        }
    }

    /// The username from the most recent accepted registration or login
    /// request.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Feeds one inbound message to the state machine.
    pub fn handle(&mut self, message: &Message) {
        if self.closed {
            return;
        }
        let Some(command) = message.as_command() else {
            return;
        };

        match command.name() {
            names::REGISTRATION_REQUEST => self.handle_registration_request(command),
            names::LOGIN_REQUEST => self.handle_login_request(command),
            names::AUTHENTICATION_RESPONSE => self.handle_authentication_response(command),
            _ => {}
        }
    }

    /// Ends the session and publishes `PlayerLoggedOut`.
    ///
    /// Only the first call has any effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.challenge = None;

        let id = self.id();
        tracing::info!(connection = %id, username = ?self.username, "session closed");
        self.bus.publish(SessionEvent::PlayerLoggedOut { id });
    }

    // -- registration_request(username, auth_token) ----------------------

    fn handle_registration_request(&mut self, request: &Command) {
        let (Some(username), Some(token)) = (request.parameter(0), request.parameter(1)) else {
            tracing::warn!(connection = %self.id(), "malformed registration request");
            return;
        };

        match self.register(username, token) {
            Ok(()) => self.log_in(username),
            Err(e) => self.reject(e),
        }
    }

    fn register(&mut self, username: &str, token: &str) -> Result<(), AuthError> {
        validate_username(username)?;

        let key = user_key(username);
        if self.store.key_exists(&key)? {
            return Err(AuthError::AlreadyRegistered(username.to_owned()));
        }
        // The token write marks the user as existing, so it goes last.
        self.store.add_to_set(USERS_SET, username)?;
        self.store.set_hash_field(&key, AUTH_TOKEN_FIELD, token)?;
        self.username = Some(username.to_owned());

        tracing::info!(connection = %self.id(), %username, "user registered");
        Ok(())
    }

    // -- login_request(username) ------------------------------------------

    fn handle_login_request(&mut self, request: &Command) {
        let Some(username) = request.parameters().last() else {
            tracing::warn!(connection = %self.id(), "malformed login request");
            return;
        };
        self.challenge = None;

        match self.store.key_exists(&user_key(username)) {
            Ok(true) => {}
            Ok(false) => return self.reject(AuthError::UnknownUser(username.clone())),
            Err(e) => return self.reject(e.into()),
        }
        self.username = Some(username.clone());

        let challenge = generate_challenge();
        self.outbox.send(&Message::Command(Command::new(
            names::AUTHENTICATION_REQUEST,
            [challenge.as_str()],
        )));
        self.challenge = Some(challenge);
        tracing::debug!(connection = %self.id(), %username, "authentication challenge sent");
    }

    // -- authentication_response(hash) ------------------------------------

    fn handle_authentication_response(&mut self, response: &Command) {
        let id = self.id();
        if self.challenge.is_none() {
            tracing::warn!(connection = %id, "authentication response without outstanding challenge");
            return;
        }
        let Some(hash) = response.parameters().last() else {
            tracing::warn!(connection = %id, "authentication response without hash");
            return;
        };
        let (Some(challenge), Some(username)) = (self.challenge.take(), self.username.clone())
        else {
            return;
        };

        let token = match self.store.get_hash_field(&user_key(&username), AUTH_TOKEN_FIELD) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::error!(connection = %id, %username, "no auth token stored for user");
                return self.reject(AuthError::InvalidResponse);
            }
            Err(e) => {
                tracing::error!(connection = %id, %username, error = %e, "failed to fetch auth token");
                return;
            }
        };

        if !digests_match(hash, &auth_hash(&format!("{challenge}{token}"))) {
            return self.reject(AuthError::InvalidResponse);
        }
        self.log_in(&username);
    }

    fn log_in(&self, username: &str) {
        let id = self.id();
        tracing::info!(connection = %id, %username, "player logged in");
        self.bus.publish(SessionEvent::PlayerLoggedIn {
            connection: self.outbox.clone(),
            id,
            name: username.to_owned(),
        });
    }

    fn reject(&self, error: AuthError) {
        match &error {
            AuthError::Store(e) => {
                tracing::error!(connection = %self.id(), error = %e, "credential store failure during login");
            }
            _ => {
                tracing::warn!(connection = %self.id(), error = %error, "login rejected");
            }
        }
        self.outbox
            .send(&Message::Command(Command::error(error.client_message())));
    }
}

impl std::fmt::Debug for AuthenticationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationSession")
            .field("id", &self.id())
            .field("username", &self.username)
            .field("phase", &self.phase())
            .field("closed", &self.closed)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
