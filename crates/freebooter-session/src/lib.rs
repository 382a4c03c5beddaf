//! Authentication for Freebooter.
//!
//! This crate turns an anonymous connection into a named player:
//!
//! 1. **Credential storage** ([`CredentialStore`] trait, [`MemoryStore`]).
//! 2. **Challenge-response crypto** ([`generate_challenge`], [`auth_hash`]).
//! 3. **The per-connection state machine** ([`AuthenticationSession`]),
//!    which publishes [`SessionEvent`]s on a [`SessionBus`].
//!
//! # How it fits in the stack
//!
//! ```text
//! World (above)          ← consumes PlayerLoggedIn / PlayerLoggedOut
//!     ↕
//! Session (this crate)   ← decides who a connection is
//!     ↕
//! Protocol (below)       ← Message, Command, Outbox
//! ```

mod crypto;
mod error;
mod events;
mod session;
mod store;

pub use crypto::{CHALLENGE_LENGTH, auth_hash, generate_challenge};
pub use error::{AuthError, LOGIN_ERROR, StoreError};
pub use events::{SessionBus, SessionEvent, SessionEventKind};
pub use session::{AuthPhase, AuthenticationSession, validate_username};
pub use store::{AUTH_TOKEN_FIELD, CredentialStore, MemoryStore, USERS_SET, user_key};
