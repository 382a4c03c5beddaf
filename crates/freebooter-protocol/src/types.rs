//! Wire types for Freebooter.
//!
//! Everything in this module is serialized to JSON and sent over a
//! connection. There are two layers:
//!
//! - [`Message`] is the top-level envelope, internally tagged by `"type"`.
//! - [`Command`] is a named request with string parameters. The handshake
//!   (`registration_request`, `login_request`, ...) and every application
//!   command travel as `Message::Command`.
//!
//! ```text
//! {"type":"command","name":"login_request","parameters":["Kilgore"]}
//! {"type":"chat_message","text":"hi","sender":"Kilgore"}
//! {"type":"object_assigned","object_id":7}
//! {"type":"delete_object","object_id":7}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known command names.
pub mod names {
    /// C→S: `(username, auth_token)`.
    pub const REGISTRATION_REQUEST: &str = "registration_request";
    /// C→S: `(username)`.
    pub const LOGIN_REQUEST: &str = "login_request";
    /// S→C: `(challenge)`.
    pub const AUTHENTICATION_REQUEST: &str = "authentication_request";
    /// C→S: `(hash)`.
    pub const AUTHENTICATION_RESPONSE: &str = "authentication_response";
    /// S→C: `(message)`.
    pub const ERROR: &str = "error";
}

// ---------------------------------------------------------------------------
// ObjectId
// ---------------------------------------------------------------------------

/// Identifier of a simulated object.
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A named request with positional string parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    name: String,
    #[serde(default)]
    parameters: Vec<String>,
}

impl Command {
    /// Creates a command from a name and its parameters.
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// An `error(message)` command.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(names::ERROR, [message.into()])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The parameter at `index`, if the client sent that many.
    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Both directions. Handshake steps and application commands.
    Command(Command),

    /// Both directions. Broadcast to every logged-in player.
    ChatMessage { text: String, sender: String },

    /// S→C: "this object is yours now".
    ObjectAssigned { object_id: ObjectId },

    /// S→C broadcast: the object left the world.
    DeleteObject { object_id: ObjectId },
}

impl Message {
    /// Shorthand for a chat message.
    pub fn chat(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self::ChatMessage {
            text: text.into(),
            sender: sender.into(),
        }
    }

    /// The command inside, if this is a `Message::Command`.
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(command) => Some(command),
            _ => None,
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

// =========================================================================
// Tests
// =========================================================================
