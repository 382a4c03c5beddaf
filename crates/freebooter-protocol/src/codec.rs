//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and raw bytes. The rest of the
//! server only talks to the [`Codec`] trait, so swapping the wire format
//! means adding one more implementation here.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Message, ProtocolError};

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes one inbound frame as a [`Message`].
    fn decode_message(&self, frame: &[u8]) -> Result<Message, ProtocolError> {
        self.decode(frame)
    }
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use freebooter_protocol::{Codec, Command, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let message = Message::Command(Command::new("login_request", ["Kilgore"]));
///
/// let bytes = codec.encode(&message).unwrap();
/// assert_eq!(codec.decode_message(&bytes).unwrap(), message);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
