//! Challenge generation and the response digest.
//!
//! A client proves it holds its token without sending it: the server picks
//! a random challenge, and the client answers with
//! `auth_hash(challenge + token)`.

use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

/// Length of a login challenge, in characters.
pub const CHALLENGE_LENGTH: usize = 256;

/// Generates a fresh challenge of [`CHALLENGE_LENGTH`] alphanumeric
/// characters.
pub fn generate_challenge() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CHALLENGE_LENGTH)
        .map(char::from)
        .collect()
}

/// Lowercase hex SHA-256 of `input`.
pub fn auth_hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Compares two digests in time that depends only on their length.
pub(crate) fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |diff, (x, y)| diff | (x ^ y))
            == 0
}
