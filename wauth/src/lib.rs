#![deny(missing_docs)]

//! This crate provides the WAUTH-2 session cryptography: PBKDF2 key
//! derivation from a shared secret and a server challenge, per-direction
//! RC4 keystreams, and the per-frame HMAC-SHA1 seal/open used by the WA
//! framing layer.
//!
//! # Examples
//!
//! ```rust
//! use wauth::{KeySet, SecureStream};
//!
//! let secret = [0x2au8; 20];
//! let challenge = b"\x00\x01\x02\x03";
//!
//! let keys = KeySet::derive(&secret, challenge);
//! let mut client = SecureStream::client(&keys);
//! let mut server = SecureStream::server(&keys);
//!
//! let sealed = client.seal(b"ping").unwrap();
//! assert_eq!(server.open(&sealed).unwrap(), b"ping");
//! ```
//!
//! You may look at the tests of `secure.rs` for examples of more advanced
//! usage.

use base64::{engine::general_purpose::STANDARD as Base64, Engine};

mod error;
pub mod keys;
pub mod rc4;
pub mod secure;

pub use crate::error::Error;
pub use crate::keys::KeySet;
pub use crate::secure::SecureStream;

/// The length of the shared secret and of every derived key, in bytes.
pub const SECRET_LEN: usize = 20;

/// The 20-byte shared secret delivered out-of-band by the registration
/// flow, typically as a base64 string.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_LEN]);

impl Secret {
    /// Wraps a raw 20-byte secret.
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Secret {
        Secret(bytes)
    }

    /// Decodes the base64 form handed out by the registration flow.
    pub fn from_base64(encoded: &str) -> Result<Secret, Error> {
        let bytes = Base64.decode(encoded)?;
        let bytes: [u8; SECRET_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::SecretLength(bytes.len()))?;
        Ok(Secret(bytes))
    }

    /// The raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    /// Never prints the key material.
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "Secret(…)")
    }
}

/// Builds the authentication response blob: the concatenation of the phone
/// number, the raw challenge and the decimal unix timestamp, sealed with
/// the freshly keyed outbound stream (ciphertext with the 4-byte MAC
/// appended). The `response` stanza carrying this blob is itself sent with
/// the framing-layer encryption flag clear.
pub fn auth_response(
    number: &str,
    challenge: &[u8],
    now_secs: u64,
    stream: &mut SecureStream,
) -> Result<Vec<u8>, Error> {
    let mut plain = Vec::with_capacity(number.len() + challenge.len() + 10);
    plain.extend_from_slice(number.as_bytes());
    plain.extend_from_slice(challenge);
    plain.extend_from_slice(now_secs.to_string().as_bytes());
    stream.seal(&plain)
}
