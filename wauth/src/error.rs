use hmac::digest::InvalidLength;
use std::error::Error as StdError;
use std::fmt;

/// A wauth error.
#[derive(Debug)]
pub enum Error {
    /// The 4-byte MAC trailer of an inbound frame did not match. The
    /// connection carrying the frame must be torn down.
    MacMismatch,
    /// The MAC key was rejected by the HMAC implementation.
    Hmac(InvalidLength),
    /// The base64 form of the shared secret could not be decoded.
    Base64(base64::DecodeError),
    /// The decoded shared secret was not exactly 20 bytes long.
    SecretLength(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MacMismatch => write!(fmt, "message authentication code mismatch"),
            Error::Hmac(e) => write!(fmt, "HMAC error: {}", e),
            Error::Base64(e) => write!(fmt, "base64 error: {}", e),
            Error::SecretLength(len) => {
                write!(fmt, "secret is {} bytes long, expected 20", len)
            }
        }
    }
}

impl StdError for Error {}

impl From<InvalidLength> for Error {
    fn from(e: InvalidLength) -> Error {
        Error::Hmac(e)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Error {
        Error::Base64(e)
    }
}
