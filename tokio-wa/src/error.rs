use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::str::Utf8Error;

/// Top-level error type for a WA session.
#[derive(Debug)]
pub enum Error {
    /// I/O error on the underlying socket.
    Io(io::Error),
    /// Error establishing the TCP connection.
    Connection(ConnectorError),
    /// The peer violated the wire protocol.
    Protocol(ProtocolError),
    /// Frame authentication or encryption error; the connection has been
    /// torn down.
    Encryption(wauth::Error),
    /// The handshake was rejected.
    Auth(AuthError),
    /// The server sent a `stream:error`; the payload is the name of its
    /// first child element.
    Stream(String),
    /// The server answered a request/response operation with an error
    /// condition, or with a reply the caller could not interpret.
    Response(String),
    /// The stream end marker was received, or the socket closed.
    Disconnected,
    /// The connection is not in a state where this operation is possible.
    InvalidState,
    /// An argument was rejected before anything was sent.
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(fmt, "IO error: {}", e),
            Error::Connection(e) => write!(fmt, "connection error: {}", e),
            Error::Protocol(e) => write!(fmt, "protocol error: {}", e),
            Error::Encryption(e) => write!(fmt, "encryption error: {}", e),
            Error::Auth(e) => write!(fmt, "authentication error: {}", e),
            Error::Stream(kind) => write!(fmt, "stream error: {}", kind),
            Error::Response(condition) => write!(fmt, "error reply: {}", condition),
            Error::Disconnected => write!(fmt, "disconnected"),
            Error::InvalidState => write!(fmt, "invalid client state"),
            Error::InvalidArgument(what) => write!(fmt, "invalid argument: {}", what),
        }
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConnectorError> for Error {
    fn from(e: ConnectorError) -> Self {
        Error::Connection(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<wauth::Error> for Error {
    fn from(e: wauth::Error) -> Self {
        Error::Encryption(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

/// Error establishing the TCP connection.
#[derive(Debug)]
pub enum ConnectorError {
    /// All attempts against all candidate host/port pairs failed.
    AllFailed,
}

impl StdError for ConnectorError {}

impl fmt::Display for ConnectorError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectorError::AllFailed => write!(fmt, "all connection attempts failed"),
        }
    }
}

/// Wire-protocol violations seen by the codec. All of these are fatal to
/// the session.
#[derive(Debug)]
pub enum ProtocolError {
    /// A list started with a lead byte that is not a list opcode.
    InvalidListLead(u8),
    /// A string started with a lead byte that is not a string opcode.
    InvalidStringLead(u8),
    /// A token index outside the token table was referenced.
    UnknownToken(u16),
    /// A name or attribute string was not valid UTF-8.
    Utf8(Utf8Error),
    /// The frame payload ended in the middle of a structure.
    Truncated,
    /// A stanza carried both a byte payload and children; the wire form
    /// has a single trailing slot.
    PayloadAndChildren,
    /// A list was too long for the 2-byte length form.
    ListTooLong(usize),
    /// An encoded frame exceeded the 20-bit length field.
    FrameTooLong(usize),
    /// An encrypted frame arrived before the session keys were derived.
    EncryptedWithoutKeys,
    /// A stream start or end marker appeared where a stanza was expected.
    UnexpectedStreamMarker,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::InvalidListLead(b) => write!(fmt, "unknown list opcode 0x{:02x}", b),
            ProtocolError::InvalidStringLead(b) => {
                write!(fmt, "unknown string opcode 0x{:02x}", b)
            }
            ProtocolError::UnknownToken(index) => write!(fmt, "unknown token 0x{:02x}", index),
            ProtocolError::Utf8(e) => write!(fmt, "invalid UTF-8: {}", e),
            ProtocolError::Truncated => write!(fmt, "truncated frame payload"),
            ProtocolError::PayloadAndChildren => {
                write!(fmt, "stanza has both a byte payload and children")
            }
            ProtocolError::ListTooLong(len) => write!(fmt, "list of {} elements too long", len),
            ProtocolError::FrameTooLong(len) => write!(fmt, "frame of {} bytes too long", len),
            ProtocolError::EncryptedWithoutKeys => {
                write!(fmt, "encrypted frame before key derivation")
            }
            ProtocolError::UnexpectedStreamMarker => {
                write!(fmt, "stream marker where a stanza was expected")
            }
        }
    }
}

impl StdError for ProtocolError {}

impl From<Utf8Error> for ProtocolError {
    fn from(e: Utf8Error) -> Self {
        ProtocolError::Utf8(e)
    }
}

/// Authentication error during the handshake.
#[derive(Debug)]
pub enum AuthError {
    /// The server answered with a `failure` stanza; the payload is the
    /// name of its first child element.
    Failure(String),
    /// The `challenge` stanza carried no challenge bytes.
    NoChallenge,
}

impl fmt::Display for AuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::Failure(condition) => write!(fmt, "login failed: {}", condition),
            AuthError::NoChallenge => write!(fmt, "challenge stanza without challenge data"),
        }
    }
}

impl StdError for AuthError {}
