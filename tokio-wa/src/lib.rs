//! WA binary chat protocol implementation with asynchronous I/O using Tokio.
//!
//! The wire format is an XMPP-derived, token-compressed binary encoding
//! carried over a single long-lived TCP connection. Confidentiality is
//! provided by the RC4+HMAC framing layer (see the `wauth` crate), not by
//! TLS.

#![deny(unsafe_code, missing_docs, bare_trait_objects)]

mod client;
pub mod connect;
mod error;
pub mod tokens;
mod wa_codec;

pub use crate::client::{unix_time, AccountInfo, Client, Config};
pub use crate::error::{AuthError, ConnectorError, Error, ProtocolError};
pub use crate::wa_codec::{Packet, WaCodec};

// Re-exports
pub use wa_jid::{Jid, JidParseError, CHAT_SERVER, GROUP_SERVER};
pub use wa_node::Node;
pub use wauth::Secret;

/// Namespaces the protocol vocabulary draws on.
pub mod ns {
    /// SASL-like authentication stanzas (`auth`, `challenge`, `response`,
    /// `success`, `failure`).
    pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
    /// Delivery receipt requests and acknowledgements.
    pub const RECEIPTS: &str = "urn:xmpp:receipts";
    /// Peer-specific message metadata (`notify`).
    pub const WHATSAPP: &str = "urn:xmpp:whatsapp";
    /// Media message payloads.
    pub const MMS: &str = "urn:xmpp:whatsapp:mms";
    /// Dirty-state cleanup.
    pub const DIRTY: &str = "urn:xmpp:whatsapp:dirty";
    /// Last-seen queries.
    pub const LAST: &str = "jabber:iq:last";
    /// Server event wrapper on outgoing messages.
    pub const EVENT: &str = "jabber:x:event";
    /// Chat state notifications (`composing`, `paused`, …).
    pub const CHATSTATES: &str = "http://jabber.org/protocol/chatstates";
    /// Ping iq payloads.
    pub const PING: &str = "w:p";
}
