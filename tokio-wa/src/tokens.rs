//! The fixed token table of the wire format.
//!
//! Common protocol strings are compressed into one-byte opcodes (indices
//! `0x00..=0xF4`) or a two-byte secondary escape (`0xFE` plus an offset
//! from [`SECONDARY_BASE`]). The table contents are part of the protocol
//! contract and must match the peer byte-for-byte; empty slots are
//! reserved and never emitted.

use std::collections::HashMap;
use std::sync::OnceLock;

/// First token index addressed through the two-byte secondary escape.
pub const SECONDARY_BASE: u16 = 0xF5;

/// The token table. Index is the wire opcode.
pub static TOKENS: [&str; 246] = [
    "",
    "",
    "",
    "",
    "",
    "1",
    "1.0",
    "ack",
    "action",
    "active",
    "add",
    "all",
    "allow",
    "apple",
    "audio",
    "auth",
    "author",
    "available",
    "bad-request",
    "basee64",
    "Bell.caf",
    "bind",
    "body",
    "Boing.caf",
    "broadcast",
    "cancel",
    "category",
    "challenge",
    "chat",
    "clean",
    "code",
    "composing",
    "config",
    "conflict",
    "contacts",
    "count",
    "create",
    "creation",
    "debug",
    "default",
    "delay",
    "delete",
    "delivered",
    "delivery",
    "deny",
    "digest",
    "DIGEST-MD5-1",
    "DIGEST-MD5-2",
    "dirty",
    "duplicate",
    "elapsed",
    "enable",
    "encoding",
    "error",
    "event",
    "expiration",
    "expired",
    "fail",
    "failure",
    "False",
    "favorites",
    "feature",
    "features",
    "field",
    "first",
    "free",
    "from",
    "g.us",
    "get",
    "Glass.caf",
    "google",
    "group",
    "groups",
    "g_notify",
    "g_sound",
    "Harp.caf",
    "http://etherx.jabber.org/streams",
    "http://jabber.org/protocol/chatstates",
    "ib",
    "id",
    "image",
    "img",
    "inactive",
    "index",
    "internal-server-error",
    "invalid-mechanism",
    "ip",
    "iq",
    "item",
    "item-not-found",
    "jabber:iq:last",
    "jabber:iq:privacy",
    "jabber:x:delay",
    "jabber:x:event",
    "jid",
    "jid-malformed",
    "kind",
    "last",
    "latitude",
    "lc",
    "leave",
    "leave-all",
    "lg",
    "li",
    "list",
    "location",
    "longitude",
    "max",
    "max_groups",
    "max_participants",
    "max_subject",
    "mechanism",
    "media",
    "message",
    "message_acks",
    "method",
    "microsoft",
    "missing",
    "modify",
    "mute",
    "name",
    "nokia",
    "none",
    "not-acceptable",
    "not-allowed",
    "not-authorized",
    "notify",
    "off",
    "offline",
    "order",
    "owner",
    "owning",
    "paid",
    "participant",
    "participants",
    "participating",
    "password",
    "paused",
    "picture",
    "pin",
    "ping",
    "platform",
    "pop_mean_time",
    "pop_plus_minus",
    "port",
    "presence",
    "preview",
    "probe",
    "proceed",
    "prop",
    "props",
    "p_o",
    "p_t",
    "query",
    "raw",
    "reason",
    "receipt",
    "receipt_acks",
    "received",
    "record",
    "registration",
    "relay",
    "remote-server-timeout",
    "remove",
    "Replaced by new connection",
    "request",
    "required",
    "resource",
    "resource-constraint",
    "response",
    "result",
    "retry",
    "rim",
    "s.whatsapp.net",
    "s.us",
    "seconds",
    "server",
    "server-error",
    "service-unavailable",
    "set",
    "show",
    "sid",
    "silent",
    "sound",
    "stamp",
    "stat",
    "status",
    "stream:error",
    "stream:features",
    "subject",
    "subscribe",
    "success",
    "sync",
    "system-shutdown",
    "s_o",
    "s_t",
    "t",
    "text",
    "timeout",
    "TimePassing.caf",
    "timestamp",
    "to",
    "Tri-tone.caf",
    "true",
    "type",
    "unavailable",
    "unsubscribe",
    "uri",
    "url",
    "urn:ietf:params:xml:ns:xmpp-sasl",
    "urn:ietf:params:xml:ns:xmpp-stanzas",
    "urn:ietf:params:xml:ns:xmpp-streams",
    "urn:xmpp:delay",
    "urn:xmpp:ping",
    "urn:xmpp:receipts",
    "urn:xmpp:whatsapp",
    "urn:xmpp:whatsapp:account",
    "urn:xmpp:whatsapp:dirty",
    "urn:xmpp:whatsapp:mms",
    "urn:xmpp:whatsapp:push",
    "user",
    "username",
    "value",
    "vcard",
    "version",
    "video",
    "w",
    "w:g",
    "wait",
    "WAUTH-1",
    "WAUTH-2",
    "web",
    "x",
    "xml-not-well-formed",
    "xmlns",
    "xmlns:stream",
    "Xylophone.caf",
    "w:p",
    "w:profile:picture",
    "notification",
    "",
    "",
    "",
    "",
    "",
    "XXX",
];

static REVERSE: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();

fn reverse() -> &'static HashMap<&'static str, u16> {
    REVERSE.get_or_init(|| {
        let mut map = HashMap::with_capacity(TOKENS.len());
        for (index, token) in TOKENS.iter().enumerate() {
            if !token.is_empty() {
                map.entry(*token).or_insert(index as u16);
            }
        }
        map
    })
}

/// Converts a string to a token index. Returns `None` if the string is not
/// a token; the codec then emits it as literal bytes.
pub fn str2tok(string: &str) -> Option<u16> {
    reverse().get(string).copied()
}

/// Converts a token index to a string. Returns `None` for out-of-range
/// indices; a frame referencing one is malformed. Reserved slots decode as
/// the empty string.
pub fn tok2str(index: u16) -> Option<&'static str> {
    TOKENS.get(index as usize).copied()
}
