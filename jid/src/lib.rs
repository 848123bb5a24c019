// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(missing_docs)]

//! Provides a type for WA chat addresses.
//!
//! A JID is an identity of the form `user@server`, where the server is one
//! of the chat server (single contacts) or the group server (group chats).
//! On the wire a JID is encoded compactly as a two-string composite; this
//! crate only deals with the logical form.
//!
//! For usage, check the documentation on the `Jid` struct.

use std::fmt;
use std::str::FromStr;

use memchr::memchr;

mod error;
pub use crate::error::JidParseError;

/// The server hosting single contacts.
pub const CHAT_SERVER: &str = "s.whatsapp.net";

/// The server hosting group chats.
pub const GROUP_SERVER: &str = "g.us";

/// A WA chat address.
///
/// The user part may be absent: the servers themselves are addressed with a
/// bare server JID, and the wire format has a null-user marker for exactly
/// this case.
///
/// # Examples
///
/// ```
/// use wa_jid::Jid;
/// # use wa_jid::JidParseError;
///
/// # fn main() -> Result<(), JidParseError> {
/// let jid = Jid::from_target("15551234567")?;
/// assert_eq!(jid.to_string(), "15551234567@s.whatsapp.net");
///
/// let group = Jid::from_target("15551234567-1381234567")?;
/// assert_eq!(group.server(), "g.us");
/// assert!(group.is_group());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Jid {
    user: Option<String>,
    server: String,
}

impl Jid {
    /// Constructs a JID from an optional user and a server.
    pub fn new<U: Into<String>, S: Into<String>>(user: Option<U>, server: S) -> Jid {
        Jid {
            user: user.map(Into::into),
            server: server.into(),
        }
    }

    /// Constructs a single-contact JID on the chat server.
    pub fn user<U: Into<String>>(user: U) -> Jid {
        Jid::new(Some(user), CHAT_SERVER)
    }

    /// Constructs a group JID on the group server.
    pub fn group<G: Into<String>>(group: G) -> Jid {
        Jid::new(Some(group), GROUP_SERVER)
    }

    /// Constructs a bare server JID.
    pub fn server_only<S: Into<String>>(server: S) -> Jid {
        Jid::new(None::<String>, server)
    }

    /// Normalizes a caller-supplied target into a JID.
    ///
    /// A target containing `@` is taken verbatim; a target containing `-`
    /// is a group id; anything else is a phone number on the chat server.
    pub fn from_target(target: &str) -> Result<Jid, JidParseError> {
        if target.is_empty() {
            return Err(JidParseError::Empty);
        }
        if memchr(b'@', target.as_bytes()).is_some() {
            target.parse()
        } else if memchr(b'-', target.as_bytes()).is_some() {
            Ok(Jid::group(target))
        } else {
            Ok(Jid::user(target))
        }
    }

    /// The user part, if present.
    pub fn user_part(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The server part.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Whether this JID addresses a group chat.
    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    /// Parses an explicit `user@server` string. An empty user part is
    /// accepted and maps to the null user, mirroring the wire format.
    fn from_str(s: &str) -> Result<Jid, JidParseError> {
        let at = memchr(b'@', s.as_bytes()).ok_or(JidParseError::NoServer)?;
        let (user, server) = (&s[..at], &s[at + 1..]);
        if server.is_empty() {
            return Err(JidParseError::EmptyServer);
        }
        let user = if user.is_empty() { None } else { Some(user) };
        Ok(Jid::new(user, server))
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.user {
            Some(ref user) => write!(fmt, "{}@{}", user, self.server),
            None => write!(fmt, "{}", self.server),
        }
    }
}

impl From<Jid> for String {
    fn from(jid: Jid) -> String {
        jid.to_string()
    }
}
