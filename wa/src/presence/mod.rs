// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Presence modes and conversation chat states.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Connection-level presence announced with a `presence` stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    /// Online and reachable.
    Available,
    /// Gone offline.
    Unavailable,
    /// Actively using the client; also the keep-alive presence.
    Active,
    /// Idle.
    Inactive,
}

impl PresenceMode {
    /// The wire value of the presence `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceMode::Available => "available",
            PresenceMode::Unavailable => "unavailable",
            PresenceMode::Active => "active",
            PresenceMode::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PresenceMode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for PresenceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<PresenceMode, Error> {
        match s {
            "available" => Ok(PresenceMode::Available),
            "unavailable" => Ok(PresenceMode::Unavailable),
            "active" => Ok(PresenceMode::Active),
            "inactive" => Ok(PresenceMode::Inactive),
            other => Err(Error::InvalidArgument(format!(
                "unknown presence mode {:?}",
                other
            ))),
        }
    }
}

/// Conversation-level chat state, sent inside a `message` stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// Paying attention to the conversation.
    Active,
    /// Not paying attention.
    Inactive,
    /// Typing.
    Composing,
    /// Stopped typing.
    Paused,
    /// Left the conversation.
    Gone,
}

impl ChatState {
    /// The wire name of the chat state element.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Active => "active",
            ChatState::Inactive => "inactive",
            ChatState::Composing => "composing",
            ChatState::Paused => "paused",
            ChatState::Gone => "gone",
        }
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for ChatState {
    type Err = Error;

    fn from_str(s: &str) -> Result<ChatState, Error> {
        match s {
            "active" => Ok(ChatState::Active),
            "inactive" => Ok(ChatState::Inactive),
            "composing" => Ok(ChatState::Composing),
            "paused" => Ok(ChatState::Paused),
            "gone" => Ok(ChatState::Gone),
            other => Err(Error::InvalidArgument(format!(
                "unknown chat state {:?}",
                other
            ))),
        }
    }
}
