// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::error::Error as StdError;
use std::fmt;

/// An error that signifies that a `Jid` cannot be parsed from a string.
#[derive(Debug, PartialEq, Eq)]
pub enum JidParseError {
    /// Happens when there is no server, that is the string contains no `@`
    /// where one was required.
    NoServer,

    /// Happens when the server part is empty, that is the string ends
    /// with a `@`.
    EmptyServer,

    /// Happens when the whole target string is empty.
    Empty,
}

impl StdError for JidParseError {}

impl fmt::Display for JidParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                JidParseError::NoServer => "no server found in this JID",
                JidParseError::EmptyServer => "server empty despite the presence of a @",
                JidParseError::Empty => "empty target string",
            }
        )
    }
}
