// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(bare_trait_objects)]

//! High-level WA chat client: connection management, a callback registry
//! over inbound stanzas, and the send operations of the protocol.

pub use tokio_wa::{AccountInfo, Jid, Node, CHAT_SERVER, GROUP_SERVER};

pub mod agent;
pub mod builder;
pub mod callbacks;
pub mod event_loop;
pub mod iq;
pub mod message;
pub mod presence;

// Module re-exports
pub use agent::Agent;
pub use builder::ClientBuilder;
pub use callbacks::{CallbackRef, Filter, MediaKind, MessageFilter, Registry};
pub use presence::{ChatState, PresenceMode};

pub type Error = tokio_wa::Error;
