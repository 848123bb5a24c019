// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Name-indexed, predicate-filtered callbacks over inbound stanzas.
//!
//! A callback record pairs a stanza-name filter with an action. On
//! dispatch, every record registered for the stanza's name whose predicate
//! matches runs its action, stores the result and bumps its call counter;
//! [`Agent::wait_for`](crate::Agent::wait_for) turns that into a blocking
//! request/response primitive.

use crate::Error;
use tokio_wa::Node;

/// A predicate over a stanza.
pub type Predicate = Box<dyn Fn(&Node) -> bool + Send>;

/// An action over a matched stanza. The returned stanza (usually a clone
/// of the input) or error becomes the record's result, which `wait_for`
/// hands back to the caller.
pub type Action = Box<dyn FnMut(&Node) -> Result<Node, Error> + Send>;

/// A stanza-name filter plus a predicate, ready for registration.
pub struct Filter {
    name: &'static str,
    predicate: Predicate,
}

impl Filter {
    /// A filter over stanzas with the given name.
    pub fn stanza<P>(name: &'static str, predicate: P) -> Filter
    where
        P: Fn(&Node) -> bool + Send + 'static,
    {
        Filter {
            name,
            predicate: Box::new(predicate),
        }
    }
}

/// Handle to a registered callback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackRef(usize);

struct Record {
    name: &'static str,
    predicate: Predicate,
    action: Action,
    called: u32,
    result: Option<Result<Node, Error>>,
}

/// The callback registry. Records fire in registration order.
#[derive(Default)]
pub struct Registry {
    records: Vec<Option<Record>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Registry {
        Registry {
            records: Vec::new(),
        }
    }

    /// Registers a filter whose action stores the matched stanza itself.
    pub fn register(&mut self, filter: Filter) -> CallbackRef {
        self.register_with_action(filter, |stanza: &Node| Ok(stanza.clone()))
    }

    /// Registers a filter with an explicit action.
    pub fn register_with_action<A>(&mut self, filter: Filter, action: A) -> CallbackRef
    where
        A: FnMut(&Node) -> Result<Node, Error> + Send + 'static,
    {
        self.records.push(Some(Record {
            name: filter.name,
            predicate: filter.predicate,
            action: Box::new(action),
            called: 0,
            result: None,
        }));
        CallbackRef(self.records.len() - 1)
    }

    /// Removes a record, returning its last result.
    pub fn unregister(&mut self, callback: CallbackRef) -> Option<Result<Node, Error>> {
        self.records
            .get_mut(callback.0)
            .and_then(Option::take)
            .and_then(|record| record.result)
    }

    /// How many times the record's action has run.
    pub fn called(&self, callback: CallbackRef) -> u32 {
        self.records
            .get(callback.0)
            .and_then(Option::as_ref)
            .map(|record| record.called)
            .unwrap_or(0)
    }

    /// Runs every matching record against the stanza, in registration
    /// order.
    pub fn dispatch(&mut self, stanza: &Node) {
        for record in self.records.iter_mut().flatten() {
            if record.name == stanza.name() && (record.predicate)(stanza) {
                record.result = Some((record.action)(stanza));
                record.called += 1;
            }
        }
    }
}

/// Options for the `message` callback family.
#[derive(Debug, Clone, Copy)]
pub struct MessageFilter {
    /// Match direct messages.
    pub single: bool,
    /// Match group messages (those carrying a `participant` attribute).
    pub group: bool,
    /// Match messages delivered from offline storage.
    pub offline: bool,
}

impl Default for MessageFilter {
    fn default() -> MessageFilter {
        MessageFilter {
            single: true,
            group: false,
            offline: false,
        }
    }
}

impl MessageFilter {
    fn matches(&self, stanza: &Node) -> bool {
        if stanza.attr("participant").is_some() {
            if !self.group {
                return false;
            }
        } else if !self.single {
            return false;
        }
        if stanza.has_child("offline") && !self.offline {
            return false;
        }
        true
    }
}

/// Media payload kinds for the `media_message` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Vcard,
    Location,
}

impl MediaKind {
    /// The wire value of the media `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Vcard => "vcard",
            MediaKind::Location => "location",
        }
    }
}

/// Matches any stanza of the registered name.
pub fn any() -> impl Fn(&Node) -> bool + Send {
    |_: &Node| true
}

/// Matches the `success` stanza ending the handshake.
pub fn login_success() -> Filter {
    Filter::stanza("success", any())
}

/// Matches the `failure` stanza ending the handshake.
pub fn login_failure() -> Filter {
    Filter::stanza("failure", any())
}

/// Matches presence changes; `online` selects presences without an
/// `unavailable` type, `offline` the ones with it.
pub fn presence(online: bool, offline: bool) -> Filter {
    Filter::stanza("presence", move |stanza: &Node| {
        if stanza.attr("type") == Some("unavailable") {
            offline
        } else {
            online
        }
    })
}

/// Matches chat state notifications carried in `message` stanzas whose
/// first child is `composing` or `paused`.
pub fn chatstate(composing: bool, paused: bool) -> Filter {
    Filter::stanza("message", move |stanza: &Node| {
        match stanza.children().first().map(Node::name) {
            Some("composing") => composing,
            Some("paused") => paused,
            _ => false,
        }
    })
}

/// Matches notifications about someone joining a group.
pub fn group_joined() -> Filter {
    Filter::stanza("notification", |stanza: &Node| stanza.has_child("add"))
}

/// Matches notifications about someone leaving a group.
pub fn group_left() -> Filter {
    Filter::stanza("notification", |stanza: &Node| stanza.has_child("remove"))
}

/// Matches notifications about a changed group subject or picture.
pub fn group_changed() -> Filter {
    Filter::stanza("notification", |stanza: &Node| {
        matches!(stanza.attr("type"), Some("subject") | Some("picture"))
    })
}

/// Matches `message` stanzas per the given options.
pub fn message(filter: MessageFilter) -> Filter {
    Filter::stanza("message", move |stanza: &Node| filter.matches(stanza))
}

/// Matches text messages: `type="text"` with a `body` child.
pub fn text_message(filter: MessageFilter) -> Filter {
    Filter::stanza("message", move |stanza: &Node| {
        stanza.attr("type") == Some("text") && stanza.has_child("body") && filter.matches(stanza)
    })
}

/// Matches media messages: `type="media"` with a `media` child. An empty
/// kind list matches every media kind.
pub fn media_message(filter: MessageFilter, kinds: &[MediaKind]) -> Filter {
    let kinds = kinds.to_vec();
    Filter::stanza("message", move |stanza: &Node| {
        if stanza.attr("type") != Some("media") || !filter.matches(stanza) {
            return false;
        }
        let media = match stanza.child("media") {
            Some(media) => media,
            None => return false,
        };
        kinds.is_empty()
            || kinds
                .iter()
                .any(|kind| media.attr("type") == Some(kind.as_str()))
    })
}

/// Matches contact sync results: `iq` stanzas with a `sync` child.
pub fn sync_result() -> Filter {
    Filter::stanza("iq", |stanza: &Node| stanza.has_child("sync"))
}
