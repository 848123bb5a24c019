// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The high-level client agent: send operations, callback registration
//! and the blocking wait primitives.

use std::time::{Duration, Instant};

use tokio_wa::{ns, unix_time, AccountInfo, Client, Jid, Node};

use crate::callbacks::{CallbackRef, Filter, Registry};
use crate::{event_loop, iq, message, ChatState, Error, PresenceMode};

/// Attributes accepted on an audio media message.
const AUDIO_ATTRS: [&str; 8] = [
    "abitrate",
    "acodec",
    "asampfmt",
    "asampfreq",
    "duration",
    "encoding",
    "filehash",
    "mimetype",
];

/// A logged-in WA client.
///
/// The agent owns the connection, the callback registry and the
/// keep-alive timer. All protocol state is single-owner: the pump methods
/// ([`Agent::service_once`], [`Agent::service_loop`], [`Agent::wait_for`])
/// take `&mut self` and are the only suspension points.
pub struct Agent {
    pub(crate) client: Client,
    pub(crate) registry: Registry,
    pub(crate) nickname: String,
    pub(crate) number: String,
    pub(crate) auto_receipt: bool,
    pub(crate) last_write: Instant,
}

impl Agent {
    pub(crate) fn new(client: Client, nickname: String, number: String, auto_receipt: bool) -> Agent {
        Agent {
            client,
            registry: Registry::new(),
            nickname,
            number,
            auto_receipt,
            last_write: Instant::now(),
        }
    }

    /// The account attributes reported by the server at login.
    pub fn account_info(&self) -> &AccountInfo {
        self.client.account_info()
    }

    /// Sends a raw stanza, resetting the keep-alive timer.
    pub async fn send(&mut self, stanza: Node) -> Result<(), Error> {
        self.last_write = Instant::now();
        self.client.send_stanza(stanza).await
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_write.elapsed()
    }

    pub(crate) async fn keep_alive(&mut self) -> Result<(), Error> {
        self.presence(PresenceMode::Active).await
    }

    /// Sends a text message to a contact; returns the message id.
    pub async fn message(&mut self, to: &str, text: &str) -> Result<String, Error> {
        let to = target(to)?;
        let body = Node::builder("body").data(text.as_bytes().to_vec()).build();
        self.send_wrapped(to, body, false).await
    }

    /// Sends a text message to a group; returns the message id.
    pub async fn group_message(&mut self, group: &str, text: &str) -> Result<String, Error> {
        let to = if group.contains('@') {
            target(group)?
        } else {
            Jid::group(group)
        };
        let body = Node::builder("body").data(text.as_bytes().to_vec()).build();
        self.send_wrapped(to, body, false).await
    }

    /// Announces a conversation chat state to a contact.
    pub async fn chatstate(&mut self, to: &str, state: ChatState) -> Result<(), Error> {
        let to = target(to)?;
        let id = self.client.make_id("message");
        let stanza = Node::builder("message")
            .attr("type", "chat")
            .attr("id", id)
            .attr("to", to.to_string())
            .append(
                Node::builder(state.as_str())
                    .attr("xmlns", ns::CHATSTATES)
                    .build(),
            )
            .build();
        self.send(stanza).await
    }

    /// Announces a connection-level presence.
    pub async fn presence(&mut self, mode: PresenceMode) -> Result<(), Error> {
        let mut stanza = Node::new("presence");
        stanza.set_attr("type", mode.as_str());
        if mode == PresenceMode::Available {
            stanza.set_attr("name", self.nickname.clone());
        }
        self.send(stanza).await
    }

    /// Sends an image notification; the image itself must already be
    /// uploaded at a publicly reachable URL. Returns the message id.
    pub async fn image(
        &mut self,
        to: &str,
        url: &str,
        filename: &str,
        size: u64,
        thumbnail: Option<Vec<u8>>,
    ) -> Result<String, Error> {
        let to = target(to)?;
        let media = Node::builder("media")
            .attr("xmlns", ns::MMS)
            .attr("type", "image")
            .attr("url", url)
            .attr("file", filename)
            .attr("size", size.to_string());
        let media = match thumbnail {
            Some(bytes) => media.data(bytes),
            None => media,
        };
        self.send_wrapped(to, media.build(), true).await
    }

    /// Sends an audio notification. `attrs` is a set of optional codec
    /// attributes; unknown ones are rejected before anything is sent.
    pub async fn audio(
        &mut self,
        to: &str,
        url: &str,
        filename: &str,
        size: u64,
        attrs: &[(&str, &str)],
    ) -> Result<String, Error> {
        for (key, _) in attrs {
            if !AUDIO_ATTRS.contains(key) {
                return Err(Error::InvalidArgument(format!(
                    "unknown audio attribute {:?}",
                    key
                )));
            }
        }
        let to = target(to)?;
        let mut media = Node::builder("media")
            .attr("xmlns", ns::MMS)
            .attr("type", "audio")
            .attr("url", url)
            .attr("file", filename)
            .attr("size", size.to_string());
        for (key, value) in attrs {
            media = media.attr(*key, *value);
        }
        self.send_wrapped(to, media.build(), true).await
    }

    /// Sends a location update to a contact; returns the message id.
    pub async fn location(&mut self, to: &str, latitude: f64, longitude: f64) -> Result<String, Error> {
        let to = target(to)?;
        let media = Node::builder("media")
            .attr("xmlns", ns::MMS)
            .attr("type", "location")
            .attr("latitude", latitude.to_string())
            .attr("longitude", longitude.to_string())
            .build();
        self.send_wrapped(to, media, true).await
    }

    /// Sends a contact card; returns the message id.
    pub async fn vcard(&mut self, to: &str, name: &str, data: Vec<u8>) -> Result<String, Error> {
        let to = target(to)?;
        let media = Node::builder("media")
            .attr("xmlns", ns::MMS)
            .attr("type", "vcard")
            .append(Node::builder("vcard").attr("name", name).data(data).build())
            .build();
        self.send_wrapped(to, media, true).await
    }

    /// Asks the server how many seconds ago a contact was last seen.
    /// Blocks on the pump until the reply arrives.
    pub async fn last_seen(&mut self, number: &str) -> Result<u64, Error> {
        let id = self.client.make_id("lastseen");
        let query = iq::last_seen_query(&id, &self.number, number);
        self.send(query).await?;

        let expected = id;
        let callback = self.registry.register_with_action(
            Filter::stanza("iq", move |stanza: &Node| {
                stanza.attr("id") == Some(expected.as_str())
            }),
            |stanza: &Node| match stanza.attr("type") {
                Some("error") => {
                    let condition = stanza
                        .child("error")
                        .and_then(|error| error.children().first())
                        .map(|child| child.name().to_string())
                        .unwrap_or_default();
                    Err(Error::Response(condition))
                }
                _ => Ok(stanza.clone()),
            },
        );

        let reply = self.wait_for(callback).await?;
        reply
            .child("query")
            .and_then(|query| query.attr("seconds"))
            .and_then(|seconds| seconds.parse().ok())
            .ok_or_else(|| Error::Response(String::from("malformed last seen reply")))
    }

    /// Registers a callback whose result is the matched stanza.
    pub fn register(&mut self, filter: Filter) -> CallbackRef {
        self.registry.register(filter)
    }

    /// Registers a callback with an explicit action.
    pub fn register_with_action<A>(&mut self, filter: Filter, action: A) -> CallbackRef
    where
        A: FnMut(&Node) -> Result<Node, Error> + Send + 'static,
    {
        self.registry.register_with_action(filter, action)
    }

    /// Removes a callback without waiting for it.
    pub fn unregister(&mut self, callback: CallbackRef) {
        self.registry.unregister(callback);
    }

    /// Pumps the connection until the callback fires, unregisters it and
    /// returns its result. A fatal connection error unwinds through here.
    pub async fn wait_for(&mut self, callback: CallbackRef) -> Result<Node, Error> {
        event_loop::wait_for(self, callback).await
    }

    /// Like [`Agent::wait_for`], but returns as soon as any one of the
    /// callbacks fires; all of them are unregistered.
    pub async fn wait_for_any(&mut self, callbacks: &[CallbackRef]) -> Result<Node, Error> {
        event_loop::wait_for_any(self, callbacks).await
    }

    /// Drives one pump iteration: keep-alive, one bounded socket poll,
    /// auto-replies and callback dispatch.
    pub async fn service_once(&mut self) -> Result<(), Error> {
        event_loop::service_once(self).await
    }

    /// Pumps forever; only returns with the fatal error that ended the
    /// session.
    pub async fn service_loop(&mut self) -> Result<(), Error> {
        loop {
            self.service_once().await?;
        }
    }

    /// Ends the session by sending the stream end marker.
    pub async fn disconnect(self) -> Result<(), Error> {
        self.client.end().await
    }

    async fn send_wrapped(&mut self, to: Jid, payload: Node, media: bool) -> Result<String, Error> {
        let id = self.client.make_id("message");
        let stanza = message::send::wrap(&id, &to, unix_time(), &self.nickname, payload, media);
        self.send(stanza).await?;
        Ok(id)
    }
}

fn target(to: &str) -> Result<Jid, Error> {
    Jid::from_target(to).map_err(|e| Error::InvalidArgument(e.to_string()))
}
