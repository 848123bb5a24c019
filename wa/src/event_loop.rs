// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The network pump: bounded poll steps, auto-replies, callback dispatch.

use std::time::Duration;

use futures::StreamExt;
use log::debug;
use tokio::time::timeout;
use tokio_wa::Node;

use crate::callbacks::CallbackRef;
use crate::{iq, message, Agent, Error};

/// Socket poll bound for one pump iteration.
pub(crate) const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Idle time after which a keep-alive presence goes out.
pub(crate) const ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// One pump iteration: keep-alive check, then at most [`POLL_TIMEOUT`]
/// waiting for one inbound stanza, which is auto-answered where the
/// protocol asks for it and then dispatched to the registry.
pub(crate) async fn service_once(agent: &mut Agent) -> Result<(), Error> {
    if agent.idle_for() >= ALIVE_INTERVAL {
        agent.keep_alive().await?;
    }

    let stanza = match timeout(POLL_TIMEOUT, agent.client.next()).await {
        Err(_) => return Ok(()), // nothing arrived this tick
        Ok(None) => return Err(Error::Disconnected),
        Ok(Some(stanza)) => stanza?,
    };
    handle_stanza(agent, stanza).await
}

async fn handle_stanza(agent: &mut Agent, stanza: Node) -> Result<(), Error> {
    match stanza.name() {
        "iq" => iq::handle_iq(agent, &stanza).await?,
        "message" => message::receive::acknowledge(agent, &stanza).await?,
        "ib" => handle_ib(agent, &stanza).await?,
        "notification" => acknowledge_notification(agent, &stanza).await?,
        "stream:error" => {
            let condition = stanza
                .children()
                .first()
                .map(|child| child.name().to_string())
                .unwrap_or_default();
            return Err(Error::Stream(condition));
        }
        _ => {}
    }
    agent.registry.dispatch(&stanza);
    Ok(())
}

/// In-band markers delivered right after login: `dirty` categories are
/// acknowledged with a `clean` iq, `offline` counts are ignored.
async fn handle_ib(agent: &mut Agent, stanza: &Node) -> Result<(), Error> {
    for child in stanza.children() {
        match child.name() {
            "dirty" => {
                let id = agent.client.make_id("cleardirty");
                let clean = iq::clean_dirty(&id, child.attr("type"));
                agent.send(clean).await?;
            }
            "offline" => debug!("ignoring offline marker"),
            other => debug!("ignoring ib child {}", other),
        }
    }
    Ok(())
}

/// Notifications are acknowledged unconditionally, echoing the addressing
/// attributes back at the server.
async fn acknowledge_notification(agent: &mut Agent, stanza: &Node) -> Result<(), Error> {
    let mut ack = Node::new("ack");
    ack.set_attr("class", "notification");
    if let Some(from) = stanza.attr("from") {
        ack.set_attr("to", from);
    }
    if let Some(to) = stanza.attr("to") {
        ack.set_attr("from", to);
    }
    if let Some(id) = stanza.attr("id") {
        ack.set_attr("id", id);
    }
    if let Some(type_) = stanza.attr("type") {
        ack.set_attr("type", type_);
    }
    if let Some(participant) = stanza.attr("participant") {
        ack.set_attr("participant", participant);
    }
    agent.send(ack).await
}

/// Pumps until the record has been called, then unregisters it and
/// returns (or re-raises) its result.
pub(crate) async fn wait_for(agent: &mut Agent, callback: CallbackRef) -> Result<Node, Error> {
    while agent.registry.called(callback) == 0 {
        service_once(agent).await?;
    }
    agent
        .registry
        .unregister(callback)
        .unwrap_or(Err(Error::InvalidState))
}

/// Pumps until any of the records has been called; unregisters all of
/// them and returns the first caller's result.
pub(crate) async fn wait_for_any(
    agent: &mut Agent,
    callbacks: &[CallbackRef],
) -> Result<Node, Error> {
    let fired = loop {
        match callbacks
            .iter()
            .find(|callback| agent.registry.called(**callback) > 0)
        {
            Some(callback) => break *callback,
            None => service_once(agent).await?,
        }
    };

    let mut result = None;
    for callback in callbacks {
        let taken = agent.registry.unregister(*callback);
        if *callback == fired {
            result = taken;
        }
    }
    result.unwrap_or(Err(Error::InvalidState))
}
