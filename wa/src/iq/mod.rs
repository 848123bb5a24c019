// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Iq handling: ping replies, dirty-state cleanup, last-seen queries.

use log::debug;
use tokio_wa::{ns, Node, CHAT_SERVER};

use crate::{Agent, Error};

/// Auto-replies on inbound iq stanzas. Everything not handled here is
/// left to the callback registry (e.g. pending last-seen queries).
pub(crate) async fn handle_iq(agent: &mut Agent, stanza: &Node) -> Result<(), Error> {
    match stanza.attr("type") {
        Some("get") if stanza.has_child("ping") => {
            let mut reply = Node::new("iq");
            reply.set_attr("to", CHAT_SERVER);
            reply.set_attr("type", "result");
            if let Some(id) = stanza.attr("id") {
                reply.set_attr("id", id);
            }
            agent.send(reply).await?;
        }
        Some("result") if stanza.children().is_empty() => {
            debug!("ping acknowledged");
        }
        _ => debug!("iq left to callbacks: {}", stanza),
    }
    Ok(())
}

/// The iq asking the server when a contact was last seen.
pub(crate) fn last_seen_query(id: &str, own_number: &str, number: &str) -> Node {
    Node::builder("iq")
        .attr("type", "get")
        .attr("id", id)
        .attr("from", format!("{}@{}", own_number, CHAT_SERVER))
        .attr("to", format!("{}@{}", number, CHAT_SERVER))
        .append(Node::builder("query").attr("xmlns", ns::LAST).build())
        .build()
}

/// The iq acknowledging a `dirty` marker for one category.
pub(crate) fn clean_dirty(id: &str, category: Option<&str>) -> Node {
    let mut clean = Node::new("clean");
    clean.set_attr("xmlns", ns::DIRTY);
    if let Some(category) = category {
        clean.set_attr("type", category);
    }
    Node::builder("iq")
        .attr("type", "set")
        .attr("id", id)
        .attr("to", CHAT_SERVER)
        .append(clean)
        .build()
}
