// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_wa::{ns, unix_time, Node};

use crate::{Agent, Error};

/// Answers a receipt request on an inbound message with a read receipt.
/// Messages without a receipt request, or with auto-receipts disabled,
/// are left alone.
pub(crate) async fn acknowledge(agent: &mut Agent, stanza: &Node) -> Result<(), Error> {
    if !agent.auto_receipt {
        return Ok(());
    }
    let requested = stanza
        .child("request")
        .map(|request| request.attr("xmlns") == Some(ns::RECEIPTS))
        .unwrap_or(false);
    if !requested {
        return Ok(());
    }
    let (from, id) = match (stanza.attr("from"), stanza.attr("id")) {
        (Some(from), Some(id)) => (from, id),
        _ => return Ok(()),
    };

    let receipt = Node::builder("receipt")
        .attr("to", from)
        .attr("id", id)
        .attr("type", "read")
        .attr("t", unix_time().to_string())
        .build();
    agent.send(receipt).await
}
