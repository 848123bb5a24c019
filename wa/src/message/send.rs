// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_wa::{ns, Jid, Node};

/// Wraps a payload node (`body` or `media`) into the outgoing message
/// envelope: the server-event marker, the sender notify element and the
/// receipt request, then the payload itself.
pub(crate) fn wrap(
    id: &str,
    to: &Jid,
    timestamp: u64,
    nickname: &str,
    payload: Node,
    media: bool,
) -> Node {
    Node::builder("message")
        .attr("type", if media { "media" } else { "text" })
        .attr("id", id)
        .attr("t", timestamp.to_string())
        .attr("to", to.to_string())
        .append(
            Node::builder("x")
                .attr("xmlns", ns::EVENT)
                .append(Node::new("server"))
                .build(),
        )
        .append(
            Node::builder("notify")
                .attr("xmlns", ns::WHATSAPP)
                .attr("name", nickname)
                .build(),
        )
        .append(Node::builder("request").attr("xmlns", ns::RECEIPTS).build())
        .append(payload)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_shape() {
        let body = Node::builder("body").data(b"hi".to_vec()).build();
        let message = wrap(
            "message-1-1",
            &Jid::user("15551234567"),
            1_700_000_000,
            "somebody",
            body,
            false,
        );

        assert_eq!(message.attr("type"), Some("text"));
        assert_eq!(message.attr("to"), Some("15551234567@s.whatsapp.net"));
        assert_eq!(message.attr("t"), Some("1700000000"));
        assert_eq!(message.children().len(), 4);
        assert_eq!(message.children()[0].name(), "x");
        assert!(message.children()[0].has_child("server"));
        assert_eq!(message.children()[1].attr("name"), Some("somebody"));
        assert_eq!(message.children()[2].name(), "request");
        assert_eq!(message.children()[3].text(), "hi");
    }

    #[test]
    fn test_wrap_media_type() {
        let media = Node::builder("media").attr("type", "image").build();
        let message = wrap(
            "message-1-2",
            &Jid::user("15551234567"),
            1_700_000_000,
            "somebody",
            media,
            true,
        );
        assert_eq!(message.attr("type"), Some("media"));
        assert_eq!(message.children()[3].name(), "media");
    }
}
