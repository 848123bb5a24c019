//! End-to-end agent scenarios against a scripted server.

mod common;

use common::{listen, TestServer, CHALLENGE, NUMBER, SECRET};
use tokio_wa::{Node, Packet};
use wa::callbacks::{self, MessageFilter};
use wa::{Agent, ClientBuilder, Error};
use wauth::Secret;

/// Drives the server side of a successful login.
async fn run_login_script(server: &mut TestServer) {
    server.expect_prologue().await;
    match server.next_packet().await {
        Packet::StreamStart(_) => (),
        other => panic!("expected stream start, got {:?}", other),
    }
    server.expect_stanza("stream:features").await;
    server.expect_stanza("auth").await;
    server
        .send_stanza(
            Node::builder("challenge")
                .attr("xmlns", "urn:ietf:params:xml:ns:xmpp-sasl")
                .data(CHALLENGE.to_vec())
                .build(),
        )
        .await;
    let response = server.expect_stanza("response").await;
    server.enable_crypto();
    server.open_blob(response.data().expect("response data"));
    server
        .send_stanza(
            Node::builder("success")
                .attr("kind", "free")
                .attr("status", "active")
                .build(),
        )
        .await;
    server.expect_stanza("presence").await;
}

async fn login(port: u16) -> Agent {
    ClientBuilder::new(NUMBER, Secret::from_bytes(SECRET))
        .set_nickname("somebody")
        .set_server("127.0.0.1", port)
        .set_attempts(1)
        .build()
        .await
        .expect("login")
}

#[tokio::test]
async fn text_message_carries_the_full_envelope() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        server.expect_stanza("message").await
    });

    let mut agent = login(port).await;
    let id = agent.message("15551234567", "hi").await.expect("send");

    let message = server.await.expect("server");
    assert_eq!(message.attr("type"), Some("text"));
    assert_eq!(message.attr("to"), Some("15551234567@s.whatsapp.net"));
    assert_eq!(message.attr("id"), Some(id.as_str()));
    assert!(message.attr("t").is_some());

    assert_eq!(message.children().len(), 4);
    let x = &message.children()[0];
    assert_eq!(x.name(), "x");
    assert_eq!(x.attr("xmlns"), Some("jabber:x:event"));
    assert!(x.has_child("server"));
    let notify = &message.children()[1];
    assert_eq!(notify.attr("xmlns"), Some("urn:xmpp:whatsapp"));
    assert_eq!(notify.attr("name"), Some("somebody"));
    let request = &message.children()[2];
    assert_eq!(request.attr("xmlns"), Some("urn:xmpp:receipts"));
    let body = &message.children()[3];
    assert_eq!(body.name(), "body");
    assert_eq!(body.text(), "hi");
}

#[tokio::test]
async fn group_message_targets_the_group_server() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        server.expect_stanza("message").await
    });

    let mut agent = login(port).await;
    agent
        .group_message("15551234567-1381234567", "hello group")
        .await
        .expect("send");

    let message = server.await.expect("server");
    assert_eq!(
        message.attr("to"),
        Some("15551234567-1381234567@g.us")
    );
}

#[tokio::test]
async fn image_notification_carries_url_and_thumbnail() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        server.expect_stanza("message").await
    });

    let mut agent = login(port).await;
    agent
        .image(
            "15551234567",
            "https://mms.example.org/abc123.jpg",
            "holiday.jpg",
            131072,
            Some(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        )
        .await
        .expect("send");

    let message = server.await.expect("server");
    assert_eq!(message.attr("type"), Some("media"));
    let media = message.child("media").expect("media child");
    assert_eq!(media.attr("xmlns"), Some("urn:xmpp:whatsapp:mms"));
    assert_eq!(media.attr("type"), Some("image"));
    assert_eq!(media.attr("url"), Some("https://mms.example.org/abc123.jpg"));
    assert_eq!(media.attr("file"), Some("holiday.jpg"));
    assert_eq!(media.attr("size"), Some("131072"));
    assert_eq!(media.data(), Some(&[0xFF, 0xD8, 0xFF, 0xE0][..]));
}

#[tokio::test]
async fn location_and_vcard_media_shapes() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        let location = server.expect_stanza("message").await;
        let vcard = server.expect_stanza("message").await;
        (location, vcard)
    });

    let mut agent = login(port).await;
    agent
        .location("15551234567", 52.3731, 4.8924)
        .await
        .expect("location");
    agent
        .vcard("15551234567", "Someone", b"BEGIN:VCARD\nEND:VCARD\n".to_vec())
        .await
        .expect("vcard");

    let (location, vcard) = server.await.expect("server");

    let media = location.child("media").expect("location media");
    assert_eq!(media.attr("type"), Some("location"));
    assert_eq!(media.attr("latitude"), Some("52.3731"));
    assert_eq!(media.attr("longitude"), Some("4.8924"));

    let media = vcard.child("media").expect("vcard media");
    assert_eq!(media.attr("type"), Some("vcard"));
    let card = media.child("vcard").expect("vcard child");
    assert_eq!(card.attr("name"), Some("Someone"));
    assert_eq!(card.text(), "BEGIN:VCARD\nEND:VCARD\n");
}

#[tokio::test]
async fn chatstate_is_a_bare_message_with_a_state_child() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        server.expect_stanza("message").await
    });

    let mut agent = login(port).await;
    agent
        .chatstate("15551234567", wa::ChatState::Composing)
        .await
        .expect("chatstate");

    let message = server.await.expect("server");
    assert_eq!(message.attr("type"), Some("chat"));
    assert_eq!(message.children().len(), 1);
    let state = &message.children()[0];
    assert_eq!(state.name(), "composing");
    assert_eq!(
        state.attr("xmlns"),
        Some("http://jabber.org/protocol/chatstates")
    );
}

#[tokio::test]
async fn last_seen_returns_the_reported_seconds() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        let iq = server.expect_stanza("iq").await;
        assert_eq!(iq.attr("type"), Some("get"));
        assert_eq!(iq.attr("to"), Some("15550000001@s.whatsapp.net"));
        let query = iq.child("query").expect("query child");
        assert_eq!(query.attr("xmlns"), Some("jabber:iq:last"));

        let id = iq.attr("id").expect("id").to_string();
        server
            .send_stanza(
                Node::builder("iq")
                    .attr("id", id)
                    .attr("type", "result")
                    .append(Node::builder("query").attr("seconds", "3600").build())
                    .build(),
            )
            .await;
    });

    let mut agent = login(port).await;
    let seconds = agent.last_seen("15550000001").await.expect("last seen");
    assert_eq!(seconds, 3600);

    server.await.expect("server");
}

#[tokio::test]
async fn last_seen_error_reply_is_reraised() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        let iq = server.expect_stanza("iq").await;
        let id = iq.attr("id").expect("id").to_string();
        server
            .send_stanza(
                Node::builder("iq")
                    .attr("id", id)
                    .attr("type", "error")
                    .append(
                        Node::builder("error")
                            .append(Node::new("item-not-found"))
                            .build(),
                    )
                    .build(),
            )
            .await;
    });

    let mut agent = login(port).await;
    match agent.last_seen("15550000009").await {
        Err(Error::Response(condition)) => assert_eq!(condition, "item-not-found"),
        other => panic!("expected error reply, got {:?}", other),
    }

    server.await.expect("server");
}

#[tokio::test]
async fn inbound_message_is_acknowledged_and_dispatched() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        server
            .send_stanza(
                Node::builder("message")
                    .attr("type", "text")
                    .attr("from", "15550000002@s.whatsapp.net")
                    .attr("id", "srv-message-7")
                    .append(
                        Node::builder("request")
                            .attr("xmlns", "urn:xmpp:receipts")
                            .build(),
                    )
                    .append(Node::builder("body").data(b"anyone there?".to_vec()).build())
                    .build(),
            )
            .await;

        let receipt = server.expect_stanza("receipt").await;
        assert_eq!(receipt.attr("to"), Some("15550000002@s.whatsapp.net"));
        assert_eq!(receipt.attr("id"), Some("srv-message-7"));
        assert_eq!(receipt.attr("type"), Some("read"));
    });

    let mut agent = login(port).await;
    let callback = agent.register(callbacks::text_message(MessageFilter::default()));
    let message = agent.wait_for(callback).await.expect("message");
    assert_eq!(message.child("body").expect("body").text(), "anyone there?");

    server.await.expect("server");
}

#[tokio::test]
async fn ping_is_answered_during_the_pump() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        server
            .send_stanza(
                Node::builder("iq")
                    .attr("type", "get")
                    .attr("id", "ping-1")
                    .append(Node::new("ping"))
                    .build(),
            )
            .await;

        let reply = server.expect_stanza("iq").await;
        assert_eq!(reply.attr("type"), Some("result"));
        assert_eq!(reply.attr("id"), Some("ping-1"));
        assert_eq!(reply.attr("to"), Some("s.whatsapp.net"));

        // Unblock the client's wait below.
        server
            .send_stanza(
                Node::builder("message")
                    .attr("type", "text")
                    .attr("from", "15550000002@s.whatsapp.net")
                    .append(Node::builder("body").data(b"done".to_vec()).build())
                    .build(),
            )
            .await;
    });

    let mut agent = login(port).await;
    let callback = agent.register(callbacks::text_message(MessageFilter::default()));
    agent.wait_for(callback).await.expect("message");

    server.await.expect("server");
}

#[tokio::test]
async fn notification_is_acked_and_matches_group_changed() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        server
            .send_stanza(
                Node::builder("notification")
                    .attr("type", "subject")
                    .attr("from", "15551234567-1381234567@g.us")
                    .attr("id", "notify-3")
                    .attr("participant", "15550000002@s.whatsapp.net")
                    .build(),
            )
            .await;

        let ack = server.expect_stanza("ack").await;
        assert_eq!(ack.attr("class"), Some("notification"));
        assert_eq!(ack.attr("id"), Some("notify-3"));
        assert_eq!(ack.attr("to"), Some("15551234567-1381234567@g.us"));
        assert_eq!(
            ack.attr("participant"),
            Some("15550000002@s.whatsapp.net")
        );
    });

    let mut agent = login(port).await;
    let callback = agent.register(callbacks::group_changed());
    let notification = agent.wait_for(callback).await.expect("notification");
    assert_eq!(notification.attr("type"), Some("subject"));

    server.await.expect("server");
}

#[tokio::test]
async fn dirty_marker_triggers_a_clean_iq() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;

        server
            .send_stanza(
                Node::builder("ib")
                    .append(Node::builder("dirty").attr("type", "groups").build())
                    .build(),
            )
            .await;

        let clean = server.expect_stanza("iq").await;
        assert_eq!(clean.attr("type"), Some("set"));
        let child = clean.child("clean").expect("clean child");
        assert_eq!(child.attr("xmlns"), Some("urn:xmpp:whatsapp:dirty"));
        assert_eq!(child.attr("type"), Some("groups"));

        server
            .send_stanza(
                Node::builder("message")
                    .attr("type", "text")
                    .attr("from", "15550000002@s.whatsapp.net")
                    .append(Node::builder("body").data(b"done".to_vec()).build())
                    .build(),
            )
            .await;
    });

    let mut agent = login(port).await;
    let callback = agent.register(callbacks::text_message(MessageFilter::default()));
    agent.wait_for(callback).await.expect("message");

    server.await.expect("server");
}

#[tokio::test]
async fn wait_for_any_returns_the_first_match() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        server
            .send_stanza(
                Node::builder("message")
                    .attr("type", "text")
                    .attr("from", "15550000002@s.whatsapp.net")
                    .append(Node::builder("body").data(b"text wins".to_vec()).build())
                    .build(),
            )
            .await;
    });

    let mut agent = login(port).await;
    let text = agent.register(callbacks::text_message(MessageFilter::default()));
    let media = agent.register(callbacks::media_message(MessageFilter::default(), &[]));
    let stanza = agent.wait_for_any(&[media, text]).await.expect("stanza");
    assert_eq!(stanza.child("body").expect("body").text(), "text wins");

    server.await.expect("server");
}

#[tokio::test]
async fn unknown_audio_attribute_is_rejected_without_sending() {
    let (listener, port) = listen().await;
    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        run_login_script(&mut server).await;
        // The only message to arrive is the probe sent after the
        // rejection.
        let message = server.expect_stanza("message").await;
        assert_eq!(message.child("body").expect("body").text(), "probe");
    });

    let mut agent = login(port).await;
    match agent
        .audio(
            "15551234567",
            "https://example.org/a.ogg",
            "a.ogg",
            1024,
            &[("acodec", "vorbis"), ("loudness", "11")],
        )
        .await
    {
        Err(Error::InvalidArgument(what)) => assert!(what.contains("loudness")),
        other => panic!("expected invalid argument, got {:?}", other),
    }
    agent.message("15551234567", "probe").await.expect("probe");

    server.await.expect("server");
}
