//! A scripted WA server for end-to-end tests: it speaks the real wire
//! format over a local TCP socket, driven step by step by each test.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder, Encoder};
use tokio_wa::{Node, Packet, WaCodec};
use wauth::{KeySet, SecureStream};

/// Shared secret every test account uses.
pub const SECRET: [u8; 20] = [0x42; 20];

/// The canned login challenge: 16 zero bytes.
pub const CHALLENGE: [u8; 16] = [0u8; 16];

/// The test account's phone number.
pub const NUMBER: &str = "15551234567";

pub struct TestServer {
    stream: TcpStream,
    codec: WaCodec,
    secure: Option<SecureStream>,
}

impl TestServer {
    pub async fn accept(listener: TcpListener) -> TestServer {
        let (stream, _) = listener.accept().await.expect("accept");
        TestServer {
            stream,
            codec: WaCodec::new(),
            secure: None,
        }
    }

    /// Derives the session keys and takes the server side of the channel.
    pub fn enable_crypto(&mut self) {
        let keys = KeySet::derive(&SECRET, &CHALLENGE);
        self.secure = Some(SecureStream::server(&keys));
    }

    /// Opens a sealed blob from the client, e.g. the auth response
    /// payload. Advances the inbound sequence counter like any frame.
    pub fn open_blob(&mut self, blob: &[u8]) -> Vec<u8> {
        self.secure
            .as_mut()
            .expect("crypto enabled")
            .open(blob)
            .expect("open blob")
    }

    /// Reads and checks the `WA` magic and version bytes.
    pub async fn expect_prologue(&mut self) {
        let mut magic = [0u8; 4];
        self.stream.read_exact(&mut magic).await.expect("prologue");
        assert_eq!(&magic, b"WA\x01\x02");
    }

    /// Reads one frame from the client and decodes it, transparently
    /// opening encrypted frames.
    pub async fn next_packet(&mut self) -> Packet {
        let mut header = [0u8; 3];
        self.stream.read_exact(&mut header).await.expect("header");
        let flags = header[0] >> 4;
        let length = (usize::from(header[0] & 0x0F) << 16)
            | (usize::from(header[1]) << 8)
            | usize::from(header[2]);
        let mut payload = vec![0u8; length];
        self.stream.read_exact(&mut payload).await.expect("payload");

        let body = if flags & 0x1 != 0 {
            self.secure
                .as_mut()
                .expect("encrypted frame before crypto")
                .open(&payload)
                .expect("open frame")
        } else {
            payload
        };

        let mut buf = BytesMut::with_capacity(3 + body.len());
        buf.put_u8((body.len() >> 16) as u8);
        buf.put_u8((body.len() >> 8) as u8);
        buf.put_u8(body.len() as u8);
        buf.put_slice(&body);
        self.codec
            .decode(&mut buf)
            .expect("decode")
            .expect("whole frame")
    }

    /// Reads packets until a stanza with the given name arrives; anything
    /// else on the way (stream start, features) is skipped.
    pub async fn expect_stanza(&mut self, name: &str) -> Node {
        loop {
            match self.next_packet().await {
                Packet::Stanza(stanza) if stanza.name() == name => return stanza,
                Packet::Stanza(stanza) => {
                    panic!("expected <{}>, got {}", name, stanza)
                }
                _ => continue,
            }
        }
    }

    /// Encodes and sends a stanza, sealing it when crypto is enabled.
    pub async fn send_stanza(&mut self, stanza: Node) {
        let frame = self.build_frame(stanza);
        self.stream.write_all(&frame).await.expect("write");
    }

    /// Like `send_stanza`, but flips one ciphertext bit before sending.
    pub async fn send_tampered_stanza(&mut self, stanza: Node) {
        let mut frame = self.build_frame(stanza);
        assert!(frame[0] >> 4 == 0x8, "tampering requires an encrypted frame");
        frame[4] ^= 0x01;
        self.stream.write_all(&frame).await.expect("write");
    }

    /// Sends the stream end marker.
    pub async fn send_stream_end(&mut self) {
        let mut scratch = WaCodec::new();
        let mut buf = BytesMut::new();
        scratch.encode(Packet::StreamEnd, &mut buf).expect("encode");
        let frame = self.seal_frame(buf);
        self.stream.write_all(&frame).await.expect("write");
    }

    /// Sends raw bytes, one at a time.
    pub async fn trickle(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.stream.write_all(&[*byte]).await.expect("write");
            self.stream.flush().await.expect("flush");
            tokio::task::yield_now().await;
        }
    }

    /// Encodes a stanza into a complete frame, sealed when crypto is
    /// enabled.
    pub fn build_frame(&mut self, stanza: Node) -> Vec<u8> {
        let mut scratch = WaCodec::new();
        let mut buf = BytesMut::new();
        scratch
            .encode(Packet::Stanza(stanza), &mut buf)
            .expect("encode");
        self.seal_frame(buf)
    }

    fn seal_frame(&mut self, plaintext_frame: BytesMut) -> Vec<u8> {
        match self.secure {
            Some(ref mut secure) => {
                let sealed = secure.seal(&plaintext_frame[3..]).expect("seal");
                let mut frame = Vec::with_capacity(3 + sealed.len());
                frame.push(0x80 | (sealed.len() >> 16) as u8);
                frame.push((sealed.len() >> 8) as u8);
                frame.push(sealed.len() as u8);
                frame.extend_from_slice(&sealed);
                frame
            }
            None => plaintext_frame.to_vec(),
        }
    }
}

/// Binds a listener and returns it with a localhost config pointing at it.
pub async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}
