//! Binary stream codec for WA stanzas.
//!
//! Frames are `flags:4 | length:20 | payload[length]`; payloads are the
//! token-compressed tree encoding, optionally sealed by the session
//! cipher. The decoder consumes nothing until a whole frame is buffered,
//! so partial reads of any chunking are handled by `Framed`.

use std::collections::HashMap;

use bytes::{Buf, BufMut, BytesMut};
use log::debug;
use tokio_util::codec::{Decoder, Encoder};
use wa_jid::Jid;
use wa_node::Node;
use wauth::SecureStream;

use crate::error::{Error, ProtocolError};
use crate::tokens::{str2tok, tok2str, SECONDARY_BASE};

/// Protocol magic leading the stream prologue.
pub const MAGIC: &[u8; 2] = b"WA";

/// Protocol version bytes (major, minor) following the magic.
pub const VERSION: (u8, u8) = (1, 2);

/// Largest frame payload expressible in the 20-bit length field.
pub const MAX_PAYLOAD: usize = 0x000F_FFFF;

// Frame header flag bits, in the high nibble.
const FLAG_ENCRYPTED_IN: u8 = 0x8;
const FLAG_ENCRYPTED_OUT: u8 = 0x1;

// List opcodes.
const LIST_EMPTY: u8 = 0x00;
const LIST_8: u8 = 0xF8;
const LIST_16: u8 = 0xF9;

// Stream markers, in stanza-name position.
const STREAM_START: u8 = 0x01;
const STREAM_END: u8 = 0x02;

// String opcodes.
const STR_JID: u8 = 0xFA;
const STR_BYTES_8: u8 = 0xFC;
const STR_BYTES_24: u8 = 0xFD;
const STR_SECONDARY: u8 = 0xFE;

/// Anything that can be sent or received on a WA stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// The stream start. Outbound this is the whole prologue (magic,
    /// version, start stanza); inbound it is the server's start marker
    /// with its attributes.
    StreamStart(HashMap<String, String>),
    /// A complete stanza.
    Stanza(Node),
    /// The stream end marker.
    StreamEnd,
}

/// Stateful encoder/decoder for a bytestream from/to WA [`Packet`].
pub struct WaCodec {
    secure: Option<SecureStream>,
}

impl WaCodec {
    /// Constructor. The codec starts out in plaintext mode.
    pub fn new() -> Self {
        WaCodec { secure: None }
    }

    /// Installs the session cipher. Every subsequent outbound frame is
    /// sealed and flagged encrypted; inbound frames flagged encrypted are
    /// opened with it.
    pub fn secure(&mut self, stream: SecureStream) {
        self.secure = Some(stream);
    }

    /// Whether the session cipher is installed.
    pub fn is_secure(&self) -> bool {
        self.secure.is_some()
    }

    fn frame(&mut self, body: Vec<u8>, dst: &mut BytesMut) -> Result<(), Error> {
        let (payload, flags) = match self.secure {
            Some(ref mut secure) => (secure.seal(&body)?, FLAG_ENCRYPTED_OUT),
            None => (body, 0),
        };
        if payload.len() > MAX_PAYLOAD {
            return Err(ProtocolError::FrameTooLong(payload.len()).into());
        }
        let header = (u32::from(flags) << 20) | payload.len() as u32;
        dst.reserve(3 + payload.len());
        dst.put_u8((header >> 16) as u8);
        dst.put_u8((header >> 8) as u8);
        dst.put_u8(header as u8);
        dst.put_slice(&payload);
        Ok(())
    }
}

impl Default for WaCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for WaCodec {
    type Item = Packet;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if buf.len() < 3 {
                return Ok(None);
            }
            let header =
                (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]);
            let flags = (header >> 20) as u8;
            let length = (header & MAX_PAYLOAD as u32) as usize;
            if buf.len() < 3 + length {
                // Incomplete: leave the buffer untouched and wait for more.
                return Ok(None);
            }
            buf.advance(3);
            let payload = buf.split_to(length);

            let body;
            if flags & FLAG_ENCRYPTED_IN != 0 {
                let secure = self
                    .secure
                    .as_mut()
                    .ok_or(ProtocolError::EncryptedWithoutKeys)?;
                body = secure.open(&payload)?;
            } else {
                body = payload.to_vec();
            }

            // An empty frame (or a bare empty list) is the peer's
            // whitespace keep-alive.
            if body.is_empty() || body[..] == [LIST_EMPTY] {
                debug!("<< keep-alive");
                continue;
            }

            let packet = BodyReader::new(&body).packet()?;
            match packet {
                Packet::StreamStart(ref attrs) => debug!("<< stream start {:?}", attrs),
                Packet::Stanza(ref stanza) => debug!("<< {}", stanza),
                Packet::StreamEnd => debug!("<< stream end"),
            }
            return Ok(Some(packet));
        }
    }
}

impl Encoder<Packet> for WaCodec {
    type Error = Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Packet::StreamStart(attrs) => {
                debug!(">> stream start {:?}", attrs);
                dst.reserve(4);
                dst.put_slice(MAGIC);
                dst.put_u8(VERSION.0);
                dst.put_u8(VERSION.1);

                let mut writer = BodyWriter::new();
                writer.list_start(1 + 2 * attrs.len())?;
                writer.raw(STREAM_START);
                // `to` leads on the wire; the rest follows in key order.
                if let Some(to) = attrs.get("to") {
                    writer.string("to")?;
                    writer.string(to)?;
                }
                let mut rest: Vec<_> = attrs
                    .iter()
                    .filter(|(key, _)| key.as_str() != "to")
                    .collect();
                rest.sort();
                for (key, value) in rest {
                    writer.string(key)?;
                    writer.string(value)?;
                }
                self.frame(writer.into_inner(), dst)
            }
            Packet::Stanza(stanza) => {
                debug!(">> {}", stanza);
                let mut writer = BodyWriter::new();
                writer.node(&stanza)?;
                self.frame(writer.into_inner(), dst)
            }
            Packet::StreamEnd => {
                debug!(">> stream end");
                self.frame(vec![LIST_8, 1, STREAM_END], dst)
            }
        }
    }
}

/// Cursor over one decrypted frame body.
struct BodyReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    fn new(buf: &'a [u8]) -> BodyReader<'a> {
        BodyReader { buf, pos: 0 }
    }

    fn peek(&self) -> Result<u8, ProtocolError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(ProtocolError::Truncated)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() - self.pos < n {
            return Err(ProtocolError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ProtocolError> {
        let bytes = self.take(2)?;
        Ok(u16::from(bytes[0]) << 8 | u16::from(bytes[1]))
    }

    fn u24(&mut self) -> Result<u32, ProtocolError> {
        let bytes = self.take(3)?;
        Ok(u32::from(bytes[0]) << 16 | u32::from(bytes[1]) << 8 | u32::from(bytes[2]))
    }

    fn packet(&mut self) -> Result<Packet, ProtocolError> {
        let length = self.list_start()?;
        match self.peek()? {
            STREAM_START => {
                self.pos += 1;
                let mut attrs = HashMap::new();
                for _ in 0..length.saturating_sub(1) / 2 {
                    let key = self.string()?;
                    let value = self.string()?;
                    attrs.insert(key, value);
                }
                Ok(Packet::StreamStart(attrs))
            }
            STREAM_END => Ok(Packet::StreamEnd),
            _ => Ok(Packet::Stanza(self.node(length)?)),
        }
    }

    fn list_start(&mut self) -> Result<usize, ProtocolError> {
        match self.u8()? {
            LIST_EMPTY => Ok(0),
            LIST_8 => Ok(self.u8()? as usize),
            LIST_16 => Ok(self.u16()? as usize),
            other => Err(ProtocolError::InvalidListLead(other)),
        }
    }

    fn node(&mut self, length: usize) -> Result<Node, ProtocolError> {
        let mut node = Node::new(self.string()?);
        for _ in 0..length.saturating_sub(1) / 2 {
            let key = self.string()?;
            let value = self.string()?;
            node.set_attr(key, value);
        }
        // An even list length leaves one trailing slot: a child list or a
        // byte payload.
        if length >= 2 && length % 2 == 0 {
            match self.peek()? {
                LIST_8 | LIST_16 => {
                    for _ in 0..self.list_start()? {
                        node.append_child(self.child()?);
                    }
                }
                _ => node.set_data(self.raw_string()?),
            }
        }
        Ok(node)
    }

    fn child(&mut self) -> Result<Node, ProtocolError> {
        let length = self.list_start()?;
        match self.peek()? {
            STREAM_START | STREAM_END => Err(ProtocolError::UnexpectedStreamMarker),
            _ => self.node(length),
        }
    }

    fn raw_string(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let lead = self.u8()?;
        match lead {
            0x00..=0x04 => Ok(Vec::new()),
            0x05..=0xF5 => Ok(token_bytes(u16::from(lead))?),
            STR_JID => {
                let user = self.string()?;
                let server = self.string()?;
                let user = if user.is_empty() { None } else { Some(user) };
                Ok(Jid::new(user, server).to_string().into_bytes())
            }
            STR_BYTES_8 => {
                let len = self.u8()? as usize;
                Ok(self.take(len)?.to_vec())
            }
            STR_BYTES_24 => {
                let len = self.u24()? as usize;
                Ok(self.take(len)?.to_vec())
            }
            STR_SECONDARY => {
                let offset = u16::from(self.u8()?);
                Ok(token_bytes(SECONDARY_BASE + offset)?)
            }
            other => Err(ProtocolError::InvalidStringLead(other)),
        }
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        String::from_utf8(self.raw_string()?).map_err(|e| ProtocolError::Utf8(e.utf8_error()))
    }
}

fn token_bytes(index: u16) -> Result<Vec<u8>, ProtocolError> {
    tok2str(index)
        .map(|token| token.as_bytes().to_vec())
        .ok_or(ProtocolError::UnknownToken(index))
}

/// Accumulator for one frame body.
struct BodyWriter {
    buf: Vec<u8>,
}

impl BodyWriter {
    fn new() -> BodyWriter {
        BodyWriter { buf: Vec::new() }
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn raw(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    fn list_start(&mut self, length: usize) -> Result<(), ProtocolError> {
        if length == 0 {
            self.buf.push(LIST_EMPTY);
        } else if length <= 0xFF {
            self.buf.push(LIST_8);
            self.buf.push(length as u8);
        } else if length <= 0xFFFF {
            self.buf.push(LIST_16);
            self.buf.push((length >> 8) as u8);
            self.buf.push(length as u8);
        } else {
            return Err(ProtocolError::ListTooLong(length));
        }
        Ok(())
    }

    fn token(&mut self, index: u16) {
        if index < SECONDARY_BASE {
            self.buf.push(index as u8);
        } else {
            self.buf.push(STR_SECONDARY);
            self.buf.push((index - SECONDARY_BASE) as u8);
        }
    }

    fn bytes_literal(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if data.len() <= 0xFF {
            self.buf.push(STR_BYTES_8);
            self.buf.push(data.len() as u8);
        } else if data.len() <= 0xFF_FFFF {
            self.buf.push(STR_BYTES_24);
            self.buf.push((data.len() >> 16) as u8);
            self.buf.push((data.len() >> 8) as u8);
            self.buf.push(data.len() as u8);
        } else {
            return Err(ProtocolError::FrameTooLong(data.len()));
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn string(&mut self, s: &str) -> Result<(), ProtocolError> {
        if let Some(index) = str2tok(s) {
            self.token(index);
        } else if s.contains('@') {
            match s.parse::<Jid>() {
                Ok(jid) => {
                    self.buf.push(STR_JID);
                    match jid.user_part() {
                        Some(user) => self.string(user)?,
                        None => self.buf.push(0x00),
                    }
                    self.string(jid.server())?;
                }
                // Not a well-formed JID after all; emit it verbatim.
                Err(_) => self.bytes_literal(s.as_bytes())?,
            }
        } else {
            self.bytes_literal(s.as_bytes())?;
        }
        Ok(())
    }

    fn node(&mut self, node: &Node) -> Result<(), ProtocolError> {
        let has_data = node.data().is_some();
        let has_children = !node.children().is_empty();
        if has_data && has_children {
            return Err(ProtocolError::PayloadAndChildren);
        }

        let mut length = 1 + 2 * node.attr_count();
        if has_data || has_children {
            length += 1;
        }
        self.list_start(length)?;
        self.string(node.name())?;
        for (key, value) in node.attrs() {
            self.string(key)?;
            self.string(value)?;
        }
        if let Some(data) = node.data() {
            self.bytes_literal(data)?;
        } else if has_children {
            self.list_start(node.children().len())?;
            for child in node.children() {
                self.node(child)?;
            }
        }
        Ok(())
    }
}
