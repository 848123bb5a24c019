//! Per-frame encryption with authentication and sequence counters.

use hmac::Mac;

use crate::keys::{HmacSha1, KeySet, KEY_LEN};
use crate::rc4::Rc4;
use crate::Error;

/// Keystream bytes discarded after keying each session RC4 engine.
const RC4_DROP: usize = 768;

/// Bytes of HMAC-SHA1 output appended to each sealed frame.
pub const MAC_LEN: usize = 4;

/// One direction of the secure channel: an RC4 engine, an HMAC key and a
/// monotonic sequence counter. The counter is part of the MAC input and
/// advances once per framed message.
struct Direction {
    rc4: Rc4,
    mac_key: [u8; KEY_LEN],
    seq: u32,
}

impl Direction {
    fn new(rc4_key: &[u8; KEY_LEN], mac_key: &[u8; KEY_LEN]) -> Direction {
        Direction {
            rc4: Rc4::with_drop(rc4_key, RC4_DROP),
            mac_key: *mac_key,
            seq: 0,
        }
    }

    /// `HMAC-SHA1(mac_key, data ‖ be32(seq))[..4]` for the current counter.
    fn mac4(&self, data: &[u8]) -> Result<[u8; MAC_LEN], Error> {
        let mut mac = HmacSha1::new_from_slice(&self.mac_key)?;
        mac.update(data);
        mac.update(&self.seq.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; MAC_LEN];
        out.copy_from_slice(&digest[..MAC_LEN]);
        Ok(out)
    }
}

/// The two-direction secure channel installed on a connection once the
/// authentication challenge has been answered.
pub struct SecureStream {
    outbound: Direction,
    inbound: Direction,
}

impl SecureStream {
    /// A stream oriented as the client: seals with K0/K1, opens with K2/K3.
    pub fn client(keys: &KeySet) -> SecureStream {
        SecureStream {
            outbound: Direction::new(keys.rc4_out(), keys.mac_out()),
            inbound: Direction::new(keys.rc4_in(), keys.mac_in()),
        }
    }

    /// A stream oriented as the server: the mirror image of
    /// [`SecureStream::client`]. Servers and test harnesses speak the
    /// protocol with this orientation.
    pub fn server(keys: &KeySet) -> SecureStream {
        SecureStream {
            outbound: Direction::new(keys.rc4_in(), keys.mac_in()),
            inbound: Direction::new(keys.rc4_out(), keys.mac_out()),
        }
    }

    /// Encrypts a frame payload and appends the 4-byte MAC, advancing the
    /// outbound sequence counter.
    pub fn seal(&mut self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        let mut buf = plain.to_vec();
        self.outbound.rc4.process(&mut buf);
        let mac = self.outbound.mac4(&buf)?;
        buf.extend_from_slice(&mac);
        self.outbound.seq = self.outbound.seq.wrapping_add(1);
        Ok(buf)
    }

    /// Verifies and decrypts a received frame payload (`ciphertext ‖ mac4`).
    ///
    /// The MAC is checked before any decryption; on mismatch the inbound
    /// engine and sequence counter are left untouched and the connection
    /// must be torn down.
    pub fn open(&mut self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        if payload.len() < MAC_LEN {
            return Err(Error::MacMismatch);
        }
        let (body, trailer) = payload.split_at(payload.len() - MAC_LEN);
        let expected = self.inbound.mac4(body)?;
        if &expected[..] != trailer {
            return Err(Error::MacMismatch);
        }
        let mut buf = body.to_vec();
        self.inbound.rc4.process(&mut buf);
        self.inbound.seq = self.inbound.seq.wrapping_add(1);
        Ok(buf)
    }

    /// The number of frames sealed so far.
    pub fn seq_out(&self) -> u32 {
        self.outbound.seq
    }

    /// The number of frames opened so far.
    pub fn seq_in(&self) -> u32 {
        self.inbound.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (SecureStream, SecureStream) {
        let keys = KeySet::derive(&[3u8; 20], b"\x10\x20\x30\x40");
        (SecureStream::client(&keys), SecureStream::server(&keys))
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let (mut client, mut server) = pair();

        for i in 0..8u32 {
            let plain = format!("frame number {}", i).into_bytes();
            let sealed = client.seal(&plain).unwrap();
            assert_eq!(sealed.len(), plain.len() + MAC_LEN);
            assert_eq!(server.open(&sealed).unwrap(), plain);
        }
        assert_eq!(client.seq_out(), 8);
        assert_eq!(server.seq_in(), 8);
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let (mut client, mut server) = pair();

        let mut sealed = client.seal(b"an innocuous payload").unwrap();
        sealed[2] ^= 0x01;
        match server.open(&sealed) {
            Err(Error::MacMismatch) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        // Rejection must not advance the inbound counter.
        assert_eq!(server.seq_in(), 0);
    }

    #[test]
    fn test_tampered_mac_is_rejected() {
        let (mut client, mut server) = pair();

        let mut sealed = client.seal(b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;
        assert!(matches!(server.open(&sealed), Err(Error::MacMismatch)));
    }

    #[test]
    fn test_sequence_skew_is_rejected() {
        let (mut client, mut server) = pair();

        let first = client.seal(b"first").unwrap();
        let second = client.seal(b"second").unwrap();

        // Delivering the second frame first fails the MAC, because the
        // counter is part of the MAC input.
        assert!(matches!(server.open(&second), Err(Error::MacMismatch)));
        assert_eq!(server.open(&first).unwrap(), b"first");
    }

    #[test]
    fn test_short_payload_is_rejected() {
        let (_, mut server) = pair();
        assert!(matches!(server.open(b"abc"), Err(Error::MacMismatch)));
    }

    #[test]
    fn test_directions_are_independent() {
        let (mut client, mut server) = pair();

        let from_client = client.seal(b"c2s").unwrap();
        let from_server = server.seal(b"s2c").unwrap();
        assert_eq!(server.open(&from_client).unwrap(), b"c2s");
        assert_eq!(client.open(&from_server).unwrap(), b"s2c");
    }
}
