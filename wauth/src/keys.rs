//! Session key derivation.

use hmac::Hmac;
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

/// The length of each derived key, in bytes.
pub const KEY_LEN: usize = 20;

/// PBKDF2 iteration count used by the peer protocol.
pub const KEY_ITERATIONS: u32 = 2;

// Key roles by index.
const RC4_OUT: usize = 0;
const MAC_OUT: usize = 1;
const RC4_IN: usize = 2;
const MAC_IN: usize = 3;

/// The four independent 20-byte session keys, derived once per connection
/// from the shared secret and the server challenge, immutable thereafter.
///
/// K0 keys the outbound RC4 stream, K1 the outbound HMAC, K2 the inbound
/// RC4 stream and K3 the inbound HMAC ("outbound" meaning client to
/// server).
#[derive(Clone)]
pub struct KeySet {
    keys: [[u8; KEY_LEN]; 4],
}

impl KeySet {
    /// Derives K0..K3: for i in 1..=4,
    /// `K(i-1) = PBKDF2-HMAC-SHA1(secret, challenge ‖ byte(i), iterations = 2, dklen = 20)`.
    ///
    /// The secret is already a 20-byte blob; it is used as the PBKDF2
    /// password without re-hashing.
    pub fn derive(secret: &[u8], challenge: &[u8]) -> KeySet {
        let mut keys = [[0u8; KEY_LEN]; 4];
        let mut salt = Vec::with_capacity(challenge.len() + 1);
        for (i, key) in keys.iter_mut().enumerate() {
            salt.clear();
            salt.extend_from_slice(challenge);
            salt.push(i as u8 + 1);
            pbkdf2_hmac::<Sha1>(secret, &salt, KEY_ITERATIONS, key);
        }
        KeySet { keys }
    }

    /// The outbound RC4 key (K0).
    pub fn rc4_out(&self) -> &[u8; KEY_LEN] {
        &self.keys[RC4_OUT]
    }

    /// The outbound HMAC key (K1).
    pub fn mac_out(&self) -> &[u8; KEY_LEN] {
        &self.keys[MAC_OUT]
    }

    /// The inbound RC4 key (K2).
    pub fn rc4_in(&self) -> &[u8; KEY_LEN] {
        &self.keys[RC4_IN]
    }

    /// The inbound HMAC key (K3).
    pub fn mac_in(&self) -> &[u8; KEY_LEN] {
        &self.keys[MAC_IN]
    }
}

/// HMAC-SHA1 as used for the frame MACs.
pub(crate) type HmacSha1 = Hmac<Sha1>;
