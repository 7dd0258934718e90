use core::fmt;

use thiserror::Error;

/// ESP-NOW primary and link keys are both 16 bytes.
pub const KEY_LEN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key is {0} bytes long, the radio only holds 16")]
    TooLong(usize),
}

/// A primary (network-wide) or link (per-peer) encryption key.
///
/// Shorter input is zero padded. Longer input is rejected rather than truncated.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);
impl Key {
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        return Self(bytes);
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() > KEY_LEN {
            return Err(KeyError::TooLong(bytes.len()));
        }
        let mut key = [0u8; KEY_LEN];
        key[..bytes.len()].copy_from_slice(bytes);
        return Ok(Self(key));
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        return &self.0;
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        return Self::from_slice(bytes);
    }
}

impl TryFrom<&str> for Key {
    type Error = KeyError;
    fn try_from(key: &str) -> Result<Self, Self::Error> {
        return Self::from_slice(key.as_bytes());
    }
}

// Never print key material
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str("Key(..)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_keys_with_zeroes() {
        let key = Key::try_from("pmk").unwrap();
        let mut expected = [0u8; KEY_LEN];
        expected[..3].copy_from_slice(b"pmk");
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn keeps_full_length_keys() {
        let key = Key::from_slice(b"0123456789abcdef").unwrap();
        assert_eq!(key.as_bytes(), b"0123456789abcdef");
    }

    #[test]
    fn rejects_oversized_keys() {
        assert_eq!(
            Key::try_from("0123456789abcdef!"),
            Err(KeyError::TooLong(17))
        );
        assert_eq!(Key::from_slice(&[0u8; 32]), Err(KeyError::TooLong(32)));
    }

    #[test]
    fn debug_hides_key_material() {
        let key = Key::new([0x42; KEY_LEN]);
        assert_eq!(std::format!("{key:?}"), "Key(..)");
    }
}
