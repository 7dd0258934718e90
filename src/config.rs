use core::fmt;

use thiserror::Error;

/// Lowest Wi-Fi channel ESP-NOW can be locked to.
pub const MIN_CHANNEL: u8 = 1;
/// Highest Wi-Fi channel ESP-NOW can be locked to.
pub const MAX_CHANNEL: u8 = 13;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Wi-Fi channel {0} is outside of 1..=13")]
    InvalidChannel(u8),
    #[error("The encryption mode cannot change once the network has started")]
    AlreadyStarted,
}

/// A Wi-Fi channel in the 2.4GHz band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);
impl Channel {
    pub fn new(channel: u8) -> Result<Self, ConfigError> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(ConfigError::InvalidChannel(channel));
        }
        return Ok(Self(channel));
    }

    pub fn get(self) -> u8 {
        return self.0;
    }
}

impl TryFrom<u8> for Channel {
    type Error = ConfigError;
    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        return Self::new(channel);
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    /// Peers are registered with a link key and frames are encrypted by the radio
    Enabled,
    /// Frames go out in the clear
    Disabled,
}

/// Radio settings owned by a network instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    pub channel: Channel,
    pub encryption: Encryption,
}
impl RadioConfig {
    pub fn new(channel: u8, encryption: Encryption) -> Result<Self, ConfigError> {
        return Ok(Self {
            channel: Channel::new(channel)?,
            encryption,
        });
    }
}
