//! ESP-NOW network helpers
//!
//! Configures the radio channel, registers peers with optional link and primary
//! keys, and sends frames through an ESP-NOW driver. [`AdvanceNetwork`] adds a
//! broadcast ping handshake that registers whoever answers.

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod driver;
#[cfg(feature = "esp")]
pub mod esp;
pub mod failures;
pub mod key;
pub mod mac;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod network;
pub mod wire;

use bincode::{Decode, Encode};

pub use command::{Command, Transmittable};
pub use config::{Channel, ConfigError, Encryption, RadioConfig};
pub use driver::{DriverError, RadioDriver, ReceivedFrame};
pub use failures::Failures;
pub use key::Key;
pub use mac::{mac_to_str, str_to_mac, MacAddress, BROADCAST_ADDRESS};
pub use network::{
    advance::{AdvanceNetwork, PingReturnError},
    SendError, SimpleNetwork,
};

/// Application payload exchanged by the demo firmware once peers are paired.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub enum NowMessage {
    Telemetry { uptime_secs: u32, counter: u16 },
}
