//! The seam between the network helpers and the radio.
//!
//! The ESP-NOW stack keeps its peer table, channel lock and keys in process-wide
//! driver state. Everything here talks to that state through [`RadioDriver`], so
//! the helpers run the same against the real radio and an in-memory double.

use thiserror::Error;

use crate::{config::Channel, key::Key, mac::MacAddress};

/// Largest payload ESP-NOW carries in one frame
pub const MAX_DATA_LEN: usize = 250;
/// Most peers the ESP-NOW peer table holds
pub const MAX_PEERS: usize = 20;

/// Generic failure status
pub const ESP_FAIL: i32 = -1;
/// Base of the ESP-NOW status code range
pub const ESP_ERR_ESPNOW_BASE: i32 = 0x3064;

/// Native ESP-NOW failures. [`DriverError::code`] gives the status code the
/// driver reported, unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("ESP-NOW is not initialized")]
    NotInitialized,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Peer list is full")]
    PeerListFull,
    #[error("Peer is not found")]
    NotFound,
    #[error("Internal error")]
    Internal,
    #[error("Peer already exists")]
    PeerExists,
    #[error("Wi-Fi interface doesn't match that of the peer")]
    InterfaceMismatch,
    #[error("Generic ESP-NOW failure")]
    SendFailed,
    #[error("Driver error {0:#x}")]
    Other(i32),
}
impl DriverError {
    pub fn code(self) -> i32 {
        return match self {
            Self::NotInitialized => ESP_ERR_ESPNOW_BASE + 1,
            Self::InvalidArgument => ESP_ERR_ESPNOW_BASE + 2,
            Self::OutOfMemory => ESP_ERR_ESPNOW_BASE + 3,
            Self::PeerListFull => ESP_ERR_ESPNOW_BASE + 4,
            Self::NotFound => ESP_ERR_ESPNOW_BASE + 5,
            Self::Internal => ESP_ERR_ESPNOW_BASE + 6,
            Self::PeerExists => ESP_ERR_ESPNOW_BASE + 7,
            Self::InterfaceMismatch => ESP_ERR_ESPNOW_BASE + 8,
            Self::SendFailed => ESP_FAIL,
            Self::Other(code) => code,
        };
    }

    /// Maps a native status code back onto a variant. `0` is success.
    pub fn from_code(code: i32) -> Result<(), Self> {
        return match code {
            0 => Ok(()),
            ESP_FAIL => Err(Self::SendFailed),
            code if code > ESP_ERR_ESPNOW_BASE && code <= ESP_ERR_ESPNOW_BASE + 8 => {
                Err(match code - ESP_ERR_ESPNOW_BASE {
                    1 => Self::NotInitialized,
                    2 => Self::InvalidArgument,
                    3 => Self::OutOfMemory,
                    4 => Self::PeerListFull,
                    5 => Self::NotFound,
                    6 => Self::Internal,
                    7 => Self::PeerExists,
                    _ => Self::InterfaceMismatch,
                })
            }
            code => Err(Self::Other(code)),
        };
    }
}

/// One entry of the driver's peer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub address: MacAddress,
    pub channel: Channel,
    pub encrypt: bool,
    pub link_key: Option<Key>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveInfo {
    pub src_address: MacAddress,
    pub dst_address: MacAddress,
}

/// An inbound frame as handed over by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub info: ReceiveInfo,
    data: heapless::Vec<u8, MAX_DATA_LEN>,
}
impl ReceivedFrame {
    /// Returns `None` when `data` does not fit in one frame.
    pub fn new(src_address: MacAddress, dst_address: MacAddress, data: &[u8]) -> Option<Self> {
        return Some(Self {
            info: ReceiveInfo {
                src_address,
                dst_address,
            },
            data: heapless::Vec::from_slice(data).ok()?,
        });
    }

    pub fn data(&self) -> &[u8] {
        return &self.data;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Success,
    Failed,
}

/// Called by the driver for every inbound frame.
pub type ReceiveCallback = fn(&ReceiveInfo, &[u8]);
/// Called by the driver once a frame was delivered, or wasn't.
pub type SendCallback = fn(&MacAddress, SendStatus);

/// Port onto the ESP-NOW driver.
pub trait RadioDriver {
    /// Puts the Wi-Fi interface in station mode.
    fn set_station_mode(&mut self) -> Result<(), DriverError>;

    /// Locks the radio to `channel` with no secondary channel.
    fn set_channel(&mut self, channel: Channel) -> Result<(), DriverError>;

    /// Brings up the ESP-NOW stack.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Installs the primary key used to encrypt link keys.
    fn set_primary_key(&mut self, key: &Key) -> Result<(), DriverError>;

    fn register_receive_callback(&mut self, callback: ReceiveCallback) -> Result<(), DriverError>;

    fn register_send_callback(&mut self, callback: SendCallback) -> Result<(), DriverError>;

    fn peer_exists(&self, address: &MacAddress) -> bool;

    fn add_peer(&mut self, peer: &PeerRecord) -> Result<(), DriverError>;

    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), DriverError>;

    /// Queues one frame. The payload must fit in [`MAX_DATA_LEN`]. The result is
    /// the queueing status; delivery goes to the send callback.
    fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), DriverError>;

    /// Takes the next inbound frame. The receive callback fires for it first.
    fn receive(&mut self) -> Option<ReceivedFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_esp_now_status_values() {
        assert_eq!(DriverError::NotInitialized.code(), 0x3065);
        assert_eq!(DriverError::InvalidArgument.code(), 0x3066);
        assert_eq!(DriverError::OutOfMemory.code(), 0x3067);
        assert_eq!(DriverError::NotFound.code(), 0x3069);
        assert_eq!(DriverError::PeerExists.code(), 0x306B);
        assert_eq!(DriverError::InterfaceMismatch.code(), 0x306C);
        assert_eq!(DriverError::SendFailed.code(), ESP_FAIL);
        assert_eq!(DriverError::Other(0x101).code(), 0x101);
    }

    #[test]
    fn codes_map_back_onto_variants() {
        assert_eq!(DriverError::from_code(0), Ok(()));
        assert_eq!(DriverError::from_code(0x3065), Err(DriverError::NotInitialized));
        assert_eq!(DriverError::from_code(0x306C), Err(DriverError::InterfaceMismatch));
        assert_eq!(DriverError::from_code(0x3064), Err(DriverError::Other(0x3064)));
        assert_eq!(DriverError::from_code(0x306D), Err(DriverError::Other(0x306D)));
        for err in [
            DriverError::NotInitialized,
            DriverError::InvalidArgument,
            DriverError::OutOfMemory,
            DriverError::PeerListFull,
            DriverError::NotFound,
            DriverError::Internal,
            DriverError::PeerExists,
            DriverError::InterfaceMismatch,
            DriverError::SendFailed,
            DriverError::Other(0x101),
        ] {
            assert_eq!(DriverError::from_code(err.code()), Err(err));
        }
    }

    #[test]
    fn frames_are_bounded_by_payload_size() {
        let src = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let frame = ReceivedFrame::new(src, crate::mac::BROADCAST_ADDRESS, b"hello").unwrap();
        assert_eq!(frame.data(), b"hello");
        assert_eq!(frame.info.src_address, src);
        assert!(ReceivedFrame::new(src, src, &[0u8; MAX_DATA_LEN + 1]).is_none());
    }
}
