//! [`RadioDriver`] on top of esp-wifi's ESP-NOW.
//!
//! esp-wifi brings the stack up (station mode included) when [`EspNow`] is
//! created and hands inbound frames out by polling instead of through callbacks.
//! This adapter keeps the registered callbacks and fires them itself: the send
//! callback once a queued frame was acknowledged or given up on, the receive
//! callback whenever [`RadioDriver::receive`] pulls a frame.

use esp_wifi::esp_now::{self, EspNow, EspNowError, PeerInfo};

use crate::{
    config::Channel,
    driver::{
        DriverError, PeerRecord, RadioDriver, ReceiveCallback, ReceivedFrame, SendCallback,
        SendStatus,
    },
    key::Key,
    mac::MacAddress,
};

pub struct EspNowDriver<'a> {
    esp_now: EspNow<'a>,
    on_receive: Option<ReceiveCallback>,
    on_send: Option<SendCallback>,
}
impl<'a> EspNowDriver<'a> {
    pub fn new(esp_now: EspNow<'a>) -> Self {
        return Self {
            esp_now,
            on_receive: None,
            on_send: None,
        };
    }
}

impl<'a> RadioDriver for EspNowDriver<'a> {
    fn set_station_mode(&mut self) -> Result<(), DriverError> {
        // EspNow::new already started the interface as a station
        return Ok(());
    }

    fn set_channel(&mut self, channel: Channel) -> Result<(), DriverError> {
        return self.esp_now.set_channel(channel.get()).map_err(driver_error);
    }

    fn init(&mut self) -> Result<(), DriverError> {
        let version = self.esp_now.get_version().map_err(driver_error)?;
        log::debug!("esp-now version {version}");
        return Ok(());
    }

    fn set_primary_key(&mut self, key: &Key) -> Result<(), DriverError> {
        return self.esp_now.set_pmk(key.as_bytes()).map_err(driver_error);
    }

    fn register_receive_callback(&mut self, callback: ReceiveCallback) -> Result<(), DriverError> {
        self.on_receive = Some(callback);
        return Ok(());
    }

    fn register_send_callback(&mut self, callback: SendCallback) -> Result<(), DriverError> {
        self.on_send = Some(callback);
        return Ok(());
    }

    fn peer_exists(&self, address: &MacAddress) -> bool {
        return self.esp_now.peer_exists(address.as_bytes());
    }

    fn add_peer(&mut self, peer: &PeerRecord) -> Result<(), DriverError> {
        return self
            .esp_now
            .add_peer(PeerInfo {
                peer_address: peer.address.0,
                lmk: peer.link_key.as_ref().map(|key| *key.as_bytes()),
                channel: Some(peer.channel.get()),
                encrypt: peer.encrypt,
            })
            .map_err(driver_error);
    }

    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), DriverError> {
        return self
            .esp_now
            .remove_peer(address.as_bytes())
            .map_err(driver_error);
    }

    fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), DriverError> {
        let waiter = self
            .esp_now
            .send(address.as_bytes(), data)
            .map_err(driver_error)?;
        // Delivery is only reported to the callback, the frame was queued either way
        let status = match waiter.wait() {
            Ok(()) => SendStatus::Success,
            Err(_) => SendStatus::Failed,
        };
        if let Some(on_send) = self.on_send {
            on_send(address, status);
        }
        return Ok(());
    }

    fn receive(&mut self) -> Option<ReceivedFrame> {
        let data = self.esp_now.receive()?;
        let frame = ReceivedFrame::new(
            MacAddress::new(data.info.src_address),
            MacAddress::new(data.info.dst_address),
            &data.data[0..data.len as usize],
        )?;
        if let Some(on_receive) = self.on_receive {
            on_receive(&frame.info, frame.data());
        }
        return Some(frame);
    }
}

fn driver_error(err: EspNowError) -> DriverError {
    return match err {
        EspNowError::Error(esp_now::Error::NotInitialized) => DriverError::NotInitialized,
        EspNowError::Error(esp_now::Error::InvalidArgument) => DriverError::InvalidArgument,
        EspNowError::Error(esp_now::Error::OutOfMemory) => DriverError::OutOfMemory,
        EspNowError::Error(esp_now::Error::PeerListFull) => DriverError::PeerListFull,
        EspNowError::Error(esp_now::Error::NotFound) => DriverError::NotFound,
        EspNowError::Error(esp_now::Error::InternalError) => DriverError::Internal,
        EspNowError::Error(esp_now::Error::PeerExists) => DriverError::PeerExists,
        EspNowError::Error(esp_now::Error::InterfaceError) => DriverError::InterfaceMismatch,
        EspNowError::Error(esp_now::Error::Other(code)) => DriverError::from_code(code as i32)
            .err()
            .unwrap_or(DriverError::Other(0)),
        EspNowError::SendFailed => DriverError::SendFailed,
        other => {
            log::error!("Unexpected esp-now error: {other:?}");
            DriverError::Internal
        }
    };
}
