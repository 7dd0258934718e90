pub mod advance;

use thiserror::Error;

use crate::{
    config::{Channel, ConfigError, Encryption, RadioConfig},
    driver::{
        DriverError, PeerRecord, RadioDriver, ReceiveCallback, ReceivedFrame, SendCallback,
        MAX_DATA_LEN,
    },
    failures::{BeginFailure, Failures, RegisterFailure, SecureBeginFailure},
    key::Key,
    mac::{MacAddress, MacParseError, MAC_STR_LEN},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Invalid receiver address: {0}")]
    Address(#[from] MacParseError),
    #[error("Message does not fit in a single frame")]
    Encode,
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Point-to-point ESP-NOW helper.
///
/// Owns the radio configuration, wraps initialization, peer registration and
/// transmission, and remembers the last peer it registered.
pub struct SimpleNetwork<D: RadioDriver> {
    driver: D,
    config: RadioConfig,
    started: bool,
    last_peer: Option<MacAddress>,
}
impl<D: RadioDriver> SimpleNetwork<D> {
    pub fn new(driver: D, config: RadioConfig) -> Self {
        return Self {
            driver,
            config,
            started: false,
            last_peer: None,
        };
    }

    /// Brings up unencrypted ESP-NOW and installs the driver callbacks.
    ///
    /// Every step runs even when an earlier one fails. The returned set names all
    /// of the steps that failed.
    pub fn begin(
        &mut self,
        on_receive: ReceiveCallback,
        on_send: SendCallback,
    ) -> Result<(), Failures<BeginFailure>> {
        if self.config.encryption != Encryption::Disabled {
            log::warn!("begin() called on an encrypted network");
            return Err(BeginFailure::WrongEncryptionMode.into());
        }

        let mut failures = Failures::new();
        failures.record(BeginFailure::StackInit, &self.bring_up());
        failures.record(
            BeginFailure::ReceiveCallback,
            &step(
                "register receive callback",
                self.driver.register_receive_callback(on_receive),
            ),
        );
        failures.record(
            BeginFailure::SendCallback,
            &step(
                "register send callback",
                self.driver.register_send_callback(on_send),
            ),
        );

        self.started = failures.is_empty();
        return failures.into_result();
    }

    /// Brings up encrypted ESP-NOW, installs `primary_key` and the driver callbacks.
    pub fn begin_encrypted(
        &mut self,
        on_receive: ReceiveCallback,
        on_send: SendCallback,
        primary_key: &Key,
    ) -> Result<(), Failures<SecureBeginFailure>> {
        if self.config.encryption != Encryption::Enabled {
            log::warn!("begin_encrypted() called on an unencrypted network");
            return Err(SecureBeginFailure::WrongEncryptionMode.into());
        }

        let mut failures = Failures::new();
        failures.record(SecureBeginFailure::StackInit, &self.bring_up());
        failures.record(
            SecureBeginFailure::PrimaryKey,
            &step("set primary key", self.driver.set_primary_key(primary_key)),
        );
        failures.record(
            SecureBeginFailure::ReceiveCallback,
            &step(
                "register receive callback",
                self.driver.register_receive_callback(on_receive),
            ),
        );
        failures.record(
            SecureBeginFailure::SendCallback,
            &step(
                "register send callback",
                self.driver.register_send_callback(on_send),
            ),
        );

        self.started = failures.is_empty();
        return failures.into_result();
    }

    /// Station mode, channel lock and stack init. Reports the first failure but
    /// attempts every step.
    fn bring_up(&mut self) -> Result<(), DriverError> {
        let mode = step("set station mode", self.driver.set_station_mode());
        let channel = step("lock channel", self.driver.set_channel(self.config.channel));
        let init = step("init ESP-NOW", self.driver.init());
        return mode.and(channel).and(init);
    }

    /// Registers an unencrypted peer.
    ///
    /// An existing entry for `address` is replaced when `delete_previous` is set,
    /// otherwise the call fails with [`RegisterFailure::AlreadyRegistered`] and
    /// the peer table is left alone.
    pub fn register_peer(
        &mut self,
        address: &MacAddress,
        delete_previous: bool,
    ) -> Result<(), Failures<RegisterFailure>> {
        if self.config.encryption != Encryption::Disabled {
            log::warn!("Plain peer {address} rejected by an encrypted network");
            return Err(RegisterFailure::WrongEncryptionMode.into());
        }
        return self.add_peer(
            PeerRecord {
                address: *address,
                channel: self.config.channel,
                encrypt: false,
                link_key: None,
            },
            delete_previous,
        );
    }

    /// Registers an encrypted peer using `link_key`.
    pub fn register_peer_encrypted(
        &mut self,
        address: &MacAddress,
        link_key: &Key,
        delete_previous: bool,
    ) -> Result<(), Failures<RegisterFailure>> {
        if self.config.encryption != Encryption::Enabled {
            log::warn!("Encrypted peer {address} rejected by an unencrypted network");
            return Err(RegisterFailure::WrongEncryptionMode.into());
        }
        return self.add_peer(
            PeerRecord {
                address: *address,
                channel: self.config.channel,
                encrypt: true,
                link_key: Some(link_key.clone()),
            },
            delete_previous,
        );
    }

    fn add_peer(
        &mut self,
        peer: PeerRecord,
        delete_previous: bool,
    ) -> Result<(), Failures<RegisterFailure>> {
        let address = peer.address;
        if self.driver.peer_exists(&address) {
            if !delete_previous {
                log::warn!("Peer {address} is already registered");
                return Err(RegisterFailure::AlreadyRegistered.into());
            }
            if self.unregister_peer(&address).is_err() {
                log::warn!("Could not remove previous entry for {address}");
            }
        }

        if let Err(err) = self.driver.add_peer(&peer) {
            log::warn!("Failed to add peer {address}: {err}");
            return Err(RegisterFailure::AddPeer.into());
        }
        log::debug!("Registered peer {address} (encrypted: {})", peer.encrypt);
        self.last_peer = Some(address);
        return Ok(());
    }

    /// Removes a peer from the driver's table. Forgets it as the last peer too.
    pub fn unregister_peer(&mut self, address: &MacAddress) -> Result<(), DriverError> {
        self.driver.remove_peer(address)?;
        if self.last_peer == Some(*address) {
            self.last_peer = None;
        }
        return Ok(());
    }

    /// Sends one frame to a registered peer. Driver status is passed through as is.
    pub fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), DriverError> {
        return self.driver.send(address, data);
    }

    /// Like [`SimpleNetwork::send`], with the address given as `XX:XX:XX:XX:XX:XX`.
    pub fn send_str(&mut self, address: &str, data: &[u8]) -> Result<(), SendError> {
        let address: MacAddress = address.parse()?;
        return Ok(self.send(&address, data)?);
    }

    /// Encodes `message` with bincode into a single frame and sends it.
    pub fn send_message<T: bincode::Encode>(
        &mut self,
        address: &MacAddress,
        message: &T,
    ) -> Result<(), SendError> {
        let mut frame = [0u8; MAX_DATA_LEN];
        let len = bincode::encode_into_slice(message, &mut frame, bincode::config::standard())
            .map_err(|err| {
                log::warn!("Failed to encode message for {address}: {err:?}");
                SendError::Encode
            })?;
        return Ok(self.send(address, &frame[..len])?);
    }

    /// Takes the next inbound frame from the driver, if any.
    pub fn poll(&mut self) -> Option<ReceivedFrame> {
        return self.driver.receive();
    }

    pub fn channel(&self) -> Channel {
        return self.config.channel;
    }

    /// Takes effect on the next `begin` and on peers registered afterwards.
    pub fn set_channel(&mut self, channel: Channel) {
        self.config.channel = channel;
    }

    pub fn encryption(&self) -> Encryption {
        return self.config.encryption;
    }

    /// Only allowed before the network has started.
    pub fn set_encryption(&mut self, encryption: Encryption) -> Result<(), ConfigError> {
        if self.started {
            return Err(ConfigError::AlreadyStarted);
        }
        self.config.encryption = encryption;
        return Ok(());
    }

    pub fn is_started(&self) -> bool {
        return self.started;
    }

    /// The most recently registered peer, unless it was removed since.
    pub fn last_peer(&self) -> Option<MacAddress> {
        return self.last_peer;
    }

    /// [`SimpleNetwork::last_peer`] as `XX:XX:XX:XX:XX:XX`.
    pub fn receiver(&self) -> Option<heapless::String<MAC_STR_LEN>> {
        return self.last_peer.map(|address| address.to_str());
    }

    pub fn driver(&self) -> &D {
        return &self.driver;
    }

    pub fn driver_mut(&mut self) -> &mut D {
        return &mut self.driver;
    }
}

fn step(name: &str, result: Result<(), DriverError>) -> Result<(), DriverError> {
    match result {
        Ok(()) => log::debug!("{name}: ok"),
        Err(err) => log::warn!("{name} failed: {err} ({:#x})", err.code()),
    }
    return result;
}
