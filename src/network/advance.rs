use thiserror::Error;

use crate::{
    command::{Command, Transmittable},
    config::RadioConfig,
    driver::{DriverError, PeerRecord, RadioDriver},
    failures::{Failures, PingFailure, RegisterFailure},
    key::Key,
    mac::{MacAddress, BROADCAST_ADDRESS},
    network::SimpleNetwork,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingReturnError {
    #[error("Payload is not a command frame")]
    NotACommand,
    #[error("Sender could not be registered: {0}")]
    Register(#[from] Failures<RegisterFailure>),
}

/// [`SimpleNetwork`] plus a broadcast ping handshake for finding peers.
///
/// A node announces itself with [`AdvanceNetwork::broadcast_ping_receiver`].
/// Whoever answers with a command frame is registered as an encrypted peer by
/// [`AdvanceNetwork::ping_return_handle`].
pub struct AdvanceNetwork<D: RadioDriver> {
    network: SimpleNetwork<D>,
}
impl<D: RadioDriver> AdvanceNetwork<D> {
    pub fn new(driver: D, config: RadioConfig) -> Self {
        return Self {
            network: SimpleNetwork::new(driver, config),
        };
    }

    pub fn network(&self) -> &SimpleNetwork<D> {
        return &self.network;
    }

    pub fn network_mut(&mut self) -> &mut SimpleNetwork<D> {
        return &mut self.network;
    }

    pub fn into_inner(self) -> SimpleNetwork<D> {
        return self.network;
    }

    /// Broadcasts a `ping` so receivers in range can answer.
    ///
    /// `index` only shows up in the logs, it is not part of the frame.
    pub fn broadcast_ping_receiver(&mut self, index: u8) -> Result<(), Failures<PingFailure>> {
        log::debug!("Pinging receivers ({index})");
        return self.broadcast_command(&Command::ping());
    }

    /// Sends `command` to the broadcast address.
    ///
    /// The broadcast peer is added unencrypted for the duration of the send and
    /// removed afterwards, whatever the network's encryption mode. All three steps
    /// run even if one fails.
    pub fn broadcast_command(&mut self, command: &Command) -> Result<(), Failures<PingFailure>> {
        let mut failures = Failures::new();

        let broadcast_peer = PeerRecord {
            address: BROADCAST_ADDRESS,
            channel: self.network.channel(),
            encrypt: false,
            link_key: None,
        };
        if let Err(err) = failures.check(
            PingFailure::AddPeer,
            self.network.driver_mut().add_peer(&broadcast_peer),
        ) {
            log::warn!("Failed to add broadcast peer: {err}");
        }

        let sent = command
            .to_frame()
            .map_err(|_| DriverError::InvalidArgument)
            .and_then(|frame| self.network.send(&BROADCAST_ADDRESS, &frame));
        if let Err(err) = failures.check(PingFailure::Send, sent) {
            log::warn!("Failed to broadcast {}: {err}", command.cmd);
        }

        if let Err(err) = failures.check(
            PingFailure::RemovePeer,
            self.network.unregister_peer(&BROADCAST_ADDRESS),
        ) {
            log::warn!("Failed to remove broadcast peer: {err}");
        }

        return failures.into_result();
    }

    /// Handles a frame received from `mac`.
    ///
    /// A valid command frame gets its sender registered as an encrypted peer with
    /// `link_key`, and the decoded command is returned. Anything else is rejected
    /// before the peer table is touched.
    pub fn ping_return_handle(
        &mut self,
        mac: &MacAddress,
        incoming: &[u8],
        link_key: &Key,
    ) -> Result<Command, PingReturnError> {
        let Some(command) = Command::from_frame(incoming) else {
            log::debug!("Ignoring {} byte payload from {mac}", incoming.len());
            return Err(PingReturnError::NotACommand);
        };
        self.network.register_peer_encrypted(mac, link_key, false)?;
        log::debug!("{mac} answered with {} {}", command.cmd, command.param);
        return Ok(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Encryption,
        driver::{ReceiveInfo, SendStatus},
        mock::{DriverCall, MockRadio},
    };

    const RESPONDER: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0x0A, 0x1B, 0x9C]);

    fn on_receive(_info: &ReceiveInfo, _data: &[u8]) {}
    fn on_send(_address: &MacAddress, _status: SendStatus) {}

    fn link_key() -> Key {
        return Key::try_from("lmk-0123456789ab").unwrap();
    }

    fn started(encryption: Encryption) -> AdvanceNetwork<MockRadio> {
        let mut network =
            AdvanceNetwork::new(MockRadio::new(), RadioConfig::new(1, encryption).unwrap());
        match encryption {
            Encryption::Enabled => network
                .network_mut()
                .begin_encrypted(on_receive, on_send, &Key::try_from("pmk").unwrap())
                .unwrap(),
            Encryption::Disabled => network.network_mut().begin(on_receive, on_send).unwrap(),
        }
        network.network_mut().driver_mut().clear_calls();
        return network;
    }

    #[test]
    fn ping_is_broadcast_unencrypted_and_cleaned_up() {
        let mut network = started(Encryption::Enabled);
        assert_eq!(network.broadcast_ping_receiver(0), Ok(()));

        let driver = network.network().driver();
        assert!(!driver.peer_exists(&BROADCAST_ADDRESS));
        assert_eq!(
            driver.calls(),
            &[DriverCall::AddPeer, DriverCall::Send, DriverCall::RemovePeer]
        );
        let sent = &driver.sent()[0];
        assert_eq!(sent.address, BROADCAST_ADDRESS);
        assert_eq!(Command::from_frame(&sent.data), Some(Command::ping()));
    }

    #[test]
    fn ping_does_not_depend_on_index() {
        let mut network = started(Encryption::Disabled);
        network.broadcast_ping_receiver(0).unwrap();
        network.broadcast_ping_receiver(7).unwrap();
        let sent = network.network().driver().sent();
        assert_eq!(sent[0].data, sent[1].data);
    }

    #[test]
    fn ping_keeps_going_after_add_failure() {
        let mut network = started(Encryption::Enabled);
        network
            .network_mut()
            .driver_mut()
            .fail(DriverCall::AddPeer, DriverError::PeerListFull);
        let failures = network.broadcast_ping_receiver(0).unwrap_err();
        // Without the peer the send and the removal fail too
        assert_eq!(failures.bits(), 0x07);
        assert_eq!(
            network.network().driver().calls(),
            &[DriverCall::AddPeer, DriverCall::Send, DriverCall::RemovePeer]
        );
    }

    #[test]
    fn ping_reports_send_failure_alone() {
        let mut network = started(Encryption::Enabled);
        network
            .network_mut()
            .driver_mut()
            .fail(DriverCall::Send, DriverError::OutOfMemory);
        let failures = network.broadcast_ping_receiver(0).unwrap_err();
        assert_eq!(failures.bits(), 0x02);
        assert!(failures.contains(PingFailure::Send));
        assert!(!network.network().driver().peer_exists(&BROADCAST_ADDRESS));
    }

    #[test]
    fn unanswered_ping_still_counts_as_sent() {
        let mut network = started(Encryption::Enabled);
        network.network_mut().driver_mut().drop_deliveries(true);
        assert_eq!(network.broadcast_ping_receiver(0), Ok(()));
        assert_eq!(network.network().driver().sent().len(), 1);
    }

    #[test]
    fn ping_reports_remove_failure() {
        let mut network = started(Encryption::Disabled);
        network
            .network_mut()
            .driver_mut()
            .fail(DriverCall::RemovePeer, DriverError::Internal);
        let failures = network.broadcast_ping_receiver(0).unwrap_err();
        assert_eq!(failures.bits(), 0x04);
    }

    #[test]
    fn pong_registers_sender_as_encrypted_peer() {
        let mut network = started(Encryption::Enabled);
        let frame = Command::pong().to_frame().unwrap();

        let command = network
            .ping_return_handle(&RESPONDER, &frame, &link_key())
            .unwrap();
        assert!(command.is_pong());

        let peer = network.network().driver().peer(&RESPONDER).unwrap();
        assert!(peer.encrypt);
        assert_eq!(peer.link_key.as_ref(), Some(&link_key()));
        assert_eq!(network.network().last_peer(), Some(RESPONDER));
    }

    #[test]
    fn stray_payloads_register_nothing() {
        let mut network = started(Encryption::Enabled);
        let frame_len = Command::ping().to_frame().unwrap().len();
        let stray = [0x5Au8; 64];

        assert_eq!(
            network.ping_return_handle(&RESPONDER, &stray[..frame_len], &link_key()),
            Err(PingReturnError::NotACommand)
        );
        assert!(network.network().driver().peers().is_empty());
        assert!(network.network().driver().calls().is_empty());
    }

    #[test]
    fn repeated_answer_reports_registration_failure() {
        let mut network = started(Encryption::Enabled);
        let frame = Command::pong().to_frame().unwrap();
        network
            .ping_return_handle(&RESPONDER, &frame, &link_key())
            .unwrap();

        let err = network
            .ping_return_handle(&RESPONDER, &frame, &link_key())
            .unwrap_err();
        assert_eq!(
            err,
            PingReturnError::Register(RegisterFailure::AlreadyRegistered.into())
        );
    }

    #[test]
    fn unencrypted_network_cannot_register_answers() {
        let mut network = started(Encryption::Disabled);
        let frame = Command::pong().to_frame().unwrap();
        let PingReturnError::Register(failures) = network
            .ping_return_handle(&RESPONDER, &frame, &link_key())
            .unwrap_err()
        else {
            panic!("expected a registration failure");
        };
        assert!(failures.contains(RegisterFailure::WrongEncryptionMode));
    }

    #[test]
    fn broadcast_command_carries_any_command() {
        let mut network = started(Encryption::Enabled);
        network.broadcast_command(&Command::pong()).unwrap();
        let sent = &network.network().driver().sent()[0];
        assert_eq!(Command::from_frame(&sent.data), Some(Command::pong()));
    }
}
