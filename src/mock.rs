//! In-memory stand-in for the ESP-NOW driver.
//!
//! Keeps a peer table with the same capacity as the real one, records every call
//! and transmitted frame, and lets tests queue inbound frames or make any driver
//! call fail with a chosen status.

extern crate alloc;

use alloc::{collections::VecDeque, vec::Vec};

use crate::{
    config::Channel,
    driver::{
        DriverError, PeerRecord, RadioDriver, ReceiveCallback, ReceivedFrame, SendCallback,
        SendStatus, MAX_DATA_LEN, MAX_PEERS,
    },
    key::Key,
    mac::MacAddress,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    SetStationMode,
    SetChannel,
    Init,
    SetPrimaryKey,
    RegisterReceiveCallback,
    RegisterSendCallback,
    AddPeer,
    RemovePeer,
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub address: MacAddress,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MockRadio {
    station_mode: bool,
    channel: Option<Channel>,
    initialized: bool,
    primary_key: Option<Key>,
    on_receive: Option<ReceiveCallback>,
    on_send: Option<SendCallback>,
    peers: Vec<PeerRecord>,
    sent: Vec<SentFrame>,
    inbox: VecDeque<ReceivedFrame>,
    calls: Vec<DriverCall>,
    failing: Vec<(DriverCall, DriverError)>,
    undelivered: bool,
}
impl MockRadio {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Makes every later `call` fail with `error` until [`MockRadio::heal`].
    pub fn fail(&mut self, call: DriverCall, error: DriverError) {
        self.failing.retain(|(failing, _)| *failing != call);
        self.failing.push((call, error));
    }

    pub fn heal(&mut self) {
        self.failing.clear();
    }

    /// While set, sends still queue their frame but the send callback hears
    /// [`SendStatus::Failed`].
    pub fn drop_deliveries(&mut self, undelivered: bool) {
        self.undelivered = undelivered;
    }

    /// Queues a frame for the next [`RadioDriver::receive`].
    pub fn deliver(&mut self, frame: ReceivedFrame) {
        self.inbox.push_back(frame);
    }

    pub fn is_station_mode(&self) -> bool {
        return self.station_mode;
    }

    pub fn channel(&self) -> Option<Channel> {
        return self.channel;
    }

    pub fn is_initialized(&self) -> bool {
        return self.initialized;
    }

    pub fn primary_key(&self) -> Option<&Key> {
        return self.primary_key.as_ref();
    }

    pub fn has_receive_callback(&self) -> bool {
        return self.on_receive.is_some();
    }

    pub fn has_send_callback(&self) -> bool {
        return self.on_send.is_some();
    }

    pub fn peers(&self) -> &[PeerRecord] {
        return &self.peers;
    }

    pub fn peer(&self, address: &MacAddress) -> Option<&PeerRecord> {
        return self.peers.iter().find(|peer| peer.address == *address);
    }

    pub fn sent(&self) -> &[SentFrame] {
        return &self.sent;
    }

    /// Every driver call so far, in order.
    pub fn calls(&self) -> &[DriverCall] {
        return &self.calls;
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn enter(&mut self, call: DriverCall) -> Result<(), DriverError> {
        self.calls.push(call);
        return match self.failing.iter().find(|(failing, _)| *failing == call) {
            Some((_, error)) => Err(*error),
            None => Ok(()),
        };
    }

    fn require_init(&self) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        return Ok(());
    }
}

impl RadioDriver for MockRadio {
    fn set_station_mode(&mut self) -> Result<(), DriverError> {
        self.enter(DriverCall::SetStationMode)?;
        self.station_mode = true;
        return Ok(());
    }

    fn set_channel(&mut self, channel: Channel) -> Result<(), DriverError> {
        self.enter(DriverCall::SetChannel)?;
        self.channel = Some(channel);
        return Ok(());
    }

    fn init(&mut self) -> Result<(), DriverError> {
        self.enter(DriverCall::Init)?;
        self.initialized = true;
        return Ok(());
    }

    fn set_primary_key(&mut self, key: &Key) -> Result<(), DriverError> {
        self.enter(DriverCall::SetPrimaryKey)?;
        self.require_init()?;
        self.primary_key = Some(key.clone());
        return Ok(());
    }

    fn register_receive_callback(&mut self, callback: ReceiveCallback) -> Result<(), DriverError> {
        self.enter(DriverCall::RegisterReceiveCallback)?;
        self.require_init()?;
        self.on_receive = Some(callback);
        return Ok(());
    }

    fn register_send_callback(&mut self, callback: SendCallback) -> Result<(), DriverError> {
        self.enter(DriverCall::RegisterSendCallback)?;
        self.require_init()?;
        self.on_send = Some(callback);
        return Ok(());
    }

    fn peer_exists(&self, address: &MacAddress) -> bool {
        return self.peer(address).is_some();
    }

    fn add_peer(&mut self, peer: &PeerRecord) -> Result<(), DriverError> {
        self.enter(DriverCall::AddPeer)?;
        self.require_init()?;
        if self.peer_exists(&peer.address) {
            return Err(DriverError::PeerExists);
        }
        if self.peers.len() >= MAX_PEERS {
            return Err(DriverError::PeerListFull);
        }
        self.peers.push(peer.clone());
        return Ok(());
    }

    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), DriverError> {
        self.enter(DriverCall::RemovePeer)?;
        self.require_init()?;
        let index = self
            .peers
            .iter()
            .position(|peer| peer.address == *address)
            .ok_or(DriverError::NotFound)?;
        self.peers.remove(index);
        return Ok(());
    }

    fn send(&mut self, address: &MacAddress, data: &[u8]) -> Result<(), DriverError> {
        self.enter(DriverCall::Send)?;
        self.require_init()?;
        if data.is_empty() || data.len() > MAX_DATA_LEN {
            return Err(DriverError::InvalidArgument);
        }
        if !self.peer_exists(address) {
            return Err(DriverError::NotFound);
        }
        self.sent.push(SentFrame {
            address: *address,
            data: data.to_vec(),
        });
        if let Some(on_send) = self.on_send {
            let status = match self.undelivered {
                true => SendStatus::Failed,
                false => SendStatus::Success,
            };
            on_send(address, status);
        }
        return Ok(());
    }

    fn receive(&mut self) -> Option<ReceivedFrame> {
        let frame = self.inbox.pop_front()?;
        if let Some(on_receive) = self.on_receive {
            on_receive(&frame.info, frame.data());
        }
        return Some(frame);
    }
}
