//! Additive failure reporting.
//!
//! Multi-step operations keep going after a step fails and report every failed
//! step at once. Each operation has its own set of named reasons, and each reason
//! owns one bit of the legacy status byte returned by [`Failures::bits`].

use core::{fmt, marker::PhantomData};

use thiserror::Error;

/// A named failure reason that owns one bit of an operation's status byte.
pub trait Flag: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// Every reason, in bit order
    const ALL: &'static [Self];

    fn bit(self) -> u8;
}

/// Set of failure reasons reported by one call.
///
/// An operation returns `Err(Failures)` only when at least one reason is set.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Failures<F: Flag> {
    bits: u8,
    _flag: PhantomData<F>,
}
impl<F: Flag> Failures<F> {
    pub fn new() -> Self {
        return Self {
            bits: 0,
            _flag: PhantomData,
        };
    }

    pub fn insert(&mut self, flag: F) {
        self.bits |= flag.bit();
    }

    /// Sets `flag` when `step` failed, passing the step's result through.
    pub(crate) fn check<T, E>(&mut self, flag: F, step: Result<T, E>) -> Result<T, E> {
        if step.is_err() {
            self.insert(flag);
        }
        return step;
    }

    /// Sets `flag` when `step` failed.
    pub(crate) fn record<T, E>(&mut self, flag: F, step: &Result<T, E>) {
        if step.is_err() {
            self.insert(flag);
        }
    }

    pub fn contains(&self, flag: F) -> bool {
        return self.bits & flag.bit() != 0;
    }

    pub fn is_empty(&self) -> bool {
        return self.bits == 0;
    }

    /// The raw status byte, one bit per reason.
    pub fn bits(&self) -> u8 {
        return self.bits;
    }

    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        return F::ALL.iter().copied().filter(|flag| self.contains(*flag));
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            return Ok(());
        }
        return Err(self);
    }
}

impl<F: Flag> Default for Failures<F> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<F: Flag> From<F> for Failures<F> {
    fn from(flag: F) -> Self {
        let mut failures = Self::new();
        failures.insert(flag);
        return failures;
    }
}

impl<F: Flag> fmt::Debug for Failures<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.debug_set().entries(self.iter()).finish();
    }
}

impl<F: Flag> fmt::Display for Failures<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{flag}")?;
        }
        return Ok(());
    }
}

impl<F: Flag> core::error::Error for Failures<F> {}

/// Failures of [`SimpleNetwork::begin`](crate::network::SimpleNetwork::begin)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BeginFailure {
    #[error("network is configured for encryption")]
    WrongEncryptionMode = 0x01,
    #[error("radio stack failed to initialize")]
    StackInit = 0x02,
    #[error("receive callback was not registered")]
    ReceiveCallback = 0x04,
    #[error("send callback was not registered")]
    SendCallback = 0x08,
}
impl Flag for BeginFailure {
    const ALL: &'static [Self] = &[
        Self::WrongEncryptionMode,
        Self::StackInit,
        Self::ReceiveCallback,
        Self::SendCallback,
    ];
    fn bit(self) -> u8 {
        return self as u8;
    }
}

/// Failures of [`SimpleNetwork::begin_encrypted`](crate::network::SimpleNetwork::begin_encrypted)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SecureBeginFailure {
    #[error("network is configured without encryption")]
    WrongEncryptionMode = 0x01,
    #[error("radio stack failed to initialize")]
    StackInit = 0x02,
    #[error("primary key was not installed")]
    PrimaryKey = 0x04,
    #[error("receive callback was not registered")]
    ReceiveCallback = 0x08,
    #[error("send callback was not registered")]
    SendCallback = 0x10,
}
impl Flag for SecureBeginFailure {
    const ALL: &'static [Self] = &[
        Self::WrongEncryptionMode,
        Self::StackInit,
        Self::PrimaryKey,
        Self::ReceiveCallback,
        Self::SendCallback,
    ];
    fn bit(self) -> u8 {
        return self as u8;
    }
}

/// Failures of peer registration, plain or encrypted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegisterFailure {
    #[error("peer kind does not match the network's encryption mode")]
    WrongEncryptionMode = 0x01,
    #[error("peer is already registered")]
    AlreadyRegistered = 0x02,
    #[error("radio refused the peer")]
    AddPeer = 0x04,
}
impl Flag for RegisterFailure {
    const ALL: &'static [Self] = &[
        Self::WrongEncryptionMode,
        Self::AlreadyRegistered,
        Self::AddPeer,
    ];
    fn bit(self) -> u8 {
        return self as u8;
    }
}

/// Failures of a broadcast announcement.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PingFailure {
    #[error("broadcast peer could not be added")]
    AddPeer = 0x01,
    #[error("broadcast frame was not sent")]
    Send = 0x02,
    #[error("broadcast peer could not be removed")]
    RemovePeer = 0x04,
}
impl Flag for PingFailure {
    const ALL: &'static [Self] = &[Self::AddPeer, Self::Send, Self::RemovePeer];
    fn bit(self) -> u8 {
        return self as u8;
    }
}
