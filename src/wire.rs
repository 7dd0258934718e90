use core::str::{self, Utf8Error};

use thiserror::Error;

use crate::driver::MAX_DATA_LEN;

/// One ESP-NOW payload worth of bytes
pub type Frame = heapless::Vec<u8, MAX_DATA_LEN>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The data is too large to include in the frame
    #[error("Data does not fit in a single frame")]
    TooLarge,
}

/// Builds single-frame payloads. Integers are big-endian, byte strings carry a
/// `u16` length prefix.
pub struct FrameWriter {
    frame: Frame,
}
impl FrameWriter {
    pub fn new() -> Self {
        return Self { frame: Frame::new() };
    }

    pub fn write_u8(&mut self, num: u8) -> Result<(), WireError> {
        return self.frame.push(num).map_err(|_| WireError::TooLarge);
    }
    pub fn write_u16(&mut self, num: u16) -> Result<(), WireError> {
        return self.write_raw(&num.to_be_bytes());
    }

    /// Appends bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        return self
            .frame
            .extend_from_slice(bytes)
            .map_err(|_| WireError::TooLarge);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let length = u16::try_from(bytes.len()).map_err(|_| WireError::TooLarge)?;
        if self.frame.len() + 2 + bytes.len() > MAX_DATA_LEN {
            return Err(WireError::TooLarge);
        }
        self.write_u16(length)?;
        return self.write_raw(bytes);
    }
    pub fn write_str(&mut self, string: &str) -> Result<(), WireError> {
        return self.write_bytes(string.as_bytes());
    }

    pub fn finish(self) -> Frame {
        return self.frame;
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        return Self::new();
    }
}

/// Reads payloads built by [`FrameWriter`]. Every read returns `None` once the
/// frame runs out, leaving the reader where it was.
pub struct FrameReader<'a> {
    frame: &'a [u8],
}
impl<'a> FrameReader<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        return Self { frame };
    }

    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, rest) = self.frame.split_first_chunk::<N>()?;
        self.frame = rest;
        return Some(*head);
    }
    pub fn read_u8(&mut self) -> Option<u8> {
        return Some(u8::from_be_bytes(self.read_array()?));
    }
    pub fn read_u16(&mut self) -> Option<u16> {
        return Some(u16::from_be_bytes(self.read_array()?));
    }

    pub fn read_bytes(&mut self) -> Option<&'a [u8]> {
        let (prefix, rest) = self.frame.split_first_chunk::<2>()?;
        let length = u16::from_be_bytes(*prefix) as usize;
        if rest.len() < length {
            return None;
        }
        let (data, rest) = rest.split_at(length);
        self.frame = rest;
        return Some(data);
    }
    pub fn read_str(&mut self) -> Option<Result<&'a str, Utf8Error>> {
        return Some(str::from_utf8(self.read_bytes()?));
    }

    pub fn remainder(self) -> &'a [u8] {
        return self.frame;
    }
}
