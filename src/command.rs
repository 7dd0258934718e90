use crate::wire::{Frame, FrameReader, FrameWriter, WireError};

/// Tags every command frame, so stray payloads are never mistaken for one
pub const COMMAND_MAGIC: [u8; 2] = *b"NW";
pub const COMMAND_VERSION: u8 = 1;
/// Longest `cmd` or `param` field, in bytes
pub const COMMAND_FIELD_LEN: usize = 16;

pub type CommandField = heapless::String<COMMAND_FIELD_LEN>;

pub trait Transmittable: Sized {
    fn encode(&self, frame_writer: &mut FrameWriter) -> Result<(), WireError>;
    fn decode(frame_reader: &mut FrameReader) -> Option<Self>;

    fn to_frame(&self) -> Result<Frame, WireError> {
        let mut frame_writer = FrameWriter::new();
        self.encode(&mut frame_writer)?;
        return Ok(frame_writer.finish());
    }
    fn from_frame(frame: &[u8]) -> Option<Self> {
        return Self::decode(&mut FrameReader::new(frame));
    }
}

/// Control message exchanged during the ping handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub cmd: CommandField,
    pub param: CommandField,
}
impl Command {
    /// Builds a command, or `None` when a field is longer than [`COMMAND_FIELD_LEN`].
    pub fn new(cmd: &str, param: &str) -> Option<Self> {
        return Some(Self {
            cmd: CommandField::try_from(cmd).ok()?,
            param: CommandField::try_from(param).ok()?,
        });
    }

    /// Announcement broadcast by a node looking for receivers
    pub fn ping() -> Self {
        return Self::fixed("ping", "init");
    }

    /// Reply to a [`Command::ping`]
    pub fn pong() -> Self {
        return Self::fixed("pong", "ack");
    }

    fn fixed(cmd: &'static str, param: &'static str) -> Self {
        let mut command = Self {
            cmd: CommandField::new(),
            param: CommandField::new(),
        };
        // Both literals are shorter than a field
        let _ = command.cmd.push_str(cmd);
        let _ = command.param.push_str(param);
        return command;
    }

    pub fn is_ping(&self) -> bool {
        return self.cmd == "ping";
    }

    pub fn is_pong(&self) -> bool {
        return self.cmd == "pong";
    }
}

impl Transmittable for Command {
    fn encode(&self, frame_writer: &mut FrameWriter) -> Result<(), WireError> {
        frame_writer.write_raw(&COMMAND_MAGIC)?;
        frame_writer.write_u8(COMMAND_VERSION)?;
        frame_writer.write_str(&self.cmd)?;
        return frame_writer.write_str(&self.param);
    }
    fn decode(frame_reader: &mut FrameReader) -> Option<Self> {
        if frame_reader.read_array::<2>()? != COMMAND_MAGIC {
            return None;
        }
        if frame_reader.read_u8()? != COMMAND_VERSION {
            return None;
        }
        let cmd = CommandField::try_from(frame_reader.read_str()?.ok()?).ok()?;
        let param = CommandField::try_from(frame_reader.read_str()?.ok()?).ok()?;
        return Some(Self { cmd, param });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_frame_layout() {
        let frame = Command::ping().to_frame().unwrap();
        assert_eq!(
            frame.as_slice(),
            b"NW\x01\x00\x04ping\x00\x04init".as_slice()
        );
    }

    #[test]
    fn decodes_tagged_frames() {
        let command = Command::from_frame(b"NW\x01\x00\x04pong\x00\x03ack").unwrap();
        assert!(command.is_pong());
        assert!(!command.is_ping());
        assert_eq!(command.param, "ack");
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut frame = Command::ping().to_frame().unwrap();
        frame.extend_from_slice(&[0xAA; 8]).unwrap();
        assert_eq!(Command::from_frame(&frame), Some(Command::ping()));
    }

    #[test]
    fn rejects_untagged_payloads() {
        // Same length as a ping frame, but not one
        assert_eq!(Command::from_frame(&[0u8; 15]), None);
        assert_eq!(Command::from_frame(b"XW\x01\x00\x04ping\x00\x04init"), None);
        assert_eq!(Command::from_frame(b"NW\x02\x00\x04ping\x00\x04init"), None);
        assert_eq!(Command::from_frame(b""), None);
    }

    #[test]
    fn rejects_truncated_and_oversized_fields() {
        assert_eq!(Command::from_frame(b"NW\x01\x00\x04ping\x00\x04in"), None);
        assert_eq!(
            Command::from_frame(b"NW\x01\x00\x11abcdefghijklmnopq\x00\x00"),
            None
        );
        assert_eq!(Command::from_frame(b"NW\x01\x00\x01\xFF\x00\x00"), None);
    }

    #[test]
    fn new_bounds_field_length() {
        assert!(Command::new("ping", "0123456789abcdef").is_some());
        assert!(Command::new("ping", "0123456789abcdefg").is_none());
    }
}
