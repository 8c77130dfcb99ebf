//! Single-byte commands sent from the host to the IR receiver.

/// A command understood by the receiver firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverCommand {
    /// `S`: report the last accepted code and a status line.
    Status,
    /// `R`: clear repeat tracking and restart the decoder.
    Reset,
}

impl ReceiverCommand {
    /// The byte written to the serial link.
    pub fn as_byte(self) -> u8 {
        match self {
            ReceiverCommand::Status => b'S',
            ReceiverCommand::Reset => b'R',
        }
    }

    /// Decodes a command byte; any other byte is not a command.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(ReceiverCommand::Status),
            b'R' => Some(ReceiverCommand::Reset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes_round_trip() {
        for cmd in [ReceiverCommand::Status, ReceiverCommand::Reset] {
            assert_eq!(ReceiverCommand::from_byte(cmd.as_byte()), Some(cmd));
        }
    }

    #[test]
    fn test_other_bytes_are_not_commands() {
        for byte in [b's', b'r', b'\n', b'X', 0u8, 0xFF] {
            assert_eq!(ReceiverCommand::from_byte(byte), None, "byte 0x{byte:02X}");
        }
    }
}
