//! Raw decoder output.

use std::fmt;

/// IR protocols the decoding substrate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrProtocol {
    Unknown,
    Nec,
    Samsung,
    Sony,
    Rc5,
    Rc6,
    Panasonic,
    Jvc,
    Lg,
    Sharp,
    Denon,
}

impl fmt::Display for IrProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IrProtocol::Unknown => "UNKNOWN",
            IrProtocol::Nec => "NEC",
            IrProtocol::Samsung => "SAMSUNG",
            IrProtocol::Sony => "SONY",
            IrProtocol::Rc5 => "RC5",
            IrProtocol::Rc6 => "RC6",
            IrProtocol::Panasonic => "PANASONIC",
            IrProtocol::Jvc => "JVC",
            IrProtocol::Lg => "LG",
            IrProtocol::Sharp => "SHARP",
            IrProtocol::Denon => "DENON",
        };
        f.write_str(name)
    }
}

/// One decode cycle's result. Discarded after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDetection {
    pub protocol: IrProtocol,
    pub code: u32,
    pub bits: u8,
    /// Milliseconds since the receiver started.
    pub at_ms: u64,
}

impl RawDetection {
    pub fn new(protocol: IrProtocol, code: u32, bits: u8, at_ms: u64) -> Self {
        Self {
            protocol,
            code,
            bits,
            at_ms,
        }
    }
}
