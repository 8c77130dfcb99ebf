//! Line codec for the receiver → host direction.
//!
//! Wire format (ASCII, one record per line):
//! ```text
//! 0x08\n            accepted IR code, "0x%02X" (case-insensitive on read)
//! OK:0x08\n         reply to 'S': last accepted code
//! OK:NONE\n         reply to 'S': nothing accepted yet
//! STATUS:<text>\n   human-readable line following OK:
//! RST\n             reply to 'R'
//! ```
//! A trailing `\r` is tolerated. Anything else is noise and is ignored.

use crate::code::{strip_hex_prefix, NormalizedCode};

/// Upper bound on hex digits in a code line (32-bit codes).
pub const MAX_CODE_DIGITS: usize = 8;

/// Prefix of the status reply.
pub const OK_PREFIX: &str = "OK:";
/// Payload of [`OK_PREFIX`] when no code has been accepted yet.
pub const OK_NONE: &str = "NONE";
/// Prefix of the human-readable status line.
pub const STATUS_PREFIX: &str = "STATUS:";
/// Reply to the reset command.
pub const RESET_REPLY: &str = "RST";

/// A recognized line received from the IR receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverLine {
    /// An accepted IR code.
    Code(NormalizedCode),
    /// `OK:` reply carrying the last accepted code, if any.
    LastCode(Option<NormalizedCode>),
    /// `STATUS:` reply text.
    Status(String),
    /// `RST` reset acknowledgement.
    ResetAck,
}

/// Formats an accepted code the way the receiver puts it on the wire.
pub fn format_code_line(code: u32) -> String {
    format!("0x{code:02X}\n")
}

/// Formats the `OK:` reply for the status command.
pub fn format_last_code_reply(last: Option<u32>) -> String {
    match last {
        Some(code) => format!("{OK_PREFIX}0x{code:02X}\n"),
        None => format!("{OK_PREFIX}{OK_NONE}\n"),
    }
}

/// Formats the `STATUS:` line.
pub fn format_status_reply(text: &str) -> String {
    format!("{STATUS_PREFIX}{text}\n")
}

/// Parses a strict code line: `0x` or `0X` followed by 1–8 hex digits.
///
/// Returns `None` for anything else, including partial lines such as `"0x"`.
pub fn parse_code_line(line: &str) -> Option<NormalizedCode> {
    let trimmed = line.trim_end_matches(['\r', '\n']).trim();
    let digits = strip_hex_prefix(trimmed)?;
    if digits.is_empty()
        || digits.len() > MAX_CODE_DIGITS
        || !digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .map(NormalizedCode::from_value)
}

/// Classifies one line from the receiver.
pub fn parse_line(line: &str) -> Option<ReceiverLine> {
    let trimmed = line.trim_end_matches(['\r', '\n']).trim();
    if let Some(code) = parse_code_line(trimmed) {
        return Some(ReceiverLine::Code(code));
    }
    if let Some(rest) = trimmed.strip_prefix(OK_PREFIX) {
        if rest.eq_ignore_ascii_case(OK_NONE) {
            return Some(ReceiverLine::LastCode(None));
        }
        return parse_code_line(rest).map(|code| ReceiverLine::LastCode(Some(code)));
    }
    if let Some(text) = trimmed.strip_prefix(STATUS_PREFIX) {
        return Some(ReceiverLine::Status(text.trim().to_string()));
    }
    if trimmed == RESET_REPLY {
        return Some(ReceiverLine::ResetAck);
    }
    None
}
