//! Serial protocol between the IR receiver and the host: the code line codec
//! and the single-byte command channel.

pub mod command;
pub mod line;

pub use command::ReceiverCommand;
pub use line::{
    format_code_line, format_last_code_reply, format_status_reply, parse_code_line, parse_line,
    ReceiverLine,
};
