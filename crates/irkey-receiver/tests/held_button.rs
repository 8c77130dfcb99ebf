//! End-to-end: a held remote button on the receiver side, decoded by the
//! host-side line parser.

use std::collections::VecDeque;

use irkey_core::protocol::parse_line;
use irkey_core::{NormalizedCode, ReceiverLine};
use irkey_receiver::{
    IrDecoder, IrProtocol, NormalizerConfig, RawDetection, Receiver, StatusLed,
};

struct FrameQueue(VecDeque<RawDetection>);

impl IrDecoder for FrameQueue {
    fn poll(&mut self, now_ms: u64) -> Option<RawDetection> {
        match self.0.front() {
            Some(frame) if frame.at_ms <= now_ms => self.0.pop_front(),
            _ => None,
        }
    }

    fn restart(&mut self) {
        self.0.clear();
    }
}

struct NoLed;

impl StatusLed for NoLed {
    fn set(&mut self, _on: bool) {}
}

/// NEC repeat frames arrive roughly every 108 ms while a button is held.
fn held_button(code: u32, start_ms: u64, frames: u64) -> Vec<RawDetection> {
    (0..frames)
        .map(|i| RawDetection::new(IrProtocol::Nec, code, 32, start_ms + i * 108))
        .collect()
}

fn host_codes(wire: &[u8]) -> Vec<NormalizedCode> {
    String::from_utf8_lossy(wire)
        .lines()
        .filter_map(|line| match parse_line(line) {
            Some(ReceiverLine::Code(code)) => Some(code),
            _ => None,
        })
        .collect()
}

#[test]
fn test_held_button_emits_at_repeat_threshold_cadence() {
    // Arrange
    let mut frames = held_button(0x08, 0, 10);
    frames.push(RawDetection::new(IrProtocol::Unknown, 0, 0, 1_000));
    frames.push(RawDetection::new(IrProtocol::Nec, 0x4AB0_F7B6, 32, 1_010));
    frames.extend(held_button(0x2F, 1_100, 1));
    let mut rx = Receiver::new(
        FrameQueue(frames.into_iter().collect()),
        NoLed,
        Vec::new(),
        NormalizerConfig::default(),
    );

    // Act
    for now in 0..=1_200u64 {
        rx.tick(now).unwrap();
    }

    // Assert
    let codes = host_codes(rx.writer());
    let eight = NormalizedCode::new("8").unwrap();
    assert_eq!(codes.iter().filter(|c| **c == eight).count(), 5);
    assert_eq!(codes.last(), Some(&NormalizedCode::new("2F").unwrap()));
    assert_eq!(rx.stats().noise, 2);
}

#[test]
fn test_status_query_round_trips_through_host_parser() {
    // Arrange
    let mut wire = Vec::new();
    let mut rx = Receiver::new(
        FrameQueue(held_button(0xEA, 0, 1).into_iter().collect()),
        NoLed,
        &mut wire,
        NormalizerConfig::default(),
    );
    rx.tick(0).unwrap();

    // Act
    rx.handle_command_byte(b'S', 5).unwrap();
    drop(rx);

    // Assert
    let lines: Vec<ReceiverLine> = String::from_utf8_lossy(&wire)
        .lines()
        .filter_map(parse_line)
        .collect();
    let ea = NormalizedCode::new("EA").unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], ReceiverLine::Code(ea.clone()));
    assert_eq!(lines[1], ReceiverLine::LastCode(Some(ea)));
    assert!(matches!(&lines[2], ReceiverLine::Status(text) if text.contains("accepted=1")));
}
