/// Host side of the bus over in-memory registers
///
/// Plays the computer's half of every handshake against a unit that shares
/// the same [`SimRegisters`]. The unit never times out, but a host model
/// does: a wait that runs past the deadline panics, so a stuck test fails
/// instead of hanging.
///
/// Test support only: built for unit tests and with the `host-model`
/// feature.

use super::{Line, PinMap, TransferMode};
use crate::gpio::SimRegisters;
use std::time::{Duration, Instant};

/// How long a host wait may spin before giving up
pub const HOST_TIMEOUT: Duration = Duration::from_secs(5);

/// Host model driving the unit's inputs
#[derive(Debug, Clone)]
pub struct HostPort {
    regs: SimRegisters,
    pins: PinMap,
}

impl HostPort {
    /// Create a host on `regs`, wired as `pins`
    pub fn new(regs: SimRegisters, pins: PinMap) -> Self {
        Self { regs, pins }
    }

    /// Level the unit currently drives on `line`
    ///
    /// Lines the unit never drives read low.
    pub fn device_line(&self, line: Line) -> bool {
        self.pins
            .driven(line)
            .map(|pin| self.regs.level(pin))
            .unwrap_or(false)
    }

    fn set(&self, line: Line, level: bool) {
        self.regs.set_level(self.pins.sensed(line), level);
    }

    fn wait_device(&self, line: Line, level: bool) {
        let deadline = Instant::now() + HOST_TIMEOUT;
        while self.device_line(line) != level {
            if Instant::now() > deadline {
                panic!(
                    "host timed out waiting for {} to go {}",
                    line,
                    if level { "high" } else { "low" }
                );
            }
            std::thread::yield_now();
        }
    }

    fn put_data(&self, value: u8) {
        self.regs
            .set_field(self.pins.data_in, PinMap::DATA_WIDTH, value as u32);
    }

    fn get_data(&self) -> u8 {
        self.regs.field(self.pins.data_out, PinMap::DATA_WIDTH) as u8
    }

    /// Pull the reset line inactive
    pub fn release_reset(&self) {
        self.set(Line::Reset, true);
    }

    /// Send one byte, or two in fast mode (low byte first)
    pub fn send(&self, mode: TransferMode, value: u16) {
        let [first, second] = value.to_le_bytes();

        self.wait_device(Line::ReadyForData, true);
        self.put_data(first);
        self.set(Line::DataValid, true);

        self.wait_device(Line::DataAccepted, true);
        if mode == TransferMode::Fast {
            self.put_data(second);
        }
        self.set(Line::DataValid, false);

        self.wait_device(Line::DataAccepted, false);
    }

    /// Receive one byte, or two in fast mode (first byte in the low half)
    pub fn receive(&self, mode: TransferMode) -> u16 {
        self.set(Line::ReadyForData, true);
        self.wait_device(Line::DataValid, true);

        self.set(Line::ReadyForData, false);
        let mut value = self.get_data() as u16;
        self.set(Line::DataAccepted, true);

        self.wait_device(Line::DataValid, false);
        if mode == TransferMode::Fast {
            value |= (self.get_data() as u16) << 8;
        }
        self.set(Line::DataAccepted, false);
        value
    }

    /// Raise ATN, send a command byte, drop ATN
    pub fn command(&self, code: u8) {
        self.set(Line::Attention, true);
        self.send(TransferMode::Single, code as u16);
        self.set(Line::Attention, false);
    }

    /// Send a single byte
    pub fn send_byte(&self, value: u8) {
        self.send(TransferMode::Single, value as u16);
    }

    /// Receive a single byte
    pub fn receive_byte(&self) -> u8 {
        self.receive(TransferMode::Single) as u8
    }

    /// Send every byte of `data`
    ///
    /// In fast mode an odd trailing byte goes out paired with a zero.
    pub fn send_bytes(&self, mode: TransferMode, data: &[u8]) {
        for chunk in data.chunks(mode.bytes_per_cycle()) {
            let first = chunk[0];
            let second = chunk.get(1).copied().unwrap_or(0);
            self.send(mode, u16::from_le_bytes([first, second]));
        }
    }

    /// Receive `len` bytes
    pub fn receive_bytes(&self, mode: TransferMode, len: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            let bytes = self.receive(mode).to_le_bytes();
            let take = mode.bytes_per_cycle().min(len - data.len());
            data.extend_from_slice(&bytes[..take]);
        }
        data
    }
}
