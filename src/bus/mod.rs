/// Parallel bus handshake engine
///
/// Bytes move across the bus with a four-line handshake (ATN, DAV, RFD,
/// DAC). Each transfer carries one byte, or two in fast mode where the
/// second byte rides on the falling edge of DAV.
///
/// Every wait in this module is an unbounded busy-poll on one line level.
/// There is no timeout: a host that stops responding blocks the calling
/// thread forever. The only way out is the stop flag, which the process
/// raises from its interrupt handler; a wait that sees it returns
/// [`FddError::Interrupted`].

/// Host side of the handshake, for driving the unit without a real host
#[cfg(any(test, feature = "host-model"))]
pub mod host;
/// Pin assignment
pub mod pins;

#[cfg(any(test, feature = "host-model"))]
pub use host::HostPort;
pub use pins::{Line, PinMap};

use crate::error::{FddError, Result};
use crate::gpio::{Function, Gpio, Pull, RegisterBlock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bytes moved per handshake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// One byte per cycle
    Single,
    /// Two bytes per cycle (fast write / fast send)
    Fast,
}

impl TransferMode {
    /// Number of bytes carried by one cycle
    pub fn bytes_per_cycle(&self) -> usize {
        match self {
            TransferMode::Single => 1,
            TransferMode::Fast => 2,
        }
    }
}

/// Snapshot of the sensed handshake lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineState {
    /// ATN
    pub attention: bool,
    /// DAV
    pub data_valid: bool,
    /// RFD
    pub ready_for_data: bool,
    /// DAC
    pub data_accepted: bool,
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ATN={} DAV={} RFD={} DAC={}",
            self.attention as u8,
            self.data_valid as u8,
            self.ready_for_data as u8,
            self.data_accepted as u8
        )
    }
}

/// Device side of the bus handshake
#[derive(Debug)]
pub struct Handshake<R> {
    gpio: Gpio<R>,
    pins: PinMap,
    stop: Arc<AtomicBool>,
}

impl<R: RegisterBlock> Handshake<R> {
    /// Create an engine over `gpio` wired as `pins`
    pub fn new(gpio: Gpio<R>, pins: PinMap) -> Self {
        Self {
            gpio,
            pins,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use `stop` as the flag that abandons blocking waits
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that abandons blocking waits when raised
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Get the GPIO accessor
    pub fn gpio(&self) -> &Gpio<R> {
        &self.gpio
    }

    /// Get the pin assignment
    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// Put every bus pin in its idle configuration
    ///
    /// Inputs get a pull-down so an unplugged host reads as idle; outputs
    /// start low.
    pub fn configure(&self) {
        for (first, width) in self.pins.input_fields() {
            for pin in first..first + width {
                self.gpio.select_function(pin, Function::Input);
                self.gpio.set_pull(pin, Pull::Down);
            }
        }

        for (first, width) in self.pins.output_fields() {
            for pin in first..first + width {
                self.gpio.select_function(pin, Function::Output);
                self.gpio.write_pin(pin, false);
            }
        }
    }

    /// Return every GPIO to input mode
    pub fn release(&self) {
        log::info!("Set all GPIOs to input mode");
        self.gpio.release_all();
    }

    /// Sample the four sensed handshake lines
    pub fn lines(&self) -> LineState {
        LineState {
            attention: self.gpio.read_pin(self.pins.atn_in),
            data_valid: self.gpio.read_pin(self.pins.dav_in),
            ready_for_data: self.gpio.read_pin(self.pins.rfd_in),
            data_accepted: self.gpio.read_pin(self.pins.dac_in),
        }
    }

    fn trace(&self, step: &str) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{:>20} : {} [{:030b}]",
                step,
                self.lines(),
                self.gpio.read_field(2, 30)
            );
        }
    }

    /// Block until the sensed `line` reads `level`
    ///
    /// Spins without a timeout. Returns early only with
    /// [`FddError::Interrupted`] once the stop flag is raised.
    pub fn wait_for(&self, line: Line, level: bool) -> Result<()> {
        let pin = self.pins.sensed(line);
        while self.gpio.read_pin(pin) != level {
            if self.stop.load(Ordering::Relaxed) {
                return Err(FddError::Interrupted);
            }
            std::hint::spin_loop();
        }
        Ok(())
    }

    fn drive(&self, line: Line, level: bool) {
        if let Some(pin) = self.pins.driven(line) {
            self.gpio.write_pin(pin, level);
        }
    }

    fn read_data(&self) -> u8 {
        self.gpio.read_field(self.pins.data_in, PinMap::DATA_WIDTH) as u8
    }

    fn write_data(&self, value: u8) {
        self.gpio
            .write_field(self.pins.data_out, PinMap::DATA_WIDTH, value as u32);
    }

    /// Block until the host releases reset
    pub fn wait_reset_release(&self) -> Result<()> {
        self.trace("Wait for RST");
        self.wait_for(Line::Reset, true)?;
        self.trace("Catch RST");
        log::info!("Out of RESET");
        Ok(())
    }

    /// Send one byte, or two in fast mode (low byte first), to the host
    pub fn send(&self, mode: TransferMode, value: u16) -> Result<()> {
        let [first, second] = value.to_le_bytes();

        self.trace("Wait for RFD");
        self.wait_for(Line::ReadyForData, true)?;

        self.write_data(first);
        self.drive(Line::DataValid, true);

        self.trace("Wait for DAC");
        self.wait_for(Line::DataAccepted, true)?;

        if mode == TransferMode::Fast {
            self.write_data(second);
        }
        self.drive(Line::DataValid, false);

        self.trace("Wait DAC low");
        self.wait_for(Line::DataAccepted, false)?;
        self.trace("DAC low");
        Ok(())
    }

    /// Receive one byte, or two in fast mode (first byte in the low half)
    pub fn receive(&self, mode: TransferMode) -> Result<u16> {
        self.drive(Line::ReadyForData, true);

        self.trace("Wait for DAV");
        self.wait_for(Line::DataValid, true)?;
        self.trace("Catch DAV");

        self.drive(Line::ReadyForData, false);
        let mut value = self.read_data() as u16;
        self.drive(Line::DataAccepted, true);

        self.trace("Wait DAV low");
        self.wait_for(Line::DataValid, false)?;
        self.trace("DAV low");

        if mode == TransferMode::Fast {
            value |= (self.read_data() as u16) << 8;
        }
        self.drive(Line::DataAccepted, false);
        Ok(value)
    }

    /// Send a single byte
    pub fn send_byte(&self, value: u8) -> Result<()> {
        self.send(TransferMode::Single, value as u16)
    }

    /// Receive a single byte
    pub fn receive_byte(&self) -> Result<u8> {
        Ok(self.receive(TransferMode::Single)? as u8)
    }

    /// Receive a 16-bit value as two single-byte transfers, high byte first
    pub fn receive_word(&self) -> Result<u16> {
        let high = self.receive_byte()?;
        let low = self.receive_byte()?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Block until the host raises ATN, then take the command byte
    pub fn read_command(&self) -> Result<u8> {
        self.trace("Wait for ATN");
        self.wait_for(Line::Attention, true)?;
        self.trace("Catch ATN");
        self.receive_byte()
    }

    /// Receive `len` bytes into `buf`
    ///
    /// The host always sends all `len` bytes; any that do not fit in `buf`
    /// are taken off the bus and dropped.
    pub fn receive_block(&self, mode: TransferMode, buf: &mut [u8], len: usize) -> Result<()> {
        let step = mode.bytes_per_cycle();
        for start in (0..len).step_by(step) {
            let bytes = self.receive(mode)?.to_le_bytes();
            for (offset, byte) in bytes.iter().take(step).enumerate() {
                if let Some(slot) = buf.get_mut(start + offset) {
                    *slot = *byte;
                }
            }
        }
        if len > buf.len() {
            log::warn!("Dropped {} bytes beyond the transfer buffer", len - buf.len());
        }
        Ok(())
    }

    /// Send `len` bytes from `buf`, padding with zero past its end
    pub fn send_block(&self, mode: TransferMode, buf: &[u8], len: usize) -> Result<()> {
        let step = mode.bytes_per_cycle();
        for start in (0..len).step_by(step) {
            let first = buf.get(start).copied().unwrap_or(0);
            let second = match mode {
                TransferMode::Fast => buf.get(start + 1).copied().unwrap_or(0),
                TransferMode::Single => 0,
            };
            self.send(mode, u16::from_le_bytes([first, second]))?;
        }
        if len > buf.len() {
            log::warn!("Padded {} bytes beyond the transfer buffer", len - buf.len());
        }
        Ok(())
    }
}
