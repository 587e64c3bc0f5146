/// Command codes understood by the unit

use std::fmt;

/// Address the host probes to detect the extended-memory unit
pub const EXTENSION_PROBE_ADDRESS: u16 = 0x07EF;

/// Reply to a probe of [`EXTENSION_PROBE_ADDRESS`]
pub const EXTENSION_PRESENT: u8 = 0xE0;

/// A decoded command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// 0x00: clear the result status
    Initialize,
    /// 0x01: write sectors, one byte per transfer
    WriteSectors,
    /// 0x02: read sectors into the transfer buffer
    ReadSectors,
    /// 0x03: send the transfer buffer, one byte per transfer
    SendData,
    /// 0x04: copy sectors between drives
    Copy,
    /// 0x05: format a drive
    Format,
    /// 0x06: report the result status
    ResultStatus,
    /// 0x07: report the drive status
    DriveStatus,
    /// 0x0B: probe host memory
    MemoryProbe,
    /// 0x11: write sectors, two bytes per transfer
    FastWrite,
    /// 0x12: send the transfer buffer, two bytes per transfer
    FastSend,
    /// 0x14: report the device status of a drive
    DeviceStatus,
    /// 0x17: select a transfer mode
    ModeChange,
    /// Anything else
    Undefined(u8),
}

impl From<u8> for Command {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Command::Initialize,
            0x01 => Command::WriteSectors,
            0x02 => Command::ReadSectors,
            0x03 => Command::SendData,
            0x04 => Command::Copy,
            0x05 => Command::Format,
            0x06 => Command::ResultStatus,
            0x07 => Command::DriveStatus,
            0x0B => Command::MemoryProbe,
            0x11 => Command::FastWrite,
            0x12 => Command::FastSend,
            0x14 => Command::DeviceStatus,
            0x17 => Command::ModeChange,
            other => Command::Undefined(other),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.code()
    }
}

impl Command {
    /// Wire code
    pub fn code(&self) -> u8 {
        match self {
            Command::Initialize => 0x00,
            Command::WriteSectors => 0x01,
            Command::ReadSectors => 0x02,
            Command::SendData => 0x03,
            Command::Copy => 0x04,
            Command::Format => 0x05,
            Command::ResultStatus => 0x06,
            Command::DriveStatus => 0x07,
            Command::MemoryProbe => 0x0B,
            Command::FastWrite => 0x11,
            Command::FastSend => 0x12,
            Command::DeviceStatus => 0x14,
            Command::ModeChange => 0x17,
            Command::Undefined(code) => *code,
        }
    }

    /// Name used in the log
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize => "Initialize",
            Command::WriteSectors => "Write Disk",
            Command::ReadSectors => "Read Disk",
            Command::SendData => "Send Data",
            Command::Copy => "Copy",
            Command::Format => "Format",
            Command::ResultStatus => "Send Result Status",
            Command::DriveStatus => "Send Drive Status",
            Command::MemoryProbe => "Send Memory",
            Command::FastWrite => "Fast Write Disk",
            Command::FastSend => "Fast Send Data",
            Command::DeviceStatus => "Device Status",
            Command::ModeChange => "Mode Change",
            Command::Undefined(_) => "Undefined",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_codes() {
        assert_eq!(Command::from(0x00), Command::Initialize);
        assert_eq!(Command::from(0x0B), Command::MemoryProbe);
        assert_eq!(Command::from(0x14), Command::DeviceStatus);
        assert_eq!(Command::from(0x17), Command::ModeChange);
    }

    #[test]
    fn test_codes_survive_decoding() {
        for code in 0..=u8::MAX {
            assert_eq!(Command::from(code).code(), code);
        }
    }

    #[test]
    fn test_gaps_are_undefined() {
        for code in [0x08, 0x0A, 0x0C, 0x10, 0x13, 0x15, 0x16, 0x18, 0xFF] {
            assert_eq!(Command::from(code), Command::Undefined(code));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::FastWrite.to_string(), "Fast Write Disk (0x11)");
        assert_eq!(Command::Undefined(0x99).to_string(), "Undefined (0x99)");
    }
}
