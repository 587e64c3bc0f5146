/// Status values exchanged with the host and stored in sector records
///
/// The result status and device status are bit fields on the wire; here they
/// are structs of named flags with explicit byte conversions.

use std::fmt;

/// Outcome of the most recent storage operation, polled by command 0x06
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultStatus {
    /// The last storage operation failed
    pub error: bool,
    /// A read completed and its payload has not been sent yet
    pub unread: bool,
    /// I/O complete
    pub io_complete: bool,
}

impl ResultStatus {
    /// Error - Bit 0
    pub const ERROR: u8 = 0x01;

    /// Unread buffer - Bit 6
    pub const UNREAD: u8 = 0x40;

    /// I/O complete - Bit 7
    pub const IO_COMPLETE: u8 = 0x80;

    /// All flags clear, as set by the Initialize command
    pub const fn clear() -> Self {
        Self {
            error: false,
            unread: false,
            io_complete: false,
        }
    }

    /// Decode from the wire byte
    pub fn from_byte(value: u8) -> Self {
        Self {
            error: value & Self::ERROR != 0,
            unread: value & Self::UNREAD != 0,
            io_complete: value & Self::IO_COMPLETE != 0,
        }
    }

    /// Encode to the wire byte
    pub fn to_byte(&self) -> u8 {
        let mut value = 0;
        if self.error {
            value |= Self::ERROR;
        }
        if self.unread {
            value |= Self::UNREAD;
        }
        if self.io_complete {
            value |= Self::IO_COMPLETE;
        }
        value
    }
}

impl Default for ResultStatus {
    /// Power-on state: nothing pending, I/O complete
    fn default() -> Self {
        Self {
            error: false,
            unread: false,
            io_complete: true,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "complete={} unread={} err={}",
            self.io_complete as u8, self.unread as u8, self.error as u8
        )
    }
}

/// Drive status word reported verbatim by commands 0x07 and 0x14
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveStatus(pub u16);

impl DriveStatus {
    /// Power-on value of the unit
    pub const POWER_ON: u16 = 0b0011_0011;

    /// Byte placed on the data lines (only the low byte fits)
    #[inline]
    pub fn wire_byte(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl Default for DriveStatus {
    fn default() -> Self {
        DriveStatus(Self::POWER_ON)
    }
}

/// Per-drive status composed for command 0x14
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatus {
    /// ESIG - Bit 7
    pub error: bool,
    /// WPDR - Bit 6
    pub write_protected: bool,
    /// RDY - Bit 5
    pub ready: bool,
    /// TRK0 - Bit 4
    pub track_zero: bool,
    /// DSDR - Bit 3
    pub double_sided: bool,
    /// HDDR - Bit 2
    pub head: bool,
    /// DS1,DS2 - Bits 1:0
    pub drive_select: u8,
}

impl DeviceStatus {
    /// Error signal
    pub const ESIG: u8 = 0x80;
    /// Write protected
    pub const WPDR: u8 = 0x40;
    /// Ready
    pub const RDY: u8 = 0x20;
    /// Head on track 0
    pub const TRK0: u8 = 0x10;
    /// Double sided drive
    pub const DSDR: u8 = 0x08;
    /// Head select
    pub const HDDR: u8 = 0x04;
    /// Drive select mask
    pub const DS_MASK: u8 = 0x03;

    /// Compose the status of `drive` given the last addressed logical track
    pub fn compose(drive: u8, write_protected: bool, track: u8) -> Self {
        Self {
            error: false,
            write_protected,
            ready: true,
            track_zero: track == 0,
            double_sided: true,
            head: track % 2 == 1,
            drive_select: drive & Self::DS_MASK,
        }
    }

    /// Decode from a status byte
    pub fn from_byte(value: u8) -> Self {
        Self {
            error: value & Self::ESIG != 0,
            write_protected: value & Self::WPDR != 0,
            ready: value & Self::RDY != 0,
            track_zero: value & Self::TRK0 != 0,
            double_sided: value & Self::DSDR != 0,
            head: value & Self::HDDR != 0,
            drive_select: value & Self::DS_MASK,
        }
    }

    /// Encode to a status byte
    pub fn to_byte(&self) -> u8 {
        let flags = [
            (self.error, Self::ESIG),
            (self.write_protected, Self::WPDR),
            (self.ready, Self::RDY),
            (self.track_zero, Self::TRK0),
            (self.double_sided, Self::DSDR),
            (self.head, Self::HDDR),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(self.drive_select & Self::DS_MASK, |acc, (_, bit)| acc | bit)
    }
}

/// FDC status byte stored in each D88 sector record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordStatus(pub u8);

impl RecordStatus {
    /// Normal end
    pub const OK: u8 = 0x00;

    /// Deleted data address mark
    pub const DELETED: u8 = 0x10;

    /// CRC error in the ID field
    pub const ID_CRC: u8 = 0xA0;

    /// CRC error in the data field
    pub const DATA_CRC: u8 = 0xB0;

    /// No address mark
    pub const NO_ADDRESS_MARK: u8 = 0xE0;

    /// No data mark
    pub const NO_DATA_MARK: u8 = 0xF0;

    /// Create a new RecordStatus from a raw byte
    #[inline]
    pub fn new(value: u8) -> Self {
        RecordStatus(value)
    }

    /// Check if the record carries a deleted data mark
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.0 == Self::DELETED
    }

    /// Check if the record carries an error status (deleted data is not an error)
    #[inline]
    pub fn has_error(&self) -> bool {
        self.0 != Self::OK && !self.is_deleted()
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Self::OK => write!(f, "OK"),
            Self::DELETED => write!(f, "DDAM"),
            Self::ID_CRC => write!(f, "ID CRC"),
            Self::DATA_CRC => write!(f, "DATA CRC"),
            Self::NO_ADDRESS_MARK => write!(f, "NO AM"),
            Self::NO_DATA_MARK => write!(f, "NO DAM"),
            other => write!(f, "{:02X}h", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_status_power_on() {
        let status = ResultStatus::default();
        assert_eq!(status.to_byte(), 0x80);
        assert!(status.io_complete);
        assert!(!status.error);
    }

    #[test]
    fn test_result_status_bits() {
        let status = ResultStatus {
            error: true,
            unread: true,
            io_complete: false,
        };
        assert_eq!(status.to_byte(), 0x41);
        assert_eq!(ResultStatus::from_byte(0x41), status);
        assert_eq!(ResultStatus::clear().to_byte(), 0x00);
    }

    #[test]
    fn test_result_status_ignores_unused_bits() {
        let status = ResultStatus::from_byte(0x3E);
        assert_eq!(status, ResultStatus::clear());
    }

    #[test]
    fn test_result_status_display() {
        let status = ResultStatus::from_byte(0xC0);
        assert_eq!(status.to_string(), "complete=1 unread=1 err=0");
    }

    #[test]
    fn test_drive_status_wire_byte() {
        assert_eq!(DriveStatus::default().wire_byte(), 0x33);
        assert_eq!(DriveStatus(0x1234).wire_byte(), 0x34);
    }

    #[test]
    fn test_device_status_compose() {
        let status = DeviceStatus::compose(1, true, 0);
        assert_eq!(
            status.to_byte(),
            DeviceStatus::WPDR | DeviceStatus::RDY | DeviceStatus::TRK0 | DeviceStatus::DSDR | 0x01
        );

        let status = DeviceStatus::compose(0, false, 3);
        assert_eq!(status.to_byte(), DeviceStatus::RDY | DeviceStatus::DSDR | DeviceStatus::HDDR);
    }

    #[test]
    fn test_device_status_from_byte() {
        let status = DeviceStatus::from_byte(0xE6);
        assert!(status.error);
        assert!(status.write_protected);
        assert!(status.ready);
        assert!(!status.track_zero);
        assert!(status.head);
        assert_eq!(status.drive_select, 2);
        assert_eq!(status.to_byte(), 0xE6);
    }

    #[test]
    fn test_record_status() {
        assert!(!RecordStatus::new(RecordStatus::OK).has_error());
        assert!(RecordStatus::new(RecordStatus::DELETED).is_deleted());
        assert!(!RecordStatus::new(RecordStatus::DELETED).has_error());
        assert!(RecordStatus::new(RecordStatus::DATA_CRC).has_error());
    }

    #[test]
    fn test_record_status_display() {
        assert_eq!(RecordStatus::new(0x00).to_string(), "OK");
        assert_eq!(RecordStatus::new(0xB0).to_string(), "DATA CRC");
        assert_eq!(RecordStatus::new(0x42).to_string(), "42h");
    }
}
