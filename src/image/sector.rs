/// Sector record data structures

use crate::error::{FddError, Result};
use crate::fdc::RecordStatus;
use crate::format::constants::*;

/// Sector ID (CHRN) - addressing information for a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorId {
    /// C - Cylinder number
    pub cylinder: u8,
    /// H - Head number
    pub head: u8,
    /// R - Record number (1-based)
    pub record: u8,
    /// N - Size code (0=128, 1=256, 2=512, ...)
    pub size_code: u8,
}

impl SectorId {
    /// Create a new sector ID
    pub fn new(cylinder: u8, head: u8, record: u8, size_code: u8) -> Self {
        Self {
            cylinder,
            head,
            record,
            size_code,
        }
    }

    /// ID of the 0-based `sector` on a logical track, as the unit addresses it
    pub fn on_track(track: u8, sector: u8) -> Self {
        let (cylinder, head) = track_to_cylinder_head(track);
        Self::new(cylinder, head, sector.wrapping_add(1), SECTOR_SIZE_CODE)
    }
}

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "C={} H={} R={} N={}",
            self.cylinder, self.head, self.record, self.size_code
        )
    }
}

/// One D88 sector record: 16-byte header followed by a 256-byte payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorRecord {
    /// Sector addressing information (CHRN)
    pub id: SectorId,
    /// Number of sectors the track declares
    pub sectors_in_track: u16,
    /// Density byte (kept verbatim)
    pub density: u8,
    /// Deleted data flag (kept verbatim)
    pub deleted: u8,
    /// FDC status of the record
    pub status: RecordStatus,
    /// Reserved bytes (kept verbatim)
    pub reserved: [u8; 5],
    /// Declared payload size in bytes
    pub data_size: u16,
    data: [u8; SECTOR_SIZE],
}

impl SectorRecord {
    /// Create a freshly formatted record for the 0-based `index` on `track`
    pub fn formatted(track: u8, index: u8) -> Self {
        Self {
            id: SectorId::on_track(track, index),
            sectors_in_track: SECTORS_PER_TRACK as u16,
            density: FORMAT_DENSITY,
            deleted: 0,
            status: RecordStatus::default(),
            reserved: [0; 5],
            data_size: SECTOR_SIZE as u16,
            data: [0; SECTOR_SIZE],
        }
    }

    /// Decode a record from exactly `SECTOR_RECORD_SIZE` bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECTOR_RECORD_SIZE {
            return Err(FddError::invalid_format(format!(
                "sector record is {} bytes, expected {}",
                bytes.len(),
                SECTOR_RECORD_SIZE
            )));
        }

        let mut reserved = [0u8; 5];
        reserved.copy_from_slice(&bytes[RECORD_RESERVED_OFFSET..RECORD_RESERVED_OFFSET + 5]);
        let mut data = [0u8; SECTOR_SIZE];
        data.copy_from_slice(&bytes[SECTOR_HEADER_SIZE..]);

        Ok(Self {
            id: SectorId::new(
                bytes[RECORD_CYLINDER_OFFSET],
                bytes[RECORD_HEAD_OFFSET],
                bytes[RECORD_NUMBER_OFFSET],
                bytes[RECORD_SIZE_CODE_OFFSET],
            ),
            sectors_in_track: u16::from_le_bytes([
                bytes[RECORD_SECTOR_COUNT_OFFSET],
                bytes[RECORD_SECTOR_COUNT_OFFSET + 1],
            ]),
            density: bytes[RECORD_DENSITY_OFFSET],
            deleted: bytes[RECORD_DELETED_OFFSET],
            status: RecordStatus::new(bytes[RECORD_STATUS_OFFSET]),
            reserved,
            data_size: u16::from_le_bytes([
                bytes[RECORD_DATA_SIZE_OFFSET],
                bytes[RECORD_DATA_SIZE_OFFSET + 1],
            ]),
            data,
        })
    }

    /// Encode the record into `out`, which must be `SECTOR_RECORD_SIZE` bytes
    pub fn write_to(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), SECTOR_RECORD_SIZE);

        out[RECORD_CYLINDER_OFFSET] = self.id.cylinder;
        out[RECORD_HEAD_OFFSET] = self.id.head;
        out[RECORD_NUMBER_OFFSET] = self.id.record;
        out[RECORD_SIZE_CODE_OFFSET] = self.id.size_code;
        out[RECORD_SECTOR_COUNT_OFFSET..RECORD_SECTOR_COUNT_OFFSET + 2]
            .copy_from_slice(&self.sectors_in_track.to_le_bytes());
        out[RECORD_DENSITY_OFFSET] = self.density;
        out[RECORD_DELETED_OFFSET] = self.deleted;
        out[RECORD_STATUS_OFFSET] = self.status.0;
        out[RECORD_RESERVED_OFFSET..RECORD_RESERVED_OFFSET + 5].copy_from_slice(&self.reserved);
        out[RECORD_DATA_SIZE_OFFSET..RECORD_DATA_SIZE_OFFSET + 2]
            .copy_from_slice(&self.data_size.to_le_bytes());
        out[SECTOR_HEADER_SIZE..].copy_from_slice(&self.data);
    }

    /// Check whether this record answers to `id`
    #[inline]
    pub fn matches(&self, id: &SectorId) -> bool {
        self.id == *id
    }

    /// Get a reference to the payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the payload
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Check if this record is marked as deleted data
    pub fn is_deleted(&self) -> bool {
        self.deleted != 0 || self.status.is_deleted()
    }

    /// Check if the payload holds anything other than zero bytes
    pub fn in_use(&self) -> bool {
        self.data.iter().any(|&b| b != 0)
    }

    /// Fill the payload with a specific byte value
    pub fn fill(&mut self, byte: u8) {
        self.data.fill(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_id_on_track() {
        let id = SectorId::on_track(5, 0);
        assert_eq!(id, SectorId::new(2, 1, 1, 1));

        let id = SectorId::on_track(0, 15);
        assert_eq!(id.record, 16);
    }

    #[test]
    fn test_sector_id_display() {
        assert_eq!(SectorId::new(1, 0, 3, 1).to_string(), "C=1 H=0 R=3 N=1");
    }

    #[test]
    fn test_formatted_record() {
        let record = SectorRecord::formatted(3, 4);
        assert_eq!(record.id, SectorId::new(1, 1, 5, 1));
        assert_eq!(record.sectors_in_track, 16);
        assert_eq!(record.density, FORMAT_DENSITY);
        assert_eq!(record.data_size, 256);
        assert!(!record.in_use());
        assert!(!record.is_deleted());
    }

    #[test]
    fn test_record_layout() {
        let mut record = SectorRecord::formatted(1, 2);
        record.fill(0x5A);
        record.status = RecordStatus::new(RecordStatus::DATA_CRC);

        let mut bytes = vec![0u8; SECTOR_RECORD_SIZE];
        record.write_to(&mut bytes);

        assert_eq!(&bytes[..8], &[0, 1, 3, 1, 16, 0, FORMAT_DENSITY, 0]);
        assert_eq!(bytes[RECORD_STATUS_OFFSET], 0xB0);
        assert_eq!(&bytes[RECORD_DATA_SIZE_OFFSET..SECTOR_HEADER_SIZE], &[0x00, 0x01]);
        assert!(bytes[SECTOR_HEADER_SIZE..].iter().all(|&b| b == 0x5A));

        let decoded = SectorRecord::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_record_wrong_length() {
        assert!(SectorRecord::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_record_matches() {
        let record = SectorRecord::formatted(0, 0);
        assert!(record.matches(&SectorId::new(0, 0, 1, 1)));
        assert!(!record.matches(&SectorId::new(0, 0, 1, 2)));
        assert!(!record.matches(&SectorId::new(0, 1, 1, 1)));
    }
}
