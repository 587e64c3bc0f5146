/// Track data structures

use crate::error::{FddError, Result};
use crate::format::constants::*;
use crate::image::sector::{SectorId, SectorRecord};

/// One logical track: the 16 sector records stored at the track's offset
///
/// Records are kept in their on-disk order. Lookups always match by CHRN,
/// since some images store sectors out of logical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackImage {
    /// Logical track number
    pub number: u8,
    records: Vec<SectorRecord>,
}

impl TrackImage {
    /// Create a freshly formatted track
    pub fn formatted(number: u8) -> Self {
        Self {
            number,
            records: (0..SECTORS_PER_TRACK as u8)
                .map(|index| SectorRecord::formatted(number, index))
                .collect(),
        }
    }

    /// Decode a track from exactly `TRACK_SIZE` bytes
    pub fn from_bytes(number: u8, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TRACK_SIZE {
            return Err(FddError::invalid_format(format!(
                "track {} is {} bytes, expected {}",
                number,
                bytes.len(),
                TRACK_SIZE
            )));
        }

        let records = bytes
            .chunks_exact(SECTOR_RECORD_SIZE)
            .map(SectorRecord::from_bytes)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { number, records })
    }

    /// Encode the track back into its on-disk form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.records.len() * SECTOR_RECORD_SIZE];
        self.write_to(&mut bytes);
        bytes
    }

    /// Encode the track into `out`, which must hold every record
    pub fn write_to(&self, out: &mut [u8]) {
        for (record, chunk) in self
            .records
            .iter()
            .zip(out.chunks_exact_mut(SECTOR_RECORD_SIZE))
        {
            record.write_to(chunk);
        }
    }

    /// Byte range of the payload answering to `id` in an encoded track
    ///
    /// Searches the raw records in storage order without decoding them.
    pub fn payload_range(bytes: &[u8], id: &SectorId) -> Option<std::ops::Range<usize>> {
        bytes
            .chunks_exact(SECTOR_RECORD_SIZE)
            .position(|raw| {
                raw[RECORD_CYLINDER_OFFSET] == id.cylinder
                    && raw[RECORD_HEAD_OFFSET] == id.head
                    && raw[RECORD_NUMBER_OFFSET] == id.record
                    && raw[RECORD_SIZE_CODE_OFFSET] == id.size_code
            })
            .map(|index| {
                let start = index * SECTOR_RECORD_SIZE + SECTOR_HEADER_SIZE;
                start..start + SECTOR_SIZE
            })
    }

    /// Get a reference to all records in storage order
    pub fn records(&self) -> &[SectorRecord] {
        &self.records
    }

    /// Get a mutable reference to all records in storage order
    pub fn records_mut(&mut self) -> &mut [SectorRecord] {
        &mut self.records
    }

    /// Get the number of records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Find the record answering to `id` by linear search
    pub fn find(&self, id: &SectorId) -> Option<&SectorRecord> {
        self.records.iter().find(|record| record.matches(id))
    }

    /// Find the record answering to `id` by linear search (mutable)
    pub fn find_mut(&mut self, id: &SectorId) -> Option<&mut SectorRecord> {
        self.records.iter_mut().find(|record| record.matches(id))
    }

    /// Get record IDs in storage order
    pub fn sector_ids(&self) -> Vec<SectorId> {
        self.records.iter().map(|record| record.id).collect()
    }
}
