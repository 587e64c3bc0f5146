/// D88 disk header

use crate::error::{FddError, Result};
use crate::format::constants::*;
use crate::format::DiskType;

/// Fixed-size header at offset 0 of every D88 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskHeader {
    name: [u8; NAME_LEN],
    reserved: [u8; HEADER_RESERVED_LEN],
    /// Raw write-protect byte; any non-zero value protects the image
    pub write_protect: u8,
    /// Media type tag
    pub disk_type: DiskType,
    /// Total image size in bytes
    pub disk_size: u32,
    track_offsets: [u32; TRACK_TABLE_LEN],
}

impl DiskHeader {
    /// All-zero header, used for an empty (never formatted) image
    pub fn blank() -> Self {
        Self {
            name: [0; NAME_LEN],
            reserved: [0; HEADER_RESERVED_LEN],
            write_protect: 0,
            disk_type: DiskType::TwoD,
            disk_size: 0,
            track_offsets: [0; TRACK_TABLE_LEN],
        }
    }

    /// Header written by format: zeroed, with size and track offsets laid out
    /// as one contiguous run of tracks after the header
    pub fn formatted() -> Self {
        let mut header = Self::blank();
        header.disk_size = IMAGE_SIZE as u32;
        for (track, offset) in header.track_offsets.iter_mut().take(NUM_TRACKS).enumerate() {
            *offset = formatted_track_offset(track) as u32;
        }
        header
    }

    /// Decode a header from at least `HEADER_SIZE` bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FddError::invalid_format(format!(
                "header is {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&bytes[HEADER_NAME_OFFSET..HEADER_NAME_OFFSET + NAME_LEN]);
        let mut reserved = [0u8; HEADER_RESERVED_LEN];
        reserved.copy_from_slice(
            &bytes[HEADER_RESERVED_OFFSET..HEADER_RESERVED_OFFSET + HEADER_RESERVED_LEN],
        );

        let mut track_offsets = [0u32; TRACK_TABLE_LEN];
        let table = &bytes[HEADER_TRACK_TABLE_OFFSET..HEADER_SIZE];
        for (offset, raw) in track_offsets.iter_mut().zip(table.chunks_exact(4)) {
            *offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }

        let size = &bytes[HEADER_DISK_SIZE_OFFSET..HEADER_DISK_SIZE_OFFSET + 4];

        Ok(Self {
            name,
            reserved,
            write_protect: bytes[HEADER_WRITE_PROTECT_OFFSET],
            disk_type: DiskType::from(bytes[HEADER_DISK_TYPE_OFFSET]),
            disk_size: u32::from_le_bytes([size[0], size[1], size[2], size[3]]),
            track_offsets,
        })
    }

    /// Encode the header into its on-disk form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[HEADER_NAME_OFFSET..HEADER_NAME_OFFSET + NAME_LEN].copy_from_slice(&self.name);
        bytes[HEADER_RESERVED_OFFSET..HEADER_RESERVED_OFFSET + HEADER_RESERVED_LEN]
            .copy_from_slice(&self.reserved);
        bytes[HEADER_WRITE_PROTECT_OFFSET] = self.write_protect;
        bytes[HEADER_DISK_TYPE_OFFSET] = self.disk_type.into();
        bytes[HEADER_DISK_SIZE_OFFSET..HEADER_DISK_SIZE_OFFSET + 4]
            .copy_from_slice(&self.disk_size.to_le_bytes());
        for (offset, out) in self
            .track_offsets
            .iter()
            .zip(bytes[HEADER_TRACK_TABLE_OFFSET..].chunks_exact_mut(4))
        {
            out.copy_from_slice(&offset.to_le_bytes());
        }
        bytes
    }

    /// Disk name up to the first NUL
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Set the disk name, truncated to leave room for a terminating NUL
    pub fn set_name(&mut self, name: &str) {
        self.name = [0; NAME_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_LEN - 1);
        self.name[..len].copy_from_slice(&bytes[..len]);
    }

    /// Check if the image is write protected
    pub fn is_write_protected(&self) -> bool {
        self.write_protect != 0
    }

    /// Set or clear write protection
    pub fn set_write_protected(&mut self, protect: bool) {
        self.write_protect = if protect { WRITE_PROTECT_ON } else { 0 };
    }

    /// Byte offset of a logical track, if the table has a slot for it
    pub fn track_offset(&self, track: u8) -> Option<u64> {
        self.track_offsets.get(track as usize).map(|&offset| offset as u64)
    }

    /// Number of populated (non-zero) track offsets
    pub fn populated_tracks(&self) -> usize {
        self.track_offsets.iter().filter(|&&offset| offset != 0).count()
    }
}

impl Default for DiskHeader {
    fn default() -> Self {
        Self::blank()
    }
}
