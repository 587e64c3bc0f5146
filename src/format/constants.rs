/// D88 layout and geometry constants

/// Number of drive slots on the unit
pub const MAX_DRIVES: usize = 2;

/// Logical tracks used per image (40 cylinders x 2 heads)
pub const NUM_TRACKS: usize = 80;

/// Sectors per track
pub const SECTORS_PER_TRACK: usize = 16;

/// Payload bytes per sector
pub const SECTOR_SIZE: usize = 256;

/// FDC size code for 256-byte sectors, the only one this unit addresses
pub const SECTOR_SIZE_CODE: u8 = 1;

/// Length of the NUL-padded disk name field
pub const NAME_LEN: usize = 17;

/// Reserved bytes following the disk name
pub const HEADER_RESERVED_LEN: usize = 9;

/// Slots in the per-track offset table
pub const TRACK_TABLE_LEN: usize = 164;

/// Offset of the disk name in the header
pub const HEADER_NAME_OFFSET: usize = 0x00;

/// Offset of the reserved block in the header
pub const HEADER_RESERVED_OFFSET: usize = 0x11;

/// Offset of the write-protect byte in the header
pub const HEADER_WRITE_PROTECT_OFFSET: usize = 0x1A;

/// Offset of the disk type byte in the header
pub const HEADER_DISK_TYPE_OFFSET: usize = 0x1B;

/// Offset of the little-endian total size in the header
pub const HEADER_DISK_SIZE_OFFSET: usize = 0x1C;

/// Offset of the track offset table in the header
pub const HEADER_TRACK_TABLE_OFFSET: usize = 0x20;

/// Size of the disk header
pub const HEADER_SIZE: usize = HEADER_TRACK_TABLE_OFFSET + TRACK_TABLE_LEN * 4;

/// Write-protect byte value used when protecting an image
pub const WRITE_PROTECT_ON: u8 = 0x10;

/// Size of the per-sector header that precedes the payload
pub const SECTOR_HEADER_SIZE: usize = 16;

/// Size of one sector record (header + payload)
pub const SECTOR_RECORD_SIZE: usize = SECTOR_HEADER_SIZE + SECTOR_SIZE;

/// Size of one track (all its sector records)
pub const TRACK_SIZE: usize = SECTORS_PER_TRACK * SECTOR_RECORD_SIZE;

/// Size of a freshly formatted image
pub const IMAGE_SIZE: usize = HEADER_SIZE + NUM_TRACKS * TRACK_SIZE;

/// Density byte written by format
pub const FORMAT_DENSITY: u8 = 0x01;

/// Sector record field offsets
pub const RECORD_CYLINDER_OFFSET: usize = 0;
/// Head
pub const RECORD_HEAD_OFFSET: usize = 1;
/// Record number
pub const RECORD_NUMBER_OFFSET: usize = 2;
/// Size code
pub const RECORD_SIZE_CODE_OFFSET: usize = 3;
/// Declared sectors in track (u16 LE)
pub const RECORD_SECTOR_COUNT_OFFSET: usize = 4;
/// Density flag
pub const RECORD_DENSITY_OFFSET: usize = 6;
/// Deleted data flag
pub const RECORD_DELETED_OFFSET: usize = 7;
/// FDC status
pub const RECORD_STATUS_OFFSET: usize = 8;
/// Reserved block
pub const RECORD_RESERVED_OFFSET: usize = 9;
/// Payload size (u16 LE)
pub const RECORD_DATA_SIZE_OFFSET: usize = 14;

/// Split a logical track into (cylinder, head)
#[inline]
pub fn track_to_cylinder_head(track: u8) -> (u8, u8) {
    (track / 2, track % 2)
}

/// Byte offset of a track in a freshly formatted image
#[inline]
pub fn formatted_track_offset(track: usize) -> usize {
    HEADER_SIZE + TRACK_SIZE * track
}
