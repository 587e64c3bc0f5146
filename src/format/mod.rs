/// D88 format constants and disk type tags

/// Format constants
pub mod constants;

pub use constants::*;

/// Media type recorded in the D88 header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    /// 2D: double sided, double density (the unit's native media)
    TwoD,
    /// 2DD: double sided, double density, double track
    TwoDD,
    /// 2HD: double sided, high density
    TwoHD,
    /// Any other tag value, kept verbatim
    Other(u8),
}

impl DiskType {
    /// Get a human-readable name for this media type
    pub fn name(&self) -> &'static str {
        match self {
            DiskType::TwoD => "2D",
            DiskType::TwoDD => "2DD",
            DiskType::TwoHD => "2HD",
            DiskType::Other(_) => "Unknown",
        }
    }
}

impl From<u8> for DiskType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => DiskType::TwoD,
            0x10 => DiskType::TwoDD,
            0x20 => DiskType::TwoHD,
            other => DiskType::Other(other),
        }
    }
}

impl From<DiskType> for u8 {
    fn from(disk_type: DiskType) -> Self {
        match disk_type {
            DiskType::TwoD => 0x00,
            DiskType::TwoDD => 0x10,
            DiskType::TwoHD => 0x20,
            DiskType::Other(value) => value,
        }
    }
}

impl std::fmt::Display for DiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskType::Other(value) => write!(f, "Unknown ({:02X}h)", value),
            known => write!(f, "{}", known.name()),
        }
    }
}
