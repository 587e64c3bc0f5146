/// D88 image data structures

/// Disk header
pub mod header;
/// Sector records and CHRN
pub mod sector;
/// Track of sector records
pub mod track;

pub use header::DiskHeader;
pub use sector::{SectorId, SectorRecord};
pub use track::TrackImage;
