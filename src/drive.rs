/// Disk storage engine: two drive slots backed by D88 images
///
/// Addresses are (drive, logical track, 0-based sector, count). Every
/// transfer loads the whole target track into the drive's track buffer,
/// matches records by CHRN and, for writes, stores the whole track back at
/// its recorded offset.

use crate::error::{FddError, Result};
use crate::format::constants::*;
use crate::image::{DiskHeader, SectorId, TrackImage};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// An image attached to a drive slot
#[derive(Debug)]
pub struct MountedDisk<S> {
    backing: S,
    label: String,
    header: DiskHeader,
    /// Raw bytes of the last track read or written
    track: Vec<u8>,
}

impl<S: Read + Write + Seek> MountedDisk<S> {
    /// Read the header, or start from a blank one if the backing is empty
    ///
    /// A backing shorter than a header is read as far as it goes and the
    /// rest of the header is taken as zero, so the disk can still be
    /// formatted.
    fn load(mut backing: S, label: String) -> Result<Self> {
        let len = backing.seek(SeekFrom::End(0))?;

        let header = if len == 0 {
            log::info!("{}: new disk", label);
            DiskHeader::blank()
        } else {
            let mut bytes = vec![0u8; HEADER_SIZE];
            let available = len.min(HEADER_SIZE as u64) as usize;
            if available < HEADER_SIZE {
                log::warn!("{}: header truncated at {} bytes", label, len);
            }
            backing.seek(SeekFrom::Start(0))?;
            backing.read_exact(&mut bytes[..available])?;
            let header = DiskHeader::from_bytes(&bytes)?;
            log::info!(
                "{}: disk=[{}] type={} size={} track0 offset={:#x}{}",
                label,
                header.name(),
                header.disk_type,
                header.disk_size,
                header.track_offset(0).unwrap_or(0),
                if header.is_write_protected() { " (write protected)" } else { "" }
            );
            header
        };

        Ok(Self {
            backing,
            label,
            header,
            track: vec![0u8; TRACK_SIZE],
        })
    }

    fn track_offset(&self, track: u8) -> Result<u64> {
        self.header
            .track_offset(track)
            .ok_or_else(|| FddError::invalid_format(format!("no offset slot for track {}", track)))
    }

    /// Fill the track buffer from the backing
    fn fetch_track(&mut self, track: u8) -> Result<()> {
        let offset = self.track_offset(track)?;
        self.backing.seek(SeekFrom::Start(offset))?;
        self.backing.read_exact(&mut self.track)?;
        Ok(())
    }

    /// Write the track buffer back to the backing
    fn flush_track(&mut self, track: u8) -> Result<()> {
        let offset = self.track_offset(track)?;
        self.backing.seek(SeekFrom::Start(offset))?;
        self.backing.write_all(&self.track)?;
        self.backing.flush()?;
        Ok(())
    }

    fn load_track(&mut self, track: u8) -> Result<TrackImage> {
        self.fetch_track(track)?;
        TrackImage::from_bytes(track, &self.track)
    }

    #[cfg(test)]
    fn store_track(&mut self, image: &TrackImage) -> Result<()> {
        image.write_to(&mut self.track);
        self.flush_track(image.number)
    }

    fn store_header(&mut self) -> Result<()> {
        self.backing.seek(SeekFrom::Start(0))?;
        self.backing.write_all(&self.header.to_bytes())?;
        self.backing.flush()?;
        Ok(())
    }
}

/// Direction and caller buffer of a sector transfer
enum Transfer<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl Transfer<'_> {
    fn len(&self) -> usize {
        match self {
            Transfer::Read(buf) => buf.len(),
            Transfer::Write(buf) => buf.len(),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Transfer::Read(_) => "Read",
            Transfer::Write(_) => "Write",
        }
    }
}

/// The unit's drive slots
#[derive(Debug)]
pub struct DriveBay<S = File> {
    drives: [Option<MountedDisk<S>>; MAX_DRIVES],
}

impl<S> Default for DriveBay<S> {
    fn default() -> Self {
        Self {
            drives: std::array::from_fn(|_| None),
        }
    }
}

impl DriveBay<File> {
    /// Open an image file read/write and mount it on `drive`
    ///
    /// The file must already exist. An empty file mounts as a new,
    /// unformatted disk.
    pub fn mount<P: AsRef<Path>>(&mut self, drive: u8, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Mount [{}] on drive {}", path.display(), drive as usize + 1);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| FddError::open(path, e))?;

        self.attach(drive, file, path.display().to_string())
    }
}

impl<S: Read + Write + Seek> DriveBay<S> {
    /// Create a bay with both slots empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount any seekable backing on `drive`, replacing what was there
    pub fn attach(&mut self, drive: u8, backing: S, label: impl Into<String>) -> Result<()> {
        let slot = slot_index(drive)?;
        self.drives[slot] = Some(MountedDisk::load(backing, label.into())?);
        Ok(())
    }

    /// Unmount `drive`, handing back its backing
    pub fn detach(&mut self, drive: u8) -> Option<S> {
        let slot = slot_index(drive).ok()?;
        self.drives[slot].take().map(|disk| {
            log::info!("Unmount [{}] from drive {}", disk.label, slot + 1);
            disk.backing
        })
    }

    /// Unmount every drive
    pub fn unmount_all(&mut self) {
        for drive in 0..MAX_DRIVES as u8 {
            self.detach(drive);
        }
    }

    /// Check whether an image is mounted on `drive`
    pub fn is_mounted(&self, drive: u8) -> bool {
        self.disk(drive).is_ok()
    }

    /// Number of mounted drives
    pub fn mounted_count(&self) -> usize {
        self.drives.iter().filter(|slot| slot.is_some()).count()
    }

    /// Header of the image on `drive`
    pub fn header(&self, drive: u8) -> Option<&DiskHeader> {
        self.disk(drive).ok().map(|disk| &disk.header)
    }

    /// Label (usually the path) of the image on `drive`
    pub fn label(&self, drive: u8) -> Option<&str> {
        self.disk(drive).ok().map(|disk| disk.label.as_str())
    }

    /// Backing of the image on `drive`
    pub fn backing(&self, drive: u8) -> Option<&S> {
        self.disk(drive).ok().map(|disk| &disk.backing)
    }

    /// Check whether `drive` holds a write-protected image
    pub fn is_write_protected(&self, drive: u8) -> bool {
        self.header(drive).is_some_and(|header| header.is_write_protected())
    }

    fn disk(&self, drive: u8) -> Result<&MountedDisk<S>> {
        let slot = slot_index(drive)?;
        self.drives[slot]
            .as_ref()
            .ok_or(FddError::NotMounted { drive })
    }

    fn disk_mut(&mut self, drive: u8) -> Result<&mut MountedDisk<S>> {
        let slot = slot_index(drive)?;
        self.drives[slot]
            .as_mut()
            .ok_or(FddError::NotMounted { drive })
    }

    /// Lay down a fresh header and 80 tracks of zeroed 256-byte sectors
    pub fn format(&mut self, drive: u8) -> Result<()> {
        let disk = self.disk_mut(drive)?;
        if disk.header.is_write_protected() {
            log::warn!("Format: drive {} is write protected", drive);
            return Err(FddError::WriteProtected { drive });
        }

        let header = DiskHeader::formatted();
        disk.backing.seek(SeekFrom::Start(0))?;
        disk.backing.write_all(&header.to_bytes())?;
        disk.header = header;

        for track in 0..NUM_TRACKS as u8 {
            let image = TrackImage::formatted(track);
            log::trace!("Format: drive={} track={} {:?}", drive, track, image.sector_ids());
            image.write_to(&mut disk.track);
            disk.backing.write_all(&disk.track)?;
        }
        disk.backing.flush()?;

        log::info!("Formatted drive {} ({} bytes)", drive, IMAGE_SIZE);
        Ok(())
    }

    /// Read `count` sectors starting at 0-based `sector` into `buf`
    pub fn read(&mut self, drive: u8, track: u8, sector: u8, count: u8, buf: &mut [u8]) -> Result<()> {
        self.access(drive, track, sector, count, Transfer::Read(buf))
    }

    /// Write `count` sectors starting at 0-based `sector` from `buf`
    pub fn write(&mut self, drive: u8, track: u8, sector: u8, count: u8, buf: &[u8]) -> Result<()> {
        self.access(drive, track, sector, count, Transfer::Write(buf))
    }

    fn access(
        &mut self,
        drive: u8,
        track: u8,
        sector: u8,
        count: u8,
        mut transfer: Transfer<'_>,
    ) -> Result<()> {
        let disk = self.disk_mut(drive)?;
        check_track(drive, track)?;

        // Sector numbers are not range checked; an unknown one fails the search.
        if count == 0 {
            return Ok(());
        }

        if matches!(transfer, Transfer::Write(_)) && disk.header.is_write_protected() {
            log::warn!("Write: drive {} is write protected", drive);
            return Err(FddError::WriteProtected { drive });
        }

        let capacity = transfer.len();
        if capacity < count as usize * SECTOR_SIZE {
            return Err(FddError::TransferTooLarge { count, capacity });
        }

        disk.fetch_track(track)?;
        let (cylinder, head) = track_to_cylinder_head(track);

        for i in 0..count as usize {
            let record = sector as u16 + 1 + i as u16;
            let found = u8::try_from(record).ok().and_then(|r| {
                let id = SectorId::new(cylinder, head, r, SECTOR_SIZE_CODE);
                TrackImage::payload_range(&disk.track, &id)
            });
            let Some(found) = found else {
                log::warn!(
                    "Cannot find sector: drive={} C={} H={} R={} N={}",
                    drive,
                    cylinder,
                    head,
                    record,
                    SECTOR_SIZE_CODE
                );
                return Err(FddError::SectorNotFound {
                    drive,
                    cylinder,
                    head,
                    record,
                    size_code: SECTOR_SIZE_CODE,
                });
            };

            let span = i * SECTOR_SIZE..(i + 1) * SECTOR_SIZE;
            match &mut transfer {
                Transfer::Read(buf) => buf[span].copy_from_slice(&disk.track[found]),
                Transfer::Write(buf) => disk.track[found].copy_from_slice(&buf[span]),
            }
            log::debug!(
                "{} sector: drive={} C={} H={} R={} N={}",
                transfer.verb(),
                drive,
                cylinder,
                head,
                record,
                SECTOR_SIZE_CODE
            );
        }

        if let Transfer::Write(_) = transfer {
            disk.flush_track(track)?;
        }
        Ok(())
    }

    /// Load and decode a whole track for inspection
    pub fn read_track(&mut self, drive: u8, track: u8) -> Result<TrackImage> {
        let disk = self.disk_mut(drive)?;
        check_track(drive, track)?;
        disk.load_track(track)
    }

    /// Set or clear the header's write-protect flag and store the header
    pub fn set_write_protect(&mut self, drive: u8, protect: bool) -> Result<()> {
        let disk = self.disk_mut(drive)?;
        disk.header.set_write_protected(protect);
        disk.store_header()
    }

    /// Rename the disk and store the header
    pub fn set_name(&mut self, drive: u8, name: &str) -> Result<()> {
        let disk = self.disk_mut(drive)?;
        if disk.header.is_write_protected() {
            return Err(FddError::WriteProtected { drive });
        }
        disk.header.set_name(name);
        disk.store_header()
    }
}

fn slot_index(drive: u8) -> Result<usize> {
    if (drive as usize) < MAX_DRIVES {
        Ok(drive as usize)
    } else {
        log::warn!("Illegal drive: {}", drive);
        Err(FddError::InvalidDrive { drive })
    }
}

fn check_track(drive: u8, track: u8) -> Result<()> {
    if (track as usize) < NUM_TRACKS {
        Ok(())
    } else {
        log::warn!("Illegal track: {}", track);
        Err(FddError::InvalidTrack {
            drive,
            track,
            max: NUM_TRACKS as u8 - 1,
        })
    }
}
