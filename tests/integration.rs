/// Integration tests for the D88 storage engine

use d88fdd::format::constants::*;
use d88fdd::*;
use proptest::prelude::*;
use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

fn empty_image(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::File::create(&path).expect("Failed to create image file");
    path
}

fn formatted_bay(path: &Path) -> DriveBay {
    let mut bay: DriveBay = DriveBay::new();
    bay.mount(0, path).expect("Failed to mount image");
    bay.format(0).expect("Failed to format image");
    bay
}

/// Backing that counts every seek, read and write
struct CountingBacking {
    inner: Cursor<Vec<u8>>,
    ops: usize,
}

impl CountingBacking {
    fn formatted() -> Self {
        let mut bay = DriveBay::new();
        bay.attach(0, Cursor::new(Vec::new()), "seed").unwrap();
        bay.format(0).unwrap();
        let inner = bay.detach(0).unwrap();
        Self { inner, ops: 0 }
    }
}

impl Read for CountingBacking {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ops += 1;
        self.inner.read(buf)
    }
}

impl Write for CountingBacking {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ops += 1;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for CountingBacking {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ops += 1;
        self.inner.seek(pos)
    }
}

#[test]
fn test_format_writes_full_image() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "blank.d88");
    let bay = formatted_bay(&path);

    let header = bay.header(0).expect("Drive 0 should be mounted");
    assert_eq!(header.disk_size as usize, IMAGE_SIZE);
    assert_eq!(header.populated_tracks(), NUM_TRACKS);
    assert_eq!(header.track_offset(0), Some(HEADER_SIZE as u64));
    assert_eq!(header.track_offset(80), Some(0));

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), IMAGE_SIZE);
    assert_eq!(IMAGE_SIZE, 0x2B0 + 80 * 16 * 0x110);

    // First record of track 3: C=1 H=1 R=1 N=1, 16 sectors, density 1, 256 bytes
    let record = &bytes[formatted_track_offset(3)..formatted_track_offset(3) + SECTOR_HEADER_SIZE];
    assert_eq!(&record[0..4], &[1, 1, 1, 1]);
    assert_eq!(&record[4..6], &16u16.to_le_bytes());
    assert_eq!(record[6], 1);
    assert_eq!(&record[14..16], &256u16.to_le_bytes());
}

#[test]
fn test_format_then_every_sector_is_zero() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "zero.d88");
    let mut bay = formatted_bay(&path);

    let mut buf = vec![0xFFu8; SECTORS_PER_TRACK * SECTOR_SIZE];
    for track in [0u8, 1, 40, 79] {
        bay.read(0, track, 0, SECTORS_PER_TRACK as u8, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0), "track {} not zeroed", track);
    }
}

#[test]
fn test_write_read_scenario() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "a.d88");
    let mut bay = formatted_bay(&path);

    bay.write(0, 0, 0, 1, &[0xAA; 256]).unwrap();
    let mut buf = [0u8; 256];
    bay.read(0, 0, 0, 1, &mut buf).unwrap();
    assert_eq!(buf, [0xAA; 256]);

    // Survives a remount
    drop(bay);
    let mut bay: DriveBay = DriveBay::new();
    bay.mount(1, &path).unwrap();
    let mut buf = [0u8; 256];
    bay.read(1, 0, 0, 1, &mut buf).unwrap();
    assert_eq!(buf, [0xAA; 256]);
}

#[test]
fn test_track_out_of_range_leaves_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "b.d88");
    let mut bay = formatted_bay(&path);
    let before = fs::read(&path).unwrap();

    let result = bay.write(0, 80, 0, 1, &[0x11; 256]);
    assert!(matches!(
        result,
        Err(FddError::InvalidTrack { drive: 0, track: 80, max: 79 })
    ));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_copy_between_tracks() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "c.d88");
    let mut bay = formatted_bay(&path);

    bay.write(0, 0, 0, 1, &[0x5A; 256]).unwrap();
    bay.write(0, 1, 0, 1, &[0xA5; 256]).unwrap();

    let mut buf = vec![0u8; SECTORS_PER_TRACK * SECTOR_SIZE];
    bay.read(0, 0, 0, 1, &mut buf).unwrap();
    bay.write(0, 1, 0, 1, &buf).unwrap();

    let mut check = [0u8; 256];
    bay.read(0, 1, 0, 1, &mut check).unwrap();
    assert_eq!(check, [0x5A; 256]);
}

#[test]
fn test_write_protect_blocks_writes() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "wp.d88");
    let mut bay = formatted_bay(&path);
    bay.write(0, 5, 2, 1, &[0x77; 256]).unwrap();
    bay.set_write_protect(0, true).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(matches!(
        bay.write(0, 5, 2, 1, &[0x00; 256]),
        Err(FddError::WriteProtected { drive: 0 })
    ));
    assert!(matches!(bay.format(0), Err(FddError::WriteProtected { drive: 0 })));
    assert_eq!(fs::read(&path).unwrap(), before);

    // The flag is persisted in the header
    drop(bay);
    let mut bay: DriveBay = DriveBay::new();
    bay.mount(0, &path).unwrap();
    assert!(bay.is_write_protected(0));
    let mut buf = [0u8; 256];
    bay.read(0, 5, 2, 1, &mut buf).unwrap();
    assert_eq!(buf, [0x77; 256]);
}

#[test]
fn test_invalid_drive_and_unmounted() {
    let mut bay: DriveBay = DriveBay::new();
    let mut buf = [0u8; 256];
    assert!(matches!(
        bay.read(2, 0, 0, 1, &mut buf),
        Err(FddError::InvalidDrive { drive: 2 })
    ));
    assert!(matches!(
        bay.read(1, 0, 0, 1, &mut buf),
        Err(FddError::NotMounted { drive: 1 })
    ));
}

#[test]
fn test_zero_count_does_no_io() {
    let mut bay = DriveBay::new();
    bay.attach(0, CountingBacking::formatted(), "counting").unwrap();
    let before = bay.backing(0).unwrap().ops;

    let mut buf = [0u8; 0];
    bay.read(0, 10, 3, 0, &mut buf).unwrap();
    bay.write(0, 10, 3, 0, &buf).unwrap();
    assert_eq!(bay.backing(0).unwrap().ops, before);
}

#[test]
fn test_mount_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut bay: DriveBay = DriveBay::new();
    let result = bay.mount(0, dir.path().join("missing.d88"));
    assert!(matches!(result, Err(FddError::Open { .. })));
    assert!(!bay.is_mounted(0));
}

#[test]
fn test_mount_truncated_file_then_format() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0u8; 0x100]).unwrap();

    let mut bay: DriveBay = DriveBay::new();
    bay.mount(0, file.path()).unwrap();
    assert!(bay.is_mounted(0));
    assert!(!bay.is_write_protected(0));

    bay.format(0).unwrap();
    bay.write(0, 7, 0, 1, &[0x4D; 256]).unwrap();
    drop(bay);

    assert_eq!(fs::metadata(file.path()).unwrap().len(), IMAGE_SIZE as u64);
    let mut bay: DriveBay = DriveBay::new();
    bay.mount(0, file.path()).unwrap();
    let mut buf = [0u8; 256];
    bay.read(0, 7, 0, 1, &mut buf).unwrap();
    assert_eq!(buf, [0x4D; 256]);
}

#[test]
fn test_name_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = empty_image(&dir, "named.d88");
    let mut bay = formatted_bay(&path);
    bay.set_name(0, "SYSTEM DISK").unwrap();
    drop(bay);

    let mut bay: DriveBay = DriveBay::new();
    bay.mount(0, &path).unwrap();
    assert_eq!(bay.header(0).unwrap().name(), "SYSTEM DISK");
}

fn formatted_memory_bay() -> DriveBay<Cursor<Vec<u8>>> {
    let mut bay = DriveBay::new();
    bay.attach(0, Cursor::new(Vec::new()), "mem").unwrap();
    bay.format(0).unwrap();
    bay
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_write_then_read(
        track in 0u8..80,
        (sector, count) in (0u8..16).prop_flat_map(|s| (Just(s), 1u8..=16 - s)),
        seed in any::<u8>(),
    ) {
        let mut bay = formatted_memory_bay();
        let len = count as usize * SECTOR_SIZE;
        let data: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();

        bay.write(0, track, sector, count, &data).unwrap();
        let mut back = vec![0u8; len];
        bay.read(0, track, sector, count, &mut back).unwrap();
        prop_assert_eq!(back, data);
    }
}
