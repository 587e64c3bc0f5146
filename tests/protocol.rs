/// End-to-end tests: a host model talking to the unit over shared registers

use d88fdd::format::constants::SECTOR_SIZE;
use d88fdd::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

/// The unit running on its own thread, stopped when dropped
struct Rig {
    host: HostPort,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Controller<SimRegisters>>>,
    _dir: TempDir,
    paths: Vec<PathBuf>,
}

impl Rig {
    /// Start a unit with `drives` empty images mounted
    fn start(drives: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let mut bay: DriveBay = DriveBay::new();
        let mut paths = Vec::new();
        for drive in 0..drives {
            let path = dir.path().join(format!("disk{}.d88", drive));
            fs::File::create(&path).unwrap();
            bay.mount(drive as u8, &path).unwrap();
            paths.push(path);
        }

        let regs = SimRegisters::new();
        let stop = Arc::new(AtomicBool::new(false));
        let bus = Handshake::new(Gpio::new(regs.clone()), PinMap::default())
            .with_stop_flag(Arc::clone(&stop));
        bus.configure();

        let host = HostPort::new(regs, PinMap::default());
        host.release_reset();

        let worker = thread::spawn(move || {
            let mut unit = Controller::new(bus, bay);
            unit.bus().wait_reset_release().unwrap();
            unit.run().unwrap();
            unit
        });

        Self {
            host,
            stop,
            worker: Some(worker),
            _dir: dir,
            paths,
        }
    }

    /// Stop the unit and take it back
    fn finish(mut self) -> Controller<SimRegisters> {
        self.stop.store(true, Ordering::SeqCst);
        self.worker.take().unwrap().join().unwrap()
    }

    fn result_status(&self) -> u8 {
        self.host.command(0x06);
        self.host.receive_byte()
    }

    fn format(&self, drive: u8) {
        self.host.command(0x05);
        self.host.send_byte(drive);
    }

    fn write(&self, mode: TransferMode, drive: u8, track: u8, record: u8, data: &[u8]) {
        let code = match mode {
            TransferMode::Single => 0x01,
            TransferMode::Fast => 0x11,
        };
        self.host.command(code);
        let count = (data.len() / SECTOR_SIZE) as u8;
        self.host.send_bytes(TransferMode::Single, &[count, drive, track, record]);
        self.host.send_bytes(mode, data);
    }

    fn read(&self, mode: TransferMode, count: u8, drive: u8, track: u8, record: u8) -> Vec<u8> {
        self.host.command(0x02);
        self.host.send_bytes(TransferMode::Single, &[count, drive, track, record]);
        let code = match mode {
            TransferMode::Single => 0x03,
            TransferMode::Fast => 0x12,
        };
        self.host.command(code);
        self.host.receive_bytes(mode, count as usize * SECTOR_SIZE)
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[test]
fn test_power_on_result_status() {
    let rig = Rig::start(1);
    assert_eq!(rig.result_status(), 0x80);
    rig.host.command(0x00);
    assert_eq!(rig.result_status(), 0x00);
}

#[test]
fn test_format_write_read() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);
    assert_eq!(rig.result_status() & 0x01, 0);

    rig.write(TransferMode::Single, 0, 0, 1, &[0xAA; 256]);
    assert_eq!(rig.result_status() & 0x01, 0);

    let data = rig.read(TransferMode::Single, 1, 0, 0, 1);
    assert_eq!(data, vec![0xAA; 256]);
    assert_eq!(rig.result_status(), 0x00);
}

#[test]
fn test_read_sets_unread_until_sent() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);

    rig.host.command(0x02);
    rig.host.send_bytes(TransferMode::Single, &[1, 0, 3, 1]);
    assert_eq!(rig.result_status(), 0x40);

    rig.host.command(0x03);
    assert_eq!(rig.host.receive_bytes(TransferMode::Single, 256), vec![0u8; 256]);
    assert_eq!(rig.result_status(), 0x00);
}

#[test]
fn test_write_past_last_track_fails() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);
    let before = fs::read(&rig.paths[0]).unwrap();

    rig.write(TransferMode::Single, 0, 80, 1, &[0x33; 256]);
    assert_eq!(rig.result_status() & 0x01, 0x01);
    assert_eq!(fs::read(&rig.paths[0]).unwrap(), before);
}

#[test]
fn test_copy_sector() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);
    rig.write(TransferMode::Single, 0, 0, 1, &[0x12; 256]);
    rig.write(TransferMode::Single, 0, 1, 1, &[0x34; 256]);

    rig.host.command(0x04);
    rig.host.send_bytes(TransferMode::Single, &[1, 0, 0, 1, 0, 1, 1]);
    assert_eq!(rig.result_status() & 0x01, 0);

    assert_eq!(rig.read(TransferMode::Single, 1, 0, 1, 1), vec![0x12; 256]);
    assert_eq!(rig.read(TransferMode::Single, 1, 0, 0, 1), vec![0x12; 256]);
}

#[test]
fn test_copy_between_drives() {
    let rig = Rig::start(2);
    rig.host.command(0x00);
    rig.format(0);
    rig.format(1);
    let pattern: Vec<u8> = (0..512).map(|i| (i % 251) as u8).collect();
    rig.write(TransferMode::Fast, 0, 7, 3, &pattern);

    rig.host.command(0x04);
    rig.host.send_bytes(TransferMode::Single, &[2, 0, 7, 3, 1, 9, 5]);
    assert_eq!(rig.result_status() & 0x01, 0);

    assert_eq!(rig.read(TransferMode::Fast, 2, 1, 9, 5), pattern);
}

#[test]
fn test_fast_and_slow_store_the_same_payload() {
    let rig = Rig::start(2);
    rig.host.command(0x00);
    rig.format(0);
    rig.format(1);

    let payload: Vec<u8> = (0..4 * SECTOR_SIZE).map(|i| (i * 7 + 3) as u8).collect();
    rig.write(TransferMode::Single, 0, 12, 5, &payload);
    rig.write(TransferMode::Fast, 1, 12, 5, &payload);
    assert_eq!(rig.result_status() & 0x81, 0x80);

    // Both images were formatted and written identically
    assert_eq!(
        fs::read(&rig.paths[0]).unwrap(),
        fs::read(&rig.paths[1]).unwrap()
    );
}

#[test]
fn test_lines_idle_between_commands() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);
    rig.read(TransferMode::Fast, 2, 0, 0, 1);

    for line in [Line::DataValid, Line::ReadyForData, Line::DataAccepted] {
        assert!(!rig.host.device_line(line), "{} left high", line);
    }

    let unit = rig.finish();
    assert_eq!(unit.bus().lines(), LineState::default());
}

#[test]
fn test_drive_status_and_device_status() {
    let rig = Rig::start(1);
    rig.host.command(0x07);
    assert_eq!(rig.host.receive_byte(), 0x33);

    // The composed device status is logged, the drive status is sent
    rig.host.command(0x14);
    rig.host.send_byte(0);
    assert_eq!(rig.host.receive_byte(), 0x33);

    rig.host.command(0x14);
    rig.host.send_byte(1);
    assert_eq!(rig.host.receive_byte(), 0x33);
}

#[test]
fn test_memory_probe() {
    let rig = Rig::start(1);
    rig.host.command(0x0B);
    rig.host.send_bytes(TransferMode::Single, &[0x07, 0xEF, 0x00, 0x01]);
    assert_eq!(rig.host.receive_byte(), 0xE0);

    rig.host.command(0x0B);
    rig.host.send_bytes(TransferMode::Single, &[0xEF, 0x07, 0x00, 0x01]);
    assert_eq!(rig.host.receive_byte(), 0x00);
}

#[test]
fn test_undefined_and_mode_change_are_harmless() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.host.command(0x99);
    rig.host.command(0x17);
    rig.host.send_byte(0x05);
    assert_eq!(rig.result_status(), 0x00);
}

#[test]
fn test_format_write_protected_reports_error() {
    let rig = Rig::start(1);
    rig.host.command(0x00);
    rig.format(0);
    let unit = rig.finish();
    let (_, mut drives, _) = unit.into_parts();
    drives.set_write_protect(0, true).unwrap();

    let regs = SimRegisters::new();
    let stop = Arc::new(AtomicBool::new(false));
    let bus = Handshake::new(Gpio::new(regs.clone()), PinMap::default())
        .with_stop_flag(Arc::clone(&stop));
    bus.configure();
    let host = HostPort::new(regs, PinMap::default());

    let worker = thread::spawn(move || {
        let mut unit = Controller::new(bus, drives);
        unit.run().unwrap();
    });

    host.command(0x00);
    host.command(0x05);
    host.send_byte(0);
    host.command(0x06);
    assert_eq!(host.receive_byte(), 0x01);

    stop.store(true, Ordering::SeqCst);
    worker.join().unwrap();
}
