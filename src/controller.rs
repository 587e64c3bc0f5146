/// Command processor
///
/// Waits for the host to raise ATN, decodes one command byte, pulls the
/// command's parameters and payload over the bus, runs it against the
/// drive bay and answers. Storage failures never reach the wire except as
/// the error bit of the result status.

use crate::bus::{Handshake, TransferMode};
use crate::command::{Command, EXTENSION_PRESENT, EXTENSION_PROBE_ADDRESS};
use crate::drive::DriveBay;
use crate::error::Result;
use crate::fdc::{DeviceStatus, DriveStatus, ResultStatus};
use crate::format::constants::{SECTORS_PER_TRACK, SECTOR_SIZE};
use crate::gpio::RegisterBlock;
use std::fs::File;
use std::io::{Read, Seek, Write};

/// State carried from one command to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Sector count of the last read or write
    pub num_sectors: u8,
    /// Drive of the last read or write
    pub drive: u8,
    /// Track of the last read or write
    pub track: u8,
    /// 0-based first sector of the last read or write
    pub sector: u8,
    /// One track worth of sector data
    pub buffer: Vec<u8>,
    /// Status reported by command 0x06
    pub result: ResultStatus,
    /// Status reported by commands 0x07 and 0x14
    pub drive_status: DriveStatus,
}

impl Session {
    /// Size of the transfer buffer
    pub const BUFFER_SIZE: usize = SECTORS_PER_TRACK * SECTOR_SIZE;

    /// Create the power-on session
    pub fn new() -> Self {
        Self {
            num_sectors: 0,
            drive: 0,
            track: 0,
            sector: 0,
            buffer: vec![0u8; Self::BUFFER_SIZE],
            result: ResultStatus::default(),
            drive_status: DriveStatus::default(),
        }
    }

    /// Number of payload bytes the last read or write covered
    pub fn payload_len(&self) -> usize {
        self.num_sectors as usize * SECTOR_SIZE
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Address of a sector run as the host sends it
#[derive(Debug, Clone, Copy)]
struct SectorRun {
    drive: u8,
    track: u8,
    sector: u8,
}

/// The emulated unit
#[derive(Debug)]
pub struct Controller<R, S = File> {
    bus: Handshake<R>,
    drives: DriveBay<S>,
    session: Session,
}

impl<R: RegisterBlock, S: Read + Write + Seek> Controller<R, S> {
    /// Create a unit talking over `bus` to the images in `drives`
    pub fn new(bus: Handshake<R>, drives: DriveBay<S>) -> Self {
        Self {
            bus,
            drives,
            session: Session::new(),
        }
    }

    /// Get the session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the drive bay
    pub fn drives(&self) -> &DriveBay<S> {
        &self.drives
    }

    /// Get the drive bay mutably
    pub fn drives_mut(&mut self) -> &mut DriveBay<S> {
        &mut self.drives
    }

    /// Get the bus engine
    pub fn bus(&self) -> &Handshake<R> {
        &self.bus
    }

    /// Take the unit apart
    pub fn into_parts(self) -> (Handshake<R>, DriveBay<S>, Session) {
        (self.bus, self.drives, self.session)
    }

    /// Serve commands until the stop flag is raised
    ///
    /// Returns `Ok` when interrupted; any other error is a bus fault.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.step() {
                Ok(_) => {}
                Err(e) if e.is_interrupted() => {
                    log::info!("Command loop interrupted");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wait for one command and execute it
    pub fn step(&mut self) -> Result<Command> {
        let command = Command::from(self.bus.read_command()?);
        log::info!("CMD: ({:02x}) {}", command.code(), command.name());

        match command {
            Command::Initialize => self.initialize(),
            Command::WriteSectors => self.write_sectors(TransferMode::Single)?,
            Command::ReadSectors => self.read_sectors()?,
            Command::SendData => self.send_data(TransferMode::Single)?,
            Command::Copy => self.copy()?,
            Command::Format => self.format()?,
            Command::ResultStatus => self.send_result_status()?,
            Command::DriveStatus => self.send_drive_status()?,
            Command::MemoryProbe => self.memory_probe()?,
            Command::FastWrite => self.write_sectors(TransferMode::Fast)?,
            Command::FastSend => self.send_data(TransferMode::Fast)?,
            Command::DeviceStatus => self.device_status()?,
            Command::ModeChange => self.mode_change()?,
            Command::Undefined(code) => log::warn!("[Undefined] command {:#04x}", code),
        }
        Ok(command)
    }

    /// Release the pins and every image
    pub fn shutdown(&mut self) {
        log::info!("Finalizing...");
        self.drives.unmount_all();
        self.bus.release();
        log::info!("Finished.");
    }

    fn receive_run(&self) -> Result<SectorRun> {
        let drive = self.bus.receive_byte()?;
        let track = self.bus.receive_byte()?;
        // Sector numbers on the wire are 1-based
        let sector = self.bus.receive_byte()?.wrapping_sub(1);
        Ok(SectorRun {
            drive,
            track,
            sector,
        })
    }

    fn receive_request(&mut self) -> Result<()> {
        let count = self.bus.receive_byte()?;
        let run = self.receive_run()?;
        self.session.num_sectors = count;
        self.session.drive = run.drive;
        self.session.track = run.track;
        self.session.sector = run.sector;
        Ok(())
    }

    fn initialize(&mut self) {
        self.session.result = ResultStatus::clear();
    }

    fn write_sectors(&mut self, mode: TransferMode) -> Result<()> {
        self.receive_request()?;
        let session = &mut self.session;
        log::info!(
            "{}: num_sec={} drive={} tr={} sec={}",
            if mode == TransferMode::Fast { "Fast Write Disk" } else { "Write Disk" },
            session.num_sectors,
            session.drive,
            session.track,
            session.sector.wrapping_add(1)
        );

        let len = session.payload_len();
        self.bus.receive_block(mode, &mut session.buffer, len)?;

        let outcome = self.drives.write(
            session.drive,
            session.track,
            session.sector,
            session.num_sectors,
            &session.buffer,
        );
        session.result.error = storage_failed("Write", outcome);
        if mode == TransferMode::Fast {
            session.result.io_complete = true;
        }
        Ok(())
    }

    fn read_sectors(&mut self) -> Result<()> {
        self.receive_request()?;
        let session = &mut self.session;
        log::info!(
            "Read Disk: num_sec={} drive={} tr={} sec={}",
            session.num_sectors,
            session.drive,
            session.track,
            session.sector.wrapping_add(1)
        );

        let outcome = self.drives.read(
            session.drive,
            session.track,
            session.sector,
            session.num_sectors,
            &mut session.buffer,
        );
        let failed = storage_failed("Read", outcome);
        session.result.error = failed;
        session.result.unread = !failed;
        Ok(())
    }

    fn send_data(&mut self, mode: TransferMode) -> Result<()> {
        let session = &mut self.session;
        log::info!(
            "{}: num_sec={}",
            if mode == TransferMode::Fast { "Fast Send Data" } else { "Send Data" },
            session.num_sectors
        );
        self.bus
            .send_block(mode, &session.buffer, session.payload_len())?;
        session.result.unread = false;
        Ok(())
    }

    fn copy(&mut self) -> Result<()> {
        let count = self.bus.receive_byte()?;
        let src = self.receive_run()?;
        let dst = self.receive_run()?;
        log::info!(
            "Copy: num_sec={} (drive={},tr={},sec={})->(drive={},tr={},sec={})",
            count,
            src.drive,
            src.track,
            src.sector.wrapping_add(1),
            dst.drive,
            dst.track,
            dst.sector.wrapping_add(1)
        );

        let buffer = &mut self.session.buffer;
        let outcome = self
            .drives
            .read(src.drive, src.track, src.sector, count, buffer)
            .and_then(|_| self.drives.write(dst.drive, dst.track, dst.sector, count, buffer));

        let result = &mut self.session.result;
        result.error = storage_failed("Copy", outcome);
        result.unread = false;
        Ok(())
    }

    fn format(&mut self) -> Result<()> {
        let drive = self.bus.receive_byte()?;
        log::info!("Format: drive={}", drive);
        let outcome = self.drives.format(drive);
        self.session.result.error = storage_failed("Format", outcome);
        Ok(())
    }

    fn send_result_status(&mut self) -> Result<()> {
        log::info!("Result Status: {}", self.session.result);
        self.bus.send_byte(self.session.result.to_byte())
    }

    fn send_drive_status(&mut self) -> Result<()> {
        log::info!("Drive Status: {:#010b}", self.session.drive_status.0);
        self.bus.send_byte(self.session.drive_status.wire_byte())
    }

    fn memory_probe(&mut self) -> Result<()> {
        let address = self.bus.receive_word()?;
        let len = self.bus.receive_word()?;
        log::info!("Send Memory: addr={:#06x} len={:#06x}", address, len);

        let reply = if address == EXTENSION_PROBE_ADDRESS {
            EXTENSION_PRESENT
        } else {
            0x00
        };
        log::debug!("Memory probe returns {:02x}", reply);
        self.bus.send_byte(reply)
    }

    fn device_status(&mut self) -> Result<()> {
        let target = self.bus.receive_byte()?;
        let write_protected = self.drives.is_write_protected(target);
        let status = DeviceStatus::compose(target, write_protected, self.session.track);
        log::info!(
            "Device Status: {:02x} (tgt={} WriteProtect={})",
            status.to_byte(),
            target,
            write_protected as u8
        );
        // The host gets the drive status word, not the composed byte
        self.bus.send_byte(self.session.drive_status.wire_byte())
    }

    fn mode_change(&mut self) -> Result<()> {
        let mode = self.bus.receive_byte()?;
        log::info!(
            "Mode Change: {},{},{},{}",
            (mode >> 3) & 1,
            (mode >> 2) & 1,
            (mode >> 1) & 1,
            mode & 1
        );
        Ok(())
    }
}

/// Log a storage failure and report whether there was one
fn storage_failed(operation: &str, outcome: Result<()>) -> bool {
    match outcome {
        Ok(()) => false,
        Err(e) => {
            log::warn!("{} failed: {}", operation, e);
            true
        }
    }
}
