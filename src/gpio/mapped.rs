/// Memory-mapped GPIO register block
///
/// Maps one page of a GPIO device node. `/dev/gpiomem` exposes the GPIO
/// block at offset 0 without root; `/dev/mem` needs the peripheral base plus
/// [`GPIO_REG_OFFSET`].

use super::RegisterBlock;
use crate::error::{FddError, Result};
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr::NonNull;

/// Offset of the GPIO block from the peripheral base
pub const GPIO_REG_OFFSET: u64 = 0x20_0000;

/// Default device node
pub const DEFAULT_GPIO_DEVICE: &str = "/dev/gpiomem";

/// A mapped GPIO register page
#[derive(Debug)]
pub struct MappedRegisters {
    base: NonNull<u32>,
    len: usize,
}

impl MappedRegisters {
    /// Map the page at byte `offset` of `device`
    pub fn open<P: AsRef<Path>>(device: P, offset: u64) -> Result<Self> {
        let device = device.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|e| FddError::open(device, e))?;

        // SAFETY: sysconf has no preconditions.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let len = page_size as usize;

        // SAFETY: calling mmap as documented to create a new shared mapping of
        // an open file; the descriptor may be closed once the mapping exists.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(std::io::Error::last_os_error().into());
        }

        let base = NonNull::new(ptr.cast::<u32>())
            .ok_or_else(|| FddError::from(std::io::Error::last_os_error()))?;
        log::info!("gpio_base={:#x} mapped from {}", offset, device.display());
        Ok(Self { base, len })
    }

    fn register(&self, offset: usize) -> *mut u32 {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.len,
            "register offset {:#x} outside the mapped page",
            offset
        );
        // SAFETY: offset was checked to be inside the mapping.
        unsafe { self.base.as_ptr().add(offset / 4) }
    }
}

impl RegisterBlock for MappedRegisters {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: the register pointer is aligned and inside the live mapping.
        unsafe { self.register(offset).read_volatile() }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: the register pointer is aligned and inside the live mapping.
        unsafe { self.register(offset).write_volatile(value) }
    }
}

impl Drop for MappedRegisters {
    fn drop(&mut self) {
        // SAFETY: unmapping memory mapped at construction.
        unsafe {
            libc::munmap(self.base.as_ptr().cast(), self.len);
        }
    }
}

// SAFETY: this is just a pointer to device registers; every access is a
// single volatile word read or write.
unsafe impl Send for MappedRegisters {}
