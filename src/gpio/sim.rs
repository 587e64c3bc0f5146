/// In-memory GPIO register block
///
/// One level word models every pin: the unit's outputs land there through
/// the set/clear registers, and the other side of the bus (a test harness or
/// host model) drives the unit's inputs on the same word. Clones share the
/// same registers, so the two sides can live on different threads.

use super::{field_mask, RegisterBlock, CLR_OFFSET, FSEL_OFFSET, LEV_OFFSET, SET_OFFSET};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const WORDS: usize = 64;

/// Shared in-memory register file
#[derive(Debug, Clone)]
pub struct SimRegisters {
    words: Arc<[AtomicU32; WORDS]>,
}

impl SimRegisters {
    /// Create a register file with every register zero
    pub fn new() -> Self {
        Self {
            words: Arc::new(std::array::from_fn(|_| AtomicU32::new(0))),
        }
    }

    fn word(&self, offset: usize) -> &AtomicU32 {
        assert!(offset % 4 == 0, "unaligned register offset {:#x}", offset);
        &self.words[offset / 4]
    }

    /// Current level of `pin`
    pub fn level(&self, pin: u32) -> bool {
        self.word(LEV_OFFSET).load(Ordering::SeqCst) & (1 << pin) != 0
    }

    /// Drive `pin` from outside the unit
    pub fn set_level(&self, pin: u32, level: bool) {
        let word = self.word(LEV_OFFSET);
        if level {
            word.fetch_or(1 << pin, Ordering::SeqCst);
        } else {
            word.fetch_and(!(1 << pin), Ordering::SeqCst);
        }
    }

    /// Read a field of the level word
    pub fn field(&self, from: u32, width: u32) -> u32 {
        (self.word(LEV_OFFSET).load(Ordering::SeqCst) >> from) & field_mask(width)
    }

    /// Drive a field of the level word from outside the unit
    pub fn set_field(&self, from: u32, width: u32, value: u32) {
        let mask = field_mask(width) << from;
        let bits = (value << from) & mask;
        let word = self.word(LEV_OFFSET);
        let mut current = word.load(Ordering::SeqCst);
        loop {
            let next = (current & !mask) | bits;
            match word.compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Function select bits currently programmed for `pin`
    pub fn function(&self, pin: u32) -> u32 {
        let offset = FSEL_OFFSET + (pin / 10) as usize * 4;
        (self.word(offset).load(Ordering::SeqCst) >> ((pin % 10) * 3)) & 0b111
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBlock for SimRegisters {
    fn read(&self, offset: usize) -> u32 {
        match offset {
            // Set/clear registers read back as zero on the real part
            SET_OFFSET | CLR_OFFSET => 0,
            _ => self.word(offset).load(Ordering::SeqCst),
        }
    }

    fn write(&self, offset: usize, value: u32) {
        match offset {
            SET_OFFSET => {
                self.word(LEV_OFFSET).fetch_or(value, Ordering::SeqCst);
            }
            CLR_OFFSET => {
                self.word(LEV_OFFSET).fetch_and(!value, Ordering::SeqCst);
            }
            _ => self.word(offset).store(value, Ordering::SeqCst),
        }
    }
}
