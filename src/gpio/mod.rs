/// GPIO register interface
///
/// A thin accessor over a BCM283x/BCM2711 style GPIO register block. The
/// block itself comes from a [`RegisterBlock`] supplied by the caller; this
/// module never maps memory and knows nothing about the bus protocol.

/// Memory-mapped register block backed by a GPIO device node
#[cfg(unix)]
pub mod mapped;
/// In-memory register block for running the unit without hardware
pub mod sim;

#[cfg(unix)]
pub use mapped::MappedRegisters;
pub use sim::SimRegisters;

/// Lowest GPIO number the unit may touch
pub const GPIO_NUM_MIN: u32 = 2;

/// Highest GPIO number the unit may touch
pub const GPIO_NUM_MAX: u32 = 27;

/// Function select registers (GPFSEL0..), 10 pins x 3 bits each
pub const FSEL_OFFSET: usize = 0x00;

/// Output set register (GPSET0)
pub const SET_OFFSET: usize = 0x1C;

/// Output clear register (GPCLR0)
pub const CLR_OFFSET: usize = 0x28;

/// Pin level register (GPLEV0)
pub const LEV_OFFSET: usize = 0x34;

/// Pull-up/down control registers (GPIO_PUP_PDN_CNTRL_REG0..), 16 pins x 2 bits each
pub const PUD_OFFSET: usize = 0xE4;

/// Word-addressed access to a GPIO register block
///
/// Offsets are byte offsets from the start of the block and always 4-byte
/// aligned. Access goes through `&self`: the block is hardware state, not
/// Rust-owned memory.
pub trait RegisterBlock {
    /// Read the 32-bit register at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset`
    fn write(&self, offset: usize, value: u32);
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for &R {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}

/// Pin function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Input
    Input,
    /// Output
    Output,
}

impl From<Function> for u32 {
    fn from(function: Function) -> Self {
        match function {
            Function::Input => 0b000,
            Function::Output => 0b001,
        }
    }
}

/// Pull resistor setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// No pull resistor
    None,
    /// Pull up
    Up,
    /// Pull down
    Down,
}

impl From<Pull> for u32 {
    fn from(pull: Pull) -> Self {
        match pull {
            Pull::None => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        }
    }
}

/// Mask with the low `width` bits set
#[inline]
pub fn field_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

fn assert_pin(pin: u32) {
    assert!(
        (GPIO_NUM_MIN..=GPIO_NUM_MAX).contains(&pin),
        "GPIO {} outside {}..={}",
        pin,
        GPIO_NUM_MIN,
        GPIO_NUM_MAX
    );
}

fn assert_field(from: u32, width: u32) {
    assert!(
        width >= 1 && from < 32 && from + width <= 32,
        "bit field [{} +: {}] does not fit in 32 bits",
        from,
        width
    );
}

/// GPIO accessor over a register block
#[derive(Debug)]
pub struct Gpio<R> {
    regs: R,
}

impl<R: RegisterBlock> Gpio<R> {
    /// Wrap a register block
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Get the underlying register block
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Select the function of `pin`
    ///
    /// # Panics
    ///
    /// Panics if `pin` is outside the usable GPIO range.
    pub fn select_function(&self, pin: u32, function: Function) {
        assert_pin(pin);
        let offset = FSEL_OFFSET + (pin / 10) as usize * 4;
        let shift = (pin % 10) * 3;

        let mut value = self.regs.read(offset);
        value &= !(0b111 << shift);
        value |= u32::from(function) << shift;
        self.regs.write(offset, value);
    }

    /// Configure the pull resistor of `pin`
    ///
    /// # Panics
    ///
    /// Panics if `pin` is outside the usable GPIO range.
    pub fn set_pull(&self, pin: u32, pull: Pull) {
        assert_pin(pin);
        let offset = PUD_OFFSET + (pin / 16) as usize * 4;
        let shift = (pin % 16) * 2;

        let mut value = self.regs.read(offset);
        value &= !(0b11 << shift);
        value |= u32::from(pull) << shift;
        self.regs.write(offset, value);
    }

    /// Read the `width`-bit field starting at bit `from` of the level register
    pub fn read_field(&self, from: u32, width: u32) -> u32 {
        assert_field(from, width);
        (self.regs.read(LEV_OFFSET) >> from) & field_mask(width)
    }

    /// Drive the `width`-bit field starting at bit `from` to `value`
    ///
    /// The field is cleared through the clear register and the new bits set
    /// through the set register, so pins outside the field are untouched.
    pub fn write_field(&self, from: u32, width: u32, value: u32) {
        assert_field(from, width);
        let mask = field_mask(width) << from;
        self.regs.write(CLR_OFFSET, mask);
        self.regs.write(SET_OFFSET, (value << from) & mask);
    }

    /// Read a single pin level
    #[inline]
    pub fn read_pin(&self, pin: u32) -> bool {
        self.read_field(pin, 1) != 0
    }

    /// Drive a single pin
    #[inline]
    pub fn write_pin(&self, pin: u32, level: bool) {
        self.write_field(pin, 1, level as u32);
    }

    /// Return every usable pin to input mode
    pub fn release_all(&self) {
        for pin in GPIO_NUM_MIN..=GPIO_NUM_MAX {
            self.select_function(pin, Function::Input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mask() {
        assert_eq!(field_mask(1), 0x1);
        assert_eq!(field_mask(8), 0xFF);
        assert_eq!(field_mask(32), u32::MAX);
    }

    #[test]
    fn test_select_function() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.select_function(12, Function::Output);
        gpio.select_function(13, Function::Output);
        gpio.select_function(12, Function::Input);

        let fsel1 = gpio.registers().read(FSEL_OFFSET + 4);
        assert_eq!(fsel1, 0b001 << 9);
        assert_eq!(gpio.registers().function(13), 0b001);
        assert_eq!(gpio.registers().function(12), 0b000);
    }

    #[test]
    fn test_set_pull() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.set_pull(4, Pull::Down);
        gpio.set_pull(20, Pull::Up);

        assert_eq!(gpio.registers().read(PUD_OFFSET), 0b10 << 8);
        assert_eq!(gpio.registers().read(PUD_OFFSET + 4), 0b01 << 8);

        gpio.set_pull(4, Pull::None);
        assert_eq!(gpio.registers().read(PUD_OFFSET), 0);
    }

    #[test]
    fn test_write_field_leaves_other_bits() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.write_pin(24, true);
        gpio.write_field(12, 8, 0xA5);

        assert_eq!(gpio.read_field(12, 8), 0xA5);
        assert!(gpio.read_pin(24));

        gpio.write_field(12, 8, 0x3C);
        assert_eq!(gpio.read_field(12, 8), 0x3C);
        assert!(gpio.read_pin(24));
    }

    #[test]
    fn test_write_field_masks_value() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.write_field(12, 8, 0x1FF);
        assert_eq!(gpio.read_field(12, 8), 0xFF);
        assert!(!gpio.read_pin(20));
    }

    #[test]
    fn test_release_all() {
        let gpio = Gpio::new(SimRegisters::new());
        for pin in 12..=19 {
            gpio.select_function(pin, Function::Output);
        }
        gpio.release_all();
        for pin in GPIO_NUM_MIN..=GPIO_NUM_MAX {
            assert_eq!(gpio.registers().function(pin), 0b000);
        }
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_pin_out_of_range() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.select_function(28, Function::Input);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_field_out_of_range() {
        let gpio = Gpio::new(SimRegisters::new());
        gpio.read_field(30, 4);
    }
}
