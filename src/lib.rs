/*!
# d88fdd

A PC-80S31 floppy unit emulator for a single-board computer's GPIO header,
backed by D88 disk images.

## Features

- Byte-exact D88 image access (80 tracks x 16 sectors x 256 bytes, two drives)
- The unit's four-line parallel handshake, one or two bytes per transfer
- The unit's command set: read, write, copy, format and status reporting
- Memory-mapped GPIO on real hardware, shared in-memory registers for tests

## Quick Start

```rust,no_run
use d88fdd::{Controller, DriveBay, Gpio, Handshake, MappedRegisters, PinMap};
use d88fdd::gpio::mapped::DEFAULT_GPIO_DEVICE;

let mut drives: DriveBay = DriveBay::new();
drives.mount(0, "disk1.d88")?;

let regs = MappedRegisters::open(DEFAULT_GPIO_DEVICE, 0)?;
let bus = Handshake::new(Gpio::new(regs), PinMap::default());
bus.configure();
bus.wait_reset_release()?;

let mut unit = Controller::new(bus, drives);
unit.run()?;
unit.shutdown();
# Ok::<(), d88fdd::FddError>(())
```

## Modules

- `gpio`: GPIO register access
- `bus`: Parallel bus handshake
- `command`: Command codes
- `controller`: Command processor
- `drive`: Drive slots and sector transfers
- `image`: D88 header, track and sector records
- `format`: D88 layout constants
- `fdc`: Status bytes
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Parallel bus handshake
pub mod bus;
/// Command codes
pub mod command;
/// Command processor
pub mod controller;
/// Drive slots and sector transfers
pub mod drive;
/// Error types and Result alias
pub mod error;
/// FDC status bytes
pub mod fdc;
/// D88 layout constants
pub mod format;
/// GPIO register access
pub mod gpio;
/// D88 header, track and sector records
pub mod image;
/// Track map visualization
pub mod map;

// Re-export common types
pub use bus::{Handshake, Line, LineState, PinMap, TransferMode};
#[cfg(any(test, feature = "host-model"))]
pub use bus::HostPort;
pub use command::Command;
pub use controller::{Controller, Session};
pub use drive::DriveBay;
pub use error::{FddError, Result};
pub use fdc::{DeviceStatus, DriveStatus, RecordStatus, ResultStatus};
pub use format::DiskType;
#[cfg(unix)]
pub use gpio::MappedRegisters;
pub use gpio::{Gpio, RegisterBlock, SimRegisters};
pub use image::{DiskHeader, SectorId, SectorRecord, TrackImage};
