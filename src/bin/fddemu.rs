/// PC-80S31 floppy unit daemon
///
/// Mounts one or two D88 images, maps the GPIO registers and serves the
/// host's commands until SIGINT or SIGTERM.

use clap::{ArgAction, Parser};
use d88fdd::gpio::mapped::DEFAULT_GPIO_DEVICE;
use d88fdd::{Controller, DriveBay, FddError, Gpio, Handshake, MappedRegisters, PinMap};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about = "Emulate a PC-80S31 floppy unit on the GPIO header")]
struct Cli {
    /// D88 images for drive 0 and drive 1
    #[arg(required = true, num_args = 1..=2, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// GPIO device node to map
    #[arg(long, default_value = DEFAULT_GPIO_DEVICE)]
    gpio_device: PathBuf,

    /// Byte offset of the GPIO block in the device (hex with 0x)
    #[arg(long, default_value = "0", value_parser = parse_offset)]
    gpio_offset: u64,

    /// Start serving commands without waiting for the host to leave reset
    #[arg(long)]
    no_reset_wait: bool,

    /// Specify up to three times to increase the verbosity of output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_offset(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{}': {}", s, e))
}

fn logging_format(formatter: &mut env_logger::fmt::Formatter, record: &log::Record) -> io::Result<()> {
    writeln!(formatter, "{:>5}  {}", record.level(), record.args())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(logging_format)
        .target(env_logger::Target::Stdout)
        .init();
}

/// Raise `stop` on SIGINT, SIGTERM or SIGHUP
fn install_stop_handler(stop: Arc<AtomicBool>) -> d88fdd::Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Stop requested");
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| FddError::Io(io::Error::other(e)))
}

fn run(cli: &Cli) -> d88fdd::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    install_stop_handler(Arc::clone(&stop))?;

    let mut drives: DriveBay = DriveBay::new();
    for (drive, path) in cli.images.iter().enumerate() {
        drives.mount(drive as u8, path)?;
    }

    let regs = MappedRegisters::open(&cli.gpio_device, cli.gpio_offset)?;
    let bus = Handshake::new(Gpio::new(regs), PinMap::default()).with_stop_flag(stop);
    bus.configure();

    let mut unit = Controller::new(bus, drives);
    let served = if cli.no_reset_wait {
        unit.run()
    } else {
        match unit.bus().wait_reset_release() {
            Ok(()) => unit.run(),
            Err(FddError::Interrupted) => Ok(()),
            Err(e) => Err(e),
        }
    };
    unit.shutdown();
    served
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
