/// Interactive D88 console application

use dez80::Instruction;

use d88fdd::format::constants::{MAX_DRIVES, NUM_TRACKS, SECTOR_SIZE};
use d88fdd::map::draw_track_map;
use d88fdd::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::fs::OpenOptions;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "close",
                "create",
                "dasm",
                "disassemble",
                "drive",
                "exit",
                "fill",
                "format",
                "help",
                "info",
                "map",
                "name",
                "open",
                "protect",
                "quit",
                "read",
                "sectors",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".d88fdd_history");
        p
    })
}

/// Console state: two drive slots and the one commands act on
struct Console {
    bay: DriveBay,
    current: u8,
}

impl Console {
    fn new() -> Self {
        Self {
            bay: DriveBay::new(),
            current: 0,
        }
    }

    fn require_mounted(&self) -> bool {
        if self.bay.is_mounted(self.current) {
            true
        } else {
            println!("No image on drive {}. Use 'open' or 'create' first.", self.current);
            false
        }
    }

    /// Parse "<track> <record>" arguments
    fn parse_address(&self, args: &[String]) -> Option<(u8, u8)> {
        if args.len() < 2 {
            return None;
        }
        let track = parse_hex_or_dec(&args[0])?;
        let record = parse_hex_or_dec(&args[1])?;
        if record == 0 {
            return None;
        }
        Some((track, record))
    }

    fn read_record(&mut self, track: u8, record: u8) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; SECTOR_SIZE];
        match self.bay.read(self.current, track, record - 1, 1, &mut buf) {
            Ok(()) => Some(buf),
            Err(e) => {
                println!("Error: {}", e);
                None
            }
        }
    }
}

fn main() {
    println!("=== D88 Console ===");
    println!("Interactive console for exploring and preparing D88 disk images.");
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            std::process::exit(1);
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut console = Console::new();

    loop {
        let prompt = format!("d{}> ", console.current);
        let input = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();
        let args = &parts[1..];

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,
            "open" => {
                if args.is_empty() {
                    println!("Usage: open <path> [drive]");
                    continue;
                }
                let drive = match args.get(1) {
                    Some(d) => match parse_drive(d) {
                        Some(d) => d,
                        None => continue,
                    },
                    None => console.current,
                };
                match console.bay.mount(drive, &args[0]) {
                    Ok(()) => {
                        println!("Opened {} on drive {}", args[0], drive);
                        console.current = drive;
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "close" => {
                let drive = match args.first() {
                    Some(d) => match parse_drive(d) {
                        Some(d) => d,
                        None => continue,
                    },
                    None => console.current,
                };
                if console.bay.detach(drive).is_some() {
                    println!("Closed drive {}", drive);
                } else {
                    println!("Drive {} is empty.", drive);
                }
            }
            "drive" => match args.first().and_then(|d| parse_drive(d)) {
                Some(drive) => {
                    console.current = drive;
                    println!("Drive {} selected", drive);
                }
                None => println!("Usage: drive <0|1>"),
            },
            "create" => {
                if args.is_empty() {
                    println!("Usage: create <path>");
                    continue;
                }
                let created = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&args[0]);
                if let Err(e) = created {
                    println!("Error: cannot create {}: {}", args[0], e);
                    continue;
                }
                let drive = console.current;
                match console
                    .bay
                    .mount(drive, &args[0])
                    .and_then(|_| console.bay.format(drive))
                {
                    Ok(()) => println!("Created and formatted {} on drive {}", args[0], drive),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "format" => {
                if console.require_mounted() {
                    match console.bay.format(console.current) {
                        Ok(()) => println!("Formatted drive {}", console.current),
                        Err(e) => println!("Error: {}", e),
                    }
                }
            }
            "info" => print_info(&console.bay),
            "sectors" => {
                if !console.require_mounted() {
                    continue;
                }
                match args.first().and_then(|t| parse_hex_or_dec(t)) {
                    Some(track) => list_sectors_on_track(&mut console.bay, console.current, track),
                    None => println!("Usage: sectors <track>"),
                }
            }
            "read" => {
                if !console.require_mounted() {
                    continue;
                }
                match console.parse_address(args) {
                    Some((track, record)) => {
                        if let Some(data) = console.read_record(track, record) {
                            println!("Track {} R={}:", track, record);
                            print_hex_dump(&data, SECTOR_SIZE);
                        }
                    }
                    None => println!("Usage: read <track> <record>"),
                }
            }
            "disassemble" | "dasm" => {
                if !console.require_mounted() {
                    continue;
                }
                // The boot sector is track 0 R=1
                let (track, record) = console.parse_address(args).unwrap_or((0, 1));
                if let Some(data) = console.read_record(track, record) {
                    println!("Disassembly of track {} R={}:", track, record);
                    disassemble_z80(&data);
                }
            }
            "fill" => {
                if !console.require_mounted() {
                    continue;
                }
                let address = console.parse_address(args);
                let value = args.get(2).and_then(|v| parse_hex_or_dec(v));
                match (address, value) {
                    (Some((track, record)), Some(value)) => {
                        let data = [value; SECTOR_SIZE];
                        match console.bay.write(console.current, track, record - 1, 1, &data) {
                            Ok(()) => println!("Filled track {} R={} with {:02X}", track, record, value),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: fill <track> <record> <byte>"),
                }
            }
            "protect" => {
                if !console.require_mounted() {
                    continue;
                }
                let protect = match args.first().map(|a| a.to_lowercase()) {
                    Some(a) if a == "on" => true,
                    Some(a) if a == "off" => false,
                    _ => {
                        println!(
                            "Write protect is {}. Usage: protect on|off",
                            if console.bay.is_write_protected(console.current) { "on" } else { "off" }
                        );
                        continue;
                    }
                };
                match console.bay.set_write_protect(console.current, protect) {
                    Ok(()) => println!("Write protect {}", if protect { "on" } else { "off" }),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "name" => {
                if !console.require_mounted() {
                    continue;
                }
                if args.is_empty() {
                    println!("Usage: name <text>");
                    continue;
                }
                match console.bay.set_name(console.current, &args.join(" ")) {
                    Ok(()) => println!("Renamed drive {}", console.current),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "map" => {
                if console.require_mounted() {
                    if let Err(e) = draw_track_map(&mut console.bay, console.current) {
                        println!("Error: {}", e);
                    }
                }
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
            }
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    console.bay.unmount_all();
    println!("Goodbye!");
}

fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path> [drive]            - Mount an existing image (use quotes for paths with spaces)");
    println!("  close [drive]                  - Unmount an image");
    println!("  drive <0|1>                    - Select the drive other commands act on");
    println!("  create <path>                  - Create a new image and format it");
    println!("  format                         - Format the current drive");
    println!("  info                           - Show both drive slots");
    println!("  sectors <track>                - List the records of a track");
    println!("  read <track> <record>          - Hex dump a sector (record is 1-based)");
    println!("  disassemble [track] [record]   - Disassemble Z80 code from a sector (dasm)");
    println!("  fill <track> <record> <byte>   - Fill a sector with one byte");
    println!("  protect [on|off]               - Show or set write protection");
    println!("  name <text>                    - Set the disk name");
    println!("  map                            - Visual track map (white=data, red=error, yellow=deleted)");
    println!("  help                           - Show this help");
    println!("  quit, exit                     - Exit");
}

fn print_info(bay: &DriveBay) {
    for drive in 0..MAX_DRIVES as u8 {
        let (Some(label), Some(header)) = (bay.label(drive), bay.header(drive)) else {
            println!("Drive {}: (empty)", drive);
            continue;
        };
        println!("Drive {}: {}", drive, label);
        println!("  Name: {}", header.name());
        println!("  Type: {}", header.disk_type);
        println!("  Size: {} bytes", header.disk_size);
        println!("  Tracks: {}", header.populated_tracks());
        println!(
            "  Write protect: {}",
            if header.is_write_protected() { "Yes" } else { "No" }
        );
    }
}

fn list_sectors_on_track(bay: &mut DriveBay, drive: u8, track: u8) {
    if track as usize >= NUM_TRACKS {
        println!("Track {} out of range (0-{}).", track, NUM_TRACKS - 1);
        return;
    }
    let image = match bay.read_track(drive, track) {
        Ok(image) => image,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    println!(
        "{:<6} {:<4} {:<4} {:<4} {:<4} {:<6} {:<8} {:<8} {:<10} {:<6}",
        "Index", "C", "H", "R", "N", "Count", "Density", "Deleted", "Status", "Size"
    );
    println!("{}", "-".repeat(72));

    for (idx, record) in image.records().iter().enumerate() {
        println!(
            "{:<6} {:<4} {:<4} {:<4} {:<4} {:<6} {:<8} {:<8} {:<10} {:<6}",
            idx,
            record.id.cylinder,
            record.id.head,
            record.id.record,
            record.id.size_code,
            record.sectors_in_track,
            record.density,
            if record.is_deleted() { "Yes" } else { "No" },
            record.status.to_string(),
            record.data_size
        );
    }
}

fn parse_drive(s: &str) -> Option<u8> {
    match parse_hex_or_dec(s) {
        Some(d) if (d as usize) < MAX_DRIVES => Some(d),
        _ => {
            println!("Drive must be 0 or 1.");
            None
        }
    }
}

fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");
        for byte in chunk {
            let c = if (32..127).contains(byte) { *byte as char } else { '.' };
            print!("{}", c);
        }
        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}

fn parse_hex_or_dec(s: &str) -> Option<u8> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn disassemble_z80(data: &[u8]) {
    let mut slice: &[u8] = data;
    let mut address: usize = 0;

    while !slice.is_empty() {
        let start_len = slice.len();

        match Instruction::decode_one(&mut slice) {
            Ok(instruction) => {
                let bytes_consumed = start_len - slice.len();
                let bytes: Vec<String> = data[address..address + bytes_consumed]
                    .iter()
                    .map(|b| format!("{:02X}", b))
                    .collect();

                println!("{:04X}  {:<12} {}", address, bytes.join(" "), instruction);
                address += bytes_consumed;
            }
            Err(_) => {
                // Invalid or truncated instruction - show as data byte
                let byte = data[address];
                println!("{:04X}  {:02X}           DB {:02X}h", address, byte, byte);
                address += 1;
                slice = &data[address..];
            }
        }
    }
}
