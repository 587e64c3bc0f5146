/// Track map visualization

use crate::drive::DriveBay;
use crate::error::Result;
use crate::format::constants::{NUM_TRACKS, SECTORS_PER_TRACK};
use crate::image::TrackImage;
use std::fmt::Write as _;
use std::io::{Read, Seek, Write};

/// ANSI color codes for the track map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const DARK_RED: &str = "\x1b[2;31m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const DARK_YELLOW: &str = "\x1b[2;33m";
}

const BLOCK_NO_DATA: &str = "\u{2591}"; // ░ - Light shade (empty)
const BLOCK_HAS_DATA: &str = "\u{2593}"; // ▓ - Dark shade (in-use)

/// Cell for record number `record` (1-based) of `track`
fn cell(track: &TrackImage, record: usize) -> String {
    let found = track
        .records()
        .iter()
        .find(|r| r.id.record as usize == record);
    let Some(found) = found else {
        return " ".to_string();
    };

    let in_use = found.in_use();
    let block = if in_use { BLOCK_HAS_DATA } else { BLOCK_NO_DATA };
    let color = match (found.status.has_error(), found.is_deleted(), in_use) {
        (true, _, true) => colors::BRIGHT_RED,
        (true, _, false) => colors::DARK_RED,
        (false, true, true) => colors::BRIGHT_YELLOW,
        (false, true, false) => colors::DARK_YELLOW,
        (false, false, true) => colors::BRIGHT_WHITE,
        (false, false, false) => colors::DARK_WHITE,
    };
    format!("{}{}{}", color, block, colors::RESET)
}

/// Render the map of every track on `drive`
///
/// One column per logical track, one row per record number with R=1 at the
/// bottom. Tracks that cannot be read are left blank.
pub fn render_track_map<S: Read + Write + Seek>(bay: &mut DriveBay<S>, drive: u8) -> Result<String> {
    // Fails early on a bad or empty slot
    bay.read_track(drive, 0)?;

    let tracks: Vec<Option<TrackImage>> = (0..NUM_TRACKS as u8)
        .map(|t| bay.read_track(drive, t).ok())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "=== Track Map (Drive {}) ===", drive);
    let _ = writeln!(
        out,
        "Legend: {}In Use{} {}Blank{} {}Error{} {}Deleted{}",
        colors::BRIGHT_WHITE,
        colors::RESET,
        colors::DARK_WHITE,
        colors::RESET,
        colors::BRIGHT_RED,
        colors::RESET,
        colors::BRIGHT_YELLOW,
        colors::RESET
    );
    out.push('\n');

    for record in (1..=SECTORS_PER_TRACK).rev() {
        let _ = write!(out, "{:>2} ", record);
        for track in &tracks {
            match track {
                Some(track) => out.push_str(&cell(track, record)),
                None => out.push(' '),
            }
        }
        out.push('\n');
    }

    // Track number axis, a label every 5 columns
    out.push_str("   ");
    let mut printed_cols = vec![false; NUM_TRACKS];
    for track_num in 0..NUM_TRACKS {
        if track_num % 5 == 0 && !printed_cols[track_num] {
            for (i, digit) in track_num.to_string().chars().enumerate() {
                let col = track_num + i;
                if col < NUM_TRACKS {
                    out.push(digit);
                    printed_cols[col] = true;
                }
            }
        } else if !printed_cols[track_num] {
            out.push(' ');
        }
    }
    out.push('\n');
    Ok(out)
}

/// Print the track map of `drive` to stdout
pub fn draw_track_map<S: Read + Write + Seek>(bay: &mut DriveBay<S>, drive: u8) -> Result<()> {
    print!("{}", render_track_map(bay, drive)?);
    Ok(())
}
