/// Block map visualization

use crate::format::constants::NUM_BLOCKS;
use crate::frame::BlockStatus;
use crate::image::MemoryCard;
use std::fmt::Write;
use tracing::warn;

/// ANSI color codes for block map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
}

const BLOCK_NO_DATA: &str = "\u{2591}"; // ░ - Light shade (free)
const BLOCK_HAS_DATA: &str = "\u{2593}"; // ▓ - Dark shade (in-use)

/// Short label and color for a block status
fn describe(status: BlockStatus) -> (&'static str, &'static str) {
    match status {
        BlockStatus::FirstLink => ("first", colors::BRIGHT_GREEN),
        BlockStatus::MiddleLink => ("middle", colors::BRIGHT_WHITE),
        BlockStatus::LastLink => ("last", colors::BRIGHT_WHITE),
        BlockStatus::Available => ("free", colors::DARK_WHITE),
        BlockStatus::Unavailable => ("unavailable", colors::BRIGHT_RED),
        BlockStatus::Other(_) => ("unknown", colors::BRIGHT_YELLOW),
    }
}

/// Owning product code of every block, following each file's chain
fn owners(card: &MemoryCard) -> Vec<Option<String>> {
    let mut owners = vec![None; NUM_BLOCKS];

    for (start, frame) in card.directory_frames().iter().enumerate() {
        if !frame.is_first() {
            continue;
        }

        // Corrupt chains still show the first block's owner
        let chain = card.chain(start).unwrap_or_else(|e| {
            warn!(block = start, error = %e, "block map skipping corrupt chain");
            vec![start]
        });
        for block in chain {
            owners[block] = Some(frame.product_code());
        }
    }

    owners
}

/// Render the block map, one line per data block
///
/// With `color` set, ANSI escape codes highlight the status column.
pub fn render_block_map(card: &MemoryCard, color: bool) -> String {
    let owners = owners(card);
    let mut out = String::new();

    let _ = writeln!(out, "=== Block Map ===");
    if color {
        let _ = writeln!(
            out,
            "Legend: {}First{} {}Linked{} {}Free{} {}Unavailable{} {}Unknown{}",
            colors::BRIGHT_GREEN, colors::RESET,
            colors::BRIGHT_WHITE, colors::RESET,
            colors::DARK_WHITE, colors::RESET,
            colors::BRIGHT_RED, colors::RESET,
            colors::BRIGHT_YELLOW, colors::RESET
        );
    }

    for (i, frame) in card.directory_frames().iter().enumerate() {
        let (label, code) = describe(frame.status);
        let cell = if frame.is_available() {
            BLOCK_NO_DATA
        } else {
            BLOCK_HAS_DATA
        };

        let link = if frame.has_next() {
            format!("-> {:>2}", frame.link_order)
        } else {
            String::new()
        };

        let owner = owners[i].as_deref().unwrap_or("");

        if color {
            let _ = writeln!(
                out,
                "{:>2} {}{}{} {:<11} {:<5} {}",
                i, code, cell, colors::RESET, label, link, owner
            );
        } else {
            let _ = writeln!(out, "{:>2} {} {:<11} {:<5} {}", i, cell, label, link, owner);
        }
    }

    let _ = writeln!(
        out,
        "{} files, {} of {} blocks free",
        card.count_files(),
        card.free_blocks(),
        NUM_BLOCKS
    );

    out
}

/// Draw the block map to stdout
pub fn draw_block_map(card: &MemoryCard) {
    print!("{}", render_block_map(card, true));
}
