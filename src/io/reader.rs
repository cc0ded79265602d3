/// Memory card image reader

use crate::error::Result;
use crate::format::sniff;
use crate::image::MemoryCard;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Check if a file is likely a memory card image based on extension
pub fn is_mcd_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mcd") || e.eq_ignore_ascii_case("mcr"))
        .unwrap_or(false)
}

/// Sniff a host file: right length and "MC" signature
pub fn sniff_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    sniff(&mut file, len)
}

/// Read a memory card image from disk
pub fn read_card<P: AsRef<Path>>(path: P) -> Result<MemoryCard> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading memory card");

    let file = File::open(path)?;
    read_card_from(file)
}

/// Read a memory card image from any byte stream
pub fn read_card_from<R: Read>(reader: R) -> Result<MemoryCard> {
    MemoryCard::from_reader(reader)
}
