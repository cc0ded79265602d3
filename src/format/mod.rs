/// Memory card format constants and detection

/// Format constants
pub mod constants;

pub use constants::*;

use crate::error::Result;
use std::io::{ErrorKind, Read};

/// Check whether a signature and declared length look like a memory card image
///
/// This is advisory sniffing only; a full decode can still fail.
pub fn detect_format(magic: &[u8], len: u64) -> bool {
    len == CARD_SIZE as u64 && magic.starts_with(HEADER_SIGNATURE)
}

/// Sniff a byte source of the given declared length
///
/// Only the first two bytes are read, and only when the length matches.
pub fn sniff<R: Read>(reader: &mut R, len: u64) -> Result<bool> {
    if len != CARD_SIZE as u64 {
        return Ok(false);
    }

    let mut magic = [0u8; 2];
    match reader.read_exact(&mut magic) {
        Ok(()) => Ok(detect_format(&magic, len)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_detect_format() {
        assert!(detect_format(b"MC", CARD_SIZE as u64));
        assert!(!detect_format(b"MC", CARD_SIZE as u64 + 1));
        assert!(!detect_format(b"SC", CARD_SIZE as u64));
        assert!(!detect_format(b"M", CARD_SIZE as u64));
    }

    #[test]
    fn test_sniff_reads_signature() {
        let mut data = vec![0u8; CARD_SIZE];
        data[..2].copy_from_slice(HEADER_SIGNATURE);

        assert!(sniff(&mut Cursor::new(&data), CARD_SIZE as u64).unwrap());
        assert!(!sniff(&mut Cursor::new(&data), 1024).unwrap());
    }

    #[test]
    fn test_sniff_short_source() {
        let data = b"M";
        assert!(!sniff(&mut Cursor::new(&data[..]), CARD_SIZE as u64).unwrap());
    }
}
