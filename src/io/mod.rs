/// I/O operations for reading and writing memory card images

/// Little-endian byte cursors
pub mod cursor;
/// Reading and sniffing card images
pub mod reader;
/// Building new card images file by file
pub mod writer;

pub use reader::{is_mcd_file, read_card, read_card_from, sniff_file};
pub use writer::{CardWriter, FileWriter};
