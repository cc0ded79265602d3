/*!
# mcdmanager

A Rust library for reading and writing PlayStation memory card images.

## Features

- Decode and encode raw 128 KiB memory card images byte for byte
- Header and directory frame checksum validation
- Block chain resolution with bounded walks over corrupt links
- Read-only, duplicate-aware filesystem view of the saves on a card
- Incremental card building from independently written save files
- Splitting multi-game cards into one card per product code

## Quick Start

```rust,no_run
use mcdmanager::{CardReader, CardWriter, FileSystem};

// Open an existing card
let reader = CardReader::open_path("epsxe000.mcd")?;
for entry in reader.read_dir(".")? {
    println!("{}: {} bytes", entry.name, entry.size);
}

// Read a save: its directory frame followed by its blocks
let save = reader.read_file("BESLES-00024TOMBRAID")?;

// Build a new card holding just that save
let writer = CardWriter::new();
writer.add_file(&save)?;
std::fs::write("tombraid.mcd", writer.finish()?)?;
# Ok::<(), mcdmanager::McdError>(())
```

## Card Layout

A card is one header block followed by 15 data blocks of 8 KiB. The header
block holds the header frame, one directory frame per data block, reserved
frames and a trailing copy of the header frame. A save file occupies one or
more data blocks linked through their directory frames.

## Modules

- `format`: Layout constants and format detection
- `frame`: Header, directory and unused frame codecs
- `image`: Card container, data blocks and block chains
- `filesystem`: Read-only filesystem over a card
- `io`: Card readers and the card writer
- `split`: Per-product-code card splitting
- `checksum`: XOR checksum digest
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// XOR checksum digest
pub mod checksum;
/// Error types and Result alias
pub mod error;
/// Read-only filesystem over a card
pub mod filesystem;
/// Layout constants and format detection
pub mod format;
/// Header, directory and unused frame codecs
pub mod frame;
/// Card container, data blocks and block chains
pub mod image;
/// I/O operations for reading and writing memory card images
pub mod io;
/// Block map visualization
pub mod map;
/// Per-product-code card splitting
pub mod split;

// Re-export common types
pub use checksum::XorDigest;
pub use error::{McdError, Result};
pub use filesystem::{
    CardReader, DirEntry, File, FileMode, FileReader, FileSystem, FileSystemInfo, Metadata,
    OpenEntry, ReadDir,
};
pub use format::{detect_format, sniff};
pub use frame::{BlockStatus, DirectoryFrame, Frame, HeaderFrame, UnusedFrame};
pub use image::{ChainCursor, DataBlock, HeaderBlock, MemoryCard};
pub use io::{is_mcd_file, read_card, read_card_from, sniff_file, CardWriter, FileWriter};
pub use map::{draw_block_map, render_block_map};
pub use split::{
    channel_path, sanitize_product_code, split_card, split_files, split_to_directory,
    SplitOptions,
};
