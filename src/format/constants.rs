/// Memory card layout constants

/// Size of a frame (header, directory, unused or trailing) in bytes
pub const FRAME_SIZE: usize = 128;

/// Size of a data block in bytes
pub const BLOCK_SIZE: usize = 0x2000;

/// Number of data blocks on a card
pub const NUM_BLOCKS: usize = 15;

/// Number of blocks reserved for the header block
pub const RESERVED_BLOCKS: usize = 1;

/// Number of directory frames (one per data block)
pub const NUM_DIRECTORY_FRAMES: usize = NUM_BLOCKS;

/// Number of unused frames following the directory frames
pub const NUM_UNUSED_FRAMES: usize = 20;

/// Number of reserved padding frames before the trailing frame
pub const NUM_PADDING_FRAMES: usize = 27;

/// Size of the reserved padding area in bytes
pub const PADDING_SIZE: usize = NUM_PADDING_FRAMES * FRAME_SIZE;

/// Total size of a memory card image in bytes
pub const CARD_SIZE: usize = BLOCK_SIZE * (NUM_BLOCKS + RESERVED_BLOCKS);

/// Largest file a card can hold: its directory frame plus every data block
pub const MAX_FILE_SIZE: usize = FRAME_SIZE + NUM_BLOCKS * BLOCK_SIZE;

/// Link order value marking the end of a chain
pub const LAST_LINK: u16 = 0xFFFF;

/// Header and trailing frame signature
pub const HEADER_SIGNATURE: &[u8; 2] = b"MC";

/// Offset of the header frame
pub const HEADER_FRAME_OFFSET: usize = 0;

/// Offset of the first directory frame
pub const DIRECTORY_FRAME_OFFSET: usize = HEADER_FRAME_OFFSET + FRAME_SIZE;

/// Offset of the first unused frame
pub const UNUSED_FRAME_OFFSET: usize = DIRECTORY_FRAME_OFFSET + NUM_DIRECTORY_FRAMES * FRAME_SIZE;

/// Offset of the reserved padding area
pub const PADDING_OFFSET: usize = UNUSED_FRAME_OFFSET + NUM_UNUSED_FRAMES * FRAME_SIZE;

/// Offset of the trailing copy of the header frame
pub const TRAILING_FRAME_OFFSET: usize = PADDING_OFFSET + PADDING_SIZE;

/// Offset of the first data block
pub const DATA_BLOCK_OFFSET: usize = TRAILING_FRAME_OFFSET + FRAME_SIZE;

/// Block status: first block of a file
pub const STATUS_FIRST_LINK: u8 = 0x51;

/// Block status: block in the middle of a chain
pub const STATUS_MIDDLE_LINK: u8 = 0x52;

/// Block status: last block of a multi-block chain
pub const STATUS_LAST_LINK: u8 = 0x53;

/// Block status: free block
pub const STATUS_AVAILABLE: u8 = 0xA0;

/// Block status: reserved or unusable block
pub const STATUS_UNAVAILABLE: u8 = 0xFF;

/// Offset of the status byte within a directory frame
pub const DIR_STATUS_OFFSET: usize = 0;

/// Offset of the declared file size within a directory frame
pub const DIR_SIZE_OFFSET: usize = 4;

/// Offset of the link order within a directory frame
pub const DIR_LINK_ORDER_OFFSET: usize = 8;

/// Offset of the country code within a directory frame
pub const DIR_COUNTRY_CODE_OFFSET: usize = 10;

/// Offset of the product code within a directory frame
pub const DIR_PRODUCT_CODE_OFFSET: usize = 12;

/// Offset of the identifier within a directory frame
pub const DIR_IDENTIFIER_OFFSET: usize = 22;

/// Offset of the checksum byte within header and directory frames
pub const CHECKSUM_OFFSET: usize = FRAME_SIZE - 1;

/// Length of the country code field
pub const COUNTRY_CODE_LEN: usize = 2;

/// Length of the product code field
pub const PRODUCT_CODE_LEN: usize = 10;

/// Length of the identifier field
pub const IDENTIFIER_LEN: usize = 8;
