/// Data block storage

use crate::format::constants::BLOCK_SIZE;

/// One 8 KiB data block of a memory card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    data: Box<[u8; BLOCK_SIZE]>,
}

impl DataBlock {
    /// Create a zero-filled block
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; BLOCK_SIZE]),
        }
    }

    /// Create a block from exactly [`BLOCK_SIZE`] bytes
    ///
    /// Shorter input is zero padded, longer input is truncated.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut block = Self::new();
        let len = bytes.len().min(BLOCK_SIZE);
        block.data[..len].copy_from_slice(&bytes[..len]);
        block
    }

    /// Get the block data
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Get mutable block data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Is every byte zero?
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

impl Default for DataBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_is_blank() {
        let block = DataBlock::new();
        assert_eq!(block.data().len(), BLOCK_SIZE);
        assert!(block.is_blank());
    }

    #[test]
    fn test_from_slice_pads() {
        let block = DataBlock::from_slice(b"SC");
        assert_eq!(&block.data()[..2], b"SC");
        assert!(block.data()[2..].iter().all(|&b| b == 0));
        assert!(!block.is_blank());
    }
}
