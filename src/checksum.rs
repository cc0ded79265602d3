/// Single byte XOR checksum used by memory card frames

use std::io;

/// Running XOR over every byte written to it
///
/// Every header and directory frame stores the XOR of its first 127 bytes in
/// its last byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XorDigest {
    state: u8,
}

impl XorDigest {
    /// Size of the checksum in bytes
    pub const SIZE: usize = 1;

    /// Preferred block size in bytes
    pub const BLOCK_SIZE: usize = 1;

    /// Create a new digest with a zero accumulator
    pub fn new() -> Self {
        Self { state: 0 }
    }

    /// Compute the checksum of a byte slice in one go
    pub fn checksum(data: &[u8]) -> u8 {
        let mut digest = Self::new();
        digest.write(data);
        digest.sum()
    }

    /// XOR every byte into the accumulator
    #[inline]
    pub fn write(&mut self, data: &[u8]) {
        self.state = data.iter().fold(self.state, |acc, b| acc ^ b);
    }

    /// Current checksum value
    #[inline]
    pub fn sum(&self) -> u8 {
        self.state
    }

    /// Reset the accumulator to zero
    #[inline]
    pub fn reset(&mut self) {
        self.state = 0;
    }

    /// Size of the checksum in bytes
    pub fn size(&self) -> usize {
        Self::SIZE
    }

    /// Preferred block size in bytes
    pub fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }
}

impl io::Write for XorDigest {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        XorDigest::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_signature_checksum() {
        let mut digest = XorDigest::new();

        assert_eq!(digest.size(), 1);
        assert_eq!(digest.block_size(), 1);

        let mut data = vec![b'M', b'C'];
        data.extend_from_slice(&[0u8; 125]);
        digest.write(&data);
        assert_eq!(digest.sum(), 0x0E);

        digest.reset();
        assert_eq!(digest.sum(), 0x00);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255).collect();

        let mut digest = XorDigest::new();
        for chunk in data.chunks(7) {
            digest.write(chunk);
        }

        assert_eq!(digest.sum(), XorDigest::checksum(&data));
    }

    #[test]
    fn test_io_write() {
        let mut digest = XorDigest::new();
        std::io::copy(&mut &b"\x0F\xF0"[..], &mut digest).unwrap();
        assert_eq!(digest.sum(), 0xFF);
    }
}
