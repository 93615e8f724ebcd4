//! Byte-level chunk writer
//!
//! Both container variants are sequences of 4-byte-tagged chunks; they only
//! differ in integer byte order. `ChunkWriter` appends fields in the byte
//! order it was created with.

/// Integer byte order of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// RIFF/WAVE
    Little,
    /// IFF/AIFF
    Big,
}

/// Growable output buffer with byte-order aware field writers
#[derive(Debug)]
pub struct ChunkWriter {
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl ChunkWriter {
    /// Create a writer with room for `capacity` bytes
    pub fn with_capacity(order: ByteOrder, capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            order,
        }
    }

    /// Write a four-character chunk tag
    #[inline]
    pub fn tag(&mut self, tag: &[u8; 4]) {
        self.bytes.extend_from_slice(tag);
    }

    #[inline]
    pub fn u16(&mut self, value: u16) {
        match self.order {
            ByteOrder::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    #[inline]
    pub fn u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    #[inline]
    pub fn i16(&mut self, value: i16) {
        match self.order {
            ByteOrder::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Write raw bytes unchanged
    #[inline]
    pub fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append a zero byte if `len` is odd (IFF/RIFF chunk alignment)
    #[inline]
    pub fn pad_to_even(&mut self, len: usize) {
        if len % 2 == 1 {
            self.bytes.push(0);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
