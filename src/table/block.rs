//! Append-only string arena.
//!
//! A [`Block`] is created with a fixed nominal capacity and never grows past
//! it, so its backing allocation never moves. Strings stored in a block are
//! addressed with a [`StrHandle`] instead of a raw pointer.

/// Location of a stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrHandle {
    /// Index of the block inside its column
    pub block: usize,
    /// Byte offset inside the block
    pub offset: usize,
    /// Length in bytes, without the terminator
    pub len: usize,
}

impl StrHandle {
    /// Handle shared by every empty cell; it refers to no block.
    pub const EMPTY: StrHandle = StrHandle {
        block: usize::MAX,
        offset: 0,
        len: 0,
    };

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fixed-capacity arena of NUL-terminated strings.
#[derive(Debug)]
pub struct Block {
    data: String,
    capacity: usize,
}

impl Block {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: String::with_capacity(capacity),
            capacity,
        }
    }

    /// Nominal capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes used, terminators included.
    #[inline]
    pub fn used(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Whether `len` bytes plus a terminator fit.
    #[inline]
    pub fn fits(&self, len: usize) -> bool {
        len < self.remaining()
    }

    /// Appends `value` and its terminator, returning the offset of `value`.
    ///
    /// Returns `None` when the block is too full; the block is then unchanged.
    pub fn push(&mut self, value: &str) -> Option<usize> {
        if !self.fits(value.len()) {
            return None;
        }
        let offset = self.data.len();
        self.data.push_str(value);
        self.data.push('\0');
        Some(offset)
    }

    /// The string at `offset` with length `len`.
    #[inline]
    pub fn get(&self, offset: usize, len: usize) -> Option<&str> {
        self.data.get(offset..offset + len)
    }

    /// The whole used part of the block, terminators included.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.data
    }
}
