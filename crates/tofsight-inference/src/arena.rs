//! Compute arena.
//!
//! One byte buffer, allocated once, from which the interpreter carves every
//! activation tensor with a bump pointer. Regions are never freed or moved,
//! and the buffer is never resized.

use crate::error::InferenceError;

/// Default arena size: 80 KiB.
pub const DEFAULT_ARENA_BYTES: usize = 80 * 1024;

/// Alignment of every carved region.
pub const TENSOR_ALIGNMENT: usize = 16;

/// A carved byte range inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    fn overlaps(&self, other: &Region) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Total bytes a bump allocator needs for `lens`, alignment included.
/// `None` if the total does not fit in `usize`.
pub fn planned_bytes(lens: impl IntoIterator<Item = usize>) -> Option<usize> {
    lens.into_iter().try_fold(0usize, |used, len| {
        used.checked_next_multiple_of(TENSOR_ALIGNMENT)?
            .checked_add(len)
    })
}

/// Fixed-capacity bump allocator over a single owned buffer.
pub struct Arena {
    buf: Box<[u8]>,
    used: usize,
}

impl Arena {
    /// Allocate the backing buffer. This is the only heap allocation the
    /// arena ever makes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    /// Carve `len` bytes at the next aligned offset.
    ///
    /// # Errors
    ///
    /// [`InferenceError::ArenaExhausted`] when the region would run past the
    /// end of the buffer.
    pub fn allocate(&mut self, len: usize) -> Result<Region, InferenceError> {
        let offset = self.used.next_multiple_of(TENSOR_ALIGNMENT);
        let end = offset.saturating_add(len);
        if end > self.capacity() {
            return Err(InferenceError::ArenaExhausted {
                required: end,
                capacity: self.capacity(),
            });
        }
        self.used = end;
        Ok(Region { offset, len })
    }

    pub fn bytes(&self, region: Region) -> &[u8] {
        &self.buf[region.offset..region.end()]
    }

    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        &mut self.buf[region.offset..region.end()]
    }

    /// Borrow one region for reading and another, disjoint one for writing.
    pub fn split(&mut self, read: Region, write: Region) -> Result<(&[u8], &mut [u8]), InferenceError> {
        if read.overlaps(&write) || read.end() > self.capacity() || write.end() > self.capacity() {
            return Err(InferenceError::InferenceFailed(format!(
                "arena regions {read:?} and {write:?} cannot be split"
            )));
        }
        if read.offset < write.offset {
            let (head, tail) = self.buf.split_at_mut(write.offset);
            Ok((&head[read.offset..read.end()], &mut tail[..write.len]))
        } else {
            let (head, tail) = self.buf.split_at_mut(read.offset);
            Ok((&tail[..read.len], &mut head[write.offset..write.end()]))
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.used)
            .finish()
    }
}
