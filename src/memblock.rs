use crate::error::{CarbonError, Result};
use crate::types::MEMBLOCK_GROWTH_FACTOR;
use tracing::trace;

// ─── MemBlock ───────────────────────────────────────────────────────────────

/// Growable byte buffer with an explicit capacity and a high-water mark.
///
/// `capacity()` is the number of allocated, zero-initialised bytes;
/// `last_byte()` is one past the last meaningfully written byte. The
/// invariant `last_byte <= capacity` holds after every operation, and no
/// operation that fails its precondition touches the buffer.
///
/// `move_right` is the only way to open a gap inside the used region and
/// `move_left` the only way to close one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemBlock {
    buf: Vec<u8>,
    last_byte: usize,
}

impl MemBlock {
    /// Allocate a zero-filled block of `capacity` bytes.
    pub fn create(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CarbonError::IllegalArgument(
                "memory block capacity must be non-zero".into(),
            ));
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| CarbonError::Realloc(capacity))?;
        buf.resize(capacity, 0);
        Ok(Self { buf, last_byte: 0 })
    }

    /// Take a copy of externally stored bytes. The whole slice counts as used.
    pub fn from_raw_data(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(CarbonError::IllegalArgument("empty raw data".into()));
        }
        Ok(Self {
            buf: data.to_vec(),
            last_byte: data.len(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn last_byte(&self) -> usize {
        self.last_byte
    }

    /// The used region `[0, last_byte)`.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.buf[..self.last_byte]
    }

    /// Consume the block, returning the used region.
    pub fn into_raw_data(mut self) -> Vec<u8> {
        self.buf.truncate(self.last_byte);
        self.buf
    }

    /// All allocated bytes, including the zeroed tail past `last_byte`.
    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Reallocate to exactly `new_size` bytes. Newly exposed bytes are zero;
    /// shrinking below `last_byte` pulls the watermark down with it.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size == 0 {
            return Err(CarbonError::IllegalArgument(
                "cannot resize a memory block to zero bytes".into(),
            ));
        }
        if new_size > self.buf.len() {
            self.buf
                .try_reserve_exact(new_size - self.buf.len())
                .map_err(|_| CarbonError::Realloc(new_size))?;
        }
        self.buf.resize(new_size, 0);
        self.last_byte = self.last_byte.min(new_size);
        Ok(())
    }

    /// Grow geometrically until at least `needed` bytes are allocated.
    pub(crate) fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        let capacity = self.buf.len();
        if needed <= capacity {
            return Ok(());
        }
        let grown = (capacity as f64 * MEMBLOCK_GROWTH_FACTOR).ceil() as usize;
        let new_size = grown.max(needed);
        trace!(from = capacity, to = new_size, "memblock grow");
        self.resize(new_size)
    }

    /// Truncate the capacity to the used region.
    pub fn shrink(&mut self) -> Result<()> {
        let target = self.last_byte.max(1);
        if target < self.buf.len() {
            self.resize(target)?;
            self.buf.shrink_to_fit();
        }
        Ok(())
    }

    /// Raise the watermark to `end` (bytes in between are already zero).
    pub(crate) fn touch(&mut self, end: usize) -> Result<()> {
        if end > self.buf.len() {
            return Err(CarbonError::OutOfBounds(format!(
                "watermark {end} beyond capacity {}",
                self.buf.len()
            )));
        }
        self.last_byte = self.last_byte.max(end);
        Ok(())
    }

    /// Copy `data` to offset `at`. The target range must be allocated.
    pub fn write(&mut self, at: usize, data: &[u8]) -> Result<()> {
        let end = at
            .checked_add(data.len())
            .ok_or_else(|| CarbonError::OutOfBounds("write range overflows".into()))?;
        if end > self.buf.len() {
            return Err(CarbonError::OutOfBounds(format!(
                "write of {} bytes at {at} exceeds capacity {}",
                data.len(),
                self.buf.len()
            )));
        }
        self.buf[at..end].copy_from_slice(data);
        self.last_byte = self.last_byte.max(end);
        Ok(())
    }

    /// Open a zero-filled gap of `n` bytes at `at`, shifting `[at, last_byte)`
    /// right. Grows the block if the shifted tail would not fit.
    pub fn move_right(&mut self, at: usize, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        if at >= self.last_byte {
            // Nothing to shift, the gap extends the used region.
            self.ensure_capacity(at + n)?;
            self.last_byte = at + n;
            return Ok(());
        }
        let old_end = self.last_byte;
        self.ensure_capacity(old_end + n)?;
        trace!(at, n, "memblock move right");
        self.buf.copy_within(at..old_end, at + n);
        self.buf[at..at + n].fill(0);
        self.last_byte = old_end + n;
        Ok(())
    }

    /// Remove `n` bytes at `at`, shifting `[at + n, last_byte)` left and
    /// zeroing the vacated tail.
    pub fn move_left(&mut self, at: usize, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let end = at
            .checked_add(n)
            .ok_or_else(|| CarbonError::OutOfBounds("move range overflows".into()))?;
        if end > self.last_byte {
            return Err(CarbonError::OutOfBounds(format!(
                "cannot remove {n} bytes at {at}: used region ends at {}",
                self.last_byte
            )));
        }
        let old_end = self.last_byte;
        trace!(at, n, "memblock move left");
        self.buf.copy_within(end..old_end, at);
        self.buf[old_end - n..old_end].fill(0);
        self.last_byte = old_end - n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_zero_capacity_rejected() {
        assert!(matches!(
            MemBlock::create(0),
            Err(CarbonError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_resize_zero_fills_and_rejects_zero() {
        let mut block = MemBlock::create(4).unwrap();
        block.write(0, &[1, 2, 3, 4]).unwrap();
        block.resize(8).unwrap();
        assert_eq!(block.bytes(), &[1, 2, 3, 4, 0, 0, 0, 0]);
        assert_eq!(block.last_byte(), 4);
        assert!(block.resize(0).is_err());
        block.resize(2).unwrap();
        assert_eq!(block.raw_data(), &[1, 2]);
    }

    #[test]
    fn test_write_out_of_capacity() {
        let mut block = MemBlock::create(4).unwrap();
        assert!(matches!(
            block.write(2, &[1, 2, 3]),
            Err(CarbonError::OutOfBounds(_))
        ));
        assert_eq!(block.last_byte(), 0);
    }

    #[test]
    fn test_move_right_opens_gap() {
        let mut block = MemBlock::create(4).unwrap();
        block.write(0, &[1, 2, 3, 4]).unwrap();
        block.move_right(1, 2).unwrap();
        assert_eq!(block.raw_data(), &[1, 0, 0, 2, 3, 4]);
        assert!(block.capacity() >= 6);
    }

    #[test]
    fn test_move_left_closes_gap() {
        let mut block = MemBlock::create(8).unwrap();
        block.write(0, &[1, 2, 3, 4, 5]).unwrap();
        block.move_left(1, 2).unwrap();
        assert_eq!(block.raw_data(), &[1, 4, 5]);
        assert_eq!(&block.bytes()[3..5], &[0, 0]);
    }

    #[test]
    fn test_move_left_out_of_bounds() {
        let mut block = MemBlock::create(8).unwrap();
        block.write(0, &[1, 2, 3]).unwrap();
        assert!(matches!(
            block.move_left(2, 2),
            Err(CarbonError::OutOfBounds(_))
        ));
        assert_eq!(block.raw_data(), &[1, 2, 3]);
    }

    #[test]
    fn test_shrink_to_last_byte() {
        let mut block = MemBlock::create(64).unwrap();
        block.write(0, b"abc").unwrap();
        block.shrink().unwrap();
        assert_eq!(block.capacity(), 3);
        assert_eq!(block.raw_data(), b"abc");
    }

    #[test]
    fn test_clone_is_deep() {
        let mut block = MemBlock::create(4).unwrap();
        block.write(0, &[9]).unwrap();
        let copy = block.clone();
        block.write(0, &[7]).unwrap();
        assert_eq!(copy.raw_data(), &[9]);
    }

    proptest! {
        #[test]
        fn prop_growth_preserves_written_bytes(
            writes in proptest::collection::vec((0usize..256, proptest::collection::vec(any::<u8>(), 1..32)), 1..24)
        ) {
            let mut block = MemBlock::create(1).unwrap();
            let mut shadow: Vec<u8> = Vec::new();
            for (at, data) in writes {
                block.ensure_capacity(at + data.len()).unwrap();
                block.write(at, &data).unwrap();
                if shadow.len() < at + data.len() {
                    shadow.resize(at + data.len(), 0);
                }
                shadow[at..at + data.len()].copy_from_slice(&data);
                prop_assert!(block.last_byte() <= block.capacity());
                prop_assert_eq!(block.raw_data(), &shadow[..]);
            }
        }
    }
}
