use crate::error::{CarbonError, Result};
use crate::memblock::MemBlock;
use crate::types::MEMFILE_SAVED_POSITION_STACK_SIZE;
use crate::varuint::{decode_varuint, encode_varuint_array};
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug)]
enum BlockRef<'a> {
    Shared(&'a MemBlock),
    Exclusive(&'a mut MemBlock),
}

/// Sub-byte cursor state while the memfile is in bit mode.
#[derive(Debug, Clone, Copy, Default)]
struct BitCursor {
    write_bit: u8,
    read_bit: u8,
    bytes_completed: usize,
}

// ─── MemFile ────────────────────────────────────────────────────────────────

/// Seekable cursor over a [`MemBlock`].
///
/// A read-only memfile may borrow the block shared; a read-write memfile
/// borrows it exclusively. Cursors handed to nested iterators are created
/// with [`MemFile::reborrow`], so at most one of them can mutate the block
/// at any time.
#[derive(Debug)]
pub struct MemFile<'a> {
    block: BlockRef<'a>,
    pos: usize,
    mode: AccessMode,
    saved: ArrayVec<usize, MEMFILE_SAVED_POSITION_STACK_SIZE>,
    bits: Option<BitCursor>,
}

macro_rules! fixed_width_io {
    ($($read:ident, $peek:ident, $write:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $read(&mut self) -> Result<$ty> {
                let bytes = self.read(std::mem::size_of::<$ty>())?;
                Ok(<$ty>::from_le_bytes(bytes.try_into().map_err(|_| {
                    CarbonError::Internal("fixed-width read returned wrong length".into())
                })?))
            }

            #[inline]
            pub fn $peek(&self) -> Result<$ty> {
                let bytes = self.peek(std::mem::size_of::<$ty>())?;
                Ok(<$ty>::from_le_bytes(bytes.try_into().map_err(|_| {
                    CarbonError::Internal("fixed-width peek returned wrong length".into())
                })?))
            }

            #[inline]
            pub fn $write(&mut self, value: $ty) -> Result<()> {
                self.write(&value.to_le_bytes())
            }
        )*
    };
}

impl<'a> MemFile<'a> {
    /// Open a read-only cursor at offset 0.
    pub fn open(block: &'a MemBlock) -> Self {
        Self {
            block: BlockRef::Shared(block),
            pos: 0,
            mode: AccessMode::ReadOnly,
            saved: ArrayVec::new(),
            bits: None,
        }
    }

    /// Open a cursor with exclusive access to the block.
    pub fn open_mut(block: &'a mut MemBlock, mode: AccessMode) -> Self {
        Self {
            block: BlockRef::Exclusive(block),
            pos: 0,
            mode,
            saved: ArrayVec::new(),
            bits: None,
        }
    }

    /// An independent cursor over the same block, at the same position and
    /// with the same access mode, borrowing from `self`.
    pub fn reborrow(&mut self) -> MemFile<'_> {
        let block = match &mut self.block {
            BlockRef::Shared(b) => BlockRef::Shared(&**b),
            BlockRef::Exclusive(b) => BlockRef::Exclusive(&mut **b),
        };
        MemFile {
            block,
            pos: self.pos,
            mode: self.mode,
            saved: ArrayVec::new(),
            bits: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.mode == AccessMode::ReadWrite
    }

    #[inline]
    pub fn block(&self) -> &MemBlock {
        match &self.block {
            BlockRef::Shared(b) => *b,
            BlockRef::Exclusive(b) => &**b,
        }
    }

    fn block_mut(&mut self) -> Result<&mut MemBlock> {
        match (&mut self.block, self.mode) {
            (BlockRef::Exclusive(b), AccessMode::ReadWrite) => Ok(&mut **b),
            _ => Err(CarbonError::WriteProtect),
        }
    }

    /// The used region of the underlying block.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.block().raw_data()
    }

    /// Number of used bytes in the underlying block.
    #[inline]
    pub fn size(&self) -> usize {
        self.block().last_byte()
    }

    #[inline]
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the used region.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.size().saturating_sub(self.pos)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Positioning
    // ════════════════════════════════════════════════════════════════════════

    /// Move the cursor to `pos`. A writable memfile grows the block to reach
    /// it; a read-only one refuses to leave the used region.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.size() {
            if !self.is_writable() {
                return Err(CarbonError::MemoryState(format!(
                    "seek to {pos} beyond end {} of read-only memfile",
                    self.size()
                )));
            }
            self.block_mut()?.ensure_capacity(pos)?;
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance by `n` bytes. In write mode the skipped bytes become part of the
    /// used region, allocating them if needed.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        let target = self.pos + n;
        if self.is_writable() {
            let block = self.block_mut()?;
            block.ensure_capacity(target)?;
            block.touch(target)?;
        } else if target > self.size() {
            return Err(CarbonError::WriteProtect);
        }
        self.pos = target;
        Ok(())
    }

    pub fn save_position(&mut self) -> Result<()> {
        self.saved
            .try_push(self.pos)
            .map_err(|_| CarbonError::StackOverflow)
    }

    pub fn restore_position(&mut self) -> Result<()> {
        let pos = self.saved.pop().ok_or(CarbonError::StackUnderflow)?;
        self.pos = pos;
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Byte access
    // ════════════════════════════════════════════════════════════════════════

    /// View `n` bytes at the cursor without moving it.
    pub fn peek(&self, n: usize) -> Result<&[u8]> {
        let end = self.pos + n;
        if end > self.size() {
            return Err(CarbonError::ReadOutOfBounds(format!(
                "read of {n} bytes at {} exceeds end {}",
                self.pos,
                self.size()
            )));
        }
        Ok(&self.data()[self.pos..end])
    }

    /// View `n` bytes at the cursor and advance past them.
    pub fn read(&mut self, n: usize) -> Result<&[u8]> {
        self.check_byte_mode()?;
        let start = self.pos;
        let end = start + n;
        if end > self.size() {
            return Err(CarbonError::ReadOutOfBounds(format!(
                "read of {n} bytes at {start} exceeds end {}",
                self.size()
            )));
        }
        self.pos = end;
        Ok(&self.data()[start..end])
    }

    /// Write `data` at the cursor, growing the block geometrically on overflow.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.check_byte_mode()?;
        let pos = self.pos;
        let block = self.block_mut()?;
        block.ensure_capacity(pos + data.len())?;
        block.write(pos, data)?;
        self.pos += data.len();
        Ok(())
    }

    /// Overwrite a single byte at `at` without moving the cursor.
    pub fn patch_byte(&mut self, at: usize, byte: u8) -> Result<()> {
        if at >= self.size() {
            return Err(CarbonError::OutOfBounds(format!(
                "patch at {at} beyond end {}",
                self.size()
            )));
        }
        self.block_mut()?.write(at, &[byte])
    }

    fixed_width_io! {
        read_u8, peek_u8, write_u8 => u8,
        read_u16, peek_u16, write_u16 => u16,
        read_u32, peek_u32, write_u32 => u32,
        read_u64, peek_u64, write_u64 => u64,
        read_i8, peek_i8, write_i8 => i8,
        read_i16, peek_i16, write_i16 => i16,
        read_i32, peek_i32, write_i32 => i32,
        read_i64, peek_i64, write_i64 => i64,
        read_f32, peek_f32, write_f32 => f32,
    }

    // ════════════════════════════════════════════════════════════════════════
    // In-place insert / remove
    // ════════════════════════════════════════════════════════════════════════

    /// Open a zeroed gap of `n` bytes at the cursor. The cursor stays put.
    pub fn inplace_insert(&mut self, n: usize) -> Result<()> {
        let pos = self.pos;
        self.block_mut()?.move_right(pos, n)
    }

    /// Remove `n` bytes at the cursor. The cursor stays put.
    pub fn inplace_remove(&mut self, n: usize) -> Result<()> {
        let pos = self.pos;
        self.block_mut()?.move_left(pos, n)
    }

    /// Make sure `n` writable zero bytes follow the cursor, consuming any zero
    /// slack already there and shifting the rest of the data right for the
    /// remainder. Returns the number of bytes actually inserted.
    pub fn ensure_space(&mut self, n: usize) -> Result<usize> {
        if !self.is_writable() {
            return Err(CarbonError::WriteProtect);
        }
        let pos = self.pos;
        let used = self.size();
        // Zeros inside the used region are reusable slack; everything past
        // the used region is free and only needs to be allocated.
        let free = if pos >= used {
            n
        } else {
            let zeros = self.data()[pos..]
                .iter()
                .take(n)
                .take_while(|&&b| b == 0)
                .count();
            if pos + zeros == used { n } else { zeros }
        };
        if free >= n {
            let block = self.block_mut()?;
            block.ensure_capacity(pos + n)?;
            return Ok(0);
        }
        let missing = n - free;
        self.inplace_insert(missing)?;
        Ok(missing)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Variable-length integers
    // ════════════════════════════════════════════════════════════════════════

    /// Decode the varuint at the cursor without moving. Returns `(value, width)`.
    pub fn peek_uintvar_stream(&self) -> Result<(u64, usize)> {
        let tail = self.data().get(self.pos..).unwrap_or(&[]);
        decode_varuint(tail)
    }

    pub fn read_uintvar_stream(&mut self) -> Result<u64> {
        let (value, width) = self.peek_uintvar_stream()?;
        self.pos += width;
        Ok(value)
    }

    /// Write `value` as a varuint at the cursor. Returns the encoded width.
    pub fn write_uintvar_stream(&mut self, value: u64) -> Result<usize> {
        let (buf, width) = encode_varuint_array(value);
        self.write(&buf[..width])?;
        Ok(width)
    }

    /// Replace the varuint at the cursor with `value`, growing or shrinking
    /// its encoded width in place. The cursor ends up after the new encoding.
    /// Returns the change in width in bytes.
    pub fn update_uintvar_stream(&mut self, value: u64) -> Result<isize> {
        let (_, old_width) = self.peek_uintvar_stream()?;
        let (buf, new_width) = encode_varuint_array(value);
        if new_width > old_width {
            self.inplace_insert(new_width - old_width)?;
        } else if new_width < old_width {
            self.inplace_remove(old_width - new_width)?;
        }
        self.write(&buf[..new_width])?;
        Ok(new_width as isize - old_width as isize)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Bit mode
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    fn check_byte_mode(&self) -> Result<()> {
        if self.bits.is_some() {
            return Err(CarbonError::IllegalState("memfile is in bit mode"));
        }
        Ok(())
    }

    pub fn begin_bit_mode(&mut self) -> Result<()> {
        if self.bits.is_some() {
            return Err(CarbonError::IllegalState("memfile already in bit mode"));
        }
        self.bits = Some(BitCursor::default());
        Ok(())
    }

    /// Append one bit, most significant bit of each byte first.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        let mut cursor = self
            .bits
            .ok_or(CarbonError::IllegalState("memfile not in bit mode"))?;
        let pos = self.pos;
        let block = self.block_mut()?;
        if cursor.write_bit == 0 {
            block.ensure_capacity(pos + 1)?;
            block.write(pos, &[0])?;
        }
        if bit {
            let byte = block.bytes()[pos] | (0x80 >> cursor.write_bit);
            block.write(pos, &[byte])?;
        }
        cursor.write_bit += 1;
        if cursor.write_bit == 8 {
            cursor.write_bit = 0;
            cursor.bytes_completed += 1;
            self.pos += 1;
        }
        self.bits = Some(cursor);
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        let mut cursor = self
            .bits
            .ok_or(CarbonError::IllegalState("memfile not in bit mode"))?;
        let byte = *self.data().get(self.pos).ok_or_else(|| {
            CarbonError::ReadOutOfBounds(format!("bit read at {} past end", self.pos))
        })?;
        let bit = byte & (0x80 >> cursor.read_bit) != 0;
        cursor.read_bit += 1;
        if cursor.read_bit == 8 {
            cursor.read_bit = 0;
            cursor.bytes_completed += 1;
            self.pos += 1;
        }
        self.bits = Some(cursor);
        Ok(bit)
    }

    /// Leave bit mode, stepping past a partially used byte. Returns the number
    /// of bytes touched while in bit mode.
    pub fn end_bit_mode(&mut self) -> Result<usize> {
        let cursor = self
            .bits
            .take()
            .ok_or(CarbonError::IllegalState("memfile not in bit mode"))?;
        let mut touched = cursor.bytes_completed;
        if cursor.write_bit > 0 || cursor.read_bit > 0 {
            self.pos += 1;
            touched += 1;
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writable_block() -> MemBlock {
        MemBlock::create(4).unwrap()
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut block = writable_block();
        block.write(0, &[1, 2, 3]).unwrap();
        let mut file = MemFile::open(&block);
        assert!(matches!(file.write(&[9]), Err(CarbonError::WriteProtect)));
        assert!(matches!(file.seek(10), Err(CarbonError::MemoryState(_))));
        assert!(matches!(file.skip(10), Err(CarbonError::WriteProtect)));
        assert_eq!(file.read(3).unwrap(), &[1, 2, 3]);
        assert!(matches!(file.read(1), Err(CarbonError::ReadOutOfBounds(_))));
    }

    #[test]
    fn test_read_only_mode_on_exclusive_block() {
        let mut block = writable_block();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadOnly);
        assert!(matches!(file.write_u8(1), Err(CarbonError::WriteProtect)));
    }

    #[test]
    fn test_write_grows_block() {
        let mut block = writable_block();
        {
            let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            file.write(&[0xAA; 10]).unwrap();
            file.write_u64(7).unwrap();
            assert_eq!(file.tell(), 18);
        }
        assert_eq!(block.last_byte(), 18);
        assert!(block.capacity() >= 18);
    }

    #[test]
    fn test_seek_grows_in_write_mode() {
        let mut block = writable_block();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        file.seek(100).unwrap();
        assert_eq!(file.tell(), 100);
        assert!(file.block().capacity() >= 100);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut block = writable_block();
        block.write(0, &[5, 6]).unwrap();
        let mut file = MemFile::open(&block);
        assert_eq!(file.peek(2).unwrap(), &[5, 6]);
        assert_eq!(file.tell(), 0);
        assert_eq!(file.read_u8().unwrap(), 5);
        assert_eq!(file.tell(), 1);
    }

    #[test]
    fn test_save_restore_stack() {
        let mut block = writable_block();
        block.write(0, &[0; 4]).unwrap();
        let mut file = MemFile::open(&block);
        assert!(matches!(
            file.restore_position(),
            Err(CarbonError::StackUnderflow)
        ));
        for i in 0..MEMFILE_SAVED_POSITION_STACK_SIZE {
            file.seek(i % 4).unwrap();
            file.save_position().unwrap();
        }
        assert!(matches!(file.save_position(), Err(CarbonError::StackOverflow)));
        file.seek(0).unwrap();
        file.restore_position().unwrap();
        assert_eq!(file.tell(), (MEMFILE_SAVED_POSITION_STACK_SIZE - 1) % 4);
    }

    #[test]
    fn test_ensure_space_reuses_slack() {
        let mut block = MemBlock::create(8).unwrap();
        block.write(0, &[b'[', 0, 0, 0, b']']).unwrap();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        file.seek(1).unwrap();
        assert_eq!(file.ensure_space(2).unwrap(), 0);
        assert_eq!(file.ensure_space(5).unwrap(), 2);
        assert_eq!(file.data(), &[b'[', 0, 0, 0, 0, 0, b']']);
    }

    #[test]
    fn test_ensure_space_at_end_of_data() {
        let mut block = MemBlock::create(2).unwrap();
        block.write(0, &[1]).unwrap();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        file.seek(1).unwrap();
        assert_eq!(file.ensure_space(16).unwrap(), 0);
        file.write(&[2; 16]).unwrap();
        assert_eq!(file.size(), 17);
    }

    #[test]
    fn test_update_uintvar_grows_and_shrinks() {
        let mut block = MemBlock::create(8).unwrap();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        file.write_uintvar_stream(5).unwrap();
        file.write(&[0xEE]).unwrap();

        file.seek(0).unwrap();
        assert_eq!(file.update_uintvar_stream(300).unwrap(), 1);
        assert_eq!(file.data(), &[0xAC, 0x02, 0xEE]);

        file.seek(0).unwrap();
        assert_eq!(file.update_uintvar_stream(1).unwrap(), -1);
        assert_eq!(file.data(), &[0x01, 0xEE]);
        file.seek(0).unwrap();
        assert_eq!(file.read_uintvar_stream().unwrap(), 1);
    }

    #[test]
    fn test_bit_mode_roundtrip() {
        let mut block = writable_block();
        let pattern = [true, false, true, true, false, false, true, false, true, true];
        {
            let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
            file.begin_bit_mode().unwrap();
            assert!(file.write(&[1]).is_err());
            for bit in pattern {
                file.write_bit(bit).unwrap();
            }
            assert_eq!(file.end_bit_mode().unwrap(), 2);
            assert_eq!(file.tell(), 2);
        }
        assert_eq!(block.raw_data()[0], 0b1011_0010);

        let mut file = MemFile::open(&block);
        file.begin_bit_mode().unwrap();
        for bit in pattern {
            assert_eq!(file.read_bit().unwrap(), bit);
        }
        assert_eq!(file.end_bit_mode().unwrap(), 2);
        assert!(file.end_bit_mode().is_err());
    }

    #[test]
    fn test_reborrow_shares_block() {
        let mut block = writable_block();
        let mut file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        file.write_u8(1).unwrap();
        {
            let mut inner = file.reborrow();
            assert_eq!(inner.tell(), 1);
            inner.write_u8(2).unwrap();
        }
        assert_eq!(file.tell(), 1);
        assert_eq!(file.data(), &[1, 2]);
    }
}
