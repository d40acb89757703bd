//! Forward only bit field reader
use crate::error::Error;

/// Maximal width of a single (short) field read
pub const MAX_FIELD_WIDTH: usize = 32;

/// Maximal width of a long field read
pub const MAX_LONG_FIELD_WIDTH: usize = 64;

/// [BitReader] extracts MSB first bit fields from a byte buffer,
/// at any (non byte aligned) position. The cursor only moves forward.
/// Any read that would run past the end of the buffer fails and
/// leaves the cursor untouched.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    /// Absolute bit position, 0 = MSB of buf[0]
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new [BitReader] over this buffer, starting at MSB of first byte.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Creates a new [BitReader] starting at given bit offset (0..=7)
    /// within the first byte. Offset 0 is the MSB.
    pub fn with_offset(buf: &'a [u8], offset: usize) -> Result<Self, Error> {
        if offset > 7 {
            return Err(Error::InvalidBitOffset(offset));
        }
        Ok(Self { buf, pos: offset })
    }

    /// Current absolute bit position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left to consume
    pub fn remaining(&self) -> usize {
        (self.buf.len() * 8).saturating_sub(self.pos)
    }

    /// Moves cursor forward by n bits.
    pub fn skip(&mut self, n: usize) -> Option<()> {
        if n > self.remaining() {
            return None;
        }
        self.pos += n;
        Some(())
    }

    fn take(&mut self, n: usize) -> u64 {
        let mut value = 0u64;
        for bit in self.pos..self.pos + n {
            let byte = self.buf[bit / 8];
            value = (value << 1) | ((byte >> (7 - (bit % 8))) & 0x01) as u64;
        }
        self.pos += n;
        value
    }

    fn read_raw(&mut self, n: usize, max_width: usize) -> Option<u64> {
        if n == 0 || n > max_width || n > self.remaining() {
            return None;
        }
        Some(self.take(n))
    }

    /// Reads an n bit (1 ≤ n ≤ 32) unsigned field
    pub fn read_unsigned(&mut self, n: usize) -> Option<u32> {
        self.read_raw(n, MAX_FIELD_WIDTH).map(|v| v as u32)
    }

    /// Reads an n bit (1 ≤ n ≤ 32) two's complement signed field
    pub fn read_signed(&mut self, n: usize) -> Option<i32> {
        let raw = self.read_raw(n, MAX_FIELD_WIDTH)?;
        Some(sign_extend(raw, n) as i32)
    }

    /// Reads an n bit (1 ≤ n ≤ 64) unsigned field
    pub fn read_unsigned_long(&mut self, n: usize) -> Option<u64> {
        self.read_raw(n, MAX_LONG_FIELD_WIDTH)
    }

    /// Reads an n bit (1 ≤ n ≤ 64) two's complement signed field
    pub fn read_signed_long(&mut self, n: usize) -> Option<i64> {
        let raw = self.read_raw(n, MAX_LONG_FIELD_WIDTH)?;
        Some(sign_extend(raw, n))
    }

    /// Reads a single bit as a flag
    pub fn read_bool(&mut self) -> Option<bool> {
        self.read_unsigned(1).map(|b| b == 1)
    }

    /// Reads k consecutive n bit unsigned fields.
    /// Fails prior reading anything if the buffer cannot provide all of them.
    pub fn read_unsigned_bulk(&mut self, k: usize, n: usize) -> Option<Vec<u32>> {
        if n == 0 || n > MAX_FIELD_WIDTH || k.checked_mul(n)? > self.remaining() {
            return None;
        }
        Some((0..k).map(|_| self.take(n) as u32).collect())
    }

    /// Reads k consecutive n bit signed fields.
    /// Fails prior reading anything if the buffer cannot provide all of them.
    pub fn read_signed_bulk(&mut self, k: usize, n: usize) -> Option<Vec<i32>> {
        if n == 0 || n > MAX_FIELD_WIDTH || k.checked_mul(n)? > self.remaining() {
            return None;
        }
        Some((0..k).map(|_| sign_extend(self.take(n), n) as i32).collect())
    }
}

/// Two's complement sign extension of an n bit raw value
fn sign_extend(raw: u64, n: usize) -> i64 {
    if n >= 64 {
        return raw as i64;
    }
    let shift = 64 - n;
    ((raw << shift) as i64) >> shift
}
