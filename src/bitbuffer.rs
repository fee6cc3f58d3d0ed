use crate::error::BufferFull;

/// Sink side of the bit stream the codecs write into.
///
/// Bits are appended most-significant-of-the-width first. Only the low `width`
/// bits of `value` are written; anything above is ignored.
pub trait BitWrite {
    /// Appends the low `width` bits of `value`.
    fn write_bits(&mut self, value: u64, width: u8) -> Result<(), BufferFull>;

    /// Appends one bit.
    fn write_bit(&mut self, bit: bool) -> Result<(), BufferFull> {
        self.write_bits(bit as u64, 1)
    }
}

/// Source side of the bit stream. Reads consume bits in the order they were
/// written and return `None` once not enough bits remain.
pub trait BitRead {
    /// Reads the next `width` bits, most significant first.
    fn read_bits(&mut self, width: u8) -> Option<u64>;

    /// Reads one bit.
    fn read_bit(&mut self) -> Option<bool> {
        self.read_bits(1).map(|b| b == 1)
    }
}

/// A growable bit buffer. Used as the backing store of a [`SeriesEncoder`].
///
/// An optional byte limit can be set to cap memory usage. When the limit is
/// reached, write operations return `Err(BufferFull)` instead of growing.
///
/// [`SeriesEncoder`]: crate::SeriesEncoder
#[derive(Debug, Clone)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    /// Number of valid bits in the last byte (1..=8, or 0 if empty).
    bit_count: u8,
    max_bytes: Option<usize>,
}

impl BitBuffer {
    /// Creates a new empty `BitBuffer` with no size limit.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a `BitBuffer` with the given pre-allocated capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            bit_count: 0,
            max_bytes: None,
        }
    }

    /// Creates a `BitBuffer` that refuses to grow past `max_bytes` bytes.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(max_bytes.min(128)),
            bit_count: 0,
            max_bytes: Some(max_bytes),
        }
    }

    /// Sets (or clears) the maximum byte limit on an existing buffer.
    pub fn set_limit(&mut self, max_bytes: Option<usize>) {
        self.max_bytes = max_bytes;
    }

    /// Returns the byte limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Returns the total number of bits written.
    #[inline]
    pub fn len_bits(&self) -> usize {
        if self.bytes.is_empty() {
            0
        } else {
            (self.bytes.len() - 1) * 8 + self.bit_count as usize
        }
    }

    /// Returns `true` if no bits have been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the written bytes. Unused low bits of the last byte are zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the underlying bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the number of bytes that can still be added before hitting the
    /// limit, or `None` if no limit is set.
    pub fn remaining_capacity(&self) -> Option<usize> {
        self.max_bytes.map(|max| max.saturating_sub(self.bytes.len()))
    }

    /// Shortens the buffer to its first `bits` bits, zeroing the dropped tail
    /// of the last kept byte. Does nothing if the buffer is already shorter.
    pub fn truncate(&mut self, bits: usize) {
        if bits >= self.len_bits() {
            return;
        }
        let used = (bits % 8) as u8;
        if used == 0 {
            self.bytes.truncate(bits / 8);
            self.bit_count = if self.bytes.is_empty() { 0 } else { 8 };
        } else {
            self.bytes.truncate(bits / 8 + 1);
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
            self.bit_count = used;
        }
    }

    /// Writes a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> Result<(), BufferFull> {
        self.write_bits(bit as u64, 1)
    }

    /// Writes the lowest `n` bits of `value`, most significant first. `n` must be <= 64.
    ///
    /// On `Err(BufferFull)` the bits that fit in the last open byte may already
    /// have been written.
    pub fn write_bits(&mut self, value: u64, n: u8) -> Result<(), BufferFull> {
        debug_assert!(n <= 64);
        let mut remaining = n;
        while remaining > 0 {
            if self.bit_count == 0 || self.bit_count == 8 {
                self.open_byte()?;
            }
            let free = 8 - self.bit_count;
            let take = free.min(remaining);
            let shift = remaining - take;
            let chunk = ((value >> shift) & ((1u64 << take) - 1)) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= chunk << (free - take);
            }
            self.bit_count += take;
            remaining -= take;
        }
        Ok(())
    }

    fn open_byte(&mut self) -> Result<(), BufferFull> {
        if let Some(max) = self.max_bytes {
            if self.bytes.len() >= max {
                return Err(BufferFull);
            }
        }
        self.bytes.push(0);
        self.bit_count = 0;
        Ok(())
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitBuffer {
    #[inline]
    fn write_bits(&mut self, value: u64, width: u8) -> Result<(), BufferFull> {
        BitBuffer::write_bits(self, value, width)
    }
}

/// A cursor for reading bits sequentially from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    total_bits: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a `BitReader` over everything written to `buffer`.
    pub fn new(buffer: &'a BitBuffer) -> Self {
        Self::from_raw(buffer.as_bytes(), buffer.len_bits())
    }

    /// Creates a `BitReader` from raw bytes and a total bit count. A bit count
    /// larger than the slice is clamped to the slice.
    pub fn from_raw(bytes: &'a [u8], total_bits: usize) -> Self {
        Self {
            bytes,
            total_bits: total_bits.min(bytes.len() * 8),
            pos: 0,
        }
    }

    /// Number of bits left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.total_bits - self.pos
    }

    /// Returns `true` once every bit has been read.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.total_bits
    }

    /// Number of bits consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        self.read_bits(1).map(|b| b == 1)
    }

    /// Reads `n` bits as a `u64`, most significant first. Returns `None` if
    /// fewer than `n` bits remain, in which case nothing is consumed.
    pub fn read_bits(&mut self, n: u8) -> Option<u64> {
        debug_assert!(n <= 64);
        if self.remaining() < n as usize {
            return None;
        }
        let mut value: u64 = 0;
        let mut remaining = n;
        while remaining > 0 {
            let byte = self.bytes[self.pos / 8];
            let avail = 8 - (self.pos % 8) as u8;
            let take = avail.min(remaining);
            let chunk = (byte >> (avail - take)) & (((1u16 << take) - 1) as u8);
            value = (value << take) | chunk as u64;
            self.pos += take as usize;
            remaining -= take;
        }
        Some(value)
    }
}

impl BitRead for BitReader<'_> {
    #[inline]
    fn read_bits(&mut self, width: u8) -> Option<u64> {
        BitReader::read_bits(self, width)
    }
}
