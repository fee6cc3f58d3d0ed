//! XOR analysis of two consecutive values.

/// The changed-bit span between two 64-bit float patterns.
///
/// `leading + middle + trailing == 64` for any non-zero XOR. Identical inputs
/// produce the sentinel `leading == trailing == 64`, `middle == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorDelta {
    /// Zero bits above the highest set bit of `xor`.
    pub leading: u8,
    /// Zero bits below the lowest set bit of `xor`.
    pub trailing: u8,
    /// Width of the span between the first and last set bit, inclusive.
    pub middle: u8,
    /// `xor` shifted right by `trailing`, so only the `middle` span remains.
    pub meaningful: u64,
    /// The raw XOR of both patterns.
    pub xor: u64,
}

impl XorDelta {
    /// Analyzes two raw bit patterns.
    #[inline]
    pub fn from_bits(a: u64, b: u64) -> Self {
        let xor = a ^ b;
        if xor == 0 {
            return Self {
                leading: 64,
                trailing: 64,
                middle: 0,
                meaningful: 0,
                xor,
            };
        }
        let leading = xor.leading_zeros() as u8;
        let trailing = xor.trailing_zeros() as u8;
        let middle = 64 - leading - trailing;
        Self {
            leading,
            trailing,
            middle,
            meaningful: (xor >> trailing) & bitmask(middle),
            xor,
        }
    }

    /// `true` when both inputs were bit-identical.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.xor == 0
    }
}

/// Analyzes the XOR of two doubles' IEEE-754 bit patterns.
#[inline]
pub fn analyze(a: f64, b: f64) -> XorDelta {
    XorDelta::from_bits(a.to_bits(), b.to_bits())
}

/// Returns a bitmask with the lowest `n` bits set. Handles `n == 64` without overflow.
#[inline]
pub(crate) fn bitmask(n: u8) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}
