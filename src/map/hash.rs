//! FNV hashing for shard selection.

use std::fmt::{self, Display, Write};

/// FNV 32-bit offset basis.
pub const FNV32_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV 32-bit prime.
pub const FNV32_PRIME: u32 = 16_777_619;

/// Hash a string with 32-bit FNV.
///
/// Each byte step multiplies by the prime, then xors in the byte. Shard
/// placement for existing callers depends on this exact order.
pub fn fnv32(key: &str) -> u32 {
    let mut hasher = Fnv32::new();
    hasher.update(key.as_bytes());
    hasher.finish()
}

/// Hash the `Display` output of a value without allocating a string.
pub fn fnv32_display<T: Display + ?Sized>(value: &T) -> u32 {
    let mut hasher = Fnv32::new();
    // Fnv32 never returns an error from write_str.
    let _ = write!(hasher, "{}", value);
    hasher.finish()
}

/// Streaming FNV-32 state.
#[derive(Clone, Copy, Debug)]
pub struct Fnv32 {
    state: u32,
}

impl Fnv32 {
    pub fn new() -> Self {
        Self {
            state: FNV32_OFFSET_BASIS,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = self.state.wrapping_mul(FNV32_PRIME);
            self.state ^= u32::from(b);
        }
    }

    pub fn finish(&self) -> u32 {
        self.state
    }
}

impl Default for Fnv32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Fnv32 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.update(s.as_bytes());
        Ok(())
    }
}
