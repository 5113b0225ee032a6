//! # Argument Record

use crate::memory::CMDLINE_ADDRESS;
use crate::{read_u32_le, write_u32_le};

/// `"_arg"` in ASCII.
pub const ARGV_MAGIC: u32 = 0x5F61_7267;

/// Encoded size of [`ArgvRecord`].
pub const ARGV_RECORD_LEN: usize = 12;

/// Command line handed to the launched image.
///
/// `cmdline` points at a NUL-separated argument buffer of `cmdline_size`
/// bytes, including the final NUL.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ArgvRecord {
    pub magic: u32,
    pub cmdline: u32,
    pub cmdline_size: u32,
}

impl ArgvRecord {
    /// Record for a command line of `len` bytes (without NUL) at the fixed
    /// buffer address.
    #[must_use]
    pub const fn for_cmdline(len: u32) -> Self {
        Self {
            magic: ARGV_MAGIC,
            cmdline: CMDLINE_ADDRESS,
            cmdline_size: len + 1,
        }
    }

    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            magic: read_u32_le(bytes, 0)?,
            cmdline: read_u32_le(bytes, 4)?,
            cmdline_size: read_u32_le(bytes, 8)?,
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; ARGV_RECORD_LEN] {
        let mut out = [0u8; ARGV_RECORD_LEN];
        write_u32_le(&mut out, 0, self.magic);
        write_u32_le(&mut out, 4, self.cmdline);
        write_u32_le(&mut out, 8, self.cmdline_size);
        out
    }
}
