//! # Bootstub Record
//!
//! A chain-loaded image returns to the loader by jumping through the record at
//! [`BOOTSTUB_ADDRESS`](crate::memory::BOOTSTUB_ADDRESS). The record points at
//! a small trampoline, which in turn points at parked copies of the loader's
//! own ARM9 and ARM7 images.
//!
//! ```text
//! BOOTSTUB_ADDRESS ┌──────────────────────────┐
//!                  │ BootstubRecord (24 B)    │──┐ arm9_entry / arm7_entry
//!                  ├──────────────────────────┤ ◀┘
//!                  │ trampoline               │
//!                  │  +0  ARM9 entry insn     │
//!                  │  +4  ARM7 entry insn     │
//!                  │  +8  ARM9 target ────────┼──┐
//!                  │  +12 ARM7 target ────────┼──┼─┐
//!                  │  ... code                │  │ │
//!                  ├──────────────────────────┤ ◀┘ │
//!                  │ parked loader ARM9 image │    │
//!                  ├──────────────────────────┤ ◀──┘
//!                  │ parked loader ARM7 image │
//!                  └──────────────────────────┘
//! ```

use crate::{read_u32_le, read_u64_le, write_u32_le};

/// `"bootstub"` in ASCII, little-endian.
pub const BOOTSTUB_MAGIC: u64 = 0x6275_7473_746F_6F62;

/// Encoded size of [`BootstubRecord`], including trailing padding.
pub const BOOTSTUB_RECORD_LEN: usize = 24;

/// Size of the trampoline's fixed header.
pub const TRAMPOLINE_HEADER_LEN: usize = 16;

/// Offset of the ARM9 entry instruction within the trampoline.
pub const TRAMPOLINE_ARM9_ENTRY: u32 = 0;

/// Offset of the ARM7 entry instruction within the trampoline.
pub const TRAMPOLINE_ARM7_ENTRY: u32 = 4;

/// Offset of the parked ARM9 image pointer within the trampoline.
pub const TRAMPOLINE_ARM9_TARGET: usize = 8;

/// Offset of the parked ARM7 image pointer within the trampoline.
pub const TRAMPOLINE_ARM7_TARGET: usize = 12;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct BootstubRecord {
    pub magic: u64,
    pub arm9_entry: u32,
    pub arm7_entry: u32,
    pub loader_size: u32,
}

impl BootstubRecord {
    /// A record pointing at a trampoline placed at `trampoline`.
    #[must_use]
    pub const fn for_trampoline(trampoline: u32) -> Self {
        Self {
            magic: BOOTSTUB_MAGIC,
            arm9_entry: trampoline + TRAMPOLINE_ARM9_ENTRY,
            arm7_entry: trampoline + TRAMPOLINE_ARM7_ENTRY,
            loader_size: 0,
        }
    }

    /// Decode a record; `None` if `bytes` is too short.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            magic: read_u64_le(bytes, 0)?,
            arm9_entry: read_u32_le(bytes, 8)?,
            arm7_entry: read_u32_le(bytes, 12)?,
            loader_size: read_u32_le(bytes, 16)?,
        })
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic == BOOTSTUB_MAGIC
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; BOOTSTUB_RECORD_LEN] {
        let mut out = [0u8; BOOTSTUB_RECORD_LEN];
        out[0..8].copy_from_slice(&self.magic.to_le_bytes());
        write_u32_le(&mut out, 8, self.arm9_entry);
        write_u32_le(&mut out, 12, self.arm7_entry);
        write_u32_le(&mut out, 16, self.loader_size);
        out
    }
}
