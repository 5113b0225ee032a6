//! # Bootstub install
//!
//! Parks a copy of the running loader behind a small trampoline so that an
//! image launched later can get back to it. See [`boot_abi::bootstub`] for the
//! layout.

use crate::memory::{MemoryError, PhysicalMemory};
use boot_abi::bootstub::{
    BOOTSTUB_RECORD_LEN, BootstubRecord, TRAMPOLINE_ARM7_TARGET, TRAMPOLINE_ARM9_TARGET,
    TRAMPOLINE_HEADER_LEN,
};
use boot_abi::header::{HEADER_LEN, HeaderError, NdsHeader, RegionHeader};
use boot_abi::memory::{BOOTSTUB_ADDRESS, BOOTSTUB_LIMIT, HEADER_ADDRESS};
use log::{debug, trace};

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum BootstubError {
    #[error("trampoline is {len} bytes, shorter than its header")]
    TrampolineTooShort { len: usize },
    #[error("parked loader would end at {end:#x}")]
    TooLarge { end: u64 },
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Where each part of the bootstub goes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootstubLayout {
    pub trampoline: u32,
    pub arm9: u32,
    pub arm7: u32,
    pub end: u64,
}

impl BootstubLayout {
    /// Lay out a trampoline of `trampoline_len` bytes followed by the loader
    /// regions `arm9` and `arm7`.
    ///
    /// # Errors
    /// [`BootstubError::TooLarge`] if the result runs past
    /// [`BOOTSTUB_LIMIT`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn plan(
        trampoline_len: usize,
        arm9: &RegionHeader,
        arm7: &RegionHeader,
    ) -> Result<Self, BootstubError> {
        let trampoline = u64::from(BOOTSTUB_ADDRESS) + BOOTSTUB_RECORD_LEN as u64;
        let arm9_at = trampoline + trampoline_len as u64;
        let arm7_at = arm9_at + u64::from(arm9.size);
        let end = arm7_at + u64::from(arm7.size);
        if end > u64::from(BOOTSTUB_LIMIT) {
            return Err(BootstubError::TooLarge { end });
        }

        // Everything is below BOOTSTUB_LIMIT now.
        Ok(Self {
            trampoline: trampoline as u32,
            arm9: arm9_at as u32,
            arm7: arm7_at as u32,
            end,
        })
    }
}

/// Whether a bootstub is already present.
///
/// # Errors
/// If the record cannot be read.
pub fn is_installed<M: PhysicalMemory>(memory: &mut M) -> Result<bool, MemoryError> {
    let mut record = [0u8; BOOTSTUB_RECORD_LEN];
    memory.read(BOOTSTUB_ADDRESS, &mut record)?;
    Ok(BootstubRecord::parse(&record).is_some_and(|r| r.is_valid()))
}

/// Install the bootstub unless one exists. Returns whether it was written.
///
/// The loader's own header must still be at [`HEADER_ADDRESS`]. The record's
/// magic is written last; until then a reader sees no bootstub.
///
/// # Errors
/// Nothing is published on error, but the parking area may be partially
/// overwritten.
#[allow(clippy::cast_possible_truncation)]
pub fn install<M: PhysicalMemory>(memory: &mut M, trampoline: &[u8]) -> Result<bool, BootstubError> {
    if is_installed(memory)? {
        debug!("bootstub already present");
        return Ok(false);
    }
    if trampoline.len() < TRAMPOLINE_HEADER_LEN {
        return Err(BootstubError::TrampolineTooShort {
            len: trampoline.len(),
        });
    }

    let mut raw = [0u8; HEADER_LEN];
    memory.read(HEADER_ADDRESS, &mut raw)?;
    let own = NdsHeader::parse(&raw)?;

    let layout = BootstubLayout::plan(trampoline.len(), &own.arm9, &own.arm7)?;
    trace!("bootstub layout {layout:x?}");

    memory.write(layout.trampoline, trampoline)?;
    memory.copy(own.arm9.load_address, layout.arm9, own.arm9.size)?;
    memory.copy(own.arm7.load_address, layout.arm7, own.arm7.size)?;
    memory.write_u32(layout.trampoline + TRAMPOLINE_ARM9_TARGET as u32, layout.arm9)?;
    memory.write_u32(layout.trampoline + TRAMPOLINE_ARM7_TARGET as u32, layout.arm7)?;

    let record = BootstubRecord::for_trampoline(layout.trampoline).to_bytes();
    memory.write(BOOTSTUB_ADDRESS + 8, &record[8..])?;
    memory.write(BOOTSTUB_ADDRESS, &record[..8])?;

    debug!("bootstub installed, parked loader ends at {:#x}", layout.end);
    Ok(true)
}
