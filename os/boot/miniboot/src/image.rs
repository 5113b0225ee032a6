//! # Region validation and loading

use crate::error::BootError;
use crate::memory::{PhysicalMemory, Span};
use crate::storage::Storage;
use boot_abi::header::RegionHeader;
use boot_abi::memory::{ARM7_STAGING_ADDRESS, ARM7_WRAM_WINDOW};
use boot_abi::{Cpu, Window};
use log::debug;

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum RegionError {
    #[error("region is empty")]
    Empty,
    #[error("entry {entry:#010x} lies outside the region")]
    EntryOutside { entry: u32 },
    #[error("load address {address:#010x} is not in a permitted window")]
    NoWindow { address: u32 },
    #[error("region ends at {end:#x}, past the end of {}", window.name)]
    PastWindow { end: u64, window: Window },
}

/// Where a validated region goes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Placement {
    /// The window the region lies in.
    pub window: Window,
    /// Final address of the region.
    pub load_address: u32,
    /// Address the loader streams the bytes to.
    pub read_address: u32,
    pub size: u32,
}

impl Placement {
    /// Whether the bytes need moving by the peer after they are read.
    #[must_use]
    pub const fn is_staged(&self) -> bool {
        self.read_address != self.load_address
    }

    #[must_use]
    pub const fn read_span(&self) -> Span {
        Span::new(self.read_address, self.size)
    }
}

/// Check a header region against the windows `cpu` may load into.
///
/// # Errors
/// The first rule the region breaks, in this order: non-empty, entry inside
/// the region, start inside a window, end inside that same window.
pub fn validate_region(cpu: Cpu, region: &RegionHeader) -> Result<Placement, RegionError> {
    if region.size == 0 {
        return Err(RegionError::Empty);
    }

    let start = region.load_address;
    if region.entry < start || u64::from(region.entry) >= region.end() {
        return Err(RegionError::EntryOutside {
            entry: region.entry,
        });
    }

    let window = cpu
        .windows()
        .iter()
        .copied()
        .find(|w| w.contains(start))
        .ok_or(RegionError::NoWindow { address: start })?;
    if !window.fits(start, region.size) {
        return Err(RegionError::PastWindow {
            end: region.end(),
            window,
        });
    }

    // The ARM9 has no path into ARM7 WRAM.
    let read_address = if window == ARM7_WRAM_WINDOW {
        ARM7_STAGING_ADDRESS
    } else {
        start
    };

    Ok(Placement {
        window,
        load_address: start,
        read_address,
        size: region.size,
    })
}

/// Stream `span.len` bytes from the current file position into `span`.
///
/// # Errors
/// * [`BootError::Read`] on a filesystem error,
/// * [`BootError::ShortRead`] if the file ends first,
/// * [`BootError::Memory`] if `span` is not accessible.
pub fn read_into<S: Storage, M: PhysicalMemory>(
    storage: &mut S,
    file: &mut S::File,
    memory: &mut M,
    span: Span,
    name: &'static str,
) -> Result<(), BootError> {
    let got = memory.with_region(span, |buf| storage.read(file, buf))?;
    let got = got.map_err(|source| BootError::Read { file: name, source })?;
    debug!("read {got:#x} bytes to {span}");
    if got < span.len as usize {
        return Err(BootError::ShortRead {
            file: name,
            expected: span.len,
            got,
        });
    }
    Ok(())
}
