//! # Loader ABI and Memory Layout
//!
//! This crate is the single source of truth for everything miniboot agrees on
//! with the executables it launches: fixed physical addresses, the permitted
//! load windows per processor, the on-disk target header layout, and the two
//! records left behind in memory for the launched image (the bootstub and the
//! argument list).
//!
//! ## Overview
//!
//! There is no operating system on the other side of the handoff. The only
//! contract between loader and image is a set of addresses both sides were
//! built against. Keeping them in one crate means a change to the layout is a
//! change to this crate's version, never a scattered literal.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0200_0000 ┌─────────────────────────────────┐  MAIN_RAM_START
//!             │  ARM9 / ARM7 load window        │  (ARM7 staging at start)
//! 0x023B_FE00 ├─────────────────────────────────┤  MAIN_RAM_WINDOW.end
//!             │        (reserved)               │
//! 0x02FF_4000 ├─────────────────────────────────┤  BOOTSTUB_ADDRESS
//!             │  bootstub record + trampoline   │
//!             │  + parked loader images         │
//! 0x02FF_FD00 ├─────────────────────────────────┤  IPC_BLOCK_ADDRESS
//!             │  phase cell, command cell, args │
//! 0x02FF_FE00 │  target header                  │  HEADER_ADDRESS (0x027F_FE00)
//! 0x02FF_FE70 │  argv record                    │  ARGV_ADDRESS
//! 0x02FF_FEB0 │  command line buffer            │  CMDLINE_ADDRESS
//!             └─────────────────────────────────┘
//! 0x037F_8000 ┌─────────────────────────────────┐  ARM7 local WRAM
//! 0x0380_FE00 └─────────────────────────────────┘
//! 0x0682_0000    driver snapshot (LCDC VRAM)        DRIVER_SNAPSHOT_ADDRESS
//! ```
//!
//! Main RAM is 4 MiB and mirrored across `0x0200_0000..0x0300_0000`; the high
//! addresses above are mirrors of the top of physical RAM. The header is
//! addressed through the `0x027F_FE00` mirror and drawn where it lands in
//! the top mirror. The argv record and command line overlap its later
//! fields and are written only once the loader is done with them.
//!
//! ## Records
//!
//! * [`header::NdsHeader`]: the target executable header, read from offset 0
//!   of the image file and parked at [`memory::HEADER_ADDRESS`], where the
//!   firmware soft-reset picks up both entry points.
//! * [`bootstub::BootstubRecord`]: written at most once per physical boot so a
//!   chain-loaded image can return to a working loader.
//! * [`argv::ArgvRecord`]: the command line handed to the launched image.
//!
//! All records are little-endian and encoded byte-by-byte; nothing here relies
//! on host layout or alignment.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod argv;
pub mod bootstub;
pub mod header;
pub mod memory;

pub use memory::{Cpu, Window};

#[inline]
pub(crate) fn read_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let end = off.checked_add(4)?;
    let s = buf.get(off..end)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

#[inline]
pub(crate) fn read_u64_le(buf: &[u8], off: usize) -> Option<u64> {
    let lo = read_u32_le(buf, off)?;
    let hi = read_u32_le(buf, off.checked_add(4)?)?;
    Some(u64::from(lo) | (u64::from(hi) << 32))
}

#[inline]
pub(crate) fn write_u32_le(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}
