//! # Memory Layout

use core::fmt;

/// Start of main RAM as seen by both processors.
pub const MAIN_RAM_START: u32 = 0x0200_0000;

/// Physical size of main RAM. Addresses up to `0x0300_0000` mirror it.
pub const MAIN_RAM_SIZE: u32 = 0x0040_0000;

/// Where the target header lives while booting, and where the firmware
/// soft-reset reads both entry points from.
pub const HEADER_ADDRESS: u32 = 0x027F_FE00;

/// Number of header bytes copied to [`HEADER_ADDRESS`].
pub const HEADER_SIZE: u32 = 0x170;

/// Fixed location of the [`BootstubRecord`](crate::bootstub::BootstubRecord).
pub const BOOTSTUB_ADDRESS: u32 = 0x02FF_4000;

/// First address past the bootstub parking area.
pub const BOOTSTUB_LIMIT: u32 = IPC_BLOCK_ADDRESS;

/// Shared words used by the ARM9/ARM7 handshake.
///
/// Layout: phase cell, command cell, then three command argument words.
pub const IPC_BLOCK_ADDRESS: u32 = 0x02FF_FD00;

/// Phase cell of the bring-up rendezvous.
pub const IPC_PHASE_CELL: u32 = IPC_BLOCK_ADDRESS;

/// Command cell; zero means idle.
pub const IPC_COMMAND_CELL: u32 = IPC_BLOCK_ADDRESS + 4;

/// First of the command argument words.
pub const IPC_ARGUMENT_CELLS: u32 = IPC_BLOCK_ADDRESS + 8;

/// Fixed location of the [`ArgvRecord`](crate::argv::ArgvRecord).
pub const ARGV_ADDRESS: u32 = 0x02FF_FE70;

/// Command line buffer referenced by the argv record.
pub const CMDLINE_ADDRESS: u32 = 0x02FF_FEB0;

/// Capacity of the command line buffer, including the terminating NUL.
pub const CMDLINE_CAPACITY: u32 = 0x80;

/// Where the loader parks a copy of its own storage driver before mounting.
pub const DRIVER_SNAPSHOT_ADDRESS: u32 = 0x0682_0000;

/// Size of the parked storage driver.
pub const DRIVER_SNAPSHOT_SIZE: u32 = 16 * 1024;

/// Staging address for ARM7 images destined for ARM7-local memory.
///
/// The ARM9 cannot reach ARM7 WRAM, so those images are read here first and
/// moved by the ARM7 itself.
pub const ARM7_STAGING_ADDRESS: u32 = MAIN_RAM_START;

/// Main RAM load window, shared by both processors.
pub const MAIN_RAM_WINDOW: Window = Window::new("main RAM", MAIN_RAM_START, 0x023B_FE00);

/// ARM7-local work RAM window.
pub const ARM7_WRAM_WINDOW: Window = Window::new("ARM7 WRAM", 0x037F_8000, 0x0380_FE00);

const ARM9_WINDOWS: &[Window] = &[MAIN_RAM_WINDOW];
const ARM7_WINDOWS: &[Window] = &[MAIN_RAM_WINDOW, ARM7_WRAM_WINDOW];

const _: () = {
    assert!(MAIN_RAM_WINDOW.end <= MAIN_RAM_START + MAIN_RAM_SIZE);
    assert!(HEADER_SIZE <= 0x200);
    assert!(BOOTSTUB_ADDRESS < BOOTSTUB_LIMIT);
    assert!(IPC_ARGUMENT_CELLS + 12 <= ARGV_ADDRESS);
    assert!(ARGV_ADDRESS + 12 <= CMDLINE_ADDRESS);
    assert!(ARM7_STAGING_ADDRESS == MAIN_RAM_WINDOW.start);
    assert!(DRIVER_SNAPSHOT_ADDRESS.is_multiple_of(4));
};

/// The two processors of the system.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Cpu {
    /// The main processor; runs the loader.
    Arm9,
    /// The secondary processor; served over the handshake.
    Arm7,
}

impl Cpu {
    /// Load windows this processor's image may occupy.
    #[must_use]
    pub const fn windows(self) -> &'static [Window] {
        match self {
            Self::Arm9 => ARM9_WINDOWS,
            Self::Arm7 => ARM7_WINDOWS,
        }
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm9 => f.write_str("ARM9"),
            Self::Arm7 => f.write_str("ARM7"),
        }
    }
}

/// A half-open physical address range `[start, end)` a load region may occupy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Window {
    pub name: &'static str,
    pub start: u32,
    pub end: u32,
}

impl Window {
    #[must_use]
    pub const fn new(name: &'static str, start: u32, end: u32) -> Self {
        Self { name, start, end }
    }

    /// Whether `addr` lies in `[start, end)`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Whether `[start, start + size)` fits entirely inside the window.
    ///
    /// An empty range never fits.
    #[inline]
    #[must_use]
    pub const fn fits(&self, start: u32, size: u32) -> bool {
        let end = start as u64 + size as u64;
        size != 0 && self.contains(start) && end <= self.end as u64
    }
}
