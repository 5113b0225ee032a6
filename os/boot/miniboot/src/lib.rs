//! # miniboot
//!
//! A secondary bootloader for the dual-processor handheld. It runs on the
//! ARM9 after the firmware, loads `/BOOT.NDS` from the memory card, patches
//! the card driver embedded in the image, and starts both processors.
//!
//! ## Overview
//!
//! [`Bootloader`] is the ARM9 side: a state machine stepped from `Init` to
//! `Launch`, producing a [`Handoff`] that sends the ARM7 on its way and
//! soft-resets the ARM9 into the new image. [`PeerAgent`] is the ARM7 side,
//! executing the copies the ARM9 cannot do itself.
//!
//! Nothing in this crate touches hardware directly. The loader is handed
//!
//! * a [`Platform`] for the few registers it configures,
//! * a [`Storage`] for the FAT volume,
//! * a [`PhysicalMemory`] for every load and store, and
//! * a [`PeerLink`](boot_sync::PeerLink) to reach the ARM7.
//!
//! On the target, [`hardware`] wires these to the real thing.
//!
//! ## Failure
//!
//! Every error is fatal. The caller passes it to [`halt()`], which prints the
//! diagnostic and its detail line on the console and stops.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod bootstub;
mod config;
mod error;
mod halt;
pub mod image;
pub mod loader;
pub mod logger;
pub mod memory;
mod peer;
pub mod platform;
pub mod storage;

pub use config::BootConfig;
pub use error::BootError;
pub use halt::{halt, report};
pub use loader::{BootState, Bootloader, Handoff};
pub use memory::{MemoryError, PhysicalMemory, Span};
pub use peer::PeerAgent;
pub use platform::Platform;
pub use storage::{FsError, Storage};

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod hardware {
    //! Entry points for the two processors.

    use crate::memory::RawMemory;
    use crate::platform::Hardware;
    use crate::{BootConfig, Bootloader, PeerAgent, Storage, halt, logger};
    use boot_abi::memory::{IPC_ARGUMENT_CELLS, IPC_COMMAND_CELL, IPC_PHASE_CELL};
    use boot_sync::{PeerLink, VolatileCell};
    use core::hint::spin_loop;

    /// The handshake block both processors agree on.
    ///
    /// The phase word must not hold an odd value below twice the bring-up
    /// rounds when the processors start, or the ARM7 answers a round the
    /// ARM9 never led. The firmware zeroes the block on a cold boot and the
    /// loader zeroes the phase word again at handoff. An image that reuses
    /// the block has to zero it before returning through the bootstub. The
    /// ARM9 clears the command words itself before bring-up.
    // SAFETY: the five words are reserved for the handshake, word aligned and
    // mapped for both processors.
    pub static LINK: PeerLink<VolatileCell> = unsafe {
        PeerLink::new(
            VolatileCell::at(IPC_PHASE_CELL),
            VolatileCell::at(IPC_COMMAND_CELL),
            [
                VolatileCell::at(IPC_ARGUMENT_CELLS),
                VolatileCell::at(IPC_ARGUMENT_CELLS + 4),
                VolatileCell::at(IPC_ARGUMENT_CELLS + 8),
            ],
        )
    };

    /// Boot on the ARM9. `display_reset` blanks both engines.
    pub fn boot<S: Storage>(storage: S, config: BootConfig, display_reset: fn()) -> ! {
        // SAFETY: called once, from the ARM9 entry point.
        let (platform, memory) = unsafe { (Hardware::new(display_reset), RawMemory::new()) };
        let loader: Bootloader<'_, Hardware, S, RawMemory, VolatileCell> =
            Bootloader::new(platform, storage, memory, &LINK, config).with_logger(&logger::CONSOLE);
        match loader.run_to_launch() {
            Ok(handoff) => handoff.launch(),
            Err(e) => halt(&e),
        }
    }

    /// Serve the ARM9 from the ARM7, then soft-reset into the new image.
    pub fn serve_peer() -> ! {
        // SAFETY: called once, from the ARM7 entry point.
        let memory = unsafe { RawMemory::new() };
        if PeerAgent::new(memory, &LINK).serve().is_err() {
            loop {
                spin_loop();
            }
        }
        // SAFETY: the firmware SoftReset call never returns.
        unsafe { core::arch::asm!("swi #0", options(noreturn)) }
    }
}
