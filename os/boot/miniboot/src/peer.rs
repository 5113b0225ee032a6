//! # ARM7 peer agent
//!
//! The other end of the handshake. The ARM7 follows the bring-up rounds and
//! then executes commands for the ARM9 until told to reset.

use crate::error::BootError;
use crate::memory::PhysicalMemory;
use boot_abi::header::ARM7_ENTRY_OFFSET;
use boot_abi::memory::HEADER_ADDRESS;
use boot_sync::{BRING_UP_ROUNDS, Command, HandshakeCell, PeerLink};
use log::trace;

pub struct PeerAgent<'a, M, C> {
    memory: M,
    link: &'a PeerLink<C>,
    rounds: u32,
}

impl<'a, M: PhysicalMemory, C: HandshakeCell> PeerAgent<'a, M, C> {
    #[must_use]
    pub const fn new(memory: M, link: &'a PeerLink<C>) -> Self {
        Self {
            memory,
            link,
            rounds: BRING_UP_ROUNDS,
        }
    }

    /// Follow `rounds` bring-up rounds instead of the default.
    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Serve commands until `RESET`, then return the ARM7 entry point of the
    /// loaded header.
    ///
    /// # Errors
    /// An unknown command word or a failed copy. The failing command is left
    /// unacknowledged.
    #[allow(clippy::cast_possible_truncation)]
    pub fn serve(&mut self) -> Result<u32, BootError> {
        self.link.sync.follow(self.rounds);

        let commands = &self.link.commands;
        loop {
            match commands.receive()? {
                Command::Copy { src, dst, len } => {
                    trace!("copy {len:#x} bytes {src:#010x} -> {dst:#010x}");
                    self.memory.copy(src, dst, len)?;
                }
                Command::Barrier => {}
                Command::Reset => {
                    let entry = self
                        .memory
                        .read_u32(HEADER_ADDRESS + ARM7_ENTRY_OFFSET as u32)?;
                    commands.acknowledge();
                    return Ok(entry);
                }
            }
            commands.acknowledge();
        }
    }
}
