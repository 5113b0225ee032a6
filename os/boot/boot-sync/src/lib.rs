//! # Cross-processor handshake primitives
//!
//! The ARM9 and ARM7 share main memory but nothing else the loader can use
//! for coordination, so every rendezvous is a 32-bit word with one writer at
//! a time and a poller on the other side.
//!
//! * [`PhaseSync`] steps both sides through a fixed number of lockstep
//!   rounds during bring-up.
//! * [`CommandChannel`] carries one request at a time from the loader to the
//!   peer and waits for the peer to clear it again.
//!
//! Both are generic over [`HandshakeCell`] so the same code runs against
//! fixed physical addresses on hardware and against `AtomicU32` in tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod cell;
mod command;
mod link;
mod phase;

pub use cell::{HandshakeCell, VolatileCell};
pub use command::{Command, CommandChannel, Pending};
pub use link::PeerLink;
pub use phase::PhaseSync;

/// Number of lockstep rounds run at boot before any command is sent.
pub const BRING_UP_ROUNDS: u32 = 16;

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum HandshakeError {
    /// A command was posted while the previous one was still unacknowledged.
    #[error("command {code:#x} posted while another is outstanding")]
    CommandOutstanding { code: u32 },
    /// The command cell held a word no command maps to.
    #[error("unknown command word {code:#x}")]
    UnknownCommand { code: u32 },
}
