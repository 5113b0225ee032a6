//! # DLDI driver patching
//!
//! Homebrew images carry a placeholder storage driver inside their ARM9
//! binary, announced by a [`DriverDescriptor`]. Before such an image can reach
//! the memory card it was loaded from, the placeholder has to be replaced by a
//! driver that matches the card, and that driver has to be rewritten to run at
//! the placeholder's address.
//!
//! This crate does both, as pure functions over byte slices:
//!
//! * [`locate`] finds the descriptor,
//! * [`relocate`] moves a driver that is already in place,
//! * [`patch`] replaces the embedded driver and relocates the replacement.
//!
//! Nothing here validates the descriptor beyond its length. A driver whose
//! signature matches is trusted; garbage bounds only lead to garbage being
//! rewritten inside the slice it came in.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod descriptor;
mod locate;
mod relocate;

pub use descriptor::{DESCRIPTOR_LEN, DriverDescriptor, EntryPoints, Features, FixFlags, Section, Sections};
pub use locate::{SIGNATURE_LEN, locate};
pub use relocate::{PatchOutcome, Relocation, patch, relocate};

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum DldiError {
    /// The replacement is larger than the space the image reserved.
    #[error("Not enough space.")]
    NotEnoughSpace { required: u8, available: u8 },
    #[error("driver descriptor is truncated ({len} bytes)")]
    Truncated { len: usize },
}

/// Little-endian word at `at`; the caller has checked the bounds.
#[inline]
pub(crate) fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline]
pub(crate) fn write_u32_le(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
