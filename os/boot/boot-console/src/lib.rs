//! # On-screen console logging
//!
//! The loader has one output device: a text console that accepts a byte at a
//! time. This crate puts the `log` facade in front of it.
//!
//! ```text
//! info!/debug!/error!
//!     ↓
//! ConsoleLogger (log::Log, level filter)
//!     ↓
//! ConsoleWriter (fmt::Write)
//!     ↓
//! ByteSink::put_byte
//! ```
//!
//! Errors are printed as the bare message since they are the diagnostic the
//! user reads before the loader halts. Everything else carries a level tag.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod logger;

pub use logger::ConsoleLogger;

use core::fmt;

/// The console collaborator: writing a byte makes it visible.
pub trait ByteSink {
    fn put_byte(&mut self, byte: u8);
}

/// `fmt::Write` adapter over a [`ByteSink`].
pub struct ConsoleWriter<'a, S: ByteSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ByteSink + ?Sized> ConsoleWriter<'a, S> {
    pub const fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: ByteSink + ?Sized> fmt::Write for ConsoleWriter<'_, S> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.sink.put_byte(b);
        }
        Ok(())
    }
}
