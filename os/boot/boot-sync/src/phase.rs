use crate::HandshakeCell;
use core::hint::spin_loop;
use log::trace;

/// Lockstep rendezvous over one phase word.
///
/// The leader writes odd phases and the follower answers each with the next
/// even one, so each side has exactly one writer per phase. The word is
/// expected to read zero before the first round.
pub struct PhaseSync<C> {
    cell: C,
}

impl<C: HandshakeCell> PhaseSync<C> {
    #[must_use]
    pub const fn new(cell: C) -> Self {
        Self { cell }
    }

    /// The phase currently published.
    #[inline]
    pub fn current(&self) -> u32 {
        self.cell.load()
    }

    /// Publish `phase`.
    #[inline]
    pub fn advance(&self, phase: u32) {
        self.cell.store(phase);
    }

    /// Spin until the phase differs from `last`; returns the new phase.
    pub fn await_change(&self, last: u32) -> u32 {
        loop {
            let now = self.cell.load();
            if now != last {
                return now;
            }
            spin_loop();
        }
    }

    /// Spin until exactly `phase` is published.
    pub fn await_phase(&self, phase: u32) {
        while self.cell.load() != phase {
            spin_loop();
        }
    }

    /// Drive `rounds` rounds from the leading side.
    pub fn lead(&self, rounds: u32) {
        for round in 0..rounds {
            let ours = round * 2 + 1;
            self.advance(ours);
            self.await_phase(ours + 1);
            trace!("sync round {round} acknowledged");
        }
    }

    /// Answer `rounds` rounds from the following side.
    pub fn follow(&self, rounds: u32) {
        for round in 0..rounds {
            let theirs = round * 2 + 1;
            self.await_phase(theirs);
            self.advance(theirs + 1);
        }
    }

    /// Return the word to its initial state.
    ///
    /// Only valid once the follower has stopped watching the word.
    pub fn reset(&self) {
        self.cell.store(0);
    }
}
