use crate::{CommandChannel, HandshakeCell, PhaseSync};
use core::sync::atomic::AtomicU32;

/// Both halves of the handshake as seen from either processor.
pub struct PeerLink<C> {
    pub sync: PhaseSync<C>,
    pub commands: CommandChannel<C>,
}

impl<C: HandshakeCell> PeerLink<C> {
    #[must_use]
    pub const fn new(phase: C, command: C, args: [C; 3]) -> Self {
        Self {
            sync: PhaseSync::new(phase),
            commands: CommandChannel::new(command, args),
        }
    }
}

impl PeerLink<AtomicU32> {
    /// An in-process link with every word zeroed.
    #[must_use]
    pub const fn in_process() -> Self {
        Self::new(
            AtomicU32::new(0),
            AtomicU32::new(0),
            [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
        )
    }
}
