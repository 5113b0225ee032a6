use crate::{HandshakeCell, HandshakeError};
use core::hint::spin_loop;
use log::trace;

/// Idle / acknowledged.
const IDLE: u32 = 0x000;
const COPY: u32 = 0x100;
const RESET: u32 = 0x200;
const BARRIER: u32 = 0xF00;

/// A request from the loader to the peer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    /// Copy `len` bytes from `src` to `dst` using the peer's view of memory.
    Copy { src: u32, dst: u32, len: u32 },
    /// Acknowledge, then jump to the launched image.
    Reset,
    /// Acknowledge only.
    Barrier,
}

impl Command {
    /// The word published in the command cell.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Copy { .. } => COPY,
            Self::Reset => RESET,
            Self::Barrier => BARRIER,
        }
    }

    const fn arguments(&self) -> [u32; 3] {
        match *self {
            Self::Copy { src, dst, len } => [src, dst, len],
            Self::Reset | Self::Barrier => [0; 3],
        }
    }

    fn decode(code: u32, args: [u32; 3]) -> Result<Self, HandshakeError> {
        match code {
            COPY => Ok(Self::Copy {
                src: args[0],
                dst: args[1],
                len: args[2],
            }),
            RESET => Ok(Self::Reset),
            BARRIER => Ok(Self::Barrier),
            _ => Err(HandshakeError::UnknownCommand { code }),
        }
    }
}

/// Proof that a command was posted and not yet waited for.
#[must_use = "a posted command must be waited for before the next one"]
#[derive(Debug)]
pub struct Pending {
    command: Command,
}

impl Pending {
    /// Spin until the peer acknowledges.
    pub fn wait<C: HandshakeCell>(self, channel: &CommandChannel<C>) {
        while !channel.is_idle() {
            spin_loop();
        }
        trace!("command {:#x} acknowledged", self.command.code());
    }
}

/// One outstanding command at a time, with its three argument words.
pub struct CommandChannel<C> {
    command: C,
    args: [C; 3],
}

impl<C: HandshakeCell> CommandChannel<C> {
    #[must_use]
    pub const fn new(command: C, args: [C; 3]) -> Self {
        Self { command, args }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.command.load() == IDLE
    }

    /// Publish `command` without waiting.
    ///
    /// Arguments are written first; the command word store publishes them.
    ///
    /// # Errors
    /// [`HandshakeError::CommandOutstanding`] if the cell is not idle.
    pub fn post(&self, command: Command) -> Result<Pending, HandshakeError> {
        if !self.is_idle() {
            return Err(HandshakeError::CommandOutstanding {
                code: command.code(),
            });
        }
        for (cell, value) in self.args.iter().zip(command.arguments()) {
            cell.store(value);
        }
        self.command.store(command.code());
        trace!("posted command {:#x}", command.code());
        Ok(Pending { command })
    }

    /// Post `command` and wait for its acknowledgement.
    ///
    /// # Errors
    /// See [`post`](Self::post).
    pub fn send(&self, command: Command) -> Result<(), HandshakeError> {
        self.post(command)?.wait(self);
        Ok(())
    }

    /// Peer side: the current command, if any.
    ///
    /// # Errors
    /// [`HandshakeError::UnknownCommand`] for an unrecognised word. The
    /// cell is left as is.
    pub fn try_receive(&self) -> Result<Option<Command>, HandshakeError> {
        let code = self.command.load();
        if code == IDLE {
            return Ok(None);
        }
        let args = [self.args[0].load(), self.args[1].load(), self.args[2].load()];
        Command::decode(code, args).map(Some)
    }

    /// Peer side: spin until a command arrives.
    ///
    /// # Errors
    /// See [`try_receive`](Self::try_receive).
    pub fn receive(&self) -> Result<Command, HandshakeError> {
        loop {
            if let Some(command) = self.try_receive()? {
                return Ok(command);
            }
            spin_loop();
        }
    }

    /// Peer side: clear the command cell once the work is done.
    pub fn acknowledge(&self) {
        self.command.store(IDLE);
    }

    /// Loader side: zero the command and argument words.
    ///
    /// Only valid while the peer cannot be reading them, i.e. before the
    /// bring-up rounds.
    pub fn reset(&self) {
        self.command.store(IDLE);
        for cell in &self.args {
            cell.store(0);
        }
    }
}
