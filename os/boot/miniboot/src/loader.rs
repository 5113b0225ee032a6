//! # Boot orchestrator
//!
//! ```text
//! Init → HandshakeSync → InstallBootstub → MountStorage → OpenImage
//!      → ReadHeader → LoadSecondaryRegion → LoadPrimaryRegion → Finalize
//!      → Launch
//! ```
//!
//! Every transition may fail. A failed step leaves the machine in
//! [`BootState::Halted`] and hands the error back to the caller, which is
//! expected to [`halt`](crate::halt()) with it.

use crate::bootstub;
use crate::config::BootConfig;
use crate::error::BootError;
use crate::halt::halt;
use crate::image::{read_into, validate_region};
use crate::memory::{PhysicalMemory, Span};
use crate::platform::Platform;
use crate::storage::Storage;
use boot_abi::Cpu;
use boot_abi::argv::ArgvRecord;
use boot_abi::header::{HEADER_LEN, NdsHeader};
use boot_abi::memory::{
    ARGV_ADDRESS, CMDLINE_ADDRESS, CMDLINE_CAPACITY, DRIVER_SNAPSHOT_ADDRESS, DRIVER_SNAPSHOT_SIZE,
    HEADER_ADDRESS, HEADER_SIZE,
};
use boot_console::ConsoleLogger;
use boot_dldi::PatchOutcome;
use boot_registers::{ExMemCnt, PowCnt, VramLayout};
use boot_sync::{Command, HandshakeCell, Pending, PeerLink};
use core::hint::spin_loop;
use core::mem;
use log::{LevelFilter, debug, info};

/// Where the orchestrator currently is.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BootState {
    Init,
    HandshakeSync,
    InstallBootstub,
    MountStorage,
    OpenImage,
    ReadHeader,
    LoadSecondaryRegion,
    LoadPrimaryRegion,
    Finalize,
    Launch,
    Halted,
}

/// A state together with what it carries forward.
enum Stage<F> {
    Init,
    HandshakeSync,
    InstallBootstub,
    MountStorage,
    OpenImage,
    ReadHeader(F),
    LoadSecondary(F, NdsHeader),
    LoadPrimary(F, NdsHeader, Option<Pending>),
    Finalize(NdsHeader),
    Launch(NdsHeader),
    Halted,
}

impl<F> Stage<F> {
    const fn state(&self) -> BootState {
        match self {
            Self::Init => BootState::Init,
            Self::HandshakeSync => BootState::HandshakeSync,
            Self::InstallBootstub => BootState::InstallBootstub,
            Self::MountStorage => BootState::MountStorage,
            Self::OpenImage => BootState::OpenImage,
            Self::ReadHeader(..) => BootState::ReadHeader,
            Self::LoadSecondary(..) => BootState::LoadSecondaryRegion,
            Self::LoadPrimary(..) => BootState::LoadPrimaryRegion,
            Self::Finalize(..) => BootState::Finalize,
            Self::Launch(..) => BootState::Launch,
            Self::Halted => BootState::Halted,
        }
    }
}

/// The ARM9 side of a boot.
pub struct Bootloader<'a, P, S: Storage, M, C> {
    platform: P,
    storage: S,
    memory: M,
    link: &'a PeerLink<C>,
    logger: Option<&'a ConsoleLogger>,
    config: BootConfig,
    diagnostics: bool,
    stage: Stage<S::File>,
}

impl<'a, P, S, M, C> Bootloader<'a, P, S, M, C>
where
    P: Platform,
    S: Storage,
    M: PhysicalMemory,
    C: HandshakeCell,
{
    #[must_use]
    pub const fn new(platform: P, storage: S, memory: M, link: &'a PeerLink<C>, config: BootConfig) -> Self {
        Self {
            platform,
            storage,
            memory,
            link,
            logger: None,
            config,
            diagnostics: false,
            stage: Stage::Init,
        }
    }

    /// Let `Init` pick the log level for `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: &'a ConsoleLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub const fn state(&self) -> BootState {
        self.stage.state()
    }

    /// Whether diagnostics were enabled during `Init`.
    #[must_use]
    pub const fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    /// Run one transition and return the state reached.
    ///
    /// `Launch` is terminal; stepping it again is a no-op.
    ///
    /// # Errors
    /// The failure of the transition. The machine is then
    /// [`Halted`](BootState::Halted) and every further step fails with
    /// [`BootError::Halted`].
    pub fn step(&mut self) -> Result<BootState, BootError> {
        let stage = mem::replace(&mut self.stage, Stage::Halted);
        self.stage = match stage {
            Stage::Halted => return Err(BootError::Halted),
            Stage::Launch(header) => Stage::Launch(header),
            stage => self.advance(stage)?,
        };
        Ok(self.state())
    }

    /// Step until `Launch`.
    ///
    /// # Errors
    /// The first failing transition.
    pub fn run_to_launch(mut self) -> Result<Handoff<'a, P, C>, BootError> {
        while self.step()? != BootState::Launch {}

        let Stage::Launch(header) = self.stage else {
            return Err(BootError::Halted);
        };
        Ok(Handoff {
            platform: self.platform,
            link: self.link,
            arm9_entry: header.arm9.entry,
            arm7_entry: header.arm7.entry,
        })
    }

    fn advance(&mut self, stage: Stage<S::File>) -> Result<Stage<S::File>, BootError> {
        Ok(match stage {
            Stage::Init => {
                self.init();
                Stage::HandshakeSync
            }
            Stage::HandshakeSync => {
                info!("ARM7 sync");
                // a previous image may have left a command behind
                self.link.commands.reset();
                self.link.sync.lead(self.config.sync_rounds);
                debug!("ARM7 sync OK");
                Stage::InstallBootstub
            }
            Stage::InstallBootstub => {
                self.install_bootstub()?;
                Stage::MountStorage
            }
            Stage::MountStorage => {
                self.memory
                    .copy(self.config.driver_stub, DRIVER_SNAPSHOT_ADDRESS, DRIVER_SNAPSHOT_SIZE)?;
                info!("Mounting FAT filesystem");
                self.storage.mount().map_err(BootError::Mount)?;
                Stage::OpenImage
            }
            Stage::OpenImage => {
                let file = self
                    .storage
                    .open(self.config.executable_path)
                    .map_err(|source| BootError::Open {
                        file: self.config.file_name(),
                        source,
                    })?;
                Stage::ReadHeader(file)
            }
            Stage::ReadHeader(mut file) => {
                let header = self.read_header(&mut file)?;
                Stage::LoadSecondary(file, header)
            }
            Stage::LoadSecondary(mut file, header) => {
                let pending = self.load_secondary(&mut file, &header)?;
                Stage::LoadPrimary(file, header, pending)
            }
            Stage::LoadPrimary(mut file, header, pending) => {
                self.load_primary(&mut file, &header, pending)?;
                Stage::Finalize(header)
            }
            Stage::Finalize(header) => {
                self.finalize()?;
                Stage::Launch(header)
            }
            Stage::Launch(header) => Stage::Launch(header),
            Stage::Halted => return Err(BootError::Halted),
        })
    }

    fn init(&mut self) {
        self.platform.set_vram_banks(VramLayout::LOADER);
        self.platform.set_power(PowCnt::LOADER);
        self.platform.set_external_memory(ExMemCnt::LOADER);
        self.platform.reset_display();

        self.diagnostics = self.config.diagnostics || self.platform.key_input().start_held();
        if let Some(logger) = self.logger {
            logger.set_level(if self.diagnostics {
                LevelFilter::Trace
            } else {
                LevelFilter::Error
            });
            if self.diagnostics {
                debug!("diagnostics enabled");
            }
        }
    }

    fn install_bootstub(&mut self) -> Result<(), BootError> {
        if self.config.trampoline.is_empty() {
            debug!("no bootstub trampoline, skipping install");
            return Ok(());
        }
        if bootstub::install(&mut self.memory, self.config.trampoline)? {
            info!("Bootstub installed");
        }
        Ok(())
    }

    fn read_header(&mut self, file: &mut S::File) -> Result<NdsHeader, BootError> {
        let span = Span::new(HEADER_ADDRESS, HEADER_SIZE);
        read_into(&mut self.storage, file, &mut self.memory, span, self.config.file_name())?;

        let mut raw = [0u8; HEADER_LEN];
        self.memory.read(HEADER_ADDRESS, &mut raw)?;
        let header = NdsHeader::parse(&raw)?;
        debug!(
            "loading {} ({})",
            header.title_str().unwrap_or("?"),
            core::str::from_utf8(&header.game_code).unwrap_or("????")
        );
        Ok(header)
    }

    /// Load the ARM7 region. Returns the copy still in flight when the region
    /// had to be staged.
    fn load_secondary(&mut self, file: &mut S::File, header: &NdsHeader) -> Result<Option<Pending>, BootError> {
        let region = header.region(Cpu::Arm7);
        let placement = validate_region(Cpu::Arm7, region).map_err(|source| BootError::Region {
            cpu: Cpu::Arm7,
            source,
        })?;
        self.seek(file, region.file_offset)?;

        info!("Loading ARM7 binary");
        read_into(
            &mut self.storage,
            file,
            &mut self.memory,
            placement.read_span(),
            self.config.file_name(),
        )?;

        if !placement.is_staged() {
            return Ok(None);
        }
        debug!("staged ARM7 binary, handing over to {}", placement.window.name);
        let pending = self.link.commands.post(Command::Copy {
            src: placement.read_address,
            dst: placement.load_address,
            len: placement.size,
        })?;
        Ok(Some(pending))
    }

    fn load_primary(
        &mut self,
        file: &mut S::File,
        header: &NdsHeader,
        pending: Option<Pending>,
    ) -> Result<(), BootError> {
        let region = header.region(Cpu::Arm9);
        let placement = validate_region(Cpu::Arm9, region).map_err(|source| BootError::Region {
            cpu: Cpu::Arm9,
            source,
        })?;
        self.seek(file, region.file_offset)?;

        // The staging area may be under the ARM9 region.
        if let Some(pending) = pending {
            pending.wait(&self.link.commands);
        }

        info!("Loading ARM9 binary");
        let image = placement.read_span();
        read_into(&mut self.storage, file, &mut self.memory, image, self.config.file_name())?;

        let snapshot = Span::new(DRIVER_SNAPSHOT_ADDRESS, DRIVER_SNAPSHOT_SIZE);
        let outcome = self
            .memory
            .with_regions(image, snapshot, |image, driver| {
                boot_dldi::patch(image, placement.load_address, driver)
            })?
            .map_err(BootError::Patch)?;
        match outcome {
            PatchOutcome::NotPresent => debug!("no DLDI driver in ARM9 binary"),
            PatchOutcome::Patched {
                offset,
                relocated_to,
            } => info!("DLDI patched at +{offset:#x}, relocated to {relocated_to:#010x}"),
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), BootError> {
        self.write_arguments()?;

        if self.diagnostics {
            info!("Release START to launch");
            while self.platform.key_input().start_held() {
                spin_loop();
            }
        }

        self.platform.reset_display();
        self.platform.set_external_memory(ExMemCnt::HANDOFF);
        info!("Launching");
        Ok(())
    }

    /// Pass the executable path as the sole argument.
    fn write_arguments(&mut self) -> Result<(), BootError> {
        let path = self.config.executable_path.as_bytes();
        let len = u32::try_from(path.len())
            .ok()
            .filter(|&len| len < CMDLINE_CAPACITY)
            .ok_or(BootError::CommandLine { len: path.len() })?;

        self.memory.write(CMDLINE_ADDRESS, path)?;
        self.memory.write(CMDLINE_ADDRESS + len, &[0])?;

        let record = ArgvRecord::for_cmdline(len).to_bytes();
        self.memory.write(ARGV_ADDRESS + 4, &record[4..])?;
        self.memory.write(ARGV_ADDRESS, &record[..4])?;
        Ok(())
    }

    fn seek(&mut self, file: &mut S::File, offset: u32) -> Result<(), BootError> {
        self.storage.seek(file, offset).map_err(|source| BootError::Read {
            file: self.config.file_name(),
            source,
        })
    }
}

/// A fully loaded system, ready to be started.
#[must_use = "nothing runs until the handoff is launched"]
pub struct Handoff<'a, P, C> {
    platform: P,
    link: &'a PeerLink<C>,
    pub arm9_entry: u32,
    pub arm7_entry: u32,
}

impl<P: Platform, C: HandshakeCell> Handoff<'_, P, C> {
    /// Tell the peer to jump to its entry point and wait until it has taken
    /// the command.
    ///
    /// The phase word is zeroed afterwards, so a later return to the loader
    /// through the bootstub starts bring-up from a clean block.
    ///
    /// # Errors
    /// [`BootError::Handshake`] if a command is still outstanding.
    pub fn start_peer(&self) -> Result<(), BootError> {
        self.link.commands.send(Command::Reset)?;
        self.link.sync.reset();
        Ok(())
    }

    /// Start both processors. Does not return.
    pub fn launch(mut self) -> ! {
        if let Err(e) = self.start_peer() {
            halt(&e);
        }
        self.platform.soft_reset()
    }
}
