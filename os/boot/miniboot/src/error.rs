use crate::bootstub::BootstubError;
use crate::image::RegionError;
use crate::memory::MemoryError;
use crate::storage::FsError;
use boot_abi::Cpu;
use boot_abi::header::HeaderError;
use boot_dldi::DldiError;
use boot_sync::HandshakeError;
use core::fmt;

/// Every way a boot can fail.
///
/// `Display` is the one-line diagnostic shown to the user; [`detail`]
/// supplies the optional second line.
///
/// [`detail`]: BootError::detail
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("Could not mount FAT filesystem.")]
    Mount(#[source] FsError),
    #[error("Could not find {file}.")]
    Open {
        file: &'static str,
        #[source]
        source: FsError,
    },
    #[error("Could not read {file}.")]
    Read {
        file: &'static str,
        #[source]
        source: FsError,
    },
    #[error("Could not read {file}.")]
    ShortRead {
        file: &'static str,
        expected: u32,
        got: usize,
    },
    #[error("Invalid {cpu} binary location.")]
    Region {
        cpu: Cpu,
        #[source]
        source: RegionError,
    },
    #[error("Failed to apply DLDI patch.")]
    Patch(#[source] DldiError),
    #[error("Could not read the executable header.")]
    Header(#[from] HeaderError),
    #[error("Lost contact with the ARM7.")]
    Handshake(#[from] HandshakeError),
    #[error("Memory access failed.")]
    Memory(#[from] MemoryError),
    #[error("Could not install the bootstub.")]
    Bootstub(#[from] BootstubError),
    #[error("Command line is too long.")]
    CommandLine { len: usize },
    #[error("Boot was already halted.")]
    Halted,
}

impl BootError {
    /// The explanation printed below the diagnostic, if there is one.
    #[must_use]
    pub fn detail(&self) -> Option<&dyn fmt::Display> {
        match self {
            Self::Mount(e) | Self::Open { source: e, .. } | Self::Read { source: e, .. } => Some(e),
            Self::ShortRead { .. } => Some(&"Unexpected end of file."),
            Self::Patch(e) => Some(e),
            Self::Header(e) => Some(e),
            Self::Handshake(e) => Some(e),
            Self::Memory(e) => Some(e),
            Self::Bootstub(e) => Some(e),
            Self::Region { .. } | Self::CommandLine { .. } | Self::Halted => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(err: &BootError) -> (String, Option<String>) {
        (err.to_string(), err.detail().map(ToString::to_string))
    }

    #[test]
    fn filesystem_failures_carry_the_fatfs_explanation() {
        let err = BootError::Mount(FsError::NoFilesystem);
        assert_eq!(
            lines(&err),
            (
                "Could not mount FAT filesystem.".into(),
                Some("FAT filesystem not found.\nIs the memory card formatted\ncorrectly?".into())
            )
        );

        let err = BootError::Open {
            file: "BOOT.NDS",
            source: FsError::NotFound,
        };
        assert_eq!(
            lines(&err),
            ("Could not find BOOT.NDS.".into(), Some("File not found.".into()))
        );
    }

    #[test]
    fn region_failure_names_the_processor_only() {
        let err = BootError::Region {
            cpu: Cpu::Arm7,
            source: RegionError::Empty,
        };
        assert_eq!(lines(&err), ("Invalid ARM7 binary location.".into(), None));
    }

    #[test]
    fn short_read_and_patch_details() {
        let err = BootError::ShortRead {
            file: "BOOT.NDS",
            expected: 0x100,
            got: 0x80,
        };
        assert_eq!(
            lines(&err),
            ("Could not read BOOT.NDS.".into(), Some("Unexpected end of file.".into()))
        );

        let err = BootError::Patch(DldiError::NotEnoughSpace {
            required: 14,
            available: 13,
        });
        assert_eq!(
            lines(&err),
            ("Failed to apply DLDI patch.".into(), Some("Not enough space.".into()))
        );
    }
}
