//! # Storage collaborator
//!
//! The FAT driver is not part of the loader. It is reached through
//! [`Storage`], and its result codes are narrowed to [`FsError`].

/// Failure reported by the filesystem.
///
/// `Display` is the explanation shown below the failing step.
#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum FsError {
    #[error("Drive I/O error.")]
    DiskError,
    #[error("Internal FatFs error.")]
    InternalError,
    #[error("Drive not ready.")]
    NotReady,
    #[error("File not found.")]
    NotFound,
    #[error("FAT filesystem not found.\nIs the memory card formatted\ncorrectly?")]
    NoFilesystem,
    #[error("FatFs error {0}.")]
    Other(i32),
}

impl FsError {
    /// Map a FatFs `FRESULT`.
    ///
    /// # Errors
    /// Every nonzero code.
    pub const fn check(code: i32) -> Result<(), Self> {
        Err(match code {
            0 => return Ok(()),
            1 => Self::DiskError,
            2 | 19 => Self::InternalError,
            3 => Self::NotReady,
            4 | 5 => Self::NotFound,
            13 => Self::NoFilesystem,
            other => Self::Other(other),
        })
    }
}

/// A mounted-on-demand FAT volume.
pub trait Storage {
    type File;

    /// Mount the default volume.
    ///
    /// # Errors
    /// As reported by the filesystem.
    fn mount(&mut self) -> Result<(), FsError>;

    /// Open `path` for reading.
    ///
    /// # Errors
    /// As reported by the filesystem.
    fn open(&mut self, path: &str) -> Result<Self::File, FsError>;

    /// Move the read position to `offset` bytes from the start.
    ///
    /// # Errors
    /// As reported by the filesystem.
    fn seek(&mut self, file: &mut Self::File, offset: u32) -> Result<(), FsError>;

    /// Read up to `buf.len()` bytes; returns the number read.
    ///
    /// # Errors
    /// As reported by the filesystem.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fatfs_codes_map_to_messages() {
        assert_eq!(FsError::check(0), Ok(()));
        assert_eq!(FsError::check(5), Err(FsError::NotFound));
        assert_eq!(FsError::check(19), Err(FsError::InternalError));
        assert_eq!(FsError::check(13), Err(FsError::NoFilesystem));
        assert_eq!(FsError::check(7).unwrap_err().to_string(), "FatFs error 7.");
    }
}
