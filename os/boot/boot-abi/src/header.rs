//! # Target Executable Header

use crate::memory::{Cpu, HEADER_SIZE};
use crate::{read_u32_le, write_u32_le};

/// Number of header bytes the loader reads and parks.
pub const HEADER_LEN: usize = HEADER_SIZE as usize;

const TITLE: usize = 0x00;
const GAME_CODE: usize = 0x0C;
const MAKER_CODE: usize = 0x10;
const UNIT_CODE: usize = 0x12;
const ARM9_REGION: usize = 0x20;
const ARM7_REGION: usize = 0x30;
const BANNER_OFFSET: usize = 0x68;

/// Byte offset of the ARM7 entry address within the header.
pub const ARM7_ENTRY_OFFSET: usize = ARM7_REGION + 4;

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum HeaderError {
    #[error("header is truncated ({len} of {} bytes)", HEADER_LEN)]
    TooShort { len: usize },
}

/// One processor's load region as declared by the header.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct RegionHeader {
    /// Offset of the region's bytes within the image file.
    pub file_offset: u32,
    /// Absolute entry address.
    pub entry: u32,
    /// Absolute load address.
    pub load_address: u32,
    /// Size in bytes.
    pub size: u32,
}

impl RegionHeader {
    /// Exclusive end address, computed without wrapping.
    #[inline]
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.load_address) + u64::from(self.size)
    }

    fn parse(bytes: &[u8], at: usize) -> Option<Self> {
        Some(Self {
            file_offset: read_u32_le(bytes, at)?,
            entry: read_u32_le(bytes, at + 4)?,
            load_address: read_u32_le(bytes, at + 8)?,
            size: read_u32_le(bytes, at + 12)?,
        })
    }

    fn write(&self, out: &mut [u8], at: usize) {
        write_u32_le(out, at, self.file_offset);
        write_u32_le(out, at + 4, self.entry);
        write_u32_le(out, at + 8, self.load_address);
        write_u32_le(out, at + 12, self.size);
    }
}

/// The fields of the target header this loader cares about.
///
/// Identity fields are carried for diagnostics only.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct NdsHeader {
    pub title: [u8; 12],
    pub game_code: [u8; 4],
    pub maker_code: [u8; 2],
    pub unit_code: u8,
    pub arm9: RegionHeader,
    pub arm7: RegionHeader,
    pub banner_offset: u32,
}

impl NdsHeader {
    /// Parse the first [`HEADER_LEN`] bytes of an image.
    ///
    /// # Errors
    /// [`HeaderError::TooShort`] if fewer than [`HEADER_LEN`] bytes are given.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        let too_short = HeaderError::TooShort { len: bytes.len() };
        if bytes.len() < HEADER_LEN {
            return Err(too_short);
        }

        let mut title = [0u8; 12];
        title.copy_from_slice(&bytes[TITLE..TITLE + 12]);
        let mut game_code = [0u8; 4];
        game_code.copy_from_slice(&bytes[GAME_CODE..GAME_CODE + 4]);
        let mut maker_code = [0u8; 2];
        maker_code.copy_from_slice(&bytes[MAKER_CODE..MAKER_CODE + 2]);

        Ok(Self {
            title,
            game_code,
            maker_code,
            unit_code: bytes[UNIT_CODE],
            arm9: RegionHeader::parse(bytes, ARM9_REGION).ok_or(too_short)?,
            arm7: RegionHeader::parse(bytes, ARM7_REGION).ok_or(too_short)?,
            banner_offset: read_u32_le(bytes, BANNER_OFFSET).ok_or(too_short)?,
        })
    }

    /// Encode into `out`, leaving bytes this type does not model untouched.
    ///
    /// # Errors
    /// [`HeaderError::TooShort`] if `out` is smaller than [`HEADER_LEN`].
    pub fn write_to(&self, out: &mut [u8]) -> Result<(), HeaderError> {
        if out.len() < HEADER_LEN {
            return Err(HeaderError::TooShort { len: out.len() });
        }
        out[TITLE..TITLE + 12].copy_from_slice(&self.title);
        out[GAME_CODE..GAME_CODE + 4].copy_from_slice(&self.game_code);
        out[MAKER_CODE..MAKER_CODE + 2].copy_from_slice(&self.maker_code);
        out[UNIT_CODE] = self.unit_code;
        self.arm9.write(out, ARM9_REGION);
        self.arm7.write(out, ARM7_REGION);
        write_u32_le(out, BANNER_OFFSET, self.banner_offset);
        Ok(())
    }

    /// The region declared for `cpu`.
    #[must_use]
    pub const fn region(&self, cpu: Cpu) -> &RegionHeader {
        match cpu {
            Cpu::Arm9 => &self.arm9,
            Cpu::Arm7 => &self.arm7,
        }
    }

    /// Title as text, up to the first NUL; `None` if not UTF-8.
    #[must_use]
    pub fn title_str(&self) -> Option<&str> {
        let len = self.title.iter().position(|&b| b == 0).unwrap_or(12);
        core::str::from_utf8(&self.title[..len]).ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_region_tuples_at_fixed_offsets() {
        let mut raw = [0u8; HEADER_LEN];
        raw[..8].copy_from_slice(b"MINIBOOT");
        raw[0x20..0x24].copy_from_slice(&0x4000u32.to_le_bytes());
        raw[0x24..0x28].copy_from_slice(&0x0200_0100u32.to_le_bytes());
        raw[0x28..0x2C].copy_from_slice(&0x0200_0000u32.to_le_bytes());
        raw[0x2C..0x30].copy_from_slice(&0x8_0000u32.to_le_bytes());
        raw[0x3C..0x40].copy_from_slice(&0x4000u32.to_le_bytes());

        let h = NdsHeader::parse(&raw).unwrap();
        assert_eq!(h.title_str(), Some("MINIBOOT"));
        assert_eq!(h.arm9.file_offset, 0x4000);
        assert_eq!(h.arm9.entry, 0x0200_0100);
        assert_eq!(h.arm9.load_address, 0x0200_0000);
        assert_eq!(h.arm9.size, 0x8_0000);
        assert_eq!(h.region(Cpu::Arm7).size, 0x4000);
    }

    #[test]
    fn rejects_truncated_header() {
        let raw = [0u8; 0x40];
        assert_eq!(
            NdsHeader::parse(&raw),
            Err(HeaderError::TooShort { len: 0x40 })
        );
    }

    #[test]
    fn write_to_preserves_unmodelled_bytes() {
        let mut raw = [0xEEu8; HEADER_LEN];
        let h = NdsHeader {
            arm7: RegionHeader {
                file_offset: 1,
                entry: 2,
                load_address: 3,
                size: 4,
            },
            ..NdsHeader::default()
        };
        h.write_to(&mut raw).unwrap();
        assert_eq!(raw[0x14], 0xEE);
        assert_eq!(&raw[ARM7_ENTRY_OFFSET..ARM7_ENTRY_OFFSET + 4], &2u32.to_le_bytes());
        assert_eq!(NdsHeader::parse(&raw).unwrap().arm7, h.arm7);
    }
}
