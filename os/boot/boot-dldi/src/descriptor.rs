//! # Driver Descriptor
//!
//! The fixed 128-byte header at the start of every DLDI driver module.
//!
//! ```text
//! 0x00  magic number            u32
//! 0x04  magic string            " Chishm\0"
//! 0x0C  version                 u8
//! 0x0D  driver size (log2)      u8
//! 0x0E  fix flags               u8
//! 0x0F  allocated space (log2)  u8
//! 0x10  friendly name           [u8; 48]
//! 0x40  driver start / end      u32, u32
//! 0x48  interwork start / end   u32, u32
//! 0x50  GOT start / end         u32, u32
//! 0x58  BSS start / end         u32, u32
//! 0x60  io type (FourCC)        u32
//! 0x64  features                u32
//! 0x68  startup .. shutdown     6 × u32
//! ```

use crate::{DldiError, read_u32_le, write_u32_le};
use bitflags::bitflags;

/// Encoded size of a [`DriverDescriptor`].
pub const DESCRIPTOR_LEN: usize = 0x80;

/// Offset of the allocated-space byte.
pub(crate) const ALLOCATED_LOG2_OFFSET: usize = 0x0F;

const SIGNATURE_STRING: usize = 0x04;
const VERSION: usize = 0x0C;
const DRIVER_LOG2: usize = 0x0D;
const FIX_FLAGS: usize = 0x0E;
const NAME: usize = 0x10;
const SECTIONS: usize = 0x40;
const IO_TYPE: usize = 0x60;
const FEATURES: usize = 0x64;
const ENTRY_POINTS: usize = 0x68;

bitflags! {
    /// Which parts of the driver need fixing after a move.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct FixFlags: u8 {
        /// Rewrite in-range words across the whole driver section.
        const ALL = 0x01;
        /// Rewrite in-range words in the interworking glue.
        const GLUE = 0x02;
        /// Rewrite in-range words in the global offset table.
        const GOT = 0x04;
        /// Zero the uninitialised data section.
        const BSS = 0x08;

        const _ = !0;
    }
}

bitflags! {
    /// Device capabilities advertised by the driver.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct Features: u32 {
        const CAN_READ = 0x01;
        const CAN_WRITE = 0x02;
        const SLOT_GBA = 0x10;
        const SLOT_NDS = 0x20;

        const _ = !0;
    }
}

/// Half-open address range `[start, end)` of one driver section.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Section {
    pub start: u32,
    pub end: u32,
}

impl Section {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    const fn shifted(self, offset: u32) -> Self {
        Self {
            start: self.start.wrapping_add(offset),
            end: self.end.wrapping_add(offset),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Sections {
    /// Code and data of the whole driver.
    pub driver: Section,
    pub interwork: Section,
    pub got: Section,
    pub bss: Section,
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct EntryPoints {
    pub startup: u32,
    pub is_inserted: u32,
    pub read_sectors: u32,
    pub write_sectors: u32,
    pub clear_status: u32,
    pub shutdown: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DriverDescriptor {
    pub magic: u32,
    pub signature: [u8; 8],
    pub version: u8,
    pub driver_log2: u8,
    pub fix_flags: FixFlags,
    pub allocated_log2: u8,
    pub name: [u8; 48],
    pub sections: Sections,
    pub io_type: u32,
    pub features: Features,
    pub entry_points: EntryPoints,
}

impl DriverDescriptor {
    /// Decode the descriptor at the start of `bytes`.
    ///
    /// Only the length is checked. The signature is the locator's business
    /// and a driver parked by the loader may not carry its magic number.
    ///
    /// # Errors
    /// [`DldiError::Truncated`] if fewer than [`DESCRIPTOR_LEN`] bytes are given.
    pub fn parse(bytes: &[u8]) -> Result<Self, DldiError> {
        if bytes.len() < DESCRIPTOR_LEN {
            return Err(DldiError::Truncated { len: bytes.len() });
        }
        let word = |at: usize| read_u32_le(bytes, at);

        let mut signature = [0u8; 8];
        signature.copy_from_slice(&bytes[SIGNATURE_STRING..SIGNATURE_STRING + 8]);
        let mut name = [0u8; 48];
        name.copy_from_slice(&bytes[NAME..NAME + 48]);

        let section = |at: usize| Section::new(word(at), word(at + 4));

        Ok(Self {
            magic: word(0),
            signature,
            version: bytes[VERSION],
            driver_log2: bytes[DRIVER_LOG2],
            fix_flags: FixFlags::from_bits_retain(bytes[FIX_FLAGS]),
            allocated_log2: bytes[ALLOCATED_LOG2_OFFSET],
            name,
            sections: Sections {
                driver: section(SECTIONS),
                interwork: section(SECTIONS + 8),
                got: section(SECTIONS + 16),
                bss: section(SECTIONS + 24),
            },
            io_type: word(IO_TYPE),
            features: Features::from_bits_retain(word(FEATURES)),
            entry_points: EntryPoints {
                startup: word(ENTRY_POINTS),
                is_inserted: word(ENTRY_POINTS + 4),
                read_sectors: word(ENTRY_POINTS + 8),
                write_sectors: word(ENTRY_POINTS + 12),
                clear_status: word(ENTRY_POINTS + 16),
                shutdown: word(ENTRY_POINTS + 20),
            },
        })
    }

    /// Encode into the first [`DESCRIPTOR_LEN`] bytes of `out`.
    ///
    /// # Errors
    /// [`DldiError::Truncated`] if `out` is too small.
    pub fn write_to(&self, out: &mut [u8]) -> Result<(), DldiError> {
        if out.len() < DESCRIPTOR_LEN {
            return Err(DldiError::Truncated { len: out.len() });
        }
        write_u32_le(out, 0, self.magic);
        out[SIGNATURE_STRING..SIGNATURE_STRING + 8].copy_from_slice(&self.signature);
        out[VERSION] = self.version;
        out[DRIVER_LOG2] = self.driver_log2;
        out[FIX_FLAGS] = self.fix_flags.bits();
        out[ALLOCATED_LOG2_OFFSET] = self.allocated_log2;
        out[NAME..NAME + 48].copy_from_slice(&self.name);

        let s = &self.sections;
        for (i, section) in [s.driver, s.interwork, s.got, s.bss].into_iter().enumerate() {
            write_u32_le(out, SECTIONS + i * 8, section.start);
            write_u32_le(out, SECTIONS + i * 8 + 4, section.end);
        }

        write_u32_le(out, IO_TYPE, self.io_type);
        write_u32_le(out, FEATURES, self.features.bits());

        let e = &self.entry_points;
        let entries = [
            e.startup,
            e.is_inserted,
            e.read_sectors,
            e.write_sectors,
            e.clear_status,
            e.shutdown,
        ];
        for (i, entry) in entries.into_iter().enumerate() {
            write_u32_le(out, ENTRY_POINTS + i * 4, entry);
        }
        Ok(())
    }

    /// Move every section bound and entry point by `offset`.
    ///
    /// Each field is shifted from its own value only, so the order of the
    /// updates cannot feed a shifted value into another field.
    pub const fn shift(&mut self, offset: u32) {
        self.sections.driver = self.sections.driver.shifted(offset);
        self.sections.interwork = self.sections.interwork.shifted(offset);
        self.sections.got = self.sections.got.shifted(offset);
        self.sections.bss = self.sections.bss.shifted(offset);

        let e = &mut self.entry_points;
        e.startup = e.startup.wrapping_add(offset);
        e.is_inserted = e.is_inserted.wrapping_add(offset);
        e.read_sectors = e.read_sectors.wrapping_add(offset);
        e.write_sectors = e.write_sectors.wrapping_add(offset);
        e.clear_status = e.clear_status.wrapping_add(offset);
        e.shutdown = e.shutdown.wrapping_add(offset);
    }

    /// Bytes reserved for the driver in the image that carries it.
    ///
    /// Saturates for nonsensical exponents.
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        1u64.checked_shl(u32::from(self.allocated_log2))
            .unwrap_or(u64::MAX)
    }

    /// Friendly name up to the first NUL; `None` if not UTF-8.
    #[must_use]
    pub fn name_str(&self) -> Option<&str> {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(48);
        core::str::from_utf8(&self.name[..len]).ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> DriverDescriptor {
        let mut name = [0u8; 48];
        name[..9].copy_from_slice(b"R4 (DSTT)");
        DriverDescriptor {
            magic: 0xBF8D_A5ED,
            signature: *b" Chishm\0",
            version: 1,
            driver_log2: 12,
            fix_flags: FixFlags::ALL | FixFlags::BSS,
            allocated_log2: 14,
            name,
            sections: Sections {
                driver: Section::new(0xBF80_0000, 0xBF80_0F00),
                interwork: Section::new(0xBF80_0E00, 0xBF80_0E10),
                got: Section::new(0xBF80_0E10, 0xBF80_0E40),
                bss: Section::new(0xBF80_0F00, 0xBF80_1000),
            },
            io_type: u32::from_le_bytes(*b"DSTT"),
            features: Features::CAN_READ | Features::SLOT_NDS,
            entry_points: EntryPoints {
                startup: 0xBF80_0100,
                is_inserted: 0xBF80_0200,
                read_sectors: 0xBF80_0300,
                write_sectors: 0xBF80_0400,
                clear_status: 0xBF80_0500,
                shutdown: 0xBF80_0600,
            },
        }
    }

    #[test]
    fn fields_land_at_fixed_offsets() {
        let mut raw = [0u8; DESCRIPTOR_LEN];
        sample().write_to(&mut raw).unwrap();

        assert_eq!(&raw[0..4], &[0xED, 0xA5, 0x8D, 0xBF]);
        assert_eq!(&raw[4..12], b" Chishm\0");
        assert_eq!(raw[0x0E], 0x09);
        assert_eq!(raw[0x0F], 14);
        assert_eq!(&raw[0x40..0x44], &0xBF80_0000u32.to_le_bytes());
        assert_eq!(&raw[0x60..0x64], b"DSTT");
        assert_eq!(&raw[0x7C..0x80], &0xBF80_0600u32.to_le_bytes());

        let back = DriverDescriptor::parse(&raw).unwrap();
        assert_eq!(back, sample());
        assert_eq!(back.name_str(), Some("R4 (DSTT)"));
    }

    #[test]
    fn shift_moves_bounds_and_entries_only() {
        let mut d = sample();
        d.shift(0x4280_0000);
        assert_eq!(d.sections.driver, Section::new(0x0200_0000, 0x0200_0F00));
        assert_eq!(d.sections.bss.end, 0x0200_1000);
        assert_eq!(d.entry_points.shutdown, 0x0200_0600);
        assert_eq!(d.io_type, sample().io_type);
        assert_eq!(d.allocated_log2, 14);
    }

    #[test]
    fn unknown_flag_bits_survive() {
        let mut raw = [0u8; DESCRIPTOR_LEN];
        raw[0x0E] = 0x81;
        let d = DriverDescriptor::parse(&raw).unwrap();
        assert!(d.fix_flags.contains(FixFlags::ALL));
        let mut out = [0u8; DESCRIPTOR_LEN];
        d.write_to(&mut out).unwrap();
        assert_eq!(out[0x0E], 0x81);
    }

    #[test]
    fn truncated_descriptor_is_rejected() {
        assert_eq!(
            DriverDescriptor::parse(&[0u8; 64]),
            Err(DldiError::Truncated { len: 64 })
        );
    }
}
