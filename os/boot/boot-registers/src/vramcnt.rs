//! # VRAM and shared WRAM bank control
//!
//! `VRAMCNT_A` through `VRAMCNT_I` and `WRAMCNT` are consecutive byte
//! registers starting at `0x0400_0240`, with `WRAMCNT` wedged between banks
//! G and H.

use bitfield_struct::bitfield;

/// Base address of `VRAMCNT_A`.
pub const VRAMCNT_BASE: usize = 0x0400_0240;

/// One `VRAMCNT_x` byte.
#[bitfield(u8)]
#[derive(Eq, PartialEq)]
pub struct VramBank {
    /// Bits 0–2: master select (what the bank is mapped as).
    #[bits(3)]
    pub mst: u8,

    /// Bits 3–4: offset within the selected mapping.
    #[bits(2)]
    pub offset: u8,

    #[bits(2)]
    __: u8,

    /// Bit 7: bank enabled.
    pub enable: bool,
}

impl VramBank {
    /// Enabled bank with the given master select and offset.
    #[must_use]
    pub const fn mapped(mst: u8, offset: u8) -> Self {
        Self::new().with_mst(mst).with_offset(offset).with_enable(true)
    }
}

/// `WRAMCNT`: how the two 16 KiB shared WRAM blocks are split.
#[bitfield(u8)]
#[derive(Eq, PartialEq)]
pub struct WramCnt {
    /// Bits 0–1: `0` all ARM9, `3` all ARM7.
    #[bits(2)]
    pub mode: u8,

    #[bits(6)]
    __: u8,
}

/// A full assignment of every VRAM bank plus shared WRAM.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VramLayout {
    pub a: VramBank,
    pub b: VramBank,
    pub c: VramBank,
    pub d: VramBank,
    pub e: VramBank,
    pub f: VramBank,
    pub g: VramBank,
    pub wram: WramCnt,
    pub h: VramBank,
    pub i: VramBank,
}

impl VramLayout {
    /// Layout used while loading.
    ///
    /// Bank A backs the main background. Bank B stays in LCDC mode at
    /// `0x0682_0000` where the driver snapshot is parked. Banks C and D are
    /// given to the ARM7, as is shared WRAM.
    pub const LOADER: Self = Self {
        a: VramBank::mapped(1, 0),
        b: VramBank::mapped(0, 0),
        c: VramBank::mapped(2, 0),
        d: VramBank::mapped(2, 1),
        e: VramBank::mapped(0, 0),
        f: VramBank::mapped(0, 0),
        g: VramBank::mapped(0, 0),
        wram: WramCnt::new().with_mode(3),
        h: VramBank::mapped(0, 0),
        i: VramBank::mapped(0, 0),
    };

    /// Register bytes in address order, starting at [`VRAMCNT_BASE`].
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 10] {
        [
            self.a.into_bits(),
            self.b.into_bits(),
            self.c.into_bits(),
            self.d.into_bits(),
            self.e.into_bits(),
            self.f.into_bits(),
            self.g.into_bits(),
            self.wram.into_bits(),
            self.h.into_bits(),
            self.i.into_bits(),
        ]
    }

    /// Write every bank register.
    ///
    /// # Safety
    /// The caller must be running on the ARM9 and nothing may be using the
    /// banks being remapped.
    #[cfg(feature = "mmio")]
    pub unsafe fn store(&self) {
        for (i, byte) in self.to_bytes().into_iter().enumerate() {
            unsafe { core::ptr::write_volatile((VRAMCNT_BASE + i) as *mut u8, byte) };
        }
    }
}
