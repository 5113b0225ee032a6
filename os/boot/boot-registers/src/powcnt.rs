use crate::mmio_register;
use bitfield_struct::bitfield;

/// `POWCNT1` (`0x0400_0304`): ARM9-side power control.
#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct PowCnt {
    /// Bit 0: both LCDs on.
    pub lcd: bool,
    /// Bit 1: 2D engine A.
    pub engine_2d_main: bool,
    /// Bit 2: 3D rendering engine.
    pub engine_3d: bool,
    /// Bit 3: 3D geometry engine.
    pub geometry_3d: bool,

    #[bits(5)]
    __: u8,

    /// Bit 9: 2D engine B.
    pub engine_2d_sub: bool,

    #[bits(5)]
    __: u8,

    /// Bit 15: engine A drives the top screen.
    pub display_swap: bool,
}

impl PowCnt {
    /// LCD and the main 2D engine on, main engine on the top screen.
    pub const LOADER: Self = Self::new()
        .with_lcd(true)
        .with_engine_2d_main(true)
        .with_display_swap(true);
}

mmio_register!(PowCnt, u16, 0x0400_0304);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loader_value_matches_raw_bits() {
        assert_eq!(PowCnt::LOADER.into_bits(), 0x8003);
    }
}
