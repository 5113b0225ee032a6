use crate::mmio_register;
use bitfield_struct::bitfield;

/// `KEYINPUT` (`0x0400_0130`), read-only.
///
/// Every bit is **active-low**: `0` means the button is held.
#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct KeyInput {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub r: bool,
    pub l: bool,

    #[bits(6)]
    __: u8,
}

impl KeyInput {
    /// Register value with no button held.
    pub const RELEASED: Self = Self::from_bits(0x03FF);

    /// Whether START is currently held down.
    #[inline]
    #[must_use]
    pub const fn start_held(&self) -> bool {
        !self.start()
    }
}

mmio_register!(KeyInput, u16, 0x0400_0130);
