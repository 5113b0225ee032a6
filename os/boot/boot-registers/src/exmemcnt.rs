use crate::mmio_register;
use bitfield_struct::bitfield;

/// `EXMEMCNT` (`0x0400_0204`): external memory and slot ownership.
#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct ExMemCnt {
    /// Bits 0–1: GBA slot SRAM access time.
    #[bits(2)]
    pub sram_wait: u8,

    /// Bits 2–3: GBA slot ROM first access time.
    #[bits(2)]
    pub rom_first_wait: u8,

    /// Bit 4: GBA slot ROM second access time.
    pub rom_second_wait: bool,

    /// Bits 5–6: PHI pin output.
    #[bits(2)]
    pub phi_output: u8,

    /// Bit 7: GBA slot owned by the ARM7.
    pub gba_slot_arm7: bool,

    #[bits(3)]
    __: u8,

    /// Bit 11: NDS slot owned by the ARM7.
    pub nds_slot_arm7: bool,

    #[bits(1)]
    __: u8,

    /// Bit 13: reads as set.
    pub always_set: bool,

    /// Bit 14: main memory in synchronous mode.
    pub sync_main_memory: bool,

    /// Bit 15: ARM7 has main memory priority.
    pub arm7_memory_priority: bool,
}

impl ExMemCnt {
    /// While loading: ARM9 owns both slots and has memory priority.
    pub const LOADER: Self = Self::new()
        .with_always_set(true)
        .with_sync_main_memory(true);

    /// Handed to the launched image: both slots and priority go to the ARM7,
    /// as the firmware leaves it.
    pub const HANDOFF: Self = Self::LOADER
        .with_gba_slot_arm7(true)
        .with_nds_slot_arm7(true)
        .with_arm7_memory_priority(true);
}

mmio_register!(ExMemCnt, u16, 0x0400_0204);
