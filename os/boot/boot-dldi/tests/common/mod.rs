#![allow(dead_code)]

use boot_dldi::{DESCRIPTOR_LEN, DriverDescriptor, EntryPoints, Features, FixFlags, Section, Sections};

/// Address drivers are linked for.
pub const LINKED_AT: u32 = 0xBF80_0000;

/// Driver section length used by [`descriptor`].
pub const DRIVER_END: u32 = 0x800;
pub const INTERWORK: u32 = 0x700;
pub const GOT: u32 = 0x720;
pub const GOT_END: u32 = 0x760;
pub const BSS_END: u32 = 0x900;

/// A descriptor linked at `start` with a fixed section layout relative to it.
pub fn descriptor(start: u32, driver_log2: u8, allocated_log2: u8, fix_flags: FixFlags) -> DriverDescriptor {
    let mut name = [0u8; 48];
    name[..4].copy_from_slice(b"TEST");
    DriverDescriptor {
        magic: 0xBF8D_A5ED,
        signature: *b" Chishm\0",
        version: 1,
        driver_log2,
        fix_flags,
        allocated_log2,
        name,
        sections: Sections {
            driver: Section::new(start, start + DRIVER_END),
            interwork: Section::new(start + INTERWORK, start + GOT),
            got: Section::new(start + GOT, start + GOT_END),
            bss: Section::new(start + DRIVER_END, start + BSS_END),
        },
        io_type: u32::from_le_bytes(*b"TEST"),
        features: Features::CAN_READ | Features::CAN_WRITE,
        entry_points: EntryPoints {
            startup: start + 0x100,
            is_inserted: start + 0x180,
            read_sectors: start + 0x200,
            write_sectors: start + 0x280,
            clear_status: start + 0x300,
            shutdown: start + 0x380,
        },
    }
}

/// Encode `descriptor` into a zeroed buffer of `len` bytes and place `words`
/// at the given byte offsets.
pub fn build(descriptor: &DriverDescriptor, len: usize, words: &[(u32, u32)]) -> Vec<u8> {
    assert!(len >= DESCRIPTOR_LEN);
    let mut bytes = vec![0u8; len];
    descriptor.write_to(&mut bytes).unwrap();
    for &(at, value) in words {
        put(&mut bytes, at as usize, value);
    }
    bytes
}

pub fn put(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn word(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}
