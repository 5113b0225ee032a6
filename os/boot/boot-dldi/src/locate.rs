use crate::read_u32_le;
use core::hint::black_box;

/// Mixed into every comparison so the raw signature never appears in the
/// loader's own image, where other patchers would find and rewrite it.
const KEY: u32 = 0xAA55_AA55;

/// Byte-swapped signature words, pre-mixed with [`KEY`].
const SIGNATURE: [u32; 3] = [
    0xEDA5_8DBF_u32.swap_bytes() ^ KEY,
    0x2043_6869_u32.swap_bytes() ^ KEY,
    0x7368_6D00_u32.swap_bytes() ^ KEY,
];

/// Number of bytes a match needs.
pub const SIGNATURE_LEN: usize = 12;

/// Find a driver descriptor in `buffer`.
///
/// Scans every fourth byte offset from the start of `buffer`. A descriptor
/// whose signature does not start on such an offset is not found.
#[must_use]
pub fn locate(buffer: &[u8]) -> Option<usize> {
    let key = black_box(KEY);
    let last = buffer.len().checked_sub(SIGNATURE_LEN)?;

    (0..=last).step_by(4).find(|&at| {
        SIGNATURE
            .iter()
            .enumerate()
            .all(|(i, &expected)| (read_u32_le(buffer, at + i * 4) ^ key) == expected)
    })
}
