//! # Position-Independent Relocation
//!
//! A driver is linked for some address (usually `0xBF80_0000`) and copied to
//! wherever the host image reserved space for it. Relocating it shifts the
//! descriptor's own pointers and then sweeps the fixable sections for words
//! that look like pointers into the old location.
//!
//! Which words look like pointers depends on the section:
//!
//! * GOT entries can only be addresses, so anything inside the old
//!   allocation counts.
//! * Code and data words may be constants that happen to look like
//!   addresses, so only the span the driver actually occupied counts. That
//!   is the end of data or of BSS, whichever is later, capped at the
//!   allocation.
//!
//! The descriptor itself is never swept: its pointers are shifted once from
//! the parsed copy and written back after the sweeps. Every other word is
//! read once, so the old and new locations may overlap.
//!
//! Relocating twice is not supported: a second pass shifts pointers that were
//! already moved whenever they land in the old range again.

use crate::descriptor::{ALLOCATED_LOG2_OFFSET, DESCRIPTOR_LEN, DriverDescriptor, FixFlags, Section};
use crate::{DldiError, locate};
use core::ops::Range;
use log::{debug, trace, warn};

/// What [`relocate`] did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Relocation {
    /// Distance every pointer was moved by, modulo 2³².
    pub offset: u32,
    /// Number of in-body words rewritten.
    pub fixed_words: usize,
}

/// What [`patch`] did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PatchOutcome {
    /// The image carries no driver descriptor; nothing was touched.
    NotPresent,
    /// The descriptor at `offset` into the image was replaced and relocated.
    Patched { offset: usize, relocated_to: u32 },
}

/// Relocate the driver occupying `space` so it runs at `target`.
///
/// `space` starts with the descriptor and spans the driver's allocation;
/// `space[0]` is assumed to live at `target`. Words a section addresses
/// outside `space` are skipped.
///
/// # Errors
/// [`DldiError::Truncated`] if `space` cannot hold a descriptor.
pub fn relocate(space: &mut [u8], target: u32) -> Result<Relocation, DldiError> {
    let mut descriptor = DriverDescriptor::parse(space)?;

    // Everything below is judged against where the driver was, not where
    // it is going.
    let old = descriptor.sections;
    let offset = target.wrapping_sub(old.driver.start);

    descriptor.shift(offset);

    let old_start = u64::from(old.driver.start);
    let space_end = old_start.saturating_add(descriptor.allocated_bytes());
    let data_end = u64::from(old.driver.end.max(old.bss.end)).min(space_end);
    let code_range = old_start..data_end;
    let got_range = old_start..space_end;

    let new = descriptor.sections;
    let flags = descriptor.fix_flags;
    let len = space.len();
    let sweep = |flag: FixFlags, section: Section, safe: &Range<u64>| Sweep {
        bytes: if flags.contains(flag) {
            clip(section, target, len)
        } else {
            0..0
        },
        safe: safe.clone(),
    };
    let sweeps = [
        sweep(FixFlags::ALL, new.driver, &code_range),
        sweep(FixFlags::GLUE, new.interwork, &code_range),
        sweep(FixFlags::GOT, new.got, &got_range),
    ];
    let fixed_words = fix_words(space, &sweeps, offset);

    if flags.contains(FixFlags::BSS) {
        let bytes = clip(new.bss, target, len);
        trace!("zeroing {} bytes of BSS", bytes.len());
        space[bytes].fill(0);
    }
    descriptor.write_to(space)?;

    debug!("relocated driver by {offset:#010x}, {fixed_words} words fixed");
    Ok(Relocation {
        offset,
        fixed_words,
    })
}

/// Bytes of one section and the values that count as pointers in it.
struct Sweep {
    bytes: Range<usize>,
    safe: Range<u64>,
}

/// Add `offset` to every word that a sweep covers and whose value lies in
/// that sweep's range.
///
/// Sections are word aligned. Each word moves at most once, even where
/// sections nest. Words inside the descriptor are left alone.
fn fix_words(space: &mut [u8], sweeps: &[Sweep], offset: u32) -> usize {
    let end = sweeps.iter().map(|s| s.bytes.end).max().unwrap_or(0);
    let mut fixed = 0;
    for at in (DESCRIPTOR_LEN..end).step_by(4) {
        let Some(word) = space.get_mut(at..at + 4) else {
            break;
        };
        let value = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        let pointer = sweeps
            .iter()
            .any(|s| s.bytes.contains(&at) && s.safe.contains(&u64::from(value)));
        if pointer {
            word.copy_from_slice(&value.wrapping_add(offset).to_le_bytes());
            fixed += 1;
        }
    }
    fixed
}

/// Byte range of `section` within a slice of `len` bytes starting at `base`.
///
/// Parts of the section outside the slice are dropped. A section starting
/// below `base` resumes at its first word inside the slice.
fn clip(section: Section, base: u32, len: usize) -> Range<usize> {
    let base = u64::from(base);
    let start = u64::from(section.start);
    let lo = if start < base {
        start + (base - start).next_multiple_of(4)
    } else {
        start
    };
    let hi = u64::from(section.end).min(base + len as u64);
    if lo >= hi {
        return 0..0;
    }

    // Both bounds are at most `len`.
    let lo = usize::try_from(lo - base).unwrap_or(len);
    let hi = usize::try_from(hi - base).unwrap_or(len);
    lo..hi
}

/// Replace the driver embedded in `image` with `driver` and relocate it.
///
/// `image_base` is the address `image[0]` is loaded at; it is only used to
/// cross-check where the descriptor claims to live. The replacement goes to
/// the address recorded in the embedded descriptor.
///
/// The first word of the embedded descriptor is kept, since a driver parked
/// by the loader may have had its magic number removed. The embedded
/// allocation size is kept as well.
///
/// # Errors
/// * [`DldiError::NotEnoughSpace`] if `driver` does not fit the allocation.
///   `image` is left untouched.
/// * [`DldiError::Truncated`] if either descriptor is cut short.
pub fn patch(image: &mut [u8], image_base: u32, driver: &[u8]) -> Result<PatchOutcome, DldiError> {
    let Some(offset) = locate(image) else {
        debug!("no driver descriptor in image");
        return Ok(PatchOutcome::NotPresent);
    };
    debug!("driver descriptor found at {offset}");

    let embedded = DriverDescriptor::parse(&image[offset..])?;
    let replacement = DriverDescriptor::parse(driver)?;

    if embedded.allocated_log2 < replacement.driver_log2 {
        return Err(DldiError::NotEnoughSpace {
            required: replacement.driver_log2,
            available: embedded.allocated_log2,
        });
    }

    let relocated_to = embedded.sections.driver.start;
    let located_at = u64::from(image_base) + offset as u64;
    if u64::from(relocated_to) != located_at {
        warn!("descriptor at {located_at:#x} claims to start at {relocated_to:#x}");
    }

    let available = image.len() - offset;
    let space_len = usize::try_from(embedded.allocated_bytes()).map_or(available, |n| n.min(available));
    if space_len < DESCRIPTOR_LEN {
        return Err(DldiError::Truncated { len: space_len });
    }
    let space = &mut image[offset..offset + space_len];

    let copy_len = space_len.min(driver.len());
    space[4..copy_len].copy_from_slice(&driver[4..copy_len]);
    space[ALLOCATED_LOG2_OFFSET] = embedded.allocated_log2;

    relocate(space, relocated_to)?;

    Ok(PatchOutcome::Patched {
        offset,
        relocated_to,
    })
}
