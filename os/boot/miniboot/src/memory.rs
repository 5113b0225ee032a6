//! # Physical memory access
//!
//! The loader never dereferences an address itself. Everything goes through
//! [`PhysicalMemory`], which hands out a slice for a span of physical memory
//! for the duration of a closure. On hardware that slice is the memory; in
//! tests it is a buffer standing in for it.

use core::fmt;

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum MemoryError {
    #[error("{0} is not mapped")]
    Unmapped(Span),
    #[error("{0} and {1} overlap")]
    Overlap(Span, Span),
}

/// `len` bytes of physical memory starting at `addr`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Span {
    pub addr: u32,
    pub len: u32,
}

impl Span {
    #[must_use]
    pub const fn new(addr: u32, len: u32) -> Self {
        Self { addr, len }
    }

    /// Exclusive end address, computed without wrapping.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.addr as u64 + self.len as u64
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        (self.addr as u64) < other.end() && (other.addr as u64) < self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#010x}, {:#010x})", self.addr, self.end())
    }
}

/// Access to physical memory as seen from the running processor.
pub trait PhysicalMemory {
    /// Run `f` over the bytes of `span`.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if any part of `span` is not accessible.
    fn with_region<R>(&mut self, span: Span, f: impl FnOnce(&mut [u8]) -> R) -> Result<R, MemoryError>;

    /// Run `f` over two disjoint spans at once, the first writable.
    ///
    /// # Errors
    /// [`MemoryError::Overlap`] if the spans share bytes, otherwise as
    /// [`with_region`](Self::with_region).
    fn with_regions<R>(
        &mut self,
        dst: Span,
        src: Span,
        f: impl FnOnce(&mut [u8], &[u8]) -> R,
    ) -> Result<R, MemoryError>;

    /// Copy `len` bytes from `src` to `dst`. The ranges may overlap.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if either range is not accessible.
    fn copy(&mut self, src: u32, dst: u32, len: u32) -> Result<(), MemoryError> {
        let from = Span::new(src, len);
        let to = Span::new(dst, len);
        if len == 0 || src == dst {
            return Ok(());
        }
        if from.overlaps(&to) {
            let lo = src.min(dst);
            let total = len
                .checked_add(src.abs_diff(dst))
                .ok_or(MemoryError::Unmapped(to))?;
            let whole = Span::new(lo, total);
            let (src, dst) = ((src - lo) as usize, (dst - lo) as usize);
            return self.with_region(whole, |bytes| {
                bytes.copy_within(src..src + len as usize, dst);
            });
        }
        self.with_regions(to, from, |d, s| d.copy_from_slice(s))
    }

    /// Fill `buf` from memory at `addr`.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if the range is not accessible.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
        let span = Span::new(addr, span_len(buf.len(), addr)?);
        self.with_region(span, |bytes| buf.copy_from_slice(bytes))
    }

    /// Store `bytes` to memory at `addr`.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if the range is not accessible.
    fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let span = Span::new(addr, span_len(bytes.len(), addr)?);
        self.with_region(span, |mem| mem.copy_from_slice(bytes))
    }

    /// Read one little-endian word.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if the word is not accessible.
    fn read_u32(&mut self, addr: u32) -> Result<u32, MemoryError> {
        let mut word = [0u8; 4];
        self.read(addr, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Store one little-endian word.
    ///
    /// # Errors
    /// [`MemoryError::Unmapped`] if the word is not accessible.
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), MemoryError> {
        self.write(addr, &value.to_le_bytes())
    }
}

fn span_len(len: usize, addr: u32) -> Result<u32, MemoryError> {
    u32::try_from(len).map_err(|_| MemoryError::Unmapped(Span::new(addr, u32::MAX)))
}

/// Memory accessed directly through raw pointers.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub struct RawMemory {
    _private: (),
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl RawMemory {
    /// # Safety
    /// Only one `RawMemory` may exist per processor, and nothing else may
    /// hold references into the memory it hands out.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    const fn check(span: Span) -> Result<Span, MemoryError> {
        if span.addr == 0 || span.end() > u32::MAX as u64 {
            return Err(MemoryError::Unmapped(span));
        }
        Ok(span)
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl PhysicalMemory for RawMemory {
    fn with_region<R>(&mut self, span: Span, f: impl FnOnce(&mut [u8]) -> R) -> Result<R, MemoryError> {
        let span = Self::check(span)?;
        // SAFETY: exclusive by the constructor's contract; the span does not
        // wrap and does not start at null.
        let bytes = unsafe { core::slice::from_raw_parts_mut(span.addr as usize as *mut u8, span.len as usize) };
        Ok(f(bytes))
    }

    fn with_regions<R>(
        &mut self,
        dst: Span,
        src: Span,
        f: impl FnOnce(&mut [u8], &[u8]) -> R,
    ) -> Result<R, MemoryError> {
        let (dst, src) = (Self::check(dst)?, Self::check(src)?);
        if dst.overlaps(&src) {
            return Err(MemoryError::Overlap(dst, src));
        }
        // SAFETY: as above, and the two spans are disjoint.
        let (d, s) = unsafe {
            (
                core::slice::from_raw_parts_mut(dst.addr as usize as *mut u8, dst.len as usize),
                core::slice::from_raw_parts(src.addr as usize as *const u8, src.len as usize),
            )
        };
        Ok(f(d, s))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// 256 bytes at 0x1000.
    struct Flat([u8; 256]);

    impl Flat {
        fn range(span: Span) -> Result<core::ops::Range<usize>, MemoryError> {
            if span.addr < 0x1000 || span.end() > 0x1100 {
                return Err(MemoryError::Unmapped(span));
            }
            let at = (span.addr - 0x1000) as usize;
            Ok(at..at + span.len as usize)
        }
    }

    impl PhysicalMemory for Flat {
        fn with_region<R>(&mut self, span: Span, f: impl FnOnce(&mut [u8]) -> R) -> Result<R, MemoryError> {
            let r = Self::range(span)?;
            Ok(f(&mut self.0[r]))
        }

        fn with_regions<R>(
            &mut self,
            dst: Span,
            src: Span,
            f: impl FnOnce(&mut [u8], &[u8]) -> R,
        ) -> Result<R, MemoryError> {
            if dst.overlaps(&src) {
                return Err(MemoryError::Overlap(dst, src));
            }
            let (d, s) = (Self::range(dst)?, Self::range(src)?);
            let mut scratch = [0u8; 256];
            scratch[..s.len()].copy_from_slice(&self.0[s.clone()]);
            Ok(f(&mut self.0[d], &scratch[..s.len()]))
        }
    }

    #[test]
    fn overlapping_copy_behaves_like_memmove() {
        let mut mem = Flat([0; 256]);
        mem.write(0x1000, &[1, 2, 3, 4, 5, 6]).unwrap();
        mem.copy(0x1000, 0x1002, 6).unwrap();
        let mut out = [0u8; 8];
        mem.read(0x1000, &mut out).unwrap();
        assert_eq!(out, [1, 2, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn disjoint_copy_and_words() {
        let mut mem = Flat([0; 256]);
        mem.write_u32(0x1010, 0x0200_0100).unwrap();
        mem.copy(0x1010, 0x1080, 4).unwrap();
        assert_eq!(mem.read_u32(0x1080), Ok(0x0200_0100));
    }

    #[test]
    fn unmapped_access_is_reported() {
        let mut mem = Flat([0; 256]);
        assert_eq!(
            mem.write(0x10FE, &[0; 4]),
            Err(MemoryError::Unmapped(Span::new(0x10FE, 4)))
        );
    }

    #[test]
    fn span_overlap_is_half_open() {
        let a = Span::new(0x100, 0x10);
        assert!(a.overlaps(&Span::new(0x10F, 1)));
        assert!(!a.overlaps(&Span::new(0x110, 1)));
        assert!(!a.overlaps(&Span::new(0xF0, 0x10)));
    }
}
