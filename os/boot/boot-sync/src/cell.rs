use core::sync::atomic::{AtomicU32, Ordering, fence};

/// A shared 32-bit word.
///
/// `store` has release semantics and `load` has acquire semantics: whatever
/// the writer did before a store is visible to a reader that observed it.
pub trait HandshakeCell {
    fn load(&self) -> u32;
    fn store(&self, value: u32);
}

impl HandshakeCell for AtomicU32 {
    #[inline]
    fn load(&self) -> u32 {
        AtomicU32::load(self, Ordering::Acquire)
    }

    #[inline]
    fn store(&self, value: u32) {
        AtomicU32::store(self, value, Ordering::Release);
    }
}

impl<C: HandshakeCell + ?Sized> HandshakeCell for &C {
    #[inline]
    fn load(&self) -> u32 {
        (**self).load()
    }

    #[inline]
    fn store(&self, value: u32) {
        (**self).store(value);
    }
}

/// A word at a fixed physical address, accessed with volatile loads and
/// stores bracketed by fences.
pub struct VolatileCell {
    ptr: *mut u32,
}

impl VolatileCell {
    /// # Safety
    /// `addr` must be a 4-byte aligned address that stays mapped and
    /// readable/writable by both processors for the lifetime of the cell.
    #[must_use]
    pub const unsafe fn at(addr: u32) -> Self {
        Self {
            ptr: addr as usize as *mut u32,
        }
    }
}

impl HandshakeCell for VolatileCell {
    #[inline]
    fn load(&self) -> u32 {
        // SAFETY: validity of the address is the constructor's contract.
        let value = unsafe { core::ptr::read_volatile(self.ptr) };
        fence(Ordering::Acquire);
        value
    }

    #[inline]
    fn store(&self, value: u32) {
        fence(Ordering::Release);
        // SAFETY: validity of the address is the constructor's contract.
        unsafe { core::ptr::write_volatile(self.ptr, value) }
    }
}

// SAFETY: the cell is a plain shared word; all access is volatile.
unsafe impl Send for VolatileCell {}
unsafe impl Sync for VolatileCell {}
