//! # Typed ARM9 I/O Registers
//!
//! The handful of memory-mapped registers the loader touches, modelled as
//! `bitfield-struct` values. Reading and writing the hardware is gated behind
//! the `mmio` feature so the types stay usable (and testable) on a host.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod exmemcnt;
pub mod keyinput;
pub mod powcnt;
pub mod vramcnt;

pub use exmemcnt::ExMemCnt;
pub use keyinput::KeyInput;
pub use powcnt::PowCnt;
pub use vramcnt::{VramBank, VramLayout, WramCnt};

/// A register living at a fixed address in the I/O space.
pub trait MmioRegister: Sized + Copy {
    /// Raw register width.
    type Raw: Copy;

    /// Absolute address of the register.
    const ADDRESS: usize;

    fn from_raw(raw: Self::Raw) -> Self;

    fn into_raw(self) -> Self::Raw;

    /// # Safety
    /// The caller must be running on the ARM9 with the I/O space mapped.
    #[cfg(feature = "mmio")]
    #[inline]
    unsafe fn load() -> Self {
        let raw = unsafe { core::ptr::read_volatile(Self::ADDRESS as *const Self::Raw) };
        Self::from_raw(raw)
    }

    /// # Safety
    /// The caller must be running on the ARM9 with the I/O space mapped, and
    /// must own the hardware the register controls.
    #[cfg(feature = "mmio")]
    #[inline]
    unsafe fn store(self) {
        unsafe { core::ptr::write_volatile(Self::ADDRESS as *mut Self::Raw, self.into_raw()) }
    }
}

macro_rules! mmio_register {
    ($ty:ty, $raw:ty, $addr:expr) => {
        impl $crate::MmioRegister for $ty {
            type Raw = $raw;
            const ADDRESS: usize = $addr;

            #[inline]
            fn from_raw(raw: $raw) -> Self {
                <$ty>::from_bits(raw)
            }

            #[inline]
            fn into_raw(self) -> $raw {
                self.into_bits()
            }
        }
    };
}

pub(crate) use mmio_register;
