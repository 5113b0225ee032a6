use boot_registers::{ExMemCnt, KeyInput, PowCnt, VramLayout};

/// The hardware the loader configures, seen through the few operations it
/// needs.
pub trait Platform {
    /// Current button state.
    fn key_input(&self) -> KeyInput;

    fn set_vram_banks(&mut self, layout: VramLayout);

    fn set_power(&mut self, power: PowCnt);

    fn set_external_memory(&mut self, control: ExMemCnt);

    /// Blank both screens and return the display engines to their reset state.
    fn reset_display(&mut self);

    /// Restart the local processor through the firmware, which jumps to the
    /// entry point recorded in the header at
    /// [`HEADER_ADDRESS`](boot_abi::memory::HEADER_ADDRESS).
    fn soft_reset(&mut self) -> !;
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use hardware::Hardware;

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod hardware {
    use super::Platform;
    use boot_registers::{ExMemCnt, KeyInput, MmioRegister, PowCnt, VramLayout};

    /// The ARM9's own registers.
    pub struct Hardware {
        display_reset: fn(),
    }

    impl Hardware {
        /// # Safety
        /// Only one `Hardware` may exist, on the ARM9.
        #[must_use]
        pub const unsafe fn new(display_reset: fn()) -> Self {
            Self { display_reset }
        }
    }

    impl Platform for Hardware {
        fn key_input(&self) -> KeyInput {
            // SAFETY: read-only register, always mapped.
            unsafe { KeyInput::load() }
        }

        fn set_vram_banks(&mut self, layout: VramLayout) {
            // SAFETY: nothing is drawn from VRAM while the loader runs.
            unsafe { layout.store() }
        }

        fn set_power(&mut self, power: PowCnt) {
            // SAFETY: exclusive by construction.
            unsafe { power.store() }
        }

        fn set_external_memory(&mut self, control: ExMemCnt) {
            // SAFETY: exclusive by construction.
            unsafe { control.store() }
        }

        fn reset_display(&mut self) {
            (self.display_reset)();
        }

        fn soft_reset(&mut self) -> ! {
            // SAFETY: the firmware SoftReset call never returns.
            unsafe { core::arch::asm!("swi #0", options(noreturn)) }
        }
    }
}
