use boot_sync::BRING_UP_ROUNDS;

/// Runtime settings of a boot.
///
/// Physical addresses are not configurable here; they live in
/// [`boot_abi::memory`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootConfig {
    /// Absolute path of the executable to launch. Also passed as its command
    /// line.
    pub executable_path: &'static str,
    /// Lockstep rounds with the peer before anything else happens.
    pub sync_rounds: u32,
    /// Address of the loader's own storage driver module, copied to the
    /// snapshot area before mounting.
    pub driver_stub: u32,
    /// Bootstub trampoline code. Empty skips the bootstub install.
    pub trampoline: &'static [u8],
    /// Start with diagnostics enabled regardless of START.
    pub diagnostics: bool,
}

impl BootConfig {
    /// Executable path without the leading separator, as shown in messages.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        self.executable_path.trim_start_matches('/')
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            executable_path: "/BOOT.NDS",
            sync_rounds: BRING_UP_ROUNDS,
            driver_stub: 0,
            trampoline: &[],
            diagnostics: cfg!(feature = "debug-console"),
        }
    }
}
