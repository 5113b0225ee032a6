use crate::error::BootError;
use core::hint::spin_loop;
use log::{debug, error};

/// Log the diagnostic for `err` and its detail line, if any.
pub fn report(err: &BootError) {
    error!("{err}");
    if let Some(detail) = err.detail() {
        error!("{detail}");
    }
    debug!("{err:?}");
}

/// Report `err` and stop for good.
pub fn halt(err: &BootError) -> ! {
    report(err);
    loop {
        spin_loop();
    }
}
