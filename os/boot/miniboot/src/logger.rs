use boot_console::{ByteSink, ConsoleLogger};
use log::{LevelFilter, SetLoggerError};

/// The loader's logger. `Init` adjusts its level.
pub static CONSOLE: ConsoleLogger = ConsoleLogger::new();

/// Route the `log` facade to the console at `sink`.
///
/// # Errors
/// If a logger is already installed.
pub fn init(sink: &'static mut (dyn ByteSink + Send)) -> Result<(), SetLoggerError> {
    let level = if cfg!(feature = "debug-console") {
        LevelFilter::Trace
    } else {
        LevelFilter::Error
    };
    CONSOLE.init(sink, level)
}
