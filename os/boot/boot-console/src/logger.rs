use crate::{ByteSink, ConsoleWriter};
use core::fmt::Write;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

type Sink = &'static mut (dyn ByteSink + Send);

struct State {
    sink: Option<Sink>,
    max_level: LevelFilter,
}

pub struct ConsoleLogger {
    state: Mutex<State>,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// A logger with no sink attached; it drops everything until one is.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                sink: None,
                max_level: LevelFilter::Error,
            }),
        }
    }

    /// Call this once during early init.
    ///
    /// # Errors
    /// If another logger was already installed.
    pub fn init(&'static self, sink: Sink, max_level: LevelFilter) -> Result<(), SetLoggerError> {
        self.attach(sink);
        self.set_level(max_level);
        log::set_logger(self)?;
        Ok(())
    }

    /// Replace the sink, returning the previous one.
    pub fn attach(&self, sink: Sink) -> Option<Sink> {
        self.state.lock().sink.replace(sink)
    }

    pub fn detach(&self) -> Option<Sink> {
        self.state.lock().sink.take()
    }

    /// Change the threshold for this logger and for the `log` facade.
    pub fn set_level(&self, max_level: LevelFilter) {
        self.state.lock().max_level = max_level;
        log::set_max_level(max_level);
    }

    #[must_use]
    pub fn level(&self) -> LevelFilter {
        self.state.lock().max_level
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.state.lock().max_level
    }

    fn log(&self, record: &Record) {
        let mut state = self.state.lock();
        if record.level() > state.max_level {
            return;
        }
        let Some(sink) = state.sink.as_deref_mut() else {
            return;
        };

        // Best effort; the sink cannot fail.
        let mut out = ConsoleWriter::new(sink);
        let _ = if record.level() == Level::Error {
            writeln!(out, "{}", record.args())
        } else {
            writeln!(out, "[{}] {}", record.level(), record.args())
        };
    }

    fn flush(&self) {}
}
