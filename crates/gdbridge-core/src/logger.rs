//! `log` backend that forwards records to the engine's console.
//!
//! Errors go through the engine's `print_error`, warnings through
//! `print_warning`. Everything below that, and anything logged while no
//! interface is loaded, is written to stderr.

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::interface::interface;

pub struct EngineLogger;

static LOGGER: EngineLogger = EngineLogger;
static INSTALLED: AtomicBool = AtomicBool::new(false);

fn c_string(text: &str) -> CString {
    CString::new(text.replace('\0', " ")).unwrap_or_default()
}

impl Log for EngineLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        let print = match (record.level(), interface()) {
            (Level::Error, Ok(table)) => Some(table.print_error),
            (Level::Warn, Ok(table)) => Some(table.print_warning),
            _ => None,
        };

        match print {
            Some(print) => {
                let description = c_string(&message);
                let function = c_string(record.module_path().unwrap_or(record.target()));
                let file = c_string(record.file().unwrap_or("<unknown>"));
                let line = record.line().map_or(0, |line| line as i32);
                unsafe { print(description.as_ptr(), function.as_ptr(), file.as_ptr(), line, 0) };
            }
            None => eprintln!("[{} {}] {}", record.level(), record.target(), message),
        }
    }

    fn flush(&self) {}
}

/// Installs the engine logger with the given level.
///
/// When another logger was installed first (for example by a host test
/// harness) it is kept and only a debug record notes the fact.
pub fn install(level: LevelFilter) {
    if INSTALLED.load(Ordering::Acquire) {
        log::set_max_level(level);
        return;
    }
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            INSTALLED.store(true, Ordering::Release);
            log::set_max_level(level);
        }
        Err(_) => log::debug!("a logger is already installed; records stay with it"),
    }
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}
