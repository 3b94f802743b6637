//! Panic containment at the engine boundary.
//!
//! A panic must never unwind into engine frames. Every callback runs its
//! host code through [`catch`], which turns a panic into a [`PanicReport`].
//! When location capture is enabled, a chained panic hook remembers where
//! the last panic on each thread happened so the report can name the source
//! position.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// What is known about a contained panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicReport {
    pub message: String,
    pub file: Option<String>,
    pub line: u32,
}

impl PanicReport {
    /// `file:line`, or `<unknown>` when no hook recorded the location.
    pub fn location(&self) -> String {
        match &self.file {
            Some(file) => format!("{}:{}", file, self.line),
            None => "<unknown>".to_string(),
        }
    }
}

impl fmt::Display for PanicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location())
    }
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Installs the location-recording hook in front of the current one. Idempotent.
pub fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let report = PanicReport {
                message: payload_message(info.payload()),
                file: info.location().map(|l| l.file().to_string()),
                line: info.location().map_or(0, |l| l.line()),
            };
            LAST_PANIC.with(|last| *last.borrow_mut() = Some(report));
            previous(info);
        }));
    });
}

/// Runs `f`, converting a panic into a report.
pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R, PanicReport> {
    LAST_PANIC.with(|last| last.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        LAST_PANIC
            .with(|last| last.borrow_mut().take())
            .unwrap_or_else(|| PanicReport {
                message: payload_message(payload.as_ref()),
                file: None,
                line: 0,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_pass_through() {
        assert_eq!(catch(|| 7).unwrap(), 7);
    }

    #[test]
    fn panics_become_reports_with_locations() {
        install_hook();
        let report = catch(|| -> i32 { panic!("sensor {} offline", 3) }).unwrap_err();
        assert_eq!(report.message, "sensor 3 offline");
        assert!(report.file.as_deref().unwrap().ends_with("panic.rs"));
        assert!(report.line > 0);
        assert!(report.to_string().starts_with("sensor 3 offline at "));
    }

    #[test]
    fn nested_catches_keep_their_own_report() {
        install_hook();
        let outer = catch(|| {
            let inner = catch(|| panic!("inner"));
            assert_eq!(inner.unwrap_err().message, "inner");
            panic!("outer")
        })
        .unwrap_err();
        assert_eq!(outer.message, "outer");
    }
}
