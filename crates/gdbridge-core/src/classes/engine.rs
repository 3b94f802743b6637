//! The `Engine` singleton.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::BridgeResult;
use crate::interface::interface;

use super::ptrcall;

const UNKNOWN: u8 = 0;
const NOT_EDITOR: u8 = 1;
const EDITOR: u8 = 2;

static EDITOR_HINT: AtomicU8 = AtomicU8::new(UNKNOWN);

/// True while the engine runs as the editor. Queried once per load.
pub fn is_editor_hint() -> BridgeResult<bool> {
    match EDITOR_HINT.load(Ordering::Acquire) {
        NOT_EDITOR => return Ok(false),
        EDITOR => return Ok(true),
        _ => {}
    }
    let engine = interface()?.singleton("Engine")?;
    let hint: bool = ptrcall("Engine", "is_editor_hint", engine, |_| Ok(()))?;
    EDITOR_HINT.store(if hint { EDITOR } else { NOT_EDITOR }, Ordering::Release);
    Ok(hint)
}

/// Forgets the cached answer. Called when the interface is unloaded.
pub fn reset_editor_hint() {
    EDITOR_HINT.store(UNKNOWN, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn mock_engine_is_not_an_editor_by_default() {
        test_support::load();
        assert!(!is_editor_hint().unwrap());
    }
}
