//! Per-library configuration.

use std::sync::RwLock;

use gdbridge_sys as sys;
use log::LevelFilter;
use num_enum::TryFromPrimitive;

/// Engine initialization levels, in the order the engine enters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum InitLevel {
    Core = sys::GDEXTENSION_INITIALIZATION_CORE,
    Servers = sys::GDEXTENSION_INITIALIZATION_SERVERS,
    Scene = sys::GDEXTENSION_INITIALIZATION_SCENE,
    Editor = sys::GDEXTENSION_INITIALIZATION_EDITOR,
}

impl InitLevel {
    pub const ALL: [InitLevel; 4] = [
        InitLevel::Core,
        InitLevel::Servers,
        InitLevel::Scene,
        InitLevel::Editor,
    ];

    pub fn to_sys(self) -> sys::GDExtensionInitializationLevel {
        self as u32
    }
}

/// Settings an extension library hands to the bridge at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionConfig {
    /// Lowest level at which the engine calls back into the library.
    pub minimum_level: InitLevel,
    /// Records above this level are discarded.
    pub log_level: LevelFilter,
    /// When false, notifications and virtuals of classes that are not marked
    /// `tool` are not delivered while the engine runs as an editor.
    pub editor_runs_user_code: bool,
    /// Install a panic hook that records the location of the last panic so
    /// contained panics can be reported with their source position.
    pub capture_panic_locations: bool,
}

impl ExtensionConfig {
    pub const DEFAULT: ExtensionConfig = ExtensionConfig {
        minimum_level: InitLevel::Scene,
        log_level: LevelFilter::Warn,
        editor_runs_user_code: false,
        capture_panic_locations: true,
    };
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static CONFIG: RwLock<ExtensionConfig> = RwLock::new(ExtensionConfig::DEFAULT);

/// Replaces the active configuration. Called once from the entry point.
pub fn set_config(config: ExtensionConfig) {
    match CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Snapshot of the active configuration.
pub fn config() -> ExtensionConfig {
    match CONFIG.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
