//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger setup (console on web, env_logger on native)
//! - Best score storage (LocalStorage on web, JSON file on native)
//! - Run seeds

use crate::persistence::KeyValueStore;

/// Environment variable overriding the native store location
pub const STORE_PATH_VAR: &str = "MERGE_WELL_STORE";
/// Native store file used when `STORE_PATH_VAR` is unset
pub const DEFAULT_STORE_FILE: &str = "merge-well.json";

/// Install the logger and panic hook for the current target.
/// Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Install the logger for the current target (`RUST_LOG` overrides the level).
/// Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Durable store for the best score on this platform
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(crate::persistence::LocalStorageStore)
}

/// Durable store for the best score on this platform
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn KeyValueStore> {
    let path = std::env::var_os(STORE_PATH_VAR)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from(DEFAULT_STORE_FILE));
    let store = crate::persistence::FileStore::new(path);
    log::info!("Best score stored in {}", store.path().display());
    Box::new(store)
}

/// Fresh seed from the OS entropy source
pub fn random_seed() -> u64 {
    rand::random()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_random_seeds_differ() {
        assert_ne!(random_seed(), random_seed());
    }
}
