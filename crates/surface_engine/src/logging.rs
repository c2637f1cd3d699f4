//! Logging setup for embedding hosts

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Call once at process startup, before constructing a session. Filtering
/// follows `RUST_LOG`.
pub fn init() {
    env_logger::init();
}

/// Initialize logging inside tests, tolerating repeated calls
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
