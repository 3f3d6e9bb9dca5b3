//! One-time logging initialization, swapping the teacher's kernel-mode
//! logging sink for the std-appropriate `env_logger` (see DESIGN.md).

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the `log` facade's global logger exactly once. Safe to call
/// from multiple call sites (tests, `main`) — later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    });
}
