use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

const DEBUG_ENV: &str = "CARSEARCH_DEBUG";

pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Turns debug output on when the flag is set or `CARSEARCH_DEBUG` holds
/// anything other than an empty string or `0`.
pub fn init(flag: bool) {
    let from_env = std::env::var(DEBUG_ENV)
        .map(|v| env_value_enables(&v))
        .unwrap_or(false);
    set_debug(flag || from_env);
}

fn env_value_enables(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0"
}

#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            println!("[debug] {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[debug] {}", format!($($arg)*));
        }
    };
}
