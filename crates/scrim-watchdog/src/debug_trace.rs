#![forbid(unsafe_code)]

//! Zero-cost debug tracing controlled by environment variable.
//!
//! Set `SCRIM_DEBUG_TRACE=1` before launch to get timestamped watcher-loop
//! diagnostics on stderr. When unset (the default), each trace site is a
//! single static bool load.
//!
//! ```ignore
//! use scrim_watchdog::debug_trace;
//! debug_trace!("watcher tick: stalled={:?}", stalled);
//! ```

use std::sync::LazyLock;
use std::time::Instant;

static ENABLED: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("SCRIM_DEBUG_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Check if debug tracing is enabled.
#[inline]
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED
}

/// Milliseconds since program start, for correlating output across threads.
#[inline]
#[must_use]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Conditionally print a timestamped trace line to stderr.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[SCRIM {:>8}ms] {}",
                $crate::debug_trace::elapsed_ms(),
                format_args!($($arg)*)
            );
        }
    };
}
