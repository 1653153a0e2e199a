#![forbid(unsafe_code)]

//! Scrim public facade crate.
//!
//! Re-exports the stable surface of the member crates and offers a
//! lightweight prelude for day-to-day usage. Depend on `scrim-core` or
//! `scrim-watchdog` directly when you want a narrower dependency.

// --- Core re-exports -------------------------------------------------------

pub use scrim_core::callback_manager::CallbackManager;
pub use scrim_core::overlays::{
    ConfirmationAction, ConfirmationConfig, ConfirmationResponse, HttpAuthConfig, HttpAuthResponse,
};
pub use scrim_core::queue::RequestQueue;
pub use scrim_core::request::OverlayRequest;
pub use scrim_core::response::OverlayResponse;
pub use scrim_core::support::{
    self, AggregateSupport, ConfigSupport, DisabledSupport, RequestSupport, UniversalSupport,
};
pub use scrim_core::user_data::{Payload, UserData};

// --- Watchdog re-exports ---------------------------------------------------

#[cfg(feature = "file-store")]
pub use scrim_watchdog::FileFlagStore;
#[cfg(feature = "watchdog")]
pub use scrim_watchdog::{
    FlagStore, FreezeDetector, FreezeDetectorConfig, FreezeReport, Heartbeat, LogReportSink,
    MemoryFlagStore, PersistedFlag, ReportSink, StoreError, StoreResult,
};

/// Common imports for applications coordinating overlays.
///
/// ```
/// use scrim::prelude::*;
///
/// let mut queue = RequestQueue::new();
/// queue.push_back(OverlayRequest::with_config(ConfirmationConfig::new("Sure?", "")));
/// assert!(queue.front_supported(ConfirmationConfig::request_support()).is_some());
/// ```
pub mod prelude {
    pub use scrim_core::callback_manager::CallbackManager;
    pub use scrim_core::overlays::{
        ConfirmationAction, ConfirmationConfig, ConfirmationResponse, HttpAuthConfig,
        HttpAuthResponse,
    };
    pub use scrim_core::queue::RequestQueue;
    pub use scrim_core::request::OverlayRequest;
    pub use scrim_core::response::OverlayResponse;
    pub use scrim_core::support::RequestSupport;
    pub use scrim_core::user_data::Payload;

    #[cfg(feature = "watchdog")]
    pub use scrim_watchdog::{FreezeDetector, FreezeDetectorConfig, Heartbeat};
}
