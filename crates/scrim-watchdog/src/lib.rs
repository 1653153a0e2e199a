#![forbid(unsafe_code)]

//! Scrim main-thread freeze detection.
//!
//! A frozen main thread is the one failure the main thread cannot report on
//! its own. This crate runs the diagnosis from the outside: a watcher thread
//! expects the main context to keep stamping a heartbeat, and when the stamp
//! goes stale past a timeout it raises a flag in durable storage and captures
//! a report, all without touching anything the main context could be
//! blocking on.
//!
//! # Key Components
//!
//! - [`FreezeDetector`] - The watchdog: heartbeat probe, watcher thread,
//!   one-report-per-session state machine
//! - [`Heartbeat`] - Cloneable handle the main run loop beats from
//! - [`FlagStore`] - Durable storage seam for the persisted freeze flag
//!   ([`MemoryFlagStore`] always; [`FileFlagStore`] with the `file-store`
//!   feature)
//! - [`ReportSink`] - Delivery seam for captured [`FreezeReport`]s
//!
//! # Reading the previous session
//!
//! [`FreezeDetector::last_session_ended_frozen`] is computed once at
//! construction from the durable store, before any probing starts, so startup
//! code can ask "did we die frozen last time?" without depending on the main
//! thread having been responsive then, or now.

pub mod debug_trace;
pub mod detector;
pub mod flag_store;
pub mod report;

pub use detector::{FreezeDetector, FreezeDetectorConfig, Heartbeat};
#[cfg(feature = "file-store")]
pub use flag_store::FileFlagStore;
pub use flag_store::{FlagStore, MemoryFlagStore, PersistedFlag, StoreError, StoreResult};
pub use report::{FreezeReport, LogReportSink, ReportSink};
