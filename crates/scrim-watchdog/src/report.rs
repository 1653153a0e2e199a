#![forbid(unsafe_code)]

//! Freeze reports and their delivery seam.
//!
//! When the watcher declares the main thread frozen it captures what it can
//! observe from the outside (timing, not stacks) and hands the record to a
//! [`ReportSink`]. The crash/diagnostic pipeline that turns the record into
//! an uploadable report lives behind the trait.

use std::time::{Duration, SystemTime};

/// What the watcher knew at the moment it declared a freeze.
#[derive(Clone, Debug)]
pub struct FreezeReport {
    /// When the freeze was detected.
    pub detected_at: SystemTime,
    /// How long the main thread had gone without a heartbeat.
    pub stalled_for: Duration,
    /// When the monitored session started.
    pub session_started_at: SystemTime,
    /// Heartbeats observed this session before the stall.
    pub beats_observed: u64,
}

/// Delivery seam for captured freeze reports.
///
/// Implementations must be `Send + Sync`: capture happens on the watcher
/// thread while the main thread is unresponsive, so a sink must not block on
/// anything the main context owns.
pub trait ReportSink: Send + Sync {
    /// Receive a freeze report. Called at most once per session.
    fn capture(&self, report: &FreezeReport);
}

/// Sink that records the freeze in the structured log and nothing else.
///
/// The default for hosts without a crash reporting pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn capture(&self, report: &FreezeReport) {
        tracing::error!(
            stalled_ms = report.stalled_for.as_millis() as u64,
            beats_observed = report.beats_observed,
            "main thread freeze detected"
        );
    }
}
