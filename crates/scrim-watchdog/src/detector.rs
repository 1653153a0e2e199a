#![forbid(unsafe_code)]

//! The freeze detector.
//!
//! # How it works
//!
//! 1. The main run loop holds a [`Heartbeat`] handle and calls
//!    [`Heartbeat::beat`] every iteration.
//! 2. A watcher thread wakes every `poll_interval` and compares the atomic
//!    heartbeat stamp against `timeout`.
//! 3. A stale stamp means the main thread is frozen: the watcher raises the
//!    persisted flag through the [`FlagStore`], then captures one
//!    [`FreezeReport`] per session for the [`ReportSink`].
//! 4. A beat observed after a freeze clears the persisted flag (the session
//!    is no longer *ending* frozen) while the report latch stays set.
//!
//! The watcher shares nothing lockable with the main context: the stamp is an
//! `AtomicU64` and the store write happens entirely on the watcher thread.
//! If persisting the flag fails, report capture is skipped and retried on the
//! next tick; the detector itself must never crash.
//!
//! # Sessions
//!
//! A session is one detector lifetime. At construction the detector reads
//! the durable flag (before any probing starts) to answer
//! [`last_session_ended_frozen`], then clears it for the new session.
//!
//! [`last_session_ended_frozen`]: FreezeDetector::last_session_ended_frozen

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[cfg(feature = "file-store")]
use crate::flag_store::FileFlagStore;
#[cfg(not(feature = "file-store"))]
use crate::flag_store::MemoryFlagStore;
use crate::flag_store::{FlagStore, PersistedFlag};
use crate::report::{FreezeReport, LogReportSink, ReportSink};

/// Tuning for a [`FreezeDetector`].
#[derive(Clone, Debug)]
pub struct FreezeDetectorConfig {
    /// How stale the heartbeat stamp may get before the main thread is
    /// declared frozen.
    pub timeout: Duration,
    /// How often the watcher thread samples the stamp.
    pub poll_interval: Duration,
    /// Whether monitoring starts at construction. On by default so freezes
    /// during application startup are caught.
    pub enabled: bool,
}

impl Default for FreezeDetectorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(9),
            poll_interval: Duration::from_secs(1),
            enabled: true,
        }
    }
}

impl FreezeDetectorConfig {
    /// Replace the freeze timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the watcher sampling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set whether monitoring starts at construction.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Shutdown signal for the watcher thread.
///
/// Condvar-backed so a stop wakes a sleeping watcher immediately instead of
/// waiting out the current poll interval.
#[derive(Clone)]
struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn signal(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    /// Wait up to `duration` for the signal. Returns `true` once signalled.
    fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap();
        let (stopped, _) = cvar
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .unwrap();
        *stopped
    }
}

/// State shared between the detector, its heartbeat handles, and the watcher.
struct WatchInner {
    epoch: Instant,
    /// Milliseconds since `epoch` at the last beat.
    last_beat_ms: AtomicU64,
    beats: AtomicU64,
    /// The main thread is currently past the timeout.
    frozen: AtomicBool,
    /// A report was captured this session.
    reported: AtomicBool,
    session_started_at: SystemTime,
    timeout: Duration,
    store: Arc<dyn FlagStore>,
    sink: Arc<dyn ReportSink>,
}

impl WatchInner {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn stamp(&self) {
        self.last_beat_ms.store(self.now_ms(), Ordering::Release);
    }
}

/// Cloneable handle the monitored context beats from.
///
/// Call [`beat`] from every iteration of the main run loop. Beating is two
/// atomic stores on the fast path; only the first beat after a detected
/// freeze does more (it clears the persisted flag).
///
/// [`beat`]: Heartbeat::beat
#[derive(Clone)]
pub struct Heartbeat {
    inner: Arc<WatchInner>,
}

impl Heartbeat {
    /// Record that the monitored context is making progress.
    pub fn beat(&self) {
        self.inner.stamp();
        self.inner.beats.fetch_add(1, Ordering::Relaxed);
        if self.inner.frozen.swap(false, Ordering::AcqRel) {
            tracing::info!("main thread recovered after freeze");
            if let Err(err) = self.inner.store.save(PersistedFlag::cleared()) {
                tracing::warn!(
                    error = %err,
                    store = self.inner.store.name(),
                    "failed to clear persisted freeze flag after recovery"
                );
            }
        }
    }
}

impl fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heartbeat")
            .field("beats", &self.inner.beats.load(Ordering::Relaxed))
            .finish()
    }
}

struct Watcher {
    shutdown: Shutdown,
    thread: thread::JoinHandle<()>,
}

/// Watchdog for a main execution context.
///
/// Most hosts want exactly one, via [`FreezeDetector::shared`]; tests and
/// embedders with their own storage construct instances directly with
/// [`FreezeDetector::new`].
pub struct FreezeDetector {
    inner: Arc<WatchInner>,
    poll_interval: Duration,
    enabled: AtomicBool,
    last_session_ended_frozen: bool,
    watcher: Mutex<Option<Watcher>>,
}

impl FreezeDetector {
    /// Create a detector over `store` and `sink`.
    ///
    /// Reads the durable flag first (that answer is frozen into
    /// [`last_session_ended_frozen`]), clears it for the new session, and
    /// (unless `config.enabled` is off) starts monitoring before returning.
    ///
    /// [`last_session_ended_frozen`]: FreezeDetector::last_session_ended_frozen
    #[must_use]
    pub fn new(
        config: FreezeDetectorConfig,
        store: Arc<dyn FlagStore>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let prior = store.load().unwrap_or_else(|err| {
            tracing::warn!(
                error = %err,
                store = store.name(),
                "failed to read persisted freeze flag; assuming a clean previous session"
            );
            PersistedFlag::cleared()
        });
        if prior.frozen {
            tracing::info!(
                raised_at_unix_ms = ?prior.raised_at_unix_ms,
                "previous session ended with the main thread frozen"
            );
            if let Err(err) = store.save(PersistedFlag::cleared()) {
                tracing::warn!(error = %err, "failed to clear freeze flag at session start");
            }
        }

        let inner = Arc::new(WatchInner {
            epoch: Instant::now(),
            last_beat_ms: AtomicU64::new(0),
            beats: AtomicU64::new(0),
            frozen: AtomicBool::new(false),
            reported: AtomicBool::new(false),
            session_started_at: SystemTime::now(),
            timeout: config.timeout,
            store,
            sink,
        });
        let detector = Self {
            inner,
            poll_interval: config.poll_interval,
            enabled: AtomicBool::new(config.enabled),
            last_session_ended_frozen: prior.frozen,
            watcher: Mutex::new(None),
        };
        if config.enabled {
            detector.start();
        }
        detector
    }

    /// The process-wide detector, created with default config on first
    /// access and monitoring from that moment.
    ///
    /// The default durable store is a [`FileFlagStore`] under the system temp
    /// directory (with the `file-store` feature; in-memory otherwise). Hosts
    /// that care about the flag surviving temp cleanup should call
    /// [`init_shared`] with a path in their own data directory before the
    /// first `shared()` access.
    ///
    /// [`FileFlagStore`]: crate::flag_store::FileFlagStore
    /// [`init_shared`]: FreezeDetector::init_shared
    pub fn shared() -> &'static FreezeDetector {
        SHARED.get_or_init(|| {
            FreezeDetector::new(
                FreezeDetectorConfig::default(),
                default_store(),
                Arc::new(LogReportSink),
            )
        })
    }

    /// Install the process-wide detector with explicit config, store, and
    /// sink.
    ///
    /// A no-op if the shared detector already exists (the arguments are
    /// dropped and a warning is logged); call before the first
    /// [`shared`] access.
    ///
    /// [`shared`]: FreezeDetector::shared
    pub fn init_shared(
        config: FreezeDetectorConfig,
        store: Arc<dyn FlagStore>,
        sink: Arc<dyn ReportSink>,
    ) -> &'static FreezeDetector {
        let mut installed = false;
        let detector = SHARED.get_or_init(|| {
            installed = true;
            FreezeDetector::new(config, store, sink)
        });
        if !installed {
            tracing::warn!("shared freeze detector already initialized; init_shared ignored");
        }
        detector
    }

    /// Whether the previous session's process went away while the main
    /// thread was frozen. Computed from durable storage at construction,
    /// before any probing in this session.
    #[must_use]
    pub fn last_session_ended_frozen(&self) -> bool {
        self.last_session_ended_frozen
    }

    /// A heartbeat handle for the monitored context.
    #[must_use]
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Begin probing. No-op while disabled or already monitoring.
    pub fn start(&self) {
        if !self.enabled.load(Ordering::Acquire) {
            tracing::debug!("freeze detector start ignored while disabled");
            return;
        }
        let mut guard = self.watcher.lock().unwrap();
        if guard.is_some() {
            return;
        }
        // A gap while stopped is not a freeze; restart the clock.
        self.inner.stamp();
        let shutdown = Shutdown::new();
        let thread_shutdown = shutdown.clone();
        let inner = Arc::clone(&self.inner);
        let poll_interval = self.poll_interval;
        let spawned = thread::Builder::new()
            .name("scrim-freeze-watchdog".into())
            .spawn(move || watch_loop(&inner, poll_interval, &thread_shutdown));
        match spawned {
            Ok(thread) => {
                tracing::debug!(
                    timeout_ms = self.inner.timeout.as_millis() as u64,
                    poll_ms = poll_interval.as_millis() as u64,
                    "freeze watcher started"
                );
                *guard = Some(Watcher { shutdown, thread });
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn freeze watcher thread");
            }
        }
    }

    /// Halt probing and join the watcher. Does not clear the persisted flag.
    pub fn stop(&self) {
        let watcher = self.watcher.lock().unwrap().take();
        if let Some(watcher) = watcher {
            watcher.shutdown.signal();
            if watcher.thread.join().is_err() {
                tracing::error!("freeze watcher thread panicked");
            }
            tracing::debug!("freeze watcher stopped");
        }
    }

    /// Toggle the monitoring gate, starting or stopping the watcher to
    /// match.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        if enabled {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Whether the monitoring gate is open.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Whether a watcher thread is currently running.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.watcher.lock().unwrap().is_some()
    }
}

impl Drop for FreezeDetector {
    fn drop(&mut self) {
        // Join the watcher so nothing is captured after the detector is gone.
        self.stop();
    }
}

impl fmt::Debug for FreezeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreezeDetector")
            .field("enabled", &self.is_enabled())
            .field("monitoring", &self.is_monitoring())
            .field("timeout", &self.inner.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("last_session_ended_frozen", &self.last_session_ended_frozen)
            .finish()
    }
}

static SHARED: OnceLock<FreezeDetector> = OnceLock::new();

fn default_store() -> Arc<dyn FlagStore> {
    #[cfg(feature = "file-store")]
    {
        Arc::new(FileFlagStore::new(
            std::env::temp_dir().join("scrim-freeze-flag.json"),
        ))
    }
    #[cfg(not(feature = "file-store"))]
    {
        Arc::new(MemoryFlagStore::new())
    }
}

fn unix_ms(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn watch_loop(inner: &WatchInner, poll_interval: Duration, shutdown: &Shutdown) {
    crate::debug_trace!(
        "freeze watcher running: timeout={:?} poll={:?}",
        inner.timeout,
        poll_interval
    );
    loop {
        if shutdown.wait_timeout(poll_interval) {
            break;
        }
        let last_ms = inner.last_beat_ms.load(Ordering::Acquire);
        let stalled = Duration::from_millis(inner.now_ms().saturating_sub(last_ms));
        crate::debug_trace!("watcher tick: stalled={:?}", stalled);
        if stalled < inner.timeout {
            continue;
        }
        if inner.frozen.load(Ordering::Acquire) {
            // Same freeze as the last tick; the flag is already raised.
            continue;
        }
        let raised = PersistedFlag::raised(unix_ms(SystemTime::now()));
        if let Err(err) = inner.store.save(raised) {
            tracing::warn!(
                error = %err,
                store = inner.store.name(),
                "failed to persist freeze flag; skipping report capture"
            );
            continue;
        }
        inner.frozen.store(true, Ordering::Release);
        if !inner.reported.swap(true, Ordering::AcqRel) {
            let report = FreezeReport {
                detected_at: SystemTime::now(),
                stalled_for: stalled,
                session_started_at: inner.session_started_at,
                beats_observed: inner.beats.load(Ordering::Relaxed),
            };
            tracing::error!(
                stalled_ms = stalled.as_millis() as u64,
                "main thread missed the heartbeat timeout"
            );
            inner.sink.capture(&report);
        }
    }
    crate::debug_trace!("freeze watcher exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag_store::{MemoryFlagStore, StoreError, StoreResult};

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<FreezeReport>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.reports.lock().unwrap().len()
        }
    }

    impl ReportSink for RecordingSink {
        fn capture(&self, report: &FreezeReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    /// Store whose saves always fail, for the degradation path.
    struct BrokenStore;

    impl FlagStore for BrokenStore {
        fn name(&self) -> &str {
            "BrokenStore"
        }

        fn load(&self) -> StoreResult<PersistedFlag> {
            Ok(PersistedFlag::cleared())
        }

        fn save(&self, _flag: PersistedFlag) -> StoreResult<()> {
            Err(StoreError::Unavailable("write path gone".into()))
        }
    }

    fn fast_config() -> FreezeDetectorConfig {
        FreezeDetectorConfig::default()
            .with_timeout(Duration::from_millis(40))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn heartbeat_keeps_the_session_clean() {
        let store = Arc::new(MemoryFlagStore::new());
        let sink = Arc::new(RecordingSink::default());
        // Generous timeout relative to the beat cadence so scheduler hiccups
        // on busy CI machines do not read as freezes.
        let config = FreezeDetectorConfig::default()
            .with_timeout(Duration::from_millis(150))
            .with_poll_interval(Duration::from_millis(25));
        let detector = FreezeDetector::new(config, store.clone(), sink.clone());

        let heartbeat = detector.heartbeat();
        for _ in 0..15 {
            heartbeat.beat();
            thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(sink.count(), 0);
        assert!(!store.load().expect("memory load succeeds").frozen);
    }

    #[test]
    fn missed_heartbeats_raise_the_flag_and_report_once() {
        let store = Arc::new(MemoryFlagStore::new());
        let sink = Arc::new(RecordingSink::default());
        let detector = FreezeDetector::new(fast_config(), store.clone(), sink.clone());
        let _heartbeat = detector.heartbeat();

        // Several timeout windows pass with no beat at all.
        thread::sleep(Duration::from_millis(200));

        assert!(store.load().expect("memory load succeeds").frozen);
        assert_eq!(sink.count(), 1, "repeated timeouts must not re-capture");
    }

    #[test]
    fn recovery_clears_the_flag_but_not_the_report_latch() {
        let store = Arc::new(MemoryFlagStore::new());
        let sink = Arc::new(RecordingSink::default());
        let detector = FreezeDetector::new(fast_config(), store.clone(), sink.clone());
        let heartbeat = detector.heartbeat();

        thread::sleep(Duration::from_millis(120));
        assert!(store.load().expect("memory load succeeds").frozen);

        heartbeat.beat();
        assert!(!store.load().expect("memory load succeeds").frozen, "recovery clears the flag");

        // A second freeze re-raises the flag but captures no second report.
        thread::sleep(Duration::from_millis(120));
        assert!(store.load().expect("memory load succeeds").frozen);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn store_failure_suppresses_report_capture() {
        let sink = Arc::new(RecordingSink::default());
        let detector = FreezeDetector::new(fast_config(), Arc::new(BrokenStore), sink.clone());
        let _heartbeat = detector.heartbeat();

        thread::sleep(Duration::from_millis(150));

        assert_eq!(sink.count(), 0, "capture must be skipped when the flag cannot persist");
        assert!(detector.is_monitoring(), "the detector itself must keep running");
    }

    #[test]
    fn stop_halts_probing_without_clearing_the_flag() {
        let store = Arc::new(MemoryFlagStore::new());
        let sink = Arc::new(RecordingSink::default());
        let detector = FreezeDetector::new(fast_config(), store.clone(), sink.clone());

        thread::sleep(Duration::from_millis(120));
        assert!(store.load().expect("memory load succeeds").frozen);

        detector.stop();
        assert!(!detector.is_monitoring());
        assert!(store.load().expect("memory load succeeds").frozen, "stop must not clear the flag");
    }

    #[test]
    fn disabled_construction_does_not_monitor() {
        let detector = FreezeDetector::new(
            fast_config().with_enabled(false),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(RecordingSink::default()),
        );
        assert!(!detector.is_monitoring());

        detector.start();
        assert!(!detector.is_monitoring(), "start is gated while disabled");
    }

    #[test]
    fn set_enabled_toggles_monitoring() {
        let detector = FreezeDetector::new(
            fast_config().with_enabled(false),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(RecordingSink::default()),
        );

        detector.set_enabled(true);
        assert!(detector.is_monitoring());

        detector.set_enabled(false);
        assert!(!detector.is_monitoring());
    }

    #[test]
    fn prior_session_flag_is_read_before_any_probing() {
        let store = Arc::new(MemoryFlagStore::with_flag(PersistedFlag::raised(42)));
        let detector = FreezeDetector::new(
            fast_config().with_enabled(false),
            store.clone(),
            Arc::new(RecordingSink::default()),
        );

        assert!(detector.last_session_ended_frozen());
        assert!(!detector.is_monitoring(), "no monitoring was needed for the answer");
        assert!(
            !store.load().expect("memory load succeeds").frozen,
            "the flag is cleared for the new session"
        );
    }

    #[test]
    fn clean_prior_session_reads_false() {
        let detector = FreezeDetector::new(
            fast_config().with_enabled(false),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(RecordingSink::default()),
        );
        assert!(!detector.last_session_ended_frozen());
    }

    #[test]
    fn unreadable_store_is_treated_as_clean() {
        struct UnreadableStore;
        impl FlagStore for UnreadableStore {
            fn name(&self) -> &str {
                "UnreadableStore"
            }
            fn load(&self) -> StoreResult<PersistedFlag> {
                Err(StoreError::Corruption("scrambled".into()))
            }
            fn save(&self, _flag: PersistedFlag) -> StoreResult<()> {
                Ok(())
            }
        }

        let detector = FreezeDetector::new(
            fast_config().with_enabled(false),
            Arc::new(UnreadableStore),
            Arc::new(RecordingSink::default()),
        );
        assert!(!detector.last_session_ended_frozen());
    }

    #[test]
    fn drop_joins_the_watcher() {
        let detector = FreezeDetector::new(
            fast_config(),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(RecordingSink::default()),
        );
        assert!(detector.is_monitoring());
        drop(detector);
    }
}
