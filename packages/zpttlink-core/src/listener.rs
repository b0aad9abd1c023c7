//! PttListener - owns the sampling loop
//!
//! One listener drives one line source: every tick it reads the modem lines,
//! feeds the debouncer and dispatches any confirmed transition before
//! sleeping again. Stopping is cooperative (checked once per tick) and the
//! loop always releases a held key on its way out.
//!
//! Lifecycle: `Idle` (built) -> `Running` (`start`) -> `Stopping`
//! (`request_stop`, or a fatal loop error) -> `Stopped`.

use crate::debounce::{DebounceConfig, Debouncer};
use crate::dispatch::Dispatcher;
use crate::error::{PttError, Result};
use crate::inject::KeyInjector;
use crate::keys::{Hotkey, DEFAULT_HOTKEY};
use crate::lines::LineSource;
use crate::serial::{SerialPort, SerialSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_TICK: Duration = Duration::from_millis(5);

/// Consecutive failed reads tolerated before the loop gives up.
pub const MAX_CONSECUTIVE_READ_ERRORS: u32 = 20;

/// Configuration for a PttListener
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub debounce: DebounceConfig,

    /// Sampling period. Should be at most half the shortest debounce delay.
    pub tick: Duration,

    /// Key pressed while PTT is down
    pub hotkey: Hotkey,

    pub max_read_errors: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            tick: DEFAULT_TICK,
            hotkey: DEFAULT_HOTKEY,
            max_read_errors: MAX_CONSECUTIVE_READ_ERRORS,
        }
    }
}

impl ListenerConfig {
    /// Reject unusable settings and warn about coarse ones.
    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(PttError::InvalidConfig("sampling tick must be non-zero".into()));
        }
        if self.max_read_errors == 0 {
            return Err(PttError::InvalidConfig("max_read_errors must be at least 1".into()));
        }
        let min_delay = self.debounce.min_delay();
        if !min_delay.is_zero() && self.tick > min_delay / 2 {
            tracing::warn!(
                tick_ms = self.tick.as_millis() as u64,
                min_delay_ms = min_delay.as_millis() as u64,
                "sampling tick is coarser than half the debounce delay"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `request_stop` / `stop` was called
    Requested,
    /// The loop hit an unrecoverable error
    Fatal(String),
}

/// What happened during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub reason: StopReason,
    /// A held key was released because the loop ended while PTT was down
    pub forced_release: bool,
    /// Transitions dispatched over the listener's lifetime, forced release included
    pub transitions: u64,
}

/// A listener that has not been started yet.
pub struct PttListener<S, I> {
    config: ListenerConfig,
    source: S,
    injector: I,
}

impl<I: KeyInjector + 'static> PttListener<SerialPort, I> {
    /// Open the serial port and build a listener on it.
    ///
    /// Fails with `PortUnavailable` before anything is spawned.
    pub fn open(settings: &SerialSettings, config: ListenerConfig, injector: I) -> Result<Self> {
        config.validate()?;
        let source = SerialPort::open(settings)?;
        Ok(Self {
            config,
            source,
            injector,
        })
    }
}

impl<S, I> PttListener<S, I>
where
    S: LineSource + 'static,
    I: KeyInjector + 'static,
{
    /// Build a listener on an already open source. Fails on an invalid config.
    pub fn new(config: ListenerConfig, source: S, injector: I) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            injector,
        })
    }

    /// Spawn the sampling loop on the current tokio runtime.
    pub fn start(self) -> ListenerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let (status_tx, _) = watch::channel(ListenerStatus::Running);
        let status = Arc::new(status_tx);

        let dispatcher = Dispatcher::new(self.injector, self.config.hotkey);
        let task = tokio::spawn(run_loop(
            self.source,
            dispatcher,
            self.config,
            stop.clone(),
            status.clone(),
        ));

        ListenerHandle {
            stop,
            status,
            task: Some(task),
        }
    }
}

/// Handle to a running listener.
///
/// Dropping the handle asks the loop to stop but does not wait for it;
/// use [`ListenerHandle::stop`] for a deterministic shutdown.
pub struct ListenerHandle {
    stop: Arc<AtomicBool>,
    status: Arc<watch::Sender<ListenerStatus>>,
    task: Option<JoinHandle<StopReport>>,
}

impl ListenerHandle {
    pub fn status(&self) -> ListenerStatus {
        *self.status.borrow()
    }

    /// Ask the loop to stop at its next tick. Does not wait.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.status.send_if_modified(|status| {
            if *status == ListenerStatus::Running {
                *status = ListenerStatus::Stopping;
                true
            } else {
                false
            }
        });
    }

    /// Resolve once the loop has terminated, for whatever reason.
    pub async fn wait_stopped(&self) {
        let mut rx = self.status.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|status| *status == ListenerStatus::Stopped).await;
    }

    /// Stop the loop and wait for it, including the final key release.
    pub async fn stop(mut self) -> StopReport {
        self.request_stop();
        let report = match self.task.take() {
            Some(task) => match task.await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "listener task did not finish cleanly");
                    StopReport {
                        reason: StopReason::Fatal(format!("listener task failed: {}", e)),
                        forced_release: false,
                        transitions: 0,
                    }
                }
            },
            None => StopReport {
                reason: StopReason::Requested,
                forced_release: false,
                transitions: 0,
            },
        };
        self.status.send_replace(ListenerStatus::Stopped);
        report
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

async fn run_loop<S, I>(
    mut source: S,
    mut dispatcher: Dispatcher<I>,
    config: ListenerConfig,
    stop: Arc<AtomicBool>,
    status: Arc<watch::Sender<ListenerStatus>>,
) -> StopReport
where
    S: LineSource,
    I: KeyInjector,
{
    let mut debouncer = Debouncer::new(config.debounce);
    let mut read_errors: u32 = 0;

    tracing::info!(
        source = %source.describe(),
        key = %config.hotkey,
        injector = dispatcher.injector().name(),
        tick_ms = config.tick.as_millis() as u64,
        "PTT listener started"
    );

    let reason = loop {
        if stop.load(Ordering::SeqCst) {
            break StopReason::Requested;
        }

        match source.read_lines() {
            Ok(sample) => {
                read_errors = 0;
                let now = Instant::now().into_std();
                if let Some(transition) = debouncer.sample(sample.is_asserted(), now) {
                    if let Err(e) = dispatcher.dispatch(transition) {
                        tracing::error!(error = %e, "key injection failed; key state may not match PTT");
                    }
                }
            }
            Err(e) => {
                read_errors += 1;
                let err = PttError::ReadError(e);
                if read_errors >= config.max_read_errors {
                    tracing::error!(error = %err, attempts = read_errors, "giving up on line source");
                    break StopReason::Fatal(format!(
                        "{} consecutive read errors, last: {}",
                        read_errors, err
                    ));
                }
                tracing::warn!(error = %err, attempts = read_errors, "skipping tick");
            }
        }

        tokio::time::sleep(config.tick).await;
    };

    status.send_if_modified(|s| {
        if *s == ListenerStatus::Running {
            *s = ListenerStatus::Stopping;
            true
        } else {
            false
        }
    });

    let forced_release = match debouncer.force_up(Instant::now().into_std()) {
        Some(transition) => {
            tracing::warn!("listener stopping with PTT down; forcing key release");
            if let Err(e) = dispatcher.dispatch(transition) {
                tracing::error!(error = %e, "forced key release failed");
            }
            true
        }
        None => false,
    };

    source.close();

    tracing::info!(
        forced_release,
        transitions = dispatcher.dispatched(),
        "PTT listener stopped"
    );
    status.send_replace(ListenerStatus::Stopped);

    StopReport {
        reason,
        forced_release,
        transitions: dispatcher.dispatched(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::LineSample;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Step {
        Line(bool),
        Fail,
    }

    /// Plays back a script of reads, then repeats `tail` forever.
    struct ScriptedSource {
        script: VecDeque<Step>,
        tail: Step,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Step>, tail: Step) -> Self {
            Self {
                script: script.into(),
                tail,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl LineSource for ScriptedSource {
        fn read_lines(&mut self) -> io::Result<LineSample> {
            match self.script.pop_front().unwrap_or(self.tail) {
                Step::Line(down) => Ok(LineSample::new(down, false, false)),
                Step::Fail => Err(io::Error::new(io::ErrorKind::Other, "device unplugged")),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingInjector {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail_press: bool,
        fail_release: bool,
    }

    impl RecordingInjector {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl KeyInjector for RecordingInjector {
        fn press(&mut self, key: Hotkey) -> Result<()> {
            self.calls.lock().unwrap().push("press");
            if self.fail_press {
                return Err(PttError::InjectionFailed {
                    action: "press",
                    key: key.to_string(),
                    reason: "stub failure".into(),
                });
            }
            Ok(())
        }

        fn release(&mut self, key: Hotkey) -> Result<()> {
            self.calls.lock().unwrap().push("release");
            if self.fail_release {
                return Err(PttError::InjectionFailed {
                    action: "release",
                    key: key.to_string(),
                    reason: "stub failure".into(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn lines(value: bool, n: usize) -> Vec<Step> {
        vec![Step::Line(value); n]
    }

    fn config() -> ListenerConfig {
        ListenerConfig {
            debounce: DebounceConfig::from_millis(30, 60),
            tick: Duration::from_millis(5),
            hotkey: Hotkey::F9,
            max_read_errors: 3,
        }
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn test_config_default() {
        let config = ListenerConfig::default();
        assert_eq!(config.tick, Duration::from_millis(5));
        assert_eq!(config.hotkey, Hotkey::F9);
        assert_eq!(config.max_read_errors, MAX_CONSECUTIVE_READ_ERRORS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_tick() {
        let config = ListenerConfig {
            tick: Duration::ZERO,
            ..ListenerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PttError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_refuses_zero_tick() {
        let config = ListenerConfig {
            tick: Duration::ZERO,
            ..config()
        };
        let source = ScriptedSource::new(vec![], Step::Line(false));
        let result = PttListener::new(config, source, RecordingInjector::default());
        assert!(matches!(result, Err(PttError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_then_forced_release_on_stop() {
        let injector = RecordingInjector::default();
        let mut script = lines(false, 10);
        script.extend(lines(true, 8));
        let source = ScriptedSource::new(script, Step::Line(true));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        assert_eq!(handle.status(), ListenerStatus::Running);

        settle(200).await;
        assert_eq!(injector.calls(), vec!["press"]);

        // raw line still asserted, release must happen anyway
        let report = handle.stop().await;
        assert_eq!(injector.calls(), vec!["press", "release"]);
        assert_eq!(report.reason, StopReason::Requested);
        assert!(report.forced_release);
        assert_eq!(report.transitions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stop_fires_nothing() {
        let injector = RecordingInjector::default();
        let source = ScriptedSource::new(vec![], Step::Line(false));
        let closed = source.closed.clone();

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(100).await;
        let report = handle.stop().await;

        assert!(injector.calls().is_empty());
        assert!(!report.forced_release);
        assert_eq!(report.transitions, 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_pulse_is_filtered() {
        let injector = RecordingInjector::default();
        let source = ScriptedSource::new(lines(true, 2), Step::Line(false));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(300).await;
        handle.stop().await;

        assert!(injector.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_press_and_release_cycle() {
        let injector = RecordingInjector::default();
        let mut script = lines(true, 10);
        script.extend(lines(false, 20));
        let source = ScriptedSource::new(script, Step::Line(false));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(300).await;
        let report = handle.stop().await;

        assert_eq!(injector.calls(), vec!["press", "release"]);
        assert!(!report.forced_release);
        assert_eq!(report.transitions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_forced_release_still_stops() {
        let injector = RecordingInjector {
            fail_release: true,
            ..Default::default()
        };
        let source = ScriptedSource::new(vec![], Step::Line(true));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(100).await;
        let report = handle.stop().await;

        assert_eq!(injector.calls(), vec!["press", "release"]);
        assert!(report.forced_release);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_press_keeps_loop_running() {
        let injector = RecordingInjector {
            fail_press: true,
            ..Default::default()
        };
        let mut script = lines(true, 10);
        script.extend(lines(false, 20));
        let source = ScriptedSource::new(script, Step::Line(true));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(300).await;

        // logical state went Down despite the failure, so the release still fires
        assert_eq!(handle.status(), ListenerStatus::Running);
        assert_eq!(injector.calls(), vec!["press", "release", "press"]);

        let report = handle.stop().await;
        assert_eq!(report.reason, StopReason::Requested);
        assert!(report.forced_release);
        assert_eq!(report.transitions, 4);
        assert_eq!(injector.calls(), vec!["press", "release", "press", "release"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_read_errors_are_skipped() {
        let injector = RecordingInjector::default();
        let script = vec![Step::Fail, Step::Fail, Step::Line(false), Step::Fail, Step::Fail];
        let source = ScriptedSource::new(script, Step::Line(true));

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        settle(200).await;
        assert_eq!(handle.status(), ListenerStatus::Running);

        let report = handle.stop().await;
        assert_eq!(report.reason, StopReason::Requested);
        assert_eq!(injector.calls(), vec!["press", "release"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_read_errors_are_fatal_and_release() {
        let injector = RecordingInjector::default();
        let source = ScriptedSource::new(lines(true, 10), Step::Fail);
        let closed = source.closed.clone();

        let handle = PttListener::new(config(), source, injector.clone()).unwrap().start();
        handle.wait_stopped().await;
        assert_eq!(handle.status(), ListenerStatus::Stopped);
        assert!(closed.load(Ordering::SeqCst));

        let report = handle.stop().await;
        assert!(matches!(report.reason, StopReason::Fatal(_)));
        assert!(report.forced_release);
        assert_eq!(injector.calls(), vec!["press", "release"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_stop_moves_to_stopping() {
        let source = ScriptedSource::new(vec![], Step::Line(false));
        let handle = PttListener::new(config(), source, RecordingInjector::default())
            .unwrap()
            .start();

        handle.request_stop();
        assert_eq!(handle.status(), ListenerStatus::Stopping);

        handle.wait_stopped().await;
        assert_eq!(handle.status(), ListenerStatus::Stopped);
    }
}
