//! Debounce state machine
//!
//! Turns the raw "any line asserted" sample stream into a clean PTT
//! down/up state. A raw change is only accepted once it has held for the
//! delay of its direction: `press_delay` for up->down, `release_delay` for
//! down->up. A raw change that reverts before its delay elapses is dropped
//! without producing a transition.

use std::time::{Duration, Instant};

pub const DEFAULT_PRESS_DELAY: Duration = Duration::from_millis(30);
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(60);

/// Debounced PTT state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalState {
    /// Receiving, hotkey released
    #[default]
    Up,
    /// Transmitting, hotkey held
    Down,
}

impl LogicalState {
    fn from_raw(raw_down: bool) -> Self {
        if raw_down {
            LogicalState::Down
        } else {
            LogicalState::Up
        }
    }

    #[inline]
    pub fn is_down(self) -> bool {
        self == LogicalState::Down
    }
}

/// A confirmed change of [`LogicalState`]. The variant is the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Down,
    Up,
}

impl From<Transition> for LogicalState {
    fn from(t: Transition) -> Self {
        match t {
            Transition::Down => LogicalState::Down,
            Transition::Up => LogicalState::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub press_delay: Duration,
    pub release_delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            press_delay: DEFAULT_PRESS_DELAY,
            release_delay: DEFAULT_RELEASE_DELAY,
        }
    }
}

impl DebounceConfig {
    pub fn from_millis(press_ms: u64, release_ms: u64) -> Self {
        Self {
            press_delay: Duration::from_millis(press_ms),
            release_delay: Duration::from_millis(release_ms),
        }
    }

    /// Hold time required before accepting a raw change towards `raw_down`.
    #[inline]
    pub fn required_delay(&self, raw_down: bool) -> Duration {
        if raw_down {
            self.press_delay
        } else {
            self.release_delay
        }
    }

    /// Shortest delay in either direction.
    pub fn min_delay(&self) -> Duration {
        self.press_delay.min(self.release_delay)
    }
}

/// Debouncer for a single PTT input.
#[derive(Debug, Clone)]
pub struct Debouncer {
    config: DebounceConfig,
    state: LogicalState,
    /// When the last transition was committed (None until the first one)
    last_change: Option<Instant>,
    /// First sample of the current run that disagrees with `state`
    candidate_since: Option<Instant>,
}

impl Debouncer {
    /// Start in the `Up` state. No transition is emitted for it.
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: LogicalState::Up,
            last_change: None,
            candidate_since: None,
        }
    }

    #[inline]
    pub fn state(&self) -> LogicalState {
        self.state
    }

    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    /// Feed one raw sample taken at `now`.
    ///
    /// Returns the transition if this sample confirms a state change.
    pub fn sample(&mut self, raw_down: bool, now: Instant) -> Option<Transition> {
        if LogicalState::from_raw(raw_down) == self.state {
            self.candidate_since = None;
            return None;
        }

        let since = *self.candidate_since.get_or_insert(now);
        let held = now.saturating_duration_since(since);
        if held < self.config.required_delay(raw_down) {
            return None;
        }

        Some(self.commit(LogicalState::from_raw(raw_down), now))
    }

    /// Force the state to `Up`, regardless of the raw line.
    ///
    /// Used on shutdown so a held key is always released. Returns `None` if
    /// already up.
    pub fn force_up(&mut self, now: Instant) -> Option<Transition> {
        if self.state == LogicalState::Up {
            return None;
        }
        Some(self.commit(LogicalState::Up, now))
    }

    fn commit(&mut self, state: LogicalState, now: Instant) -> Transition {
        self.state = state;
        self.last_change = Some(now);
        self.candidate_since = None;
        match state {
            LogicalState::Down => Transition::Down,
            LogicalState::Up => Transition::Up,
        }
    }
}
