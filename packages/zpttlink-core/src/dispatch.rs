//! Turns confirmed transitions into key events.

use crate::debounce::Transition;
use crate::error::Result;
use crate::inject::KeyInjector;
use crate::keys::Hotkey;

/// Calls the injector once per transition, logging the intent first.
pub struct Dispatcher<I> {
    injector: I,
    hotkey: Hotkey,
    dispatched: u64,
}

impl<I: KeyInjector> Dispatcher<I> {
    pub fn new(injector: I, hotkey: Hotkey) -> Self {
        Self {
            injector,
            hotkey,
            dispatched: 0,
        }
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Number of transitions dispatched so far, including failed injections.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Log the transition, then press or release the hotkey.
    ///
    /// Injection errors are returned to the caller. The transition still
    /// counts as dispatched: the logical state has already changed.
    pub fn dispatch(&mut self, transition: Transition) -> Result<()> {
        self.dispatched += 1;
        match transition {
            Transition::Down => {
                tracing::info!(key = %self.hotkey, "PTT DOWN -> key down");
                self.injector.press(self.hotkey)
            }
            Transition::Up => {
                tracing::info!(key = %self.hotkey, "PTT UP   -> key up");
                self.injector.release(self.hotkey)
            }
        }
    }
}
