//! Renderer Control

use super::{RendererState, Timer};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Thread-safe handle on a renderer's lifecycle state. Owned by each
/// renderer instance, so independent renders never share state.
///
/// The state mutex is only ever held for a few instructions; it is never
/// held across a barrier or while tracing.
#[derive(Debug, Default)]
pub struct RendererControl {
    /// Current state.
    state: Mutex<RendererState>,

    /// Signalled on every state change.
    state_changed: Condvar,

    /// Elapsed rendering time; stopped while paused.
    timer: Mutex<Timer>,
}

impl RendererControl {
    /// Create a new control handle in the `Init` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> RendererState {
        *self.lock_state()
    }

    /// Enter `Run` at the start of a render. Returns false when the renderer
    /// was already terminated, in which case nothing must be rendered.
    pub fn begin(&self) -> bool {
        let mut state = self.lock_state();
        match *state {
            RendererState::Terminate => false,
            RendererState::Pause => {
                // Paused before the workers started; they park at their
                // first checkpoint.
                self.lock_timer().reset();
                true
            }
            _ => {
                *state = RendererState::Run;
                let mut timer = self.lock_timer();
                timer.reset();
                timer.start();
                self.state_changed.notify_all();
                true
            }
        }
    }

    /// Move from `Init` or `Run` to `Pause`. Idempotent; ignored once
    /// terminated.
    pub fn pause(&self) {
        let mut state = self.lock_state();
        match *state {
            RendererState::Init | RendererState::Run => {
                *state = RendererState::Pause;
                self.lock_timer().stop();
                self.state_changed.notify_all();
            }
            RendererState::Pause | RendererState::Terminate => {}
        }
    }

    /// Move from `Pause` to `Run`. Ignored in any other state.
    pub fn resume(&self) {
        let mut state = self.lock_state();
        if *state == RendererState::Pause {
            *state = RendererState::Run;
            self.lock_timer().start();
            self.state_changed.notify_all();
        }
    }

    /// Move to `Terminate`. Idempotent and irreversible.
    pub fn terminate(&self) {
        let mut state = self.lock_state();
        if *state != RendererState::Terminate {
            *state = RendererState::Terminate;
            self.lock_timer().stop();
            self.state_changed.notify_all();
        }
    }

    /// Block while the state is `Pause`. Returns the state that ended the
    /// wait (`Run`, `Init` or `Terminate`).
    pub fn wait_while_paused(&self) -> RendererState {
        let mut state = self.lock_state();
        while *state == RendererState::Pause {
            state = self
                .state_changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *state
    }

    /// Block until the state is `Terminate` or the timeout elapses. Returns
    /// the current state.
    ///
    /// * `timeout` - Maximum time to wait.
    pub fn wait_for_terminate(&self, timeout: Duration) -> RendererState {
        let state = self.lock_state();
        let (state, _) = self
            .state_changed
            .wait_timeout_while(state, timeout, |s| *s != RendererState::Terminate)
            .unwrap_or_else(PoisonError::into_inner);
        *state
    }

    /// Returns the elapsed rendering time, excluding paused periods.
    pub fn elapsed(&self) -> Duration {
        self.lock_timer().time()
    }

    fn lock_state(&self) -> MutexGuard<'_, RendererState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lifecycle_transitions() {
        let c = RendererControl::new();
        assert_eq!(c.state(), RendererState::Init);
        assert!(c.begin());
        assert_eq!(c.state(), RendererState::Run);

        c.pause();
        assert_eq!(c.state(), RendererState::Pause);
        c.resume();
        assert_eq!(c.state(), RendererState::Run);

        c.terminate();
        assert_eq!(c.state(), RendererState::Terminate);
    }

    #[test]
    fn pause_and_terminate_are_idempotent() {
        let c = RendererControl::new();
        c.begin();
        c.pause();
        c.pause();
        assert_eq!(c.state(), RendererState::Pause);

        c.terminate();
        c.terminate();
        assert_eq!(c.state(), RendererState::Terminate);
    }

    #[test]
    fn terminate_is_irreversible() {
        let c = RendererControl::new();
        c.begin();
        c.terminate();
        c.resume();
        c.pause();
        assert!(!c.begin());
        assert_eq!(c.state(), RendererState::Terminate);
    }

    #[test]
    fn resume_without_pause_is_ignored() {
        let c = RendererControl::new();
        c.resume();
        assert_eq!(c.state(), RendererState::Init);
    }

    #[test]
    fn terminate_wakes_paused_waiters() {
        let c = Arc::new(RendererControl::new());
        c.begin();
        c.pause();

        let waiter = {
            let c = Arc::clone(&c);
            thread::spawn(move || c.wait_while_paused())
        };
        thread::sleep(Duration::from_millis(20));
        c.terminate();
        assert_eq!(waiter.join().unwrap(), RendererState::Terminate);
    }

    #[test]
    fn paused_time_is_not_counted() {
        let c = RendererControl::new();
        c.begin();
        c.pause();
        let at_pause = c.elapsed();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(c.elapsed(), at_pause);
    }

    #[test]
    fn wait_for_terminate_times_out() {
        let c = RendererControl::new();
        c.begin();
        assert_eq!(c.wait_for_terminate(Duration::from_millis(10)), RendererState::Run);
        c.terminate();
        assert_eq!(
            c.wait_for_terminate(Duration::from_millis(10)),
            RendererState::Terminate
        );
    }
}
