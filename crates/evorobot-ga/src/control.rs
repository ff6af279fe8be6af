use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct ControlState {
    stopped: bool,
    step_by_step: bool,
    ticket: u64,
}

/// Stop latch and step-by-step gate shared between a running evolution and
/// its controllers.
///
/// The evolution calls [`StepControl::commit_step`] at every commit point.
/// With step-by-step enabled that call blocks until another thread calls
/// [`StepControl::do_next_step`], [`StepControl::stop`] or disables
/// step-by-step.
#[derive(Debug, Default)]
pub struct StepControl {
    state: Mutex<ControlState>,
    wake: Condvar,
}

impl StepControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for permission to go on when stepping, then reports whether
    /// the evolution has been asked to stop.
    pub fn commit_step(&self) -> bool {
        let state = self.lock();
        if !state.step_by_step || state.stopped {
            return state.stopped;
        }
        let ticket = state.ticket;
        let state = self
            .wake
            .wait_while(state, |s| s.step_by_step && !s.stopped && s.ticket == ticket)
            .unwrap_or_else(PoisonError::into_inner);
        state.stopped
    }

    /// Latches the stop request and releases every waiting commit point.
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.wake.notify_all();
    }

    pub fn reset_stop(&self) {
        self.lock().stopped = false;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Turns step-by-step execution on or off; turning it off releases any
    /// waiting commit point.
    pub fn enable_step_by_step(&self, enable: bool) {
        self.lock().step_by_step = enable;
        if !enable {
            self.wake.notify_all();
        }
    }

    #[must_use]
    pub fn is_step_by_step_enabled(&self) -> bool {
        self.lock().step_by_step
    }

    /// Releases the commit points currently waiting.
    pub fn do_next_step(&self) {
        let mut state = self.lock();
        state.ticket = state.ticket.wrapping_add(1);
        drop(state);
        self.wake.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    const SETTLE: Duration = Duration::from_millis(100);

    #[test]
    fn test_free_running_never_blocks() {
        let control = StepControl::new();
        assert!(!control.commit_step());
        control.stop();
        assert!(control.commit_step());
        assert!(control.is_stopped());
        control.reset_stop();
        assert!(!control.is_stopped());
    }

    #[test]
    fn test_one_step_per_ticket() {
        let control = Arc::new(StepControl::new());
        control.enable_step_by_step(true);
        let passed = Arc::new(AtomicUsize::new(0));

        let worker = {
            let control = Arc::clone(&control);
            let passed = Arc::clone(&passed);
            thread::spawn(move || {
                for _ in 0..2 {
                    if control.commit_step() {
                        break;
                    }
                    passed.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        thread::sleep(SETTLE);
        assert_eq!(passed.load(Ordering::SeqCst), 0);

        control.do_next_step();
        thread::sleep(SETTLE);
        assert_eq!(passed.load(Ordering::SeqCst), 1);

        control.do_next_step();
        worker.join().unwrap();
        assert_eq!(passed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_and_disable_release_waiters() {
        let control = Arc::new(StepControl::new());
        control.enable_step_by_step(true);

        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.commit_step())
        };
        thread::sleep(SETTLE);
        control.stop();
        assert!(waiter.join().unwrap());

        control.reset_stop();
        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.commit_step())
        };
        thread::sleep(SETTLE);
        control.enable_step_by_step(false);
        assert!(!waiter.join().unwrap());
        assert!(!control.is_step_by_step_enabled());
    }
}
