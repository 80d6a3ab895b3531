//! Lifecycle of the single repeating autoscroll timer.

use std::time::Duration;

use log::debug;

use super::EngineError;

/// A host facility that can schedule one repeating tick.
///
/// Each live handle corresponds to one registered repeating timer whose fires
/// are delivered to the engine as [`Message::Tick`](super::Message::Tick).
pub trait TickSource {
    type Handle;

    /// Registers a timer firing every `period`, first fire one period from now.
    fn arm(&mut self, period: Duration) -> Result<Self::Handle, EngineError>;

    /// Unregisters a live timer. No fire may be delivered for it afterwards.
    fn disarm(&mut self, handle: Self::Handle);

    /// Releases a timer that is unregistering itself from inside its own fire.
    fn retire(&mut self, handle: Self::Handle) {
        drop(handle);
    }
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Owns at most one live timer handle.
pub struct TimerController<T: TickSource> {
    source: T,
    period: Duration,
    live: Option<T::Handle>,
}

impl<T: TickSource> TimerController<T> {
    pub fn new(source: T, period: Duration) -> Self {
        Self {
            source,
            period,
            live: None,
        }
    }

    pub fn state(&self) -> TimerState {
        if self.live.is_some() {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    /// Starts the timer unless it is already running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.live.is_some() {
            return Ok(());
        }
        self.live = Some(self.source.arm(self.period)?);
        debug!("Autoscroll timer started ({:?} period)", self.period);
        Ok(())
    }

    /// Stops and releases the timer. Stopping a stopped timer is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.live.take() {
            self.source.disarm(handle);
            debug!("Autoscroll timer stopped");
        }
    }

    /// Releases the timer from inside one of its own fires.
    pub(super) fn retire(&mut self) {
        if let Some(handle) = self.live.take() {
            self.source.retire(handle);
            debug!("Autoscroll timer retired itself");
        }
    }
}

impl<T: TickSource> Drop for TimerController<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts arms, disarms and retires; `live()` is the number of timers registered.
    #[derive(Clone, Default)]
    pub struct CountingTicks {
        pub armed: Rc<Cell<usize>>,
        pub disarmed: Rc<Cell<usize>>,
        pub retired: Rc<Cell<usize>>,
        pub fail_next: Rc<Cell<bool>>,
    }

    impl CountingTicks {
        pub fn live(&self) -> usize {
            self.armed.get() - self.disarmed.get() - self.retired.get()
        }
    }

    impl TickSource for CountingTicks {
        type Handle = usize;

        fn arm(&mut self, _period: Duration) -> Result<usize, EngineError> {
            if self.fail_next.replace(false) {
                return Err(EngineError::Timer("scripted failure".into()));
            }
            self.armed.set(self.armed.get() + 1);
            Ok(self.armed.get())
        }

        fn disarm(&mut self, _handle: usize) {
            self.disarmed.set(self.disarmed.get() + 1);
        }

        fn retire(&mut self, _handle: usize) {
            self.retired.set(self.retired.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CountingTicks;
    use super::*;

    fn controller() -> (TimerController<CountingTicks>, CountingTicks) {
        let ticks = CountingTicks::default();
        (
            TimerController::new(ticks.clone(), Duration::from_millis(16)),
            ticks,
        )
    }

    #[test]
    fn double_start_keeps_one_live_timer() {
        let (mut timer, ticks) = controller();
        timer.start().unwrap();
        timer.start().unwrap();
        assert_eq!(ticks.armed.get(), 1);
        assert_eq!(ticks.live(), 1);
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn double_stop_is_harmless() {
        let (mut timer, ticks) = controller();
        timer.start().unwrap();
        timer.stop();
        timer.stop();
        assert_eq!(ticks.disarmed.get(), 1);
        assert_eq!(ticks.live(), 0);
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn stop_without_start_is_noop() {
        let (mut timer, ticks) = controller();
        timer.stop();
        assert_eq!(ticks.disarmed.get(), 0);
    }

    #[test]
    fn retire_releases_without_disarming() {
        let (mut timer, ticks) = controller();
        timer.start().unwrap();
        timer.retire();
        assert_eq!(ticks.retired.get(), 1);
        assert_eq!(ticks.disarmed.get(), 0);
        assert_eq!(ticks.live(), 0);
    }

    #[test]
    fn failed_arm_leaves_controller_stopped() {
        let (mut timer, ticks) = controller();
        ticks.fail_next.set(true);
        assert!(timer.start().is_err());
        assert_eq!(timer.state(), TimerState::Stopped);

        timer.start().unwrap();
        assert_eq!(ticks.live(), 1);
    }

    #[test]
    fn drop_releases_live_timer() {
        let (mut timer, ticks) = controller();
        timer.start().unwrap();
        drop(timer);
        assert_eq!(ticks.live(), 0);
    }
}
