//! One-shot timers driven by the update tick
//!
//! Timers never call back into the manager on their own. The manager advances
//! its [`TimerService`] once per update and acts on whatever fired.

use crate::window::WindowId;
use log::trace;
use std::fmt;
use std::time::Duration;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// What a timer does when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Close a hidden window whose hide-to-close delay ran out
    CloseWindow(WindowId),
}

/// A timer that came due during [`TimerService::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub action: TimerAction,
}

/// Schedules deferred actions
#[cfg_attr(test, mockall::automock)]
pub trait TimerService {
    /// Schedule `action` to fire once after `delay`
    fn schedule_once(&mut self, delay: Duration, action: TimerAction) -> TimerHandle;

    /// Cancel a pending timer. Returns `false` if it already fired or never existed.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Move time forward by `dt` and return the timers that came due, in due order
    fn advance(&mut self, dt: Duration) -> Vec<FiredTimer>;

    /// Number of timers still waiting to fire
    fn pending(&self) -> usize;
}

#[derive(Debug)]
struct Scheduled {
    handle: TimerHandle,
    /// `None` when the delay runs past the end of the clock; such timers never fire
    due: Option<Duration>,
    action: TimerAction,
}

/// Tick-driven [`TimerService`]
///
/// Time only moves when [`TimerService::advance`] is called, so timers fire on
/// the update thread and tests control the clock exactly.
#[derive(Debug, Default)]
pub struct FrameTimers {
    now: Duration,
    next_handle: u64,
    scheduled: Vec<Scheduled>,
}

impl FrameTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time accumulated through [`TimerService::advance`]
    pub fn elapsed(&self) -> Duration {
        self.now
    }
}

impl TimerService for FrameTimers {
    fn schedule_once(&mut self, delay: Duration, action: TimerAction) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        trace!("Scheduled {} in {:?} for {:?}", handle, delay, action);
        self.scheduled.push(Scheduled {
            handle,
            due: self.now.checked_add(delay),
            action,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.scheduled.len();
        self.scheduled.retain(|t| t.handle != handle);
        before != self.scheduled.len()
    }

    fn advance(&mut self, dt: Duration) -> Vec<FiredTimer> {
        self.now = self.now.saturating_add(dt);
        let now = self.now;

        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|t| t.due.is_some_and(|due| due <= now));
        self.scheduled = waiting;

        // Equal due times fire in scheduling order
        due.sort_by_key(|t| (t.due, t.handle));
        due.into_iter()
            .map(|t| FiredTimer {
                handle: t.handle,
                action: t.action,
            })
            .collect()
    }

    fn pending(&self) -> usize {
        self.scheduled.len()
    }
}
