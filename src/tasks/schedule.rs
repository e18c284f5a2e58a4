//! # Schedules, execution modes and strategies.
//!
//! A task's timing is a closed [`Schedule`]: run once now, run once after a delay,
//! or run repeatedly. All delays and periods are counted in host ticks.
//!
//! [`Schedule::from_parts`] resolves the four raw timing parts a task descriptor
//! usually carries:
//!
//! ```text
//! delay  = has_delay ? delay  : 0
//! period = repeating ? period : 0
//!
//! period != 0 → Periodic { delay, period }
//! delay  != 0 → Delayed  { delay }
//! otherwise   → Immediate
//! ```
//!
//! Together with the [`ExecutionMode`] this selects one of six [`Strategy`] values.

use std::fmt;

/// When a task runs, in host ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Schedule {
    /// Once, as soon as possible.
    #[default]
    Immediate,
    /// Once, after `delay` ticks.
    Delayed {
        /// Ticks to wait; never `0`.
        delay: u64,
    },
    /// Repeatedly, first after `delay` ticks and then every `period` ticks.
    Periodic {
        /// Ticks before the first run.
        delay: u64,
        /// Ticks between two runs; never `0`.
        period: u64,
    },
}

impl Schedule {
    /// Resolves raw descriptor parts into a schedule.
    ///
    /// # Example
    /// ```
    /// use tickwork::Schedule;
    ///
    /// assert_eq!(Schedule::from_parts(20, 0, true, false), Schedule::Delayed { delay: 20 });
    /// assert_eq!(Schedule::from_parts(20, 5, false, true), Schedule::Periodic { delay: 0, period: 5 });
    /// assert_eq!(Schedule::from_parts(20, 5, false, false), Schedule::Immediate);
    /// ```
    pub fn from_parts(delay: u64, period: u64, has_delay: bool, repeating: bool) -> Self {
        let delay = if has_delay { delay } else { 0 };
        let period = if repeating { period } else { 0 };

        if period != 0 {
            Schedule::Periodic { delay, period }
        } else if delay != 0 {
            Schedule::Delayed { delay }
        } else {
            Schedule::Immediate
        }
    }

    /// Ticks before the first run.
    pub fn delay(&self) -> u64 {
        match *self {
            Schedule::Immediate => 0,
            Schedule::Delayed { delay } | Schedule::Periodic { delay, .. } => delay,
        }
    }

    /// Ticks between runs, if repeating.
    pub fn period(&self) -> Option<u64> {
        match *self {
            Schedule::Periodic { period, .. } => Some(period),
            _ => None,
        }
    }

    /// True for [`Schedule::Periodic`].
    pub fn is_repeating(&self) -> bool {
        matches!(self, Schedule::Periodic { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Schedule::Immediate => "immediate",
            Schedule::Delayed { .. } => "delayed",
            Schedule::Periodic { .. } => "periodic",
        }
    }
}

/// Where a task body runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// On the host's tick thread, between ticks.
    #[default]
    TickThread,
    /// On a background worker thread.
    Background,
}

impl ExecutionMode {
    /// True for [`ExecutionMode::Background`].
    pub fn is_async(&self) -> bool {
        matches!(self, ExecutionMode::Background)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutionMode::TickThread => "tick_thread",
            ExecutionMode::Background => "background",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// The six ways a task can be bound to the host scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Run once on the tick thread.
    SyncImmediate,
    /// Run once on the tick thread after a delay.
    SyncDelayed,
    /// Repeat on the tick thread.
    SyncPeriodic,
    /// Run once in the background.
    AsyncImmediate,
    /// Run once in the background after a delay.
    AsyncDelayed,
    /// Repeat in the background.
    AsyncPeriodic,
}

impl Strategy {
    /// Selects the strategy for a schedule and mode.
    pub fn select(schedule: Schedule, mode: ExecutionMode) -> Self {
        match (mode, schedule) {
            (ExecutionMode::TickThread, Schedule::Immediate) => Strategy::SyncImmediate,
            (ExecutionMode::TickThread, Schedule::Delayed { .. }) => Strategy::SyncDelayed,
            (ExecutionMode::TickThread, Schedule::Periodic { .. }) => Strategy::SyncPeriodic,
            (ExecutionMode::Background, Schedule::Immediate) => Strategy::AsyncImmediate,
            (ExecutionMode::Background, Schedule::Delayed { .. }) => Strategy::AsyncDelayed,
            (ExecutionMode::Background, Schedule::Periodic { .. }) => Strategy::AsyncPeriodic,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Strategy::SyncImmediate => "sync_immediate",
            Strategy::SyncDelayed => "sync_delayed",
            Strategy::SyncPeriodic => "sync_periodic",
            Strategy::AsyncImmediate => "async_immediate",
            Strategy::AsyncDelayed => "async_delayed",
            Strategy::AsyncPeriodic => "async_periodic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_gate_raw_parts() {
        assert_eq!(Schedule::from_parts(0, 0, true, true), Schedule::Immediate);
        assert_eq!(Schedule::from_parts(7, 0, false, true), Schedule::Immediate);
        assert_eq!(
            Schedule::from_parts(7, 3, true, true),
            Schedule::Periodic { delay: 7, period: 3 }
        );
        assert_eq!(
            Schedule::from_parts(7, 3, true, false),
            Schedule::Delayed { delay: 7 }
        );
    }

    #[test]
    fn accessors_follow_variant() {
        let s = Schedule::Periodic { delay: 2, period: 4 };
        assert_eq!(s.delay(), 2);
        assert_eq!(s.period(), Some(4));
        assert!(s.is_repeating());
        assert_eq!(Schedule::Delayed { delay: 9 }.period(), None);
    }

    #[test]
    fn strategy_covers_both_modes() {
        let delayed = Schedule::Delayed { delay: 1 };
        assert_eq!(
            Strategy::select(delayed, ExecutionMode::TickThread),
            Strategy::SyncDelayed
        );
        assert_eq!(
            Strategy::select(delayed, ExecutionMode::Background),
            Strategy::AsyncDelayed
        );
        assert_eq!(
            Strategy::select(Schedule::Immediate, ExecutionMode::Background).as_label(),
            "async_immediate"
        );
    }
}
