//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings shared by the [`Runtime`](crate::Runtime)
//! and the reference host scheduler [`TickScheduler`](crate::TickScheduler).
//!
//! ## Sentinel values
//! - `service_period = 0` → clamped to `1` (registry ticks every host cycle)
//! - `tick_budget = 0s` → no overrun warning

use std::time::Duration;

/// Global configuration for the coordination runtime.
///
/// ## Field semantics
/// - `tick_interval`: wall-clock length of one host tick (`50ms` by default)
/// - `service_period`: host ticks between two registry passes (`0` = every tick)
/// - `tick_budget`: a registry pass slower than this is logged as an overrun (`0s` = off)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Wall-clock duration of one host tick.
    ///
    /// Used by [`TickScheduler::run`](crate::TickScheduler::run) as the loop cadence
    /// and to convert tick delays of background work into real time.
    pub tick_interval: Duration,

    /// Number of host ticks between two registry passes.
    ///
    /// - `0` or `1` = the registry ticks every host cycle
    /// - `n > 1` = every `n`-th host cycle
    pub service_period: u64,

    /// Soft per-pass budget for the aggregate service tick.
    ///
    /// A pass that takes longer is reported with a `warn!` log line. It is never
    /// interrupted.
    pub tick_budget: Duration,
}

impl Config {
    /// Returns the tick interval, clamped to a minimum of 1ms.
    #[inline]
    pub fn tick_interval_clamped(&self) -> Duration {
        self.tick_interval.max(Duration::from_millis(1))
    }

    /// Returns the registry pass period in ticks, clamped to a minimum of 1.
    #[inline]
    pub fn service_period_clamped(&self) -> u64 {
        self.service_period.max(1)
    }

    /// Returns the tick budget as an `Option`.
    ///
    /// - `None` → overruns are not reported
    /// - `Some(d)` → passes slower than `d` are reported
    #[inline]
    pub fn tick_budget(&self) -> Option<Duration> {
        if self.tick_budget == Duration::ZERO {
            None
        } else {
            Some(self.tick_budget)
        }
    }

    /// Converts a number of host ticks into wall-clock time.
    #[inline]
    pub fn ticks_to_duration(&self, ticks: u64) -> Duration {
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.tick_interval.saturating_mul(ticks)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tick_interval = 50ms` (20 ticks per second)
    /// - `service_period = 1` (registry ticks every cycle)
    /// - `tick_budget = 25ms` (half of a tick)
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            service_period: 1,
            tick_budget: Duration::from_millis(25),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_are_normalized() {
        let cfg = Config {
            service_period: 0,
            tick_budget: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.service_period_clamped(), 1);
        assert!(cfg.tick_budget().is_none());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = Config {
            tick_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.tick_interval_clamped(), Duration::from_millis(1));
    }

    #[test]
    fn ticks_convert_with_interval() {
        let cfg = Config::default();
        assert_eq!(cfg.ticks_to_duration(0), Duration::ZERO);
        assert_eq!(cfg.ticks_to_duration(20), Duration::from_secs(1));
    }

    #[test]
    fn huge_tick_counts_saturate() {
        let cfg = Config {
            tick_interval: Duration::from_secs(u64::MAX / 2),
            ..Config::default()
        };
        assert_eq!(cfg.ticks_to_duration(u64::MAX), Duration::MAX);
    }
}
