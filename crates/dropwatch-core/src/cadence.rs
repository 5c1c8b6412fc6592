//! Tick cadence planner.
//!
//! One base timer is fanned out into the scheduler's cadences by counting
//! ticks and testing the count against fixed multipliers. Keeping a single
//! counter keeps every cadence phase-aligned: with the defaults the 30s
//! claim cadence only ever fires on a tick where the 15s presence cadence
//! fires too.
//!
//! Pure: the runtime owns the timer, this module only decides what a tick
//! means.

use serde::{Deserialize, Serialize};

/// Default base period between ticks (milliseconds).
pub const DEFAULT_TICK_PERIOD_MS: u64 = 5_000;

/// Default multiplier for the presence cadence (~15s at the default period).
pub const DEFAULT_PRESENCE_EVERY: u64 = 3;

/// Default multiplier for the secondary presence cadence (~30s).
pub const DEFAULT_SECONDARY_EVERY: u64 = 6;

/// Default multiplier for the full-rescan cadence (~15min).
pub const DEFAULT_RESCAN_EVERY: u64 = 180;

/// Cadence multipliers, in base ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub presence: u64,
    pub secondary: u64,
    pub rescan: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            presence: DEFAULT_PRESENCE_EVERY,
            secondary: DEFAULT_SECONDARY_EVERY,
            rescan: DEFAULT_RESCAN_EVERY,
        }
    }
}

impl CadenceConfig {
    /// Work due on `tick`.
    ///
    /// Tick 0 is the initial full scan and sits outside the modulus
    /// schedule, so nothing else fires on it.
    #[must_use]
    pub fn plan(&self, tick: u64) -> TickPlan {
        if tick == 0 {
            return TickPlan {
                tick,
                initial_scan: true,
                ..TickPlan::default()
            };
        }
        TickPlan {
            tick,
            initial_scan: false,
            presence: fires(tick, self.presence),
            secondary: fires(tick, self.secondary),
            rescan: fires(tick, self.rescan),
        }
    }
}

fn fires(tick: u64, every: u64) -> bool {
    every != 0 && tick % every == 0
}

/// What a single tick has to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickPlan {
    pub tick: u64,
    pub initial_scan: bool,
    pub presence: bool,
    pub secondary: bool,
    pub rescan: bool,
}

impl TickPlan {
    /// True when this tick runs the selection engine.
    #[must_use]
    pub fn scans(&self) -> bool {
        self.initial_scan || self.rescan
    }
}

/// Monotonic tick counter. `None` until the first fire.
///
/// Never reset; wraps on overflow since only the modulus is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounter {
    current: Option<u64>,
}

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new tick. The first call yields 0.
    pub fn advance(&mut self) -> u64 {
        let next = match self.current {
            None => 0,
            Some(n) => n.wrapping_add(1),
        };
        self.current = Some(next);
        next
    }

    #[must_use]
    pub fn current(&self) -> Option<u64> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_is_zero() {
        let mut counter = TickCounter::new();
        assert_eq!(counter.current(), None);
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.current(), Some(1));
    }

    #[test]
    fn counter_wraps() {
        let mut counter = TickCounter {
            current: Some(u64::MAX),
        };
        assert_eq!(counter.advance(), 0);
    }

    #[test]
    fn tick_zero_is_initial_scan_only() {
        let plan = CadenceConfig::default().plan(0);
        assert!(plan.initial_scan);
        assert!(!plan.presence, "no presence on tick 0");
        assert!(!plan.secondary, "no secondary on tick 0");
        assert!(!plan.rescan, "rescan is covered by the initial scan");
        assert!(plan.scans());
    }

    #[test]
    fn cadence_counts_over_180_ticks() {
        let cadence = CadenceConfig::default();
        let plans: Vec<TickPlan> = (1..=180).map(|t| cadence.plan(t)).collect();

        assert_eq!(plans.iter().filter(|p| p.presence).count(), 60);
        assert_eq!(plans.iter().filter(|p| p.secondary).count(), 30);
        let rescans: Vec<u64> = plans.iter().filter(|p| p.rescan).map(|p| p.tick).collect();
        assert_eq!(rescans, vec![180], "single rescan at tick 180");
        assert!(plans.iter().all(|p| !p.initial_scan));
    }

    #[test]
    fn secondary_always_phase_aligned_with_presence() {
        let cadence = CadenceConfig::default();
        for tick in 1..=1_000 {
            let plan = cadence.plan(tick);
            if plan.secondary {
                assert!(plan.presence, "tick {tick}: secondary without presence");
            }
        }
    }

    #[test]
    fn zero_multiplier_never_fires() {
        let cadence = CadenceConfig {
            presence: 0,
            secondary: 0,
            rescan: 0,
        };
        let plan = cadence.plan(6);
        assert!(!plan.presence && !plan.secondary && !plan.rescan);
    }

    #[test]
    fn custom_multipliers() {
        let cadence = CadenceConfig {
            presence: 2,
            secondary: 4,
            rescan: 10,
        };
        assert!(cadence.plan(10).rescan);
        assert!(cadence.plan(4).secondary);
        assert!(!cadence.plan(3).presence);
    }
}
