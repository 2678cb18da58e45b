use std::time::Duration;

use bevy::prelude::Resource;

use crate::payout::SprintReport;

/// Global tuning parameters for the studio simulation.
#[derive(Resource, Debug, Clone)]
pub struct SimulationConfig {
    /// Simulated milliseconds represented by one logical tick.
    pub tick_interval_ms: u64,
    pub ticks_per_day: u32,
    pub days_per_sprint: u32,
    /// Throughput penalty per in-progress story beyond the roster size.
    pub wip_penalty_per_excess: f32,
    /// The WIP multiplier never drops below this floor.
    pub wip_penalty_floor: f32,
    /// Throughput multiplier while the momentum window is armed.
    pub momentum_multiplier: f32,
    pub momentum_window_ticks: u32,
    /// Per-tick chance that a blocker spawns, before shield reductions.
    pub disruption_chance: f32,
    pub max_active_blockers: u32,
    /// Exponent applied to the completion ratio before scaling the payout.
    pub payout_curve_exponent: f32,
    /// Fraction of the base payout granted at 100% completion.
    pub perfect_bonus_fraction: f32,
    /// Fraction of the base payout granted per unused sprint day.
    pub early_bonus_per_day: f32,
    pub starting_funds: i64,
    pub candidate_batch_size: usize,
    /// Retry budget when avoiding duplicate archetypes in one batch.
    pub archetype_dedup_attempts: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 800,
            ticks_per_day: 8,
            days_per_sprint: 5,
            wip_penalty_per_excess: 0.15,
            wip_penalty_floor: 0.4,
            momentum_multiplier: 1.2,
            momentum_window_ticks: 6,
            disruption_chance: 0.06,
            max_active_blockers: 2,
            payout_curve_exponent: 1.3,
            perfect_bonus_fraction: 0.25,
            early_bonus_per_day: 0.05,
            starting_funds: 2_000,
            candidate_batch_size: 3,
            archetype_dedup_attempts: 10,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Total logical ticks processed this session.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Per-sprint transient counters owned by the tick processor.
///
/// Reset at the start of every sprint; a field of the simulation context,
/// never module state, so independent simulations stay independent.
#[derive(Resource, Debug, Clone)]
pub struct SprintClock {
    /// 1-based day within the sprint.
    pub day: u32,
    pub tick_in_day: u32,
    /// Remaining ticks of the post-completion momentum bonus.
    pub momentum_ticks: u32,
    pub blockers_dismissed: u32,
    /// Latch so the early-ship signal fires on the edge, not every tick.
    pub early_ship_signalled: bool,
}

impl Default for SprintClock {
    fn default() -> Self {
        Self {
            day: 1,
            tick_in_day: 0,
            momentum_ticks: 0,
            blockers_dismissed: 0,
            early_ship_signalled: false,
        }
    }
}

impl SprintClock {
    pub fn reset_for_sprint(&mut self) {
        *self = Self::default();
    }
}

/// Studio funds: payouts settle in, hires settle out.
#[derive(Resource, Debug, Default, Clone)]
pub struct StudioLedger {
    funds: i64,
}

impl StudioLedger {
    pub fn new(funds: i64) -> Self {
        Self { funds }
    }

    pub fn funds(&self) -> i64 {
        self.funds
    }

    pub fn credit(&mut self, amount: i64) {
        self.funds += amount.max(0);
    }

    /// Debits `amount`, refusing to overdraw. Returns whether it settled.
    pub fn debit(&mut self, amount: i64) -> bool {
        if amount < 0 || amount > self.funds {
            return false;
        }
        self.funds -= amount;
        true
    }
}

/// Session-wide counters aggregated by the tick systems.
#[derive(Resource, Default, Debug, Clone)]
pub struct SimulationTelemetry {
    pub ticks: u64,
    pub stories_completed: u32,
    pub blockers_spawned: u32,
    pub blockers_dismissed: u32,
    pub sprints_closed: u32,
    pub contracts_closed: u32,
}

/// Every sprint report produced this session, in order.
#[derive(Resource, Default, Debug, Clone)]
pub struct SprintReports {
    pub reports: Vec<SprintReport>,
}

impl SprintReports {
    pub fn push(&mut self, report: SprintReport) {
        self.reports.push(report);
    }

    pub fn latest(&self) -> Option<&SprintReport> {
        self.reports.last()
    }
}
