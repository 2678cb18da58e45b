//! Fixed-timestep driver translating host wall-clock deltas into a
//! deterministic number of logical ticks.

use std::time::Duration;

use bevy::prelude::App;
use tracing::debug;

use crate::phase::PhaseState;
use crate::resources::SimulationConfig;

/// Hard ceiling on banked catch-up work: a suspended host resuming after
/// minutes away must not burst an unbounded number of ticks.
pub const CATCH_UP_TICK_LIMIT: u32 = 10;

/// Whether the drain loop may continue after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Halt,
}

/// Accumulates elapsed host time and invokes one tick per elapsed interval.
///
/// The host owns the wake-up cadence and feeds deltas in; the driver owns
/// the conversion into logical ticks. The step callback is re-consulted
/// after every single tick so a sprint ending mid-drain aborts the loop
/// immediately.
#[derive(Debug)]
pub struct TickDriver {
    interval: Duration,
    accumulator: Duration,
    running: bool,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulator: Duration::ZERO,
            running: false,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Idempotent: a driver that is already running keeps its accumulator.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.accumulator = Duration::ZERO;
        }
    }

    /// Idempotent: cancels pending work and discards banked time.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = Duration::ZERO;
    }

    /// Adds `delta` to the accumulator (clamped to the catch-up ceiling)
    /// and runs one `step` per whole interval banked. Returns the number of
    /// ticks run. The drain aborts as soon as `step` reports [`TickFlow::Halt`].
    pub fn advance<F>(&mut self, delta: Duration, mut step: F) -> u32
    where
        F: FnMut() -> TickFlow,
    {
        if !self.running {
            return 0;
        }

        let ceiling = self.interval * CATCH_UP_TICK_LIMIT;
        self.accumulator = (self.accumulator + delta).min(ceiling);

        let mut ticks = 0u32;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            ticks += 1;
            if step() == TickFlow::Halt {
                break;
            }
        }
        ticks
    }

    /// Binds the driver to a headless app.
    ///
    /// Ticks only while the phase machine reports a tickable phase; in any
    /// other phase banked time is discarded rather than saved for later.
    /// When a tick itself leaves the tickable set (a sprint boundary fired
    /// inside it) the driver stops.
    pub fn drive(&mut self, app: &mut App, delta: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        if !app.world.resource::<PhaseState>().is_tickable() {
            self.accumulator = Duration::ZERO;
            return 0;
        }

        let ticks = self.advance(delta, || {
            app.update();
            if app.world.resource::<PhaseState>().is_tickable() {
                TickFlow::Continue
            } else {
                TickFlow::Halt
            }
        });

        if !app.world.resource::<PhaseState>().is_tickable() {
            self.stop();
            debug!(
                target: "burndown::clock",
                ticks,
                "clock.stopped_on_phase_exit"
            );
        }
        ticks
    }
}
