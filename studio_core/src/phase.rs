use bevy::prelude::Resource;
use serde::Serialize;
use tracing::debug;

/// Lifecycle phase of the active sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SprintPhase {
    #[default]
    Idle,
    Planning,
    Active,
    Review,
}

impl SprintPhase {
    /// Phases during which the clock is allowed to drain ticks.
    pub fn is_tickable(self) -> bool {
        matches!(self, SprintPhase::Planning | SprintPhase::Active)
    }
}

/// Governs transitions through the sprint lifecycle.
///
/// Illegal transition requests are logged no-ops: a stale caller racing a
/// boundary must never panic a live simulation tick.
#[derive(Resource, Debug, Default, Clone)]
pub struct PhaseState {
    phase: SprintPhase,
}

impl PhaseState {
    pub fn phase(&self) -> SprintPhase {
        self.phase
    }

    pub fn is_tickable(&self) -> bool {
        self.phase.is_tickable()
    }

    fn shift(&mut self, from: SprintPhase, to: SprintPhase, action: &'static str) -> bool {
        if self.phase == from {
            debug!(
                target: "burndown::phase",
                from = ?from,
                to = ?to,
                "phase.transition"
            );
            self.phase = to;
            true
        } else {
            debug!(
                target: "burndown::phase",
                requested = action,
                phase = ?self.phase,
                "phase.transition.rejected"
            );
            false
        }
    }

    /// Idle → Planning, on contract acceptance.
    pub fn accept_contract(&mut self) -> bool {
        self.shift(SprintPhase::Idle, SprintPhase::Planning, "accept_contract")
    }

    /// Planning → Active, once one full in-game day of planning has elapsed.
    pub fn planning_day_elapsed(&mut self) -> bool {
        self.shift(
            SprintPhase::Planning,
            SprintPhase::Active,
            "planning_day_elapsed",
        )
    }

    /// Active → Review, when the day counter exceeds the sprint budget.
    pub fn period_boundary_reached(&mut self) -> bool {
        self.shift(
            SprintPhase::Active,
            SprintPhase::Review,
            "period_boundary_reached",
        )
    }

    /// Active → Review directly, when the sprint ships ahead of schedule.
    pub fn ship_early(&mut self) -> bool {
        self.shift(SprintPhase::Active, SprintPhase::Review, "ship_early")
    }

    /// Review → Planning, legal only while sprints remain in the contract.
    pub fn advance_to_next_sprint(&mut self, current_sprint: u8, total_sprints: u8) -> bool {
        if current_sprint >= total_sprints {
            debug!(
                target: "burndown::phase",
                current_sprint,
                total_sprints,
                "phase.transition.rejected"
            );
            return false;
        }
        self.shift(
            SprintPhase::Review,
            SprintPhase::Planning,
            "advance_to_next_sprint",
        )
    }

    /// Review → Idle, legal only after the contract's final sprint.
    pub fn close_contract(&mut self, current_sprint: u8, total_sprints: u8) -> bool {
        if current_sprint < total_sprints {
            debug!(
                target: "burndown::phase",
                current_sprint,
                total_sprints,
                "phase.transition.rejected"
            );
            return false;
        }
        self.shift(SprintPhase::Review, SprintPhase::Idle, "close_contract")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_contract_walk_is_legal() {
        let mut state = PhaseState::default();

        assert!(state.accept_contract());
        assert!(state.planning_day_elapsed());
        assert!(state.period_boundary_reached());
        assert!(state.advance_to_next_sprint(1, 2));
        assert!(state.planning_day_elapsed());
        assert!(state.period_boundary_reached());
        assert!(state.close_contract(2, 2));
        assert_eq!(state.phase(), SprintPhase::Idle);
    }

    #[test]
    fn illegal_transitions_are_no_ops() {
        let mut state = PhaseState::default();

        assert!(!state.planning_day_elapsed());
        assert!(!state.period_boundary_reached());
        assert!(!state.close_contract(2, 2));
        assert_eq!(state.phase(), SprintPhase::Idle);

        assert!(state.accept_contract());
        assert!(!state.accept_contract());
        assert_eq!(state.phase(), SprintPhase::Planning);
    }

    #[test]
    fn sprint_bounds_gate_review_exits() {
        let mut state = PhaseState::default();
        state.accept_contract();
        state.planning_day_elapsed();
        state.period_boundary_reached();

        // Final sprint: no next sprint to advance into.
        assert!(!state.advance_to_next_sprint(2, 2));
        // Not the final sprint: contract cannot close yet.
        assert!(!state.close_contract(1, 2));
        assert_eq!(state.phase(), SprintPhase::Review);

        assert!(state.close_contract(2, 2));
    }

    #[test]
    fn only_planning_and_active_are_tickable() {
        assert!(!SprintPhase::Idle.is_tickable());
        assert!(SprintPhase::Planning.is_tickable());
        assert!(SprintPhase::Active.is_tickable());
        assert!(!SprintPhase::Review.is_tickable());
    }
}
