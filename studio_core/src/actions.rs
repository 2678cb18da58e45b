//! External host actions.
//!
//! The UI layer calls these between ticks; they validate against the phase
//! machine and return a typed reason when a command cannot be honored.
//! Actions never panic a live simulation.

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::board::{SprintBoard, WorkItemId, WorkItemIds, WorkItemStatus};
use crate::content::ContentCatalogHandle;
use crate::contract::{ContractId, ContractState};
use crate::generators;
use crate::notifications::{NotificationKind, Notifications};
use crate::phase::{PhaseState, SprintPhase};
use crate::resources::{
    SimulationConfig, SimulationTelemetry, SimulationTick, SprintClock, SprintReports,
    StudioLedger,
};
use crate::rng::SimRng;
use crate::roster::{CandidatePool, ContributorId, ContributorIds, Roster};
use crate::tick::{close_out_sprint, BoundaryParams};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action requires phase {required:?}, but the studio is in {actual:?}")]
    WrongPhase {
        required: SprintPhase,
        actual: SprintPhase,
    },
    #[error("no contract is active")]
    NoActiveContract,
    #[error("work item {0} not found")]
    UnknownWorkItem(WorkItemId),
    #[error("work item {0} is not a story")]
    NotAStory(WorkItemId),
    #[error("work item {0} is not a live blocker")]
    NotAnActiveBlocker(WorkItemId),
    #[error("work item {id} cannot move from {status:?}")]
    InvalidStatus {
        id: WorkItemId,
        status: WorkItemStatus,
    },
    #[error("the sprint still has unfinished stories")]
    SprintUnfinished,
    #[error("a blocker is still live")]
    BlockerActive,
    #[error("candidate {0} not found")]
    UnknownCandidate(ContributorId),
    #[error("hire costs {cost}, studio funds are {funds}")]
    InsufficientFunds { cost: i64, funds: i64 },
    #[error("the contract has no further sprints")]
    SprintsExhausted,
    #[error("sprints remain before the contract can close")]
    SprintsRemaining,
}

fn require_phase(phase: &PhaseState, required: SprintPhase) -> Result<(), ActionError> {
    if phase.phase() == required {
        Ok(())
    } else {
        Err(ActionError::WrongPhase {
            required,
            actual: phase.phase(),
        })
    }
}

/// Signs a freshly generated contract. Legal only from Idle; moves the
/// studio into Planning and refreshes the candidate pool.
pub fn accept_contract(world: &mut World) -> Result<ContractId, ActionError> {
    let id = world.run_system_once(
        |mut phase: ResMut<PhaseState>,
         mut state: ResMut<ContractState>,
         mut board: ResMut<SprintBoard>,
         mut clock: ResMut<SprintClock>,
         mut ids: ResMut<WorkItemIds>,
         mut rng: ResMut<SimRng>,
         catalog: Res<ContentCatalogHandle>,
         notifications: Res<Notifications>,
         tick: Res<SimulationTick>|
         -> Result<ContractId, ActionError> {
            require_phase(&phase, SprintPhase::Idle)?;

            let mut stream = rng.substream("contract");
            let contract = generators::generate_contract(
                catalog.catalog(),
                &mut ids,
                ContractId(state.signed + 1),
                &mut stream,
            );
            let id = contract.id;
            info!(
                target: "burndown::actions",
                contract = %id,
                client = %contract.client,
                "contract.accepted"
            );
            notifications.emit(
                tick.0,
                NotificationKind::ContractSigned,
                format!(
                    "Signed {}: {} stories over {} sprints",
                    contract.client,
                    contract.full_backlog.len(),
                    contract.total_sprints
                ),
            );

            state.signed += 1;
            state.active = Some(contract);
            board.clear();
            clock.reset_for_sprint();
            phase.accept_contract();
            Ok(id)
        },
    )?;

    refresh_candidates(world);
    Ok(id)
}

/// Regenerates the hire-offer batch. Legal in any phase.
pub fn refresh_candidates(world: &mut World) -> usize {
    world.run_system_once(
        |mut pool: ResMut<CandidatePool>,
         mut ids: ResMut<ContributorIds>,
         mut rng: ResMut<SimRng>,
         roster: Res<Roster>,
         catalog: Res<ContentCatalogHandle>,
         config: Res<SimulationConfig>,
         notifications: Res<Notifications>,
         tick: Res<SimulationTick>|
         -> usize {
            let mut stream = rng.substream("candidates");
            let batch = generators::generate_candidates(
                catalog.catalog(),
                &roster,
                &mut ids,
                &mut stream,
                config.candidate_batch_size,
                config.archetype_dedup_attempts,
            );
            let count = batch.len();
            pool.replace(batch);
            notifications.emit(
                tick.0,
                NotificationKind::CandidatesRefreshed,
                format!("{count} candidates are available for hire"),
            );
            count
        },
    )
}

/// Commits a backlog story to the current sprint. Planning only.
pub fn commit_story(world: &mut World, id: WorkItemId) -> Result<(), ActionError> {
    world.run_system_once(
        move |phase: Res<PhaseState>,
              mut state: ResMut<ContractState>,
              mut board: ResMut<SprintBoard>|
              -> Result<(), ActionError> {
            require_phase(&phase, SprintPhase::Planning)?;
            let contract = state.active_mut().ok_or(ActionError::NoActiveContract)?;
            let item = contract
                .backlog_item_mut(id)
                .ok_or(ActionError::UnknownWorkItem(id))?;
            if !item.is_story() {
                return Err(ActionError::NotAStory(id));
            }
            if item.status != WorkItemStatus::Backlog {
                return Err(ActionError::InvalidStatus {
                    id,
                    status: item.status,
                });
            }
            item.status = WorkItemStatus::Queued;
            board.push(item.clone());
            Ok(())
        },
    )
}

/// Returns a committed-but-unstarted story to the backlog. Planning only.
pub fn uncommit_story(world: &mut World, id: WorkItemId) -> Result<(), ActionError> {
    world.run_system_once(
        move |phase: Res<PhaseState>,
              mut state: ResMut<ContractState>,
              mut board: ResMut<SprintBoard>|
              -> Result<(), ActionError> {
            require_phase(&phase, SprintPhase::Planning)?;
            let contract = state.active_mut().ok_or(ActionError::NoActiveContract)?;
            let item = board.get(id).ok_or(ActionError::UnknownWorkItem(id))?;
            if !item.is_story() {
                return Err(ActionError::NotAStory(id));
            }
            if item.status != WorkItemStatus::Queued {
                return Err(ActionError::InvalidStatus {
                    id,
                    status: item.status,
                });
            }
            board.remove(id);
            if let Some(entry) = contract.backlog_item_mut(id) {
                entry.status = WorkItemStatus::Backlog;
            }
            Ok(())
        },
    )
}

/// Pulls a queued story into progress. Legal while Planning or Active.
pub fn start_story(world: &mut World, id: WorkItemId) -> Result<(), ActionError> {
    world.run_system_once(
        move |phase: Res<PhaseState>,
              mut state: ResMut<ContractState>,
              mut board: ResMut<SprintBoard>|
              -> Result<(), ActionError> {
            if !phase.is_tickable() {
                return Err(ActionError::WrongPhase {
                    required: SprintPhase::Active,
                    actual: phase.phase(),
                });
            }
            let contract = state.active_mut().ok_or(ActionError::NoActiveContract)?;
            let item = board.get_mut(id).ok_or(ActionError::UnknownWorkItem(id))?;
            if !item.is_story() {
                return Err(ActionError::NotAStory(id));
            }
            if item.status != WorkItemStatus::Queued {
                return Err(ActionError::InvalidStatus {
                    id,
                    status: item.status,
                });
            }
            item.status = WorkItemStatus::InProgress;
            if let Some(entry) = contract.backlog_item_mut(id) {
                entry.status = WorkItemStatus::InProgress;
            }
            Ok(())
        },
    )
}

/// Clears a live blocker, re-enabling story progress next tick.
pub fn dismiss_blocker(world: &mut World, id: WorkItemId) -> Result<(), ActionError> {
    world.run_system_once(
        move |phase: Res<PhaseState>,
              mut board: ResMut<SprintBoard>,
              mut clock: ResMut<SprintClock>,
              mut telemetry: ResMut<SimulationTelemetry>|
              -> Result<(), ActionError> {
            require_phase(&phase, SprintPhase::Active)?;
            let item = board.get_mut(id).ok_or(ActionError::UnknownWorkItem(id))?;
            if !item.is_blocker() || !item.is_in_progress() {
                return Err(ActionError::NotAnActiveBlocker(id));
            }
            item.status = WorkItemStatus::Done;
            clock.blockers_dismissed += 1;
            telemetry.blockers_dismissed += 1;
            info!(target: "burndown::actions", blocker = %id, "blocker.dismissed");
            Ok(())
        },
    )
}

/// Ships the sprint ahead of schedule. Legal only while Active, with every
/// committed story done and no live blocker; returns the days skipped.
pub fn ship_early(world: &mut World) -> Result<u32, ActionError> {
    world.run_system_once(|mut params: BoundaryParams| -> Result<u32, ActionError> {
        require_phase(&params.phase, SprintPhase::Active)?;
        if params.contract.active().is_none() {
            return Err(ActionError::NoActiveContract);
        }
        if params.board.incomplete_story_count() > 0 {
            return Err(ActionError::SprintUnfinished);
        }
        if params.board.has_active_blocker() {
            return Err(ActionError::BlockerActive);
        }

        let days_remaining = params
            .config
            .days_per_sprint
            .saturating_sub(params.clock.day);
        info!(
            target: "burndown::actions",
            days_remaining,
            "sprint.shipped_early"
        );
        close_out_sprint(&mut params, days_remaining, true);
        Ok(days_remaining)
    })
}

/// Moves a reviewed, non-final contract into the next sprint's Planning.
pub fn advance_to_next_sprint(world: &mut World) -> Result<u8, ActionError> {
    let sprint = world.run_system_once(
        |mut phase: ResMut<PhaseState>,
         mut state: ResMut<ContractState>,
         mut clock: ResMut<SprintClock>|
         -> Result<u8, ActionError> {
            require_phase(&phase, SprintPhase::Review)?;
            let contract = state.active_mut().ok_or(ActionError::NoActiveContract)?;
            if contract.on_final_sprint() {
                return Err(ActionError::SprintsExhausted);
            }
            phase.advance_to_next_sprint(contract.current_sprint, contract.total_sprints);
            contract.current_sprint += 1;
            clock.reset_for_sprint();
            info!(
                target: "burndown::actions",
                sprint = contract.current_sprint,
                of = contract.total_sprints,
                "sprint.advanced"
            );
            Ok(contract.current_sprint)
        },
    )?;

    refresh_candidates(world);
    Ok(sprint)
}

/// Acknowledges the final Review: settles the payout into the ledger and
/// returns the studio to Idle.
pub fn close_contract(world: &mut World) -> Result<i64, ActionError> {
    world.run_system_once(
        |mut phase: ResMut<PhaseState>,
         mut state: ResMut<ContractState>,
         mut ledger: ResMut<StudioLedger>,
         reports: Res<SprintReports>,
         mut telemetry: ResMut<SimulationTelemetry>,
         notifications: Res<Notifications>,
         tick: Res<SimulationTick>|
         -> Result<i64, ActionError> {
            require_phase(&phase, SprintPhase::Review)?;
            let contract = state.active().ok_or(ActionError::NoActiveContract)?;
            if !contract.on_final_sprint() {
                return Err(ActionError::SprintsRemaining);
            }

            let payout = reports
                .latest()
                .filter(|report| report.kind == crate::payout::ReportKind::Final)
                .map(|report| report.total_cash())
                .unwrap_or(0);
            ledger.credit(payout);
            telemetry.contracts_closed += 1;
            info!(
                target: "burndown::actions",
                contract = %contract.id,
                payout,
                funds = ledger.funds(),
                "contract.closed"
            );
            notifications.emit(
                tick.0,
                NotificationKind::PayoutCollected,
                format!("Collected {payout} from {}", contract.client),
            );

            phase.close_contract(contract.current_sprint, contract.total_sprints);
            state.clear();
            Ok(payout)
        },
    )
}

/// Hires a candidate out of the current pool, charging the ledger.
pub fn hire_candidate(world: &mut World, id: ContributorId) -> Result<(), ActionError> {
    world.run_system_once(
        move |mut pool: ResMut<CandidatePool>,
              mut roster: ResMut<Roster>,
              mut ledger: ResMut<StudioLedger>|
              -> Result<(), ActionError> {
            let cost = pool
                .candidates
                .iter()
                .find(|c| c.contributor.id == id)
                .map(|c| c.hire_cost)
                .ok_or(ActionError::UnknownCandidate(id))?;
            if !ledger.debit(cost) {
                return Err(ActionError::InsufficientFunds {
                    cost,
                    funds: ledger.funds(),
                });
            }

            let candidate = pool.take(id).expect("candidate was just found");
            info!(
                target: "burndown::actions",
                contributor = %candidate.contributor.id,
                name = %candidate.contributor.name,
                archetype = %candidate.contributor.archetype,
                cost,
                "contributor.hired"
            );
            roster.hire(candidate.contributor);
            Ok(())
        },
    )
}
