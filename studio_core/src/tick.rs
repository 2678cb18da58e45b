//! Per-tick simulation systems.
//!
//! One logical tick is one pass of these systems, chained in the order
//! they are registered: velocity allocation, completion promotion, the
//! disruption roll, the early-ship signal, and day/sprint bookkeeping.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use tracing::{debug, info, warn};

use crate::board::{SprintBoard, WorkItem, WorkItemIds};
use crate::contract::ContractState;
use crate::notifications::{NotificationKind, Notifications};
use crate::payout::{final_report, interim_report};
use crate::phase::{PhaseState, SprintPhase};
use crate::resources::{
    SimulationConfig, SimulationTelemetry, SimulationTick, SprintClock, SprintReports,
};
use crate::rng::SimRng;
use crate::roster::Roster;

/// WIP multiplier for `in_progress` concurrent stories: a fixed penalty per
/// story beyond the roster size, floored so throughput never collapses to
/// nothing.
fn wip_multiplier(in_progress: usize, roster_size: usize, config: &SimulationConfig) -> f32 {
    let excess = in_progress.saturating_sub(roster_size) as f32;
    (1.0 - excess * config.wip_penalty_per_excess).clamp(config.wip_penalty_floor, 1.0)
}

/// Distributes the roster's effective velocity across in-progress stories.
///
/// A live blocker is an absolute gate: no story accrues anything while one
/// is in progress.
pub fn allocate_velocity(
    config: Res<SimulationConfig>,
    phase: Res<PhaseState>,
    contract: Res<ContractState>,
    roster: Res<Roster>,
    mut board: ResMut<SprintBoard>,
    mut clock: ResMut<SprintClock>,
) {
    if phase.phase() != SprintPhase::Active || contract.active().is_none() {
        return;
    }
    if board.has_active_blocker() {
        return;
    }
    let in_progress = board.in_progress_story_count();
    if in_progress == 0 {
        return;
    }

    let wip = wip_multiplier(in_progress, roster.len(), &config);
    let momentum = if clock.momentum_ticks > 0 {
        clock.momentum_ticks -= 1;
        config.momentum_multiplier
    } else {
        1.0
    };

    let share = roster
        .aggregate_velocity()
        .scaled(wip * momentum)
        .split(in_progress);

    for item in board
        .items
        .iter_mut()
        .filter(|item| item.is_story() && item.is_in_progress())
    {
        item.apply_progress(share);
    }
}

/// Promotes finished stories to done and arms the momentum window.
pub fn promote_completed(
    config: Res<SimulationConfig>,
    phase: Res<PhaseState>,
    contract: Res<ContractState>,
    mut board: ResMut<SprintBoard>,
    mut clock: ResMut<SprintClock>,
    mut telemetry: ResMut<SimulationTelemetry>,
) {
    if phase.phase() != SprintPhase::Active || contract.active().is_none() {
        return;
    }

    let mut completed = 0u32;
    for item in board
        .items
        .iter_mut()
        .filter(|item| item.is_story() && item.is_in_progress())
    {
        if item.is_complete() {
            item.status = crate::board::WorkItemStatus::Done;
            completed += 1;
            info!(
                target: "burndown::tick",
                id = %item.id,
                title = %item.title,
                "story.completed"
            );
        }
    }

    if completed > 0 {
        clock.momentum_ticks = config.momentum_window_ticks;
        telemetry.stories_completed += completed;
    }
}

/// Rolls for a disruptive blocker.
///
/// Never fires while the sprint has no incomplete work (an end-of-sprint
/// blocker could not be resolved) or while the blocker cap is reached.
#[allow(clippy::too_many_arguments)]
pub fn roll_disruption(
    config: Res<SimulationConfig>,
    phase: Res<PhaseState>,
    contract: Res<ContractState>,
    roster: Res<Roster>,
    catalog: Res<crate::content::ContentCatalogHandle>,
    mut board: ResMut<SprintBoard>,
    mut ids: ResMut<WorkItemIds>,
    mut rng: ResMut<SimRng>,
    notifications: Res<Notifications>,
    tick: Res<SimulationTick>,
    mut telemetry: ResMut<SimulationTelemetry>,
) {
    if phase.phase() != SprintPhase::Active || contract.active().is_none() {
        return;
    }
    if board.incomplete_story_count() == 0 {
        return;
    }
    if board.active_blocker_count() >= config.max_active_blockers as usize {
        return;
    }

    let chance = (config.disruption_chance * roster.disruption_multiplier()).max(0.0);
    if rng.roll() >= chance {
        return;
    }

    let titles = catalog.catalog().blocker_titles();
    let title = titles[rng.index(titles.len())].clone();
    let blocker = WorkItem::blocker(ids.next(), title.clone());
    warn!(
        target: "burndown::tick",
        id = %blocker.id,
        title = %title,
        "disruption.spawned"
    );
    notifications.emit(
        tick.0,
        NotificationKind::BlockerSpawned,
        format!("{title}: all story progress is blocked"),
    );
    board.push(blocker);
    telemetry.blockers_spawned += 1;
}

/// Surfaces the early-ship opportunity exactly once per edge.
pub fn signal_early_ship(
    phase: Res<PhaseState>,
    contract: Res<ContractState>,
    board: Res<SprintBoard>,
    mut clock: ResMut<SprintClock>,
    notifications: Res<Notifications>,
    tick: Res<SimulationTick>,
) {
    if phase.phase() != SprintPhase::Active || contract.active().is_none() {
        return;
    }

    let ready = board.incomplete_story_count() == 0 && !board.has_active_blocker();
    if ready && !clock.early_ship_signalled {
        clock.early_ship_signalled = true;
        info!(target: "burndown::tick", "sprint.early_ship_available");
        notifications.emit(
            tick.0,
            NotificationKind::EarlyShipAvailable,
            "All committed work is done; the sprint can ship early",
        );
    } else if !ready {
        clock.early_ship_signalled = false;
    }
}

/// Everything a sprint boundary needs to touch.
#[derive(SystemParam)]
pub struct BoundaryParams<'w> {
    pub config: Res<'w, SimulationConfig>,
    pub phase: ResMut<'w, PhaseState>,
    pub contract: ResMut<'w, ContractState>,
    pub board: ResMut<'w, SprintBoard>,
    pub clock: ResMut<'w, SprintClock>,
    pub reports: ResMut<'w, SprintReports>,
    pub notifications: Res<'w, Notifications>,
    pub telemetry: ResMut<'w, SimulationTelemetry>,
    pub tick: Res<'w, SimulationTick>,
}

/// Counts ticks into days and days into the sprint budget.
///
/// A full day in Planning hands the board to Active; a day past the sprint
/// budget in Active closes the sprint out.
pub fn advance_day(mut params: BoundaryParams) {
    let phase = params.phase.phase();
    if !phase.is_tickable() || params.contract.active().is_none() {
        return;
    }

    params.clock.tick_in_day += 1;
    if params.clock.tick_in_day < params.config.ticks_per_day {
        return;
    }
    params.clock.tick_in_day = 0;

    match phase {
        SprintPhase::Planning => {
            // Planning always lasts exactly one in-game day.
            params.clock.day = 1;
            params.phase.planning_day_elapsed();
        }
        SprintPhase::Active => {
            params.clock.day += 1;
            debug!(
                target: "burndown::tick",
                day = params.clock.day,
                "sprint.day.advanced"
            );
            if params.clock.day > params.config.days_per_sprint {
                close_out_sprint(&mut params, 0, false);
            }
        }
        _ => {}
    }
}

/// Finalizes the current sprint: merges the board into the contract-wide
/// backlog, produces the interim or final report, and drives the phase
/// machine across the boundary. `via_early_ship` picks which transition
/// carries the board into Review.
pub fn close_out_sprint(params: &mut BoundaryParams, days_remaining: u32, via_early_ship: bool) {
    let Some(contract) = params.contract.active_mut() else {
        return;
    };

    contract.merge_board(&params.board);
    let sprint_items: Vec<WorkItem> = params.board.stories().cloned().collect();

    let report = if contract.on_final_sprint() {
        final_report(
            contract.current_sprint,
            &sprint_items,
            &contract.full_backlog,
            params.clock.blockers_dismissed,
            days_remaining,
            contract.base_payout,
            &params.config,
        )
    } else {
        interim_report(
            contract.current_sprint,
            &sprint_items,
            &contract.full_backlog,
            params.clock.blockers_dismissed,
            days_remaining,
        )
    };

    info!(
        target: "burndown::tick",
        sprint = contract.current_sprint,
        of = contract.total_sprints,
        grade = report.grade.as_str(),
        kind = ?report.kind,
        "sprint.closed"
    );
    params.notifications.emit(
        params.tick.0,
        NotificationKind::SprintClosed,
        format!(
            "Sprint {} of {} closed with grade {}",
            contract.current_sprint,
            contract.total_sprints,
            report.grade.as_str()
        ),
    );

    // Period-boundary cleanup: live blockers die with the sprint.
    params.board.clear();
    params.reports.push(report);
    params.telemetry.sprints_closed += 1;
    if via_early_ship {
        params.phase.ship_early();
    } else {
        params.phase.period_boundary_reached();
    }
}

/// Advances the logical tick counter; last in the chain.
pub fn advance_tick(
    phase: Res<PhaseState>,
    mut tick: ResMut<SimulationTick>,
    mut telemetry: ResMut<SimulationTelemetry>,
) {
    if !phase.is_tickable() {
        return;
    }
    tick.0 += 1;
    telemetry.ticks += 1;
}
