//! Scripted headless season.
//!
//! Signs one contract, staffs up from the first candidate batch, and
//! drives the clock through every sprint with a simple commit-and-dismiss
//! policy, logging reports along the way.

use tracing::{info, warn};

use studio_core::{
    actions, build_headless_app, CandidatePool, ContractState, PhaseState, SimulationConfig,
    SimulationTelemetry, SprintBoard, SprintPhase, SprintReports, StudioLedger, TickDriver,
    WorkItemStatus,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let seed = std::env::var("BURNDOWN_SEED")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0xB0A7);
    let (mut app, notifications) = build_headless_app(seed);
    info!(seed, "burndown headless season starting");

    actions::accept_contract(&mut app.world).expect("accept a contract from idle");
    staff_up(&mut app);

    let interval = app.world.resource::<SimulationConfig>().tick_interval();
    let mut driver = TickDriver::new(interval);

    loop {
        commit_sprint_workload(&mut app);
        driver.start();

        // One wake-up per interval of simulated wall time; the driver stops
        // itself once the sprint boundary fires.
        while driver.is_running() {
            driver.drive(&mut app, interval);
            dismiss_any_blocker(&mut app);
        }

        if let Some(report) = app.world.resource::<SprintReports>().latest() {
            info!(
                sprint = report.sprint_index,
                kind = ?report.kind,
                grade = report.grade.as_str(),
                points_done = %report.contract.points_done,
                points_total = %report.contract.points_total,
                "sprint report"
            );
        }

        let on_final = app
            .world
            .resource::<ContractState>()
            .active()
            .map(|contract| contract.on_final_sprint())
            .unwrap_or(true);
        if on_final {
            let payout = actions::close_contract(&mut app.world).expect("close from final review");
            info!(payout, "contract closed");
            break;
        }
        actions::advance_to_next_sprint(&mut app.world).expect("advance from review");
    }

    for notification in notifications.try_iter() {
        info!(
            tick = notification.tick,
            kind = ?notification.kind,
            "{}",
            notification.message
        );
    }

    let telemetry = app.world.resource::<SimulationTelemetry>();
    info!(
        ticks = telemetry.ticks,
        stories_completed = telemetry.stories_completed,
        blockers_spawned = telemetry.blockers_spawned,
        blockers_dismissed = telemetry.blockers_dismissed,
        funds = app.world.resource::<StudioLedger>().funds(),
        "season finished"
    );
}

/// Hires the cheapest candidates the ledger can afford.
fn staff_up(app: &mut bevy::app::App) {
    loop {
        let offer = {
            let pool = app.world.resource::<CandidatePool>();
            pool.candidates
                .iter()
                .min_by_key(|candidate| candidate.hire_cost)
                .map(|candidate| candidate.contributor.id)
        };
        let Some(id) = offer else {
            break;
        };
        match actions::hire_candidate(&mut app.world, id) {
            Ok(()) => {}
            Err(err) => {
                warn!(%err, "hiring stopped");
                break;
            }
        }
    }
}

/// Commits and starts a modest batch of backlog stories for the sprint.
fn commit_sprint_workload(app: &mut bevy::app::App) {
    if app.world.resource::<PhaseState>().phase() != SprintPhase::Planning {
        return;
    }
    let roster_size = app.world.resource::<studio_core::Roster>().len();
    let ids: Vec<_> = {
        let state = app.world.resource::<ContractState>();
        let Some(contract) = state.active() else {
            return;
        };
        contract
            .full_backlog
            .iter()
            .filter(|item| item.status == WorkItemStatus::Backlog)
            .take(roster_size.max(1) + 1)
            .map(|item| item.id)
            .collect()
    };
    for id in ids {
        if actions::commit_story(&mut app.world, id).is_ok() {
            let _ = actions::start_story(&mut app.world, id);
        }
    }
}

fn dismiss_any_blocker(app: &mut bevy::app::App) {
    if app.world.resource::<PhaseState>().phase() != SprintPhase::Active {
        return;
    }
    let blocker = app
        .world
        .resource::<SprintBoard>()
        .items
        .iter()
        .find(|item| item.is_blocker() && item.is_in_progress())
        .map(|item| item.id);
    if let Some(id) = blocker {
        let _ = actions::dismiss_blocker(&mut app.world, id);
    }
}
