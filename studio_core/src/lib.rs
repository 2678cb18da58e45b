//! Core simulation crate for the Burndown studio-management prototype.
//!
//! Headless and deterministic: shared state lives in ECS resources, one
//! logical tick is one pass of the chained Update systems, and a
//! [`TickDriver`] converts host wall-clock deltas into ticks. Rendering,
//! input, and layout belong to the host; this crate only simulates.

pub mod actions;
mod board;
mod clock;
mod content;
mod contract;
mod generators;
mod notifications;
mod payout;
mod phase;
mod points;
mod resources;
mod rng;
mod roster;
mod tick;

use bevy::prelude::*;
use crossbeam_channel::Receiver;

pub use board::{SprintBoard, WorkItem, WorkItemId, WorkItemIds, WorkItemKind, WorkItemStatus};
pub use clock::{TickDriver, TickFlow, CATCH_UP_TICK_LIMIT};
pub use content::{
    load_content_catalog_from_env, ArchetypeDefinition, ContentCatalog, ContentCatalogError,
    ContentCatalogHandle, ContractRanges, PassiveEffectDef, CONTENT_CATALOG_PATH_VAR,
};
pub use contract::{Contract, ContractId, ContractState};
pub use generators::{generate_candidates, generate_contract};
pub use notifications::{Notification, NotificationKind, Notifications};
pub use payout::{final_report, interim_report, Grade, PointTally, ReportKind, SprintReport};
pub use phase::{PhaseState, SprintPhase};
pub use points::Points;
pub use resources::{
    SimulationConfig, SimulationTelemetry, SimulationTick, SprintClock, SprintReports,
    StudioLedger,
};
pub use rng::SimRng;
pub use roster::{
    Candidate, CandidatePool, Contributor, ContributorId, ContributorIds, PassiveEffect, Roster,
};

/// Construct a headless [`App`] configured with the Burndown tick pipeline,
/// seeded for a reproducible session.
///
/// Returns the app together with the receiving end of the notification
/// channel; dropping the receiver silently discards notifications.
pub fn build_headless_app(seed: u64) -> (App, Receiver<Notification>) {
    let mut app = App::new();

    let config = SimulationConfig::default();
    let catalog = load_content_catalog_from_env();
    let (notifications, receiver) = Notifications::channel();

    app.insert_resource(StudioLedger::new(config.starting_funds))
        .insert_resource(config)
        .insert_resource(ContentCatalogHandle::new(catalog))
        .insert_resource(SimRng::seeded(seed))
        .insert_resource(SimulationTick::default())
        .insert_resource(PhaseState::default())
        .insert_resource(ContractState::default())
        .insert_resource(SprintBoard::default())
        .insert_resource(SprintClock::default())
        .insert_resource(WorkItemIds::default())
        .insert_resource(ContributorIds::default())
        .insert_resource(Roster::default())
        .insert_resource(CandidatePool::default())
        .insert_resource(SprintReports::default())
        .insert_resource(SimulationTelemetry::default())
        .insert_resource(notifications)
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                tick::allocate_velocity,
                tick::promote_completed,
                tick::roll_disruption,
                tick::signal_early_ship,
                tick::advance_day,
                tick::advance_tick,
            )
                .chain(),
        );

    (app, receiver)
}

/// Execute a single logical tick directly, bypassing the [`TickDriver`].
///
/// Tests and scripted hosts use this when wall-clock pacing is irrelevant.
pub fn run_tick(app: &mut App) {
    app.update();
}
