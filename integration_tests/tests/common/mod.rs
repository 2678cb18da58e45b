#![allow(dead_code)]

use bevy::app::App;
use crossbeam_channel::Receiver;

use studio_core::{
    actions, build_headless_app, Contributor, ContributorId, Notification, PassiveEffect, Points,
    Roster, SimulationConfig, WorkItemId,
};

/// A headless app plus the notification receiver, under a tight test
/// configuration: short days, no momentum, no random disruptions.
pub struct TestSim {
    pub app: App,
    pub notifications: Receiver<Notification>,
}

/// Deterministic tuning used by most integration tests. Randomness that a
/// test wants, it switches on explicitly.
pub fn quiet_config() -> SimulationConfig {
    SimulationConfig {
        ticks_per_day: 4,
        days_per_sprint: 2,
        momentum_multiplier: 1.0,
        disruption_chance: 0.0,
        ..SimulationConfig::default()
    }
}

pub fn sim_with(seed: u64, config: SimulationConfig) -> TestSim {
    let (mut app, notifications) = build_headless_app(seed);
    app.insert_resource(config);
    TestSim { app, notifications }
}

pub fn quiet_sim(seed: u64) -> TestSim {
    sim_with(seed, quiet_config())
}

/// Puts a contributor with an exact velocity on the roster, bypassing the
/// candidate pipeline.
pub fn hire_direct(app: &mut App, id: u64, velocity: f32, passive: Option<PassiveEffect>) {
    app.world.resource_mut::<Roster>().hire(Contributor {
        id: ContributorId(1_000 + id),
        name: format!("staff-{id}"),
        archetype: "generalist".to_string(),
        velocity: Points::from_f32(velocity),
        passive,
    });
}

/// Commits and starts the first `count` backlog stories.
pub fn commit_and_start(app: &mut App, ids: &[WorkItemId], count: usize) {
    for id in ids.iter().take(count) {
        actions::commit_story(&mut app.world, *id).expect("commit story");
        actions::start_story(&mut app.world, *id).expect("start story");
    }
}

/// Ids of the active contract's backlog, in generation order.
pub fn backlog_ids(app: &App) -> Vec<WorkItemId> {
    app.world
        .resource::<studio_core::ContractState>()
        .active()
        .expect("contract active")
        .full_backlog
        .iter()
        .map(|item| item.id)
        .collect()
}

/// Runs whole ticks until the predicate holds, with a hard cap to keep a
/// broken simulation from hanging the suite.
pub fn run_until(app: &mut App, cap: u32, mut done: impl FnMut(&App) -> bool) -> u32 {
    for ran in 0..cap {
        if done(app) {
            return ran;
        }
        app.update();
    }
    panic!("condition not reached within {cap} ticks");
}
