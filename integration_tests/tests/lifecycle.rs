mod common;

use studio_core::{
    actions, ContractState, NotificationKind, PhaseState, ReportKind, SimulationTick, SprintClock,
    SprintPhase, SprintReports,
};

fn phase(app: &bevy::app::App) -> SprintPhase {
    app.world.resource::<PhaseState>().phase()
}

#[test]
fn a_contract_walks_planning_active_review_until_close() {
    let common::TestSim { mut app, .. } = common::quiet_sim(11);

    actions::accept_contract(&mut app.world).expect("accept");
    common::hire_direct(&mut app, 1, 0.5, None);
    let total_sprints = app
        .world
        .resource::<ContractState>()
        .active()
        .unwrap()
        .total_sprints;

    for sprint in 1..=total_sprints {
        assert_eq!(phase(&app), SprintPhase::Planning, "sprint {sprint}");
        let ids = common::backlog_ids(&app);
        let open: Vec<_> = {
            let state = app.world.resource::<ContractState>();
            let contract = state.active().unwrap();
            ids.iter()
                .copied()
                .filter(|id| {
                    contract.backlog_item(*id).unwrap().status
                        == studio_core::WorkItemStatus::Backlog
                })
                .collect()
        };
        common::commit_and_start(&mut app, &open, 2);

        // One planning day, then the sprint's day budget.
        common::run_until(&mut app, 64, |app| {
            app.world.resource::<PhaseState>().phase() == SprintPhase::Review
        });

        let reports = app.world.resource::<SprintReports>();
        let report = reports.latest().expect("boundary report");
        assert_eq!(report.sprint_index, sprint);
        if sprint < total_sprints {
            assert_eq!(report.kind, ReportKind::Interim);
            assert_eq!(report.total_cash(), 0);
            actions::advance_to_next_sprint(&mut app.world).expect("advance");
        } else {
            assert_eq!(report.kind, ReportKind::Final);
            actions::close_contract(&mut app.world).expect("close");
        }
    }

    assert_eq!(phase(&app), SprintPhase::Idle);
    assert!(app.world.resource::<ContractState>().active().is_none());
}

#[test]
fn review_and_idle_phases_bank_no_ticks() {
    let common::TestSim { mut app, .. } = common::quiet_sim(12);

    actions::accept_contract(&mut app.world).expect("accept");
    common::run_until(&mut app, 64, |app| {
        app.world.resource::<PhaseState>().phase() == SprintPhase::Review
    });

    let ticks = app.world.resource::<SimulationTick>().0;
    for _ in 0..5 {
        app.update();
    }
    assert_eq!(app.world.resource::<SimulationTick>().0, ticks);
}

#[test]
fn shipping_early_reports_the_skipped_days() {
    let mut sim_config = common::quiet_config();
    sim_config.days_per_sprint = 5;
    let common::TestSim {
        mut app,
        notifications,
    } = common::sim_with(13, sim_config);

    actions::accept_contract(&mut app.world).expect("accept");
    // Plenty of velocity: the committed story finishes within day one.
    for id in 0..4 {
        common::hire_direct(&mut app, id, 3.0, None);
    }
    let ids = common::backlog_ids(&app);
    common::commit_and_start(&mut app, &ids, 1);

    common::run_until(&mut app, 64, |app| {
        app.world.resource::<PhaseState>().phase() == SprintPhase::Active
            && app
                .world
                .resource::<studio_core::SprintBoard>()
                .incomplete_story_count()
                == 0
    });

    assert_eq!(app.world.resource::<SprintClock>().day, 1);
    let days_remaining = actions::ship_early(&mut app.world).expect("ship early");
    assert_eq!(days_remaining, 4);
    assert_eq!(phase(&app), SprintPhase::Review);

    let reports = app.world.resource::<SprintReports>();
    assert_eq!(reports.latest().unwrap().days_remaining, 4);
    assert!(notifications
        .try_iter()
        .any(|n| n.kind == NotificationKind::EarlyShipAvailable));
}

#[test]
fn planning_actions_are_rejected_in_review() {
    let common::TestSim { mut app, .. } = common::quiet_sim(14);

    actions::accept_contract(&mut app.world).expect("accept");
    let ids = common::backlog_ids(&app);
    common::run_until(&mut app, 64, |app| {
        app.world.resource::<PhaseState>().phase() == SprintPhase::Review
    });

    assert!(matches!(
        actions::commit_story(&mut app.world, ids[0]),
        Err(actions::ActionError::WrongPhase { .. })
    ));
    assert!(matches!(
        actions::ship_early(&mut app.world),
        Err(actions::ActionError::WrongPhase { .. })
    ));
}
