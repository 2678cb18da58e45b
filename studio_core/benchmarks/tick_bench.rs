use criterion::{criterion_group, criterion_main, Criterion};

use studio_core::{actions, build_headless_app, run_tick, SimulationConfig};

/// Benchmarks one pass of the tick pipeline with a staffed board.
fn tick_benchmark(c: &mut Criterion) {
    let (mut app, _notifications) = build_headless_app(7);
    actions::accept_contract(&mut app.world).expect("accept contract");

    let ids: Vec<_> = app
        .world
        .resource::<studio_core::ContractState>()
        .active()
        .expect("contract active")
        .full_backlog
        .iter()
        .map(|item| item.id)
        .collect();
    for id in ids.iter().take(4) {
        actions::commit_story(&mut app.world, *id).expect("commit");
        actions::start_story(&mut app.world, *id).expect("start");
    }

    // Drain the planning day so the allocation path is the one measured.
    let ticks_per_day = app.world.resource::<SimulationConfig>().ticks_per_day;
    for _ in 0..ticks_per_day {
        run_tick(&mut app);
    }

    c.bench_function("active_tick", |b| {
        b.iter(|| run_tick(&mut app));
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
