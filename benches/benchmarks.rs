use adaops::worlds::*;
use adaops::*;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;

/// Tree construction on the tiger problem, trial-capped so the bench
/// measures expansion and backup rather than the wall clock.
fn plan_tiger(c: &mut Criterion) {
    let prior = TigerPomdp::uniform_belief();
    c.bench_function("plan tiger 64 trials", |b| {
        let mut planner = Solver::new(IndependentBounds::new(-20.0, 0.0))
            .with_t_max(10.0)
            .with_max_trials(64)
            .with_max_depth(20)
            .with_seed(0)
            .solve(TigerPomdp::default())
            .expect("valid configuration");
        b.iter(|| planner.plan(&prior).expect("search succeeds"))
    });
}

/// Expansion-heavy workload: light-dark with grid-adaptive particle
/// counts and observation packing over a wide raw branching factor.
fn plan_lightdark(c: &mut Criterion) {
    use rand::SeedableRng;
    let pomdp = LightDark::default();
    let ref mut rng = rand::rngs::SmallRng::seed_from_u64(7);
    let prior = pomdp.initial_belief(1000, rng);
    c.bench_function("plan lightdark 32 trials", |b| {
        let mut planner = Solver::new(IndependentBounds::new(
            FoRollout(RandomPolicy),
            100.0,
        ))
        .with_t_max(10.0)
        .with_max_trials(32)
        .with_max_depth(30)
        .with_delta(1.0)
        .with_grid(LdGrid::new(-10.0, 15.0, 26))
        .with_seed(0)
        .solve(pomdp)
        .expect("valid configuration");
        b.iter(|| planner.plan(&prior).expect("search succeeds"))
    });
}

criterion_group!(benches, plan_tiger, plan_lightdark);
criterion_main!(benches);
