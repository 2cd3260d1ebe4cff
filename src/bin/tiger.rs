use adaops::worlds::*;
use adaops::*;
use clap::Parser;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Play tiger episodes with the anytime planner and watch it listen
/// before it leaps.
#[derive(Parser)]
struct Args {
    /// wall-clock budget per decision, seconds
    #[arg(long, default_value_t = 0.1)]
    t_max: f64,
    /// decisions per episode
    #[arg(long, default_value_t = 10)]
    steps: usize,
    /// episodes to play
    #[arg(long, default_value_t = 20)]
    episodes: usize,
    /// planner seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    adaops::init();
    let args = Args::parse();
    let pomdp = TigerPomdp::default();
    let mut planner = Solver::new(IndependentBounds::new(
        pomdp.r_tiger / (1.0 - pomdp.discount),
        pomdp.r_escape / (1.0 - pomdp.discount),
    ))
    .with_t_max(args.t_max)
    .with_max_depth(20)
    .with_seed(args.seed)
    .solve(pomdp)?;
    let filter = BootstrapFilter::new(500);
    let prior = TigerPomdp::uniform_belief();
    let ref mut rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1));
    let mut total = 0.0;
    for episode in 0..args.episodes {
        let ret = run_episode(&mut planner, &prior, &filter, args.steps, rng)?;
        total += ret;
        log::info!(
            "episode {:>3}  return {}",
            episode,
            format!("{:+8.2}", ret).cyan()
        );
    }
    let mean = total / args.episodes as f64;
    log::info!("mean return {}", format!("{:+8.2}", mean).bold());
    Ok(())
}
