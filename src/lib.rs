pub mod belief;
pub mod bounds;
pub mod grid;
pub mod model;
pub mod search;
pub mod tree;
pub mod worlds;

pub use belief::*;
pub use bounds::*;
pub use grid::*;
pub use model::*;
pub use search::*;
pub use tree::*;

/// dimensional analysis types
pub type Utility = f64;
pub type Probability = f64;
pub type Discount = f64;

// search budget parameters
const EPSILON_0: Utility = 0.0;
const XI: Utility = 0.95;
const T_MAX: f64 = 1.0;
const MAX_TRIALS: usize = usize::MAX;
const MAX_DEPTH: usize = 90;
const OVERTIME_WARNING_THRESHOLD: f64 = 0.2;

// belief resolution parameters
const M_MIN: usize = 30;
const M_MAX: usize = 200;
const ZETA: f64 = 0.03;
const DELTA: f64 = 0.1;
const DEFF_THRES: f64 = 2.0;
const NUM_B: usize = 50_000;

/// target KL radius for the adaptive sample-size rule
const KLD_TARGET: f64 = 0.05;

/// initialize logging for binaries
#[cfg(feature = "cli")]
pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
