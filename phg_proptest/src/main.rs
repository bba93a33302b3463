//! randomized stress testing of the two-way FM refiner on simulated process grids

use std::process::ExitCode;

use clap::Parser;
use fastrand::Rng;
use phg::defs::DEFAULT_BAL_TOL;
use phg::RefineParams;

#[macro_use]
extern crate log;

mod case;
mod shrink;

use case::Case;

#[derive(Parser)]
struct Cli {
    /// number of random cases
    #[arg(short = 'n', long, default_value = "100")]
    cases: usize,

    /// maximum number of vertices of a case
    #[arg(short = 'v', long, default_value = "200")]
    max_vtx: usize,

    /// maximum number of hyperedges of a case
    #[arg(short = 'e', long, default_value = "300")]
    max_edges: usize,

    /// maximum number of pins of a hyperedge
    #[arg(short = 'p', long, default_value = "8")]
    max_pins: usize,

    /// grid rows; random in 1..=4 if not given
    #[arg(long)]
    nprow: Option<usize>,

    /// grid columns; random in 1..=4 if not given
    #[arg(long)]
    npcol: Option<usize>,

    /// allowed imbalance
    #[arg(short = 't', long, default_value_t = DEFAULT_BAL_TOL)]
    bal_tol: f64,

    /// target fraction of the weight in part 0
    #[arg(short = 'r', long, default_value = "0.5")]
    ratio: f64,

    /// maximum number of passes, 0 for no limit
    #[arg(long, default_value = "0")]
    pass_limit: i64,

    /// debug level flags passed to the refiner
    #[arg(short = 'd', long, default_value = "0")]
    dbglvl: u32,

    #[arg(short, long, default_value = "1234")]
    seed: u64,

    /// shrink the first failing case before printing it
    #[arg(long)]
    shrink: bool,

    /// number of checks the shrinker may spend
    #[arg(long, default_value = "500")]
    shrink_budget: usize,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let params = RefineParams::default()
        .with_ratio(cli.ratio)
        .with_pass_limit(cli.pass_limit)
        .with_dbglvl(cli.dbglvl);
    if let Err(e) = params.validate(cli.bal_tol) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let mut rng = Rng::with_seed(cli.seed);
    let mut total_gain = 0.0;
    for i in 0..cli.cases {
        let seed = rng.u64(..);
        let nvtx = rng.usize(1..=cli.max_vtx.max(1));
        let nedge = rng.usize(0..=cli.max_edges);
        let grid = (
            cli.nprow.unwrap_or_else(|| rng.usize(1..=4)),
            cli.npcol.unwrap_or_else(|| rng.usize(1..=4)),
        );
        let mut case = Case::random(nvtx, nedge, cli.max_pins, grid, cli.bal_tol, seed);
        case.params = params;

        match case.check() {
            Ok(outcome) => {
                let stats = &outcome.stats;
                total_gain += stats.initial_cut - stats.final_cut;
                debug!(
                    "case {i} (seed {seed}, {}x{}): {} vertices, {} edges, cut {} -> {} in {} passes",
                    grid.0,
                    grid.1,
                    nvtx,
                    nedge,
                    stats.initial_cut,
                    stats.final_cut,
                    stats.passes
                );
            }
            Err(failure) => {
                eprintln!("case {i} failed (case seed {seed}, run seed {}): {failure}", cli.seed);
                let case = if cli.shrink {
                    shrink::shrink(case, &failure, cli.shrink_budget)
                } else {
                    case
                };
                print!("{case}");
                return ExitCode::FAILURE;
            }
        }
    }

    info!("{} cases passed, total cut reduction {total_gain}", cli.cases);
    eprintln!("{} cases passed", cli.cases);
    ExitCode::SUCCESS
}
