mod common;

use approx::assert_relative_eq;
use common::{cut_of, run_fm2, Case, SHAPES};
use phg::comm::LocalGrid;
use phg::dist::{local_part, shard};
use phg::{refine, set_refinement_strategy, RefineParams, Status};

#[test]
fn replicas_agree_on_every_grid() {
    for (nprow, npcol) in SHAPES {
        for seed in 0..4 {
            let case = Case::random(48, 64, 5, seed);
            let run = run_fm2(&case, nprow, npcol, &RefineParams::default(), 1.2);
            assert!(run.replicas_agree(), "{nprow}x{npcol} seed {seed}");
            let part = run.gathered();
            assert_eq!(part.len(), case.part.len());
            assert!(part.iter().all(|&p| p < 2));
        }
    }
}

#[test]
fn reported_cuts_match_the_partition() {
    for (nprow, npcol) in SHAPES {
        for seed in 10..14 {
            let case = Case::random(40, 50, 4, seed);
            let run = run_fm2(&case, nprow, npcol, &RefineParams::default(), 1.2);
            let before = cut_of(&case, &case.part);
            let after = cut_of(&case, &run.gathered());
            for stats in &run.stats {
                assert_relative_eq!(stats.initial_cut, before);
                assert_relative_eq!(stats.final_cut, after);
                assert_eq!(stats.passes, run.stats[0].passes);
            }
        }
    }
}

#[test]
fn weight_is_conserved() {
    for (nprow, npcol) in SHAPES {
        let case = Case::random(30, 40, 4, 7);
        let run = run_fm2(&case, nprow, npcol, &RefineParams::default(), 1.1);
        let final_w = case.global.part_weights(&run.gathered());
        for stats in &run.stats {
            assert_relative_eq!(stats.weights[0] + stats.weights[1], case.total_weight());
            assert_relative_eq!(stats.weights[0], final_w[0]);
        }
    }
}

#[test]
fn balanced_sides_stay_balanced() {
    let bal_tol = 1.15;
    for (nprow, npcol) in SHAPES {
        for seed in 20..24 {
            let case = Case::random(50, 70, 5, seed);
            let total = case.total_weight();
            let max = [total * bal_tol * 0.5; 2];
            let start = case.global.part_weights(&case.part);
            let run = run_fm2(&case, nprow, npcol, &RefineParams::default(), bal_tol);
            let end = case.global.part_weights(&run.gathered());
            for p in 0..2 {
                if start[p] <= max[p] {
                    assert!(end[p] <= max[p] + 1e-9, "{nprow}x{npcol} seed {seed} side {p}");
                }
            }
        }
    }
}

#[test]
fn single_process_never_worsens_the_cut() {
    for seed in 30..40 {
        let case = Case::random(64, 90, 6, seed);
        let run = run_fm2(&case, 1, 1, &RefineParams::default(), 1.1);
        assert!(run.stats[0].final_cut <= run.stats[0].initial_cut);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let case = Case::random(60, 80, 5, 99);
    let a = run_fm2(&case, 3, 2, &RefineParams::default(), 1.1);
    let b = run_fm2(&case, 3, 2, &RefineParams::default(), 1.1);
    assert_eq!(a.parts, b.parts);
    for (x, y) in a.stats.iter().zip(&b.stats) {
        assert_eq!(x.final_cut.to_bits(), y.final_cut.to_bits());
        assert_eq!(x.history, y.history);
    }
}

#[test]
fn no_strategy_on_a_grid() {
    let case = Case::random(20, 20, 3, 5);
    let res = LocalGrid::new(2, 2).run(|r, c, comm| {
        let hg = shard(&case.global, 2, 2, r, c).unwrap();
        let mut part = local_part(&case.part, 2, c);
        let before = part.clone();
        let no = set_refinement_strategy("No", RefineParams::default()).unwrap();
        (refine(&hg, &comm, 2, &mut part, no.as_ref(), 1.1), part == before)
    });
    assert!(res.iter().all(|&(s, same)| s == Status::Ok && same));
}

#[test]
fn more_processes_than_vertices() {
    let case = Case::random(3, 2, 3, 1);
    let run = run_fm2(&case, 3, 2, &RefineParams::default(), 1.5);
    assert!(run.replicas_agree());
    assert_relative_eq!(run.stats[0].final_cut, cut_of(&case, &run.gathered()));
}

#[test]
fn fatal_status_on_every_process() {
    let case = Case::random(12, 10, 3, 3);
    let res = LocalGrid::new(2, 2).run(|r, c, comm| {
        let hg = shard(&case.global, 2, 2, r, c).unwrap();
        let mut part = local_part(&case.part, 2, c);
        if (r, c) == (1, 1) {
            part.pop();
        }
        let fm2 = set_refinement_strategy("fm2", RefineParams::default()).unwrap();
        refine(&hg, &comm, 2, &mut part, fm2.as_ref(), 1.1)
    });
    assert!(res.iter().all(|&s| s == Status::Fatal));
}
