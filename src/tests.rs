#![cfg(test)]

use crate::comm::{GridComm, LocalGrid};
use crate::debug::compute_cut;
use crate::dist::{gather_part, local_part, shard};
use crate::graph_gen::HypergraphBuilder;
use crate::{refine, set_refinement_strategy, Hypergraph, RefineParams, Status};

#[test]
fn empty_hypergraph_is_ok() {
    let hg = Hypergraph::new(0, vec![], vec![]).unwrap();
    let mut part: [usize; 0] = [];
    let fm2 = set_refinement_strategy(crate::defs::STRATEGY_FM2, RefineParams::default()).unwrap();
    assert_eq!(
        refine(&hg, &GridComm::single(), 2, &mut part, fm2.as_ref(), 1.1),
        Status::Ok
    );
}

#[test]
fn empty_hypergraph_on_a_grid() {
    let res = LocalGrid::new(2, 2).run(|_, _, comm| {
        let hg = Hypergraph::new(0, vec![], vec![]).unwrap();
        let fm2 = set_refinement_strategy("fm2", RefineParams::default()).unwrap();
        refine(&hg, &comm, 2, &mut [], fm2.as_ref(), 1.1)
    });
    assert!(res.iter().all(|s| s.is_ok()));
}

#[test]
fn edges_without_vertices() {
    // shards that only hold empty hyperedges are not globally empty
    let hg = Hypergraph::new(0, vec![0, 0, 0], vec![]).unwrap();
    let stats = crate::fm::fm2_refine(&hg, &GridComm::single(), &mut [], &RefineParams::default(), 1.1)
        .unwrap();
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.final_cut, 0.0);
}

#[test]
fn single_split_edge_stays_split() {
    let hg = Hypergraph::from_edges(4, [[0, 1, 2, 3]])
        .unwrap()
        .with_ewgt(vec![2.5])
        .unwrap();
    let mut part = [0, 0, 0, 1];
    let stats =
        crate::fm::fm2_refine(&hg, &GridComm::single(), &mut part, &RefineParams::default(), 1.5)
            .unwrap();
    assert_eq!(part, [0, 0, 0, 1]);
    assert_eq!(stats.final_cut, 2.5);
}

#[test]
fn never_worse_on_one_process() {
    for seed in 0..20 {
        let mut b = HypergraphBuilder::new(60, seed);
        b.random_edges(80, 5).random_vwgt(3).random_ewgt(4);
        let hg = b.build().unwrap();
        let mut part = b.random_bisection();
        let before = compute_cut(&hg, &part);

        let stats =
            crate::fm::fm2_refine(&hg, &GridComm::single(), &mut part, &RefineParams::default(), 1.2)
                .unwrap();
        assert_eq!(stats.initial_cut, before);
        assert_eq!(stats.final_cut, compute_cut(&hg, &part));
        assert!(stats.final_cut <= before, "seed {seed}");
        assert!(stats.passes >= 2);
    }
}

#[test]
fn deterministic() {
    let mut b = HypergraphBuilder::new(40, 11);
    b.local_edges(60, 4, 8).random_vwgt(4);
    let global = b.build().unwrap();
    let part = b.random_bisection();

    let run = || {
        let res = LocalGrid::new(2, 2).run(|r, c, comm| {
            let hg = shard(&global, 2, 2, r, c).unwrap();
            let mut lpart = local_part(&part, 2, c);
            let stats =
                crate::fm::fm2_refine(&hg, &comm, &mut lpart, &RefineParams::default(), 1.1)
                    .unwrap();
            (lpart, stats.final_cut.to_bits())
        });
        let cols: Vec<_> = res[..2].iter().map(|(p, _)| p.clone()).collect();
        (gather_part(&cols), res[0].1)
    };
    assert_eq!(run(), run());
}
