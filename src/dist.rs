//! Block distribution of a whole hypergraph over a process grid.
//!
//! Grid column `c` gets the `c`-th contiguous block of vertices and grid row `r` the `r`-th
//! contiguous block of hyperedges; process `(r, c)` holds the pins in both. Every process of a row
//! therefore holds the same hyperedges and every process of a column the same vertices.

use crate::error::HypergraphError;
use crate::hypergraph::Hypergraph;
use crate::util::block_range;

/// The shard of `global` held by process `(row, col)` of an `nprow x npcol` grid. Local indices
/// are offsets into the vertex and hyperedge blocks.
pub fn shard(
    global: &Hypergraph,
    nprow: usize,
    npcol: usize,
    row: usize,
    col: usize,
) -> Result<Hypergraph, HypergraphError> {
    let vtxs = block_range(global.nvtx(), npcol, col);
    let edges = block_range(global.nedge(), nprow, row);

    let mut hindex = Vec::with_capacity(edges.len() + 1);
    let mut hvertex = Vec::new();
    hindex.push(0);
    for e in edges.clone() {
        hvertex.extend(
            global
                .edge_pins(e)
                .iter()
                .copied()
                .filter(|v| vtxs.contains(v))
                .map(|v| v - vtxs.start),
        );
        hindex.push(hvertex.len());
    }

    let mut hg = Hypergraph::new(vtxs.len(), hindex, hvertex)?;
    if let Some(vwgt) = global.vwgts() {
        hg = hg.with_vwgt(vwgt[vtxs.clone()].to_vec())?;
    }
    if let Some(ewgt) = global.ewgts() {
        hg = hg.with_ewgt(ewgt[edges].to_vec())?;
    }
    Ok(hg)
}

/// The entries of the global `part` for the vertices of grid column `col`.
pub fn local_part(part: &[usize], npcol: usize, col: usize) -> Vec<usize> {
    part[block_range(part.len(), npcol, col)].to_vec()
}

/// Reassemble a global partition from the local partitions of grid columns `0..npcol`, in order.
pub fn gather_part<P: AsRef<[usize]>>(cols: &[P]) -> Vec<usize> {
    cols.iter().flat_map(|p| p.as_ref().iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> Hypergraph {
        Hypergraph::from_edges(5, [vec![0, 4], vec![1, 2, 3], vec![3, 4], vec![0]])
            .unwrap()
            .with_vwgt(vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
    }

    #[test]
    fn single_shard_is_the_whole() {
        assert_eq!(shard(&global(), 1, 1, 0, 0).unwrap(), global());
    }

    #[test]
    fn two_by_two() {
        let g = global();
        // vertices 0..3 | 3..5, edges 0..2 | 2..4
        let s = shard(&g, 2, 2, 0, 1).unwrap();
        assert_eq!(s.nvtx(), 2);
        assert_eq!(s.nedge(), 2);
        assert_eq!(s.edge_pins(0), &[1]);
        assert_eq!(s.edge_pins(1), &[0]);
        assert_eq!(s.vwgts(), Some(&[4.0, 5.0][..]));

        let s = shard(&g, 2, 2, 1, 0).unwrap();
        assert_eq!(s.edge_pins(0), &[] as &[usize]);
        assert_eq!(s.edge_pins(1), &[0]);

        let npins: usize = (0..2)
            .flat_map(|r| (0..2).map(move |c| (r, c)))
            .map(|(r, c)| shard(&g, 2, 2, r, c).unwrap().npins())
            .sum();
        assert_eq!(npins, g.npins());
    }

    #[test]
    fn part_slices() {
        let part = [0, 1, 1, 0, 1];
        let cols: Vec<_> = (0..3).map(|c| local_part(&part, 3, c)).collect();
        assert_eq!(cols, [vec![0, 1], vec![1, 0], vec![1]]);
        assert_eq!(gather_part(&cols), part);
    }
}
