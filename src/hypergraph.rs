//! The process-local hypergraph shard

use crate::error::HypergraphError;
use crate::util::make_csr;

/// A process-local shard of a hypergraph.
///
/// Stores both directions of the pin relation in CSR form: `hindex/hvertex` maps each hyperedge
/// to its (local) vertices and `vindex/vedge` maps each vertex to its (local) hyperedges. Missing
/// weight arrays mean unit weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hypergraph {
    nvtx: usize,
    vindex: Vec<usize>,
    vedge: Vec<usize>,
    hindex: Vec<usize>,
    hvertex: Vec<usize>,
    vwgt: Option<Vec<f64>>,
    ewgt: Option<Vec<f64>>,
}

impl Hypergraph {
    /// Build a shard from the edge-to-vertex CSR. The vertex-to-edge CSR is derived from it.
    pub fn new(
        nvtx: usize,
        hindex: Vec<usize>,
        hvertex: Vec<usize>,
    ) -> Result<Self, HypergraphError> {
        let npins = hvertex.len();
        if hindex.first().copied().unwrap_or(0) != 0 {
            return Err(HypergraphError::BadIndex { edge: 0, npins });
        }
        let nedge = hindex.len().saturating_sub(1);
        for (edge, w) in hindex.windows(2).enumerate() {
            if w[0] > w[1] || w[1] > npins {
                return Err(HypergraphError::BadIndex { edge, npins });
            }
        }
        if hindex.last().copied().unwrap_or(0) != npins {
            return Err(HypergraphError::BadIndex { edge: nedge, npins });
        }

        // duplicate pins would double count in the pin distribution
        let mut seen = vec![usize::MAX; nvtx];
        let mut vindex = vec![0; nvtx + 1];
        for edge in 0..nedge {
            for &vtx in &hvertex[hindex[edge]..hindex[edge + 1]] {
                if vtx >= nvtx {
                    return Err(HypergraphError::PinOutOfRange { edge, vtx, nvtx });
                }
                if seen[vtx] == edge {
                    return Err(HypergraphError::DuplicatePin { edge, vtx });
                }
                seen[vtx] = edge;
                vindex[vtx] += 1;
            }
        }
        make_csr(&mut vindex);

        let mut vedge = vec![0; npins];
        let mut fill = vindex.clone();
        for edge in 0..nedge {
            for &vtx in &hvertex[hindex[edge]..hindex[edge + 1]] {
                vedge[fill[vtx]] = edge;
                fill[vtx] += 1;
            }
        }

        let hindex = if hindex.is_empty() { vec![0] } else { hindex };

        Ok(Self {
            nvtx,
            vindex,
            vedge,
            hindex,
            hvertex,
            vwgt: None,
            ewgt: None,
        })
    }

    /// Build a shard from a list of hyperedges given as vertex lists.
    ///
    /// ```
    /// # use phg::Hypergraph;
    /// let hg = Hypergraph::from_edges(4, vec![vec![0, 1, 2], vec![2, 3]]).unwrap();
    /// assert_eq!(hg.nedge(), 2);
    /// assert_eq!(hg.vertex_edges(2), &[0, 1]);
    /// ```
    pub fn from_edges<I, E>(nvtx: usize, edges: I) -> Result<Self, HypergraphError>
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[usize]>,
    {
        let mut hindex = vec![0];
        let mut hvertex = vec![];
        for edge in edges {
            hvertex.extend_from_slice(edge.as_ref());
            hindex.push(hvertex.len());
        }
        Self::new(nvtx, hindex, hvertex)
    }

    /// Attach vertex weights.
    pub fn with_vwgt(mut self, vwgt: Vec<f64>) -> Result<Self, HypergraphError> {
        check_weights("vwgt", &vwgt, self.nvtx)?;
        self.vwgt = Some(vwgt);
        Ok(self)
    }

    /// Attach hyperedge weights.
    pub fn with_ewgt(mut self, ewgt: Vec<f64>) -> Result<Self, HypergraphError> {
        check_weights("ewgt", &ewgt, self.nedge())?;
        self.ewgt = Some(ewgt);
        Ok(self)
    }

    pub fn nvtx(&self) -> usize {
        self.nvtx
    }

    pub fn nedge(&self) -> usize {
        self.hindex.len() - 1
    }

    /// Number of local pins.
    pub fn npins(&self) -> usize {
        self.hvertex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nvtx == 0 && self.nedge() == 0
    }

    /// The local hyperedges incident to `vtx`.
    #[inline]
    pub fn vertex_edges(&self, vtx: usize) -> &[usize] {
        &self.vedge[self.vindex[vtx]..self.vindex[vtx + 1]]
    }

    /// The local vertices of `edge`.
    #[inline]
    pub fn edge_pins(&self, edge: usize) -> &[usize] {
        &self.hvertex[self.hindex[edge]..self.hindex[edge + 1]]
    }

    /// Number of local pins of `edge`.
    #[inline]
    pub fn local_degree(&self, edge: usize) -> usize {
        self.hindex[edge + 1] - self.hindex[edge]
    }

    #[inline]
    pub fn vwgt(&self, vtx: usize) -> f64 {
        self.vwgt.as_ref().map_or(1.0, |w| w[vtx])
    }

    #[inline]
    pub fn ewgt(&self, edge: usize) -> f64 {
        self.ewgt.as_ref().map_or(1.0, |w| w[edge])
    }

    pub fn vwgts(&self) -> Option<&[f64]> {
        self.vwgt.as_deref()
    }

    pub fn ewgts(&self) -> Option<&[f64]> {
        self.ewgt.as_deref()
    }

    pub fn hindex(&self) -> &[usize] {
        &self.hindex
    }

    pub fn hvertex(&self) -> &[usize] {
        &self.hvertex
    }

    pub fn vindex(&self) -> &[usize] {
        &self.vindex
    }

    pub fn vedge(&self) -> &[usize] {
        &self.vedge
    }

    /// Iterator over the pin lists of all local hyperedges.
    pub fn edges_iter(&self) -> impl Iterator<Item = &[usize]> {
        self.hindex.windows(2).map(|w| &self.hvertex[w[0]..w[1]])
    }

    /// Sum of the weights of the local vertices in each part.
    pub fn part_weights(&self, part: &[usize]) -> [f64; 2] {
        let mut pwgts = [0.0; 2];
        for vtx in 0..self.nvtx {
            pwgts[part[vtx]] += self.vwgt(vtx);
        }
        pwgts
    }

    /// Checks that the two CSR directions describe the same pin set.
    pub fn check(&self) -> bool {
        if self.vindex.len() != self.nvtx + 1 || self.vedge.len() != self.hvertex.len() {
            return false;
        }
        let mut count = 0;
        for vtx in 0..self.nvtx {
            for &edge in self.vertex_edges(vtx) {
                if !self.edge_pins(edge).contains(&vtx) {
                    return false;
                }
                count += 1;
            }
        }
        count == self.npins()
    }
}

fn check_weights(what: &'static str, wgts: &[f64], expected: usize) -> Result<(), HypergraphError> {
    if wgts.len() != expected {
        return Err(HypergraphError::WeightLength {
            what,
            expected,
            actual: wgts.len(),
        });
    }
    if let Some((idx, &val)) = wgts
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(HypergraphError::BadWeight { what, idx, val });
    }
    Ok(())
}
