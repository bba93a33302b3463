//! Random hypergraphs and bisections for tests and the stress harness

use fastrand::Rng;

use crate::error::HypergraphError;
use crate::hypergraph::Hypergraph;

pub struct HypergraphBuilder {
    rng: Rng,
    nvtx: usize,
    edges: Vec<Vec<usize>>,
    vwgt: Option<Vec<f64>>,
    ewgt: Option<Vec<f64>>,
}

impl HypergraphBuilder {
    pub fn new(nvtx: usize, seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
            nvtx,
            edges: Vec::new(),
            vwgt: None,
            ewgt: None,
        }
    }

    pub fn nvtx(&self) -> usize {
        self.nvtx
    }

    pub fn nedge(&self) -> usize {
        self.edges.len()
    }

    /// `k` distinct vertices out of `pool`, by a partial shuffle.
    fn sample(rng: &mut Rng, pool: &mut [usize], k: usize) -> Vec<usize> {
        let k = k.min(pool.len());
        for i in 0..k {
            let j = rng.usize(i..pool.len());
            pool.swap(i, j);
        }
        pool[..k].to_vec()
    }

    /// Add `nedge` hyperedges over uniformly chosen vertices, each with 1 to `max_size` pins.
    pub fn random_edges(&mut self, nedge: usize, max_size: usize) -> &mut Self {
        if self.nvtx == 0 {
            return self;
        }
        let mut pool: Vec<usize> = (0..self.nvtx).collect();
        for _ in 0..nedge {
            let size = self.rng.usize(1..=max_size.max(1));
            let edge = Self::sample(&mut self.rng, &mut pool, size);
            self.edges.push(edge);
        }
        self
    }

    /// Add `nedge` hyperedges whose pins lie in a window of `window` consecutive vertices, so that
    /// contiguous bisections cut few of them.
    pub fn local_edges(&mut self, nedge: usize, max_size: usize, window: usize) -> &mut Self {
        if self.nvtx == 0 {
            return self;
        }
        let window = window.clamp(1, self.nvtx);
        for _ in 0..nedge {
            let start = self.rng.usize(0..=self.nvtx - window);
            let mut pool: Vec<usize> = (start..start + window).collect();
            let size = self.rng.usize(1..=max_size.max(1));
            let edge = Self::sample(&mut self.rng, &mut pool, size);
            self.edges.push(edge);
        }
        self
    }

    /// Integer valued vertex weights in `1..=max`.
    pub fn random_vwgt(&mut self, max: u32) -> &mut Self {
        let rng = &mut self.rng;
        self.vwgt = Some((0..self.nvtx).map(|_| rng.u32(1..=max.max(1)) as f64).collect());
        self
    }

    /// Integer valued hyperedge weights in `1..=max`. Call after the edges are added.
    pub fn random_ewgt(&mut self, max: u32) -> &mut Self {
        let rng = &mut self.rng;
        self.ewgt = Some(
            (0..self.edges.len())
                .map(|_| rng.u32(1..=max.max(1)) as f64)
                .collect(),
        );
        self
    }

    /// A random bisection with the vertex counts of the two sides differing by at most one.
    pub fn random_bisection(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nvtx).collect();
        self.rng.shuffle(&mut order);
        let mut part = vec![1; self.nvtx];
        for &v in &order[..self.nvtx / 2] {
            part[v] = 0;
        }
        part
    }

    /// Every vertex on side 0 with probability `p0`, independently.
    pub fn random_labels(&mut self, p0: f64) -> Vec<usize> {
        (0..self.nvtx)
            .map(|_| if self.rng.f64() < p0 { 0 } else { 1 })
            .collect()
    }

    pub fn build(&self) -> Result<Hypergraph, HypergraphError> {
        let mut hg = Hypergraph::from_edges(self.nvtx, &self.edges)?;
        if let Some(vwgt) = &self.vwgt {
            hg = hg.with_vwgt(vwgt.clone())?;
        }
        if let Some(ewgt) = &self.ewgt {
            hg = hg.with_ewgt(ewgt.clone())?;
        }
        Ok(hg)
    }
}
