//! Max priority queue of vertices keyed by gain.
//!
//! Augmented with a locator so that a vertex's key can be changed, or its presence tested, in
//! O(log n) / O(1) given only the vertex id.

use crate::error::RefineResult;
use crate::wspace::try_alloc;

#[derive(Default, Clone, Copy, Debug)]
struct Node {
    key: f64,
    val: usize,
}

pub struct GainHeap {
    nnodes: usize,
    locator: Box<[Option<usize>]>,
    heap: Box<[Node]>,
}

impl GainHeap {
    /// Create an empty heap able to hold the vertices `0..maxnodes`.
    pub fn new(maxnodes: usize) -> RefineResult<Self> {
        Ok(Self {
            nnodes: 0,
            locator: try_alloc("heap locator", maxnodes, None)?.into_boxed_slice(),
            heap: try_alloc("heap", maxnodes, Node::default())?.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.nnodes
    }

    pub fn is_empty(&self) -> bool {
        self.nnodes == 0
    }

    pub fn has(&self, vtx: usize) -> bool {
        self.locator[vtx].is_some()
    }

    /// Remove every item. O(n) in the number of items present.
    pub fn clear(&mut self) {
        for i in 0..self.nnodes {
            self.locator[self.heap[i].val] = None;
        }
        self.nnodes = 0;
    }

    /// Insert `vtx` with key `gain`, keeping the heap ordered.
    pub fn insert(&mut self, vtx: usize, gain: f64) {
        debug_assert!(self.locator[vtx].is_none(), "vertex {vtx} already queued");
        let i = self.nnodes;
        self.nnodes += 1;
        self.heap[i] = Node { key: gain, val: vtx };
        self.locator[vtx] = Some(i);
        self.sift_up(i);
        debug_assert!(self.check_heap());
    }

    /// Append `vtx` without restoring the heap order. Call [`GainHeap::make`] before any other
    /// operation.
    pub fn input(&mut self, vtx: usize, gain: f64) {
        debug_assert!(self.locator[vtx].is_none(), "vertex {vtx} already queued");
        let i = self.nnodes;
        self.nnodes += 1;
        self.heap[i] = Node { key: gain, val: vtx };
        self.locator[vtx] = Some(i);
    }

    /// Restore the heap order after a series of [`GainHeap::input`] calls. O(n).
    pub fn make(&mut self) {
        for i in (0..self.nnodes / 2).rev() {
            self.sift_down(i);
        }
        debug_assert!(self.check_heap());
    }

    /// Remove and return the vertex with the largest key, or `None` if the heap is empty.
    pub fn extract_max(&mut self) -> Option<usize> {
        if self.nnodes == 0 {
            return None;
        }

        let top = self.heap[0].val;
        self.locator[top] = None;
        self.nnodes -= 1;

        if self.nnodes > 0 {
            self.heap[0] = self.heap[self.nnodes];
            self.locator[self.heap[0].val] = Some(0);
            self.sift_down(0);
        }

        debug_assert!(self.check_heap());
        Some(top)
    }

    /// Largest key and its vertex, without removing it.
    pub fn peek_max(&self) -> Option<(usize, f64)> {
        (self.nnodes > 0).then(|| (self.heap[0].val, self.heap[0].key))
    }

    /// The current key of `vtx`, if present.
    pub fn key_of(&self, vtx: usize) -> Option<f64> {
        self.locator[vtx].map(|i| self.heap[i].key)
    }

    /// Change the key of a vertex that is in the heap.
    pub fn change_value(&mut self, vtx: usize, gain: f64) {
        let Some(i) = self.locator[vtx] else {
            debug_assert!(false, "vertex {vtx} is not queued");
            return;
        };
        let oldkey = self.heap[i].key;
        self.heap[i].key = gain;
        if gain > oldkey {
            self.sift_up(i);
        } else if gain < oldkey {
            self.sift_down(i);
        }
        debug_assert!(self.check_heap());
    }

    fn sift_up(&mut self, mut i: usize) {
        let node = self.heap[i];
        while i > 0 {
            let j = (i - 1) >> 1;
            if node.key > self.heap[j].key {
                self.heap[i] = self.heap[j];
                self.locator[self.heap[i].val] = Some(i);
                i = j;
            } else {
                break;
            }
        }
        self.heap[i] = node;
        self.locator[node.val] = Some(i);
    }

    fn sift_down(&mut self, mut i: usize) {
        let node = self.heap[i];
        let nnodes = self.nnodes;
        loop {
            let mut j = (i << 1) + 1;
            if j >= nnodes {
                break;
            }
            if j + 1 < nnodes && self.heap[j + 1].key > self.heap[j].key {
                j += 1;
            }
            if self.heap[j].key > node.key {
                self.heap[i] = self.heap[j];
                self.locator[self.heap[i].val] = Some(i);
                i = j;
            } else {
                break;
            }
        }
        self.heap[i] = node;
        self.locator[node.val] = Some(i);
    }

    /// This function checks the consistency of the heap
    pub fn check_heap(&self) -> bool {
        let heap = &self.heap;
        let locator = &self.locator;
        let nnodes = self.nnodes;

        for i in 0..nnodes {
            assert_eq!(locator[heap[i].val], Some(i));
            if i > 0 {
                assert!(heap[i].key <= heap[(i - 1) / 2].key);
            }
        }

        let present = locator.iter().filter(|l| l.is_some()).count();
        assert_eq!(present, nnodes);

        true
    }
}
