//! An in-process process grid: every simulated process runs on its own thread and collectives
//! rendezvous through shared memory.
//!
//! Contributions are always combined in rank order, so floating point reductions give the same
//! bits on every run and on every member.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex, MutexGuard};

use super::{Communicator, Element, GridComm, ReduceOp};

type Slot = Option<Box<dyn Any + Send>>;

struct Group {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
}

impl Group {
    fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
        })
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        // a poisoned lock means another simulated process panicked mid-collective; the slot
        // table itself is still consistent
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn post<T: Element>(&self, rank: usize, buf: &[T]) {
        self.slots()[rank] = Some(Box::new(buf.to_vec()));
    }

    /// Combine the posted buffers of all members, in rank order, into `out`.
    fn fold_into<T: Element>(&self, op: ReduceOp, out: &mut [T]) {
        let slots = self.slots();
        for (rank, slot) in slots.iter().enumerate() {
            let contrib = downcast::<T>(slot, rank);
            assert_eq!(contrib.len(), out.len(), "collective length mismatch at rank {rank}");
            if rank == 0 {
                out.copy_from_slice(contrib);
            } else {
                for (o, &c) in out.iter_mut().zip(contrib) {
                    *o = T::combine(op, *o, c);
                }
            }
        }
        if op == ReduceOp::LogicalOr && slots.len() == 1 {
            for o in out.iter_mut() {
                *o = T::combine(op, *o, T::default());
            }
        }
    }

    fn copy_from<T: Element>(&self, rank: usize, out: &mut [T]) {
        let slots = self.slots();
        let contrib = downcast::<T>(&slots[rank], rank);
        assert_eq!(contrib.len(), out.len(), "broadcast length mismatch");
        out.copy_from_slice(contrib);
    }
}

fn downcast<T: Element>(slot: &Slot, rank: usize) -> &[T] {
    slot.as_ref()
        .and_then(|b| b.downcast_ref::<Vec<T>>())
        .unwrap_or_else(|| panic!("rank {rank} did not post a matching collective"))
}

/// One member's handle on a group of a [`LocalGrid`].
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    group: Arc<Group>,
}

impl LocalComm {
    /// Create the handles of a standalone group of `size` members.
    pub fn group(size: usize) -> Vec<Self> {
        let group = Group::new(size);
        (0..size)
            .map(|rank| Self {
                rank,
                group: Arc::clone(&group),
            })
            .collect()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.size
    }

    fn all_reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T]) {
        self.group.post(self.rank, buf);
        self.group.barrier.wait();
        self.group.fold_into(op, buf);
        // nobody may post the next collective before everyone has read this one
        self.group.barrier.wait();
    }

    fn reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T], root: usize) {
        assert!(root < self.group.size);
        self.group.post(self.rank, buf);
        self.group.barrier.wait();
        if self.rank == root {
            self.group.fold_into(op, buf);
        }
        self.group.barrier.wait();
    }

    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize) {
        assert!(root < self.group.size);
        if self.rank == root {
            self.group.post(self.rank, buf);
        }
        self.group.barrier.wait();
        if self.rank != root {
            self.group.copy_from(root, buf);
        }
        self.group.barrier.wait();
    }
}

/// An `nprow x npcol` grid of simulated processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalGrid {
    nprow: usize,
    npcol: usize,
}

impl LocalGrid {
    pub fn new(nprow: usize, npcol: usize) -> Self {
        assert!(nprow > 0 && npcol > 0, "grid must have at least one process");
        Self { nprow, npcol }
    }

    pub fn nprow(&self) -> usize {
        self.nprow
    }

    pub fn npcol(&self) -> usize {
        self.npcol
    }

    pub fn nprocs(&self) -> usize {
        self.nprow * self.npcol
    }

    /// Run `f(row, col, comm)` once per grid position, each on its own thread, and return the
    /// results in row-major order. A panic in any process is resumed on the calling thread.
    pub fn run<F, R>(&self, f: F) -> Vec<R>
    where
        F: Fn(usize, usize, GridComm<LocalComm>) -> R + Sync,
        R: Send,
    {
        // handles come out in rank order: row groups are ranked by column, column groups by row
        let mut rows: Vec<_> = (0..self.nprow)
            .map(|_| LocalComm::group(self.npcol).into_iter())
            .collect();
        let mut cols: Vec<_> = (0..self.npcol)
            .map(|_| LocalComm::group(self.nprow).into_iter())
            .collect();

        let mut comms = Vec::with_capacity(self.nprocs());
        for r in 0..self.nprow {
            for c in 0..self.npcol {
                let row = rows[r].next().expect("one row handle per column");
                let col = cols[c].next().expect("one column handle per row");
                comms.push((r, c, GridComm::new(row, col)));
            }
        }

        let f = &f;
        std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|(r, c, comm)| s.spawn(move || f(r, c, comm)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_reduce_sums_in_rank_order() {
        let grid = LocalGrid::new(1, 4);
        let res = grid.run(|_, c, comm| {
            let mut buf = [c as f64, 1.0];
            comm.row.all_reduce(ReduceOp::Sum, &mut buf);
            buf
        });
        assert!(res.iter().all(|b| *b == [6.0, 4.0]));
    }

    #[test]
    fn reduce_only_reaches_root() {
        let grid = LocalGrid::new(3, 1);
        let res = grid.run(|r, _, comm| {
            let mut buf = [r as i64 + 1];
            comm.col.reduce(ReduceOp::Max, &mut buf, 1);
            buf[0]
        });
        assert_eq!(res, vec![1, 3, 3]);
    }

    #[test]
    fn broadcast_from_root() {
        let grid = LocalGrid::new(2, 2);
        let res = grid.run(|r, c, comm| {
            let mut buf = [10 * r + c; 3];
            comm.col.broadcast(&mut buf, 1);
            let from_row = comm.row.broadcast_scalar(c as u32, 0);
            (buf, from_row)
        });
        // column c receives row 1's buffer, which is 10 + c
        assert_eq!(res[0].0, [10; 3]);
        assert_eq!(res[1].0, [11; 3]);
        assert_eq!(res[2].0, [10; 3]);
        assert_eq!(res[3].0, [11; 3]);
        assert!(res.iter().all(|r| r.1 == 0));
    }

    #[test]
    fn groups_are_independent() {
        let grid = LocalGrid::new(2, 3);
        let res = grid.run(|r, c, comm| {
            assert_eq!(comm.position(), (r, c));
            assert_eq!(comm.shape(), (2, 3));
            let rsum = comm.row.all_reduce_scalar(ReduceOp::Sum, 1usize);
            let csum = comm.col.all_reduce_scalar(ReduceOp::Sum, 1usize);
            let any = comm.row.all_reduce_scalar(ReduceOp::LogicalOr, (c == 2) as u32);
            (comm.world_rank(), rsum, csum, any)
        });
        for (i, (rank, rsum, csum, any)) in res.into_iter().enumerate() {
            assert_eq!(rank, i);
            assert_eq!(rsum, 3);
            assert_eq!(csum, 2);
            assert_eq!(any, 1);
        }
    }

    #[test]
    fn single_member_logical_or_normalizes() {
        let grid = LocalGrid::new(1, 1);
        let res = grid.run(|_, _, comm| comm.row.all_reduce_scalar(ReduceOp::LogicalOr, 7u32));
        assert_eq!(res, vec![1]);
    }
}
