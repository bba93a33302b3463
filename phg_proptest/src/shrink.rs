//! Greedy reduction of a failing case

use crate::case::{Case, Failure};

/// Whether `case` still fails the same way as the original.
fn still_fails(case: &Case, kind: &Failure) -> bool {
    match case.check() {
        Ok(_) => false,
        Err(f) => std::mem::discriminant(&f) == std::mem::discriminant(kind),
    }
}

/// Shrink `case` while it keeps failing like `kind`: first drop chunks of hyperedges, halving the
/// chunk size, then single vertices. Stops after `budget` checks.
pub fn shrink(mut case: Case, kind: &Failure, mut budget: usize) -> Case {
    let mut chunk = case.edges.len().div_ceil(2).max(1);
    while chunk > 0 && budget > 0 {
        let mut start = 0;
        let mut progress = false;
        while start < case.edges.len() && budget > 0 {
            let end = (start + chunk).min(case.edges.len());
            let candidate = case.without_edges(start..end);
            budget -= 1;
            if still_fails(&candidate, kind) {
                debug!("dropped edges {start}..{end}, {} left", candidate.edges.len());
                case = candidate;
                progress = true;
            } else {
                start = end;
            }
        }
        if !progress {
            chunk /= 2;
        }
    }

    let mut v = 0;
    while v < case.nvtx && budget > 0 {
        // keep at least one vertex per grid column
        if case.nvtx <= case.npcol {
            break;
        }
        let candidate = case.without_vertex(v);
        budget -= 1;
        if still_fails(&candidate, kind) {
            debug!("dropped vertex {v}, {} left", candidate.nvtx);
            case = candidate;
        } else {
            v += 1;
        }
    }

    info!(
        "shrunk to {} vertices, {} edges, {} pins",
        case.nvtx,
        case.edges.len(),
        case.npins()
    );
    case
}
