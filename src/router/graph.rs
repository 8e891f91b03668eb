// Route graph builder and enumerator
// Candidates live in one arena and are referenced by index; each tree level
// carries a bitset of the source chains already used above it
//
// Numan Thabit 2025 Nov

use crate::networks::ChainId;
use crate::router::routes::{route_amount_in, route_priority, Path, Route};
use alloy_primitives::U256;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

struct Node {
    candidate: usize,
    children: Vec<Node>,
}

struct Arena<'a> {
    candidates: &'a [Path],
    chain_bits: Vec<Option<u64>>,
}

impl<'a> Arena<'a> {
    fn new(candidates: &'a [Path]) -> Self {
        let mut index: HashMap<ChainId, u32> = HashMap::new();
        let chain_bits = candidates
            .iter()
            .map(|p| {
                let next = index.len() as u32;
                let bit = *index.entry(p.from_chain.chain_id).or_insert(next);
                1u64.checked_shl(bit)
            })
            .collect();
        Self {
            candidates,
            chain_bits,
        }
    }

    fn build(&self, remaining: U256, used_chains: u64) -> Vec<Node> {
        let mut level = Vec::new();
        for (idx, path) in self.candidates.iter().enumerate() {
            let Some(bit) = self.chain_bits[idx] else {
                continue;
            };
            if used_chains & bit != 0 {
                continue;
            }

            let mut node = Node {
                candidate: idx,
                children: Vec::new(),
            };
            if path.amount_in < remaining {
                node.children = self.build(remaining - path.amount_in, used_chains | bit);
                if node.children.is_empty() {
                    continue;
                }
            }
            level.push(node);
        }
        level
    }

    fn flatten(&self, nodes: &[Node], prefix: &mut Vec<usize>, out: &mut Vec<Route>) {
        for node in nodes {
            prefix.push(node.candidate);
            if node.children.is_empty() {
                out.push(prefix.iter().map(|&i| self.candidates[i].clone()).collect());
            } else {
                self.flatten(&node.children, prefix, out);
            }
            prefix.pop();
        }
    }
}

/// Whether `route` covers exactly `amount_in` and honours every lock: each
/// positive lock is present with its exact amount and no zero-locked chain
/// is used.
pub fn satisfies_locks(route: &[Path], amount_in: U256, locked: &BTreeMap<ChainId, U256>) -> bool {
    if route_amount_in(route) != amount_in {
        return false;
    }
    for path in route {
        if let Some(lock) = locked.get(&path.from_chain.chain_id) {
            if lock.is_zero() || path.amount_in != *lock {
                return false;
            }
        }
    }
    locked
        .iter()
        .filter(|(_, lock)| !lock.is_zero())
        .all(|(chain, _)| route.iter().any(|p| p.from_chain.chain_id == *chain))
}

/// All routes over `candidates` that sum to `amount_in` without reusing a
/// source chain, ordered by chain priority.
pub fn enumerate(amount_in: U256, candidates: &[Path], locked: &BTreeMap<ChainId, U256>) -> Vec<Route> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let arena = Arena::new(candidates);
    let skipped = arena.chain_bits.iter().filter(|b| b.is_none()).count();
    if skipped > 0 {
        warn!(skipped, "too many source chains, candidates left out of the route graph");
    }

    let tree = arena.build(amount_in, 0);
    let mut routes = Vec::new();
    arena.flatten(&tree, &mut Vec::new(), &mut routes);

    routes.retain(|route| satisfies_locks(route, amount_in, locked));
    routes.sort_by_key(|route| route_priority(route));
    routes
}
