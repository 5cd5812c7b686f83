//! Reachability check from the slack nodes.
//!
//! Nodes that cannot reach a pressure slack through active branches cannot
//! be solved and are taken out of service for the current solve; the same
//! holds for temperature slacks when a thermal pass is requested.

use log::{info, warn};

use crate::error::{PitError, PitResult};
use crate::idx::{branch, node, node_type};
use crate::table::Table;

/// Undirected CSR adjacency over active nodes via active branches.
struct Adjacency {
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
}

impl Adjacency {
    fn build(n_nodes: usize, branch_pit: &Table, branch_active: &[bool]) -> Self {
        let mut counts = vec![0usize; n_nodes];
        for b in 0..branch_pit.rows() {
            if !branch_active[b] {
                continue;
            }
            counts[branch_pit.at_usize(b, branch::FROM)] += 1;
            counts[branch_pit.at_usize(b, branch::TO)] += 1;
        }
        let mut offsets = Vec::with_capacity(n_nodes + 1);
        offsets.push(0);
        for c in &counts {
            offsets.push(offsets.last().copied().unwrap_or(0) + c);
        }
        let mut fill = offsets.clone();
        let mut neighbors = vec![0usize; offsets[n_nodes]];
        for b in 0..branch_pit.rows() {
            if !branch_active[b] {
                continue;
            }
            let f = branch_pit.at_usize(b, branch::FROM);
            let t = branch_pit.at_usize(b, branch::TO);
            neighbors[fill[f]] = t;
            fill[f] += 1;
            neighbors[fill[t]] = f;
            fill[t] += 1;
        }
        Self { offsets, neighbors }
    }

    fn neighbors(&self, n: usize) -> &[usize] {
        &self.neighbors[self.offsets[n]..self.offsets[n + 1]]
    }
}

/// Depth-first reachability from a seed set, restricted to active nodes.
fn reachable(adj: &Adjacency, seeds: &[usize], node_active: &[bool]) -> Vec<bool> {
    let mut seen = vec![false; node_active.len()];
    let mut stack: Vec<usize> = seeds
        .iter()
        .copied()
        .filter(|&s| node_active[s])
        .collect();
    for &s in &stack {
        seen[s] = true;
    }
    while let Some(n) = stack.pop() {
        for &m in adj.neighbors(n) {
            if node_active[m] && !seen[m] {
                seen[m] = true;
                stack.push(m);
            }
        }
    }
    seen
}

fn slack_rows(node_pit: &Table, type_col: usize, within: &[bool]) -> Vec<usize> {
    (0..node_pit.rows())
        .filter(|&n| within[n] && node_pit.at(n, type_col) == node_type::SLACK)
        .collect()
}

/// Identify nodes and branches supplied by a pressure slack (and, for
/// thermal runs, by a temperature slack).
///
/// Returns masks over the full pits; a `false` entry means the row is taken
/// out of service for this solve only.
pub fn check_connectivity(
    node_pit: &Table,
    branch_pit: &Table,
    check_heat: bool,
) -> PitResult<(Vec<bool>, Vec<bool>)> {
    let node_active: Vec<bool> = (0..node_pit.rows())
        .map(|n| node_pit.at(n, node::ACTIVE) != 0.0)
        .collect();
    let branch_active: Vec<bool> = (0..branch_pit.rows())
        .map(|b| {
            branch_pit.at(b, branch::ACTIVE) != 0.0
                && node_active[branch_pit.at_usize(b, branch::FROM)]
                && node_active[branch_pit.at_usize(b, branch::TO)]
        })
        .collect();

    if node_pit.is_empty() {
        return Ok((node_active, branch_active));
    }

    let adj = Adjacency::build(node_pit.rows(), branch_pit, &branch_active);

    let hyd_slacks = slack_rows(node_pit, node::TYPE, &node_active);
    if hyd_slacks.is_empty() {
        return Err(PitError::NoSlack {
            what: "no in-service pressure-fixed node in the network".into(),
        });
    }
    let mut nodes_connected = reachable(&adj, &hyd_slacks, &node_active);

    let dropped: Vec<usize> = (0..node_pit.rows())
        .filter(|&n| node_active[n] && !nodes_connected[n])
        .collect();
    if !dropped.is_empty() {
        info!(
            "connectivity check: setting {} node(s) out of service for hydraulics: {:?}",
            dropped.len(),
            dropped
        );
    }

    if check_heat {
        let heat_slacks = slack_rows(node_pit, node::TYPE_T, &nodes_connected);
        if heat_slacks.is_empty() {
            return Err(PitError::NoSlack {
                what: "no reachable temperature-fixed node for the thermal calculation".into(),
            });
        }
        let heat_connected = reachable(&adj, &heat_slacks, &nodes_connected);
        let heat_dropped = nodes_connected
            .iter()
            .zip(heat_connected.iter())
            .filter(|(h, t)| **h && !**t)
            .count();
        if heat_dropped > 0 {
            warn!(
                "connectivity check: {} node(s) unreachable from any temperature slack",
                heat_dropped
            );
        }
        nodes_connected = heat_connected;
    }

    let branches_connected: Vec<bool> = (0..branch_pit.rows())
        .map(|b| {
            branch_active[b]
                && nodes_connected[branch_pit.at_usize(b, branch::FROM)]
                && nodes_connected[branch_pit.at_usize(b, branch::TO)]
        })
        .collect();

    Ok((nodes_connected, branches_connected))
}
