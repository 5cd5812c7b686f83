//! Projection of the full pit onto the rows participating in the solve.

use crate::idx::{branch, node};
use crate::table::Table;

/// The active pit plus the translations back to the full pit.
#[derive(Debug, Clone)]
pub struct ActivePit {
    pub node: Table,
    pub branch: Table,
    /// Full-pit masks recorded for scatter-back.
    pub nodes_connected: Vec<bool>,
    pub branches_connected: Vec<bool>,
    /// Active row → full-pit row.
    pub node_rows: Vec<usize>,
    pub branch_rows: Vec<usize>,
    /// Full-pit row → active row (valid where the mask is true).
    pub node_full_to_active: Vec<usize>,
}

/// Build the active pit. `FROM`/`TO` columns of the active branch pit are
/// remapped to active node rows; row order within each component group is
/// preserved.
pub fn reduce_pit(
    node_pit: &Table,
    branch_pit: &Table,
    nodes_connected: Vec<bool>,
    branches_connected: Vec<bool>,
) -> ActivePit {
    let node = node_pit.select_rows(&nodes_connected);
    let mut branch = branch_pit.select_rows(&branches_connected);

    let mut node_full_to_active = vec![usize::MAX; node_pit.rows()];
    let mut node_rows = Vec::with_capacity(node.rows());
    for (full, &keep) in nodes_connected.iter().enumerate() {
        if keep {
            node_full_to_active[full] = node_rows.len();
            node_rows.push(full);
        }
    }
    let branch_rows: Vec<usize> = branches_connected
        .iter()
        .enumerate()
        .filter_map(|(b, &keep)| keep.then_some(b))
        .collect();

    for b in 0..branch.rows() {
        let from_full = branch.at_usize(b, branch::FROM);
        let to_full = branch.at_usize(b, branch::TO);
        branch.set(b, branch::FROM, node_full_to_active[from_full] as f64);
        branch.set(b, branch::TO, node_full_to_active[to_full] as f64);
    }

    ActivePit {
        node,
        branch,
        nodes_connected,
        branches_connected,
        node_rows,
        branch_rows,
        node_full_to_active,
    }
}

impl ActivePit {
    /// Write the solved state back into the full pit.
    ///
    /// Out-of-service rows get NaN state so their results read as NaN; the
    /// full pit keeps its own `FROM`/`TO` indices.
    pub fn scatter_back(&self, node_pit: &mut Table, branch_pit: &mut Table) {
        for (active, &full) in self.node_rows.iter().enumerate() {
            node_pit.row_mut(full).copy_from_slice(self.node.row(active));
        }
        for full in 0..node_pit.rows() {
            if !self.nodes_connected[full] {
                node_pit.set(full, node::P, f64::NAN);
                node_pit.set(full, node::T, f64::NAN);
            }
        }

        for (active, &full) in self.branch_rows.iter().enumerate() {
            let from = branch_pit.at(full, branch::FROM);
            let to = branch_pit.at(full, branch::TO);
            branch_pit
                .row_mut(full)
                .copy_from_slice(self.branch.row(active));
            branch_pit.set(full, branch::FROM, from);
            branch_pit.set(full, branch::TO, to);
            branch_pit.set(full, branch::FROM_T, from);
            branch_pit.set(full, branch::TO_T, to);
        }
        for full in 0..branch_pit.rows() {
            if !self.branches_connected[full] {
                branch_pit.set(full, branch::V, f64::NAN);
                branch_pit.set(full, branch::T_OUT, f64::NAN);
                branch_pit.set(full, branch::MDOT, f64::NAN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx::{branch, node};

    fn pits() -> (Table, Table) {
        // 4 nodes, 3 branches in a chain 0-1-2-3
        let mut node_pit = Table::zeros(4, node::COLS);
        for n in 0..4 {
            node_pit.set(n, node::ACTIVE, 1.0);
            node_pit.set(n, node::P, 1.0 + n as f64);
        }
        let mut branch_pit = Table::zeros(3, branch::COLS);
        for b in 0..3 {
            branch_pit.set(b, branch::FROM, b as f64);
            branch_pit.set(b, branch::TO, (b + 1) as f64);
            branch_pit.set(b, branch::ACTIVE, 1.0);
            branch_pit.set(b, branch::V, 0.5);
        }
        (node_pit, branch_pit)
    }

    #[test]
    fn identity_reduction_keeps_indices() {
        let (node_pit, branch_pit) = pits();
        let active = reduce_pit(
            &node_pit,
            &branch_pit,
            vec![true; 4],
            vec![true; 3],
        );
        assert_eq!(active.node.rows(), 4);
        assert_eq!(active.branch.rows(), 3);
        assert_eq!(active.branch.at_usize(2, branch::FROM), 2);
    }

    #[test]
    fn reduction_remaps_from_to() {
        let (node_pit, branch_pit) = pits();
        // node 1 and branches touching it are out of service
        let active = reduce_pit(
            &node_pit,
            &branch_pit,
            vec![true, false, true, true],
            vec![false, false, true],
        );
        assert_eq!(active.node.rows(), 3);
        assert_eq!(active.branch.rows(), 1);
        // full branch 2 connected full nodes 2->3 which are active rows 1->2
        assert_eq!(active.branch.at_usize(0, branch::FROM), 1);
        assert_eq!(active.branch.at_usize(0, branch::TO), 2);
        assert_eq!(active.node_rows, vec![0, 2, 3]);
    }

    #[test]
    fn scatter_back_restores_and_nans() {
        let (mut node_pit, mut branch_pit) = pits();
        let mut active = reduce_pit(
            &node_pit,
            &branch_pit,
            vec![true, false, true, true],
            vec![false, false, true],
        );
        active.node.set(1, node::P, 9.0); // full node 2
        active.branch.set(0, branch::V, 2.5); // full branch 2
        active.scatter_back(&mut node_pit, &mut branch_pit);

        assert_eq!(node_pit.at(2, node::P), 9.0);
        assert!(node_pit.at(1, node::P).is_nan());
        assert_eq!(branch_pit.at(2, branch::V), 2.5);
        assert!(branch_pit.at(0, branch::V).is_nan());
        // full-pit indices survive
        assert_eq!(branch_pit.at_usize(2, branch::FROM), 2);
        assert_eq!(branch_pit.at_usize(2, branch::TO), 3);
    }
}
