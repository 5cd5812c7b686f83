//! Index translations between element tables and the pits.

use crate::kind::BranchKind;

/// All lookups needed to move between the three index layers: external
/// element tables, the full pit, and (via [`crate::reduce::ActivePit`]) the
/// active pit.
///
/// Invariants:
/// - each external (table, element) owns a contiguous pit slice,
/// - junction `j` owns node row `j`,
/// - a pipe with N sections owns N branch rows and N−1 internal node rows
///   placed between its endpoints in section order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    /// Number of junction rows at the head of the node pit.
    pub n_junctions: usize,
    /// Total node count (junctions + internal pipe nodes).
    pub n_nodes: usize,
    /// Total branch count (pipes counted per section).
    pub n_branches: usize,
    /// Per-pipe internal node range in the node pit (empty for sections=1).
    pub pipe_internal_nodes: Vec<(usize, usize)>,
    /// Per-pipe branch row range.
    pub pipe_branches: Vec<(usize, usize)>,
    /// Per-kind contiguous branch row ranges, in pit order.
    pub branch_groups: Vec<(BranchKind, usize, usize)>,
}

impl Lookups {
    /// Branch row range of a kind; empty range when absent.
    pub fn group(&self, kind: BranchKind) -> (usize, usize) {
        self.branch_groups
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|(_, f, t)| (*f, *t))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_group_is_empty() {
        let l = Lookups::default();
        assert_eq!(l.group(BranchKind::Pump), (0, 0));
    }

    #[test]
    fn group_lookup_finds_range() {
        let l = Lookups {
            branch_groups: vec![(BranchKind::Pipe, 0, 5), (BranchKind::Valve, 5, 7)],
            ..Lookups::default()
        };
        assert_eq!(l.group(BranchKind::Pipe), (0, 5));
        assert_eq!(l.group(BranchKind::Valve), (5, 7));
    }
}
