//! Sparse system assembly and the direct linear solve.
//!
//! The Jacobian is assembled from triplets into CSR; the unknown vector is
//! `[Δp at active nodes | Δv at active branches]` for hydraulics and
//! `[ΔT | ΔT_out]` for the thermal system. With structure caching enabled
//! the triplet→CSR slot mapping is computed once and only the values are
//! refreshed on subsequent iterations.

use nalgebra::{DMatrix, DVector};
use sprs::{CsMat, TriMat};

use pf_pit::idx::{branch, node, node_type};
use pf_pit::ActivePit;

use crate::components::ComponentContext;
use crate::error::{PipeflowError, PipeflowResult};

/// Raw triplet system plus its right-hand side.
pub struct System {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub vals: Vec<f64>,
    pub rhs: DVector<f64>,
    pub size: usize,
}

/// Assemble the hydraulic Jacobian and load vector from the pit columns.
pub fn hydraulic_system(active: &ActivePit, ctx: &ComponentContext) -> System {
    let n = active.node.rows();
    let nb = active.branch.rows();
    let size = n + nb;

    let mut rows = Vec::with_capacity(5 * nb + n);
    let mut cols = Vec::with_capacity(5 * nb + n);
    let mut vals = Vec::with_capacity(5 * nb + n);
    let mut rhs = DVector::zeros(size);

    // Node part of the load vector: demand plus signed branch flows.
    for i in 0..n {
        rhs[i] = -active.node.at(i, node::LOAD);
    }

    for b in 0..nb {
        let from = active.branch.at_usize(b, branch::FROM);
        let to = active.branch.at_usize(b, branch::TO);
        let brow = n + b;

        // Momentum row of the branch.
        rows.push(brow);
        cols.push(brow);
        vals.push(active.branch.at(b, branch::JAC_DV));
        rows.push(brow);
        cols.push(from);
        vals.push(active.branch.at(b, branch::JAC_DP_FROM));
        rows.push(brow);
        cols.push(to);
        vals.push(active.branch.at(b, branch::JAC_DP_TO));
        rhs[brow] = active.branch.at(b, branch::LOAD_VEC);

        // Mass-balance coupling of the endpoint nodes.
        let mdot = active.branch.at(b, branch::MDOT);
        let dv_node = active.branch.at(b, branch::JAC_DV_NODE);
        if active.node.at(from, node::TYPE) != node_type::SLACK {
            rows.push(from);
            cols.push(brow);
            vals.push(dv_node);
            rhs[from] -= mdot;
        }
        if active.node.at(to, node::TYPE) != node_type::SLACK {
            rows.push(to);
            cols.push(brow);
            vals.push(-dv_node);
            rhs[to] += mdot;
        }
    }

    // Pressure-control branches pin their controlled node.
    for &(b, controlled) in &ctx.pc_rows {
        rows.push(n + b);
        cols.push(controlled);
        vals.push(1.0);
        rhs[n + b] = 0.0;
    }

    // Slack nodes keep their pressure.
    for i in 0..n {
        if active.node.at(i, node::TYPE) == node_type::SLACK {
            rows.push(i);
            cols.push(i);
            vals.push(1.0);
            rhs[i] = 0.0;
        }
    }

    System {
        rows,
        cols,
        vals,
        rhs,
        size,
    }
}

/// Assemble the thermal Jacobian and load vector.
///
/// Free nodes without any incoming flow keep their temperature (identity
/// row); slack nodes likewise.
pub fn thermal_system(active: &ActivePit, zero_flow_tol: f64) -> System {
    let n = active.node.rows();
    let nb = active.branch.rows();
    let size = n + nb;

    let mut rows = Vec::with_capacity(4 * nb + n);
    let mut cols = Vec::with_capacity(4 * nb + n);
    let mut vals = Vec::with_capacity(4 * nb + n);
    let mut rhs = DVector::zeros(size);

    let mut inflow = vec![0.0_f64; n];

    for b in 0..nb {
        let from_t = active.branch.at_usize(b, branch::FROM_T);
        let to_t = active.branch.at_usize(b, branch::TO_T);
        let brow = n + b;

        rows.push(brow);
        cols.push(from_t);
        vals.push(active.branch.at(b, branch::JAC_DT_IN));
        rows.push(brow);
        cols.push(brow);
        vals.push(active.branch.at(b, branch::JAC_DT_OUT));
        rhs[brow] = active.branch.at(b, branch::LOAD_VEC_T);

        // Nodal mixing: T_node is the flow-weighted mean of incoming
        // branch outlet temperatures.
        let mdot = active.branch.at(b, branch::MDOT_T);
        inflow[to_t] += mdot;
        if active.node.at(to_t, node::TYPE_T) != node_type::SLACK {
            rows.push(to_t);
            cols.push(to_t);
            vals.push(mdot);
            rows.push(to_t);
            cols.push(brow);
            vals.push(-mdot);
            rhs[to_t] +=
                mdot * (active.branch.at(b, branch::T_OUT) - active.node.at(to_t, node::T));
        }
    }

    for i in 0..n {
        let slack = active.node.at(i, node::TYPE_T) == node_type::SLACK;
        if slack || inflow[i] < zero_flow_tol {
            rows.push(i);
            cols.push(i);
            vals.push(1.0);
            rhs[i] = 0.0;
        }
    }

    System {
        rows,
        cols,
        vals,
        rhs,
        size,
    }
}

/// CSR structure reused across Newton iterations.
struct Structure {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    /// Triplet index → CSR data slot (duplicates share a slot).
    slots: Vec<usize>,
}

/// Assembles CSR matrices from triplet systems, optionally caching the
/// sparsity structure so that later iterations only refresh the values.
pub struct Assembler {
    cache_structure: bool,
    structure: Option<Structure>,
}

impl Assembler {
    pub fn new(cache_structure: bool) -> Self {
        Self {
            cache_structure,
            structure: None,
        }
    }

    fn build_structure(size: usize, rows: &[usize], cols: &[usize]) -> Structure {
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by_key(|&i| (rows[i], cols[i]));

        let mut indptr = vec![0usize; size + 1];
        let mut indices = Vec::with_capacity(rows.len());
        let mut slots = vec![0usize; rows.len()];

        let mut prev: Option<(usize, usize)> = None;
        for &i in &order {
            let key = (rows[i], cols[i]);
            if prev != Some(key) {
                indices.push(cols[i]);
                indptr[rows[i] + 1] += 1;
                prev = Some(key);
            }
            slots[i] = indices.len() - 1;
        }
        for r in 0..size {
            indptr[r + 1] += indptr[r];
        }

        Structure {
            indptr,
            indices,
            slots,
        }
    }

    /// Build the CSR matrix for the given triplets.
    pub fn csr(&mut self, system: &System) -> CsMat<f64> {
        if !self.cache_structure {
            let mut tri = TriMat::new((system.size, system.size));
            for i in 0..system.rows.len() {
                tri.add_triplet(system.rows[i], system.cols[i], system.vals[i]);
            }
            return tri.to_csr();
        }

        let rebuild = match &self.structure {
            Some(s) => s.slots.len() != system.rows.len(),
            None => true,
        };
        if rebuild {
            self.structure = Some(Self::build_structure(
                system.size,
                &system.rows,
                &system.cols,
            ));
        }
        let structure = self.structure.as_ref().expect("structure just built");

        let mut data = vec![0.0; structure.indices.len()];
        for (i, &slot) in structure.slots.iter().enumerate() {
            data[slot] += system.vals[i];
        }
        CsMat::new(
            (system.size, system.size),
            structure.indptr.clone(),
            structure.indices.clone(),
            data,
        )
    }

    /// Assemble and solve `J·Δx = rhs` with a dense LU factorization of the
    /// sparse matrix.
    pub fn solve(&mut self, system: &System) -> PipeflowResult<DVector<f64>> {
        let csr = self.csr(system);
        let mut dense = DMatrix::zeros(system.size, system.size);
        for (&val, (r, c)) in csr.iter() {
            dense[(r, c)] = val;
        }
        let lu = dense.lu();
        match lu.solve(&system.rhs) {
            Some(dx) => {
                if dx.iter().any(|x| !x.is_finite()) {
                    return Err(PipeflowError::SolverError {
                        what: "non-finite Newton step".into(),
                    });
                }
                Ok(dx)
            }
            None => Err(PipeflowError::SolverError {
                what: "singular Jacobian".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_system() -> System {
        // [2 1; 0 3] x = [3; 6] -> x = [0.5; 2] ; duplicate triplet on (0,0)
        System {
            rows: vec![0, 0, 0, 1],
            cols: vec![0, 0, 1, 1],
            vals: vec![1.0, 1.0, 1.0, 3.0],
            rhs: DVector::from_vec(vec![3.0, 6.0]),
            size: 2,
        }
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let mut asm = Assembler::new(false);
        let x = asm.solve(&toy_system()).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cached_structure_gives_same_solution() {
        let mut asm = Assembler::new(true);
        let x1 = asm.solve(&toy_system()).unwrap();
        // second call hits the cached structure
        let x2 = asm.solve(&toy_system()).unwrap();
        assert_eq!(x1, x2);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let mut asm = Assembler::new(false);
        let sys = System {
            rows: vec![0, 1],
            cols: vec![0, 0],
            vals: vec![1.0, 1.0],
            rhs: DVector::from_vec(vec![1.0, 1.0]),
            size: 2,
        };
        assert!(matches!(
            asm.solve(&sys),
            Err(PipeflowError::SolverError { .. })
        ));
    }
}
