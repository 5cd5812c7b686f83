//! Readable views of the internal tables.
//!
//! Debugging helpers that pair every pit column with its name so that a
//! node or branch row can be inspected without memorizing the layout.

use crate::build::Workspace;
use crate::idx::{branch, node};

/// Node pit column names, in column order.
pub const NODE_COLUMNS: [&str; node::COLS] = [
    "table",
    "element",
    "type",
    "active",
    "rho_kg_per_m3",
    "p_bar",
    "load_kg_per_s",
    "height_m",
    "t_k",
    "pamb_bar",
    "load_t_w",
    "type_t",
    "slack_hits",
    "slack_hits_t",
];

/// Branch pit column names, in column order.
pub const BRANCH_COLUMNS: [&str; branch::COLS] = [
    "table",
    "element",
    "from_node",
    "to_node",
    "active",
    "length_m",
    "d_m",
    "area_m2",
    "rho_kg_per_m3",
    "eta_pa_s",
    "k_m",
    "t_mean_k",
    "v_m_per_s",
    "reynolds",
    "lambda",
    "jac_dv",
    "jac_dp_from",
    "jac_dp_to",
    "load_vec",
    "jac_dv_node",
    "mdot_kg_per_s",
    "loss_coefficient",
    "cp_j_per_kg_k",
    "alpha_w_per_m2k",
    "jac_dt_in",
    "jac_dt_out",
    "load_vec_t",
    "t_out_k",
    "jac_dt_node",
    "mdot_t_kg_per_s",
    "v_t_m_per_s",
    "from_node_t",
    "to_node_t",
    "qext_w",
    "text_k",
    "branch_type",
    "pl_bar",
    "tl_k",
];

/// One node row as (column name, value) pairs.
pub fn named_node_row(ws: &Workspace, row: usize) -> Vec<(&'static str, f64)> {
    NODE_COLUMNS
        .iter()
        .copied()
        .zip(ws.node_pit.row(row).iter().copied())
        .collect()
}

/// One branch row as (column name, value) pairs.
pub fn named_branch_row(ws: &Workspace, row: usize) -> Vec<(&'static str, f64)> {
    BRANCH_COLUMNS
        .iter()
        .copied()
        .zip(ws.branch_pit.row(row).iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{bar, k, kgps, m};
    use pf_net::{ExtGrid, Junction, Network, Pipe, PipeflowOptions, Sink};

    #[test]
    fn column_names_cover_every_column() {
        assert_eq!(NODE_COLUMNS.len(), node::COLS);
        assert_eq!(BRANCH_COLUMNS.len(), branch::COLS);
    }

    #[test]
    fn named_rows_expose_the_layout() {
        let mut net = Network::new(pf_fluids::water());
        let j0 = net.add_junction(Junction::new(bar(5.0), k(293.15)));
        let j1 = net.add_junction(Junction::new(bar(5.0), k(293.15)));
        net.add_pipe(Pipe::new(j0, j1, m(100.0), m(0.1)));
        net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(293.15)));
        net.add_sink(Sink::new(j1, kgps(1.0)));
        let ws = crate::build::build_pit(&net, &PipeflowOptions::default(), None).unwrap();

        let row = named_node_row(&ws, 1);
        assert_eq!(row[node::P].0, "p_bar");
        assert_eq!(row[node::LOAD], ("load_kg_per_s", 1.0));

        let brow = named_branch_row(&ws, 0);
        assert_eq!(brow[branch::LENGTH], ("length_m", 100.0));
        assert_eq!(brow[branch::TO].0, "to_node");
    }
}
