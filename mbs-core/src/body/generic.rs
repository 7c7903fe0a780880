//! Generic ODE2 body: user-supplied mass matrix over N nodes.

use nalgebra::DMatrix;

use mbs_types::{CoreError, NodeIndex, Result};

use crate::system::SystemData;

/// Body over N differential-coordinate nodes with a constant,
/// user-supplied mass matrix.
///
/// Covers reduced-order and finite-element objects whose coordinates have
/// no direct physical mapping. Unlike the single-node bodies, the
/// local-to-body coordinate lookup is served from an offset table
/// precomputed at construction instead of the default linear scan; with
/// many nodes the scan cost would be paid on every connector evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGenericOde2 {
    pub(crate) name: String,
    pub(crate) nodes: Vec<NodeIndex>,
    mass_matrix: DMatrix<f64>,
    /// Body-local ODE2 coordinate offset of each local node.
    coordinate_offsets: Vec<usize>,
}

impl ObjectGenericOde2 {
    const SYMMETRY_TOL: f64 = 1e-12;

    /// Create a generic ODE2 body.
    ///
    /// All nodes must already be registered and carry ODE2 coordinates;
    /// the mass matrix must be symmetric and sized to the total coordinate
    /// count of the nodes.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<NodeIndex>,
        mass_matrix: DMatrix<f64>,
        system: &SystemData,
    ) -> Result<Self> {
        let name = name.into();
        let entity = || format!("ObjectGenericODE2 '{name}'");

        let mut coordinate_offsets = Vec::with_capacity(nodes.len());
        let mut total = 0usize;
        for &node_index in &nodes {
            let node = system.node(node_index)?;
            let n = node.num_ode2_coordinates();
            if n == 0 {
                return Err(CoreError::IncompatibleNode {
                    entity: entity(),
                    node: node_index,
                    expected: "node with ODE2 coordinates",
                });
            }
            coordinate_offsets.push(total);
            total += n;
        }

        if mass_matrix.nrows() != total || mass_matrix.ncols() != total {
            return Err(CoreError::invalid_parameters(
                entity(),
                format!(
                    "mass matrix is {}x{} but the nodes carry {total} coordinates",
                    mass_matrix.nrows(),
                    mass_matrix.ncols()
                ),
            ));
        }
        let asymmetry = (&mass_matrix - mass_matrix.transpose()).abs().max();
        if asymmetry > Self::SYMMETRY_TOL {
            return Err(CoreError::invalid_parameters(
                entity(),
                format!("mass matrix is not symmetric (max defect {asymmetry:e})"),
            ));
        }

        Ok(Self {
            name,
            nodes,
            mass_matrix,
            coordinate_offsets,
        })
    }

    /// Body-local ODE2 coordinate offset of a local node, from the
    /// precomputed table.
    pub(crate) fn coordinate_offset(&self, local_node: usize) -> Result<usize> {
        self.coordinate_offsets.get(local_node).copied().ok_or(
            CoreError::InvalidLocalNode {
                entity: format!("ObjectGenericODE2 '{}'", self.name),
                local_node,
                num_nodes: self.nodes.len(),
            },
        )
    }

    pub(crate) fn mass_matrix(&self) -> DMatrix<f64> {
        self.mass_matrix.clone()
    }

    /// Total number of ODE2 coordinates over all nodes.
    #[must_use]
    pub fn num_coordinates(&self) -> usize {
        self.mass_matrix.nrows()
    }
}
