//! Point-mass body on a 3D point node.

use nalgebra::{DMatrix, Vector3};

use mbs_types::{Configuration, CoreError, NodeIndex, Result};

use crate::node::Node;
use crate::state::SystemState;
use crate::system::SystemData;

/// Concentrated mass at a point node.
///
/// The three node coordinates are the point's displacement, so the mass
/// matrix is the constant `m * I3` and the translational Jacobian is the
/// identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectMassPoint {
    pub(crate) name: String,
    pub(crate) node: NodeIndex,
    pub(crate) mass: f64,
}

impl ObjectMassPoint {
    /// Create a point mass on a point node. The mass must be positive.
    pub fn new(name: impl Into<String>, node: NodeIndex, mass: f64) -> Result<Self> {
        let name = name.into();
        if mass <= 0.0 {
            return Err(CoreError::invalid_parameters(
                format!("ObjectMassPoint '{name}'"),
                format!("mass must be positive, got {mass}"),
            ));
        }
        Ok(Self { name, node, mass })
    }

    /// Mass of the point.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub(crate) fn point_node<'a>(&self, system: &'a SystemData) -> Result<&'a Node> {
        let node = system.node(self.node)?;
        match node {
            Node::Point(_) => Ok(node),
            _ => Err(CoreError::IncompatibleNode {
                entity: format!("ObjectMassPoint '{}'", self.name),
                node: self.node,
                expected: "NodePoint",
            }),
        }
    }

    /// Position of a local point: node position plus the unrotated local
    /// offset (a point mass carries no orientation).
    pub(crate) fn position(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        Ok(self.point_node(system)?.position(state, configuration)? + local_position)
    }

    pub(crate) fn velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.point_node(system)?.velocity(state, configuration)
    }

    pub(crate) fn acceleration(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.point_node(system)?.acceleration(state, configuration)
    }

    pub(crate) fn mass_matrix(&self) -> DMatrix<f64> {
        DMatrix::identity(3, 3) * self.mass
    }
}
