//! Marker family: stateless computed views on nodes and bodies.
//!
//! A marker binds to exactly one node or body (by registry index) and maps
//! its kinematics onto the interface connectors consume: position,
//! orientation, or a single generalized coordinate. Markers hold no state
//! and cache nothing; every evaluation resolves the target through the
//! registry and reads the state store passed in.

use nalgebra::{Matrix3, Vector3};

use mbs_types::{Configuration, CoreError, NodeIndex, ObjectIndex, Result};

use crate::rotation;
use crate::state::SystemState;
use crate::system::SystemData;

/// Capability flags of a marker, used by connectors for compatibility
/// checks before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerCapabilities(u8);

impl MarkerCapabilities {
    /// Marker binds to a node.
    pub const NODE: Self = Self(1);
    /// Marker binds to a body.
    pub const BODY: Self = Self(1 << 1);
    /// Marker provides a 3D position (and velocity).
    pub const POSITION: Self = Self(1 << 2);
    /// Marker provides an orientation (and angular velocity).
    pub const ORIENTATION: Self = Self(1 << 3);
    /// Marker provides a single generalized coordinate.
    pub const COORDINATE: Self = Self(1 << 4);

    /// Union of two capability sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether all of `other`'s flags are set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A marker of the multibody system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Marker {
    /// 3D position and velocity of a node.
    NodePosition {
        /// User-assigned name.
        name: String,
        /// Target node.
        node: NodeIndex,
    },
    /// One selected generalized coordinate of a node, value and first
    /// derivative.
    NodeCoordinate {
        /// User-assigned name.
        name: String,
        /// Target node.
        node: NodeIndex,
        /// Node-local coordinate number.
        coordinate: usize,
    },
    /// One Tait-Bryan rotation coordinate of a rigid-body node: the angle
    /// on position level, the matching body-frame angular velocity
    /// component on velocity level.
    NodeRotationCoordinate {
        /// User-assigned name.
        name: String,
        /// Target rigid-body node.
        node: NodeIndex,
        /// Rotation axis number (0, 1, 2 for X, Y, Z).
        rotation_coordinate: usize,
    },
    /// Position and velocity at a local point on a body.
    BodyPosition {
        /// User-assigned name.
        name: String,
        /// Target body.
        body: ObjectIndex,
        /// Body-local attachment point.
        local_position: Vector3<f64>,
    },
    /// Position plus orientation at a local point on a body, for rigid
    /// connectors.
    BodyRigid {
        /// User-assigned name.
        name: String,
        /// Target body.
        body: ObjectIndex,
        /// Body-local attachment point.
        local_position: Vector3<f64>,
    },
}

impl Marker {
    /// User-assigned name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NodePosition { name, .. }
            | Self::NodeCoordinate { name, .. }
            | Self::NodeRotationCoordinate { name, .. }
            | Self::BodyPosition { name, .. }
            | Self::BodyRigid { name, .. } => name,
        }
    }

    /// Variant name, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NodePosition { .. } => "MarkerNodePosition",
            Self::NodeCoordinate { .. } => "MarkerNodeCoordinate",
            Self::NodeRotationCoordinate { .. } => "MarkerNodeRotationCoordinate",
            Self::BodyPosition { .. } => "MarkerBodyPosition",
            Self::BodyRigid { .. } => "MarkerBodyRigid",
        }
    }

    /// Entity label for error messages: variant plus user name.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} '{}'", self.kind_name(), self.name())
    }

    /// Capability flags of this marker variant.
    #[must_use]
    pub fn capabilities(&self) -> MarkerCapabilities {
        use MarkerCapabilities as C;
        match self {
            Self::NodePosition { .. } => C::NODE.union(C::POSITION),
            Self::NodeCoordinate { .. } | Self::NodeRotationCoordinate { .. } => {
                C::NODE.union(C::COORDINATE)
            }
            Self::BodyPosition { .. } => C::BODY.union(C::POSITION),
            Self::BodyRigid { .. } => C::BODY.union(C::POSITION).union(C::ORIENTATION),
        }
    }

    /// 3D position of the marker point.
    pub fn position(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        match self {
            Self::NodePosition { node, .. } => system.node(*node)?.position(state, configuration),
            Self::BodyPosition {
                body,
                local_position,
                ..
            }
            | Self::BodyRigid {
                body,
                local_position,
                ..
            } => system
                .body(*body)?
                .position(system, state, local_position, configuration),
            Self::NodeCoordinate { .. } | Self::NodeRotationCoordinate { .. } => {
                Err(CoreError::unsupported_operation(self.label(), "Position"))
            }
        }
    }

    /// 3D velocity of the marker point. Fails for `Reference`.
    pub fn velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        match self {
            Self::NodePosition { node, .. } => system.node(*node)?.velocity(state, configuration),
            Self::BodyPosition {
                body,
                local_position,
                ..
            }
            | Self::BodyRigid {
                body,
                local_position,
                ..
            } => system
                .body(*body)?
                .velocity(system, state, local_position, configuration),
            Self::NodeCoordinate { .. } | Self::NodeRotationCoordinate { .. } => {
                Err(CoreError::unsupported_operation(self.label(), "Velocity"))
            }
        }
    }

    /// Scalar coordinate value of a coordinate-class marker.
    ///
    /// For the plain coordinate marker this is the selected generalized
    /// coordinate; for the rotation marker it is the selected Tait-Bryan
    /// angle of the node's current rotation matrix.
    pub fn coordinate_value(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<f64> {
        match self {
            Self::NodeCoordinate {
                node, coordinate, ..
            } => {
                let q = system.node(*node)?.coordinate_vector(state, configuration)?;
                self.select(&q, *coordinate)
            }
            Self::NodeRotationCoordinate {
                node,
                rotation_coordinate,
                ..
            } => {
                let r = system.node(*node)?.rotation_matrix(state, configuration)?;
                let angles = rotation::rotation_matrix_to_xyz_angles(&r);
                if *rotation_coordinate > 2 {
                    return Err(self.coordinate_out_of_range(*rotation_coordinate, 3));
                }
                Ok(angles[*rotation_coordinate])
            }
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "coordinate value",
            )),
        }
    }

    /// First time derivative of the marker coordinate. Fails for
    /// `Reference`.
    ///
    /// The rotation marker reports the body-frame angular velocity
    /// component for its axis, which is the quantity coordinate-level
    /// connectors constrain.
    pub fn coordinate_value_t(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<f64> {
        match self {
            Self::NodeCoordinate {
                node, coordinate, ..
            } => {
                let q = system
                    .node(*node)?
                    .coordinate_vector_t(state, configuration)?;
                self.select(&q, *coordinate)
            }
            Self::NodeRotationCoordinate {
                node,
                rotation_coordinate,
                ..
            } => {
                let omega = system
                    .node(*node)?
                    .angular_velocity_local(state, configuration)?;
                if *rotation_coordinate > 2 {
                    return Err(self.coordinate_out_of_range(*rotation_coordinate, 3));
                }
                Ok(omega[*rotation_coordinate])
            }
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "coordinate velocity",
            )),
        }
    }

    /// Rotation matrix of the marker frame. Orientation markers only.
    pub fn rotation_matrix(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Matrix3<f64>> {
        match self {
            Self::BodyRigid { body, .. } => system
                .body(*body)?
                .rotation_matrix(system, state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "RotationMatrix",
            )),
        }
    }

    /// Angular velocity of the marker frame. Orientation markers only;
    /// fails for `Reference`.
    pub fn angular_velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        match self {
            Self::BodyRigid { body, .. } => system
                .body(*body)?
                .angular_velocity(system, state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularVelocity",
            )),
        }
    }

    fn select(&self, q: &nalgebra::DVector<f64>, coordinate: usize) -> Result<f64> {
        if coordinate >= q.len() {
            return Err(self.coordinate_out_of_range(coordinate, q.len()));
        }
        Ok(q[coordinate])
    }

    fn coordinate_out_of_range(&self, coordinate: usize, count: usize) -> CoreError {
        CoreError::InvalidCoordinateIndex {
            entity: self.label(),
            coordinate,
            count,
        }
    }
}
