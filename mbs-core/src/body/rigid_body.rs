//! Rigid body on an Euler-parameter node.

use nalgebra::{DMatrix, Matrix3, Vector3};

use mbs_types::{AccessFunction, Configuration, CoreError, NodeIndex, Result};

use crate::node::{Node, NodeRigidBodyEp};
use crate::rotation;
use crate::state::SystemState;
use crate::system::SystemData;

/// Rigid body with mass and rotational inertia.
///
/// The center of mass coincides with the node's reference point and the
/// inertia tensor is given in the body-fixed frame, so the 7x7 mass matrix
/// decouples into a constant translational block `m * I3` and a
/// configuration-dependent rotational block `G_local^T * J * G_local`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectRigidBody {
    pub(crate) name: String,
    pub(crate) node: NodeIndex,
    pub(crate) mass: f64,
    pub(crate) inertia: Matrix3<f64>,
}

impl ObjectRigidBody {
    /// Tolerance on the symmetry and positive-semidefiniteness checks of
    /// the inertia tensor.
    const INERTIA_TOL: f64 = 1e-12;

    /// Create a rigid body on a rigid-body node.
    ///
    /// The mass must be positive and the body-frame inertia tensor must be
    /// symmetric positive semidefinite.
    pub fn new(
        name: impl Into<String>,
        node: NodeIndex,
        mass: f64,
        inertia: Matrix3<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let entity = || format!("ObjectRigidBody '{name}'");
        if mass <= 0.0 {
            return Err(CoreError::invalid_parameters(
                entity(),
                format!("mass must be positive, got {mass}"),
            ));
        }
        let asymmetry = (inertia - inertia.transpose()).abs().max();
        if asymmetry > Self::INERTIA_TOL {
            return Err(CoreError::invalid_parameters(
                entity(),
                format!("inertia tensor is not symmetric (max defect {asymmetry:e})"),
            ));
        }
        let min_eigenvalue = inertia
            .symmetric_eigenvalues()
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if min_eigenvalue < -Self::INERTIA_TOL {
            return Err(CoreError::invalid_parameters(
                entity(),
                format!("inertia tensor is not positive semidefinite (min eigenvalue {min_eigenvalue:e})"),
            ));
        }
        Ok(Self {
            name,
            node,
            mass,
            inertia,
        })
    }

    /// Mass of the body.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Body-frame inertia tensor.
    #[must_use]
    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    pub(crate) fn rigid_node<'a>(&self, system: &'a SystemData) -> Result<&'a NodeRigidBodyEp> {
        match system.node(self.node)? {
            Node::RigidBodyEp(n) => Ok(n),
            _ => Err(CoreError::IncompatibleNode {
                entity: format!("ObjectRigidBody '{}'", self.name),
                node: self.node,
                expected: "NodeRigidBodyEP",
            }),
        }
    }

    /// Position of a body-fixed local point: node position plus the rotated
    /// local offset.
    pub(crate) fn position(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let node = self.rigid_node(system)?;
        Ok(node.position(state, configuration)
            + node.rotation_matrix(state, configuration) * local_position)
    }

    /// Velocity of a body-fixed local point: `v + omega x (R * p_local)`.
    pub(crate) fn velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let node = self.rigid_node(system)?;
        let v = node.velocity(state, configuration)?;
        let omega = node.angular_velocity(state, configuration)?;
        let arm = node.rotation_matrix(state, configuration) * local_position;
        Ok(v + omega.cross(&arm))
    }

    /// Acceleration of a body-fixed local point:
    /// `a + alpha x (R * p) + omega x (omega x (R * p))`.
    pub(crate) fn acceleration(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let node = self.rigid_node(system)?;
        let a = node.acceleration(state, configuration)?;
        let omega = node.angular_velocity(state, configuration)?;
        let alpha = node.angular_acceleration(state, configuration)?;
        let arm = node.rotation_matrix(state, configuration) * local_position;
        Ok(a + alpha.cross(&arm) + omega.cross(&omega.cross(&arm)))
    }

    /// 7x7 mass matrix `diag(m * I3, G_local^T * J * G_local)`, evaluated
    /// at the given configuration's Euler parameters.
    pub(crate) fn mass_matrix(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DMatrix<f64>> {
        let node = self.rigid_node(system)?;
        let ep = node.rotation_parameters(state, configuration);
        let g_local = rotation::g_matrix_local(&ep);
        let rotational = g_local.transpose() * self.inertia * g_local;

        let n = NodeRigidBodyEp::NUM_COORDINATES;
        let mut m = DMatrix::zeros(n, n);
        for i in 0..3 {
            m[(i, i)] = self.mass;
        }
        m.view_mut((3, 3), (4, 4)).copy_from(&rotational);
        Ok(m)
    }

    /// Jacobian from ODE2 coordinate velocities to the physical velocity at
    /// a body-fixed local point.
    pub(crate) fn access_function(
        &self,
        system: &SystemData,
        state: &SystemState,
        access: AccessFunction,
        local_position: &Vector3<f64>,
    ) -> Result<DMatrix<f64>> {
        let node = self.rigid_node(system)?;
        let ep = node.rotation_parameters(state, Configuration::Current);
        let g = rotation::g_matrix(&ep);
        let n = NodeRigidBodyEp::NUM_COORDINATES;

        match access {
            // [I3 | -skew(R * p_local) * G]
            AccessFunction::TranslationalVelocityQt => {
                let mut j = DMatrix::zeros(3, n);
                j.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
                let arm = node.rotation_matrix(state, Configuration::Current) * local_position;
                let rot_part = -rotation::skew(&arm) * g;
                j.view_mut((0, 3), (3, 4)).copy_from(&rot_part);
                Ok(j)
            }
            // [0 | G]
            AccessFunction::AngularVelocityQt => {
                let mut j = DMatrix::zeros(3, n);
                j.view_mut((0, 3), (3, 4)).copy_from(&g);
                Ok(j)
            }
            // [m * I3 | 0]: integral of displacement over the mass
            // distribution, for gravity-type loads.
            AccessFunction::DisplacementMassIntegralQ => {
                let mut j = DMatrix::zeros(3, n);
                for i in 0..3 {
                    j[(i, i)] = self.mass;
                }
                Ok(j)
            }
        }
    }
}
