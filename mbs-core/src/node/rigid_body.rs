//! Rigid-body node with Euler-parameter rotation.

use nalgebra::{DMatrix, Matrix3, Vector3, Vector4};

use mbs_types::{Configuration, CoreError, Result};

use crate::rotation;
use crate::state::SystemState;

use super::UNASSIGNED;

/// Rigid-body node: three displacement coordinates plus four Euler
/// parameters, and one algebraic coordinate for the unit-norm constraint
/// multiplier.
///
/// Euler parameters avoid the singularities of three-angle
/// parametrizations at the cost of the normalization constraint
/// `|ep|^2 = 1`, enforced on position or velocity level by the external
/// solver through [`algebraic_equation`].
///
/// [`algebraic_equation`]: NodeRigidBodyEp::algebraic_equation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRigidBodyEp {
    pub(crate) name: String,
    pub(crate) reference_position: Vector3<f64>,
    pub(crate) reference_rotation: Vector4<f64>,
    pub(crate) coord_adr: usize,
    pub(crate) ae_adr: usize,
}

impl NodeRigidBodyEp {
    /// Displacement coordinates.
    pub const NUM_DISPLACEMENT_COORDINATES: usize = 3;
    /// Rotation (Euler-parameter) coordinates.
    pub const NUM_ROTATION_COORDINATES: usize = 4;
    /// Total ODE2 coordinates.
    pub const NUM_COORDINATES: usize =
        Self::NUM_DISPLACEMENT_COORDINATES + Self::NUM_ROTATION_COORDINATES;

    /// Tolerance on the unit-norm check of the reference rotation.
    const UNIT_NORM_TOL: f64 = 1e-10;

    /// Create a rigid-body node.
    ///
    /// `reference_rotation` must be a unit quaternion (scalar part first);
    /// a violated norm is rejected at construction rather than surfacing as
    /// a skewed rotation matrix later. Coordinate addresses are assigned at
    /// registration; kinematic queries require a registered node.
    pub fn new(
        name: impl Into<String>,
        reference_position: Vector3<f64>,
        reference_rotation: Vector4<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let norm_defect = (reference_rotation.norm_squared() - 1.0).abs();
        if norm_defect > Self::UNIT_NORM_TOL {
            return Err(CoreError::invalid_parameters(
                format!("NodeRigidBodyEP '{name}'"),
                format!("reference rotation is not unit norm (|ep|^2 - 1 = {norm_defect:e})"),
            ));
        }
        Ok(Self {
            name,
            reference_position,
            reference_rotation,
            coord_adr: UNASSIGNED,
            ae_adr: UNASSIGNED,
        })
    }

    pub(crate) fn reference_ode2_values(&self) -> Vec<f64> {
        let mut v = self.reference_position.as_slice().to_vec();
        v.extend_from_slice(self.reference_rotation.as_slice());
        v
    }

    fn rotation_adr(&self) -> usize {
        self.coord_adr + Self::NUM_DISPLACEMENT_COORDINATES
    }

    /// Euler parameters in the given configuration: reference values plus
    /// coordinate increments for non-reference configurations.
    #[must_use]
    pub fn rotation_parameters(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Vector4<f64> {
        let mut ep = self.reference_rotation;
        if configuration != Configuration::Reference {
            let coords = state.coordinates(configuration);
            for i in 0..Self::NUM_ROTATION_COORDINATES {
                ep[i] += coords[self.rotation_adr() + i];
            }
        }
        ep
    }

    /// First time derivative of the Euler parameters. Fails for `Reference`.
    pub fn rotation_parameters_t(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector4<f64>> {
        let v = state.coordinates_t(configuration)?;
        Ok(Vector4::new(
            v[self.rotation_adr()],
            v[self.rotation_adr() + 1],
            v[self.rotation_adr() + 2],
            v[self.rotation_adr() + 3],
        ))
    }

    fn rotation_parameters_tt(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector4<f64>> {
        let a = state.coordinates_tt(configuration)?;
        Ok(Vector4::new(
            a[self.rotation_adr()],
            a[self.rotation_adr() + 1],
            a[self.rotation_adr() + 2],
            a[self.rotation_adr() + 3],
        ))
    }

    pub(crate) fn position(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Vector3<f64> {
        if configuration == Configuration::Reference {
            return self.reference_position;
        }
        let u = state.coordinates(configuration);
        // Position and displacement are additive; the rotation coordinates
        // do not enter the node position.
        self.reference_position
            + Vector3::new(
                u[self.coord_adr],
                u[self.coord_adr + 1],
                u[self.coord_adr + 2],
            )
    }

    pub(crate) fn velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let v = state.coordinates_t(configuration)?;
        Ok(Vector3::new(
            v[self.coord_adr],
            v[self.coord_adr + 1],
            v[self.coord_adr + 2],
        ))
    }

    pub(crate) fn acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let a = state.coordinates_tt(configuration)?;
        Ok(Vector3::new(
            a[self.coord_adr],
            a[self.coord_adr + 1],
            a[self.coord_adr + 2],
        ))
    }

    /// Rotation matrix from the configuration's Euler parameters.
    #[must_use]
    pub fn rotation_matrix(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Matrix3<f64> {
        rotation::rotation_matrix(&self.rotation_parameters(state, configuration))
    }

    /// Angular velocity in the global frame: `G(ep) * ep_t`.
    pub fn angular_velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let ep = self.rotation_parameters(state, configuration);
        let ep_t = self.rotation_parameters_t(state, configuration)?;
        Ok(rotation::g_matrix(&ep) * ep_t)
    }

    /// Angular velocity in the body-fixed frame: `G_local(ep) * ep_t`.
    pub fn angular_velocity_local(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let ep = self.rotation_parameters(state, configuration);
        let ep_t = self.rotation_parameters_t(state, configuration)?;
        Ok(rotation::g_matrix_local(&ep) * ep_t)
    }

    /// Angular acceleration in the global frame.
    ///
    /// For Euler parameters `G_t * ep_t` vanishes identically, so the
    /// angular acceleration reduces to `G(ep) * ep_tt`.
    pub fn angular_acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let ep = self.rotation_parameters(state, configuration);
        let ep_tt = self.rotation_parameters_tt(state, configuration)?;
        Ok(rotation::g_matrix(&ep) * ep_tt)
    }

    /// Jacobian of the node position w.r.t. all 7 coordinates: `[I3 | 0]`.
    #[must_use]
    pub fn position_jacobian(&self) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(3, Self::NUM_COORDINATES);
        j.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
        j
    }

    /// Jacobian of the angular velocity w.r.t. all 7 coordinate velocities:
    /// `[0 | G(ep)]`.
    #[must_use]
    pub fn rotation_jacobian(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> DMatrix<f64> {
        let g = rotation::g_matrix(&self.rotation_parameters(state, configuration));
        let mut j = DMatrix::zeros(3, Self::NUM_COORDINATES);
        j.view_mut((0, Self::NUM_DISPLACEMENT_COORDINATES), (3, 4))
            .copy_from(&g);
        j
    }

    /// Euler-parameter normalization equation.
    ///
    /// Position level: `|ep|^2 - 1`. Velocity level (index-2 form):
    /// `2 * ep . ep_t`.
    pub fn algebraic_equation(
        &self,
        state: &SystemState,
        configuration: Configuration,
        velocity_level: bool,
    ) -> Result<f64> {
        let ep = self.rotation_parameters(state, configuration);
        if velocity_level {
            let ep_t = self.rotation_parameters_t(state, configuration)?;
            Ok(2.0 * ep.dot(&ep_t))
        } else {
            Ok(ep.norm_squared() - 1.0)
        }
    }

    /// Jacobian of the normalization equation w.r.t. the 7 ODE2
    /// coordinates: `[0 0 0 2*ep0 .. 2*ep3]`.
    #[must_use]
    pub fn algebraic_equation_jacobian(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> DMatrix<f64> {
        let ep = self.rotation_parameters(state, configuration);
        let mut j = DMatrix::zeros(1, Self::NUM_COORDINATES);
        for i in 0..Self::NUM_ROTATION_COORDINATES {
            j[(0, Self::NUM_DISPLACEMENT_COORDINATES + i)] = 2.0 * ep[i];
        }
        j
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{Node, SystemData};
    use approx::assert_relative_eq;

    fn identity_ep() -> Vector4<f64> {
        Vector4::new(1.0, 0.0, 0.0, 0.0)
    }

    fn build(node: NodeRigidBodyEp) -> (SystemData, SystemState, mbs_types::NodeIndex) {
        let mut system = SystemData::new();
        let idx = system.add_node(Node::RigidBodyEp(node));
        let state = system.make_state();
        (system, state, idx)
    }

    #[test]
    fn test_non_unit_reference_rotation_rejected() {
        let err = NodeRigidBodyEp::new("r", Vector3::zeros(), Vector4::new(1.0, 0.5, 0.0, 0.0))
            .unwrap_err();
        assert!(err.to_string().contains("unit norm"));
    }

    #[test]
    fn test_angular_velocity_about_z() {
        let node = NodeRigidBodyEp::new("r", Vector3::zeros(), identity_ep()).unwrap();
        let (system, mut state, idx) = build(node);
        // ep_t = (0, 0, 0, w/2) at identity orientation spins about z.
        let w = 2.4;
        state.coordinates_t_mut(Configuration::Current).unwrap()[6] = w / 2.0;

        let Node::RigidBodyEp(node) = system.node(idx).unwrap() else {
            unreachable!("registered as rigid-body node");
        };
        let omega = node.angular_velocity(&state, Configuration::Current).unwrap();
        assert_relative_eq!(omega, Vector3::new(0.0, 0.0, w), epsilon = 1e-12);

        let omega_local = node
            .angular_velocity_local(&state, Configuration::Current)
            .unwrap();
        assert_relative_eq!(omega, omega_local, epsilon = 1e-12);
    }

    #[test]
    fn test_angular_acceleration_about_z() {
        let node = NodeRigidBodyEp::new("r", Vector3::zeros(), identity_ep()).unwrap();
        let (system, mut state, idx) = build(node);
        // ep_tt = (0, 0, 0, a/2) at identity orientation: alpha = (0, 0, a).
        let a = 3.2;
        state.coordinates_tt_mut(Configuration::Current).unwrap()[6] = a / 2.0;

        let Node::RigidBodyEp(node) = system.node(idx).unwrap() else {
            unreachable!("registered as rigid-body node");
        };
        assert_relative_eq!(
            node.angular_acceleration(&state, Configuration::Current)
                .unwrap(),
            Vector3::new(0.0, 0.0, a),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_jacobians_at_non_identity_orientation() {
        // Exact unit norm: 0.64 + 0.04 + 0.16 + 0.16 = 1.
        let ep = Vector4::new(0.8, 0.2, -0.4, 0.4);
        let node = NodeRigidBodyEp::new("r", Vector3::zeros(), ep).unwrap();
        let (system, state, idx) = build(node);
        let Node::RigidBodyEp(node) = system.node(idx).unwrap() else {
            unreachable!("registered as rigid-body node");
        };

        // Position Jacobian is the constant [I3 | 0].
        let jp = node.position_jacobian();
        assert_eq!(jp.shape(), (3, 7));
        for i in 0..3 {
            for j in 0..7 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(jp[(i, j)], expected, epsilon = 1e-14);
            }
        }

        // Rotation Jacobian is [0 | G(ep)] at the queried orientation.
        let jr = node.rotation_jacobian(&state, Configuration::Current);
        assert_eq!(jr.shape(), (3, 7));
        let g = rotation::g_matrix(&node.rotation_parameters(&state, Configuration::Current));
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(jr[(i, j)], 0.0, epsilon = 1e-14);
            }
            for j in 0..4 {
                assert_relative_eq!(jr[(i, 3 + j)], g[(i, j)], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_algebraic_equation_and_jacobian() {
        let node = NodeRigidBodyEp::new("r", Vector3::zeros(), identity_ep()).unwrap();
        let (system, mut state, idx) = build(node);

        let Node::RigidBodyEp(node) = system.node(idx).unwrap() else {
            unreachable!("registered as rigid-body node");
        };

        // Satisfied exactly in the reference state.
        assert_relative_eq!(
            node.algebraic_equation(&state, Configuration::Current, false)
                .unwrap(),
            0.0,
            epsilon = 1e-14
        );

        // Perturb ep0: |ep|^2 - 1 = (1 + d)^2 - 1.
        let d = 0.01;
        state.coordinates_mut(Configuration::Current).unwrap()[3] = d;
        assert_relative_eq!(
            node.algebraic_equation(&state, Configuration::Current, false)
                .unwrap(),
            (1.0 + d) * (1.0 + d) - 1.0,
            epsilon = 1e-14
        );

        let j = node.algebraic_equation_jacobian(&state, Configuration::Current);
        assert_eq!(j.shape(), (1, 7));
        assert_eq!(j[(0, 0)], 0.0);
        assert_relative_eq!(j[(0, 3)], 2.0 * (1.0 + d), epsilon = 1e-14);

        // Velocity-level form: 2 * ep . ep_t.
        state.coordinates_t_mut(Configuration::Current).unwrap()[3] = 0.5;
        assert_relative_eq!(
            node.algebraic_equation(&state, Configuration::Current, true)
                .unwrap(),
            2.0 * (1.0 + d) * 0.5,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_position_displacement_additivity() {
        let ep = identity_ep();
        let node = NodeRigidBodyEp::new("r", Vector3::new(1.0, 2.0, 3.0), ep).unwrap();
        let (system, mut state, idx) = build(node);
        state.coordinates_mut(Configuration::Current).unwrap()[0] = 0.5;
        state.coordinates_mut(Configuration::Current).unwrap()[2] = -1.0;

        let node = system.node(idx).unwrap();
        assert_relative_eq!(
            node.position(&state, Configuration::Current).unwrap(),
            Vector3::new(1.5, 2.0, 2.0),
            epsilon = 1e-14
        );
        // Rotation coordinates never enter the node position.
        state.coordinates_mut(Configuration::Current).unwrap()[5] = 0.3;
        assert_relative_eq!(
            node.position(&state, Configuration::Current).unwrap(),
            Vector3::new(1.5, 2.0, 2.0),
            epsilon = 1e-14
        );
    }
}
