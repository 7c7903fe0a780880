//! Body family: physical objects aggregating nodes.
//!
//! A body references its nodes by registry index and never owns node
//! objects; all kinematic queries resolve nodes through the registry passed
//! in explicitly. Like the node family this is a closed enum with
//! per-variant capability subsets and no silent defaults.
//!
//! Variants:
//!
//! - [`ObjectGround`] - fixed frame, no nodes, mass matrix not applicable
//! - [`ObjectMassPoint`] - point mass on a [`NodePoint`], mass matrix `m * I3`
//! - [`ObjectRigidBody`] - rigid body on a [`NodeRigidBodyEp`], 7x7 mass matrix
//! - [`ObjectGenericOde2`] - N-node body with a user-supplied mass matrix
//!
//! [`NodePoint`]: crate::node::NodePoint
//! [`NodeRigidBodyEp`]: crate::node::NodeRigidBodyEp

mod generic;
mod ground;
mod mass_point;
mod rigid_body;

pub use generic::ObjectGenericOde2;
pub use ground::ObjectGround;
pub use mass_point::ObjectMassPoint;
pub use rigid_body::ObjectRigidBody;

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use mbs_types::{AccessFunction, Configuration, CoreError, NodeIndex, OutputVariable, Result};

use crate::rotation;
use crate::state::SystemState;
use crate::system::SystemData;

/// A body of the multibody system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    /// Fixed frame without nodes.
    Ground(ObjectGround),
    /// Point mass on a point node.
    MassPoint(ObjectMassPoint),
    /// Rigid body on an Euler-parameter node.
    RigidBody(ObjectRigidBody),
    /// Generic N-node body with a user-supplied mass matrix.
    GenericOde2(ObjectGenericOde2),
}

impl Body {
    /// User-assigned name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ground(b) => &b.name,
            Self::MassPoint(b) => &b.name,
            Self::RigidBody(b) => &b.name,
            Self::GenericOde2(b) => &b.name,
        }
    }

    /// Variant name, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Ground(_) => "ObjectGround",
            Self::MassPoint(_) => "ObjectMassPoint",
            Self::RigidBody(_) => "ObjectRigidBody",
            Self::GenericOde2(_) => "ObjectGenericODE2",
        }
    }

    /// Entity label for error messages: variant plus user name.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} '{}'", self.kind_name(), self.name())
    }

    /// The node handles this body aggregates, in local node order.
    #[must_use]
    pub fn node_indices(&self) -> &[NodeIndex] {
        match self {
            Self::Ground(_) => &[],
            Self::MassPoint(b) => std::slice::from_ref(&b.node),
            Self::RigidBody(b) => std::slice::from_ref(&b.node),
            Self::GenericOde2(b) => &b.nodes,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_indices().len()
    }

    /// Total ODE2 coordinate count over this body's nodes.
    pub fn num_ode2_coordinates(&self, system: &SystemData) -> Result<usize> {
        let mut total = 0;
        for &index in self.node_indices() {
            total += system.node(index)?.num_ode2_coordinates();
        }
        Ok(total)
    }

    /// Body-local ODE2 coordinate offset of a local node.
    ///
    /// The default is a linear scan summing the coordinate counts of the
    /// preceding nodes, O(n) in the local node number; the generic N-node
    /// variant answers from a table precomputed at construction instead.
    pub fn local_coordinate_index_per_node(
        &self,
        system: &SystemData,
        local_node: usize,
    ) -> Result<usize> {
        if let Self::GenericOde2(b) = self {
            return b.coordinate_offset(local_node);
        }
        let nodes = self.node_indices();
        if local_node >= nodes.len() {
            return Err(CoreError::InvalidLocalNode {
                entity: self.label(),
                local_node,
                num_nodes: nodes.len(),
            });
        }
        let mut offset = 0;
        for &index in &nodes[..local_node] {
            offset += system.node(index)?.num_ode2_coordinates();
        }
        Ok(offset)
    }

    /// Position of a body-local point in the given configuration.
    pub fn position(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        match self {
            Self::Ground(b) => Ok(b.position(local_position, configuration)),
            Self::MassPoint(b) => b.position(system, state, local_position, configuration),
            Self::RigidBody(b) => b.position(system, state, local_position, configuration),
            Self::GenericOde2(_) => {
                Err(CoreError::unsupported_operation(self.label(), "Position"))
            }
        }
    }

    /// Displacement of a body-local point relative to the reference
    /// placement.
    pub fn displacement(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let p = self.position(system, state, local_position, configuration)?;
        let p_ref = self.position(system, state, local_position, Configuration::Reference)?;
        Ok(p - p_ref)
    }

    /// Velocity of a body-local point. Fails for `Reference`.
    pub fn velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("Velocity", configuration)?;
        match self {
            Self::Ground(_) => Ok(Vector3::zeros()),
            Self::MassPoint(b) => b.velocity(system, state, configuration),
            Self::RigidBody(b) => b.velocity(system, state, local_position, configuration),
            Self::GenericOde2(_) => {
                Err(CoreError::unsupported_operation(self.label(), "Velocity"))
            }
        }
    }

    /// Acceleration of a body-local point. Fails for `Reference`.
    pub fn acceleration(
        &self,
        system: &SystemData,
        state: &SystemState,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("Acceleration", configuration)?;
        match self {
            Self::MassPoint(b) => b.acceleration(system, state, configuration),
            Self::RigidBody(b) => b.acceleration(system, state, local_position, configuration),
            Self::Ground(_) | Self::GenericOde2(_) => Err(CoreError::unsupported_operation(
                self.label(),
                "Acceleration",
            )),
        }
    }

    /// Rotation matrix of the body frame. Only orientation-bearing variants.
    pub fn rotation_matrix(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Matrix3<f64>> {
        match self {
            Self::Ground(b) => Ok(b.rotation_matrix()),
            Self::RigidBody(b) => Ok(b.rigid_node(system)?.rotation_matrix(state, configuration)),
            Self::MassPoint(_) | Self::GenericOde2(_) => Err(CoreError::unsupported_operation(
                self.label(),
                "RotationMatrix",
            )),
        }
    }

    /// Angular velocity of the body frame. Fails for `Reference`.
    pub fn angular_velocity(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("AngularVelocity", configuration)?;
        match self {
            Self::Ground(_) => Ok(Vector3::zeros()),
            Self::RigidBody(b) => b.rigid_node(system)?.angular_velocity(state, configuration),
            Self::MassPoint(_) | Self::GenericOde2(_) => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularVelocity",
            )),
        }
    }

    /// Angular velocity in the body-fixed frame. Fails for `Reference`.
    pub fn angular_velocity_local(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("AngularVelocityLocal", configuration)?;
        match self {
            Self::RigidBody(b) => b
                .rigid_node(system)?
                .angular_velocity_local(state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularVelocityLocal",
            )),
        }
    }

    /// Local mass matrix of this body, evaluated at the given configuration.
    ///
    /// Symmetric positive semidefinite for physically valid parameters.
    /// Non-inertial bodies answer with a definitive "not applicable" error,
    /// never a zero matrix.
    pub fn mass_matrix(
        &self,
        system: &SystemData,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DMatrix<f64>> {
        match self {
            Self::Ground(_) => Err(CoreError::MassMatrixNotApplicable {
                entity: self.label(),
            }),
            Self::MassPoint(b) => Ok(b.mass_matrix()),
            Self::RigidBody(b) => b.mass_matrix(system, state, configuration),
            Self::GenericOde2(b) => Ok(b.mass_matrix()),
        }
    }

    /// Jacobian from ODE2 coordinate velocities to a physical quantity at a
    /// body-local point, evaluated in the `Current` configuration.
    pub fn access_function(
        &self,
        system: &SystemData,
        state: &SystemState,
        access: AccessFunction,
        local_position: &Vector3<f64>,
    ) -> Result<DMatrix<f64>> {
        match self {
            Self::MassPoint(b) => match access {
                AccessFunction::TranslationalVelocityQt => Ok(DMatrix::identity(3, 3)),
                AccessFunction::DisplacementMassIntegralQ => Ok(b.mass_matrix()),
                AccessFunction::AngularVelocityQt => Err(CoreError::UnsupportedAccessFunction {
                    entity: self.label(),
                    access,
                }),
            },
            Self::RigidBody(b) => b.access_function(system, state, access, local_position),
            Self::Ground(_) | Self::GenericOde2(_) => Err(CoreError::UnsupportedAccessFunction {
                entity: self.label(),
                access,
            }),
        }
    }

    /// The output variables this variant provides.
    #[must_use]
    pub fn output_variables(&self) -> &'static [OutputVariable] {
        use OutputVariable as V;
        match self {
            Self::Ground(_) => &[
                V::Position,
                V::Displacement,
                V::Velocity,
                V::AngularVelocity,
                V::RotationMatrix,
            ],
            Self::MassPoint(_) => &[V::Position, V::Displacement, V::Velocity, V::Acceleration],
            Self::RigidBody(_) => &[
                V::Position,
                V::Displacement,
                V::Velocity,
                V::Acceleration,
                V::Rotation,
                V::RotationMatrix,
                V::AngularVelocity,
                V::AngularVelocityLocal,
            ],
            Self::GenericOde2(_) => &[],
        }
    }

    /// Uniform output-variable query at a body-local point: validate, then
    /// compute. Same contract as the node-level dispatch.
    pub fn output_variable_body(
        &self,
        system: &SystemData,
        state: &SystemState,
        variable: OutputVariable,
        local_position: &Vector3<f64>,
        configuration: Configuration,
    ) -> Result<DVector<f64>> {
        if !self.output_variables().contains(&variable) {
            return Err(CoreError::UnsupportedOutputVariable {
                entity: self.label(),
                variable,
            });
        }
        if !variable.valid_configurations().contains(configuration) {
            return Err(CoreError::invalid_configuration(
                self.label(),
                variable.to_string(),
                configuration,
            ));
        }

        use OutputVariable as V;
        match variable {
            V::Position => self
                .checked(
                    variable,
                    self.position(system, state, local_position, configuration),
                )
                .map(vector3_output),
            V::Displacement => self
                .checked(
                    variable,
                    self.displacement(system, state, local_position, configuration),
                )
                .map(vector3_output),
            V::Velocity => self
                .checked(
                    variable,
                    self.velocity(system, state, local_position, configuration),
                )
                .map(vector3_output),
            V::Acceleration => self
                .checked(
                    variable,
                    self.acceleration(system, state, local_position, configuration),
                )
                .map(vector3_output),
            V::Rotation => {
                let r = self.checked(
                    variable,
                    self.rotation_matrix(system, state, configuration),
                )?;
                Ok(vector3_output(rotation::rotation_matrix_to_xyz_angles(&r)))
            }
            V::RotationMatrix => {
                let r = self.checked(
                    variable,
                    self.rotation_matrix(system, state, configuration),
                )?;
                let mut out = DVector::zeros(9);
                for i in 0..3 {
                    for j in 0..3 {
                        out[3 * i + j] = r[(i, j)];
                    }
                }
                Ok(out)
            }
            V::AngularVelocity => self
                .checked(variable, self.angular_velocity(system, state, configuration))
                .map(vector3_output),
            V::AngularVelocityLocal => self
                .checked(
                    variable,
                    self.angular_velocity_local(system, state, configuration),
                )
                .map(vector3_output),
            V::Coordinates | V::CoordinatesT | V::CoordinatesTt | V::AngularAcceleration => {
                // Not declared by any body variant; the declared-set check
                // above already rejected the request.
                unreachable!("body output dispatch out of sync for {variable}")
            }
        }
    }

    fn checked<T>(&self, variable: OutputVariable, result: Result<T>) -> Result<T> {
        match result {
            Err(CoreError::UnsupportedOperation { .. }) => panic!(
                "{}: output variable {variable} declared but not computable (dispatch out of sync)",
                self.label()
            ),
            other => other,
        }
    }

    fn require_derivative_configuration(
        &self,
        operation: &str,
        configuration: Configuration,
    ) -> Result<()> {
        if configuration.is_valid_but_not_reference() {
            Ok(())
        } else {
            Err(CoreError::invalid_configuration(
                self.label(),
                operation,
                configuration,
            ))
        }
    }
}

fn vector3_output(v: Vector3<f64>) -> DVector<f64> {
    DVector::from_column_slice(v.as_slice())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeGenericOde2, NodePoint, NodeRigidBodyEp};
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_ground_mass_matrix_not_applicable() {
        let mut system = SystemData::new();
        let body = system
            .add_body(Body::Ground(ObjectGround::new("floor", Vector3::zeros())))
            .unwrap();
        let state = system.make_state();
        let err = system
            .body(body)
            .unwrap()
            .mass_matrix(&system, &state, Configuration::Current)
            .unwrap_err();
        assert!(matches!(err, CoreError::MassMatrixNotApplicable { .. }));
        assert!(err.to_string().contains("floor"));
    }

    #[test]
    fn test_ground_position_and_rotation() {
        let mut system = SystemData::new();
        let body = system
            .add_body(Body::Ground(ObjectGround::new(
                "floor",
                Vector3::new(0.0, -1.0, 0.0),
            )))
            .unwrap();
        let state = system.make_state();
        let body = system.body(body).unwrap();

        let p = body
            .position(
                &system,
                &state,
                &Vector3::new(2.0, 0.0, 0.0),
                Configuration::Current,
            )
            .unwrap();
        assert_relative_eq!(p, Vector3::new(2.0, -1.0, 0.0), epsilon = 1e-14);

        let out = body
            .output_variable_body(
                &system,
                &state,
                OutputVariable::RotationMatrix,
                &Vector3::zeros(),
                Configuration::Current,
            )
            .unwrap();
        assert_eq!(
            out.as_slice(),
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_mass_point_mass_matrix_and_access() {
        let mut system = SystemData::new();
        let node = system.add_node(Node::Point(NodePoint::new("p", Vector3::zeros())));
        let body = system
            .add_body(Body::MassPoint(
                ObjectMassPoint::new("m", node, 2.5).unwrap(),
            ))
            .unwrap();
        let state = system.make_state();
        let body = system.body(body).unwrap();

        let m = body
            .mass_matrix(&system, &state, Configuration::Current)
            .unwrap();
        assert_eq!(m, DMatrix::identity(3, 3) * 2.5);

        let j = body
            .access_function(
                &system,
                &state,
                AccessFunction::TranslationalVelocityQt,
                &Vector3::zeros(),
            )
            .unwrap();
        assert_eq!(j, DMatrix::identity(3, 3));

        let err = body
            .access_function(
                &system,
                &state,
                AccessFunction::AngularVelocityQt,
                &Vector3::zeros(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedAccessFunction { .. }));
    }

    #[test]
    fn test_mass_point_rejects_nonpositive_mass() {
        let err = ObjectMassPoint::new("m", NodeIndex::new(0), 0.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameters { .. }));
    }

    #[test]
    fn test_rigid_body_mass_matrix_blocks_at_identity() {
        let mut system = SystemData::new();
        let node = system.add_node(Node::RigidBodyEp(
            NodeRigidBodyEp::new("r", Vector3::zeros(), Vector4::new(1.0, 0.0, 0.0, 0.0))
                .unwrap(),
        ));
        let inertia = Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0));
        let body = system
            .add_body(Body::RigidBody(
                ObjectRigidBody::new("rb", node, 5.0, inertia).unwrap(),
            ))
            .unwrap();
        let state = system.make_state();

        let m = system
            .body(body)
            .unwrap()
            .mass_matrix(&system, &state, Configuration::Current)
            .unwrap();
        assert_eq!(m.shape(), (7, 7));
        for i in 0..3 {
            assert_relative_eq!(m[(i, i)], 5.0, epsilon = 1e-14);
        }
        // At identity orientation G_local = 2 * [0 | I3], so the rotational
        // block is 4 * diag(0, J11, J22, J33).
        assert_relative_eq!(m[(3, 3)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[(4, 4)], 4.0, epsilon = 1e-12);
        assert_relative_eq!(m[(5, 5)], 8.0, epsilon = 1e-12);
        assert_relative_eq!(m[(6, 6)], 12.0, epsilon = 1e-12);
        // Symmetry.
        assert_relative_eq!((&m - m.transpose()).abs().max(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rigid_body_rejects_asymmetric_inertia() {
        let mut bad = Matrix3::identity();
        bad[(0, 1)] = 0.5;
        let err = ObjectRigidBody::new("rb", NodeIndex::new(0), 1.0, bad).unwrap_err();
        assert!(err.to_string().contains("not symmetric"));
    }

    #[test]
    fn test_rigid_body_point_velocity_includes_rotation_term() {
        let mut system = SystemData::new();
        let node = system.add_node(Node::RigidBodyEp(
            NodeRigidBodyEp::new("r", Vector3::zeros(), Vector4::new(1.0, 0.0, 0.0, 0.0))
                .unwrap(),
        ));
        let body = system
            .add_body(Body::RigidBody(
                ObjectRigidBody::new("rb", node, 1.0, Matrix3::identity()).unwrap(),
            ))
            .unwrap();
        let mut state = system.make_state();
        // Spin about z with omega = 2: ep_t = (0, 0, 0, 1).
        state.coordinates_t_mut(Configuration::Current).unwrap()[6] = 1.0;

        // Point at local (1, 0, 0): velocity = omega x p = (0, 2, 0).
        let v = system
            .body(body)
            .unwrap()
            .velocity(
                &system,
                &state,
                &Vector3::new(1.0, 0.0, 0.0),
                Configuration::Current,
            )
            .unwrap();
        assert_relative_eq!(v, Vector3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_generic_offset_table_matches_linear_scan() {
        let mut system = SystemData::new();
        let n1 = system.add_node(Node::GenericOde2(NodeGenericOde2::new(
            "a",
            nalgebra::DVector::zeros(2),
        )));
        let n2 = system.add_node(Node::GenericOde2(NodeGenericOde2::new(
            "b",
            nalgebra::DVector::zeros(3),
        )));
        let n3 = system.add_node(Node::Point(NodePoint::new("c", Vector3::zeros())));

        let generic = ObjectGenericOde2::new(
            "fe",
            vec![n1, n2, n3],
            DMatrix::identity(8, 8),
            &system,
        )
        .unwrap();
        let body = system.add_body(Body::GenericOde2(generic)).unwrap();
        let body = system.body(body).unwrap();

        // Table answers 0, 2, 5 and must agree with the generic scan over
        // the same node list.
        let mut scan = 0;
        for (local, &index) in body.node_indices().iter().enumerate() {
            assert_eq!(
                body.local_coordinate_index_per_node(&system, local).unwrap(),
                scan
            );
            scan += system.node(index).unwrap().num_ode2_coordinates();
        }
        assert_eq!(body.local_coordinate_index_per_node(&system, 0).unwrap(), 0);

        let err = body
            .local_coordinate_index_per_node(&system, 3)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLocalNode { .. }));
    }

    #[test]
    fn test_generic_body_has_no_output_variables() {
        let mut system = SystemData::new();
        let n = system.add_node(Node::GenericOde2(NodeGenericOde2::new(
            "a",
            nalgebra::DVector::zeros(2),
        )));
        let body = system
            .add_body(Body::GenericOde2(
                ObjectGenericOde2::new("fe", vec![n], DMatrix::identity(2, 2), &system).unwrap(),
            ))
            .unwrap();
        let state = system.make_state();
        let err = system
            .body(body)
            .unwrap()
            .output_variable_body(
                &system,
                &state,
                OutputVariable::Position,
                &Vector3::zeros(),
                Configuration::Current,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOutputVariable { .. }));
    }
}
