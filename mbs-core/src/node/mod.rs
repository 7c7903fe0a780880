//! Node family: polymorphic owners of generalized coordinates.
//!
//! A node owns a contiguous slice of the system coordinate vectors and maps
//! raw coordinates to physical quantities for one coordinate representation.
//! The family is a closed enum dispatched by variant tag; each variant
//! implements an explicit capability subset, and everything outside that
//! subset is rejected with an entity-named error rather than defaulted.
//!
//! Coordinate policy (holds for every variant): non-reference coordinates are
//! *increments* superimposed on the reference placement, so
//! `position(cfg) = position(Reference) + displacement(cfg)`.
//!
//! Variants:
//!
//! - [`Node1D`] - one ODE2 coordinate on the x-axis; coordinate outputs only
//! - [`NodePoint`] - 3 ODE2 coordinates; full translational kinematics
//! - [`NodePointGround`] - no coordinates; a fixed point
//! - [`NodeGenericOde2`] - N ODE2 coordinates with no physical mapping
//! - [`NodeGenericAe`] - N algebraic coordinates (no derivative concept)
//! - [`NodeRigidBodyEp`] - displacement + Euler-parameter rotation

mod generic;
mod point;
mod rigid_body;

pub use generic::{NodeGenericAe, NodeGenericOde2};
pub use point::{Node1D, NodePoint, NodePointGround};
pub use rigid_body::NodeRigidBodyEp;

use nalgebra::{DVector, Matrix3, Vector3};

use mbs_types::{Configuration, CoreError, OutputVariable, Result};

use crate::rotation;
use crate::state::SystemState;

/// Coordinate address not yet assigned by the registry.
pub(crate) const UNASSIGNED: usize = usize::MAX;

/// A node of the multibody system.
///
/// Constructed from one of the variant types and registered with
/// [`SystemData::add_node`], which assigns the coordinate addresses. All
/// accessors take the state store explicitly; a node never holds simulation
/// state of its own.
///
/// [`SystemData::add_node`]: crate::SystemData::add_node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// Single-coordinate node; the coordinate is the x-component of a 3D point.
    Node1D(Node1D),
    /// 3D point node with three displacement coordinates.
    Point(NodePoint),
    /// Fixed point without coordinates.
    PointGround(NodePointGround),
    /// Generic second-order differential coordinates.
    GenericOde2(NodeGenericOde2),
    /// Generic algebraic coordinates.
    GenericAe(NodeGenericAe),
    /// Rigid-body node with Euler-parameter rotation.
    RigidBodyEp(NodeRigidBodyEp),
}

impl Node {
    /// User-assigned name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Node1D(n) => &n.name,
            Self::Point(n) => &n.name,
            Self::PointGround(n) => &n.name,
            Self::GenericOde2(n) => &n.name,
            Self::GenericAe(n) => &n.name,
            Self::RigidBodyEp(n) => &n.name,
        }
    }

    /// Variant name, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Node1D(_) => "Node1D",
            Self::Point(_) => "NodePoint",
            Self::PointGround(_) => "NodePointGround",
            Self::GenericOde2(_) => "NodeGenericODE2",
            Self::GenericAe(_) => "NodeGenericAE",
            Self::RigidBodyEp(_) => "NodeRigidBodyEP",
        }
    }

    /// Entity label for error messages: variant plus user name.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} '{}'", self.kind_name(), self.name())
    }

    /// Number of second-order differential (ODE2) coordinates.
    ///
    /// Fixed at construction and identical across all configurations.
    #[must_use]
    pub fn num_ode2_coordinates(&self) -> usize {
        match self {
            Self::Node1D(_) => 1,
            Self::Point(_) => 3,
            Self::PointGround(_) | Self::GenericAe(_) => 0,
            Self::GenericOde2(n) => n.num_coordinates(),
            Self::RigidBodyEp(_) => NodeRigidBodyEp::NUM_COORDINATES,
        }
    }

    /// Number of algebraic (AE) coordinates.
    #[must_use]
    pub fn num_ae_coordinates(&self) -> usize {
        match self {
            Self::GenericAe(n) => n.num_coordinates(),
            Self::RigidBodyEp(_) => 1,
            _ => 0,
        }
    }

    /// Global address of this node's ODE2 coordinates.
    #[must_use]
    pub fn ode2_address(&self) -> usize {
        match self {
            Self::Node1D(n) => n.coord_adr,
            Self::Point(n) => n.coord_adr,
            Self::GenericOde2(n) => n.coord_adr,
            Self::RigidBodyEp(n) => n.coord_adr,
            Self::PointGround(_) | Self::GenericAe(_) => 0,
        }
    }

    /// Global address of this node's algebraic coordinates.
    #[must_use]
    pub fn ae_address(&self) -> usize {
        match self {
            Self::GenericAe(n) => n.ae_adr,
            Self::RigidBodyEp(n) => n.ae_adr,
            _ => 0,
        }
    }

    pub(crate) fn assign_addresses(&mut self, ode2_adr: usize, ae_adr: usize) {
        match self {
            Self::Node1D(n) => n.coord_adr = ode2_adr,
            Self::Point(n) => n.coord_adr = ode2_adr,
            Self::GenericOde2(n) => n.coord_adr = ode2_adr,
            Self::GenericAe(n) => n.ae_adr = ae_adr,
            Self::RigidBodyEp(n) => {
                n.coord_adr = ode2_adr;
                n.ae_adr = ae_adr;
            }
            Self::PointGround(_) => {}
        }
    }

    /// Reference values of the ODE2 coordinates, gathered at registration
    /// into the system reference vector.
    #[must_use]
    pub fn reference_ode2_values(&self) -> Vec<f64> {
        match self {
            Self::Node1D(n) => vec![n.reference_coordinate],
            Self::Point(n) => n.reference_position.as_slice().to_vec(),
            Self::PointGround(_) | Self::GenericAe(_) => Vec::new(),
            Self::GenericOde2(n) => n.reference_coordinates().as_slice().to_vec(),
            Self::RigidBodyEp(n) => n.reference_ode2_values(),
        }
    }

    /// Reference values of the algebraic coordinates.
    #[must_use]
    pub fn reference_ae_values(&self) -> Vec<f64> {
        match self {
            Self::GenericAe(n) => n.reference_coordinates().as_slice().to_vec(),
            Self::RigidBodyEp(_) => vec![0.0],
            _ => Vec::new(),
        }
    }

    /// Debug-build guard: a node constructed but never registered still has
    /// unassigned coordinate addresses, and state access through it would
    /// fail with a bare out-of-bounds index instead of naming the node.
    fn debug_check_registered(&self) {
        debug_assert!(
            (self.num_ode2_coordinates() == 0 || self.ode2_address() != UNASSIGNED)
                && (self.num_ae_coordinates() == 0 || self.ae_address() != UNASSIGNED),
            "{} used before registration (coordinate address unassigned)",
            self.label()
        );
    }

    fn ode2_slice(&self, vector: &DVector<f64>) -> DVector<f64> {
        self.debug_check_registered();
        vector
            .rows(self.ode2_address(), self.num_ode2_coordinates())
            .into_owned()
    }

    /// This node's generalized coordinate vector for a configuration.
    ///
    /// For differential nodes this slices the ODE2 vectors; for algebraic
    /// nodes the AE vectors. Legal for every configuration.
    pub fn coordinate_vector(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DVector<f64>> {
        self.debug_check_registered();
        match self {
            Self::GenericAe(n) => Ok(state
                .ae_coordinates(configuration)
                .rows(n.ae_adr, n.num_coordinates())
                .into_owned()),
            _ => Ok(self.ode2_slice(state.coordinates(configuration))),
        }
    }

    /// First time derivative of this node's coordinates.
    ///
    /// Fails for `Reference` and for algebraic nodes (no derivative concept).
    pub fn coordinate_vector_t(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DVector<f64>> {
        if matches!(self, Self::GenericAe(_)) {
            return Err(CoreError::unsupported_operation(
                self.label(),
                "Coordinates_t",
            ));
        }
        let v = state.coordinates_t(configuration).map_err(|_| {
            CoreError::invalid_configuration(self.label(), "Coordinates_t", configuration)
        })?;
        Ok(self.ode2_slice(v))
    }

    /// Second time derivative of this node's coordinates.
    ///
    /// Fails for `Reference` and for algebraic nodes.
    pub fn coordinate_vector_tt(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DVector<f64>> {
        if matches!(self, Self::GenericAe(_)) {
            return Err(CoreError::unsupported_operation(
                self.label(),
                "Coordinates_tt",
            ));
        }
        let v = state.coordinates_tt(configuration).map_err(|_| {
            CoreError::invalid_configuration(self.label(), "Coordinates_tt", configuration)
        })?;
        Ok(self.ode2_slice(v))
    }

    /// This node's algebraic coordinate vector for a configuration.
    ///
    /// Only algebraic-bearing variants (generic AE, rigid body) carry AE
    /// coordinates.
    pub fn ae_coordinate_vector(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<DVector<f64>> {
        let n = self.num_ae_coordinates();
        if n == 0 {
            return Err(CoreError::unsupported_operation(
                self.label(),
                "AE coordinates",
            ));
        }
        self.debug_check_registered();
        Ok(state
            .ae_coordinates(configuration)
            .rows(self.ae_address(), n)
            .into_owned())
    }

    /// 3D position of the node in the given configuration.
    ///
    /// For `Reference` this is the reference placement, independent of any
    /// coordinate values; otherwise reference placement plus displacement.
    pub fn position(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.debug_check_registered();
        match self {
            Self::Node1D(n) => Ok(n.position(state, configuration)),
            Self::Point(n) => Ok(n.position(state, configuration)),
            Self::PointGround(n) => Ok(n.position()),
            Self::RigidBodyEp(n) => Ok(n.position(state, configuration)),
            Self::GenericOde2(_) | Self::GenericAe(_) => {
                Err(CoreError::unsupported_operation(self.label(), "Position"))
            }
        }
    }

    /// 3D velocity of the node. Fails for `Reference`.
    pub fn velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("Velocity", configuration)?;
        self.debug_check_registered();
        match self {
            Self::Node1D(n) => n.velocity(state, configuration),
            Self::Point(n) => n.velocity(state, configuration),
            Self::PointGround(_) => Ok(Vector3::zeros()),
            Self::RigidBodyEp(n) => n.velocity(state, configuration),
            Self::GenericOde2(_) | Self::GenericAe(_) => {
                Err(CoreError::unsupported_operation(self.label(), "Velocity"))
            }
        }
    }

    /// 3D acceleration of the node. Fails for `Reference`.
    pub fn acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("Acceleration", configuration)?;
        self.debug_check_registered();
        match self {
            Self::Node1D(n) => n.acceleration(state, configuration),
            Self::Point(n) => n.acceleration(state, configuration),
            Self::PointGround(_) => Ok(Vector3::zeros()),
            Self::RigidBodyEp(n) => n.acceleration(state, configuration),
            Self::GenericOde2(_) | Self::GenericAe(_) => Err(CoreError::unsupported_operation(
                self.label(),
                "Acceleration",
            )),
        }
    }

    /// Rotation matrix of the node. Only rotation-bearing variants.
    pub fn rotation_matrix(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Matrix3<f64>> {
        self.debug_check_registered();
        match self {
            Self::RigidBodyEp(n) => Ok(n.rotation_matrix(state, configuration)),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "RotationMatrix",
            )),
        }
    }

    /// Angular velocity in the global frame. Fails for `Reference`.
    pub fn angular_velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("AngularVelocity", configuration)?;
        self.debug_check_registered();
        match self {
            Self::RigidBodyEp(n) => n.angular_velocity(state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularVelocity",
            )),
        }
    }

    /// Angular velocity in the body-fixed frame. Fails for `Reference`.
    pub fn angular_velocity_local(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("AngularVelocityLocal", configuration)?;
        self.debug_check_registered();
        match self {
            Self::RigidBodyEp(n) => n.angular_velocity_local(state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularVelocityLocal",
            )),
        }
    }

    /// Angular acceleration in the global frame. Fails for `Reference`.
    pub fn angular_acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        self.require_derivative_configuration("AngularAcceleration", configuration)?;
        self.debug_check_registered();
        match self {
            Self::RigidBodyEp(n) => n.angular_acceleration(state, configuration),
            _ => Err(CoreError::unsupported_operation(
                self.label(),
                "AngularAcceleration",
            )),
        }
    }

    /// The output variables this variant provides.
    ///
    /// The declared set is part of the contract: [`output_variable`] rejects
    /// anything outside it before touching state.
    ///
    /// [`output_variable`]: Node::output_variable
    #[must_use]
    pub fn output_variables(&self) -> &'static [OutputVariable] {
        use OutputVariable as V;
        match self {
            Self::Node1D(_) | Self::GenericOde2(_) => {
                &[V::Coordinates, V::CoordinatesT, V::CoordinatesTt]
            }
            Self::Point(_) => &[
                V::Position,
                V::Displacement,
                V::Velocity,
                V::Acceleration,
                V::Coordinates,
                V::CoordinatesT,
                V::CoordinatesTt,
            ],
            Self::PointGround(_) => &[
                V::Position,
                V::Displacement,
                V::Velocity,
                V::Acceleration,
                V::Coordinates,
                V::CoordinatesT,
                V::CoordinatesTt,
            ],
            Self::GenericAe(_) => &[V::Coordinates],
            Self::RigidBodyEp(_) => &[
                V::Position,
                V::Displacement,
                V::Velocity,
                V::Acceleration,
                V::Rotation,
                V::RotationMatrix,
                V::AngularVelocity,
                V::AngularVelocityLocal,
                V::AngularAcceleration,
                V::Coordinates,
                V::CoordinatesT,
                V::CoordinatesTt,
            ],
        }
    }

    /// Uniform output-variable query: validate, then compute.
    ///
    /// Validation checks (1) that this variant declares the variable and
    /// (2) that the configuration is legal for the variable kind; either
    /// failure is a descriptive recoverable error. A variable that passes
    /// validation but cannot be computed indicates a dispatch table out of
    /// sync with the declared set and panics.
    pub fn output_variable(
        &self,
        state: &SystemState,
        variable: OutputVariable,
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
            V::Coordinates => self.coordinate_vector(state, configuration),
            V::CoordinatesT => self.coordinate_vector_t(state, configuration),
            V::CoordinatesTt => self.coordinate_vector_tt(state, configuration),
            V::Position => self
                .checked(variable, self.position(state, configuration))
                .map(vector3_output),
            V::Displacement => {
                let p = self.checked(variable, self.position(state, configuration))?;
                let p_ref = self.checked(variable, self.position(state, Configuration::Reference))?;
                Ok(vector3_output(p - p_ref))
            }
            V::Velocity => self
                .checked(variable, self.velocity(state, configuration))
                .map(vector3_output),
            V::Acceleration => self
                .checked(variable, self.acceleration(state, configuration))
                .map(vector3_output),
            V::Rotation => {
                let r = self.checked(variable, self.rotation_matrix(state, configuration))?;
                Ok(vector3_output(rotation::rotation_matrix_to_xyz_angles(&r)))
            }
            V::RotationMatrix => {
                let r = self.checked(variable, self.rotation_matrix(state, configuration))?;
                let mut out = DVector::zeros(9);
                for i in 0..3 {
                    for j in 0..3 {
                        out[3 * i + j] = r[(i, j)];
                    }
                }
                Ok(out)
            }
            V::AngularVelocity => self
                .checked(variable, self.angular_velocity(state, configuration))
                .map(vector3_output),
            V::AngularVelocityLocal => self
                .checked(variable, self.angular_velocity_local(state, configuration))
                .map(vector3_output),
            V::AngularAcceleration => self
                .checked(variable, self.angular_acceleration(state, configuration))
                .map(vector3_output),
        }
    }

    /// Convert an unsupported-operation failure into the fatal
    /// internal-consistency channel: the variant declared `variable` but the
    /// accessor behind it refuses to compute.
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
    use crate::SystemData;
    use approx::assert_relative_eq;

    fn one_node_system(node: Node) -> (SystemData, crate::SystemState, mbs_types::NodeIndex) {
        let mut system = SystemData::new();
        let idx = system.add_node(node);
        let state = system.make_state();
        (system, state, idx)
    }

    #[test]
    fn test_reference_position_ignores_coordinates() {
        let (system, mut state, idx) =
            one_node_system(Node::Point(NodePoint::new("p", Vector3::new(1.0, 2.0, 3.0))));
        state.coordinates_mut(Configuration::Current).unwrap()[0] = 10.0;

        let node = system.node(idx).unwrap();
        let p_ref = node.position(&state, Configuration::Reference).unwrap();
        assert_relative_eq!(p_ref, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-14);

        let p_cur = node.position(&state, Configuration::Current).unwrap();
        assert_relative_eq!(p_cur, Vector3::new(11.0, 2.0, 3.0), epsilon = 1e-14);
    }

    #[test]
    fn test_velocity_rejected_for_reference_on_every_variant() {
        let variants = vec![
            Node::Node1D(Node1D::new("a", 0.0)),
            Node::Point(NodePoint::new("b", Vector3::zeros())),
            Node::PointGround(NodePointGround::new("c", Vector3::zeros())),
            Node::GenericOde2(NodeGenericOde2::new("d", DVector::zeros(2))),
            Node::GenericAe(NodeGenericAe::new("e", DVector::zeros(2))),
            Node::RigidBodyEp(
                NodeRigidBodyEp::new(
                    "f",
                    Vector3::zeros(),
                    nalgebra::Vector4::new(1.0, 0.0, 0.0, 0.0),
                )
                .unwrap(),
            ),
        ];
        for node in variants {
            let (system, state, idx) = one_node_system(node);
            let node = system.node(idx).unwrap();
            let err = node.velocity(&state, Configuration::Reference).unwrap_err();
            assert!(
                err.is_invalid_configuration(),
                "{}: expected invalid configuration, got {err}",
                node.label()
            );
        }
    }

    #[test]
    fn test_generic_ode2_has_no_physical_position() {
        let (system, state, idx) =
            one_node_system(Node::GenericOde2(NodeGenericOde2::new("g", DVector::zeros(4))));
        let node = system.node(idx).unwrap();
        let err = node.position(&state, Configuration::Current).unwrap_err();
        assert!(err.is_unsupported());

        // And Velocity is not a declared output variable.
        let err = node
            .output_variable(&state, OutputVariable::Velocity, Configuration::Current)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedOutputVariable { .. }
        ));
    }

    #[test]
    fn test_output_variable_rejects_illegal_configuration_before_compute() {
        let (system, state, idx) = one_node_system(Node::Node1D(Node1D::new("n", 1.0)));
        let node = system.node(idx).unwrap();
        let err = node
            .output_variable(
                &state,
                OutputVariable::CoordinatesT,
                Configuration::Reference,
            )
            .unwrap_err();
        assert!(err.is_invalid_configuration());
        assert!(err.to_string().contains("Node1D 'n'"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used before registration")]
    fn test_unregistered_node_is_reported_by_name() {
        let node = Node::Point(NodePoint::new("loose", Vector3::zeros()));
        let state = crate::SystemState::new(DVector::zeros(3), DVector::zeros(0));
        let _ = node.position(&state, Configuration::Current);
    }

    #[test]
    fn test_rotation_matrix_output_is_row_major() {
        let ep = nalgebra::Vector4::new(
            (0.35_f64).cos(),
            0.0,
            0.0,
            (0.35_f64).sin(),
        );
        let (system, state, idx) = one_node_system(Node::RigidBodyEp(
            NodeRigidBodyEp::new("r", Vector3::zeros(), ep).unwrap(),
        ));
        let node = system.node(idx).unwrap();
        let out = node
            .output_variable(
                &state,
                OutputVariable::RotationMatrix,
                Configuration::Current,
            )
            .unwrap();
        let r = node
            .rotation_matrix(&state, Configuration::Current)
            .unwrap();
        assert_eq!(out.len(), 9);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(out[3 * i + j], r[(i, j)], epsilon = 1e-14);
            }
        }
    }
}
