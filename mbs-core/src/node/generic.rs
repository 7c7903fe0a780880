//! Generic coordinate nodes without a physical mapping.

use nalgebra::DVector;

use super::UNASSIGNED;

/// Node with N generic second-order differential coordinates.
///
/// Carries no mapping to physical space; bodies built on generic nodes
/// (e.g. reduced-order FE objects) interpret the coordinates themselves.
/// Output variables are restricted to the coordinate kinds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeGenericOde2 {
    pub(crate) name: String,
    reference_coordinates: DVector<f64>,
    pub(crate) coord_adr: usize,
}

impl NodeGenericOde2 {
    /// Create a generic ODE2 node; the coordinate count is fixed by the
    /// length of `reference_coordinates` and never changes afterwards.
    /// The coordinate address is assigned at registration.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_coordinates: DVector<f64>) -> Self {
        Self {
            name: name.into(),
            reference_coordinates,
            coord_adr: UNASSIGNED,
        }
    }

    /// Number of coordinates.
    #[must_use]
    pub fn num_coordinates(&self) -> usize {
        self.reference_coordinates.len()
    }

    pub(crate) fn reference_coordinates(&self) -> &DVector<f64> {
        &self.reference_coordinates
    }
}

/// Node with N algebraic coordinates.
///
/// Algebraic coordinates (Lagrange multipliers, internal constraint
/// coordinates) have no time-derivative concept: `Coordinates_t` and
/// `Coordinates_tt` are rejected for every configuration, unlike
/// differential nodes where only `Reference` is rejected.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeGenericAe {
    pub(crate) name: String,
    reference_coordinates: DVector<f64>,
    pub(crate) ae_adr: usize,
}

impl NodeGenericAe {
    /// Create a generic algebraic node. The coordinate address is assigned
    /// at registration.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_coordinates: DVector<f64>) -> Self {
        Self {
            name: name.into(),
            reference_coordinates,
            ae_adr: UNASSIGNED,
        }
    }

    /// Number of algebraic coordinates.
    #[must_use]
    pub fn num_coordinates(&self) -> usize {
        self.reference_coordinates.len()
    }

    pub(crate) fn reference_coordinates(&self) -> &DVector<f64> {
        &self.reference_coordinates
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{Node, SystemData};
    use mbs_types::{Configuration, CoreError, OutputVariable};

    #[test]
    fn test_generic_ode2_coordinate_outputs() {
        let mut system = SystemData::new();
        let idx = system.add_node(Node::GenericOde2(NodeGenericOde2::new(
            "modal",
            DVector::from_vec(vec![0.1, 0.2, 0.3]),
        )));
        let mut state = system.make_state();
        state.coordinates_mut(Configuration::Current).unwrap()[1] = 5.0;

        let node = system.node(idx).unwrap();
        let q = node
            .output_variable(&state, OutputVariable::Coordinates, Configuration::Current)
            .unwrap();
        assert_eq!(q.as_slice(), &[0.0, 5.0, 0.0]);

        let q_ref = node
            .output_variable(
                &state,
                OutputVariable::Coordinates,
                Configuration::Reference,
            )
            .unwrap();
        assert_eq!(q_ref.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_algebraic_node_has_no_derivatives_in_any_configuration() {
        let mut system = SystemData::new();
        let idx = system.add_node(Node::GenericAe(NodeGenericAe::new(
            "lambda",
            DVector::zeros(2),
        )));
        let state = system.make_state();
        let node = system.node(idx).unwrap();

        // Coordinates itself is fine, in every configuration.
        for cfg in [
            Configuration::Reference,
            Configuration::Initial,
            Configuration::Current,
            Configuration::Visualization,
        ] {
            assert!(node
                .output_variable(&state, OutputVariable::Coordinates, cfg)
                .is_ok());
        }

        // Second derivative at Current fails, unlike differential nodes.
        let err = node
            .output_variable(
                &state,
                OutputVariable::CoordinatesTt,
                Configuration::Current,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOutputVariable { .. }));

        let err = node
            .coordinate_vector_t(&state, Configuration::Current)
            .unwrap_err();
        assert!(err.is_unsupported());
    }
}
