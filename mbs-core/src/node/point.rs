//! Point-class nodes: 1D, 3D and ground.

use nalgebra::{DVector, Vector3};

use mbs_types::{Configuration, Result};

use crate::state::SystemState;

use super::UNASSIGNED;

/// Node with a single generalized coordinate, interpreted as the
/// x-component of a 3D point.
///
/// Used by scalar mechanisms (rotors, drivetrains, 1D oscillators) where
/// the remaining two components are identically zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node1D {
    pub(crate) name: String,
    pub(crate) reference_coordinate: f64,
    pub(crate) coord_adr: usize,
}

impl Node1D {
    /// Create a 1D node with the given reference coordinate value.
    ///
    /// The coordinate address is assigned at registration; kinematic
    /// queries require a registered node.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_coordinate: f64) -> Self {
        Self {
            name: name.into(),
            reference_coordinate,
            coord_adr: UNASSIGNED,
        }
    }

    /// Position: the coordinate is the x-component, superimposed on the
    /// reference value for non-reference configurations.
    pub(crate) fn position(&self, state: &SystemState, configuration: Configuration) -> Vector3<f64> {
        let mut x = state.reference_coordinates()[self.coord_adr];
        if configuration != Configuration::Reference {
            x += state.coordinates(configuration)[self.coord_adr];
        }
        Vector3::new(x, 0.0, 0.0)
    }

    pub(crate) fn velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let v = state.coordinates_t(configuration)?;
        Ok(Vector3::new(v[self.coord_adr], 0.0, 0.0))
    }

    pub(crate) fn acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        let a = state.coordinates_tt(configuration)?;
        Ok(Vector3::new(a[self.coord_adr], 0.0, 0.0))
    }
}

/// 3D point node with three displacement coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePoint {
    pub(crate) name: String,
    pub(crate) reference_position: Vector3<f64>,
    pub(crate) coord_adr: usize,
}

impl NodePoint {
    /// Create a point node at the given reference position.
    ///
    /// The coordinate address is assigned at registration; kinematic
    /// queries require a registered node.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_position: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            reference_position,
            coord_adr: UNASSIGNED,
        }
    }

    fn displacement(&self, coords: &DVector<f64>) -> Vector3<f64> {
        Vector3::new(
            coords[self.coord_adr],
            coords[self.coord_adr + 1],
            coords[self.coord_adr + 2],
        )
    }

    pub(crate) fn position(&self, state: &SystemState, configuration: Configuration) -> Vector3<f64> {
        if configuration == Configuration::Reference {
            return self.reference_position;
        }
        self.reference_position + self.displacement(state.coordinates(configuration))
    }

    pub(crate) fn velocity(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        Ok(self.displacement(state.coordinates_t(configuration)?))
    }

    pub(crate) fn acceleration(
        &self,
        state: &SystemState,
        configuration: Configuration,
    ) -> Result<Vector3<f64>> {
        Ok(self.displacement(state.coordinates_tt(configuration)?))
    }
}

/// Fixed point node without generalized coordinates.
///
/// Serves as an attachment point for ground connectors. Its placement is
/// the same in every configuration and its velocity and acceleration are
/// genuinely zero (not defaulted) for every non-reference configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePointGround {
    pub(crate) name: String,
    pub(crate) reference_point: Vector3<f64>,
}

impl NodePointGround {
    /// Create a ground node at the given fixed point.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_point: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            reference_point,
        }
    }

    pub(crate) fn position(&self) -> Vector3<f64> {
        self.reference_point
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{Node, SystemData};
    use approx::assert_relative_eq;

    #[test]
    fn test_node1d_scenario() {
        // Reference coordinate 2.0, current offset 0.5, velocity 1.2.
        let mut system = SystemData::new();
        let idx = system.add_node(Node::Node1D(Node1D::new("axle", 2.0)));
        let mut state = system.make_state();
        state.coordinates_mut(Configuration::Current).unwrap()[0] = 0.5;
        state.coordinates_t_mut(Configuration::Current).unwrap()[0] = 1.2;

        let node = system.node(idx).unwrap();
        assert_relative_eq!(
            node.position(&state, Configuration::Current).unwrap(),
            Vector3::new(2.5, 0.0, 0.0),
            epsilon = 1e-14
        );
        assert_relative_eq!(
            node.velocity(&state, Configuration::Current).unwrap(),
            Vector3::new(1.2, 0.0, 0.0),
            epsilon = 1e-14
        );
        assert_relative_eq!(
            node.position(&state, Configuration::Reference).unwrap(),
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_point_ground_is_fixed() {
        let mut system = SystemData::new();
        let idx = system.add_node(Node::PointGround(NodePointGround::new(
            "anchor",
            Vector3::new(0.0, 1.0, -2.0),
        )));
        let state = system.make_state();
        let node = system.node(idx).unwrap();

        for cfg in [
            Configuration::Reference,
            Configuration::Initial,
            Configuration::Current,
            Configuration::Visualization,
        ] {
            assert_relative_eq!(
                node.position(&state, cfg).unwrap(),
                Vector3::new(0.0, 1.0, -2.0),
                epsilon = 1e-14
            );
        }
        assert_eq!(node.num_ode2_coordinates(), 0);
        assert_relative_eq!(
            node.velocity(&state, Configuration::Current).unwrap(),
            Vector3::zeros(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_point_initial_equals_reference_until_mutated() {
        let mut system = SystemData::new();
        let idx = system.add_node(Node::Point(NodePoint::new(
            "p",
            Vector3::new(1.0, 0.0, 0.0),
        )));
        let mut state = system.make_state();
        let node = system.node(idx).unwrap();

        assert_eq!(
            node.position(&state, Configuration::Initial).unwrap(),
            node.position(&state, Configuration::Reference).unwrap()
        );

        state.coordinates_mut(Configuration::Initial).unwrap()[2] = 0.1;
        assert_ne!(
            node.position(&state, Configuration::Initial).unwrap(),
            node.position(&state, Configuration::Reference).unwrap()
        );
    }
}
