//! System registry: arena of nodes, bodies and markers.
//!
//! [`SystemData`] is the static half of the registry/state split. Entities
//! are stored in insertion order and addressed by index newtypes; node
//! coordinate addresses are assigned monotonically at insertion and never
//! move afterwards. Cross-references (body to node, marker to node or body)
//! are validated at registration, so evaluation-time lookups only fail on
//! genuinely stale handles.

use tracing::debug;

use mbs_types::{CoreError, MarkerIndex, NodeIndex, ObjectIndex, Result};

use crate::body::Body;
use crate::marker::Marker;
use crate::node::Node;
use crate::state::SystemState;

/// Registry of all model entities.
///
/// Build order is nodes first, then bodies, then markers; each `add_*`
/// returns the handle subsequent entities reference the new entity by.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemData {
    nodes: Vec<Node>,
    bodies: Vec<Body>,
    markers: Vec<Marker>,
    num_ode2: usize,
    num_ae: usize,
}

impl SystemData {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, assigning its ODE2 and AE coordinate addresses.
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        node.assign_addresses(self.num_ode2, self.num_ae);
        self.num_ode2 += node.num_ode2_coordinates();
        self.num_ae += node.num_ae_coordinates();
        let index = NodeIndex::new(self.nodes.len());
        debug!(
            node = %node.label(),
            %index,
            ode2 = node.num_ode2_coordinates(),
            ae = node.num_ae_coordinates(),
            "registered node"
        );
        self.nodes.push(node);
        index
    }

    /// Register a body after validating its node references.
    ///
    /// Every referenced node must exist and have the kind the body variant
    /// requires; a mismatch is rejected here so evaluation never meets an
    /// incompatible node through a registered body.
    pub fn add_body(&mut self, body: Body) -> Result<ObjectIndex> {
        self.validate_body_nodes(&body)?;
        let index = ObjectIndex::new(self.bodies.len());
        debug!(body = %body.label(), %index, "registered body");
        self.bodies.push(body);
        Ok(index)
    }

    /// Register a marker after validating its target and selectors.
    pub fn add_marker(&mut self, marker: Marker) -> Result<MarkerIndex> {
        self.validate_marker(&marker)?;
        let index = MarkerIndex::new(self.markers.len());
        debug!(marker = %marker.label(), %index, "registered marker");
        self.markers.push(marker);
        Ok(index)
    }

    fn validate_body_nodes(&self, body: &Body) -> Result<()> {
        for &index in body.node_indices() {
            let node = self.node(index)?;
            let compatible = match body {
                Body::Ground(_) => true,
                Body::MassPoint(_) => matches!(node, Node::Point(_)),
                Body::RigidBody(_) => matches!(node, Node::RigidBodyEp(_)),
                // The generic body validated coordinate-bearing kinds at
                // construction (it needed the registry for its offset table).
                Body::GenericOde2(_) => node.num_ode2_coordinates() > 0,
            };
            if !compatible {
                return Err(CoreError::IncompatibleNode {
                    entity: body.label(),
                    node: index,
                    expected: match body {
                        Body::MassPoint(_) => "NodePoint",
                        Body::RigidBody(_) => "NodeRigidBodyEP",
                        _ => "node with ODE2 coordinates",
                    },
                });
            }
        }
        Ok(())
    }

    fn validate_marker(&self, marker: &Marker) -> Result<()> {
        match marker {
            Marker::NodePosition { node, .. } => {
                self.node(*node)?;
            }
            Marker::NodeCoordinate {
                node, coordinate, ..
            } => {
                let target = self.node(*node)?;
                // The coordinate selector addresses whichever class the node
                // carries: AE coordinates for algebraic nodes, ODE2 otherwise.
                let count = match target {
                    Node::GenericAe(_) => target.num_ae_coordinates(),
                    _ => target.num_ode2_coordinates(),
                };
                if *coordinate >= count {
                    return Err(CoreError::InvalidCoordinateIndex {
                        entity: marker.label(),
                        coordinate: *coordinate,
                        count,
                    });
                }
            }
            Marker::NodeRotationCoordinate {
                node,
                rotation_coordinate,
                ..
            } => {
                let target = self.node(*node)?;
                if !matches!(target, Node::RigidBodyEp(_)) {
                    return Err(CoreError::IncompatibleNode {
                        entity: marker.label(),
                        node: *node,
                        expected: "NodeRigidBodyEP",
                    });
                }
                if *rotation_coordinate > 2 {
                    return Err(CoreError::InvalidCoordinateIndex {
                        entity: marker.label(),
                        coordinate: *rotation_coordinate,
                        count: 3,
                    });
                }
            }
            Marker::BodyPosition { body, .. } | Marker::BodyRigid { body, .. } => {
                self.body(*body)?;
            }
        }
        Ok(())
    }

    /// Resolve a node handle.
    pub fn node(&self, index: NodeIndex) -> Result<&Node> {
        self.nodes.get(index.raw()).ok_or(CoreError::InvalidNodeIndex {
            index,
            count: self.nodes.len(),
        })
    }

    /// Resolve a body handle.
    pub fn body(&self, index: ObjectIndex) -> Result<&Body> {
        self.bodies
            .get(index.raw())
            .ok_or(CoreError::InvalidObjectIndex {
                index,
                count: self.bodies.len(),
            })
    }

    /// Resolve a marker handle.
    pub fn marker(&self, index: MarkerIndex) -> Result<&Marker> {
        self.markers
            .get(index.raw())
            .ok_or(CoreError::InvalidMarkerIndex {
                index,
                count: self.markers.len(),
            })
    }

    /// All registered nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All registered bodies in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// All registered markers in insertion order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Number of registered markers.
    #[must_use]
    pub fn num_markers(&self) -> usize {
        self.markers.len()
    }

    /// Total ODE2 coordinates over all registered nodes.
    #[must_use]
    pub fn num_ode2_coordinates(&self) -> usize {
        self.num_ode2
    }

    /// Total algebraic coordinates over all registered nodes.
    #[must_use]
    pub fn num_ae_coordinates(&self) -> usize {
        self.num_ae
    }

    /// Build a state store sized to the registered coordinates, with
    /// reference values gathered from the nodes and all increments zero.
    #[must_use]
    pub fn make_state(&self) -> SystemState {
        let mut reference_ode2 = Vec::with_capacity(self.num_ode2);
        let mut reference_ae = Vec::with_capacity(self.num_ae);
        for node in &self.nodes {
            reference_ode2.extend(node.reference_ode2_values());
            reference_ae.extend(node.reference_ae_values());
        }
        let mut state = SystemState::new(reference_ode2.into(), reference_ae.into());
        state.initialize();
        state
    }
}
