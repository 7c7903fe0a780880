//! Computational core of a multibody dynamics simulator.
//!
//! The crate is split along the registry/state boundary:
//!
//! - [`SystemData`] - the static registry: nodes, bodies and markers in
//!   insertion order, with coordinate addresses assigned at registration
//! - [`SystemState`] - the dynamic store: generalized coordinate vectors
//!   per configuration, mutated only by the external solver
//!
//! On top of these sit the three entity families and the global assembly:
//!
//! - [`Node`] - owners of generalized coordinates, mapping raw coordinates
//!   to physical kinematics ([`node`] module)
//! - [`Body`] - physical objects aggregating nodes, contributing mass
//!   matrices and connector Jacobians ([`body`] module)
//! - [`Marker`] - stateless computed views connectors attach to
//! - [`assembly`] - local-to-global maps and the global mass matrix
//!
//! # Usage
//!
//! Build the registry, derive a state store from it, then query:
//!
//! ```
//! use mbs_core::{Node, SystemData};
//! use mbs_core::node::NodePoint;
//! use mbs_types::{Configuration, OutputVariable};
//! use nalgebra::Vector3;
//!
//! let mut system = SystemData::new();
//! let node = system.add_node(Node::Point(NodePoint::new(
//!     "tip",
//!     Vector3::new(1.0, 0.0, 0.0),
//! )));
//! let state = system.make_state();
//!
//! let p = system
//!     .node(node)?
//!     .output_variable(&state, OutputVariable::Position, Configuration::Current)?;
//! assert_eq!(p.as_slice(), &[1.0, 0.0, 0.0]);
//! # Ok::<(), mbs_types::CoreError>(())
//! ```
//!
//! # Concurrency
//!
//! Everything here is plain data without interior mutability. Concurrent
//! reads of a registry and state store are safe; writes go through `&mut`
//! and must be serialized by the caller against in-flight reads.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc, // Error docs added where non-obvious
)]

pub mod assembly;
pub mod body;
pub mod marker;
pub mod node;
pub mod rotation;
mod state;
mod system;
pub mod visualization;

pub use body::Body;
pub use marker::{Marker, MarkerCapabilities};
pub use node::Node;
pub use state::{CoordinateSet, SystemState};
pub use system::SystemData;
