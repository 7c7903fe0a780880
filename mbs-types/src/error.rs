//! Error types for core operations.
//!
//! [`CoreError`] is the recoverable channel for user/model errors: every
//! variant names the offending entity and operation so binding layers can
//! surface it verbatim. Internal-consistency violations (dispatch tables out
//! of sync with declared capability sets) are deliberately *not* represented
//! here - those panic, because they indicate a programming defect.

use thiserror::Error;

use crate::{AccessFunction, Configuration, MarkerIndex, NodeIndex, ObjectIndex, OutputVariable};

/// Recoverable errors raised by the multibody core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A quantity was requested in a configuration it is not defined for
    /// (e.g. a derivative in the reference configuration).
    #[error("{entity}: invalid configuration {configuration} for {operation}")]
    InvalidConfiguration {
        /// The entity the request targeted.
        entity: String,
        /// The operation or output variable that was requested.
        operation: String,
        /// The offending configuration.
        configuration: Configuration,
    },

    /// An output variable was requested from an entity that does not
    /// provide it.
    #[error("{entity}: unsupported output variable {variable}")]
    UnsupportedOutputVariable {
        /// The entity the request targeted.
        entity: String,
        /// The requested variable kind.
        variable: OutputVariable,
    },

    /// An operation was called on an entity variant that does not implement
    /// that physical quantity (e.g. a rotation matrix of a point mass).
    #[error("{entity}: unsupported operation {operation}")]
    UnsupportedOperation {
        /// The entity the request targeted.
        entity: String,
        /// The unsupported operation.
        operation: &'static str,
    },

    /// An access function was requested that this body does not provide.
    #[error("{entity}: unsupported access function {access}")]
    UnsupportedAccessFunction {
        /// The body the request targeted.
        entity: String,
        /// The requested access function.
        access: AccessFunction,
    },

    /// A mass matrix was requested from a body that is not inertial.
    ///
    /// Distinct from a zero matrix: callers can tell "massless" apart from
    /// "not applicable".
    #[error("{entity}: mass matrix not applicable (body is not inertial)")]
    MassMatrixNotApplicable {
        /// The non-inertial body.
        entity: String,
    },

    /// A local node number was out of range for a body.
    #[error("{entity}: local node {local_node} out of range (body has {num_nodes} nodes)")]
    InvalidLocalNode {
        /// The body the request targeted.
        entity: String,
        /// The requested local node number.
        local_node: usize,
        /// Number of nodes the body owns.
        num_nodes: usize,
    },

    /// A node handle did not resolve in the registry.
    #[error("invalid node index {index} (registry has {count} nodes)")]
    InvalidNodeIndex {
        /// The offending handle.
        index: NodeIndex,
        /// Number of registered nodes.
        count: usize,
    },

    /// A body handle did not resolve in the registry.
    #[error("invalid object index {index} (registry has {count} objects)")]
    InvalidObjectIndex {
        /// The offending handle.
        index: ObjectIndex,
        /// Number of registered bodies.
        count: usize,
    },

    /// A marker handle did not resolve in the registry.
    #[error("invalid marker index {index} (registry has {count} markers)")]
    InvalidMarkerIndex {
        /// The offending handle.
        index: MarkerIndex,
        /// Number of registered markers.
        count: usize,
    },

    /// A coordinate selector was out of range for the target node.
    #[error("{entity}: coordinate {coordinate} out of range (node has {count} coordinates)")]
    InvalidCoordinateIndex {
        /// The marker or entity holding the selector.
        entity: String,
        /// The requested coordinate number.
        coordinate: usize,
        /// Number of coordinates the node owns.
        count: usize,
    },

    /// A body was attached to a node of the wrong kind.
    #[error("{entity}: node {node} has wrong kind (expected {expected})")]
    IncompatibleNode {
        /// The body being constructed.
        entity: String,
        /// The incompatible node handle.
        node: NodeIndex,
        /// The node kind the body requires.
        expected: &'static str,
    },

    /// Physically or structurally invalid construction parameters.
    #[error("{entity}: invalid parameters: {reason}")]
    InvalidParameters {
        /// The entity being constructed.
        entity: String,
        /// Description of what is wrong.
        reason: String,
    },
}

impl CoreError {
    /// Create an invalid-configuration error.
    #[must_use]
    pub fn invalid_configuration(
        entity: impl Into<String>,
        operation: impl Into<String>,
        configuration: Configuration,
    ) -> Self {
        Self::InvalidConfiguration {
            entity: entity.into(),
            operation: operation.into(),
            configuration,
        }
    }

    /// Create an unsupported-operation error.
    #[must_use]
    pub fn unsupported_operation(entity: impl Into<String>, operation: &'static str) -> Self {
        Self::UnsupportedOperation {
            entity: entity.into(),
            operation,
        }
    }

    /// Create an invalid-parameters error.
    #[must_use]
    pub fn invalid_parameters(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is an invalid-configuration error.
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Check if this rejects an unsupported quantity or operation (as
    /// opposed to a bad index or bad parameters).
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOutputVariable { .. }
                | Self::UnsupportedOperation { .. }
                | Self::UnsupportedAccessFunction { .. }
                | Self::MassMatrixNotApplicable { .. }
        )
    }
}
