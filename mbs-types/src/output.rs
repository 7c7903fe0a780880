//! Output variables and access functions.
//!
//! [`OutputVariable`] is the closed vocabulary of quantities a node or body
//! can be asked for; [`AccessFunction`] names the Jacobian-like mappings
//! connectors request from bodies. Both are closed enums: an entity declares
//! the subset it supports, and the dispatch validates every request against
//! that declaration before computing anything.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Configuration, ConfigurationSet};

/// A named, typed kinematic or coordinate quantity obtainable from a node or
/// body for a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputVariable {
    /// Raw generalized coordinates.
    Coordinates,
    /// First time derivative of the generalized coordinates.
    CoordinatesT,
    /// Second time derivative of the generalized coordinates.
    CoordinatesTt,
    /// 3D position of the entity (or a local point on it).
    Position,
    /// 3D displacement relative to the reference configuration.
    Displacement,
    /// 3D velocity.
    Velocity,
    /// 3D acceleration.
    Acceleration,
    /// Tait-Bryan (XYZ) rotation angles.
    Rotation,
    /// 3x3 rotation matrix, row-major as 9 components.
    RotationMatrix,
    /// Angular velocity in the global frame.
    AngularVelocity,
    /// Angular velocity in the body-fixed frame.
    AngularVelocityLocal,
    /// Angular acceleration in the global frame.
    AngularAcceleration,
}

impl OutputVariable {
    /// The configurations this variable kind is legal for, independent of
    /// the entity it is requested from.
    ///
    /// Derivative-bearing kinds exclude `Reference`; purely geometric kinds
    /// (coordinates, placement, orientation) are legal everywhere. An entity
    /// may narrow this set further but never widens it.
    #[must_use]
    pub const fn valid_configurations(self) -> ConfigurationSet {
        match self {
            Self::Coordinates
            | Self::Position
            | Self::Displacement
            | Self::Rotation
            | Self::RotationMatrix => ConfigurationSet::ALL,
            Self::CoordinatesT
            | Self::CoordinatesTt
            | Self::Velocity
            | Self::Acceleration
            | Self::AngularVelocity
            | Self::AngularVelocityLocal
            | Self::AngularAcceleration => ConfigurationSet::NOT_REFERENCE,
        }
    }

    /// Whether this variable is derived from first or second coordinate
    /// derivatives (and therefore undefined in the reference configuration).
    #[must_use]
    pub const fn is_derivative(self) -> bool {
        !self.valid_configurations().contains(Configuration::Reference)
    }
}

impl std::fmt::Display for OutputVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Coordinates => "Coordinates",
            Self::CoordinatesT => "Coordinates_t",
            Self::CoordinatesTt => "Coordinates_tt",
            Self::Position => "Position",
            Self::Displacement => "Displacement",
            Self::Velocity => "Velocity",
            Self::Acceleration => "Acceleration",
            Self::Rotation => "Rotation",
            Self::RotationMatrix => "RotationMatrix",
            Self::AngularVelocity => "AngularVelocity",
            Self::AngularVelocityLocal => "AngularVelocityLocal",
            Self::AngularAcceleration => "AngularAcceleration",
        };
        write!(f, "{name}")
    }
}

/// A Jacobian-like mapping from generalized-coordinate velocities to a
/// physical velocity at a material point, requested by connectors and loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AccessFunction {
    /// Jacobian of translational velocity w.r.t. coordinate velocities.
    TranslationalVelocityQt,
    /// Jacobian of angular velocity w.r.t. coordinate velocities.
    AngularVelocityQt,
    /// Jacobian of the mass-weighted displacement integral w.r.t. coordinates
    /// (used by mass-proportional loads such as gravity).
    DisplacementMassIntegralQ,
}

impl std::fmt::Display for AccessFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TranslationalVelocityQt => "TranslationalVelocity_qt",
            Self::AngularVelocityQt => "AngularVelocity_qt",
            Self::DisplacementMassIntegralQ => "DisplacementMassIntegral_q",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_kinds_legal_everywhere() {
        for var in [
            OutputVariable::Coordinates,
            OutputVariable::Position,
            OutputVariable::Displacement,
            OutputVariable::Rotation,
            OutputVariable::RotationMatrix,
        ] {
            assert!(var
                .valid_configurations()
                .contains(Configuration::Reference));
            assert!(!var.is_derivative());
        }
    }

    #[test]
    fn test_derivative_kinds_reject_reference() {
        for var in [
            OutputVariable::CoordinatesT,
            OutputVariable::CoordinatesTt,
            OutputVariable::Velocity,
            OutputVariable::Acceleration,
            OutputVariable::AngularVelocity,
            OutputVariable::AngularVelocityLocal,
            OutputVariable::AngularAcceleration,
        ] {
            assert!(!var
                .valid_configurations()
                .contains(Configuration::Reference));
            assert!(var.valid_configurations().contains(Configuration::Current));
            assert!(var.is_derivative());
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(OutputVariable::CoordinatesT.to_string(), "Coordinates_t");
        assert_eq!(
            AccessFunction::TranslationalVelocityQt.to_string(),
            "TranslationalVelocity_qt"
        );
    }
}
