//! Ground body: a fixed frame without coordinates.

use nalgebra::{Matrix3, Vector3};

use mbs_types::Configuration;

/// Body fixed to the world frame.
///
/// Owns no nodes and no coordinates. Serves as the attachment side of
/// ground connectors; its placement is identical in every configuration
/// and its mass matrix is not applicable (it is not inertial, which is
/// different from having zero mass).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGround {
    pub(crate) name: String,
    pub(crate) reference_position: Vector3<f64>,
}

impl ObjectGround {
    /// Create a ground body at the given fixed position.
    #[must_use]
    pub fn new(name: impl Into<String>, reference_position: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            reference_position,
        }
    }

    /// Position of a local point. The ground frame never rotates, so the
    /// local offset is added unrotated and the configuration is irrelevant.
    pub(crate) fn position(
        &self,
        local_position: &Vector3<f64>,
        _configuration: Configuration,
    ) -> Vector3<f64> {
        self.reference_position + local_position
    }

    pub(crate) fn rotation_matrix(&self) -> Matrix3<f64> {
        Matrix3::identity()
    }
}
