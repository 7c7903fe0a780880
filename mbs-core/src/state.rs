//! Configuration-state store.
//!
//! [`SystemState`] is the dynamic half of the registry/state split: the
//! registry ([`SystemData`]) is immutable after model build, while the store
//! holds the system-wide generalized coordinate vectors the external solver
//! mutates between steps. Nodes address into these vectors through their
//! coordinate addresses.
//!
//! Two coordinate classes are stored:
//!
//! - **ODE2** (second-order differential) coordinates with first and second
//!   time derivatives,
//! - **AE** (algebraic) coordinates with no derivative concept.
//!
//! Coordinate values of non-reference configurations are *increments*
//! relative to the reference configuration; the reference values live in
//! dedicated vectors. Querying a derivative for [`Configuration::Reference`]
//! is an error, never a silent zero.
//!
//! The store has no interior mutability and performs no locking; concurrent
//! reads are safe, and writes must be serialized by the caller relative to
//! in-flight reads (single-writer/multiple-reader discipline).
//!
//! [`SystemData`]: crate::SystemData

use nalgebra::DVector;

use mbs_types::{Configuration, CoreError, Result};

/// Entity name used in store-level error messages.
const STORE: &str = "SystemState";

/// Coordinate vectors of one non-reference configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinateSet {
    /// ODE2 coordinate increments relative to the reference configuration.
    pub ode2: DVector<f64>,
    /// First time derivatives of the ODE2 coordinates.
    pub ode2_t: DVector<f64>,
    /// Second time derivatives of the ODE2 coordinates.
    pub ode2_tt: DVector<f64>,
    /// Algebraic coordinate increments (no derivatives exist).
    pub ae: DVector<f64>,
}

impl CoordinateSet {
    fn zeros(num_ode2: usize, num_ae: usize) -> Self {
        Self {
            ode2: DVector::zeros(num_ode2),
            ode2_t: DVector::zeros(num_ode2),
            ode2_tt: DVector::zeros(num_ode2),
            ae: DVector::zeros(num_ae),
        }
    }
}

/// System-wide coordinate storage across all configurations.
///
/// Created sized to a registry via [`SystemData::make_state`]; after that
/// the vector lengths never change. The default construction leaves every
/// increment zero, so `Current == Initial == Reference`: all configurations
/// coincide with the reference placement until the solver writes state.
///
/// [`SystemData::make_state`]: crate::SystemData::make_state
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemState {
    reference_ode2: DVector<f64>,
    reference_ae: DVector<f64>,
    initial: CoordinateSet,
    current: CoordinateSet,
    visualization: CoordinateSet,
}

impl SystemState {
    /// Create a store with the given reference coordinate values and zero
    /// increments in every non-reference configuration.
    #[must_use]
    pub fn new(reference_ode2: DVector<f64>, reference_ae: DVector<f64>) -> Self {
        let num_ode2 = reference_ode2.len();
        let num_ae = reference_ae.len();
        Self {
            reference_ode2,
            reference_ae,
            initial: CoordinateSet::zeros(num_ode2, num_ae),
            current: CoordinateSet::zeros(num_ode2, num_ae),
            visualization: CoordinateSet::zeros(num_ode2, num_ae),
        }
    }

    /// Number of ODE2 coordinates in the system.
    #[must_use]
    pub fn num_ode2_coordinates(&self) -> usize {
        self.reference_ode2.len()
    }

    /// Number of algebraic coordinates in the system.
    #[must_use]
    pub fn num_ae_coordinates(&self) -> usize {
        self.reference_ae.len()
    }

    fn set(&self, configuration: Configuration) -> Option<&CoordinateSet> {
        match configuration {
            Configuration::Reference => None,
            Configuration::Initial => Some(&self.initial),
            Configuration::Current => Some(&self.current),
            Configuration::Visualization => Some(&self.visualization),
        }
    }

    fn set_mut(&mut self, configuration: Configuration) -> Option<&mut CoordinateSet> {
        match configuration {
            Configuration::Reference => None,
            Configuration::Initial => Some(&mut self.initial),
            Configuration::Current => Some(&mut self.current),
            Configuration::Visualization => Some(&mut self.visualization),
        }
    }

    /// ODE2 coordinate vector for a configuration.
    ///
    /// For `Reference` this is the reference coordinate vector itself; for
    /// every other configuration it is the increment vector relative to the
    /// reference. Legal for all configurations.
    #[must_use]
    pub fn coordinates(&self, configuration: Configuration) -> &DVector<f64> {
        self.set(configuration)
            .map_or(&self.reference_ode2, |s| &s.ode2)
    }

    /// First time derivative of the ODE2 coordinates.
    ///
    /// Fails for `Reference`: the reference configuration carries no
    /// derivative information.
    pub fn coordinates_t(&self, configuration: Configuration) -> Result<&DVector<f64>> {
        self.set(configuration).map(|s| &s.ode2_t).ok_or_else(|| {
            CoreError::invalid_configuration(STORE, "Coordinates_t", configuration)
        })
    }

    /// Second time derivative of the ODE2 coordinates.
    ///
    /// Fails for `Reference`.
    pub fn coordinates_tt(&self, configuration: Configuration) -> Result<&DVector<f64>> {
        self.set(configuration).map(|s| &s.ode2_tt).ok_or_else(|| {
            CoreError::invalid_configuration(STORE, "Coordinates_tt", configuration)
        })
    }

    /// Algebraic coordinate vector for a configuration.
    ///
    /// Legal for all configurations; algebraic coordinates never have
    /// derivatives in any configuration.
    #[must_use]
    pub fn ae_coordinates(&self, configuration: Configuration) -> &DVector<f64> {
        self.set(configuration)
            .map_or(&self.reference_ae, |s| &s.ae)
    }

    /// The ODE2 reference coordinate vector.
    #[must_use]
    pub fn reference_coordinates(&self) -> &DVector<f64> {
        &self.reference_ode2
    }

    /// The algebraic reference coordinate vector.
    #[must_use]
    pub fn reference_ae_coordinates(&self) -> &DVector<f64> {
        &self.reference_ae
    }

    /// Mutable ODE2 coordinate increments, for the external solver.
    ///
    /// Fails for `Reference`: reference values are fixed at model build.
    pub fn coordinates_mut(&mut self, configuration: Configuration) -> Result<&mut DVector<f64>> {
        self.set_mut(configuration)
            .map(|s| &mut s.ode2)
            .ok_or_else(|| CoreError::invalid_configuration(STORE, "Coordinates", configuration))
    }

    /// Mutable first derivatives, for the external solver.
    pub fn coordinates_t_mut(
        &mut self,
        configuration: Configuration,
    ) -> Result<&mut DVector<f64>> {
        self.set_mut(configuration)
            .map(|s| &mut s.ode2_t)
            .ok_or_else(|| CoreError::invalid_configuration(STORE, "Coordinates_t", configuration))
    }

    /// Mutable second derivatives, for the external solver.
    pub fn coordinates_tt_mut(
        &mut self,
        configuration: Configuration,
    ) -> Result<&mut DVector<f64>> {
        self.set_mut(configuration)
            .map(|s| &mut s.ode2_tt)
            .ok_or_else(|| {
                CoreError::invalid_configuration(STORE, "Coordinates_tt", configuration)
            })
    }

    /// Mutable algebraic coordinate increments, for the external solver.
    pub fn ae_coordinates_mut(
        &mut self,
        configuration: Configuration,
    ) -> Result<&mut DVector<f64>> {
        self.set_mut(configuration)
            .map(|s| &mut s.ae)
            .ok_or_else(|| {
                CoreError::invalid_configuration(STORE, "Coordinates (AE)", configuration)
            })
    }

    /// Copy the initial configuration into current and visualization.
    ///
    /// Performed once at model build, after initial values are set.
    pub fn initialize(&mut self) {
        self.current = self.initial.clone();
        self.visualization = self.current.clone();
    }

    /// Checkpoint: copy the current configuration into initial.
    pub fn copy_current_to_initial(&mut self) {
        self.initial = self.current.clone();
    }

    /// Copy the current configuration into visualization.
    ///
    /// Called by the owner of the render loop whenever it wants the
    /// visualization state to catch up; between calls the visualization
    /// configuration may lag behind current.
    pub fn update_visualization(&mut self) {
        self.visualization = self.current.clone();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn make_state() -> SystemState {
        SystemState::new(DVector::from_vec(vec![2.0, -1.0, 0.5]), DVector::zeros(1))
    }

    #[test]
    fn test_reference_coordinates_are_the_reference_vector() {
        let state = make_state();
        assert_eq!(state.coordinates(Configuration::Reference)[0], 2.0);
        assert_eq!(state.num_ode2_coordinates(), 3);
        assert_eq!(state.num_ae_coordinates(), 1);
    }

    #[test]
    fn test_increments_start_at_zero_in_every_configuration() {
        let state = make_state();
        for cfg in [
            Configuration::Initial,
            Configuration::Current,
            Configuration::Visualization,
        ] {
            assert_eq!(state.coordinates(cfg).iter().sum::<f64>(), 0.0);
            assert_eq!(state.coordinates_t(cfg).unwrap().iter().sum::<f64>(), 0.0);
        }
        // Round-trip at build time: initial and current coordinate vectors agree.
        assert_eq!(
            state.coordinates(Configuration::Initial),
            state.coordinates(Configuration::Current)
        );
    }

    #[test]
    fn test_derivatives_rejected_for_reference() {
        let state = make_state();
        let err = state.coordinates_t(Configuration::Reference).unwrap_err();
        assert!(err.is_invalid_configuration());
        let err = state.coordinates_tt(Configuration::Reference).unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn test_reference_writes_rejected() {
        let mut state = make_state();
        assert!(state.coordinates_mut(Configuration::Reference).is_err());
        assert!(state.coordinates_t_mut(Configuration::Reference).is_err());
        assert!(state.ae_coordinates_mut(Configuration::Reference).is_err());
    }

    #[test]
    fn test_initialize_copies_initial_to_current_and_visualization() {
        let mut state = make_state();
        state.coordinates_mut(Configuration::Initial).unwrap()[1] = 0.25;
        state.initialize();
        assert_eq!(state.coordinates(Configuration::Current)[1], 0.25);
        assert_eq!(state.coordinates(Configuration::Visualization)[1], 0.25);
    }

    #[test]
    fn test_checkpoint_and_visualization_lag() {
        let mut state = make_state();
        state.coordinates_mut(Configuration::Current).unwrap()[0] = 1.5;
        // Visualization lags until explicitly updated.
        assert_eq!(state.coordinates(Configuration::Visualization)[0], 0.0);
        state.update_visualization();
        assert_eq!(state.coordinates(Configuration::Visualization)[0], 1.5);

        state.copy_current_to_initial();
        assert_eq!(state.coordinates(Configuration::Initial)[0], 1.5);
    }
}
