//! Global assembly: local-to-global coordinate maps and system matrices.
//!
//! The external integrator consumes the equation-of-motion terms through
//! these free functions. Each body contributes a local mass matrix over its
//! own coordinates; the local-to-global (ltg) map scatters local entries
//! into the global ODE2 coordinate ordering fixed by the registry.

use nalgebra::{DMatrix, DVector};

use mbs_types::{Configuration, CoreError, ObjectIndex, Result};

use crate::state::SystemState;
use crate::system::SystemData;

/// Local-to-global ODE2 coordinate map of a body.
///
/// Entry `k` is the global coordinate index of the body's local ODE2
/// coordinate `k`, walking the body's nodes in local order.
pub fn object_ltg(system: &SystemData, body: ObjectIndex) -> Result<Vec<usize>> {
    let body = system.body(body)?;
    let mut ltg = Vec::new();
    for &node_index in body.node_indices() {
        let node = system.node(node_index)?;
        let adr = node.ode2_address();
        ltg.extend(adr..adr + node.num_ode2_coordinates());
    }
    Ok(ltg)
}

/// Assemble the global mass matrix over all ODE2 coordinates.
///
/// Walks every body once, evaluates its local mass matrix in the given
/// configuration and scatters it through the body's ltg map. Non-inertial
/// bodies (ground) contribute nothing; their "not applicable" answer is a
/// skip here, while direct callers of the body still see the error. Every
/// other failure propagates.
pub fn system_mass_matrix(
    system: &SystemData,
    state: &SystemState,
    configuration: Configuration,
) -> Result<DMatrix<f64>> {
    let n = system.num_ode2_coordinates();
    let mut global = DMatrix::zeros(n, n);

    for (i, body) in system.bodies().iter().enumerate() {
        let local = match body.mass_matrix(system, state, configuration) {
            Ok(m) => m,
            Err(CoreError::MassMatrixNotApplicable { .. }) => continue,
            Err(e) => return Err(e),
        };
        let ltg = object_ltg(system, ObjectIndex::new(i))?;
        debug_assert_eq!(local.nrows(), ltg.len());
        for (li, &gi) in ltg.iter().enumerate() {
            for (lj, &gj) in ltg.iter().enumerate() {
                global[(gi, gj)] += local[(li, lj)];
            }
        }
    }
    Ok(global)
}

/// Global ODE2 coordinate vector of a configuration, gathered node-wise.
///
/// Equals the store's coordinate vector; the node walk exercises every
/// node's address bookkeeping, and nodes without ODE2 coordinates are
/// skipped.
pub fn system_coordinate_vector(
    system: &SystemData,
    state: &SystemState,
    configuration: Configuration,
) -> Result<DVector<f64>> {
    let mut out = DVector::zeros(system.num_ode2_coordinates());
    for node in system.nodes() {
        if node.num_ode2_coordinates() == 0 {
            continue;
        }
        let q = node.coordinate_vector(state, configuration)?;
        out.rows_mut(node.ode2_address(), q.len()).copy_from(&q);
    }
    Ok(out)
}

/// Global first-derivative vector of a configuration. Fails for
/// `Reference`.
pub fn system_coordinate_vector_t(
    system: &SystemData,
    state: &SystemState,
    configuration: Configuration,
) -> Result<DVector<f64>> {
    let mut out = DVector::zeros(system.num_ode2_coordinates());
    for node in system.nodes() {
        if node.num_ode2_coordinates() == 0 {
            continue;
        }
        let v = node.coordinate_vector_t(state, configuration)?;
        out.rows_mut(node.ode2_address(), v.len()).copy_from(&v);
    }
    Ok(out)
}

/// Global algebraic coordinate vector of a configuration.
pub fn system_ae_coordinate_vector(
    system: &SystemData,
    state: &SystemState,
    configuration: Configuration,
) -> Result<DVector<f64>> {
    let mut out = DVector::zeros(system.num_ae_coordinates());
    for node in system.nodes() {
        let n = node.num_ae_coordinates();
        if n == 0 {
            continue;
        }
        let lambda = node.ae_coordinate_vector(state, configuration)?;
        out.rows_mut(node.ae_address(), n).copy_from(&lambda);
    }
    Ok(out)
}
