//! One-way visualization hook.
//!
//! An external render loop drives [`update_graphics`] after copying current
//! state into the visualization configuration. The hook is best effort: it
//! emits trace events describing the visualization-state placement of every
//! entity that has one and never feeds anything back into the simulation.

use tracing::{debug, trace};

use mbs_types::Configuration;

use crate::state::SystemState;
use crate::system::SystemData;

/// Emit the visualization-configuration placement of every node and body.
///
/// Entities without a physical placement (generic coordinate nodes) are
/// passed over silently; an entity whose placement query fails is reported
/// at debug level and skipped. No error is returned and no state changes.
pub fn update_graphics(system: &SystemData, state: &SystemState) {
    let cfg = Configuration::Visualization;

    for node in system.nodes() {
        match node.position(state, cfg) {
            Ok(p) => {
                trace!(node = %node.label(), x = p[0], y = p[1], z = p[2], "node placement");
            }
            Err(e) if e.is_unsupported() => {}
            Err(e) => {
                debug!(node = %node.label(), error = %e, "node placement unavailable");
            }
        }
    }

    for body in system.bodies() {
        let origin = nalgebra::Vector3::zeros();
        match body.position(system, state, &origin, cfg) {
            Ok(p) => {
                trace!(body = %body.label(), x = p[0], y = p[1], z = p[2], "body placement");
            }
            Err(e) if e.is_unsupported() => {}
            Err(e) => {
                debug!(body = %body.label(), error = %e, "body placement unavailable");
            }
        }
    }
}
