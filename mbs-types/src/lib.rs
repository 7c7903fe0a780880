//! Core vocabulary for multibody system dynamics.
//!
//! This crate provides the foundational types shared by every layer of the
//! multibody core:
//!
//! - [`Configuration`] / [`ConfigurationSet`] - named state snapshots and the
//!   legal subsets entities declare for them
//! - [`OutputVariable`] / [`AccessFunction`] - the closed vocabulary of
//!   queryable kinematic quantities and connector Jacobians
//! - [`NodeIndex`] / [`ObjectIndex`] / [`MarkerIndex`] - stable handles into
//!   the system registry
//! - [`CoreError`] - the recoverable error channel for user/model errors
//!
//! # Design Philosophy
//!
//! These types are **pure vocabulary**. They carry no simulation state and no
//! kinematics; their only behavior is validity predicates (which
//! configurations are legal for which quantity). They are the common language
//! between:
//!
//! - The computational core (nodes, bodies, markers)
//! - The global assembler and external time integrators
//! - Binding and visualization layers built on top
//!
//! # Error Model
//!
//! Every illegal request - an unsupported output variable, a derivative query
//! in the reference configuration, an out-of-range index - is rejected with a
//! descriptive [`CoreError`] naming the entity and operation. There is no
//! silent default substitution anywhere in the core. Internal-consistency
//! violations (a dispatch table out of sync with a declared capability set)
//! are panics, not errors: they indicate a programming defect, not user
//! misuse.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc, // Error docs added where non-obvious
)]

mod configuration;
mod error;
mod index;
mod output;

pub use configuration::{Configuration, ConfigurationSet};
pub use error::CoreError;
pub use index::{MarkerIndex, NodeIndex, ObjectIndex};
pub use output::{AccessFunction, OutputVariable};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
