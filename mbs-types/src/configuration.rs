//! Configuration tags and configuration sets.
//!
//! A configuration names a snapshot of system state. The four tags are
//! mutually exclusive discriminators: a query always targets exactly one
//! configuration. Entities declare which subset of configurations a given
//! quantity is legal for via [`ConfigurationSet`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named snapshot of system state.
///
/// - `Reference`: the undeformed geometric reference. Carries coordinate
///   values but no time derivatives; any derivative query at `Reference` is
///   an error, never a silent zero.
/// - `Initial`: the state at simulation start.
/// - `Current`: the state at the present simulation time.
/// - `Visualization`: the state consumed by rendering; may lag `Current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Configuration {
    /// Undeformed/initial geometric reference (derivative-free).
    Reference,
    /// State at simulation start.
    Initial,
    /// State at present simulation time.
    Current,
    /// State used only for rendering; may lag behind `Current`.
    Visualization,
}

impl Configuration {
    /// Bit used by [`ConfigurationSet`].
    const fn bit(self) -> u8 {
        match self {
            Self::Reference => 1,
            Self::Initial => 2,
            Self::Current => 4,
            Self::Visualization => 8,
        }
    }

    /// Whether this configuration is a member of the full legal set.
    ///
    /// This is the legality check for coordinate-value queries, which every
    /// configuration supports.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        ConfigurationSet::ALL.contains(self)
    }

    /// Whether this configuration carries time derivatives.
    ///
    /// This is the legality check for `Coordinates_t`/`Coordinates_tt` and
    /// every velocity/acceleration-class quantity: all configurations except
    /// `Reference`.
    #[must_use]
    pub const fn is_valid_but_not_reference(self) -> bool {
        ConfigurationSet::NOT_REFERENCE.contains(self)
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Reference => "Reference",
            Self::Initial => "Initial",
            Self::Current => "Current",
            Self::Visualization => "Visualization",
        };
        write!(f, "{name}")
    }
}

/// A subset of configurations, used by entities to declare which
/// configurations a quantity is legal for.
///
/// Sets are value types built from the named constants or with [`with`].
/// The set itself is part of the contract: validation against it happens
/// before any computation, and an illegal combination is reported as an
/// error, never mapped to a default.
///
/// [`with`]: ConfigurationSet::with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfigurationSet(u8);

impl ConfigurationSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// All four configurations (Reference, Initial, Current, Visualization).
    ///
    /// The legal set for coordinate-value queries.
    pub const ALL: Self = Self(
        Configuration::Reference.bit()
            | Configuration::Initial.bit()
            | Configuration::Current.bit()
            | Configuration::Visualization.bit(),
    );

    /// Initial, Current and Visualization; excludes Reference.
    ///
    /// The legal set for every derivative-bearing quantity.
    pub const NOT_REFERENCE: Self = Self(
        Configuration::Initial.bit()
            | Configuration::Current.bit()
            | Configuration::Visualization.bit(),
    );

    /// Membership test.
    #[must_use]
    pub const fn contains(self, configuration: Configuration) -> bool {
        self.0 & configuration.bit() != 0
    }

    /// Return a copy of this set with `configuration` added.
    #[must_use]
    pub const fn with(self, configuration: Configuration) -> Self {
        Self(self.0 | configuration.bit())
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
