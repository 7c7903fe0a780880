//! Stable handles into the system registry.
//!
//! Bodies reference their nodes by index, never by ownership; all lookups
//! resolve through the system registry. Handles are plain newtypes so that a
//! node index can never be passed where a body index is expected.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! entity_index {
    ($(#[$doc:meta])* $name:ident, $display:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub usize);

        impl $name {
            /// Create a new index.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[must_use]
            pub const fn raw(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($display, "({})"), self.0)
            }
        }
    };
}

entity_index!(
    /// Handle of a node in the system registry.
    NodeIndex,
    "Node"
);

entity_index!(
    /// Handle of a body/object in the system registry.
    ObjectIndex,
    "Object"
);

entity_index!(
    /// Handle of a marker in the system registry.
    MarkerIndex,
    "Marker"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let n = NodeIndex::new(7);
        assert_eq!(n.raw(), 7);
        assert_eq!(n, NodeIndex::from(7));
        assert_eq!(n.to_string(), "Node(7)");
    }

    #[test]
    fn test_index_ordering() {
        assert!(ObjectIndex::new(1) < ObjectIndex::new(2));
        assert_eq!(MarkerIndex::new(0).to_string(), "Marker(0)");
    }
}
