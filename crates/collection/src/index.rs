//! Strongly-typed dense indices for arena entities.
//!
//! Every entity kind gets its own index newtype so a condition index can
//! never be used to fetch a decision. Indices are assigned densely in wire
//! order at load time; they double as positions into the resolver's cache
//! arrays, which is what keeps those caches plain `Vec`s.

use serde::{Deserialize, Serialize};

macro_rules! entity_index {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw wire index.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub(crate) const fn from_usize(raw: usize) -> Self {
                Self(raw as u32)
            }

            /// The position of the entity in its arena array.
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }

            /// The raw wire value.
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_index!(
    /// Index of a qualifier type in its collection.
    QualifierTypeIndex
);
entity_index!(
    /// Index of a qualifier in its collection.
    QualifierIndex
);
entity_index!(
    /// Index of a resource type in its collection.
    ResourceTypeIndex
);
entity_index!(
    /// Index of a condition in its collection.
    ConditionIndex
);
entity_index!(
    /// Index of a condition set in its collection.
    ConditionSetIndex
);
entity_index!(
    /// Index of a decision in its collection.
    DecisionIndex
);
entity_index!(
    /// Index of a resource in its collection.
    ResourceIndex
);
