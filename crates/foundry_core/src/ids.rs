//! Identifiers for entities and content.
//!
//! Content ids are string newtypes so they can be written by hand in RON
//! content files while built-in content stays allocation free.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for simulated entities (units and structures).
pub type EntityId = u64;

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Create an id from a static string.
            #[must_use]
            pub const fn from_static(id: &'static str) -> Self {
                Self(Cow::Borrowed(id))
            }

            /// Create an id from an owned string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(Cow::Owned(id.into()))
            }

            /// The id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&'static str> for $name {
            fn from(id: &'static str) -> Self {
                Self::from_static(id)
            }
        }
    };
}

content_id!(
    /// Identifier of a cosmetic effect played by the rendering layer.
    EffectId
);
content_id!(
    /// Identifier of an item type held in structure inventories.
    ItemId
);
content_id!(
    /// Identifier of a status effect definition.
    StatusId
);
content_id!(
    /// Identifier of a floor (terrain) definition.
    FloorId
);
content_id!(
    /// Identifier of a unit type definition.
    UnitTypeId
);
content_id!(
    /// Identifier of a generator type definition.
    GeneratorTypeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_owned_ids_compare_equal() {
        assert_eq!(StatusId::from_static("wet"), StatusId::new("wet"));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(EffectId::from("ripple").to_string(), "ripple");
    }

    #[test]
    fn test_id_ron_is_plain_string() {
        let id: FloorId = ron::from_str("\"deep-water\"").unwrap();
        assert_eq!(id.as_str(), "deep-water");
    }
}
