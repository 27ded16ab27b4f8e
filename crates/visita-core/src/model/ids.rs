// ── Core identity types ──
//
// Opaque, backend-assigned identifiers. Each entity gets its own newtype
// so a SlotId can never be passed where a VisitId is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

opaque_id!(
    /// Identifier of a marketplace property listing.
    PropertyId
);

opaque_id!(
    /// Identifier of a published visit slot, unique within a property.
    SlotId
);

opaque_id!(
    /// Identifier of a visit request, assigned by the backend on creation.
    VisitId
);

opaque_id!(
    /// Identifier of a marketplace user (buyer, agent, or admin).
    UserId
);
