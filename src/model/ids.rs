//! Opaque identifiers. All ids are UUID v4 under the hood but render as
//! plain strings at the command-surface boundary (§6: "all identifiers are
//! opaque strings").

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

opaque_id!(TaskId);
opaque_id!(DocumentId);
opaque_id!(DiffId);
opaque_id!(SkillCallId);

/// A clause identifier within a document's structure (e.g. `"14.2"`). Clause
/// ids are author-assigned strings, not generated — plain `String` is the
/// right representation (mirrors the teacher's `domain_agent.rs::Domain`
/// style of using the natural key rather than inventing a surrogate id).
pub type ClauseId = String;

/// Registered skill identifier (e.g. `"get_clause_context"`).
pub type SkillId = String;

/// Domain plugin identifier (e.g. `"nda"`, `"msa"`).
pub type DomainId = String;
