//! Object identities.
//!
//! Identities are only needed when objects go into an [`ObjectMap`], so they
//! are optional on [`ConfigObject`] and handed out by an
//! [`IdentityGenerator`] at parse time.
//!
//! [`ObjectMap`]: crate::collection::ObjectMap
//! [`ConfigObject`]: crate::object::ConfigObject

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A 128-bit object identity.
///
/// Renders as, and parses from, the canonical hyphenated hex form.
///
/// # Examples
///
/// ```
/// use nagioscfg::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed: ObjectId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Creates a new random identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Builds an identity from a raw 128-bit value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses the canonical hyphenated form.
    pub fn parse_str(s: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ValidationError::InvalidIdentity {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Hands out identities to newly parsed objects.
pub trait IdentityGenerator: Send {
    /// Produces the next identity.
    fn generate(&mut self) -> ObjectId;
}

/// Random (UUID v4) identities.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentity;

impl IdentityGenerator for RandomIdentity {
    fn generate(&mut self) -> ObjectId {
        ObjectId::new()
    }
}

/// Sequential identities starting from a base value.
///
/// Useful when output has to be reproducible.
#[derive(Debug, Clone)]
pub struct SequentialIdentity {
    next: u128,
}

impl SequentialIdentity {
    /// Starts the sequence at `start`.
    #[must_use]
    pub const fn starting_at(start: u128) -> Self {
        Self { next: start }
    }
}

impl IdentityGenerator for SequentialIdentity {
    fn generate(&mut self) -> ObjectId {
        let id = ObjectId::from_u128(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
