//! Object kinds.
//!
//! The set of kinds is closed: every `define <kind> {` block must name one of
//! them. Kinds serialize as their ordinal, matching the JSON produced by
//! existing tooling, and deserialize from either the ordinal or the name.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Names of all kinds, indexed by ordinal.
const KIND_NAMES: [&str; 14] = [
    "command",
    "contact",
    "contactgroup",
    "host",
    "hostdependency",
    "hostescalation",
    "hostextinfo",
    "hostgroup",
    "service",
    "servicedependency",
    "serviceescalation",
    "serviceextinfo",
    "servicegroup",
    "timeperiod",
];

/// The category of a configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// A command definition (`command_name`, `command_line`).
    Command,
    /// A person or endpoint receiving notifications.
    Contact,
    /// A named group of contacts.
    ContactGroup,
    /// A monitored host.
    Host,
    /// A dependency between hosts.
    HostDependency,
    /// Notification escalation for a host.
    HostEscalation,
    /// Extended display information for a host.
    HostExtInfo,
    /// A named group of hosts.
    HostGroup,
    /// A check run against a host.
    Service,
    /// A dependency between services.
    ServiceDependency,
    /// Notification escalation for a service.
    ServiceEscalation,
    /// Extended display information for a service.
    ServiceExtInfo,
    /// A named group of services.
    ServiceGroup,
    /// A named set of time ranges.
    TimePeriod,
}

impl ObjectKind {
    /// Every kind, in ordinal order.
    pub const ALL: [Self; 14] = [
        Self::Command,
        Self::Contact,
        Self::ContactGroup,
        Self::Host,
        Self::HostDependency,
        Self::HostEscalation,
        Self::HostExtInfo,
        Self::HostGroup,
        Self::Service,
        Self::ServiceDependency,
        Self::ServiceEscalation,
        Self::ServiceExtInfo,
        Self::ServiceGroup,
        Self::TimePeriod,
    ];

    /// The ordinal used in the JSON representation.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: u64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// The keyword used after `define`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        KIND_NAMES[self as usize]
    }

    /// Looks up a kind by its `define` keyword. Matching is exact.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        KIND_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|idx| Self::ALL[idx])
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownKind {
            name: s.to_string(),
        })
    }
}

impl Serialize for ObjectKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

struct KindVisitor;

impl Visitor<'_> for KindVisitor {
    type Value = ObjectKind;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object kind ordinal or name")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        ObjectKind::from_ordinal(v)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .ok()
            .and_then(ObjectKind::from_ordinal)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        ObjectKind::from_name(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for ObjectKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KindVisitor)
    }
}
