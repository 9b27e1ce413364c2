//! Identifier types for stops, routes and buses.
//!
//! Identifiers are non-negative integers. The data service is not strict
//! about JSON types, so an identifier may arrive either as a number or as a
//! numeric string; both normalize here and nothing else gets through.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

/// Raw identifier as it may appear on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

fn parse_id(s: &str, kind: &'static str) -> Result<u32, InvalidId> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidId {
            kind,
            reason: "must be a non-negative integer",
        });
    }
    trimmed.parse().map_err(|_| InvalidId {
        kind,
        reason: "out of range",
    })
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw integer identifier.
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Parse an identifier from text, trimming surrounding whitespace.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                parse_id(s, $kind).map(Self)
            }

            /// Returns the raw integer value.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match RawId::deserialize(deserializer)? {
                    RawId::Number(n) => u32::try_from(n).map(Self).map_err(|_| {
                        serde::de::Error::custom(concat!($kind, " id out of range"))
                    }),
                    RawId::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

id_type!(
    /// Identifier of a physical stop.
    StopId,
    "stop"
);

id_type!(
    /// Identifier of a route.
    RouteId,
    "route"
);

id_type!(
    /// Identifier of a scheduled bus trip.
    BusId,
    "bus"
);
