// ABOUTME: Type-safe identifier newtypes for profiles, parameters, and servers
// ABOUTME: Keeps integer ids from different tables from being mixed up at compile time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw integer value
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Whether the id can refer to a stored row (ids start at 1)
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a profile row
    ProfileId
);

define_id!(
    /// Identifier of a parameter row
    ParameterId
);

define_id!(
    /// Identifier of a server row
    ServerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&ProfileId(7)).unwrap();
        assert_eq!(json, "7");
        let id: ParameterId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ParameterId(42));
    }

    #[test]
    fn test_zero_and_negative_ids_are_invalid() {
        assert!(!ProfileId(0).is_valid());
        assert!(!ParameterId(-3).is_valid());
        assert!(ServerId(1).is_valid());
    }

    #[test]
    fn test_parse_from_query_string() {
        assert_eq!(" 12 ".parse::<ProfileId>().unwrap(), ProfileId(12));
        assert!("abc".parse::<ProfileId>().is_err());
    }
}
