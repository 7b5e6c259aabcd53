//! Domain identifier types
//!
//! This module provides newtype wrappers for Geolift identifiers.
//! Each type ensures type safety so that, for example, a layer id can never
//! be passed where a job id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
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

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| format!("Invalid {}: {}", stringify!($name), e))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a feature collection (the top-level output container)
    CollectionId
}

uuid_id! {
    /// Identifier of a layer within a collection
    LayerId
}

uuid_id! {
    /// Identifier of a persisted feature row
    FeatureId
}

uuid_id! {
    /// Identifier of an import job
    JobId
}

/// Coordinate reference system identifier
///
/// Accepts authority-prefixed identifiers ("EPSG:2056") as well as bare
/// numeric codes ("2056"), which are treated as implying the EPSG authority
/// when no explicit mapping exists.
///
/// # Examples
///
/// ```
/// use geolift::domain::ids::CrsId;
/// use std::str::FromStr;
///
/// let crs = CrsId::from_str("2056").unwrap();
/// assert_eq!(crs.authority_string(), "EPSG:2056");
/// assert_eq!(crs.epsg_code(), Some(2056));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrsId(String);

impl CrsId {
    /// Creates a new CrsId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("CRS identifier cannot be empty".to_string());
        }
        Ok(Self(id.trim().to_string()))
    }

    /// Returns the raw identifier as supplied by the caller
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric EPSG code, if one can be derived
    ///
    /// Handles both "EPSG:2056" and a bare "2056".
    pub fn epsg_code(&self) -> Option<u32> {
        let code = match self.0.rsplit_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return None,
            None => self.0.as_str(),
        };
        code.parse().ok()
    }

    /// Returns a fully-qualified authority string usable for transformations
    ///
    /// A bare numeric code implies the EPSG authority; anything else is
    /// passed through unchanged.
    pub fn authority_string(&self) -> String {
        match self.epsg_code() {
            Some(code) => format!("EPSG:{code}"),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CrsId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CrsId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("EPSG:2056", Some(2056); "prefixed")]
    #[test_case("2056", Some(2056); "bare numeric code")]
    #[test_case("epsg:4326", Some(4326); "lowercase authority")]
    #[test_case("ESRI:102100", None; "other authority")]
    #[test_case("EPSG:abc", None; "non numeric code")]
    fn test_epsg_code_extraction(input: &str, expected: Option<u32>) {
        assert_eq!(CrsId::new(input).unwrap().epsg_code(), expected);
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let a = LayerId::new();
        let b = LayerId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_uuid_id_roundtrip() {
        let id = JobId::new();
        let parsed = JobId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_uuid_id_rejects_garbage() {
        assert!(FeatureId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_crs_id_empty_rejected() {
        assert!(CrsId::new("  ").is_err());
    }

    #[test]
    fn test_crs_id_epsg_prefixed() {
        let crs = CrsId::new("EPSG:2056").unwrap();
        assert_eq!(crs.epsg_code(), Some(2056));
        assert_eq!(crs.authority_string(), "EPSG:2056");
    }

    #[test]
    fn test_crs_id_bare_numeric_implies_epsg() {
        let crs = CrsId::new("4326").unwrap();
        assert_eq!(crs.epsg_code(), Some(4326));
        assert_eq!(crs.authority_string(), "EPSG:4326");
    }

    #[test]
    fn test_crs_id_lowercase_authority() {
        let crs = CrsId::new("epsg:21781").unwrap();
        assert_eq!(crs.epsg_code(), Some(21781));
        assert_eq!(crs.authority_string(), "EPSG:21781");
    }

    #[test]
    fn test_crs_id_non_epsg_passthrough() {
        let crs = CrsId::new("ESRI:102100").unwrap();
        assert_eq!(crs.epsg_code(), None);
        assert_eq!(crs.authority_string(), "ESRI:102100");
    }

    #[test]
    fn test_crs_id_serialization() {
        let crs = CrsId::new("EPSG:2056").unwrap();
        let json = serde_json::to_string(&crs).unwrap();
        assert_eq!(json, "\"EPSG:2056\"");
        let back: CrsId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, crs);
    }
}
