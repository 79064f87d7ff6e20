//! The closed set of scalar fields stored in each snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// A named scalar field of a daily snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Sea surface temperature (degrees Celsius).
    Sst,
    /// Sea surface temperature anomaly (degrees Celsius).
    SstAnomaly,
    /// Sea ice fraction (0-1).
    SeaIce,
}

impl Field {
    /// Every field, in canonical order.
    pub const ALL: [Field; 3] = [Field::Sst, Field::SstAnomaly, Field::SeaIce];

    /// Field served when the request names none.
    pub const DEFAULT: Field = Field::Sst;

    /// Wire and array name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Sst => "sst",
            Field::SstAnomaly => "sst_anomaly",
            Field::SeaIce => "sea_ice",
        }
    }

    /// Wire names of all fields, in canonical order.
    pub fn allowed_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| QueryError::UnsupportedField {
                offenders: vec![s.to_string()],
                allowed: Field::allowed_names(),
            })
    }
}

/// Validated, non-empty, duplicate-free list of requested fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet(Vec<Field>);

impl FieldSet {
    /// Parse the comma-separated `append` parameter.
    ///
    /// Absent or blank input selects [`Field::DEFAULT`]. Every unknown name is
    /// reported at once.
    pub fn parse(append: Option<&str>) -> Result<Self> {
        let Some(raw) = append.filter(|s| !s.trim().is_empty()) else {
            return Ok(Self(vec![Field::DEFAULT]));
        };

        let tokens: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let offenders: Vec<String> = tokens
            .iter()
            .filter(|t| t.parse::<Field>().is_err())
            .map(|t| t.to_string())
            .collect();
        if !offenders.is_empty() {
            return Err(QueryError::UnsupportedField {
                offenders,
                allowed: Field::allowed_names(),
            });
        }

        let fields = tokens
            .iter()
            .map(|t| t.parse::<Field>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields)
    }

    /// Build from already-typed fields.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        if fields.is_empty() {
            return Err(QueryError::invalid_input(
                "At least one field must be requested.",
            ));
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].contains(field) {
                return Err(QueryError::invalid_input(format!(
                    "Duplicate field '{}' in request.",
                    field
                )));
            }
        }
        Ok(Self(fields))
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self(vec![Field::DEFAULT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_field_when_absent_or_blank() {
        assert_eq!(FieldSet::parse(None).unwrap().as_slice(), &[Field::Sst]);
        assert_eq!(FieldSet::parse(Some("  ")).unwrap().as_slice(), &[Field::Sst]);
    }

    #[test]
    fn test_parse_preserves_request_order() {
        let set = FieldSet::parse(Some("sea_ice, sst")).unwrap();
        assert_eq!(set.as_slice(), &[Field::SeaIce, Field::Sst]);
    }

    #[test]
    fn test_unknown_fields_reported_together() {
        let err = FieldSet::parse(Some("sst,chl,wind")).unwrap_err();
        match err {
            QueryError::UnsupportedField { offenders, allowed } => {
                assert_eq!(offenders, vec!["chl", "wind"]);
                assert_eq!(allowed, vec!["sst", "sst_anomaly", "sea_ice"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = FieldSet::parse(Some("sst,sst")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));
    }

    #[test]
    fn test_only_separators_is_empty_set() {
        let err = FieldSet::parse(Some(",,")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));
    }

    #[test]
    fn test_field_round_trips_through_str() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
    }
}
