//! Sort request decoding
//!
//! The `sort` query parameter carries a comma-separated list of fields; a
//! leading `-` marks a field as descending, e.g. `sort=-totalFiatValueLocked,id`.

use serde::{Deserialize, Serialize};

use crate::errors::SortError;

/// Maximum length of the sort query parameter.
pub const MAX_SORT_LENGTH: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A single sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered list of sort criteria; earlier fields take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortRequest {
    pub fields: Vec<SortField>,
}

impl SortRequest {
    /// Parses the raw `sort` query parameter value.
    pub fn parse(param: &str) -> Result<Self, SortError> {
        if param.is_empty() {
            return Ok(Self::default());
        }

        if param.len() > MAX_SORT_LENGTH {
            return Err(SortError::FieldTooLong {
                max: MAX_SORT_LENGTH,
            });
        }

        let fields = param
            .split(',')
            .map(|field| match field.strip_prefix('-') {
                Some(field) => SortField {
                    field: field.to_string(),
                    direction: SortDirection::Descending,
                },
                None => SortField {
                    field: field.to_string(),
                    direction: SortDirection::Ascending,
                },
            })
            .collect();

        Ok(Self { fields })
    }
}
