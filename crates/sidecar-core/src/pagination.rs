//! Pagination request and response types
//!
//! Two strategies are supported: page-based (`page[number]` + `page[size]`)
//! and cursor-based (`page[cursor]` + `page[size]`). Cursor takes precedence
//! when both are present.

use serde::{Deserialize, Serialize};

use crate::errors::PaginationError;

/// Maximum allowed value for the page number. Prevents abuse; the number was
/// chosen arbitrarily.
pub const MAX_PAGE: u64 = 1_000_000;

/// Maximum allowed value for the page size. Prevents abuse; the number was
/// chosen arbitrarily.
pub const MAX_LIMIT: u64 = 1_000;

/// How a client addresses a page of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationStrategy {
    #[default]
    Unknown,
    Page,
    Cursor,
}

/// Decoded pagination parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationRequest {
    pub strategy: PaginationStrategy,
    pub page: u64,
    pub cursor: u64,
    pub limit: u64,
}

impl PaginationRequest {
    /// Builds the request from raw query parameter values. The strategy is
    /// inferred from which parameters are present; cursor wins over page.
    pub fn from_query_params(
        page: Option<&str>,
        limit: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Self, PaginationError> {
        let mut request = Self::default();

        if let Some(page) = page {
            request.page = page
                .parse()
                .map_err(|_| PaginationError::Parse(page.to_string()))?;
        }

        if let Some(limit) = limit {
            request.limit = limit
                .parse()
                .map_err(|_| PaginationError::Parse(limit.to_string()))?;
        }

        if let Some(cursor) = cursor {
            request.cursor = cursor
                .parse()
                .map_err(|_| PaginationError::Parse(cursor.to_string()))?;
        }

        request.strategy = if cursor.is_some() {
            PaginationStrategy::Cursor
        } else if page.is_some() {
            PaginationStrategy::Page
        } else {
            PaginationStrategy::Unknown
        };

        Ok(request)
    }

    /// Validates the request bounds and strategy.
    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.page == 0 && self.strategy == PaginationStrategy::Page {
            return Err(PaginationError::PageNotValid);
        }

        if self.page > MAX_PAGE {
            return Err(PaginationError::PageTooLarge { max: MAX_PAGE });
        }

        if self.limit == 0 {
            return Err(PaginationError::LimitNotValid);
        }

        if self.limit > MAX_LIMIT {
            return Err(PaginationError::LimitTooLarge { max: MAX_LIMIT });
        }

        if self.strategy == PaginationStrategy::Unknown {
            return Err(PaginationError::StrategyNotSupported);
        }

        Ok(())
    }

    /// Calculates the next cursor given the total number of items.
    /// Returns -1 when there is no next page.
    pub fn next_cursor(&self, total_items: u64) -> i64 {
        if self.cursor >= total_items {
            return -1; // cursor is out of range
        }

        let Some(end_index) = self.cursor.checked_add(self.limit) else {
            return -1; // overflow detected
        };

        if end_index >= total_items {
            return -1; // end index is out of range
        }

        end_index as i64
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResponse {
    pub total_items: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<i64>,
}

impl PaginationResponse {
    /// Builds the response; the next cursor is only populated for the cursor
    /// strategy.
    pub fn new(request: Option<&PaginationRequest>, total_items: u64) -> Self {
        let mut response = Self {
            total_items,
            next_cursor: None,
        };

        if let Some(request) = request {
            if request.strategy == PaginationStrategy::Cursor {
                response.next_cursor = Some(request.next_cursor(total_items));
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_request(cursor: u64, limit: u64) -> PaginationRequest {
        PaginationRequest {
            strategy: PaginationStrategy::Cursor,
            page: 0,
            cursor,
            limit,
        }
    }

    #[test]
    fn test_strategy_detection() {
        let page = PaginationRequest::from_query_params(Some("2"), Some("10"), None).unwrap();
        assert_eq!(page.strategy, PaginationStrategy::Page);

        // Cursor takes precedence over page.
        let cursor =
            PaginationRequest::from_query_params(Some("2"), Some("10"), Some("5")).unwrap();
        assert_eq!(cursor.strategy, PaginationStrategy::Cursor);

        let unknown = PaginationRequest::from_query_params(None, Some("10"), None).unwrap();
        assert_eq!(unknown.strategy, PaginationStrategy::Unknown);
    }

    #[test]
    fn test_validate_bounds() {
        let mut request = PaginationRequest {
            strategy: PaginationStrategy::Page,
            page: 0,
            cursor: 0,
            limit: 10,
        };
        assert_eq!(request.validate(), Err(PaginationError::PageNotValid));

        request.page = MAX_PAGE + 1;
        assert_eq!(
            request.validate(),
            Err(PaginationError::PageTooLarge { max: MAX_PAGE })
        );

        request.page = 1;
        request.limit = 0;
        assert_eq!(request.validate(), Err(PaginationError::LimitNotValid));

        request.limit = MAX_LIMIT + 1;
        assert_eq!(
            request.validate(),
            Err(PaginationError::LimitTooLarge { max: MAX_LIMIT })
        );

        request.limit = MAX_LIMIT;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_strategy() {
        let request = PaginationRequest {
            strategy: PaginationStrategy::Unknown,
            page: 1,
            cursor: 0,
            limit: 10,
        };
        assert_eq!(request.validate(), Err(PaginationError::StrategyNotSupported));
    }

    #[test]
    fn test_next_cursor() {
        // cursor + limit lands inside the result set
        assert_eq!(cursor_request(0, 2).next_cursor(5), 2);
        // cursor + limit reaches the end exactly
        assert_eq!(cursor_request(3, 2).next_cursor(5), -1);
        // cursor beyond total
        assert_eq!(cursor_request(10, 2).next_cursor(5), -1);
        // overflow guarded
        assert_eq!(cursor_request(u64::MAX, 2).next_cursor(5), -1);
    }

    #[test]
    fn test_pagination_response_only_for_cursor_strategy() {
        let page_request = PaginationRequest {
            strategy: PaginationStrategy::Page,
            page: 1,
            cursor: 0,
            limit: 2,
        };
        let response = PaginationResponse::new(Some(&page_request), 5);
        assert_eq!(response.next_cursor, None);

        let response = PaginationResponse::new(Some(&cursor_request(0, 2)), 5);
        assert_eq!(response.next_cursor, Some(2));
    }
}
