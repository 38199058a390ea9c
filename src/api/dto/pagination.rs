//! Pagination query parameters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
/// Range checks happen in the service.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Page number, defaulting to 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Page size, defaulting to [`DEFAULT_PAGE_SIZE`].
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Pagination metadata echoed back with list responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_parses_numeric_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": "3", "page_size": "50"}"#).unwrap();
        assert_eq!(params.page(), 3);
        assert_eq!(params.page_size(), 50);
    }

    #[test]
    fn test_rejects_non_numeric_page() {
        assert!(serde_json::from_str::<PaginationParams>(r#"{"page": "first"}"#).is_err());
    }
}
