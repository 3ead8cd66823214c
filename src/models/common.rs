use serde::{Deserialize, Serialize};

/// Generic API response wrapper used across all handlers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with a machine readable error code
    pub fn error_with_message(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }

    /// Rejection that still carries data, e.g. the prediction that blocked a new one
    pub fn rejected_with(message: impl Into<String>, error: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
            error: Some(error.into()),
        }
    }
}

/// Page number based pagination, `page` starts at 1
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaginationInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PaginationInfo {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page,
            per_page,
            total,
            has_prev: page > 1,
            has_next: page.saturating_mul(per_page) < total,
        }
    }

    /// Rows to skip for `page`, `None` when the page is too large to address
    pub fn offset(page: i64, per_page: i64) -> Option<i64> {
        (page.max(1) - 1).checked_mul(per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_flags() {
        let first = PaginationInfo::new(1, 50, 120);
        assert!(!first.has_prev);
        assert!(first.has_next);

        let last = PaginationInfo::new(3, 50, 120);
        assert!(last.has_prev);
        assert!(!last.has_next);

        assert_eq!(PaginationInfo::offset(3, 50), Some(100));
        assert_eq!(PaginationInfo::offset(0, 50), Some(0));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        assert_eq!(PaginationInfo::offset(i64::MAX, 50), None);

        let beyond = PaginationInfo::new(i64::MAX, 50, 120);
        assert!(beyond.has_prev);
        assert!(!beyond.has_next);
    }
}
