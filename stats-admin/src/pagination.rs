//! List pagination (25 rows per page)

use serde::Serialize;

/// Rows per list page
pub const PAGE_SIZE: i64 = 25;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
    /// Rows per page
    pub page_size: i64,
    /// Total number of rows
    pub total: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Arguments
/// * `total_results` - Total number of rows in result set
/// * `requested_page` - Page number requested by user (may be out of bounds)
///
/// # Returns
/// Pagination metadata with sanitized page number and calculated offset
///
/// # Examples
/// ```
/// use stats_admin::pagination::calculate_pagination;
///
/// // 60 total results = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(60, 99);
/// assert_eq!(p.page, 3);  // Clamped to last page
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
        page_size: PAGE_SIZE,
        total: total_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(60, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 25);
        assert_eq!(p.total, 60);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(40, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(40, 99);
        assert_eq!(p.page, 2);  // Clamped to last page
        assert_eq!(p.offset, 25);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(40, -3);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(50, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 25);
    }

    #[test]
    fn test_offset_not_serialized() {
        let json = serde_json::to_value(calculate_pagination(60, 3)).unwrap();
        assert_eq!(json["page"], 3);
        assert!(json.get("offset").is_none());
    }
}
