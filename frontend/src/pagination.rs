use serde::Serialize;

/// Page size every paginated endpoint is queried with.
pub const PAGE_SIZE: u32 = 10;

/// `ceil(results / PAGE_SIZE)`, never below one page.
pub fn total_pages(results: u64) -> u32 {
    let pages = results.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// One page of a collection as handed to the templates.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub previous: Option<u32>,
    pub next: Option<u32>,
}

impl Pagination {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        let current_page = clamp_page(current_page, total_pages);
        Self {
            current_page,
            total_pages,
            previous: (current_page > 1).then(|| current_page - 1),
            next: (current_page < total_pages).then(|| current_page + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up_and_never_drops_below_one() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(95), 10);
        assert_eq!(total_pages(100), 10);
    }

    #[test]
    fn current_page_is_clamped() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(2, 0), 1);
    }

    #[test]
    fn pager_links() {
        let first = Pagination::new(1, 3);
        assert_eq!(first.previous, None);
        assert_eq!(first.next, Some(2));

        let last = Pagination::new(9, 3);
        assert_eq!(last.current_page, 3);
        assert_eq!(last.previous, Some(2));
        assert_eq!(last.next, None);
    }
}
