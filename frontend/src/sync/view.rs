use serde::Serialize;

use crate::pagination::{Pagination, clamp_page, total_pages};
use crate::sync::cache::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Ready,
    Error(String),
}

/// Issued by [`CollectionView::request_page`]; only the latest ticket may
/// change the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    page: u32,
}

impl LoadTicket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Page state of one entity list.
#[derive(Debug, Clone)]
pub struct CollectionView<T> {
    items: Vec<T>,
    current_page: u32,
    total_pages: u32,
    state: LoadState,
    generation: u64,
}

impl<T> Default for CollectionView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            state: LoadState::Loading,
            generation: 0,
        }
    }
}

impl<T: Clone> CollectionView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_page(&mut self, page: u32) -> LoadTicket {
        self.generation += 1;
        self.current_page = page.max(1);
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.generation,
            page: self.current_page,
        }
    }

    /// Returns `false` when the ticket was superseded and the outcome ignored.
    ///
    /// A listing for a page past the end clamps `current_page` and leaves
    /// the view `Loading` with no rows; see [`CollectionView::needs_reload`].
    pub fn apply(&mut self, ticket: LoadTicket, outcome: &Snapshot<T>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        if let Some(listing) = &outcome.listing {
            self.total_pages = total_pages(listing.total());
            self.current_page = clamp_page(ticket.page, self.total_pages);
            if self.current_page != ticket.page {
                self.items.clear();
                self.state = LoadState::Loading;
                return true;
            }
            self.items = listing.items.clone();
        }
        self.state = match &outcome.error {
            Some(error) => LoadState::Error(error.user_message()),
            None => LoadState::Ready,
        };
        true
    }

    /// The requested page was out of range; `current_page` must be fetched.
    pub fn needs_reload(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.current_page, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::Listing;

    fn ok(items: &[u32], results: u64) -> Snapshot<u32> {
        Ok(Listing::new(items.to_vec(), Some(results))).into()
    }

    #[test]
    fn ready_recomputes_pages() {
        let mut view = CollectionView::new();
        let ticket = view.request_page(2);
        assert_eq!(view.state(), &LoadState::Loading);

        assert!(view.apply(ticket, &ok(&[1, 2], 25)));
        assert_eq!(view.state(), &LoadState::Ready);
        assert_eq!(view.total_pages(), 3);
        assert_eq!(view.current_page(), 2);
        assert_eq!(view.items(), &[1, 2]);
    }

    #[test]
    fn page_past_the_end_clamps_and_asks_for_the_last_page() {
        let mut view = CollectionView::new();
        let first = view.request_page(1);
        view.apply(first, &ok(&[1], 25));

        let ticket = view.request_page(9);
        assert!(view.apply(ticket, &ok(&[], 25)));
        assert!(view.needs_reload());
        assert_eq!(view.current_page(), 3);
        assert!(view.items().is_empty());

        let last = view.request_page(view.current_page());
        view.apply(last, &ok(&[21, 22], 25));
        assert!(!view.needs_reload());
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.items(), &[21, 22]);
    }

    #[test]
    fn empty_collection_still_has_one_page() {
        let mut view = CollectionView::<u32>::new();
        let ticket = view.request_page(1);
        view.apply(ticket, &ok(&[], 0));
        assert_eq!(view.total_pages(), 1);
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn failure_keeps_existing_rows() {
        let mut view = CollectionView::new();
        let first = view.request_page(1);
        view.apply(first, &ok(&[7, 8], 2));

        let retry = view.request_page(1);
        let failed: Snapshot<u32> = Err(ApiError::Transport("reset".to_string())).into();
        assert!(view.apply(retry, &failed));
        assert_eq!(view.items(), &[7, 8]);
        assert!(view.error().is_some());
    }

    #[test]
    fn superseded_ticket_is_ignored() {
        let mut view = CollectionView::new();
        let page_two = view.request_page(2);
        let page_three = view.request_page(3);

        assert!(view.apply(page_three, &ok(&[3], 30)));
        assert!(!view.apply(page_two, &ok(&[2], 30)));
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.items(), &[3]);
    }
}
