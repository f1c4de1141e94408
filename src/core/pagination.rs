// Page arithmetic for the paginated list views.
//
// Kept out of the Discord layer so the clamping rules can be tested without
// a gateway connection.

/// The visible slice of a paginated list. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub total_pages: usize,
    pub per_page: usize,
}

impl PageWindow {
    /// Build a window for `total_items`, clamping `requested` into range.
    /// An empty list still has one (empty) page.
    pub fn new(total_items: usize, per_page: usize, requested: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page).max(1);
        Self {
            page: requested.clamp(1, total_pages),
            total_pages,
            per_page,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn prev(self) -> Self {
        Self {
            page: self.page.saturating_sub(1).max(1),
            ..self
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: (self.page + 1).min(self.total_pages),
            ..self
        }
    }

    /// The items of `all` that fall on this page.
    pub fn slice<'a, T>(&self, all: &'a [T]) -> &'a [T] {
        let start = self.offset().min(all.len());
        let end = (start + self.per_page).min(all.len());
        &all[start..end]
    }
}

/// Split `items` into chunks of `per_page`, always yielding at least one page.
pub fn chunk_pages<T: Clone>(items: &[T], per_page: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    items.chunks(per_page.max(1)).map(|c| c.to_vec()).collect()
}
