//! Loader construction options.

/// Default number of items a full page holds.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default number of the first page.
pub const DEFAULT_INITIAL_PAGE: u32 = 1;

/// Options recognized by [`PaginatedLoader`](super::PaginatedLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Items in a full page. A shorter page is taken to be the last one.
    pub page_size: usize,
    /// Page requested first, and again after every refresh
    pub initial_page: u32,
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the full-page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_initial_page(mut self, initial_page: u32) -> Self {
        self.initial_page = initial_page;
        self
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            initial_page: DEFAULT_INITIAL_PAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoaderOptions::default();
        assert_eq!(options.page_size, 10);
        assert_eq!(options.initial_page, 1);
    }

    #[test]
    fn test_builder() {
        let options = LoaderOptions::new().with_page_size(4).with_initial_page(0);
        assert_eq!(options.page_size, 4);
        assert_eq!(options.initial_page, 0);
    }

    #[test]
    fn test_zero_page_size_is_raised() {
        assert_eq!(LoaderOptions::new().with_page_size(0).page_size, 1);
    }
}
