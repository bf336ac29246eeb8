//! Loader state and its transitions.
//!
//! Everything here is synchronous; the async loader takes the lock, calls
//! into these transitions, and releases the lock before awaiting a fetch.

use std::fmt;

use crate::error::FetchError;

// == Status ==
/// Coarse state of a loader, as a consumer would render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderStatus {
    /// Nothing in flight. `has_more: false` is stable until a refresh.
    Idle { has_more: bool },
    /// Exactly one fetch in flight
    Loading,
    /// The last attempt failed; `load_more` retries the same page
    Failed,
    /// Torn down; every operation is a no-op
    Disposed,
}

impl LoaderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderStatus::Idle { has_more: true } => "idle",
            LoaderStatus::Idle { has_more: false } => "exhausted",
            LoaderStatus::Loading => "loading",
            LoaderStatus::Failed => "failed",
            LoaderStatus::Disposed => "disposed",
        }
    }
}

impl fmt::Display for LoaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Outcome ==
/// What a single `load_more` or `refresh` call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A non-empty page was applied
    Loaded { page: u32, count: usize },
    /// The page came back empty; no more pages will be requested
    Exhausted { page: u32 },
    /// The fetch failed and was recorded as the loader's last error
    Failed { page: u32, error: FetchError },
    /// Nothing was requested (already loading, no more pages, or disposed)
    Skipped,
    /// The fetch settled after a refresh or dispose and was dropped
    Discarded { page: u32 },
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Loaded { .. } => "loaded",
            LoadOutcome::Exhausted { .. } => "exhausted",
            LoadOutcome::Failed { .. } => "failed",
            LoadOutcome::Skipped => "skipped",
            LoadOutcome::Discarded { .. } => "discarded",
        }
    }
}

// == Snapshot ==
/// Point-in-time copy of everything a consumer reads from a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSnapshot<T> {
    pub items: Vec<T>,
    pub page_cursor: u32,
    pub is_loading: bool,
    pub has_more: bool,
    pub last_error: Option<FetchError>,
    pub status: LoaderStatus,
}

/// A fetch that has been started, tagged with the generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub page: u32,
    pub generation: u64,
}

// == Loader State ==
#[derive(Debug)]
pub(crate) struct LoaderState<T> {
    pub items: Vec<T>,
    pub page_cursor: u32,
    pub is_loading: bool,
    pub has_more: bool,
    pub last_error: Option<FetchError>,
    /// Bumped by reset and dispose; results from older generations are dropped
    pub generation: u64,
    /// Next applied page is the first since construction or reset
    pub replace_next: bool,
    /// The in-flight fetch was started by a refresh
    pub refreshing: bool,
    pub disposed: bool,
}

impl<T> LoaderState<T> {
    pub fn new(initial_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page_cursor: initial_page,
            is_loading: false,
            has_more: true,
            last_error: None,
            generation: 0,
            replace_next: true,
            refreshing: false,
            disposed: false,
        }
    }

    pub fn status(&self) -> LoaderStatus {
        if self.disposed {
            LoaderStatus::Disposed
        } else if self.is_loading {
            LoaderStatus::Loading
        } else if self.last_error.is_some() {
            LoaderStatus::Failed
        } else {
            LoaderStatus::Idle {
                has_more: self.has_more,
            }
        }
    }

    /// Marks a fetch of the current cursor as in flight.
    ///
    /// Returns `None` when the loader must not fetch right now.
    pub fn begin_load(&mut self) -> Option<Ticket> {
        if self.disposed || self.is_loading || !self.has_more {
            return None;
        }

        self.is_loading = true;
        self.last_error = None;
        Some(Ticket {
            page: self.page_cursor,
            generation: self.generation,
        })
    }

    /// Returns to the pristine state and invalidates any in-flight fetch.
    pub fn reset(&mut self, initial_page: u32) {
        self.items.clear();
        self.page_cursor = initial_page;
        self.is_loading = false;
        self.has_more = true;
        self.last_error = None;
        self.replace_next = true;
        self.refreshing = false;
        self.generation += 1;
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.is_loading = false;
        self.refreshing = false;
        self.generation += 1;
    }

    /// Releases the loading marker of a fetch that will never settle.
    ///
    /// Only the current generation's fetch holds the marker; anything older
    /// was already superseded. Returns whether the marker was released.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if ticket.generation != self.generation || !self.is_loading {
            return false;
        }

        self.is_loading = false;
        self.refreshing = false;
        true
    }

    /// Applies the settled fetch for `ticket`.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<T>, FetchError>,
        page_size: usize,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            return LoadOutcome::Discarded { page: ticket.page };
        }

        self.is_loading = false;
        self.refreshing = false;

        match result {
            Ok(page) if page.is_empty() => {
                self.has_more = false;
                LoadOutcome::Exhausted { page: ticket.page }
            }
            Ok(page) => {
                let count = page.len();
                if self.replace_next {
                    self.items = page;
                    self.replace_next = false;
                } else {
                    self.items.extend(page);
                }
                // Short page heuristic: fewer than a full page means the end
                self.has_more = count >= page_size;
                self.page_cursor += 1;
                LoadOutcome::Loaded {
                    page: ticket.page,
                    count,
                }
            }
            Err(error) => {
                self.last_error = Some(error.clone());
                LoadOutcome::Failed {
                    page: ticket.page,
                    error,
                }
            }
        }
    }
}

impl<T: Clone> LoaderState<T> {
    pub fn snapshot(&self) -> LoaderSnapshot<T> {
        LoaderSnapshot {
            items: self.items.clone(),
            page_cursor: self.page_cursor,
            is_loading: self.is_loading,
            has_more: self.has_more,
            last_error: self.last_error.clone(),
            status: self.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(items: &[u32]) -> Result<Vec<u32>, FetchError> {
        Ok(items.to_vec())
    }

    #[test]
    fn test_new_state_is_idle_with_more() {
        let state: LoaderState<u32> = LoaderState::new(1);

        assert_eq!(state.status(), LoaderStatus::Idle { has_more: true });
        assert_eq!(state.page_cursor, 1);
        assert!(state.replace_next);
    }

    #[test]
    fn test_begin_load_guards() {
        let mut state: LoaderState<u32> = LoaderState::new(1);

        let ticket = state.begin_load().unwrap();
        assert_eq!(ticket, Ticket { page: 1, generation: 0 });
        assert_eq!(state.status(), LoaderStatus::Loading);
        assert_eq!(state.begin_load(), None, "second load while loading");

        state.apply(ticket, ok(&[]), 2);
        assert_eq!(state.begin_load(), None, "no more pages");

        state.dispose();
        state.reset(1);
        assert_eq!(state.begin_load(), None, "disposed");
    }

    #[test]
    fn test_full_page_appends_and_advances() {
        let mut state = LoaderState::new(1);

        let t1 = state.begin_load().unwrap();
        state.apply(t1, ok(&[1, 2]), 2);
        let t2 = state.begin_load().unwrap();
        let outcome = state.apply(t2, ok(&[3, 4]), 2);

        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, count: 2 });
        assert_eq!(state.items, vec![1, 2, 3, 4]);
        assert_eq!(state.page_cursor, 3);
        assert!(state.has_more);
    }

    #[test]
    fn test_short_page_ends_pagination() {
        let mut state = LoaderState::new(1);

        let ticket = state.begin_load().unwrap();
        state.apply(ticket, ok(&[1]), 2);

        assert!(!state.has_more);
        assert_eq!(state.page_cursor, 2);
        assert_eq!(state.status(), LoaderStatus::Idle { has_more: false });
    }

    #[test]
    fn test_empty_page_leaves_items_and_cursor() {
        let mut state = LoaderState::new(1);
        let t1 = state.begin_load().unwrap();
        state.apply(t1, ok(&[1, 2]), 2);

        let t2 = state.begin_load().unwrap();
        let outcome = state.apply(t2, ok(&[]), 2);

        assert_eq!(outcome, LoadOutcome::Exhausted { page: 2 });
        assert_eq!(state.items, vec![1, 2]);
        assert_eq!(state.page_cursor, 2);
        assert!(!state.has_more);
    }

    #[test]
    fn test_failure_keeps_everything_but_error() {
        let mut state = LoaderState::new(1);
        let t1 = state.begin_load().unwrap();
        state.apply(t1, ok(&[1, 2]), 2);

        let t2 = state.begin_load().unwrap();
        let outcome = state.apply(t2, Err(FetchError::network("network error")), 2);

        assert!(matches!(outcome, LoadOutcome::Failed { page: 2, .. }));
        assert_eq!(state.items, vec![1, 2]);
        assert_eq!(state.page_cursor, 2);
        assert!(state.has_more);
        assert_eq!(state.status(), LoaderStatus::Failed);

        let retry = state.begin_load().unwrap();
        assert_eq!(retry.page, 2);
        assert_eq!(state.last_error, None, "cleared when the retry starts");
    }

    #[test]
    fn test_first_page_after_reset_replaces() {
        let mut state = LoaderState::new(1);
        let t1 = state.begin_load().unwrap();
        state.apply(t1, ok(&[1, 2]), 2);

        state.reset(1);
        state.items = vec![99];
        let t2 = state.begin_load().unwrap();
        state.apply(t2, ok(&[5, 6]), 2);

        assert_eq!(state.items, vec![5, 6]);
        assert!(!state.replace_next);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut state = LoaderState::new(1);
        let stale = state.begin_load().unwrap();

        state.reset(1);
        let fresh = state.begin_load().unwrap();

        let outcome = state.apply(stale, ok(&[7, 7]), 2);
        assert_eq!(outcome, LoadOutcome::Discarded { page: 1 });
        assert!(state.is_loading, "stale result must not end the fresh fetch");
        assert!(state.items.is_empty());

        state.apply(fresh, ok(&[1, 2]), 2);
        assert_eq!(state.items, vec![1, 2]);
    }

    #[test]
    fn test_dispose_discards_in_flight() {
        let mut state = LoaderState::new(1);
        let ticket = state.begin_load().unwrap();

        state.dispose();
        let outcome = state.apply(ticket, ok(&[1, 2]), 2);

        assert_eq!(outcome, LoadOutcome::Discarded { page: 1 });
        assert!(state.items.is_empty());
        assert_eq!(state.status(), LoaderStatus::Disposed);
    }

    #[test]
    fn test_abandon_releases_current_fetch_only() {
        let mut state: LoaderState<u32> = LoaderState::new(1);
        let stale = state.begin_load().unwrap();

        state.reset(1);
        state.refreshing = true;
        let current = state.begin_load().unwrap();

        assert!(!state.abandon(stale), "older generation is ignored");
        assert!(state.is_loading);

        assert!(state.abandon(current));
        assert!(!state.is_loading);
        assert!(!state.refreshing);
        assert_eq!(state.status(), LoaderStatus::Idle { has_more: true });
        assert_eq!(state.begin_load().map(|t| t.page), Some(1));
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let mut state = LoaderState::new(3);
        let ticket = state.begin_load().unwrap();
        state.apply(ticket, ok(&[1]), 5);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.items, vec![1]);
        assert_eq!(snapshot.page_cursor, 4);
        assert!(!snapshot.is_loading);
        assert!(!snapshot.has_more);
        assert_eq!(snapshot.status.as_str(), "exhausted");
    }
}
