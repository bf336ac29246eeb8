//! Paginated Loader
//!
//! Drives a [`PageFetcher`] one page at a time and accumulates the results.
//!
//! # Concurrency
//! The state lock is never held across a fetch. `is_loading` is the
//! single-flight guard: a `load_more` issued while a fetch is in flight is a
//! no-op. Each fetch carries the generation it started in; `refresh` and
//! `dispose` bump the generation, so a result that settles afterwards is
//! dropped instead of being applied.
//!
//! A `load_more` or `refresh` future may be dropped mid-fetch (a timeout,
//! an aborted task, a disconnected HTTP client). The loading marker is
//! released on drop so the loader does not stay busy forever.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::loader::state::{LoaderState, Ticket};
use crate::loader::{LoadOutcome, LoaderOptions, LoaderSnapshot, LoaderStatus};

// == Paginated Loader ==
pub struct PaginatedLoader<T> {
    fetcher: Arc<dyn PageFetcher<T>>,
    options: LoaderOptions,
    state: Mutex<LoaderState<T>>,
}

impl<T> PaginatedLoader<T>
where
    T: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates an idle loader. Nothing is fetched until the first
    /// [`load_more`](Self::load_more).
    pub fn new(fetcher: impl PageFetcher<T> + 'static, options: LoaderOptions) -> Self {
        Self::from_arc(Arc::new(fetcher), options)
    }

    /// Creates a loader over an already shared fetcher.
    pub fn from_arc(fetcher: Arc<dyn PageFetcher<T>>, options: LoaderOptions) -> Self {
        Self {
            fetcher,
            state: Mutex::new(LoaderState::new(options.initial_page)),
            options,
        }
    }

    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    // == Load More ==
    /// Fetches the page at the cursor and applies it.
    ///
    /// Does nothing while another fetch is in flight, once the last page has
    /// been seen, or after [`dispose`](Self::dispose). A failure is stored as
    /// the loader's last error; the cursor stays put so calling this again
    /// retries the same page.
    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            match state.begin_load() {
                Some(ticket) => ticket,
                None => return LoadOutcome::Skipped,
            }
        };

        self.run(ticket).await
    }

    // == Refresh ==
    /// Drops everything loaded so far and fetches the first page again.
    ///
    /// A refresh that arrives while another refresh is in flight joins it
    /// and returns [`LoadOutcome::Skipped`]. A refresh that arrives during a
    /// plain `load_more` supersedes it; that older result is discarded.
    pub async fn refresh(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            if state.disposed || state.refreshing {
                return LoadOutcome::Skipped;
            }

            state.reset(self.options.initial_page);
            state.refreshing = true;
            match state.begin_load() {
                Some(ticket) => ticket,
                None => return LoadOutcome::Skipped,
            }
        };

        info!(page = ticket.page, "refreshing paginated list");
        self.run(ticket).await
    }

    // == Dispose ==
    /// Tears the loader down. In-flight results are dropped and every later
    /// call is a no-op.
    pub async fn dispose(&self) {
        let mut state = self.lock();
        if !state.disposed {
            state.dispose();
            debug!("paginated loader disposed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState<T>> {
        lock_state(&self.state)
    }

    async fn run(&self, ticket: Ticket) -> LoadOutcome {
        debug!(page = ticket.page, generation = ticket.generation, "fetching page");
        let in_flight = InFlight {
            state: &self.state,
            ticket,
            settled: false,
        };
        let result: Result<Vec<T>, FetchError> = self.fetcher.fetch_page(ticket.page).await;

        let mut state = self.lock();
        let outcome = state.apply(ticket, result, self.options.page_size);
        in_flight.settle();

        match &outcome {
            LoadOutcome::Loaded { page, count } => {
                info!(
                    page,
                    count,
                    total = state.items.len(),
                    has_more = state.has_more,
                    "page loaded"
                );
            }
            LoadOutcome::Exhausted { page } => info!(page, "empty page, end of list"),
            LoadOutcome::Failed { page, error } => {
                warn!(page, error = %error, "page fetch failed");
            }
            LoadOutcome::Discarded { page } => {
                debug!(page, "dropping result from a superseded fetch");
            }
            LoadOutcome::Skipped => {}
        }

        outcome
    }

    // == Observers ==
    pub async fn snapshot(&self) -> LoaderSnapshot<T> {
        self.lock().snapshot()
    }

    pub async fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub async fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub async fn last_error(&self) -> Option<FetchError> {
        self.lock().last_error.clone()
    }

    pub async fn page_cursor(&self) -> u32 {
        self.lock().page_cursor
    }

    pub async fn status(&self) -> LoaderStatus {
        self.lock().status()
    }
}

// State is only ever mutated in short synchronous sections, so a poisoned
// lock still holds a consistent value.
fn lock_state<T>(state: &Mutex<LoaderState<T>>) -> MutexGuard<'_, LoaderState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// == In-Flight Guard ==
/// Releases the loading marker of a fetch whose future is dropped before
/// its result is applied.
struct InFlight<'a, T> {
    state: &'a Mutex<LoaderState<T>>,
    ticket: Ticket,
    settled: bool,
}

impl<T> InFlight<'_, T> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if lock_state(self.state).abandon(self.ticket) {
            debug!(page = self.ticket.page, "fetch abandoned before it settled");
        }
    }
}
