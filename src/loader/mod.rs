//! Loader Module
//!
//! Page-by-page accumulation of a list behind a `load_more` / `refresh`
//! contract, for infinite-scroll style consumers.

mod options;
mod paginated;
mod state;


pub use options::LoaderOptions;
pub use paginated::PaginatedLoader;
pub use state::{LoadOutcome, LoaderSnapshot, LoaderStatus};
