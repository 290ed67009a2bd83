//! Console rendering for work summaries and project listings.
//!
//! Everything here is pure string building; callers print the result.

pub mod projects;
pub mod summary;
pub mod table;

pub use projects::render_projects;
pub use summary::{render_day, render_range};
pub use table::Table;
