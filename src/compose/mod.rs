//! Model compose page
//!
//! Lists the account's custom models with column sorting, and merges a
//! selection of them into a composed model.

mod controller;
mod sort;

pub use controller::{ComposeController, ComposeView};
pub use sort::{copy_and_sort, ColumnState, ModelColumn, SortState};
