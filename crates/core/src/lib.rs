//! Pure domain logic for the folio wiki client.
//!
//! Nothing in this crate performs I/O: the markup compiler, diff engine,
//! revision history model and authorization rules are plain functions over
//! plain data so they can be shared by the store, tests and any tooling.

pub mod diff;
pub mod error;
pub mod history;
pub mod markup;
pub mod roles;
pub mod search;
pub mod types;
pub mod wiki;
