//! Terminal backlog browser over a hosted Postgres backlog.
//!
//! The backlog is a three-level hierarchy (User Story → Feature → Task)
//! stored as three flat tables in a remote store. This crate fetches the
//! flat sets, derives the tree by foreign-key grouping, and provides an
//! interactive view with inline editing of titles and descriptions. All
//! edits are optimistic-local: a record is patched in place only after the
//! store confirms the update.

pub mod app;
pub mod client;
pub mod models;
pub mod tree;
pub mod tui;
