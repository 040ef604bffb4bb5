//! Domain models for the backlog hierarchy.
//!
//! # Core Concepts
//!
//! The backlog is a three-level hierarchy of flat records joined by
//! foreign keys:
//!
//! - [`UserStory`]: Top-level backlog item, root of the hierarchy.
//! - [`Feature`]: Mid-level item grouped under exactly one story via
//!   `user_story_id`.
//! - [`Task`]: Leaf-level item grouped under exactly one feature via
//!   `feature_id`.
//!
//! Records are never created or deleted by this client; only `title` and
//! `description` are mutable, through the `Update*Input` partial-update
//! types. Sibling display order is decided by `order_index`, assigned by
//! the store and delivered pre-sorted.

mod feature;
mod story;
mod task;

pub use feature::*;
pub use story::*;
pub use task::*;
