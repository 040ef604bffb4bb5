use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A top-level backlog item, root of the Story → Feature → Task hierarchy.
///
/// Stories are flat records; the tree shape is derived at render time by
/// matching each [`crate::models::Feature`]'s `user_story_id` against
/// story ids. The store delivers stories already sorted by `order_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for updating a story. All fields are optional for partial updates;
/// only `title` and `description` are editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStoryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
