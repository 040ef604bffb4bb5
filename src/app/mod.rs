//! Presentation state for the interactive backlog view.
//!
//! [`App`] owns the authoritative copies of the three flat record sets
//! plus purely local UI state: which stories/features are expanded, which
//! items are mid-edit, and the cursor. The tree shape is never stored; it
//! is re-derived from the flat sets through [`crate::tree::build_tree`]
//! whenever rows are needed.
//!
//! Everything here is synchronous. Network effects are described by the
//! [`SaveRequest`] values returned from [`App::start_save`]; the terminal
//! front end executes them and reports back through
//! [`App::save_succeeded`] / [`App::save_failed`].

mod item;

pub use item::*;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::Snapshot;
use crate::models::{Feature, Task, UserStory};
use crate::tree::{self, StoryNode};

/// One visible line of the hierarchy, derived from tree + expansion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub kind: ItemKind,
    pub id: Uuid,
    pub depth: usize,
}

/// An update the front end must send to the store: the changed-field set
/// for a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub kind: ItemKind,
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Interactive state over one loaded snapshot.
pub struct App {
    stories: Vec<UserStory>,
    features: Vec<Feature>,
    tasks: Vec<Task>,
    expanded: HashSet<Uuid>,
    states: HashMap<Uuid, ItemState>,
    cursor: usize,
    status: Option<String>,
}

impl App {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            stories: snapshot.stories,
            features: snapshot.features,
            tasks: snapshot.tasks,
            expanded: HashSet::new(),
            states: HashMap::new(),
            cursor: 0,
            status: None,
        }
    }

    // ============================================================
    // Derived views
    // ============================================================

    /// Re-derive the grouped tree from the current flat sets.
    pub fn build_tree(&self) -> Vec<StoryNode> {
        tree::build_tree(&self.stories, &self.features, &self.tasks)
    }

    /// The rows currently visible, honoring per-item expansion.
    /// Stories are always visible; features and tasks only under an
    /// expanded ancestor.
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for story_node in self.build_tree() {
            let story_id = story_node.story.id;
            rows.push(Row {
                kind: ItemKind::Story,
                id: story_id,
                depth: 0,
            });
            if !self.is_expanded(story_id) {
                continue;
            }
            for feature_node in &story_node.features {
                let feature_id = feature_node.feature.id;
                rows.push(Row {
                    kind: ItemKind::Feature,
                    id: feature_id,
                    depth: 1,
                });
                if !self.is_expanded(feature_id) {
                    continue;
                }
                for task in &feature_node.tasks {
                    rows.push(Row {
                        kind: ItemKind::Task,
                        id: task.id,
                        depth: 2,
                    });
                }
            }
        }
        rows
    }

    pub fn story(&self, id: Uuid) -> Option<&UserStory> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn feature(&self, id: Uuid) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Committed (title, description, updated_at) for any item.
    fn committed(&self, kind: ItemKind, id: Uuid) -> Option<(&str, &str, DateTime<Utc>)> {
        match kind {
            ItemKind::Story => self
                .story(id)
                .map(|s| (s.title.as_str(), s.description.as_str(), s.updated_at)),
            ItemKind::Feature => self
                .feature(id)
                .map(|f| (f.title.as_str(), f.description.as_str(), f.updated_at)),
            ItemKind::Task => self
                .task(id)
                .map(|t| (t.title.as_str(), t.description.as_str(), t.updated_at)),
        }
    }

    pub fn state(&self, id: Uuid) -> &ItemState {
        static VIEWING: ItemState = ItemState::Viewing;
        self.states.get(&id).unwrap_or(&VIEWING)
    }

    pub fn is_expanded(&self, id: Uuid) -> bool {
        self.expanded.contains(&id)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // ============================================================
    // Cursor
    // ============================================================

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<Row> {
        self.visible_rows().get(self.cursor).copied()
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Collapsing can shrink the visible list; keep the cursor in range.
    fn clamp_cursor(&mut self) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    // ============================================================
    // Expand/collapse
    // ============================================================

    /// Toggle expansion for a story or feature. Tasks have no children,
    /// so toggling them is a no-op.
    pub fn toggle_expanded(&mut self, kind: ItemKind, id: Uuid) {
        if kind == ItemKind::Task {
            return;
        }
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.clamp_cursor();
    }

    // ============================================================
    // Edit lifecycle
    // ============================================================

    /// `Viewing → Editing`: seed an edit buffer from the committed record.
    /// Ignored unless the item is currently `Viewing`.
    pub fn begin_edit(&mut self, kind: ItemKind, id: Uuid) {
        if !self.state(id).is_viewing() {
            return;
        }
        let Some((title, description, _)) = self.committed(kind, id) else {
            return;
        };
        let buffer = EditBuffer::seed(title, description);
        self.states.insert(id, ItemState::Editing(buffer));
        self.status = None;
    }

    /// `Editing → Viewing`: drop the buffer, committed record unchanged.
    /// A `Saving` item cannot cancel; the in-flight request runs to
    /// completion.
    pub fn cancel_edit(&mut self, id: Uuid) {
        if self.state(id).is_editing() {
            self.states.remove(&id);
        }
    }

    /// Route a keystroke into an item's edit buffer. No-op unless Editing.
    pub fn insert_char(&mut self, id: Uuid, c: char) {
        if let Some(ItemState::Editing(buf)) = self.states.get_mut(&id) {
            buf.insert_char(c);
        }
    }

    pub fn backspace(&mut self, id: Uuid) {
        if let Some(ItemState::Editing(buf)) = self.states.get_mut(&id) {
            buf.backspace();
        }
    }

    pub fn switch_field(&mut self, id: Uuid) {
        if let Some(ItemState::Editing(buf)) = self.states.get_mut(&id) {
            buf.switch_field();
        }
    }

    /// `Editing → Saving`: compute the changed-field set and hand it to
    /// the caller to execute against the store.
    ///
    /// Returns `None` when nothing changed (the item simply returns to
    /// `Viewing`, matching a cancel) or when the item was not `Editing`.
    pub fn start_save(&mut self, kind: ItemKind, id: Uuid) -> Option<SaveRequest> {
        if !self.state(id).is_editing() {
            return None;
        }
        let (committed_title, committed_description, _) = self.committed(kind, id)?;
        let committed_title = committed_title.to_string();
        let committed_description = committed_description.to_string();

        let Some(ItemState::Editing(buffer)) = self.states.remove(&id) else {
            return None;
        };

        let title = (buffer.title != committed_title).then(|| buffer.title.clone());
        let description =
            (buffer.description != committed_description).then(|| buffer.description.clone());

        if title.is_none() && description.is_none() {
            // Nothing to send; back to Viewing without a request.
            return None;
        }

        self.states.insert(id, ItemState::Saving(buffer));
        Some(SaveRequest {
            kind,
            id,
            title,
            description,
        })
    }

    /// `Saving → Viewing`: patch the committed record in place with
    /// exactly the submitted fields plus the store's timestamp, then drop
    /// the buffer. No other record is touched.
    pub fn save_succeeded(&mut self, request: &SaveRequest, stamp: DateTime<Utc>) {
        match request.kind {
            ItemKind::Story => {
                if let Some(story) = self.stories.iter_mut().find(|s| s.id == request.id) {
                    if let Some(ref title) = request.title {
                        story.title = title.clone();
                    }
                    if let Some(ref description) = request.description {
                        story.description = description.clone();
                    }
                    story.updated_at = stamp;
                }
            }
            ItemKind::Feature => {
                if let Some(feature) = self.features.iter_mut().find(|f| f.id == request.id) {
                    if let Some(ref title) = request.title {
                        feature.title = title.clone();
                    }
                    if let Some(ref description) = request.description {
                        feature.description = description.clone();
                    }
                    feature.updated_at = stamp;
                }
            }
            ItemKind::Task => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == request.id) {
                    if let Some(ref title) = request.title {
                        task.title = title.clone();
                    }
                    if let Some(ref description) = request.description {
                        task.description = description.clone();
                    }
                    task.updated_at = stamp;
                }
            }
        }
        self.states.remove(&request.id);
        self.status = None;
    }

    /// `Saving → Editing`: the store rejected the update. The committed
    /// record is left untouched and the buffer is kept so the user can
    /// re-attempt or cancel.
    pub fn save_failed(&mut self, id: Uuid, message: &str) {
        tracing::warn!(item = %id, error = message, "update rejected by store");
        if let Some(ItemState::Saving(buffer)) = self.states.remove(&id) {
            self.states.insert(id, ItemState::Editing(buffer));
        }
        self.status = Some(format!("Save failed: {message}"));
    }
}
