use serde::{Deserialize, Serialize};

/// Which of the three backlog entity kinds a UI item refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Story,
    Feature,
    Task,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Feature => "feature",
            Self::Task => "task",
        }
    }
}

/// The editable field currently receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Description,
}

/// Transient, uncommitted copy of an item's editable fields.
///
/// Seeded from the committed record when editing begins, discarded on
/// cancel, and reconciled into the owning flat set only after the store
/// confirms the update.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub title: String,
    pub description: String,
    pub field: EditField,
}

impl EditBuffer {
    pub fn seed(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            field: EditField::Title,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            EditField::Title => &mut self.title,
            EditField::Description => &mut self.description,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.active_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_mut().pop();
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            EditField::Title => EditField::Description,
            EditField::Description => EditField::Title,
        };
    }
}

/// Per-item interaction state, independent for every entity instance.
///
/// Transitions:
/// - `Viewing → Editing`: user action, seeds the buffer from the record.
/// - `Editing → Viewing`: cancel, buffer dropped, no network call.
/// - `Editing → Saving`: save action, update request in flight.
/// - `Saving → Viewing`: store confirmed, committed record patched.
/// - `Saving → Editing`: store rejected, buffer kept so nothing typed is
///   lost. There is no silent fall-back to `Viewing` on failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemState {
    #[default]
    Viewing,
    Editing(EditBuffer),
    Saving(EditBuffer),
}

impl ItemState {
    pub fn is_viewing(&self) -> bool {
        matches!(self, Self::Viewing)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving(_))
    }

    /// The edit buffer, if one exists (`Editing` or `Saving`).
    pub fn buffer(&self) -> Option<&EditBuffer> {
        match self {
            Self::Viewing => None,
            Self::Editing(buf) | Self::Saving(buf) => Some(buf),
        }
    }
}
