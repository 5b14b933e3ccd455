use serde::{Deserialize, Serialize};

/// At most one pending edit per list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EditState<D> {
    Idle,
    Editing { id: String, original: D, draft: D },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginEdit {
    Started,
    Resumed,
    /// Another row holds unsaved changes; nothing was replaced.
    Conflict { pending_id: String },
}

impl<D> Default for EditState<D> {
    fn default() -> Self {
        EditState::Idle
    }
}

impl<D: Clone + PartialEq> EditState<D> {
    /// Opens `id` for editing. Switching away from a row with unsaved changes
    /// requires `discard_pending`.
    pub fn begin(&mut self, id: &str, current: D, discard_pending: bool) -> BeginEdit {
        if let EditState::Editing {
            id: pending_id,
            original,
            draft,
        } = self
        {
            if pending_id.as_str() == id {
                return BeginEdit::Resumed;
            }
            if *draft != *original && !discard_pending {
                return BeginEdit::Conflict {
                    pending_id: pending_id.clone(),
                };
            }
        }
        *self = EditState::Editing {
            id: id.to_string(),
            original: current.clone(),
            draft: current,
        };
        BeginEdit::Started
    }

    /// Replaces the draft of the row being edited. Returns `false` when `id`
    /// is not that row.
    pub fn update(&mut self, id: &str, changes: D) -> bool {
        match self {
            EditState::Editing {
                id: editing, draft, ..
            } if editing.as_str() == id => {
                *draft = changes;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        *self = EditState::Idle;
    }

    /// Called once the server confirmed the save.
    pub fn commit(&mut self) -> Option<D> {
        match std::mem::take(self) {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Idle => None,
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            EditState::Editing { id, .. } => Some(id),
            EditState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&D> {
        match self {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Idle => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, EditState::Editing { original, draft, .. } if original != draft)
    }
}
