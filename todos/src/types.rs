//! Domain types for the todo list.
//!
//! A todo list is an ordered collection of items plus the transient UI state
//! around it: which items are selected, whether the list is being edited,
//! which row has keyboard focus, and whether a confirmation prompt is showing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a todo item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// Whether the todo is done
    pub is_complete: bool,
    /// Free text the user typed
    pub description: String,
    /// Position in the display order
    pub order_index: usize,
}

impl TodoItem {
    /// Creates an incomplete todo with an empty description at index 0
    #[must_use]
    pub const fn new(id: TodoId) -> Self {
        Self {
            id,
            is_complete: false,
            description: String::new(),
            order_index: 0,
        }
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the completion flag
    #[must_use]
    pub const fn with_complete(mut self, is_complete: bool) -> Self {
        self.is_complete = is_complete;
        self
    }

    /// Sets the order index
    #[must_use]
    pub const fn with_order_index(mut self, order_index: usize) -> Self {
        self.order_index = order_index;
        self
    }

    /// Flips the completion flag
    pub const fn toggle(&mut self) {
        self.is_complete = !self.is_complete;
    }
}

/// Whether the list has been fetched from the gateway yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Nothing requested yet
    #[default]
    NotLoaded,
    /// Fetch in flight
    Loading,
    /// Items came back from the gateway
    Loaded,
}

/// Confirmation dialog waiting for an answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prompt {
    /// Delete every selected todo?
    ConfirmDeleteSelected,
    /// Delete every completed todo?
    ConfirmDeleteCompleted,
}

impl Prompt {
    /// Dialog title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ConfirmDeleteSelected => "Delete Selected Todos",
            Self::ConfirmDeleteCompleted => "Delete Completed Todos",
        }
    }

    /// Dialog body
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfirmDeleteSelected => "Are you sure you want to delete the selected todos?",
            Self::ConfirmDeleteCompleted => "Are you sure you want to delete the completed todos?",
        }
    }

    /// Label of the destructive button
    #[must_use]
    pub const fn confirm_label(self) -> &'static str {
        "Confirm"
    }

    /// The action the destructive button sends
    #[must_use]
    pub const fn confirm_action(self) -> TodosAction {
        match self {
            Self::ConfirmDeleteSelected => TodosAction::ConfirmDeleteSelected,
            Self::ConfirmDeleteCompleted => TodosAction::ConfirmDeleteCompleted,
        }
    }
}

/// State of the todo list screen
///
/// `todos` is kept in display order and never holds two items with the same id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Whether items have been fetched
    pub load_status: LoadStatus,
    /// Items in display order
    pub todos: Vec<TodoItem>,
    /// Ids picked in edit mode
    pub selection: HashSet<TodoId>,
    /// Edit mode toggle
    pub is_editing: bool,
    /// Row with keyboard focus
    pub focus: Option<TodoId>,
    /// Pending confirmation dialog
    pub prompt: Option<Prompt>,
}

impl AppState {
    /// Creates an empty, not yet loaded state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loaded state holding `todos` in the given order
    #[must_use]
    pub fn with_todos(todos: Vec<TodoItem>) -> Self {
        Self {
            load_status: LoadStatus::Loaded,
            todos,
            ..Self::default()
        }
    }

    /// Number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// True when there are no todos
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn item(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|item| item.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: TodoId) -> Option<&mut TodoItem> {
        self.todos.iter_mut().find(|item| item.id == id)
    }

    /// Display position of a todo
    #[must_use]
    pub fn position(&self, id: TodoId) -> Option<usize> {
        self.todos.iter().position(|item| item.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: TodoId) -> bool {
        self.position(id).is_some()
    }

    /// Ids in display order
    #[must_use]
    pub fn ids(&self) -> Vec<TodoId> {
        self.todos.iter().map(|item| item.id).collect()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|item| item.is_complete).count()
    }

    /// Every todo is selected
    #[must_use]
    pub fn has_selected_all(&self) -> bool {
        self.selection.len() == self.todos.len()
    }

    /// The "delete completed" button is enabled
    #[must_use]
    pub fn can_delete_completed(&self) -> bool {
        self.todos.iter().any(|item| item.is_complete)
    }

    /// The "delete selected" button is enabled
    #[must_use]
    pub fn can_delete_selected(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Drops selection entries and focus that point at removed todos
    pub(crate) fn purge_dangling(&mut self) {
        let present: HashSet<TodoId> = self.todos.iter().map(|item| item.id).collect();
        self.selection.retain(|id| present.contains(id));
        if self.focus.is_some_and(|id| !present.contains(&id)) {
            self.focus = None;
        }
    }
}

/// Everything that can happen to the todo list
///
/// Most variants are user intents coming from the view. `LoadSucceeded`,
/// `LoadFailed` and `Sort` are produced by effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodosAction {
    /// View appeared; load once per session
    Activate,
    /// Gateway returned the stored items
    LoadSucceeded(Vec<TodoItem>),
    /// Gateway failed while loading
    LoadFailed(String),
    /// Append an empty todo and focus it
    AddItem,
    /// Text field changed
    EditDescription {
        /// Todo being edited
        id: TodoId,
        /// New description
        text: String,
    },
    /// Checkbox tapped
    ToggleCompleted(TodoId),
    /// Move completed todos below incomplete ones
    Sort,
    /// Swipe to delete
    DeleteItem(TodoId),
    /// Drag to reorder
    ///
    /// A move that is out of range or would leave the list unchanged is
    /// ignored and issues no writes, since the order indices are already
    /// dense.
    MoveItem {
        /// Current position
        from: usize,
        /// Destination offset, counted before removal
        to: usize,
    },
    /// "Delete completed" button
    RequestDeleteCompleted,
    /// "Delete selected" button
    RequestDeleteSelected,
    /// Confirmed the delete-completed prompt
    ConfirmDeleteCompleted,
    /// Confirmed the delete-selected prompt
    ConfirmDeleteSelected,
    /// Prompt dismissed without confirming
    DismissPrompt,
    /// "Edit" button
    EnterEditMode,
    /// "Done" button
    ExitEditMode,
    /// "Select all" / "Deselect all" button
    ToggleSelectAll,
    /// Selection binding changed
    SetSelection(HashSet<TodoId>),
    /// Focus binding changed
    SetFocus(Option<TodoId>),
}
