//! Reducer logic for the todo list.
//!
//! State changes happen synchronously in [`TodosReducer::reduce`]. Every
//! write to the gateway is queued on the environment's [`GatewayWriter`]
//! during the reduction, so writes land in the order actions were sent. The
//! returned effect resolves once its write has been applied.
//! Whenever the shape of the list changes, the reducer renumbers the order
//! indices and persists every item so the stored order matches the screen.

use crate::gateway::{GatewayError, GatewayWriter, TodoGateway, Write};
use crate::ordering::{assign_order_indices, move_item, sort_incomplete_first};
use crate::types::{AppState, LoadStatus, Prompt, TodoId, TodoItem, TodosAction};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use todos_core::{
    async_effect, debounce,
    effect::{Effect, EffectId},
    environment::UuidGenerator,
    reducer::Reducer,
    smallvec, SmallVec,
};

/// Id of the delayed re-sort scheduled by completion toggles
pub const SORT_DEBOUNCE: EffectId = EffectId::new("todos.sort");

/// Quiet period after the last toggle before completed todos sink
pub const DEFAULT_RESORT_DELAY: Duration = Duration::from_secs(1);

/// Environment dependencies for the todos reducer
#[derive(Clone)]
pub struct TodosEnvironment {
    /// Persistence, read directly when loading
    ///
    /// Writes go through a [`GatewayWriter`] bound to this gateway by
    /// [`TodosEnvironment::new`].
    pub gateway: Arc<dyn TodoGateway>,
    /// Source of ids for new todos
    pub uuid: Arc<dyn UuidGenerator>,
    /// How long toggles must stop before the list re-sorts
    pub resort_delay: Duration,
    writer: GatewayWriter,
}

impl TodosEnvironment {
    /// Creates a new `TodosEnvironment` with the default re-sort delay
    #[must_use]
    pub fn new(gateway: Arc<dyn TodoGateway>, uuid: Arc<dyn UuidGenerator>) -> Self {
        Self {
            writer: GatewayWriter::new(Arc::clone(&gateway)),
            gateway,
            uuid,
            resort_delay: DEFAULT_RESORT_DELAY,
        }
    }

    /// Overrides the re-sort delay
    #[must_use]
    pub const fn with_resort_delay(mut self, resort_delay: Duration) -> Self {
        self.resort_delay = resort_delay;
        self
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug)]
pub struct TodosReducer;

impl TodosReducer {
    /// Creates a new `TodosReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Initializes the gateway and fetches every todo
    fn load(env: &TodosEnvironment) -> Effect<TodosAction> {
        let gateway = Arc::clone(&env.gateway);
        async_effect! {
            match fetch_all(gateway.as_ref()).await {
                Ok(items) => {
                    tracing::debug!(count = items.len(), "Loaded todos");
                    Some(TodosAction::LoadSucceeded(items))
                },
                Err(error) => {
                    tracing::warn!(%error, "Loading todos failed");
                    Some(TodosAction::LoadFailed(error.to_string()))
                },
            }
        }
    }

    /// Queues `write` now and returns an effect that waits for it to land
    fn persist(env: &TodosEnvironment, write: Write) -> Effect<TodosAction> {
        let applied = env.writer.submit(write);
        async_effect! {
            if applied.await.is_err() {
                tracing::debug!("Todo writer dropped a queued write");
            }
            None
        }
    }

    fn create(env: &TodosEnvironment, item: TodoItem) -> Effect<TodosAction> {
        Self::persist(env, Write::Create(item))
    }

    fn update(env: &TodosEnvironment, item: TodoItem) -> Effect<TodosAction> {
        Self::persist(env, Write::Update(item))
    }

    fn delete(env: &TodosEnvironment, id: TodoId) -> Effect<TodosAction> {
        Self::persist(env, Write::Delete(id))
    }

    /// Renumbers every todo to its position and persists each one in order
    ///
    /// This is the only place order indices are written.
    fn resync(state: &mut AppState, env: &TodosEnvironment) -> Effect<TodosAction> {
        assign_order_indices(&mut state.todos);
        Effect::chain(
            state
                .todos
                .iter()
                .map(|item| Self::update(env, item.clone()))
                .collect(),
        )
    }

    /// Deletes `removed` one after another, then resyncs what is left
    fn delete_then_resync(
        state: &mut AppState,
        env: &TodosEnvironment,
        removed: &[TodoId],
    ) -> SmallVec<[Effect<TodosAction>; 4]> {
        state.purge_dangling();
        let mut steps: Vec<Effect<TodosAction>> =
            removed.iter().map(|id| Self::delete(env, *id)).collect();
        steps.push(Self::resync(state, env));
        smallvec![Effect::chain(steps)]
    }

    /// Removes every todo matching `predicate`, returning their ids
    fn remove_where(state: &mut AppState, predicate: impl Fn(&TodoItem) -> bool) -> Vec<TodoId> {
        let mut removed = Vec::new();
        state.todos.retain(|item| {
            if predicate(item) {
                removed.push(item.id);
                false
            } else {
                true
            }
        });
        removed
    }
}

impl Default for TodosReducer {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_all(gateway: &dyn TodoGateway) -> Result<Vec<TodoItem>, GatewayError> {
    gateway.initialize().await?;
    gateway.list_all().await
}

impl Reducer for TodosReducer {
    type State = AppState;
    type Action = TodosAction;
    type Environment = TodosEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Loading ==========
            TodosAction::Activate => {
                if state.load_status != LoadStatus::NotLoaded {
                    return SmallVec::new();
                }
                state.load_status = LoadStatus::Loading;
                smallvec![Self::load(env)]
            },

            TodosAction::LoadSucceeded(items) => {
                let mut seen = HashSet::new();
                state.todos = items.into_iter().filter(|item| seen.insert(item.id)).collect();
                state.load_status = LoadStatus::Loaded;
                state.purge_dangling();
                SmallVec::new()
            },

            TodosAction::LoadFailed(message) => {
                tracing::warn!(%message, "Todo list stays unloaded");
                state.load_status = LoadStatus::NotLoaded;
                SmallVec::new()
            },

            // ========== Editing items ==========
            TodosAction::AddItem => {
                let item = TodoItem::new(TodoId::from_uuid(env.uuid.generate()))
                    .with_order_index(state.len());
                if state.contains(item.id) {
                    tracing::warn!(id = %item.id, "Generated id is already taken, not adding");
                    return SmallVec::new();
                }
                tracing::debug!(id = %item.id, "Adding todo");

                state.focus = Some(item.id);
                state.todos.push(item.clone());

                smallvec![Effect::chain(vec![
                    Self::create(env, item),
                    Self::resync(state, env),
                ])]
            },

            TodosAction::EditDescription { id, text } => {
                let Some(item) = state.item_mut(id) else {
                    return SmallVec::new();
                };
                item.description = text;
                let item = item.clone();
                smallvec![Self::update(env, item)]
            },

            TodosAction::ToggleCompleted(id) => {
                let Some(item) = state.item_mut(id) else {
                    return SmallVec::new();
                };
                item.toggle();
                let item = item.clone();
                smallvec![
                    Self::update(env, item),
                    debounce! {
                        id: SORT_DEBOUNCE,
                        duration: env.resort_delay,
                        action: TodosAction::Sort
                    },
                ]
            },

            // ========== Ordering ==========
            TodosAction::Sort => {
                sort_incomplete_first(&mut state.todos);
                smallvec![Self::resync(state, env)]
            },

            TodosAction::MoveItem { from, to } => {
                if !move_item(&mut state.todos, from, to) {
                    return SmallVec::new();
                }
                smallvec![Self::resync(state, env)]
            },

            // ========== Deleting ==========
            TodosAction::DeleteItem(id) => {
                let removed = Self::remove_where(state, |item| item.id == id);
                if removed.is_empty() {
                    return SmallVec::new();
                }
                Self::delete_then_resync(state, env, &removed)
            },

            TodosAction::RequestDeleteCompleted => {
                if state.can_delete_completed() {
                    state.prompt = Some(Prompt::ConfirmDeleteCompleted);
                }
                SmallVec::new()
            },

            TodosAction::RequestDeleteSelected => {
                if state.can_delete_selected() {
                    state.prompt = Some(Prompt::ConfirmDeleteSelected);
                }
                SmallVec::new()
            },

            TodosAction::ConfirmDeleteCompleted => {
                state.prompt = None;
                let removed = Self::remove_where(state, |item| item.is_complete);
                if removed.is_empty() {
                    return SmallVec::new();
                }
                Self::delete_then_resync(state, env, &removed)
            },

            TodosAction::ConfirmDeleteSelected => {
                state.prompt = None;
                let selection = std::mem::take(&mut state.selection);
                let removed = Self::remove_where(state, |item| selection.contains(&item.id));
                if removed.is_empty() {
                    return SmallVec::new();
                }
                Self::delete_then_resync(state, env, &removed)
            },

            TodosAction::DismissPrompt => {
                state.prompt = None;
                SmallVec::new()
            },

            // ========== Edit mode ==========
            TodosAction::EnterEditMode => {
                state.focus = None;
                state.is_editing = true;
                SmallVec::new()
            },

            TodosAction::ExitEditMode => {
                state.is_editing = false;
                state.selection.clear();
                SmallVec::new()
            },

            TodosAction::ToggleSelectAll => {
                if state.has_selected_all() {
                    state.selection.clear();
                } else {
                    state.selection = state.todos.iter().map(|item| item.id).collect();
                }
                SmallVec::new()
            },

            TodosAction::SetSelection(selection) => {
                state.selection = selection;
                state.purge_dangling();
                SmallVec::new()
            },

            TodosAction::SetFocus(focus) => {
                state.focus = focus.filter(|id| state.contains(*id));
                SmallVec::new()
            },
        }
    }
}
