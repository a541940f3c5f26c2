//! End-to-end tests running the todos reducer inside a `Store`
//!
//! Time is paused so the one-second re-sort delay elapses instantly.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use todos::gateway::{GatewayFuture, InMemoryGateway, PreviewGateway, TodoGateway};
use todos::ordering::has_dense_order;
use todos::{
    AppState, GatewayError, LoadStatus, Prompt, TodoId, TodoItem, TodosAction, TodosEnvironment,
    TodosReducer, DEFAULT_RESORT_DELAY,
};
use todos_runtime::Store;
use todos_testing::IncrementingUuidGenerator;
use tokio::sync::broadcast::{self, error::TryRecvError};

type TodosStore = Store<AppState, TodosAction, TodosEnvironment, TodosReducer>;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Gateway whose every call fails
struct UnpluggedGateway;

fn unplugged<T: Send + 'static>() -> GatewayFuture<'static, T> {
    Box::pin(async { Err(GatewayError::Connection("unplugged".to_string())) })
}

impl TodoGateway for UnpluggedGateway {
    fn initialize(&self) -> GatewayFuture<'_, ()> {
        unplugged()
    }

    fn list_all(&self) -> GatewayFuture<'_, Vec<TodoItem>> {
        unplugged()
    }

    fn create(&self, _item: TodoItem) -> GatewayFuture<'_, ()> {
        unplugged()
    }

    fn read(&self, _id: TodoId) -> GatewayFuture<'_, Option<TodoItem>> {
        unplugged()
    }

    fn update(&self, _item: TodoItem) -> GatewayFuture<'_, ()> {
        unplugged()
    }

    fn delete(&self, _id: TodoId) -> GatewayFuture<'_, ()> {
        unplugged()
    }
}

fn items(rows: &[(&str, bool)]) -> Vec<TodoItem> {
    rows.iter()
        .enumerate()
        .map(|(order_index, (description, is_complete))| {
            TodoItem::new(TodoId::new())
                .with_description(*description)
                .with_complete(*is_complete)
                .with_order_index(order_index)
        })
        .collect()
}

fn store_with(gateway: Arc<dyn TodoGateway>) -> TodosStore {
    let env = TodosEnvironment::new(gateway, Arc::new(IncrementingUuidGenerator::new()));
    Store::new(AppState::new(), TodosReducer::new(), env)
}

/// Store that has already loaded `rows` from an in-memory gateway
async fn loaded_store(rows: &[(&str, bool)]) -> (TodosStore, Arc<InMemoryGateway>) {
    let gateway = Arc::new(InMemoryGateway::with_items(items(rows)));
    let store = store_with(Arc::clone(&gateway) as Arc<dyn TodoGateway>);

    store
        .send_and_wait_for(
            TodosAction::Activate,
            |action| matches!(action, TodosAction::LoadSucceeded(_)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    (store, gateway)
}

async fn id_of(store: &TodosStore, description: &str) -> TodoId {
    let description = description.to_string();
    store
        .state(move |state| {
            state
                .todos
                .iter()
                .find(|item| item.description == description)
                .map(|item| item.id)
        })
        .await
        .unwrap()
}

async fn descriptions(store: &TodosStore) -> Vec<String> {
    store
        .state(|state| state.todos.iter().map(|item| item.description.clone()).collect())
        .await
}

fn stored_descriptions(stored: &[TodoItem]) -> Vec<&str> {
    stored.iter().map(|item| item.description.as_str()).collect()
}

fn count_sorts(rx: &mut broadcast::Receiver<TodosAction>) -> usize {
    let mut sorts = 0;
    loop {
        match rx.try_recv() {
            Ok(TodosAction::Sort) => sorts += 1,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {},
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    sorts
}

/// Long enough for the debounce to fire and the resync writes to land
async fn settle() {
    tokio::time::sleep(DEFAULT_RESORT_DELAY * 3).await;
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn activate_loads_in_stored_order() {
    let (store, _gateway) = loaded_store(&[("A", false), ("B", true), ("C", false)]).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.load_status, LoadStatus::Loaded);
    assert_eq!(descriptions(&store).await, ["A", "B", "C"]);
    assert!(has_dense_order(&state.todos));
}

#[tokio::test]
async fn activate_seeds_an_empty_store() {
    let store = store_with(Arc::new(InMemoryGateway::new()));

    store
        .send_and_wait_for(
            TodosAction::Activate,
            |action| matches!(action, TodosAction::LoadSucceeded(_)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(
        descriptions(&store).await,
        ["Wakeup", "Homework", "Play Videogames", "Do Keto", "Go to Bed"]
    );
}

#[tokio::test]
async fn preview_gateway_serves_seed() {
    let gateway = PreviewGateway::new(InMemoryGateway::new());
    assert_eq!(gateway.list_all().await.unwrap().len(), 5);

    let store = store_with(Arc::new(gateway));
    store
        .send_and_wait_for(
            TodosAction::Activate,
            |action| matches!(action, TodosAction::LoadSucceeded(_)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(store.state(AppState::len).await, 5);
}

#[tokio::test]
async fn failed_load_returns_to_not_loaded() {
    let store = store_with(Arc::new(UnpluggedGateway));

    let action = store
        .send_and_wait_for(
            TodosAction::Activate,
            |action| matches!(action, TodosAction::LoadFailed(_)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert!(matches!(action, TodosAction::LoadFailed(message) if message.contains("unplugged")));
    let state = store.state(Clone::clone).await;
    assert_eq!(state.load_status, LoadStatus::NotLoaded);
    assert!(state.is_empty());
}

#[tokio::test]
async fn write_failures_leave_state_alone() {
    let env = TodosEnvironment::new(
        Arc::new(UnpluggedGateway),
        Arc::new(IncrementingUuidGenerator::new()),
    );
    let store = Store::new(
        AppState::with_todos(items(&[("A", false)])),
        TodosReducer::new(),
        env,
    );

    let mut handle = store.send(TodosAction::AddItem).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.len(), 2);
    assert_eq!(state.focus, Some(TodoId::from_uuid(IncrementingUuidGenerator::nth(0))));
}

// ============================================================================
// Editing
// ============================================================================

#[tokio::test]
async fn added_item_is_persisted_with_dense_order() {
    let (store, gateway) = loaded_store(&[("A", false), ("B", false)]).await;

    let mut handle = store.send(TodosAction::AddItem).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let new_id = TodoId::from_uuid(IncrementingUuidGenerator::nth(0));
    let mut handle = store
        .send(TodosAction::EditDescription {
            id: new_id,
            text: "C".to_string(),
        })
        .await
        .unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let stored = gateway.snapshot().await;
    assert_eq!(stored_descriptions(&stored), ["A", "B", "C"]);
    assert!(has_dense_order(&stored));
    assert_eq!(stored[2].id, new_id);
    assert_eq!(stored, store.state(|state| state.todos.clone()).await);
}

#[tokio::test]
async fn move_is_persisted() {
    let (store, gateway) = loaded_store(&[("A", false), ("B", false), ("C", false)]).await;

    let mut handle = store
        .send(TodosAction::MoveItem { from: 0, to: 2 })
        .await
        .unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    assert_eq!(descriptions(&store).await, ["B", "A", "C"]);
    let stored = gateway.snapshot().await;
    assert_eq!(stored_descriptions(&stored), ["B", "A", "C"]);
    assert!(has_dense_order(&stored));
}

// ============================================================================
// Delayed re-sort
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rapid_toggles_sort_once_after_the_last_one() {
    let (store, _gateway) = loaded_store(&[("A", false), ("B", false), ("C", false)]).await;
    let a = id_of(&store, "A").await;
    let b = id_of(&store, "B").await;
    let mut rx = store.subscribe_actions();

    for id in [a, b, a] {
        store.send(TodosAction::ToggleCompleted(id)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let last_toggle = tokio::time::Instant::now() - Duration::from_millis(100);

    loop {
        if rx.recv().await.unwrap() == TodosAction::Sort {
            break;
        }
    }
    assert!(last_toggle.elapsed() >= DEFAULT_RESORT_DELAY);

    settle().await;
    assert_eq!(count_sorts(&mut rx), 0);
    // Only B ended up complete
    assert_eq!(descriptions(&store).await, ["A", "C", "B"]);
}

#[tokio::test(start_paused = true)]
async fn order_is_unchanged_until_the_delay_elapses() {
    let (store, _gateway) = loaded_store(&[("A", false), ("B", false)]).await;
    let a = id_of(&store, "A").await;

    store.send(TodosAction::ToggleCompleted(a)).await.unwrap();
    tokio::time::sleep(DEFAULT_RESORT_DELAY / 2).await;
    assert_eq!(descriptions(&store).await, ["A", "B"]);

    settle().await;
    assert_eq!(descriptions(&store).await, ["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn reopening_the_top_item_keeps_order() {
    let (store, gateway) = loaded_store(&[("A", true), ("B", true), ("C", true)]).await;
    let a = id_of(&store, "A").await;
    let mut rx = store.subscribe_actions();

    store.send(TodosAction::ToggleCompleted(a)).await.unwrap();
    settle().await;

    assert_eq!(count_sorts(&mut rx), 1);
    assert_eq!(descriptions(&store).await, ["A", "B", "C"]);
    let stored = gateway.snapshot().await;
    assert!(!stored[0].is_complete);
    assert!(has_dense_order(&stored));
}

#[tokio::test(start_paused = true)]
async fn two_toggles_sink_both_items_with_one_sort() {
    let (store, gateway) = loaded_store(&[("A", false), ("B", false), ("C", false)]).await;
    let a = id_of(&store, "A").await;
    let c = id_of(&store, "C").await;
    let mut rx = store.subscribe_actions();

    store.send(TodosAction::ToggleCompleted(a)).await.unwrap();
    store.send(TodosAction::ToggleCompleted(c)).await.unwrap();
    settle().await;

    assert_eq!(count_sorts(&mut rx), 1);
    assert_eq!(descriptions(&store).await, ["B", "A", "C"]);

    let stored = gateway.snapshot().await;
    assert_eq!(stored_descriptions(&stored), ["B", "A", "C"]);
    assert!(has_dense_order(&stored));
    assert_eq!(stored, store.state(|state| state.todos.clone()).await);
}

// ============================================================================
// Bulk deletes
// ============================================================================

#[tokio::test]
async fn confirmed_delete_selected_is_persisted() {
    let (store, gateway) = loaded_store(&[("A", false), ("B", false), ("C", false)]).await;
    let a = id_of(&store, "A").await;

    store.send(TodosAction::EnterEditMode).await.unwrap();
    store
        .send(TodosAction::SetSelection(HashSet::from([a])))
        .await
        .unwrap();
    store.send(TodosAction::RequestDeleteSelected).await.unwrap();
    assert_eq!(
        store.state(|state| state.prompt).await,
        Some(Prompt::ConfirmDeleteSelected)
    );

    let mut handle = store.send(TodosAction::ConfirmDeleteSelected).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert!(state.selection.is_empty());
    assert_eq!(state.prompt, None);
    assert_eq!(descriptions(&store).await, ["B", "C"]);

    let stored = gateway.snapshot().await;
    assert_eq!(stored_descriptions(&stored), ["B", "C"]);
    let indices: Vec<usize> = stored.iter().map(|item| item.order_index).collect();
    assert_eq!(indices, [0, 1]);
}

#[tokio::test]
async fn confirmed_delete_completed_is_persisted() {
    let (store, gateway) =
        loaded_store(&[("A", true), ("B", false), ("C", true), ("D", false)]).await;

    store.send(TodosAction::RequestDeleteCompleted).await.unwrap();
    let mut handle = store.send(TodosAction::ConfirmDeleteCompleted).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let stored = gateway.snapshot().await;
    assert_eq!(stored_descriptions(&stored), ["B", "D"]);
    assert!(has_dense_order(&stored));
    assert!(!store.state(AppState::can_delete_completed).await);
}

#[tokio::test]
async fn shutdown_waits_for_pending_writes() {
    let (store, gateway) = loaded_store(&[("A", false)]).await;

    store.send(TodosAction::AddItem).await.unwrap();
    store.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(gateway.len().await, 2);
    assert!(store.send(TodosAction::AddItem).await.is_err());
}

// ============================================================================
// Write ordering
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writes_land_in_send_order_across_threads() {
    let gateway = Arc::new(InMemoryGateway::empty());
    let store = store_with(Arc::clone(&gateway) as Arc<dyn TodoGateway>);

    // Nothing is awaited between sends, so each pair races on the workers
    for round in 0..100_u64 {
        let kept = TodoId::from_uuid(IncrementingUuidGenerator::nth(round * 2));
        let discarded = TodoId::from_uuid(IncrementingUuidGenerator::nth(round * 2 + 1));

        store.send(TodosAction::AddItem).await.unwrap();
        store
            .send(TodosAction::EditDescription {
                id: kept,
                text: format!("typed {round}"),
            })
            .await
            .unwrap();
        store.send(TodosAction::AddItem).await.unwrap();
        store.send(TodosAction::DeleteItem(discarded)).await.unwrap();
    }
    store.shutdown(Duration::from_secs(30)).await.unwrap();

    let todos = store.state(|state| state.todos.clone()).await;
    assert_eq!(todos.len(), 100);
    assert_eq!(gateway.snapshot().await, todos);

    let first = TodoId::from_uuid(IncrementingUuidGenerator::nth(0));
    let stored = gateway.read(first).await.unwrap().unwrap();
    assert_eq!(stored.description, "typed 0");
    let orphan = TodoId::from_uuid(IncrementingUuidGenerator::nth(1));
    assert_eq!(gateway.read(orphan).await.unwrap(), None);
}
