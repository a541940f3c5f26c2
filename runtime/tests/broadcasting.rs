//! Integration tests for Store action broadcasting
//!
//! Effect-produced actions are observable through `subscribe_actions` and
//! `send_and_wait_for`, which is how a caller waits for a load to finish.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::time::Duration;
use todos_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use todos_runtime::{Store, StoreConfig, StoreError};
use tokio::sync::broadcast::error::TryRecvError;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start loading rows from a slow source
    Load { rows: u32 },
    /// Rows arrived (terminal action)
    Loaded { rows: u32 },
    /// Load that never finishes
    LoadForever,
    /// Simple increment command
    Increment,
    /// Incremented event
    Incremented { value: u32 },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    counter: u32,
    loaded_rows: Option<u32>,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Load { rows } => smallvec![Effect::Future(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some(TestAction::Loaded { rows })
            }))],
            TestAction::Loaded { rows } => {
                state.loaded_rows = Some(rows);
                smallvec![Effect::None]
            },
            TestAction::LoadForever => smallvec![Effect::Future(Box::pin(async {
                std::future::pending::<()>().await;
                None
            }))],
            TestAction::Increment => {
                state.counter += 1;
                let value = state.counter;
                smallvec![Effect::Future(Box::pin(async move {
                    Some(TestAction::Incremented { value })
                }))]
            },
            TestAction::Incremented { .. } => smallvec![Effect::None],
        }
    }
}

fn drain<A: Clone>(rx: &mut tokio::sync::broadcast::Receiver<A>) -> (usize, bool) {
    let mut received = 0;
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    (received, lagged)
}

// ============================================================================
// Tests
// ============================================================================

/// The terminal action is reduced before it is broadcast, so state read
/// right after `send_and_wait_for` already reflects it.
#[tokio::test]
async fn test_send_and_wait_for_sees_reduced_state() {
    let store = Store::new(TestState::default(), TestReducer, TestEnvironment);

    let result = store
        .send_and_wait_for(
            TestAction::Load { rows: 5 },
            |action| matches!(action, TestAction::Loaded { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Loaded { rows: 5 });
    assert_eq!(store.state(|s| s.loaded_rows).await, Some(5));
}

#[tokio::test]
async fn test_send_and_wait_for_timeout() {
    let store = Store::new(TestState::default(), TestReducer, TestEnvironment);

    let result = store
        .send_and_wait_for(
            TestAction::LoadForever,
            |action| matches!(action, TestAction::Loaded { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn test_direct_sends_are_not_broadcast() {
    let store = Store::new(TestState::default(), TestReducer, TestEnvironment);
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(TestAction::Increment).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    // Only the effect's Incremented shows up, not the Increment itself
    assert_eq!(rx.try_recv().unwrap(), TestAction::Incremented { value: 1 });
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_multiple_independent_subscribers() {
    let store = Store::new(TestState::default(), TestReducer, TestEnvironment);

    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();

    for _ in 0..2 {
        let mut handle = store.send(TestAction::Increment).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    }

    assert_eq!(drain(&mut rx1), (2, false));
    assert_eq!(drain(&mut rx2), (2, false));
}

#[tokio::test]
async fn test_lagging_subscriber() {
    let store = Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(4),
    );

    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        let mut handle = store.send(TestAction::Increment).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    }

    let (received, lagged) = drain(&mut rx);
    assert!(lagged, "Expected subscriber to lag");
    assert!(received > 0 && received < 20);
    assert_eq!(store.state(|s| s.counter).await, 20);
}
