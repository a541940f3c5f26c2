//! Scripted demo of the todo list.
//!
//! Opens the `SQLite` database named by `TODOS_DATABASE_URL`, loads the list,
//! adds a todo, ticks one off and waits for the delayed re-sort.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use todos::gateway::{default_seed, SqliteGateway};
use todos::{AppState, Config, TodosAction, TodosEnvironment, TodosReducer};
use todos_core::environment::RandomUuidGenerator;
use todos_runtime::Store;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type TodosStore = Store<AppState, TodosAction, TodosEnvironment, TodosReducer>;

fn print_list(title: &str, state: &AppState) {
    println!("\n{title}:");
    for item in &state.todos {
        let status = if item.is_complete { "✓" } else { " " };
        println!("  {:>2}. [{status}] {}", item.order_index, item.description);
    }
    println!("Completed: {}/{}", state.completed_count(), state.len());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=debug,todos_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        database_url = %config.database_url,
        resort_delay_ms = config.resort_delay_ms,
        list_limit = config.list_limit,
        "Configuration loaded"
    );

    let seed = if config.seed_defaults { default_seed() } else { Vec::new() };
    let gateway = SqliteGateway::connect(&config.database_url)
        .await
        .context("opening the todo database")?
        .with_seed(seed)
        .with_list_limit(config.list_limit);

    let env = TodosEnvironment::new(Arc::new(gateway), Arc::new(RandomUuidGenerator))
        .with_resort_delay(config.resort_delay());
    let store: TodosStore = Store::new(AppState::new(), TodosReducer::new(), env);

    println!("=== Todos ===");

    let loaded = store
        .send_and_wait_for(
            TodosAction::Activate,
            |action| matches!(action, TodosAction::LoadSucceeded(_) | TodosAction::LoadFailed(_)),
            Duration::from_secs(5),
        )
        .await?;
    if let TodosAction::LoadFailed(message) = loaded {
        anyhow::bail!("loading todos failed: {message}");
    }
    print_list("Loaded", &store.state(Clone::clone).await);

    // Add a todo and type into it
    store.send(TodosAction::AddItem).await?;
    if let Some(id) = store.state(|state| state.focus).await {
        store
            .send(TodosAction::EditDescription {
                id,
                text: "Try the reducer demo".to_string(),
            })
            .await?;
    }

    // Tick off the first open todo and wait for it to sink
    let first_open = store
        .state(|state| state.todos.iter().find(|item| !item.is_complete).map(|item| item.id))
        .await;
    if let Some(id) = first_open {
        println!("\nCompleting the first open todo, re-sorting after {:?}...", config.resort_delay());
        store
            .send_and_wait_for(
                TodosAction::ToggleCompleted(id),
                |action| matches!(action, TodosAction::Sort),
                config.resort_delay() + Duration::from_secs(5),
            )
            .await?;
    }
    print_list("After sort", &store.state(Clone::clone).await);

    store.shutdown(config.shutdown_timeout()).await?;

    println!("\n=== Demo Complete ===");
    Ok(())
}
