//! `SQLite` gateway backed by a single `sqlx` connection.

use super::{default_seed, GatewayError, GatewayFuture, TodoGateway, DEFAULT_LIST_LIMIT};
use crate::types::{TodoId, TodoItem};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use std::str::FromStr;
use tokio::sync::Mutex;
use uuid::Uuid;

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY,
        is_complete INTEGER NOT NULL,
        description TEXT NOT NULL,
        order_index INTEGER NOT NULL
    )
";

struct Session {
    conn: SqliteConnection,
    initialized: bool,
}

/// Gateway storing todos in a local `SQLite` database
///
/// All operations share one connection behind a mutex, so they run one at
/// a time in the order they were issued.
///
/// # Example
///
/// ```no_run
/// use todos::gateway::{SqliteGateway, TodoGateway};
///
/// # async fn example() -> Result<(), todos::gateway::GatewayError> {
/// let gateway = SqliteGateway::connect("sqlite://todos.db?mode=rwc").await?;
/// gateway.initialize().await?;
/// let items = gateway.list_all().await?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteGateway {
    session: Mutex<Session>,
    seed: Vec<TodoItem>,
    list_limit: usize,
}

impl SqliteGateway {
    /// Opens (creating if needed) the database at `url` and ensures the `todos` table exists
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Connection`] if the URL is invalid, the
    /// database cannot be opened, or the table cannot be created.
    pub async fn connect(url: &str) -> Result<Self, GatewayError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| GatewayError::Connection(e.to_string()))?
            .create_if_missing(true);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        sqlx::query(CREATE_TABLE)
            .execute(&mut conn)
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        tracing::info!(url, "Opened todo database");

        Ok(Self {
            session: Mutex::new(Session {
                conn,
                initialized: false,
            }),
            seed: default_seed(),
            list_limit: DEFAULT_LIST_LIMIT,
        })
    }

    /// Opens a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Connection`] if `SQLite` cannot be opened.
    pub async fn in_memory() -> Result<Self, GatewayError> {
        Self::connect("sqlite::memory:").await
    }

    /// Replace the items seeded by `initialize`
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<TodoItem>) -> Self {
        self.seed = seed;
        self
    }

    /// Cap the number of items `list_all` returns
    #[must_use]
    pub const fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }
}

impl std::fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGateway")
            .field("seed", &self.seed.len())
            .field("list_limit", &self.list_limit)
            .finish_non_exhaustive()
    }
}

fn query_error(error: sqlx::Error) -> GatewayError {
    GatewayError::Query(error.to_string())
}

fn index_to_sql(order_index: usize) -> Result<i64, GatewayError> {
    i64::try_from(order_index)
        .map_err(|_| GatewayError::Query(format!("order index {order_index} does not fit in SQLite")))
}

fn row_to_item(row: &SqliteRow) -> Result<TodoItem, GatewayError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let id = Uuid::parse_str(&id).map_err(|e| GatewayError::Corrupt(format!("id {id}: {e}")))?;

    let order_index: i64 = row.try_get("order_index").map_err(query_error)?;
    let order_index = usize::try_from(order_index)
        .map_err(|_| GatewayError::Corrupt(format!("order index {order_index} for {id}")))?;

    Ok(TodoItem {
        id: TodoId::from_uuid(id),
        is_complete: row.try_get("is_complete").map_err(query_error)?,
        description: row.try_get("description").map_err(query_error)?,
        order_index,
    })
}

async fn insert_row(conn: &mut SqliteConnection, item: &TodoItem) -> Result<(), GatewayError> {
    sqlx::query(
        r"
        INSERT INTO todos (id, is_complete, description, order_index)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(item.id.to_string())
    .bind(item.is_complete)
    .bind(&item.description)
    .bind(index_to_sql(item.order_index)?)
    .execute(conn)
    .await
    .map_err(query_error)?;

    Ok(())
}

impl TodoGateway for SqliteGateway {
    fn initialize(&self) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            if session.initialized {
                return Ok(());
            }

            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos")
                .fetch_one(&mut session.conn)
                .await
                .map_err(query_error)?;

            if count == 0 && !self.seed.is_empty() {
                let mut tx = session.conn.begin().await.map_err(query_error)?;
                for item in &self.seed {
                    insert_row(&mut tx, item).await?;
                }
                tx.commit().await.map_err(query_error)?;
                tracing::info!(count = self.seed.len(), "Seeded todo database");
            }

            session.initialized = true;
            Ok(())
        })
    }

    fn list_all(&self) -> GatewayFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            let rows = sqlx::query(
                r"
                SELECT id, is_complete, description, order_index
                FROM todos
                ORDER BY order_index ASC, rowid ASC
                LIMIT ?
                ",
            )
            .bind(index_to_sql(self.list_limit)?)
            .fetch_all(&mut session.conn)
            .await
            .map_err(query_error)?;

            rows.iter().map(row_to_item).collect()
        })
    }

    fn create(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            insert_row(&mut session.conn, &item).await
        })
    }

    fn read(&self, id: TodoId) -> GatewayFuture<'_, Option<TodoItem>> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            let row = sqlx::query(
                r"
                SELECT id, is_complete, description, order_index
                FROM todos
                WHERE id = ?
                ",
            )
            .bind(id.to_string())
            .fetch_optional(&mut session.conn)
            .await
            .map_err(query_error)?;

            row.as_ref().map(row_to_item).transpose()
        })
    }

    fn update(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            sqlx::query(
                r"
                UPDATE todos
                SET is_complete = ?, description = ?, order_index = ?
                WHERE id = ?
                ",
            )
            .bind(item.is_complete)
            .bind(&item.description)
            .bind(index_to_sql(item.order_index)?)
            .bind(item.id.to_string())
            .execute(&mut session.conn)
            .await
            .map_err(query_error)?;

            Ok(())
        })
    }

    fn delete(&self, id: TodoId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            sqlx::query("DELETE FROM todos WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut session.conn)
                .await
                .map_err(query_error)?;

            Ok(())
        })
    }
}
