//! Durable storage of Task records.
//!
//! `TaskStore` is the seam the Task Manager writes through. A
//! `SqliteTaskStore` backs production; an `InMemoryTaskStore` test
//! double stands in wherever a single-component unit test would
//! otherwise need a real pool.

use async_trait::async_trait;
use dashmap::DashMap;
use mediaflow_shared::error::{OrchestrationResult, PersistenceFailure};
use mediaflow_shared::{Task, TaskStatus};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> OrchestrationResult<()>;
    async fn update(&self, task: &Task) -> OrchestrationResult<()>;
    async fn get(&self, id: &str) -> OrchestrationResult<Option<Task>>;
    async fn list_all(&self) -> OrchestrationResult<Vec<Task>>;
    async fn delete(&self, id: &str) -> OrchestrationResult<bool>;
    async fn delete_all(&self) -> OrchestrationResult<usize>;
    /// Tasks whose status is `pending` or `running` — used for both
    /// startup recovery and `cancel_all`'s targeting.
    async fn list_where_active(&self) -> OrchestrationResult<Vec<Task>>;
    /// Writes every task in `tasks` as a single durable commit — used
    /// wherever spec.md requires "a single transactional commit"
    /// (startup recovery, `cancel_all`): a mid-batch failure must leave
    /// none of the batch durably applied, never a partial write.
    async fn update_many(&self, tasks: &[Task]) -> OrchestrationResult<()>;
}

/// SQLite-backed implementation. `request_params` and `result` are
/// stored as JSON text columns.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub async fn connect(database_path: &str) -> OrchestrationResult<Self> {
        // A `:memory:` SQLite database is private to the connection that
        // opened it, so the pool must be pinned to a single connection —
        // otherwise each checked-out connection sees its own empty schema.
        let (url, max_connections) = if database_path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite://{database_path}?mode=rwc"), 8)
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .map_err(PersistenceFailure::from)?;
        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Construct directly from an already-open pool (tests, or an
    /// in-memory pool shared across connections via a single handle).
    pub async fn from_pool(pool: SqlitePool) -> OrchestrationResult<Self> {
        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> OrchestrationResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                status TEXT NOT NULL,
                progress REAL NOT NULL,
                message TEXT NOT NULL,
                error TEXT,
                result TEXT,
                request_params TEXT NOT NULL,
                created_at REAL NOT NULL,
                cancelled INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(PersistenceFailure::from)?;
        Ok(())
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> OrchestrationResult<Task> {
        let status_str: String = row.try_get("status").map_err(PersistenceFailure::from)?;
        let status: TaskStatus =
            serde_json::from_value(serde_json::Value::String(status_str))
                .map_err(PersistenceFailure::from)?;
        let result_text: Option<String> =
            row.try_get("result").map_err(PersistenceFailure::from)?;
        let result = result_text
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(PersistenceFailure::from)?;
        let request_params_text: String = row
            .try_get("request_params")
            .map_err(PersistenceFailure::from)?;
        let request_params =
            serde_json::from_str(&request_params_text).map_err(PersistenceFailure::from)?;

        Ok(Task {
            id: row.try_get("id").map_err(PersistenceFailure::from)?,
            name: row.try_get("name").map_err(PersistenceFailure::from)?,
            task_type: row.try_get("type").map_err(PersistenceFailure::from)?,
            status,
            progress: row.try_get("progress").map_err(PersistenceFailure::from)?,
            message: row.try_get("message").map_err(PersistenceFailure::from)?,
            error: row.try_get("error").map_err(PersistenceFailure::from)?,
            result,
            request_params,
            created_at: row.try_get("created_at").map_err(PersistenceFailure::from)?,
            cancelled: row.try_get("cancelled").map_err(PersistenceFailure::from)?,
        })
    }
}

fn status_column(task: &Task) -> String {
    task.status.to_string()
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert(&self, task: &Task) -> OrchestrationResult<()> {
        let status_str = status_column(task);
        let result_text = task
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(PersistenceFailure::from)?;
        let params_text =
            serde_json::to_string(&task.request_params).map_err(PersistenceFailure::from)?;

        sqlx::query(
            r#"
            INSERT INTO task (id, name, type, status, progress, message, error, result, request_params, created_at, cancelled)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.name)
        .bind(&task.task_type)
        .bind(&status_str)
        .bind(task.progress)
        .bind(&task.message)
        .bind(&task.error)
        .bind(result_text)
        .bind(params_text)
        .bind(task.created_at)
        .bind(task.cancelled)
        .execute(&self.pool)
        .await
        .map_err(PersistenceFailure::from)?;
        Ok(())
    }

    async fn update(&self, task: &Task) -> OrchestrationResult<()> {
        let status_str = status_column(task);
        let result_text = task
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(PersistenceFailure::from)?;
        let params_text =
            serde_json::to_string(&task.request_params).map_err(PersistenceFailure::from)?;

        sqlx::query(
            r#"
            UPDATE task SET name = ?, type = ?, status = ?, progress = ?, message = ?,
                error = ?, result = ?, request_params = ?, created_at = ?, cancelled = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.name)
        .bind(&task.task_type)
        .bind(&status_str)
        .bind(task.progress)
        .bind(&task.message)
        .bind(&task.error)
        .bind(result_text)
        .bind(params_text)
        .bind(task.created_at)
        .bind(task.cancelled)
        .bind(&task.id)
        .execute(&self.pool)
        .await
        .map_err(PersistenceFailure::from)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> OrchestrationResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM task WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PersistenceFailure::from)?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn list_all(&self) -> OrchestrationResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM task ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceFailure::from)?;
        rows.iter().map(Self::row_to_task).collect()
    }

    async fn delete(&self, id: &str) -> OrchestrationResult<bool> {
        let result = sqlx::query("DELETE FROM task WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(PersistenceFailure::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> OrchestrationResult<usize> {
        let result = sqlx::query("DELETE FROM task")
            .execute(&self.pool)
            .await
            .map_err(PersistenceFailure::from)?;
        Ok(result.rows_affected() as usize)
    }

    async fn list_where_active(&self) -> OrchestrationResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM task WHERE status IN ('pending', 'running')")
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceFailure::from)?;
        rows.iter().map(Self::row_to_task).collect()
    }

    async fn update_many(&self, tasks: &[Task]) -> OrchestrationResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(PersistenceFailure::from)?;
        for task in tasks {
            let status_str = status_column(task);
            let result_text = task
                .result
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(PersistenceFailure::from)?;
            let params_text =
                serde_json::to_string(&task.request_params).map_err(PersistenceFailure::from)?;

            sqlx::query(
                r#"
                UPDATE task SET name = ?, type = ?, status = ?, progress = ?, message = ?,
                    error = ?, result = ?, request_params = ?, created_at = ?, cancelled = ?
                WHERE id = ?
                "#,
            )
            .bind(&task.name)
            .bind(&task.task_type)
            .bind(&status_str)
            .bind(task.progress)
            .bind(&task.message)
            .bind(&task.error)
            .bind(result_text)
            .bind(params_text)
            .bind(task.created_at)
            .bind(task.cancelled)
            .bind(&task.id)
            .execute(&mut *tx)
            .await
            .map_err(PersistenceFailure::from)?;
        }
        tx.commit().await.map_err(PersistenceFailure::from)?;
        Ok(())
    }
}

/// In-memory test double, keyed the same way the SQLite store is
/// keyed. Used in unit tests of components layered above `TaskStore`
/// that don't need real persistence semantics.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: DashMap<String, Task>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> OrchestrationResult<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> OrchestrationResult<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> OrchestrationResult<Option<Task>> {
        Ok(self.tasks.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_all(&self) -> OrchestrationResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.tasks.iter().map(|e| e.value().clone()).collect();
        tasks.sort_by(|a, b| a.created_at.partial_cmp(&b.created_at).unwrap());
        Ok(tasks)
    }

    async fn delete(&self, id: &str) -> OrchestrationResult<bool> {
        Ok(self.tasks.remove(id).is_some())
    }

    async fn delete_all(&self) -> OrchestrationResult<usize> {
        let count = self.tasks.len();
        self.tasks.clear();
        Ok(count)
    }

    async fn list_where_active(&self) -> OrchestrationResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .map(|e| e.value().clone())
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Running))
            .collect())
    }

    async fn update_many(&self, tasks: &[Task]) -> OrchestrationResult<()> {
        for task in tasks {
            self.tasks.insert(task.id.clone(), task.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_shared::Task;

    fn sample_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            name: "Sample".to_string(),
            task_type: "download".to_string(),
            status: TaskStatus::Pending,
            progress: 0.0,
            message: "Pending...".to_string(),
            error: None,
            result: None,
            request_params: serde_json::json!({"url": "https://example.com/a"}),
            created_at: 1_700_000_000.0,
            cancelled: false,
        }
    }

    #[tokio::test]
    async fn in_memory_store_round_trips_insert_and_get() {
        let store = InMemoryTaskStore::new();
        let task = sample_task("abc12345");
        store.insert(&task).await.unwrap();
        let fetched = store.get("abc12345").await.unwrap().unwrap();
        assert_eq!(fetched.id, task.id);
        assert_eq!(fetched.request_params, task.request_params);
    }

    #[tokio::test]
    async fn in_memory_store_list_where_active_filters_terminal() {
        let store = InMemoryTaskStore::new();
        let mut running = sample_task("running1");
        running.status = TaskStatus::Running;
        let mut done = sample_task("done0001");
        done.status = TaskStatus::Completed;
        store.insert(&running).await.unwrap();
        store.insert(&done).await.unwrap();

        let active = store.list_where_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "running1");
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_through_real_schema() {
        let store = SqliteTaskStore::connect(":memory:").await.unwrap();
        let task = sample_task("sqlite01");
        store.insert(&task).await.unwrap();

        let fetched = store.get("sqlite01").await.unwrap().unwrap();
        assert_eq!(fetched.task_type, "download");
        assert_eq!(fetched.request_params["url"], "https://example.com/a");

        let mut updated = fetched;
        updated.status = TaskStatus::Completed;
        updated.progress = 100.0;
        store.update(&updated).await.unwrap();
        let refetched = store.get("sqlite01").await.unwrap().unwrap();
        assert_eq!(refetched.status, TaskStatus::Completed);
        assert_eq!(refetched.progress, 100.0);
    }

    #[tokio::test]
    async fn sqlite_store_delete_and_delete_all() {
        let store = SqliteTaskStore::connect(":memory:").await.unwrap();
        store.insert(&sample_task("del00001")).await.unwrap();
        store.insert(&sample_task("del00002")).await.unwrap();

        assert!(store.delete("del00001").await.unwrap());
        assert!(!store.delete("missing1").await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        let removed = store.delete_all().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_store_update_many_commits_every_task_in_one_transaction() {
        let store = SqliteTaskStore::connect(":memory:").await.unwrap();
        let mut a = sample_task("batch001");
        let mut b = sample_task("batch002");
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        a.status = TaskStatus::Paused;
        a.cancelled = true;
        b.status = TaskStatus::Paused;
        b.cancelled = true;
        store.update_many(&[a, b]).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert!(all.iter().all(|t| t.status == TaskStatus::Paused && t.cancelled));
    }

    #[tokio::test]
    async fn update_many_on_an_empty_batch_is_a_noop() {
        let store = SqliteTaskStore::connect(":memory:").await.unwrap();
        store.update_many(&[]).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
