//! Result-column introspection against a live Postgres schema.
//!
//! Each query is materialized as a session-temporary view on a pooled
//! connection, its columns are read from `information_schema.columns`, and
//! the view is dropped again. View names carry a per-run token, and
//! temporary views are only visible to the session that created them, so
//! concurrent workers never see each other's views.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::{TypegenError, TypegenResult};

/// One result column of a query.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Column {
    pub name: String,
    /// Postgres type name as in `information_schema.columns.udt_name`.
    pub udt_name: String,
}

impl Column {
    pub fn new(name: &str, udt_name: &str) -> Self {
        Self {
            name: name.to_string(),
            udt_name: udt_name.to_string(),
        }
    }
}

/// Describes the result columns of a normalized query.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// `name` is the synthesized type name of the query; `query` has already
    /// been normalized.
    async fn describe(&self, name: &str, query: &str) -> TypegenResult<Vec<Column>>;
}

const DESCRIBE_VIEW: &str = "
select
    column_name::text as name,
    udt_name::text as udt_name
from
    information_schema.columns
where
    table_schema = pg_my_temp_schema()::regnamespace::text
    and table_name = $1
order by
    ordinal_position
";

/// Postgres-backed introspector.
#[derive(Clone)]
pub struct PgIntrospector {
    pool: PgPool,
    run_token: String,
}

impl PgIntrospector {
    /// Connect a pool. Failure here is fatal for the run.
    pub async fn connect(url: &str, max_connections: u32) -> TypegenResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| TypegenError::Connection(e.to_string()))?;

        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self {
            pool,
            run_token: token[..12].to_string(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Temporary view name for a synthesized type name.
    pub fn view_name(&self, name: &str) -> String {
        format!("typegen_{}_{}", name.to_lowercase(), self.run_token)
    }
}

#[async_trait]
impl SchemaIntrospector for PgIntrospector {
    async fn describe(&self, name: &str, query: &str) -> TypegenResult<Vec<Column>> {
        let view = self.view_name(name);
        let mut conn = self.pool.acquire().await?;

        sqlx::query(&format!("create or replace temporary view {} as {}", view, query))
            .execute(&mut *conn)
            .await
            .map_err(|e| TypegenError::Introspection(format!("creating view {}: {}", view, e)))?;

        let columns = sqlx::query_as::<_, Column>(DESCRIBE_VIEW)
            .bind(&view)
            .fetch_all(&mut *conn)
            .await;

        // Drop before looking at the describe result.
        let dropped = sqlx::query(&format!("drop view if exists {}", view))
            .execute(&mut *conn)
            .await;

        let columns = columns.map_err(|e| {
            TypegenError::Introspection(format!("describing view {}: {}", view, e))
        })?;
        dropped.map_err(|e| TypegenError::Introspection(format!("dropping view {}: {}", view, e)))?;

        if columns.is_empty() {
            return Err(TypegenError::Introspection(format!(
                "view {} has no columns",
                view
            )));
        }

        tracing::debug!(view = %view, columns = columns.len(), "described query");
        Ok(columns)
    }
}
