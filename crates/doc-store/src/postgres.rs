use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use common::DocPath;

use crate::{
    DocQuery, DocStoreError, Document, FilterOp, Precondition, Result, Revision, WriteResult,
    query::text_form,
    store::{BatchOp, DocumentStore},
};

/// PostgreSQL-backed document store implementation.
///
/// Documents live in a single `documents` table keyed by their resolved
/// path, with the body stored as JSONB and a revision counter bumped on
/// every write.
#[derive(Clone)]
pub struct PostgresDocStore {
    pool: PgPool,
}

impl PostgresDocStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let path: String = row.try_get("path")?;
        Ok(Document {
            path: DocPath::parse(&path)?,
            revision: Revision::new(row.try_get("revision")?),
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            data: row.try_get("data")?,
        })
    }

    /// Executes one guarded update on any executor (pool or transaction).
    async fn apply_update<'e, E>(
        executor: E,
        path: &DocPath,
        data: &Value,
        precondition: Precondition,
    ) -> Result<Option<WriteResult>>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE documents
            SET revision = revision + 1, updated_at = now(), data = $1
            WHERE path = $2 AND ($3::bigint IS NULL OR revision = $3)
            RETURNING revision, updated_at
            "#,
        )
        .bind(data)
        .bind(path.resolve())
        .bind(precondition.expected_revision.map(|r| r.as_i64()))
        .fetch_optional(executor)
        .await?;

        Ok(match row {
            Some(row) => Some(WriteResult {
                revision: Revision::new(row.try_get("revision")?),
                updated_at: row.try_get("updated_at")?,
            }),
            None => None,
        })
    }

    /// Turns a failed guarded update into the precise error.
    async fn diagnose_update_failure<'e, E>(
        executor: E,
        path: &DocPath,
        precondition: Precondition,
    ) -> DocStoreError
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let actual: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT revision FROM documents WHERE path = $1")
                .bind(path.resolve())
                .fetch_optional(executor)
                .await;

        match actual {
            Ok(Some(actual)) => match precondition.expected_revision {
                Some(expected) => DocStoreError::ConcurrencyConflict {
                    path: path.clone(),
                    expected,
                    actual: Revision::new(actual),
                },
                // Unconditional updates only fail when the row is gone
                None => DocStoreError::NotFound(path.clone()),
            },
            Ok(None) => DocStoreError::NotFound(path.clone()),
            Err(e) => DocStoreError::Database(e),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT path, revision, updated_at, data
            FROM documents
            WHERE path = $1
            "#,
        )
        .bind(path.resolve())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn create(&self, path: &DocPath, data: Value) -> Result<WriteResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO documents (path, parent, collection, revision, updated_at, data)
            VALUES ($1, $2, $3, 1, now(), $4)
            RETURNING revision, updated_at
            "#,
        )
        .bind(path.resolve())
        .bind(path.parent().map(|p| p.resolve()))
        .bind(path.collection().as_str())
        .bind(&data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("documents_pkey")
            {
                return DocStoreError::AlreadyExists(path.clone());
            }
            DocStoreError::Database(e)
        })?;

        Ok(WriteResult {
            revision: Revision::new(row.try_get("revision")?),
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn update(
        &self,
        path: &DocPath,
        data: Value,
        precondition: Precondition,
    ) -> Result<WriteResult> {
        match Self::apply_update(&self.pool, path, &data, precondition).await? {
            Some(result) => Ok(result),
            None => Err(Self::diagnose_update_failure(&self.pool, path, precondition).await),
        }
    }

    async fn query(&self, query: DocQuery) -> Result<Vec<Document>> {
        let mut sql =
            String::from("SELECT path, revision, updated_at, data FROM documents WHERE collection = $1");
        let mut param_count = 1;

        // Build dynamic query
        if query.parent.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND parent = ${param_count}"));
        }
        for filter in &query.filters {
            // Casts disambiguate the overloaded -> operator for bound params
            match filter.op {
                FilterOp::Eq => {
                    sql.push_str(&format!(
                        " AND data -> (${}::text) = (${}::jsonb)",
                        param_count + 1,
                        param_count + 2
                    ));
                }
                FilterOp::Lt => {
                    sql.push_str(&format!(
                        " AND data ->> (${}::text) < ${}",
                        param_count + 1,
                        param_count + 2
                    ));
                }
                FilterOp::Gt => {
                    sql.push_str(&format!(
                        " AND data ->> (${}::text) > ${}",
                        param_count + 1,
                        param_count + 2
                    ));
                }
            }
            param_count += 2;
        }

        sql.push_str(" ORDER BY path ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        // Build and execute query with parameters
        let mut sqlx_query = sqlx::query(&sql).bind(query.collection.as_str());

        if let Some(ref parent) = query.parent {
            sqlx_query = sqlx_query.bind(parent.resolve());
        }
        for filter in &query.filters {
            sqlx_query = sqlx_query.bind(filter.field.clone());
            sqlx_query = match filter.op {
                FilterOp::Eq => sqlx_query.bind(filter.value.clone()),
                FilterOp::Lt | FilterOp::Gt => sqlx_query.bind(text_form(&filter.value)),
            };
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn commit(&self, batch: Vec<BatchOp>) -> Result<Vec<WriteResult>> {
        // All operations share one transaction; a failed precondition
        // rolls back everything applied so far.
        let mut tx = self.pool.begin().await?;

        let mut results = Vec::with_capacity(batch.len());
        for op in &batch {
            match Self::apply_update(&mut *tx, &op.path, &op.data, op.precondition).await? {
                Some(result) => results.push(result),
                None => {
                    let err =
                        Self::diagnose_update_failure(&mut *tx, &op.path, op.precondition).await;
                    return Err(err);
                }
            }
        }

        tx.commit().await?;
        Ok(results)
    }
}
