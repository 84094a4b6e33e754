use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::store::*;

/// Document store backed by a PostgreSQL table with a JSONB column.
///
/// Each collection lives in its own table:
/// `(id UUID PRIMARY KEY, doc JSONB, created_at TIMESTAMPTZ, updated_at TIMESTAMPTZ)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
}

impl PgDocumentStore {
    /// Creates a store for the collection named `table`.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            table: checked_identifier(table)?,
        })
    }

    /// Creates the collection table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table = self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(())
    }

    /// Creates the unique expression index that backs [`DocumentStore::upsert_by_key`].
    pub async fn ensure_unique_key(&self, field: &str) -> Result<(), StoreError> {
        let field = checked_identifier(field)?;
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{field}_key ON {table} ((doc->>'{field}'))",
            table = self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(())
    }

    fn document_from_row(row: &PgRow) -> Result<Document, StoreError> {
        let id: Uuid = row.try_get("id")?;
        let doc = match row.try_get::<Value, _>("doc")? {
            Value::Object(map) => map,
            other => serde_json::from_value(other)?,
        };

        Ok(with_id(&id, doc))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError> {
        let id = Uuid::new_v4();
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", self.table);

        sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(strip_id(doc)))
            .execute(&self.pool)
            .await?;

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT id, doc FROM {} WHERE id = $1", self.table);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::document_from_row).transpose()
    }

    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT id, doc FROM {} WHERE TRUE", self.table));

        for (field, value) in &filter.equals {
            builder
                .push(" AND doc->>")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(value.clone());
        }

        for (field, needle) in &filter.contains {
            builder
                .push(" AND doc->>")
                .push_bind(field.clone())
                .push(" ILIKE ")
                .push_bind(like_pattern(needle));
        }

        builder.push(" ORDER BY created_at, id");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter().map(Self::document_from_row).collect()
    }

    async fn update_by_id(&self, id: &Uuid, fields: Document) -> Result<UpdateResult, StoreError> {
        let sql = format!(
            r#"
            WITH prev AS (
                SELECT id, doc FROM {table} WHERE id = $1 FOR UPDATE
            )
            UPDATE {table}
            SET doc = {table}.doc || $2, updated_at = NOW()
            FROM prev
            WHERE {table}.id = prev.id
            RETURNING prev.doc IS DISTINCT FROM {table}.doc AS modified
            "#,
            table = self.table
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(strip_id(fields)))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let modified: bool = row.try_get("modified")?;
                Ok(UpdateResult::updated(1, u64::from(modified)))
            }
            None => Ok(UpdateResult::updated(0, 0)),
        }
    }

    async fn upsert_by_key(&self, key: &str, doc: Document) -> Result<UpdateResult, StoreError> {
        let key = checked_identifier(key)?;
        key_value(&doc, &key)?;

        // Unchanged documents skip the DO UPDATE branch and return no row.
        let sql = format!(
            r#"
            INSERT INTO {table} (id, doc) VALUES ($1, $2)
            ON CONFLICT ((doc->>'{key}')) DO UPDATE
            SET doc = {table}.doc || EXCLUDED.doc, updated_at = NOW()
            WHERE {table}.doc IS DISTINCT FROM {table}.doc || EXCLUDED.doc
            RETURNING id, (xmax = 0) AS inserted
            "#,
            table = self.table
        );

        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(Value::Object(strip_id(doc)))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(UpdateResult::updated(1, 0));
        };

        if row.try_get::<bool, _>("inserted")? {
            Ok(UpdateResult::upserted(row.try_get("id")?))
        } else {
            Ok(UpdateResult::updated(1, 1))
        }
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<DeleteResult, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Accepts only names safe to splice into SQL: ASCII letters, digits and underscores.
fn checked_identifier(name: &str) -> Result<String, StoreError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name.to_string())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Builds an ILIKE pattern matching `needle` anywhere, with wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
