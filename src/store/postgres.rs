use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, PgPool, Row as _, TypeInfo, ValueRef};

use crate::capability::{Database, QueryError};
use crate::model::{ColumnInfo, ForeignKeyRef, Row, SchemaSnapshot, SqlValue};

/// Catalog query listing user-table columns with their foreign-key targets.
///
/// `unnest(conkey, confkey) WITH ORDINALITY` keeps each local column paired
/// with the referenced column at the same key position.
const SCHEMA_QUERY: &str = r#"
    WITH foreign_keys AS (
        SELECT
            ns.nspname::text AS table_schema,
            cl.relname::text AS table_name,
            att.attname::text AS column_name,
            con.conname::text AS constraint_name,
            cols.key_position,
            fns.nspname::text AS foreign_table_schema,
            fcl.relname::text AS foreign_table_name,
            fatt.attname::text AS foreign_column_name
        FROM pg_constraint AS con
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS cols(local_attnum, foreign_attnum, key_position)
        JOIN pg_class AS cl ON cl.oid = con.conrelid
        JOIN pg_namespace AS ns ON ns.oid = cl.relnamespace
        JOIN pg_attribute AS att
            ON att.attrelid = con.conrelid
            AND att.attnum = cols.local_attnum
        JOIN pg_class AS fcl ON fcl.oid = con.confrelid
        JOIN pg_namespace AS fns ON fns.oid = fcl.relnamespace
        JOIN pg_attribute AS fatt
            ON fatt.attrelid = con.confrelid
            AND fatt.attnum = cols.foreign_attnum
        WHERE con.contype = 'f'
    )
    SELECT
        c.table_schema::text AS table_schema,
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        (c.is_nullable = 'YES') AS is_nullable,
        fk.constraint_name,
        fk.key_position,
        fk.foreign_table_schema,
        fk.foreign_table_name,
        fk.foreign_column_name
    FROM information_schema.columns AS c
    JOIN information_schema.tables AS t
        ON t.table_schema = c.table_schema
        AND t.table_name = c.table_name
        AND t.table_type = 'BASE TABLE'
    LEFT JOIN foreign_keys AS fk
        ON fk.table_schema = c.table_schema::text
        AND fk.table_name = c.table_name::text
        AND fk.column_name = c.column_name::text
    WHERE c.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY c.table_schema, c.table_name, c.ordinal_position, fk.constraint_name, fk.key_position
"#;

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    read_only: bool,
}

impl PostgresDatabase {
    /// Create a new PostgreSQL capability with the given database URL
    pub async fn connect(database_url: &str, max_connections: u32, read_only: bool) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self::from_pool(pool, read_only))
    }

    pub fn from_pool(pool: PgPool, read_only: bool) -> Self {
        Self { pool, read_only }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<PgRow>, sqlx::Error> {
        if !self.read_only {
            return sqlx::query(sql).fetch_all(&self.pool).await;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let rows = sqlx::query(sql).fetch_all(&mut *tx).await?;
        tx.rollback().await?;
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl Database for PostgresDatabase {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        let rows = self.fetch_all(sql).await?;

        let rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    async fn read_schema(&self) -> Result<SchemaSnapshot, QueryError> {
        let rows = sqlx::query(SCHEMA_QUERY).fetch_all(&self.pool).await?;

        let columns = rows
            .iter()
            .map(decode_column_info)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(SchemaSnapshot::from_columns(&columns))
    }
}

fn decode_column_info(row: &PgRow) -> Result<ColumnInfo, sqlx::Error> {
    let constraint_name: Option<String> = row.try_get("constraint_name")?;
    let position: Option<i64> = row.try_get("key_position")?;
    let foreign_schema: Option<String> = row.try_get("foreign_table_schema")?;
    let foreign_table: Option<String> = row.try_get("foreign_table_name")?;
    let foreign_column: Option<String> = row.try_get("foreign_column_name")?;

    let references = match (constraint_name, position, foreign_schema, foreign_table, foreign_column) {
        (Some(constraint_name), Some(position), Some(table_schema), Some(table_name), Some(column_name)) => {
            Some(ForeignKeyRef {
                constraint_name,
                position,
                table_schema,
                table_name,
                column_name,
            })
        }
        _ => None,
    };

    Ok(ColumnInfo {
        table_schema: row.try_get("table_schema")?,
        table_name: row.try_get("table_name")?,
        column_name: row.try_get("column_name")?,
        data_type: row.try_get("data_type")?,
        is_nullable: row.try_get("is_nullable")?,
        references,
    })
}

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_value(row, column.ordinal())?;
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

fn decode_value(row: &PgRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => SqlValue::Bool(row.try_get(index)?),
        "INT2" => SqlValue::Int(row.try_get::<i16, _>(index)? as i64),
        "INT4" => SqlValue::Int(row.try_get::<i32, _>(index)? as i64),
        "INT8" => SqlValue::Int(row.try_get(index)?),
        "FLOAT4" => SqlValue::Float(row.try_get::<f32, _>(index)? as f64),
        "FLOAT8" => SqlValue::Float(row.try_get(index)?),
        // Exact digits as text; aggregates like AVG and SUM(bigint) land here
        "NUMERIC" => SqlValue::Text(row.try_get::<BigDecimal, _>(index)?.to_string()),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => SqlValue::Text(row.try_get(index)?),
        "JSON" | "JSONB" => SqlValue::Json(row.try_get(index)?),
        "UUID" => SqlValue::Text(row.try_get::<uuid::Uuid, _>(index)?.to_string()),
        "DATE" => SqlValue::Text(row.try_get::<chrono::NaiveDate, _>(index)?.to_string()),
        "TIME" => SqlValue::Text(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        "TIMESTAMP" => SqlValue::Text(
            row.try_get::<chrono::NaiveDateTime, _>(index)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIMESTAMPTZ" => SqlValue::Text(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?
                .to_rfc3339(),
        ),
        other => SqlValue::Text(format!("<{}>", other)),
    };

    Ok(value)
}
