use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::{AssetFilter, AssetPatch, AssetStore, BatchUpdate, SortOrder, StatusGuard, StoreError};
use crate::assets::{Asset, AssetId, AssetStatus, NewAssetRecord};

const SELECT_ASSETS: &str = "SELECT sequence, id, description, serial_number, status, location, \
                             allocation_batch, created_at FROM assets";

/// SQLite-backed asset store with automatic migrations
pub struct SqliteAssetStore {
    pool: SqlitePool,
}

impl SqliteAssetStore {
    /// Connect to (and create if needed) the database at `database_url`
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        auto_migrate: bool,
    ) -> Result<Self, StoreError> {
        if !Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn asset_from_row(row: &SqliteRow) -> Result<Asset, StoreError> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let sequence: i64 = row.try_get("sequence")?;

    let corrupt = |reason: String| StoreError::CorruptRecord {
        id: id.clone(),
        reason,
    };

    Ok(Asset {
        id: AssetId::from_str(&id).map_err(|e| corrupt(e.to_string()))?,
        description: row.try_get("description")?,
        serial_number: row.try_get("serial_number")?,
        status: AssetStatus::from_str(&status).map_err(|e| corrupt(e.to_string()))?,
        location: row.try_get("location")?,
        allocation_batch: row.try_get("allocation_batch")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| corrupt(e.to_string()))?
            .with_timezone(&Utc),
        sequence: u64::try_from(sequence).map_err(|e| corrupt(e.to_string()))?,
    })
}

fn push_patch(builder: &mut QueryBuilder<'_, Sqlite>, patch: &AssetPatch) {
    let mut set = builder.separated(", ");
    // keeps the statement valid when the patch is empty
    set.push("id = id");
    if let Some(status) = patch.status {
        set.push("status = ").push_bind_unseparated(status.as_str());
    }
    if let Some(location) = &patch.location {
        set.push("location = ").push_bind_unseparated(location.clone());
    }
    match &patch.allocation_batch {
        BatchUpdate::Keep => {}
        BatchUpdate::Set(batch) => {
            set.push("allocation_batch = ").push_bind_unseparated(batch.clone());
        }
        BatchUpdate::Clear => {
            set.push("allocation_batch = NULL");
        }
    }
}

fn push_guard(builder: &mut QueryBuilder<'_, Sqlite>, guard: &StatusGuard) {
    if let StatusGuard::OneOf(statuses) = guard {
        builder.push(" AND status IN (");
        let mut list = builder.separated(", ");
        for status in statuses {
            list.push_bind(status.as_str());
        }
        list.push_unseparated(")");
    }
}

#[async_trait]
impl AssetStore for SqliteAssetStore {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, StoreError> {
        self.ensure_open()?;
        let id = AssetId::new();
        // stored at microsecond precision; keep the returned asset identical to what is read back
        let created_at = record.created_at.trunc_subsecs(6);

        let result = sqlx::query(
            r#"
            INSERT INTO assets
                (id, description, serial_number, status, location, allocation_batch, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
            "#,
        )
        .bind(id.to_string())
        .bind(&record.description)
        .bind(&record.serial_number)
        .bind(record.status.as_str())
        .bind(&record.location)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        let sequence = u64::try_from(result.last_insert_rowid()).map_err(|e| {
            StoreError::CorruptRecord {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(NewAssetRecord {
            created_at,
            ..record
        }
        .into_asset(id, sequence))
    }

    async fn find_all(&self) -> Result<Vec<Asset>, StoreError> {
        self.find_where(&AssetFilter::all(), SortOrder::OldestFirst, None)
            .await
    }

    async fn find_by_id(&self, id: &AssetId) -> Result<Option<Asset>, StoreError> {
        self.ensure_open()?;
        let row = sqlx::query(&format!("{SELECT_ASSETS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(asset_from_row).transpose()
    }

    async fn find_where(
        &self,
        filter: &AssetFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Asset>, StoreError> {
        self.ensure_open()?;
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_ASSETS);
        builder.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(batch) = &filter.allocation_batch {
            builder.push(" AND allocation_batch = ").push_bind(batch.clone());
        }
        builder.push(match sort {
            SortOrder::OldestFirst => " ORDER BY created_at ASC, sequence ASC",
            SortOrder::NewestFirst => " ORDER BY created_at DESC, sequence DESC",
        });
        if let Some(limit) = limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(asset_from_row).collect()
    }

    async fn update_one(
        &self,
        id: &AssetId,
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE assets SET ");
        push_patch(&mut builder, patch);
        builder.push(" WHERE id = ").push_bind(id.to_string());
        push_guard(&mut builder, guard);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn update_many(
        &self,
        ids: &[AssetId],
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE assets SET ");
        push_patch(&mut builder, patch);
        builder.push(" WHERE id IN (");
        {
            let mut list = builder.separated(", ");
            for id in ids {
                list.push_bind(id.to_string());
            }
            list.push_unseparated(")");
        }
        push_guard(&mut builder, guard);

        let mut tx = self.pool.begin().await?;
        let result = builder.build().execute(&mut *tx).await?;
        if guard.is_conditional() && result.rows_affected() != ids.len() as u64 {
            tx.rollback().await?;
            return Ok(0);
        }
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: &AssetId) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let result = sqlx::query("DELETE FROM assets WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), StoreError> {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
        Ok(())
    }
}
