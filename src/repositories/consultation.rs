// src/repositories/consultation.rs - Data access
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use crate::db::Database;
use crate::errors::RepositoryError;
use crate::models::{
    ConsultationQueryParams, ConsultationRequest, ConsultationStats, ConsultationStatus,
    NewConsultationRecord,
};

type Result<T> = std::result::Result<T, RepositoryError>;

/// Upper bound on rows returned by a single listing
pub const MAX_PAGE_SIZE: i64 = 500;

const COLUMNS: &str = "id, full_name, company, email, phone, message, status, client_ip_hash, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsultationRepositoryTrait: Send + Sync {
    /// Stores a new consultation request
    ///
    /// ### Returns
    /// * `Result<ConsultationRequest>` - The stored row, including its generated id and timestamps
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If a database error occurs
    /// * `RepositoryError::InvalidData` - If the row violates a table constraint
    async fn save(&self, record: &NewConsultationRecord) -> Result<ConsultationRequest>;

    /// Lists consultation requests, newest first
    ///
    /// ### Arguments
    /// * `params` - Optional status filter and pagination
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If a database error occurs
    async fn find(&self, params: &ConsultationQueryParams) -> Result<Vec<ConsultationRequest>>;

    /// Finds a consultation request by id, `None` when absent
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ConsultationRequest>>;

    /// Sets the status of a request and bumps `updated_at`
    ///
    /// ### Returns
    /// * `Result<u64>` - number of rows affected (0 when the id is unknown)
    async fn update_status(&self, id: &Uuid, status: ConsultationStatus) -> Result<u64>;

    /// Counts requests grouped by status
    async fn count_by_status(&self) -> Result<ConsultationStats>;
}

// Implementation using actual database
pub struct ConsultationRepository {
    pool: PgPool,
}

impl ConsultationRepository {
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.get_pool().clone(),
        }
    }

    async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start database transaction: {}", e);
            RepositoryError::Database(e)
        })
    }
}

/// Builds the listing query for `params`; the limit is clamped to `MAX_PAGE_SIZE`
fn build_find_query(params: &ConsultationQueryParams) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new(format!(
        "SELECT {} FROM consultation_requests WHERE 1=1",
        COLUMNS
    ));

    if let Some(status) = params.status {
        query_builder.push(" AND status = ");
        query_builder.push_bind(status.as_str());
    }

    query_builder.push(" ORDER BY created_at DESC");

    let limit = params.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);

    if let Some(offset) = params.offset.filter(|o| *o > 0) {
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);
    }

    query_builder
}

#[async_trait]
impl ConsultationRepositoryTrait for ConsultationRepository {
    async fn save(&self, record: &NewConsultationRecord) -> Result<ConsultationRequest> {
        let mut tx = self.begin_transaction().await?;

        let query = format!(
            r#"
                INSERT INTO consultation_requests
                (full_name, company, email, phone, message, status, client_ip_hash)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {}
            "#,
            COLUMNS
        );

        let stored = sqlx::query_as::<_, ConsultationRequest>(&query)
            .bind(&record.full_name)
            .bind(&record.company)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(&record.message)
            .bind(record.status.as_str())
            .bind(&record.client_ip_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert consultation request: {}", e);
                RepositoryError::from(e)
            })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            RepositoryError::Database(e)
        })?;

        debug!("Stored consultation request {}", stored.id);
        Ok(stored)
    }

    async fn find(&self, params: &ConsultationQueryParams) -> Result<Vec<ConsultationRequest>> {
        let mut query_builder = build_find_query(params);
        let results = query_builder
            .build_query_as::<ConsultationRequest>()
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ConsultationRequest>> {
        let query = format!(
            "SELECT {} FROM consultation_requests WHERE id = $1",
            COLUMNS
        );
        sqlx::query_as::<_, ConsultationRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)
    }

    async fn update_status(&self, id: &Uuid, status: ConsultationStatus) -> Result<u64> {
        debug!("Updating consultation {} to status {}", id, status);

        let result = sqlx::query(
            r#"
            UPDATE consultation_requests
            SET status = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_by_status(&self) -> Result<ConsultationStats> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM consultation_requests
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = ConsultationStats::default();
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            match status.parse::<ConsultationStatus>() {
                Ok(ConsultationStatus::New) => stats.new = count,
                Ok(ConsultationStatus::Contacted) => stats.contacted = count,
                Ok(ConsultationStatus::Closed) => stats.closed = count,
                Err(e) => return Err(RepositoryError::InvalidData(e)),
            }
            stats.total += count;
        }

        Ok(stats)
    }
}
