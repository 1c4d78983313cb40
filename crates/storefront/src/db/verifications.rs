//! Verification request repository (OTP audit trail).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use petal_core::{OtpChannel, Phone, VerificationRequestId, VerificationStatus};

use super::{Page, Paginated, RepositoryError};
use crate::models::VerificationRequest;

#[derive(Debug, sqlx::FromRow)]
struct VerificationRow {
    id: i32,
    phone: String,
    channel: OtpChannel,
    status: VerificationStatus,
    attempts: i32,
    expires_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<VerificationRow> for VerificationRequest {
    fn from(row: VerificationRow) -> Self {
        Self {
            id: VerificationRequestId::new(row.id),
            phone: row.phone,
            channel: row.channel,
            status: row.status,
            attempts: row.attempts,
            expires_at: row.expires_at,
            verified_at: row.verified_at,
            created_at: row.created_at,
        }
    }
}

const VERIFICATION_COLUMNS: &str =
    "id, phone, channel, status, attempts, expires_at, verified_at, created_at";

/// Repository for verification requests.
pub struct VerificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an OTP send.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        phone: &Phone,
        channel: OtpChannel,
        status: VerificationStatus,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationRequest, RepositoryError> {
        let sql = format!(
            "INSERT INTO verification_requests (phone, channel, status, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING {VERIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VerificationRow>(&sql)
            .bind(phone)
            .bind(channel)
            .bind(status)
            .bind(expires_at)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Increment the attempt counter of the latest pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_failed_attempt(
        &self,
        phone: &Phone,
        exhausted: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE verification_requests
            SET attempts = attempts + 1,
                status = CASE WHEN $2 THEN 'failed'::verification_status ELSE status END
            WHERE id = (
                SELECT id FROM verification_requests
                WHERE phone = $1 AND status = 'pending'
                ORDER BY created_at DESC, id DESC LIMIT 1
            )
            ",
        )
        .bind(phone)
        .bind(exhausted)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Mark the latest pending request approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_approved(&self, phone: &Phone) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE verification_requests
            SET status = 'approved', verified_at = NOW()
            WHERE id = (
                SELECT id FROM verification_requests
                WHERE phone = $1 AND status = 'pending'
                ORDER BY created_at DESC, id DESC LIMIT 1
            )
            ",
        )
        .bind(phone)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Mark pending requests whose code has lapsed as expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn expire_stale(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE verification_requests SET status = 'expired' \
             WHERE status = 'pending' AND expires_at < NOW()",
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List requests, newest first, optionally for one phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        phone: Option<&str>,
        page: Page,
    ) -> Result<Paginated<VerificationRequest>, RepositoryError> {
        let where_sql = "($1::text IS NULL OR phone = $1)";
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM verification_requests WHERE {where_sql}"
        ))
        .bind(phone)
        .fetch_one(self.pool)
        .await?;

        let sql = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verification_requests WHERE {where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, VerificationRow>(&sql)
            .bind(phone)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }
}
