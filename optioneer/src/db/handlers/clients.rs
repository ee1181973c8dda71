//! Repository for client (tenant) accounts.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::clients::{ClientCreateDBRequest, ClientDBResponse, ClientUpdateDBRequest};
use crate::types::{abbrev_uuid, ClientId};

const COLUMNS: &str = "id, email, password_hash, company_name, public_key, allowed_domains, \
     subscription_status, charged_blocks, monthly_requests, request_limit, created_at, updated_at";

pub struct Clients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Clients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &ClientCreateDBRequest) -> Result<ClientDBResponse> {
        let query = format!(
            "INSERT INTO clients (email, password_hash, company_name, public_key, request_limit) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let client = sqlx::query_as::<_, ClientDBResponse>(&query)
            .bind(&request.email)
            .bind(&request.password_hash)
            .bind(&request.company_name)
            .bind(&request.public_key)
            .bind(request.request_limit)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(client)
    }

    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ClientId) -> Result<Option<ClientDBResponse>> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        let client = sqlx::query_as::<_, ClientDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(client)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<ClientDBResponse>> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE email = $1");
        let client = sqlx::query_as::<_, ClientDBResponse>(&query)
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(client)
    }

    /// Resolve an embed public key to its client. Malformed keys simply fail
    /// to match; callers map both outcomes to the same generic error.
    #[instrument(skip_all, err)]
    pub async fn get_by_public_key(&mut self, public_key: &str) -> Result<Option<ClientDBResponse>> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE public_key = $1");
        let client = sqlx::query_as::<_, ClientDBResponse>(&query)
            .bind(public_key)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(client)
    }

    #[instrument(skip(self, request), fields(client_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: ClientId, request: &ClientUpdateDBRequest) -> Result<ClientDBResponse> {
        let query = format!(
            "UPDATE clients \
             SET company_name = COALESCE($2, company_name), \
                 allowed_domains = COALESCE($3, allowed_domains), \
                 subscription_status = COALESCE($4, subscription_status), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let client = sqlx::query_as::<_, ClientDBResponse>(&query)
            .bind(id)
            .bind(&request.company_name)
            .bind(&request.allowed_domains)
            .bind(&request.subscription_status)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(client)
    }

    /// Count one embed request against the monthly quota and return
    /// `(monthly_requests, request_limit)` after the increment. A single
    /// statement, so concurrent embeds cannot double-spend the last slot.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&id)), err)]
    pub async fn record_embed_request(&mut self, id: ClientId) -> Result<(i32, i32)> {
        let row: (i32, i32) = sqlx::query_as(
            "UPDATE clients SET monthly_requests = monthly_requests + 1 \
             WHERE id = $1 \
             RETURNING monthly_requests, request_limit",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row)
    }

    /// Lock the client row for the duration of the surrounding transaction
    /// and return its purchased block count. Used by the guarded
    /// primary-option create so concurrent creates serialize on the owner.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_charged_blocks(&mut self, id: ClientId) -> Result<i32> {
        let row: (i32,) = sqlx::query_as("SELECT charged_blocks FROM clients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(row.0)
    }
}
