//! Repository for quotes.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::quotes::{QuoteCreateDBRequest, QuoteDBResponse, QuoteStatus, QuoteUpdateDBRequest};
use crate::types::{abbrev_uuid, ClientId, QuoteId};

const COLUMNS: &str = "id, client_id, configurator_id, quote_code, customer_name, customer_email, \
     customer_phone, customer_company, customer_message, selected_options, configuration, \
     total_price, currency_code, status, open_count, last_opened_at, created_at, updated_at";

/// Filter for listing quotes
#[derive(Debug, Clone)]
pub struct QuoteFilter {
    pub client_id: ClientId,
    pub status: Option<QuoteStatus>,
    pub skip: i64,
    pub limit: i64,
}

pub struct Quotes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Quotes<'c> {
    type CreateRequest = QuoteCreateDBRequest;
    type UpdateRequest = QuoteUpdateDBRequest;
    type Response = QuoteDBResponse;
    type Id = QuoteId;
    type Filter = QuoteFilter;

    #[instrument(skip(self, request), fields(quote_code = %request.quote_code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO quotes (client_id, configurator_id, quote_code, customer_name, customer_email, \
                 customer_phone, customer_company, customer_message, selected_options, configuration, \
                 total_price, currency_code, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending') \
             RETURNING {COLUMNS}"
        );
        let quote = sqlx::query_as::<_, QuoteDBResponse>(&query)
            .bind(request.client_id)
            .bind(request.configurator_id)
            .bind(&request.quote_code)
            .bind(&request.customer_name)
            .bind(&request.customer_email)
            .bind(&request.customer_phone)
            .bind(&request.customer_company)
            .bind(&request.customer_message)
            .bind(&request.selected_options)
            .bind(&request.configuration)
            .bind(request.total_price)
            .bind(&request.currency_code)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(quote)
    }

    #[instrument(skip(self), fields(quote_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM quotes WHERE id = $1");
        let quote = sqlx::query_as::<_, QuoteDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(quote)
    }

    #[instrument(skip(self, filter), fields(client_id = %abbrev_uuid(&filter.client_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let quotes = if let Some(status) = filter.status {
            let query = format!(
                "SELECT {COLUMNS} FROM quotes WHERE client_id = $1 AND status = $2 \
                 ORDER BY created_at DESC LIMIT $3 OFFSET $4"
            );
            sqlx::query_as::<_, QuoteDBResponse>(&query)
                .bind(filter.client_id)
                .bind(status)
                .bind(filter.limit)
                .bind(filter.skip)
                .fetch_all(&mut *self.db)
                .await?
        } else {
            let query = format!(
                "SELECT {COLUMNS} FROM quotes WHERE client_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            );
            sqlx::query_as::<_, QuoteDBResponse>(&query)
                .bind(filter.client_id)
                .bind(filter.limit)
                .bind(filter.skip)
                .fetch_all(&mut *self.db)
                .await?
        };

        Ok(quotes)
    }

    #[instrument(skip(self), fields(quote_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(quote_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "UPDATE quotes \
             SET status = COALESCE($2, status), \
                 customer_name = COALESCE($3, customer_name), \
                 customer_phone = COALESCE($4, customer_phone), \
                 customer_company = COALESCE($5, customer_company), \
                 customer_message = COALESCE($6, customer_message), \
                 total_price = COALESCE($7, total_price), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let quote = sqlx::query_as::<_, QuoteDBResponse>(&query)
            .bind(id)
            .bind(request.status)
            .bind(&request.customer_name)
            .bind(&request.customer_phone)
            .bind(&request.customer_company)
            .bind(&request.customer_message)
            .bind(request.total_price)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(quote)
    }
}

impl<'c> Quotes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Public lookup by quote code. Bumps the open counter and stamps the
    /// open time in the same statement as the read - the code itself is the
    /// capability, so there is no auth here.
    #[instrument(skip(self, quote_code), err)]
    pub async fn get_by_code_and_touch(&mut self, quote_code: &str) -> Result<Option<QuoteDBResponse>> {
        let query = format!(
            "UPDATE quotes \
             SET open_count = open_count + 1, last_opened_at = NOW() \
             WHERE quote_code = $1 \
             RETURNING {COLUMNS}"
        );
        let quote = sqlx::query_as::<_, QuoteDBResponse>(&query)
            .bind(quote_code)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn create_quote_for(pool: &PgPool, client_id: crate::types::ClientId) -> QuoteDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Quotes::new(&mut conn);

        repo.create(&QuoteCreateDBRequest {
            client_id,
            configurator_id: None,
            quote_code: crypto::generate_quote_code(),
            customer_name: Some("Ada".to_string()),
            customer_email: "ada@customer.example".to_string(),
            customer_phone: None,
            customer_company: None,
            customer_message: None,
            selected_options: serde_json::json!({}),
            configuration: serde_json::json!({}),
            total_price: Decimal::from_str_exact("149.99").unwrap(),
            currency_code: "USD".to_string(),
        })
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_quote_starts_pending(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let quote = create_quote_for(&pool, client.id).await;

        assert_eq!(quote.status, QuoteStatus::Pending);
        assert_eq!(quote.open_count, 0);
        assert!(quote.last_opened_at.is_none());
    }

    #[sqlx::test]
    async fn test_public_read_bumps_open_counter(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let quote = create_quote_for(&pool, client.id).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Quotes::new(&mut conn);

        let first = repo.get_by_code_and_touch(&quote.quote_code).await.unwrap().unwrap();
        assert_eq!(first.open_count, 1);
        assert!(first.last_opened_at.is_some());

        let second = repo.get_by_code_and_touch(&quote.quote_code).await.unwrap().unwrap();
        assert_eq!(second.open_count, 2);

        assert!(repo.get_by_code_and_touch("Q-NOPE-XXXXXX").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_status_filter(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let quote = create_quote_for(&pool, client.id).await;
        create_quote_for(&pool, client.id).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Quotes::new(&mut conn);

        repo.update(
            quote.id,
            &QuoteUpdateDBRequest {
                status: Some(QuoteStatus::Accepted),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let accepted = repo
            .list(&QuoteFilter {
                client_id: client.id,
                status: Some(QuoteStatus::Accepted),
                skip: 0,
                limit: 100,
            })
            .await
            .unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, quote.id);

        let all = repo
            .list(&QuoteFilter {
                client_id: client.id,
                status: None,
                skip: 0,
                limit: 100,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
