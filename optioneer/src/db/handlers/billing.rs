//! Repository for capacity-block purchases.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::billing::{BlockPurchaseCreateDBRequest, BlockPurchaseDBResponse};
use crate::types::{abbrev_uuid, ClientId};

const COLUMNS: &str = "id, client_id, session_id, blocks, amount, created_at";

pub struct BlockPurchases<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BlockPurchases<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fulfill a verified payment session: record the purchase and raise the
    /// client's block count.
    ///
    /// Idempotent - the unique session id makes a webhook replay or duplicate
    /// verification call return `Ok(false)` without touching the counter.
    /// Run inside a transaction so the ledger row and the counter move
    /// together.
    #[instrument(skip(self, request), fields(client_id = %abbrev_uuid(&request.client_id), session_id = %request.session_id), err)]
    pub async fn fulfill(&mut self, request: &BlockPurchaseCreateDBRequest) -> Result<bool> {
        let query = format!(
            "INSERT INTO block_purchases (client_id, session_id, blocks, amount) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (session_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, BlockPurchaseDBResponse>(&query)
            .bind(request.client_id)
            .bind(&request.session_id)
            .bind(request.blocks)
            .bind(request.amount)
            .fetch_optional(&mut *self.db)
            .await?;

        let Some(purchase) = inserted else {
            tracing::info!("payment session already processed, skipping");
            return Ok(false);
        };

        sqlx::query("UPDATE clients SET charged_blocks = charged_blocks + $2, updated_at = NOW() WHERE id = $1")
            .bind(purchase.client_id)
            .bind(purchase.blocks)
            .execute(&mut *self.db)
            .await?;

        Ok(true)
    }

    /// Purchase history for a client, newest first.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn list_for_client(&mut self, client_id: ClientId) -> Result<Vec<BlockPurchaseDBResponse>> {
        let query = format!("SELECT {COLUMNS} FROM block_purchases WHERE client_id = $1 ORDER BY created_at DESC");
        let purchases = sqlx::query_as::<_, BlockPurchaseDBResponse>(&query)
            .bind(client_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(purchases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Clients;
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_fulfill_increments_blocks_once(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        assert_eq!(client.charged_blocks, 0);

        let request = BlockPurchaseCreateDBRequest {
            client_id: client.id,
            session_id: "cs_test_123".to_string(),
            blocks: 1,
            amount: Decimal::from_str_exact("29.00").unwrap(),
        };

        let mut conn = pool.acquire().await.unwrap();
        let mut purchases = BlockPurchases::new(&mut conn);

        assert!(purchases.fulfill(&request).await.unwrap());
        // Webhook replay or duplicate verification call: same session id
        assert!(!purchases.fulfill(&request).await.unwrap());

        let mut clients = Clients::new(&mut conn);
        let reloaded = clients.get_by_id(client.id).await.unwrap().unwrap();
        assert_eq!(reloaded.charged_blocks, 1);

        let history = {
            let mut purchases = BlockPurchases::new(&mut conn);
            purchases.list_for_client(client.id).await.unwrap()
        };
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].session_id, "cs_test_123");
    }

    #[sqlx::test]
    async fn test_distinct_sessions_accumulate(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut purchases = BlockPurchases::new(&mut conn);

        for session in ["cs_a", "cs_b", "cs_c"] {
            assert!(purchases
                .fulfill(&BlockPurchaseCreateDBRequest {
                    client_id: client.id,
                    session_id: session.to_string(),
                    blocks: 1,
                    amount: Decimal::from_str_exact("29.00").unwrap(),
                })
                .await
                .unwrap());
        }

        let mut clients = Clients::new(&mut conn);
        let reloaded = clients.get_by_id(client.id).await.unwrap().unwrap();
        assert_eq!(reloaded.charged_blocks, 3);
    }
}
