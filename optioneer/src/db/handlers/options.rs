//! Repository for product options and their relation edges.
//!
//! Incompatibility edges are symmetric and written in both directions;
//! dependency edges are directed. Edge creation silently refuses targets
//! outside the option's configurator (the caller decides whether to surface
//! the skip).

use sqlx::{FromRow, PgConnection};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::options::{OptionCreateDBRequest, OptionDBResponse, OptionUpdateDBRequest, OptionWithEdges};
use crate::types::{abbrev_uuid, CategoryId, ClientId, ConfiguratorId, OptionId};

const COLUMNS: &str = "id, category_id, label, description, price, sku, image_url, is_default, created_at, updated_at";

/// Filter for listing options
#[derive(Debug, Clone)]
pub struct OptionFilter {
    pub category_id: CategoryId,
}

/// An option joined with its configurator and owning client, for ownership
/// checks and edge validation.
#[derive(Debug, Clone, FromRow)]
pub struct OptionWithOwner {
    #[sqlx(flatten)]
    pub option: OptionDBResponse,
    pub configurator_id: ConfiguratorId,
    pub owner_client_id: ClientId,
}

pub struct Options<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Options<'c> {
    type CreateRequest = OptionCreateDBRequest;
    type UpdateRequest = OptionUpdateDBRequest;
    type Response = OptionDBResponse;
    type Id = OptionId;
    type Filter = OptionFilter;

    #[instrument(skip(self, request), fields(label = %request.label), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO options (category_id, label, description, price, sku, image_url, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let option = sqlx::query_as::<_, OptionDBResponse>(&query)
            .bind(request.category_id)
            .bind(&request.label)
            .bind(&request.description)
            .bind(request.price)
            .bind(&request.sku)
            .bind(&request.image_url)
            .bind(request.is_default)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(option)
    }

    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM options WHERE id = $1");
        let option = sqlx::query_as::<_, OptionDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(option)
    }

    #[instrument(skip(self, filter), fields(category_id = %abbrev_uuid(&filter.category_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM options WHERE category_id = $1 ORDER BY created_at");
        let options = sqlx::query_as::<_, OptionDBResponse>(&query)
            .bind(filter.category_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(options)
    }

    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM options WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(option_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "UPDATE options \
             SET label = COALESCE($2, label), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 sku = COALESCE($5, sku), \
                 image_url = COALESCE($6, image_url), \
                 is_default = COALESCE($7, is_default), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let option = sqlx::query_as::<_, OptionDBResponse>(&query)
            .bind(id)
            .bind(&request.label)
            .bind(&request.description)
            .bind(request.price)
            .bind(&request.sku)
            .bind(&request.image_url)
            .bind(request.is_default)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(option)
    }
}

impl<'c> Options<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch an option with its configurator and owning client, for ownership
    /// checks at the handler boundary.
    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&id)), err)]
    pub async fn get_with_owner(&mut self, id: OptionId) -> Result<Option<OptionWithOwner>> {
        let query = "SELECT o.id, o.category_id, o.label, o.description, o.price, o.sku, o.image_url, \
                    o.is_default, o.created_at, o.updated_at, \
                    c.configurator_id, cf.client_id AS owner_client_id \
             FROM options o \
             JOIN categories c ON o.category_id = c.id \
             JOIN configurators cf ON c.configurator_id = cf.id \
             WHERE o.id = $1";
        let option = sqlx::query_as::<_, OptionWithOwner>(query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(option)
    }

    /// Fetch an option together with its outgoing edges.
    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&id)), err)]
    pub async fn get_with_edges(&mut self, id: OptionId) -> Result<Option<OptionWithEdges>> {
        let Some(option) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let incompatible_with = self.incompatibilities_for(id).await?;
        let depends_on = self.dependencies_for(id).await?;

        Ok(Some(OptionWithEdges {
            option,
            incompatible_with,
            depends_on,
        }))
    }

    pub async fn incompatibilities_for(&mut self, id: OptionId) -> Result<Vec<OptionId>> {
        let rows: Vec<(OptionId,)> =
            sqlx::query_as("SELECT incompatible_with_id FROM option_incompatibilities WHERE option_id = $1 ORDER BY created_at")
                .bind(id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn dependencies_for(&mut self, id: OptionId) -> Result<Vec<OptionId>> {
        let rows: Vec<(OptionId,)> =
            sqlx::query_as("SELECT depends_on_id FROM option_dependencies WHERE option_id = $1 ORDER BY created_at")
                .bind(id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Add a symmetric incompatibility edge between two options.
    ///
    /// Returns `Ok(false)` without writing anything when the target does not
    /// exist or belongs to a different configurator; bulk assignment at
    /// option creation keeps processing the rest of the list.
    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&option_id), other = %abbrev_uuid(&other_id)), err)]
    pub async fn add_incompatibility(&mut self, option_id: OptionId, other_id: OptionId) -> Result<bool> {
        if option_id == other_id {
            return Ok(false);
        }
        if !self.same_configurator(option_id, other_id).await? {
            return Ok(false);
        }

        // Both directions so the relation is queryable from either side
        sqlx::query(
            "INSERT INTO option_incompatibilities (option_id, incompatible_with_id) \
             VALUES ($1, $2), ($2, $1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(option_id)
        .bind(other_id)
        .execute(&mut *self.db)
        .await?;

        Ok(true)
    }

    /// Remove an incompatibility edge (both directions).
    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&option_id), other = %abbrev_uuid(&other_id)), err)]
    pub async fn remove_incompatibility(&mut self, option_id: OptionId, other_id: OptionId) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM option_incompatibilities \
             WHERE (option_id = $1 AND incompatible_with_id = $2) \
                OR (option_id = $2 AND incompatible_with_id = $1)",
        )
        .bind(option_id)
        .bind(other_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a directed dependency edge: `option_id` requires `depends_on_id`.
    /// Same silent-skip contract as [`Options::add_incompatibility`].
    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&option_id), depends_on = %abbrev_uuid(&depends_on_id)), err)]
    pub async fn add_dependency(&mut self, option_id: OptionId, depends_on_id: OptionId) -> Result<bool> {
        if option_id == depends_on_id {
            return Ok(false);
        }
        if !self.same_configurator(option_id, depends_on_id).await? {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO option_dependencies (option_id, depends_on_id, relation_type) \
             VALUES ($1, $2, 'requires') \
             ON CONFLICT DO NOTHING",
        )
        .bind(option_id)
        .bind(depends_on_id)
        .execute(&mut *self.db)
        .await?;

        Ok(true)
    }

    #[instrument(skip(self), fields(option_id = %abbrev_uuid(&option_id), depends_on = %abbrev_uuid(&depends_on_id)), err)]
    pub async fn remove_dependency(&mut self, option_id: OptionId, depends_on_id: OptionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM option_dependencies WHERE option_id = $1 AND depends_on_id = $2")
            .bind(option_id)
            .bind(depends_on_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count primary options across all of a client's configurators. Run
    /// inside the create transaction after locking the client row so the
    /// count cannot race a concurrent create.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn count_primary_for_client(&mut self, client_id: ClientId) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM options o \
             JOIN categories c ON o.category_id = c.id \
             JOIN configurators cf ON c.configurator_id = cf.id \
             WHERE cf.client_id = $1 AND c.is_primary",
        )
        .bind(client_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Whether two options exist and live in the same configurator.
    async fn same_configurator(&mut self, a: OptionId, b: OptionId) -> Result<bool> {
        let rows: Vec<(OptionId, ConfiguratorId)> = sqlx::query_as(
            "SELECT o.id, c.configurator_id FROM options o \
             JOIN categories c ON o.category_id = c.id \
             WHERE o.id = ANY($1)",
        )
        .bind(vec![a, b])
        .fetch_all(&mut *self.db)
        .await?;

        let configurator_of = |id: OptionId| rows.iter().find(|(row_id, _)| *row_id == id).map(|(_, cfg)| *cfg);

        Ok(match (configurator_of(a), configurator_of(b)) {
            (Some(cfg_a), Some(cfg_b)) => cfg_a == cfg_b,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_incompatibility_is_stored_both_ways(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;
        let category = create_test_category(&pool, configurator.id, false, false).await;
        let a = create_test_option(&pool, category.id, "Steel", "10.00").await;
        let b = create_test_option(&pool, category.id, "Carbon", "20.00").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Options::new(&mut conn);

        assert!(repo.add_incompatibility(a.id, b.id).await.unwrap());

        // Queryable from either side
        assert_eq!(repo.incompatibilities_for(a.id).await.unwrap(), vec![b.id]);
        assert_eq!(repo.incompatibilities_for(b.id).await.unwrap(), vec![a.id]);

        // Re-adding is a no-op, not an error
        assert!(repo.add_incompatibility(b.id, a.id).await.unwrap());
        assert_eq!(repo.incompatibilities_for(a.id).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn test_cross_configurator_edge_is_skipped(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator_a = create_test_configurator(&pool, client.id, false).await;
        let configurator_b = create_test_configurator(&pool, client.id, false).await;
        let category_a = create_test_category(&pool, configurator_a.id, false, false).await;
        let category_b = create_test_category(&pool, configurator_b.id, false, false).await;
        let a = create_test_option(&pool, category_a.id, "Here", "10.00").await;
        let b = create_test_option(&pool, category_b.id, "Elsewhere", "10.00").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Options::new(&mut conn);

        // Cross-configurator and missing targets both report a skip
        assert!(!repo.add_incompatibility(a.id, b.id).await.unwrap());
        assert!(!repo.add_incompatibility(a.id, uuid::Uuid::new_v4()).await.unwrap());
        assert!(!repo.add_dependency(a.id, b.id).await.unwrap());

        assert!(repo.incompatibilities_for(a.id).await.unwrap().is_empty());
        assert!(repo.dependencies_for(a.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_dependency_is_directed(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;
        let category = create_test_category(&pool, configurator.id, false, false).await;
        let rack = create_test_option(&pool, category.id, "Roof rack", "50.00").await;
        let rails = create_test_option(&pool, category.id, "Rail kit", "30.00").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Options::new(&mut conn);

        assert!(repo.add_dependency(rack.id, rails.id).await.unwrap());

        assert_eq!(repo.dependencies_for(rack.id).await.unwrap(), vec![rails.id]);
        // No reverse edge
        assert!(repo.dependencies_for(rails.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_count_primary_spans_all_configurators(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let other_client = create_test_client(&pool, &[]).await;

        let cfg_a = create_test_configurator(&pool, client.id, false).await;
        let cfg_b = create_test_configurator(&pool, client.id, false).await;
        let primary_a = create_test_category(&pool, cfg_a.id, true, false).await;
        let primary_b = create_test_category(&pool, cfg_b.id, true, false).await;
        let secondary = create_test_category(&pool, cfg_a.id, false, false).await;

        create_test_option(&pool, primary_a.id, "One", "1.00").await;
        create_test_option(&pool, primary_a.id, "Two", "1.00").await;
        create_test_option(&pool, primary_b.id, "Three", "1.00").await;
        // Non-primary options never count
        create_test_option(&pool, secondary.id, "Free", "1.00").await;

        // Another tenant's options never count either
        let other_cfg = create_test_configurator(&pool, other_client.id, false).await;
        let other_primary = create_test_category(&pool, other_cfg.id, true, false).await;
        create_test_option(&pool, other_primary.id, "Foreign", "1.00").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Options::new(&mut conn);

        assert_eq!(repo.count_primary_for_client(client.id).await.unwrap(), 3);
        assert_eq!(repo.count_primary_for_client(other_client.id).await.unwrap(), 1);
    }
}
