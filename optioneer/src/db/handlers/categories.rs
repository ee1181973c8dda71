//! Repository for categories.

use sqlx::{FromRow, PgConnection};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest};
use crate::types::{abbrev_uuid, CategoryId, ClientId, ConfiguratorId};

const COLUMNS: &str = "id, configurator_id, name, category_type, position, is_primary, is_required, created_at, updated_at";

/// Filter for listing categories
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub configurator_id: ConfiguratorId,
}

/// A category joined with its owning client, for ownership checks.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryWithOwner {
    #[sqlx(flatten)]
    pub category: CategoryDBResponse,
    pub owner_client_id: ClientId,
}

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    /// Create a category. When `is_primary` is not stated explicitly, the
    /// first category of a configurator becomes primary and later ones do
    /// not.
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let is_primary = match request.is_primary {
            Some(explicit) => explicit,
            None => {
                let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories WHERE configurator_id = $1")
                    .bind(request.configurator_id)
                    .fetch_one(&mut *self.db)
                    .await?;
                existing == 0
            }
        };

        let query = format!(
            "INSERT INTO categories (configurator_id, name, category_type, position, is_primary, is_required) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, CategoryDBResponse>(&query)
            .bind(request.configurator_id)
            .bind(&request.name)
            .bind(request.category_type)
            .bind(request.position)
            .bind(is_primary)
            .bind(request.is_required)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        let category = sqlx::query_as::<_, CategoryDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }

    #[instrument(skip(self, filter), fields(configurator_id = %abbrev_uuid(&filter.configurator_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE configurator_id = $1 ORDER BY position, created_at");
        let categories = sqlx::query_as::<_, CategoryDBResponse>(&query)
            .bind(filter.configurator_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories)
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "UPDATE categories \
             SET name = COALESCE($2, name), \
                 category_type = COALESCE($3, category_type), \
                 position = COALESCE($4, position), \
                 is_primary = COALESCE($5, is_primary), \
                 is_required = COALESCE($6, is_required), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, CategoryDBResponse>(&query)
            .bind(id)
            .bind(&request.name)
            .bind(request.category_type)
            .bind(request.position)
            .bind(request.is_primary)
            .bind(request.is_required)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(category)
    }
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch a category with its owning client id, for ownership checks at
    /// the handler boundary.
    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    pub async fn get_with_owner(&mut self, id: CategoryId) -> Result<Option<CategoryWithOwner>> {
        let query = "SELECT c.id, c.configurator_id, c.name, c.category_type, c.position, c.is_primary, \
                    c.is_required, c.created_at, c.updated_at, cf.client_id AS owner_client_id \
             FROM categories c \
             JOIN configurators cf ON c.configurator_id = cf.id \
             WHERE c.id = $1";
        let category = sqlx::query_as::<_, CategoryWithOwner>(query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_first_category_defaults_to_primary(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let first = repo
            .create(&CategoryCreateDBRequest {
                configurator_id: configurator.id,
                name: "Frame".to_string(),
                category_type: crate::db::models::categories::CategoryType::Generic,
                position: 0,
                is_primary: None,
                is_required: false,
            })
            .await
            .unwrap();
        assert!(first.is_primary, "first category should default to primary");

        let second = repo
            .create(&CategoryCreateDBRequest {
                configurator_id: configurator.id,
                name: "Color".to_string(),
                category_type: crate::db::models::categories::CategoryType::Color,
                position: 1,
                is_primary: None,
                is_required: false,
            })
            .await
            .unwrap();
        assert!(!second.is_primary, "later categories should not default to primary");
    }

    #[sqlx::test]
    async fn test_explicit_primary_flag_wins(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let first = repo
            .create(&CategoryCreateDBRequest {
                configurator_id: configurator.id,
                name: "Accessories".to_string(),
                category_type: crate::db::models::categories::CategoryType::Accessory,
                position: 0,
                is_primary: Some(false),
                is_required: false,
            })
            .await
            .unwrap();
        assert!(!first.is_primary);
    }

    #[sqlx::test]
    async fn test_get_with_owner_joins_the_client(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;
        let category = create_test_category(&pool, configurator.id, true, false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let found = repo.get_with_owner(category.id).await.unwrap().unwrap();
        assert_eq!(found.owner_client_id, client.id);
        assert_eq!(found.category.id, category.id);
    }
}
