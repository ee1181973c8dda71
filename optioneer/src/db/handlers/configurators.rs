//! Repository for configurators, including the embed-scoped lookup and the
//! catalog loader used by selection validation and pricing.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::configurators::{ConfiguratorCreateDBRequest, ConfiguratorDBResponse, ConfiguratorUpdateDBRequest};
use crate::db::models::options::OptionDBResponse;
use crate::selection::{CatalogCategory, CatalogOption};
use crate::types::{abbrev_uuid, CategoryId, ClientId, ConfiguratorId, OptionId};

const COLUMNS: &str = "id, client_id, public_id, name, description, currency_code, currency_symbol, \
     published, theme_id, created_at, updated_at";

/// Filter for listing configurators
#[derive(Debug, Clone)]
pub struct ConfiguratorFilter {
    pub client_id: ClientId,
    pub skip: i64,
    pub limit: i64,
}

pub struct Configurators<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Configurators<'c> {
    type CreateRequest = ConfiguratorCreateDBRequest;
    type UpdateRequest = ConfiguratorUpdateDBRequest;
    type Response = ConfiguratorDBResponse;
    type Id = ConfiguratorId;
    type Filter = ConfiguratorFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO configurators (client_id, public_id, name, description, currency_code, currency_symbol) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let configurator = sqlx::query_as::<_, ConfiguratorDBResponse>(&query)
            .bind(request.client_id)
            .bind(&request.public_id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.currency_code)
            .bind(&request.currency_symbol)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(configurator)
    }

    #[instrument(skip(self), fields(configurator_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM configurators WHERE id = $1");
        let configurator = sqlx::query_as::<_, ConfiguratorDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(configurator)
    }

    #[instrument(skip(self, filter), fields(client_id = %abbrev_uuid(&filter.client_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            "SELECT {COLUMNS} FROM configurators WHERE client_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let configurators = sqlx::query_as::<_, ConfiguratorDBResponse>(&query)
            .bind(filter.client_id)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(configurators)
    }

    #[instrument(skip(self), fields(configurator_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM configurators WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(configurator_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // theme_id uses a sentinel flag since "set to NULL" and "leave alone"
        // both arrive as Option
        let (set_theme, theme_id) = match &request.theme_id {
            Some(value) => (true, *value),
            None => (false, None),
        };

        let query = format!(
            "UPDATE configurators \
             SET name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 currency_code = COALESCE($4, currency_code), \
                 currency_symbol = COALESCE($5, currency_symbol), \
                 published = COALESCE($6, published), \
                 theme_id = CASE WHEN $7 THEN $8 ELSE theme_id END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let configurator = sqlx::query_as::<_, ConfiguratorDBResponse>(&query)
            .bind(id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.currency_code)
            .bind(&request.currency_symbol)
            .bind(request.published)
            .bind(set_theme)
            .bind(theme_id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(configurator)
    }
}

impl<'c> Configurators<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Embed-scoped lookup: the configurator must match both the public id
    /// and the key-resolved client, so a valid key for one client can never
    /// retrieve another client's configurator.
    #[instrument(skip(self, public_id), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn get_published_for_embed(&mut self, public_id: &str, client_id: ClientId) -> Result<Option<ConfiguratorDBResponse>> {
        let query = format!("SELECT {COLUMNS} FROM configurators WHERE public_id = $1 AND client_id = $2 AND published = TRUE");
        let configurator = sqlx::query_as::<_, ConfiguratorDBResponse>(&query)
            .bind(public_id)
            .bind(client_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(configurator)
    }

    /// Load the full catalog view (categories in position order, options,
    /// relation edges) for selection validation and pricing.
    #[instrument(skip(self), fields(configurator_id = %abbrev_uuid(&configurator_id)), err)]
    pub async fn load_catalog(&mut self, configurator_id: ConfiguratorId) -> Result<Vec<CatalogCategory>> {
        let category_rows: Vec<(CategoryId, String, bool)> = sqlx::query_as(
            "SELECT id, name, is_required FROM categories \
             WHERE configurator_id = $1 ORDER BY position, created_at",
        )
        .bind(configurator_id)
        .fetch_all(&mut *self.db)
        .await?;

        let option_rows: Vec<OptionDBResponse> = sqlx::query_as(
            "SELECT o.id, o.category_id, o.label, o.description, o.price, o.sku, o.image_url, \
                    o.is_default, o.created_at, o.updated_at \
             FROM options o \
             JOIN categories c ON o.category_id = c.id \
             WHERE c.configurator_id = $1 \
             ORDER BY o.created_at",
        )
        .bind(configurator_id)
        .fetch_all(&mut *self.db)
        .await?;

        let incompatibility_rows: Vec<(OptionId, OptionId)> = sqlx::query_as(
            "SELECT i.option_id, i.incompatible_with_id \
             FROM option_incompatibilities i \
             JOIN options o ON i.option_id = o.id \
             JOIN categories c ON o.category_id = c.id \
             WHERE c.configurator_id = $1",
        )
        .bind(configurator_id)
        .fetch_all(&mut *self.db)
        .await?;

        let dependency_rows: Vec<(OptionId, OptionId)> = sqlx::query_as(
            "SELECT d.option_id, d.depends_on_id \
             FROM option_dependencies d \
             JOIN options o ON d.option_id = o.id \
             JOIN categories c ON o.category_id = c.id \
             WHERE c.configurator_id = $1",
        )
        .bind(configurator_id)
        .fetch_all(&mut *self.db)
        .await?;

        let mut categories: Vec<CatalogCategory> = category_rows
            .into_iter()
            .map(|(id, name, is_required)| CatalogCategory {
                id,
                name,
                is_required,
                options: Vec::new(),
            })
            .collect();

        for option in option_rows {
            let incompatible_with = incompatibility_rows
                .iter()
                .filter(|(from, _)| *from == option.id)
                .map(|(_, to)| *to)
                .collect();
            let depends_on = dependency_rows
                .iter()
                .filter(|(from, _)| *from == option.id)
                .map(|(_, to)| *to)
                .collect();

            if let Some(category) = categories.iter_mut().find(|c| c.id == option.category_id) {
                category.options.push(CatalogOption {
                    id: option.id,
                    label: option.label,
                    price: option.price,
                    incompatible_with,
                    depends_on,
                });
            }
        }

        Ok(categories)
    }
}
