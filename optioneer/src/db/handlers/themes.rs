//! Repository for themes.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::themes::{ThemeCreateDBRequest, ThemeDBResponse, ThemeUpdateDBRequest};
use crate::types::{abbrev_uuid, ClientId, ThemeId};

const COLUMNS: &str = "id, client_id, name, primary_color, secondary_color, accent_color, background_color, \
     surface_color, text_color, text_color_mode, custom_text_color, font_family, border_radius, \
     spacing_unit, max_width, is_default, is_active, created_at, updated_at";

/// Filter for listing themes
#[derive(Debug, Clone)]
pub struct ThemeFilter {
    pub client_id: ClientId,
}

pub struct Themes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Themes<'c> {
    type CreateRequest = ThemeCreateDBRequest;
    type UpdateRequest = ThemeUpdateDBRequest;
    type Response = ThemeDBResponse;
    type Id = ThemeId;
    type Filter = ThemeFilter;

    #[instrument(skip(self, request), fields(client_id = %abbrev_uuid(&request.client_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO themes (client_id, name, primary_color, secondary_color, accent_color, \
                 background_color, surface_color, text_color, text_color_mode, custom_text_color, \
                 font_family, border_radius, spacing_unit, max_width, is_default, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {COLUMNS}"
        );
        let theme = sqlx::query_as::<_, ThemeDBResponse>(&query)
            .bind(request.client_id)
            .bind(&request.name)
            .bind(&request.primary_color)
            .bind(&request.secondary_color)
            .bind(&request.accent_color)
            .bind(&request.background_color)
            .bind(&request.surface_color)
            .bind(&request.text_color)
            .bind(request.text_color_mode)
            .bind(&request.custom_text_color)
            .bind(&request.font_family)
            .bind(&request.border_radius)
            .bind(&request.spacing_unit)
            .bind(&request.max_width)
            .bind(request.is_default)
            .bind(request.is_active)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(theme)
    }

    #[instrument(skip(self), fields(theme_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM themes WHERE id = $1");
        let theme = sqlx::query_as::<_, ThemeDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(theme)
    }

    #[instrument(skip(self, filter), fields(client_id = %abbrev_uuid(&filter.client_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM themes WHERE client_id = $1 ORDER BY created_at");
        let themes = sqlx::query_as::<_, ThemeDBResponse>(&query)
            .bind(filter.client_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(themes)
    }

    #[instrument(skip(self), fields(theme_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM themes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(theme_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "UPDATE themes \
             SET name = COALESCE($2, name), \
                 primary_color = COALESCE($3, primary_color), \
                 secondary_color = COALESCE($4, secondary_color), \
                 accent_color = COALESCE($5, accent_color), \
                 background_color = COALESCE($6, background_color), \
                 surface_color = COALESCE($7, surface_color), \
                 text_color = COALESCE($8, text_color), \
                 text_color_mode = COALESCE($9, text_color_mode), \
                 custom_text_color = COALESCE($10, custom_text_color), \
                 font_family = COALESCE($11, font_family), \
                 border_radius = COALESCE($12, border_radius), \
                 spacing_unit = COALESCE($13, spacing_unit), \
                 max_width = COALESCE($14, max_width), \
                 is_default = COALESCE($15, is_default), \
                 is_active = COALESCE($16, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let theme = sqlx::query_as::<_, ThemeDBResponse>(&query)
            .bind(id)
            .bind(&request.name)
            .bind(&request.primary_color)
            .bind(&request.secondary_color)
            .bind(&request.accent_color)
            .bind(&request.background_color)
            .bind(&request.surface_color)
            .bind(&request.text_color)
            .bind(request.text_color_mode)
            .bind(&request.custom_text_color)
            .bind(&request.font_family)
            .bind(&request.border_radius)
            .bind(&request.spacing_unit)
            .bind(&request.max_width)
            .bind(request.is_default)
            .bind(request.is_active)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(theme)
    }
}

impl<'c> Themes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// The client's active theme: active themes first by default flag, then
    /// recency. One default+active theme per client is advisory, so ties are
    /// broken deterministically here.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn get_active_for_client(&mut self, client_id: ClientId) -> Result<Option<ThemeDBResponse>> {
        let query = format!(
            "SELECT {COLUMNS} FROM themes \
             WHERE client_id = $1 AND is_active \
             ORDER BY is_default DESC, updated_at DESC \
             LIMIT 1"
        );
        let theme = sqlx::query_as::<_, ThemeDBResponse>(&query)
            .bind(client_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(theme)
    }

    /// Delete all of a client's themes and re-provision the platform default.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn reset_for_client(&mut self, client_id: ClientId) -> Result<ThemeDBResponse> {
        sqlx::query("DELETE FROM themes WHERE client_id = $1")
            .bind(client_id)
            .execute(&mut *self.db)
            .await?;

        self.create(&ThemeCreateDBRequest::default_for(client_id)).await
    }
}
