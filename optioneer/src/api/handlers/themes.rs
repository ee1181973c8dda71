//! Dashboard theme management.
//!
//! `GET /themes/active` auto-creates the platform default when a client has
//! no theme yet, so the dashboard never renders without one. `PUT /themes`
//! has create-or-update semantics: with an id it updates that theme, without
//! one it updates the active theme or creates a fresh one.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::{
        clients::CurrentClient,
        envelope::ApiResponse,
        themes::{ThemeResponse, ThemeUpsert},
    },
    db::handlers::{themes::ThemeFilter, Repository, Themes},
    db::models::themes::{ThemeCreateDBRequest, ThemeDBResponse, ThemeUpdateDBRequest},
    errors::{Error, Result},
    types::ThemeId,
    AppState,
};

async fn get_owned(repo: &mut Themes<'_>, id: ThemeId, current: &CurrentClient) -> Result<ThemeDBResponse> {
    let theme = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Theme".to_string(),
        id: id.to_string(),
    })?;

    if theme.client_id != current.id {
        return Err(Error::NotFound {
            resource: "Theme".to_string(),
            id: id.to_string(),
        });
    }

    Ok(theme)
}

fn update_from_upsert(request: ThemeUpsert) -> ThemeUpdateDBRequest {
    ThemeUpdateDBRequest {
        name: request.name,
        primary_color: request.primary_color,
        secondary_color: request.secondary_color,
        accent_color: request.accent_color,
        background_color: request.background_color,
        surface_color: request.surface_color,
        text_color: request.text_color,
        text_color_mode: request.text_color_mode,
        custom_text_color: request.custom_text_color,
        font_family: request.font_family,
        border_radius: request.border_radius,
        spacing_unit: request.spacing_unit,
        max_width: request.max_width,
        is_default: request.is_default,
        is_active: request.is_active,
    }
}

/// List the caller's themes
#[utoipa::path(
    get,
    path = "/api/v1/themes",
    tag = "themes",
    responses(
        (status = 200, description = "All themes", body = [ThemeResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_themes(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<Vec<ThemeResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Themes::new(&mut conn);

    let themes = repo.list(&ThemeFilter { client_id: current.id }).await?;
    Ok(Json(ApiResponse::ok(themes.into_iter().map(ThemeResponse::from).collect())))
}

/// Get the active theme, creating the platform default if none exists
#[utoipa::path(
    get,
    path = "/api/v1/themes/active",
    tag = "themes",
    responses(
        (status = 200, description = "Active theme", body = ThemeResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_active_theme(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<ThemeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Themes::new(&mut conn);

    let theme = match repo.get_active_for_client(current.id).await? {
        Some(theme) => theme,
        None => repo.create(&ThemeCreateDBRequest::default_for(current.id)).await?,
    };

    Ok(Json(ApiResponse::ok(ThemeResponse::from(theme))))
}

/// Create or update a theme
#[utoipa::path(
    put,
    path = "/api/v1/themes",
    request_body = ThemeUpsert,
    tag = "themes",
    responses(
        (status = 200, description = "Theme saved", body = ThemeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Theme not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upsert_theme(
    State(state): State<AppState>,
    current: CurrentClient,
    Json(request): Json<ThemeUpsert>,
) -> Result<Json<ApiResponse<ThemeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Themes::new(&mut conn);

    let theme = match request.id {
        Some(id) => {
            get_owned(&mut repo, id, &current).await?;
            repo.update(id, &update_from_upsert(request)).await?
        }
        None => match repo.get_active_for_client(current.id).await? {
            Some(active) => repo.update(active.id, &update_from_upsert(request)).await?,
            None => {
                // No theme yet: start from the platform default, then apply
                // the submitted fields in one pass
                let created = repo.create(&ThemeCreateDBRequest::default_for(current.id)).await?;
                repo.update(created.id, &update_from_upsert(request)).await?
            }
        },
    };

    Ok(Json(ApiResponse::ok(ThemeResponse::from(theme))))
}

/// Drop all themes and re-provision the platform default
#[utoipa::path(
    post,
    path = "/api/v1/themes/reset",
    tag = "themes",
    responses(
        (status = 200, description = "Theme reset to platform default", body = ThemeResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_theme(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<ThemeResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Themes::new(&mut tx);

    let theme = repo.reset_for_client(current.id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ApiResponse::ok(ThemeResponse::from(theme))))
}

/// Delete a theme
#[utoipa::path(
    delete,
    path = "/api/v1/themes/{id}",
    tag = "themes",
    params(("id" = uuid::Uuid, Path, description = "Theme ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_theme(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<ThemeId>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Themes::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    repo.delete(id).await?;

    Ok(Json(ApiResponse::message("Theme deleted")))
}
