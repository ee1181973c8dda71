//! Dashboard CRUD for configurators.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        clients::CurrentClient,
        configurators::{ConfiguratorCreate, ConfiguratorResponse, ConfiguratorUpdate, ListConfiguratorsQuery},
        envelope::ApiResponse,
    },
    crypto,
    db::handlers::{configurators::ConfiguratorFilter, Configurators, Repository},
    db::models::configurators::{ConfiguratorCreateDBRequest, ConfiguratorDBResponse, ConfiguratorUpdateDBRequest},
    errors::{Error, Result},
    types::ConfiguratorId,
    AppState,
};

/// Fetch a configurator and require the caller to own it. Foreign ids answer
/// exactly like missing ones.
async fn get_owned(repo: &mut Configurators<'_>, id: ConfiguratorId, current: &CurrentClient) -> Result<ConfiguratorDBResponse> {
    let configurator = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Configurator".to_string(),
        id: id.to_string(),
    })?;

    if configurator.client_id != current.id {
        return Err(Error::NotFound {
            resource: "Configurator".to_string(),
            id: id.to_string(),
        });
    }

    Ok(configurator)
}

/// List the caller's configurators
#[utoipa::path(
    get,
    path = "/api/v1/configurators",
    tag = "configurators",
    params(ListConfiguratorsQuery),
    responses(
        (status = 200, description = "List of configurators", body = [ConfiguratorResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_configurators(
    State(state): State<AppState>,
    current: CurrentClient,
    Query(query): Query<ListConfiguratorsQuery>,
) -> Result<Json<ApiResponse<Vec<ConfiguratorResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Configurators::new(&mut conn);

    let filter = ConfiguratorFilter {
        client_id: current.id,
        skip: query.skip.unwrap_or(0),
        limit: query.limit.unwrap_or(100).min(1000),
    };

    let configurators = repo.list(&filter).await?;
    Ok(Json(ApiResponse::ok(
        configurators.into_iter().map(ConfiguratorResponse::from).collect(),
    )))
}

/// Create a configurator
#[utoipa::path(
    post,
    path = "/api/v1/configurators",
    request_body = ConfiguratorCreate,
    tag = "configurators",
    responses(
        (status = 201, description = "Configurator created", body = ConfiguratorResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_configurator(
    State(state): State<AppState>,
    current: CurrentClient,
    Json(request): Json<ConfiguratorCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ConfiguratorResponse>>)> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Configurator name cannot be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Configurators::new(&mut conn);

    let db_request = ConfiguratorCreateDBRequest {
        client_id: current.id,
        public_id: crypto::generate_public_id(),
        name: request.name,
        description: request.description,
        currency_code: request.currency_code.unwrap_or_else(|| "USD".to_string()),
        currency_symbol: request.currency_symbol.unwrap_or_else(|| "$".to_string()),
    };

    let configurator = repo.create(&db_request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ConfiguratorResponse::from(configurator)))))
}

/// Get one configurator
#[utoipa::path(
    get,
    path = "/api/v1/configurators/{id}",
    tag = "configurators",
    params(("id" = uuid::Uuid, Path, description = "Configurator ID")),
    responses(
        (status = 200, description = "Configurator", body = ConfiguratorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_configurator(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<ConfiguratorId>,
) -> Result<Json<ApiResponse<ConfiguratorResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Configurators::new(&mut conn);

    let configurator = get_owned(&mut repo, id, &current).await?;
    Ok(Json(ApiResponse::ok(ConfiguratorResponse::from(configurator))))
}

/// Update a configurator (including the published flag and theme binding)
#[utoipa::path(
    patch,
    path = "/api/v1/configurators/{id}",
    request_body = ConfiguratorUpdate,
    tag = "configurators",
    params(("id" = uuid::Uuid, Path, description = "Configurator ID")),
    responses(
        (status = 200, description = "Updated configurator", body = ConfiguratorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_configurator(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<ConfiguratorId>,
    Json(request): Json<ConfiguratorUpdate>,
) -> Result<Json<ApiResponse<ConfiguratorResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Configurators::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    let db_request = ConfiguratorUpdateDBRequest {
        name: request.name,
        description: request.description,
        currency_code: request.currency_code,
        currency_symbol: request.currency_symbol,
        published: request.published,
        theme_id: request.theme_id,
    };

    let configurator = repo.update(id, &db_request).await?;
    Ok(Json(ApiResponse::ok(ConfiguratorResponse::from(configurator))))
}

/// Delete a configurator and, by cascade, its categories and options
#[utoipa::path(
    delete,
    path = "/api/v1/configurators/{id}",
    tag = "configurators",
    params(("id" = uuid::Uuid, Path, description = "Configurator ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_configurator(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<ConfiguratorId>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Configurators::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    repo.delete(id).await?;

    Ok(Json(ApiResponse::message("Configurator deleted")))
}
