//! Dashboard CRUD for categories.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        categories::{CategoryCreate, CategoryResponse, CategoryUpdate},
        clients::CurrentClient,
        envelope::ApiResponse,
    },
    db::handlers::{categories::CategoryFilter, Categories, Configurators, Repository},
    db::models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest},
    errors::{Error, Result},
    types::{CategoryId, ConfiguratorId},
    AppState,
};

async fn get_owned(repo: &mut Categories<'_>, id: CategoryId, current: &CurrentClient) -> Result<CategoryDBResponse> {
    let found = repo.get_with_owner(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Category".to_string(),
        id: id.to_string(),
    })?;

    if found.owner_client_id != current.id {
        return Err(Error::NotFound {
            resource: "Category".to_string(),
            id: id.to_string(),
        });
    }

    Ok(found.category)
}

/// List a configurator's categories in display order
#[utoipa::path(
    get,
    path = "/api/v1/configurators/{configurator_id}/categories",
    tag = "categories",
    params(("configurator_id" = uuid::Uuid, Path, description = "Configurator ID")),
    responses(
        (status = 200, description = "Categories in position order", body = [CategoryResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configurator not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(configurator_id): Path<ConfiguratorId>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut configurators = Configurators::new(&mut conn);
    let configurator = configurators.get_by_id(configurator_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Configurator".to_string(),
        id: configurator_id.to_string(),
    })?;
    if configurator.client_id != current.id {
        return Err(Error::NotFound {
            resource: "Configurator".to_string(),
            id: configurator_id.to_string(),
        });
    }

    let mut repo = Categories::new(&mut conn);
    let categories = repo.list(&CategoryFilter { configurator_id }).await?;

    Ok(Json(ApiResponse::ok(categories.into_iter().map(CategoryResponse::from).collect())))
}

/// Create a category. The configurator's first category defaults to primary.
#[utoipa::path(
    post,
    path = "/api/v1/configurators/{configurator_id}/categories",
    request_body = CategoryCreate,
    tag = "categories",
    params(("configurator_id" = uuid::Uuid, Path, description = "Configurator ID")),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Configurator not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(configurator_id): Path<ConfiguratorId>,
    Json(request): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut configurators = Configurators::new(&mut conn);
    let configurator = configurators.get_by_id(configurator_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Configurator".to_string(),
        id: configurator_id.to_string(),
    })?;
    if configurator.client_id != current.id {
        return Err(Error::NotFound {
            resource: "Configurator".to_string(),
            id: configurator_id.to_string(),
        });
    }

    let mut repo = Categories::new(&mut conn);
    let category = repo
        .create(&CategoryCreateDBRequest {
            configurator_id,
            name: request.name,
            category_type: request.category_type,
            position: request.position,
            is_primary: request.is_primary,
            is_required: request.is_required,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CategoryResponse::from(category)))))
}

/// Get one category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let category = get_owned(&mut repo, id, &current).await?;
    Ok(Json(ApiResponse::ok(CategoryResponse::from(category))))
}

/// Update a category
#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    request_body = CategoryUpdate,
    tag = "categories",
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Updated category", body = CategoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<CategoryId>,
    Json(request): Json<CategoryUpdate>,
) -> Result<Json<ApiResponse<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    let category = repo
        .update(
            id,
            &CategoryUpdateDBRequest {
                name: request.name,
                category_type: request.category_type,
                position: request.position,
                is_primary: request.is_primary,
                is_required: request.is_required,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(CategoryResponse::from(category))))
}

/// Delete a category and its options
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    repo.delete(id).await?;

    Ok(Json(ApiResponse::message("Category deleted")))
}
