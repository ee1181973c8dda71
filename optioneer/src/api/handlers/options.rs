//! Dashboard CRUD for options, including relation-edge authoring and the
//! plan-capacity guard for primary categories.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use crate::{
    api::models::{
        clients::CurrentClient,
        envelope::ApiResponse,
        options::{EdgeRequest, OptionCreate, OptionCreateResponse, OptionResponse, OptionUpdate},
    },
    db::handlers::{options::OptionFilter, options::OptionWithOwner, Categories, Clients, Options, Repository},
    db::models::options::{OptionCreateDBRequest, OptionUpdateDBRequest},
    errors::{Error, Result},
    limits,
    types::{CategoryId, OptionId},
    AppState,
};

async fn get_owned(repo: &mut Options<'_>, id: OptionId, current: &CurrentClient) -> Result<OptionWithOwner> {
    let found = repo.get_with_owner(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Option".to_string(),
        id: id.to_string(),
    })?;

    if found.owner_client_id != current.id {
        return Err(Error::NotFound {
            resource: "Option".to_string(),
            id: id.to_string(),
        });
    }

    Ok(found)
}

/// List a category's options
#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}/options",
    tag = "options",
    params(("category_id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Options with their relation edges", body = [OptionResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_options(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<ApiResponse<Vec<OptionResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut categories = Categories::new(&mut conn);
    let category = categories.get_with_owner(category_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Category".to_string(),
        id: category_id.to_string(),
    })?;
    if category.owner_client_id != current.id {
        return Err(Error::NotFound {
            resource: "Category".to_string(),
            id: category_id.to_string(),
        });
    }

    let mut repo = Options::new(&mut conn);
    let options = repo.list(&OptionFilter { category_id }).await?;

    let mut responses = Vec::with_capacity(options.len());
    for option in options {
        let id = option.id;
        let with_edges = repo.get_with_edges(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Option".to_string(),
            id: id.to_string(),
        })?;
        responses.push(OptionResponse::from(with_edges));
    }

    Ok(Json(ApiResponse::ok(responses)))
}

/// Create an option.
///
/// For primary categories the create runs inside one transaction that locks
/// the owning client row, counts existing primary options, and rejects with
/// `PLAN_LIMIT` at or above `included + blocks x block_size`. Relation-edge
/// targets that do not exist or live in another configurator are skipped and
/// reported back, never failed on.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{category_id}/options",
    request_body = OptionCreate,
    tag = "options",
    params(("category_id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 201, description = "Option created", body = OptionCreateResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Plan limit reached"),
        (status = 404, description = "Category not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_option(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(category_id): Path<CategoryId>,
    Json(request): Json<OptionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<OptionCreateResponse>>)> {
    if request.label.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Option label cannot be empty".to_string(),
        });
    }
    if request.price < Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Option price cannot be negative".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut categories = Categories::new(&mut tx);
    let category = categories.get_with_owner(category_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Category".to_string(),
        id: category_id.to_string(),
    })?;
    if category.owner_client_id != current.id {
        return Err(Error::NotFound {
            resource: "Category".to_string(),
            id: category_id.to_string(),
        });
    }

    // Quota check for primary categories: lock the client row so a
    // concurrent create cannot count the same free slot twice
    if category.category.is_primary {
        let mut clients = Clients::new(&mut tx);
        let charged_blocks = clients.lock_charged_blocks(current.id).await?;

        let mut options = Options::new(&mut tx);
        let used = options.count_primary_for_client(current.id).await?;
        let limit = limits::primary_option_limit(&state.config.billing, charged_blocks);

        if used >= limit {
            return Err(Error::PlanLimit { used, limit });
        }
    }

    let mut options = Options::new(&mut tx);
    let created = options
        .create(&OptionCreateDBRequest {
            category_id,
            label: request.label,
            description: request.description,
            price: request.price,
            sku: request.sku,
            image_url: request.image_url,
            is_default: request.is_default,
        })
        .await?;

    // Bulk edge assignment: skips are collected and reported, not errors
    let mut skipped_incompatibilities = Vec::new();
    for target in &request.incompatible_with {
        if !options.add_incompatibility(created.id, *target).await? {
            skipped_incompatibilities.push(*target);
        }
    }

    let mut skipped_dependencies = Vec::new();
    for target in &request.depends_on {
        if !options.add_dependency(created.id, *target).await? {
            skipped_dependencies.push(*target);
        }
    }

    let created_id = created.id;
    let with_edges = options.get_with_edges(created_id).await?.ok_or_else(|| Error::Internal {
        operation: "reload created option".to_string(),
    })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if !skipped_incompatibilities.is_empty() || !skipped_dependencies.is_empty() {
        tracing::warn!(
            option_id = %created_id,
            skipped_incompatibilities = skipped_incompatibilities.len(),
            skipped_dependencies = skipped_dependencies.len(),
            "skipped relation targets during option creation"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(OptionCreateResponse {
            option: OptionResponse::from(with_edges),
            skipped_incompatibilities,
            skipped_dependencies,
        })),
    ))
}

/// Get one option with its relation edges
#[utoipa::path(
    get,
    path = "/api/v1/options/{id}",
    tag = "options",
    params(("id" = uuid::Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Option", body = OptionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_option(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<OptionId>,
) -> Result<Json<ApiResponse<OptionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    let with_edges = repo.get_with_edges(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Option".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiResponse::ok(OptionResponse::from(with_edges))))
}

/// Update an option
#[utoipa::path(
    patch,
    path = "/api/v1/options/{id}",
    request_body = OptionUpdate,
    tag = "options",
    params(("id" = uuid::Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Updated option", body = OptionResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_option(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<OptionId>,
    Json(request): Json<OptionUpdate>,
) -> Result<Json<ApiResponse<OptionResponse>>> {
    if let Some(price) = request.price {
        if price < Decimal::ZERO {
            return Err(Error::BadRequest {
                message: "Option price cannot be negative".to_string(),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    repo.update(
        id,
        &OptionUpdateDBRequest {
            label: request.label,
            description: request.description,
            price: request.price,
            sku: request.sku,
            image_url: request.image_url,
            is_default: request.is_default,
        },
    )
    .await?;

    let with_edges = repo.get_with_edges(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Option".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiResponse::ok(OptionResponse::from(with_edges))))
}

/// Delete an option and its edges
#[utoipa::path(
    delete,
    path = "/api/v1/options/{id}",
    tag = "options",
    params(("id" = uuid::Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_option(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<OptionId>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    repo.delete(id).await?;

    Ok(Json(ApiResponse::message("Option deleted")))
}

/// Mark two options as incompatible (both directions)
#[utoipa::path(
    post,
    path = "/api/v1/options/{id}/incompatibilities",
    request_body = EdgeRequest,
    tag = "options",
    params(("id" = uuid::Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Edge created", body = OptionResponse),
        (status = 400, description = "Target missing or in another configurator"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_incompatibility(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<OptionId>,
    Json(request): Json<EdgeRequest>,
) -> Result<Json<ApiResponse<OptionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    // Explicit authoring surfaces what bulk creation would silently skip
    if !repo.add_incompatibility(id, request.option_id).await? {
        return Err(Error::BadRequest {
            message: "Target option does not exist or belongs to a different configurator".to_string(),
        });
    }

    let with_edges = repo.get_with_edges(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Option".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiResponse::ok(OptionResponse::from(with_edges))))
}

/// Remove an incompatibility edge (both directions)
#[utoipa::path(
    delete,
    path = "/api/v1/options/{id}/incompatibilities/{other_id}",
    tag = "options",
    params(
        ("id" = uuid::Uuid, Path, description = "Option ID"),
        ("other_id" = uuid::Uuid, Path, description = "Incompatible option ID"),
    ),
    responses(
        (status = 200, description = "Edge removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_incompatibility(
    State(state): State<AppState>,
    current: CurrentClient,
    Path((id, other_id)): Path<(OptionId, OptionId)>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    if !repo.remove_incompatibility(id, other_id).await? {
        return Err(Error::NotFound {
            resource: "Incompatibility".to_string(),
            id: other_id.to_string(),
        });
    }

    Ok(Json(ApiResponse::message("Incompatibility removed")))
}

/// Add a dependency: this option requires the target
#[utoipa::path(
    post,
    path = "/api/v1/options/{id}/dependencies",
    request_body = EdgeRequest,
    tag = "options",
    params(("id" = uuid::Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Edge created", body = OptionResponse),
        (status = 400, description = "Target missing or in another configurator"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_dependency(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<OptionId>,
    Json(request): Json<EdgeRequest>,
) -> Result<Json<ApiResponse<OptionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    if !repo.add_dependency(id, request.option_id).await? {
        return Err(Error::BadRequest {
            message: "Target option does not exist or belongs to a different configurator".to_string(),
        });
    }

    let with_edges = repo.get_with_edges(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Option".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiResponse::ok(OptionResponse::from(with_edges))))
}

/// Remove a dependency edge
#[utoipa::path(
    delete,
    path = "/api/v1/options/{id}/dependencies/{dep_id}",
    tag = "options",
    params(
        ("id" = uuid::Uuid, Path, description = "Option ID"),
        ("dep_id" = uuid::Uuid, Path, description = "Required option ID"),
    ),
    responses(
        (status = 200, description = "Edge removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_dependency(
    State(state): State<AppState>,
    current: CurrentClient,
    Path((id, dep_id)): Path<(OptionId, OptionId)>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Options::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;

    if !repo.remove_dependency(id, dep_id).await? {
        return Err(Error::NotFound {
            resource: "Dependency".to_string(),
            id: dep_id.to_string(),
        });
    }

    Ok(Json(ApiResponse::message("Dependency removed")))
}
