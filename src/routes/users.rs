use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{CreateUserPayload, UpdateUserPayload, UserListQuery, UserListResponse},
    error::Result,
    models::user::{User, UserRole},
    services::token_service::Claims,
    AppState,
};

const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Dispatcher];
const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

fn require_self_or(claims: &Claims, id: Uuid, allowed: &[UserRole]) -> Result<()> {
    if claims.uid == id {
        Ok(())
    } else {
        claims.require_any_role(allowed)
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("isActive" = Option<bool>, Query, description = "Filter by active flag"),
        ("search" = Option<String>, Query, description = "Substring of email or name"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("sortBy" = Option<String>, Query, description = "Sort field"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Page of users", body = Json<UserListResponse>),
        (status = 400, description = "Invalid pagination"),
        (status = 403, description = "Caller may not list users")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(STAFF)?;
    let page = state.user_service.list(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/users/drivers",
    responses(
        (status = 200, description = "Active drivers by first name", body = Json<Vec<User>>),
        (status = 403, description = "Caller may not list drivers")
    )
)]
#[axum::debug_handler]
pub async fn list_drivers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(STAFF)?;
    let drivers = state.user_service.drivers().await?;
    Ok(Json(drivers))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = Json<User>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_self_or(&claims, id, STAFF)?;
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = Json<User>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(ADMIN_ONLY)?;
    payload.validate()?;
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated", body = Json<User>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    require_self_or(&claims, id, ADMIN_ONLY)?;
    if payload.changes_privileges() {
        claims.require_any_role(ADMIN_ONLY)?;
    }
    payload.validate()?;
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted; last known state", body = Json<User>),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns shipments")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(ADMIN_ONLY)?;
    let user = state.user_service.delete(id).await?;
    Ok(Json(user))
}
