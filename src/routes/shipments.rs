use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::shipment_dto::{
        AssignDriverPayload, CreateShipmentPayload, ShipmentListQuery, ShipmentListResponse,
        UpdateShipmentPayload,
    },
    error::Result,
    models::{shipment::Shipment, user::UserRole},
    services::token_service::Claims,
    AppState,
};

const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Dispatcher];

#[utoipa::path(
    get,
    path = "/api/shipments",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("trackingNumber" = Option<String>, Query, description = "Exact tracking number"),
        ("createdById" = Option<Uuid>, Query, description = "Filter by creator"),
        ("driverId" = Option<Uuid>, Query, description = "Filter by assigned driver"),
        ("vehicleType" = Option<String>, Query, description = "Filter by vehicle type"),
        ("shipperCity" = Option<String>, Query, description = "Substring of shipper city"),
        ("consigneeCity" = Option<String>, Query, description = "Substring of consignee city"),
        ("search" = Option<String>, Query, description = "Substring of tracking number, parties or cargo"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("sortBy" = Option<String>, Query, description = "Sort field"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Page of shipments", body = Json<ShipmentListResponse>),
        (status = 400, description = "Invalid pagination")
    )
)]
#[axum::debug_handler]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.shipment_service.list(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/shipments/{id}",
    params(
        ("id" = Uuid, Path, description = "Shipment ID")
    ),
    responses(
        (status = 200, description = "Shipment found", body = Json<Shipment>),
        (status = 404, description = "Shipment not found")
    )
)]
#[axum::debug_handler]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipment_service.get_by_id(id).await?;
    Ok(Json(shipment))
}

#[utoipa::path(
    get,
    path = "/api/track/{tracking_number}",
    params(
        ("tracking_number" = String, Path, description = "Tracking number")
    ),
    responses(
        (status = 200, description = "Shipment found", body = Json<Shipment>),
        (status = 404, description = "Unknown tracking number")
    )
)]
#[axum::debug_handler]
pub async fn track_shipment(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipment_service.track(&tracking_number).await?;
    Ok(Json(shipment))
}

#[utoipa::path(
    post,
    path = "/api/shipments",
    request_body = CreateShipmentPayload,
    responses(
        (status = 201, description = "Shipment created", body = Json<Shipment>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Tracking number already in use")
    )
)]
#[axum::debug_handler]
pub async fn create_shipment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateShipmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let shipment = state.shipment_service.create(payload, claims.uid).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

#[utoipa::path(
    patch,
    path = "/api/shipments/{id}",
    params(
        ("id" = Uuid, Path, description = "Shipment ID")
    ),
    request_body = UpdateShipmentPayload,
    responses(
        (status = 200, description = "Shipment updated", body = Json<Shipment>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Shipment not found")
    )
)]
#[axum::debug_handler]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let shipment = state.shipment_service.update(id, payload).await?;
    Ok(Json(shipment))
}

#[utoipa::path(
    post,
    path = "/api/shipments/{id}/assign-driver",
    params(
        ("id" = Uuid, Path, description = "Shipment ID")
    ),
    request_body = AssignDriverPayload,
    responses(
        (status = 200, description = "Driver assigned", body = Json<Shipment>),
        (status = 400, description = "Not an active driver"),
        (status = 403, description = "Caller may not assign drivers"),
        (status = 404, description = "Shipment not found")
    )
)]
#[axum::debug_handler]
pub async fn assign_driver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignDriverPayload>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(STAFF)?;
    let shipment = state
        .shipment_service
        .assign_driver(id, payload.driver_id)
        .await?;
    Ok(Json(shipment))
}

#[utoipa::path(
    post,
    path = "/api/shipments/{id}/flag",
    params(
        ("id" = Uuid, Path, description = "Shipment ID")
    ),
    responses(
        (status = 200, description = "Shipment flagged for review", body = Json<Shipment>),
        (status = 404, description = "Shipment not found")
    )
)]
#[axum::debug_handler]
pub async fn flag_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipment_service.flag(id).await?;
    Ok(Json(shipment))
}

#[utoipa::path(
    delete,
    path = "/api/shipments/{id}",
    params(
        ("id" = Uuid, Path, description = "Shipment ID")
    ),
    responses(
        (status = 200, description = "Shipment deleted; last known state", body = Json<Shipment>),
        (status = 403, description = "Caller may not delete shipments"),
        (status = 404, description = "Shipment not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_shipment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any_role(STAFF)?;
    let shipment = state.shipment_service.delete(id).await?;
    Ok(Json(shipment))
}
