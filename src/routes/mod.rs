pub mod auth;
pub mod health;
pub mod shipments;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_bearer_auth,
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

/// Every route of the service. Health, register, login and tracking are
/// public; the rest need a bearer token. `/api/auth/*` shares one
/// `auth_rps` budget.
pub fn router(state: AppState, auth_rps: u32) -> Router {
    let bearer = from_fn_with_state(state.auth_service.clone(), require_bearer_auth);

    let public_api = Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/track/:tracking_number",
            get(shipments::track_shipment),
        );

    let auth_api = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(bearer.clone())
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .layer(from_fn_with_state(new_rps_state(auth_rps), rps_middleware));

    let protected_api = Router::new()
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/users/drivers", get(users::list_drivers))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/shipments",
            get(shipments::list_shipments).post(shipments::create_shipment),
        )
        .route(
            "/api/shipments/:id",
            get(shipments::get_shipment)
                .patch(shipments::update_shipment)
                .delete(shipments::delete_shipment),
        )
        .route(
            "/api/shipments/:id/assign-driver",
            post(shipments::assign_driver),
        )
        .route("/api/shipments/:id/flag", post(shipments::flag_shipment))
        .route_layer(bearer);

    Router::new()
        .merge(public_api)
        .merge(auth_api)
        .merge(protected_api)
        .with_state(state)
}
