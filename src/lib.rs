pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::database::{PgShipmentStore, PgUserStore, ShipmentStore, UserStore};
use crate::error::Result;
use crate::services::{
    auth_service::AuthService, shipment_service::ShipmentService, token_service::TokenService,
    user_service::UserService,
};
use crate::utils::crypto::CredentialVerifier;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub shipment_service: ShipmentService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let tokens = TokenService::from_config(config)?;
        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgShipmentStore::new(pool)),
            tokens,
            CredentialVerifier::default(),
        ))
    }

    /// Wires the services over arbitrary stores.
    pub fn from_parts(
        users: Arc<dyn UserStore>,
        shipments: Arc<dyn ShipmentStore>,
        tokens: TokenService,
        credentials: CredentialVerifier,
    ) -> Self {
        let auth_service = AuthService::new(users.clone(), credentials.clone(), tokens);
        let user_service = UserService::new(users.clone(), credentials);
        let shipment_service = ShipmentService::new(shipments, users);
        Self {
            auth_service,
            user_service,
            shipment_service,
        }
    }
}
