//! In-process store adapters.
//!
//! Same contract as the Postgres adapters (uniqueness, timestamps, filter and
//! sort semantics, ties broken by insertion order) without a database. Used by
//! the test suites and handy for local experiments.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::{ShipmentStore, UserStore};
use crate::error::{Error, Result};
use crate::models::shipment::{
    flagged_notes, NewShipment, Shipment, ShipmentChanges, ShipmentFilter, ShipmentSortField,
};
use crate::models::user::{NewUser, UserChanges, UserFilter, UserRecord, UserRole, UserSortField};
use crate::pagination::PageRequest;

fn page_of<T: Clone>(matching: Vec<&T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(0);
    matching
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

/// Users kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::DuplicateEmail(user.email));
        }
        let now = Utc::now();
        let record = UserRecord {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            phone: user.phone,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.email == email))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: &PageRequest<UserSortField>,
    ) -> Result<(Vec<UserRecord>, i64)> {
        let users = self.users.read().await;
        let mut matching: Vec<&UserRecord> = users.iter().filter(|u| filter.matches(u)).collect();
        // Stable sort keeps insertion order among equal keys.
        matching.sort_by(|a, b| page.order.apply(page.sort_by.compare(a, b)));
        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        Ok((page_of(matching, page.offset(), page.limit), total))
    }

    async fn find_active_by_role(&self, role: UserRole) -> Result<Vec<UserRecord>> {
        let users = self.users.read().await;
        let mut found: Vec<UserRecord> = users
            .iter()
            .filter(|u| u.role == role && u.is_active)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.first_name.cmp(&b.first_name));
        Ok(found)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.email == *email && u.id != id) {
                return Err(Error::DuplicateEmail(email.clone()));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|index| users.remove(index)))
    }
}

/// Shipments kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryShipmentStore {
    shipments: RwLock<Vec<Shipment>>,
}

impl MemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentStore for MemoryShipmentStore {
    async fn insert(&self, shipment: NewShipment) -> Result<Shipment> {
        let mut shipments = self.shipments.write().await;
        if shipments
            .iter()
            .any(|s| s.tracking_number == shipment.tracking_number)
        {
            return Err(Error::Conflict(format!(
                "tracking number {} already exists",
                shipment.tracking_number
            )));
        }
        let now = Utc::now();
        let record = Shipment {
            id: shipment.id,
            tracking_number: shipment.tracking_number,
            status: shipment.status,
            shipper_name: shipment.shipper_name,
            shipper_phone: shipment.shipper_phone,
            shipper_email: shipment.shipper_email,
            shipper_address: shipment.shipper_address,
            shipper_city: shipment.shipper_city,
            shipper_state: shipment.shipper_state,
            shipper_zip: shipment.shipper_zip,
            consignee_name: shipment.consignee_name,
            consignee_phone: shipment.consignee_phone,
            consignee_email: shipment.consignee_email,
            consignee_address: shipment.consignee_address,
            consignee_city: shipment.consignee_city,
            consignee_state: shipment.consignee_state,
            consignee_zip: shipment.consignee_zip,
            cargo_description: shipment.cargo_description,
            weight: shipment.weight,
            dimensions: shipment.dimensions,
            vehicle_type: shipment.vehicle_type,
            estimated_rate: shipment.estimated_rate,
            actual_rate: None,
            currency: shipment.currency,
            pickup_date: shipment.pickup_date,
            estimated_delivery: shipment.estimated_delivery,
            delivery_date: None,
            notes: shipment.notes,
            created_by_id: shipment.created_by_id,
            driver_id: None,
            created_at: now,
            updated_at: now,
        };
        shipments.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shipment>> {
        let shipments = self.shipments.read().await;
        Ok(shipments.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        let shipments = self.shipments.read().await;
        Ok(shipments
            .iter()
            .find(|s| s.tracking_number == tracking_number)
            .cloned())
    }

    async fn list(
        &self,
        filter: &ShipmentFilter,
        page: &PageRequest<ShipmentSortField>,
    ) -> Result<(Vec<Shipment>, i64)> {
        let shipments = self.shipments.read().await;
        let mut matching: Vec<&Shipment> =
            shipments.iter().filter(|s| filter.matches(s)).collect();
        matching.sort_by(|a, b| page.order.apply(page.sort_by.compare(a, b)));
        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        Ok((page_of(matching, page.offset(), page.limit), total))
    }

    async fn update(&self, id: Uuid, changes: ShipmentChanges) -> Result<Option<Shipment>> {
        let mut shipments = self.shipments.write().await;
        let Some(shipment) = shipments.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        changes.apply(shipment);
        shipment.updated_at = Utc::now();
        Ok(Some(shipment.clone()))
    }

    async fn append_note(&self, id: Uuid, line: &str) -> Result<Option<Shipment>> {
        let mut shipments = self.shipments.write().await;
        let Some(shipment) = shipments.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        shipment.notes = Some(flagged_notes(shipment.notes.as_deref(), line));
        shipment.updated_at = Utc::now();
        Ok(Some(shipment.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Shipment>> {
        let mut shipments = self.shipments.write().await;
        Ok(shipments
            .iter()
            .position(|s| s.id == id)
            .map(|index| shipments.remove(index)))
    }
}
