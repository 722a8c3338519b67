use std::sync::Arc;

use uuid::Uuid;

use crate::database::{ShipmentStore, UserStore};
use crate::dto::shipment_dto::{
    CreateShipmentPayload, ShipmentListQuery, ShipmentListResponse, UpdateShipmentPayload,
};
use crate::error::{Error, Result};
use crate::models::shipment::{
    NewShipment, Shipment, ShipmentChanges, ShipmentSortField, ShipmentStatus,
};
use crate::models::user::UserRole;
use crate::pagination::Paginated;
use crate::utils::time::{now, to_iso8601};
use crate::utils::token::generate_tracking_number;

pub const FLAG_MARKER: &str = "FLAGGED FOR REVIEW";

fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Shipment not found with id: {}", id))
}

#[derive(Clone)]
pub struct ShipmentService {
    shipments: Arc<dyn ShipmentStore>,
    users: Arc<dyn UserStore>,
}

impl ShipmentService {
    pub fn new(shipments: Arc<dyn ShipmentStore>, users: Arc<dyn UserStore>) -> Self {
        Self { shipments, users }
    }

    pub async fn list(&self, query: &ShipmentListQuery) -> Result<ShipmentListResponse> {
        let page = query.pagination().resolve::<ShipmentSortField>()?;
        let (records, total) = self.shipments.list(&query.filter(), &page).await?;
        Ok(Paginated::new(records, total, &page))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Shipment> {
        self.shipments
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn track(&self, tracking_number: &str) -> Result<Shipment> {
        self.shipments
            .find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Shipment not found with tracking number: {}",
                    tracking_number
                ))
            })
    }

    /// New shipments always start PENDING and belong to `creator_id`,
    /// whatever the payload says.
    pub async fn create(&self, payload: CreateShipmentPayload, creator_id: Uuid) -> Result<Shipment> {
        let tracking_number = payload
            .tracking_number
            .filter(|tn| !tn.trim().is_empty())
            .unwrap_or_else(generate_tracking_number);

        let shipment = self
            .shipments
            .insert(NewShipment {
                id: Uuid::now_v7(),
                tracking_number,
                status: ShipmentStatus::Pending,
                shipper_name: payload.shipper_name,
                shipper_phone: payload.shipper_phone,
                shipper_email: payload.shipper_email,
                shipper_address: payload.shipper_address,
                shipper_city: payload.shipper_city,
                shipper_state: payload.shipper_state,
                shipper_zip: payload.shipper_zip,
                consignee_name: payload.consignee_name,
                consignee_phone: payload.consignee_phone,
                consignee_email: payload.consignee_email,
                consignee_address: payload.consignee_address,
                consignee_city: payload.consignee_city,
                consignee_state: payload.consignee_state,
                consignee_zip: payload.consignee_zip,
                cargo_description: payload.cargo_description,
                weight: payload.weight,
                dimensions: payload.dimensions,
                vehicle_type: payload.vehicle_type,
                estimated_rate: payload.estimated_rate,
                currency: payload.currency,
                pickup_date: payload.pickup_date,
                estimated_delivery: payload.estimated_delivery,
                notes: payload.notes,
                created_by_id: creator_id,
            })
            .await?;

        tracing::info!(
            shipment_id = %shipment.id,
            tracking_number = %shipment.tracking_number,
            created_by = %creator_id,
            "shipment created"
        );
        Ok(shipment)
    }

    /// Only fields present in the payload change. Any status may follow any other.
    pub async fn update(&self, id: Uuid, payload: UpdateShipmentPayload) -> Result<Shipment> {
        let shipment = self
            .shipments
            .update(id, payload.into())
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(shipment_id = %id, status = ?shipment.status, "shipment updated");
        Ok(shipment)
    }

    pub async fn assign_driver(&self, id: Uuid, driver_id: Uuid) -> Result<Shipment> {
        self.get_by_id(id).await?;

        let driver = self
            .users
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| Error::InvalidDriver(format!("no user with id {}", driver_id)))?;
        if driver.role != UserRole::Driver {
            return Err(Error::InvalidDriver(format!(
                "user {} is a {}, not a driver",
                driver_id,
                driver.role.as_str()
            )));
        }
        if !driver.is_active {
            return Err(Error::InvalidDriver(format!(
                "driver {} is inactive",
                driver_id
            )));
        }

        let changes = ShipmentChanges {
            status: Some(ShipmentStatus::Assigned),
            driver_id: Some(driver_id),
            ..Default::default()
        };
        let shipment = self
            .shipments
            .update(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(shipment_id = %id, driver_id = %driver_id, "driver assigned");
        Ok(shipment)
    }

    /// Appends a timestamped review marker to the notes. Status is untouched.
    pub async fn flag(&self, id: Uuid) -> Result<Shipment> {
        let line = format!("[{} - {}]", FLAG_MARKER, to_iso8601(now()));
        let shipment = self
            .shipments
            .append_note(id, &line)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(shipment_id = %id, "shipment flagged for review");
        Ok(shipment)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Shipment> {
        let shipment = self
            .shipments
            .delete(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(shipment_id = %id, "shipment deleted");
        Ok(shipment)
    }
}
