use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::pagination::SortField;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "shipment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "vehicle_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Truck,
    Van,
    Trailer,
    Flatbed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: Uuid,
    pub tracking_number: String,
    pub status: ShipmentStatus,

    pub shipper_name: String,
    pub shipper_phone: String,
    pub shipper_email: Option<String>,
    pub shipper_address: String,
    pub shipper_city: String,
    pub shipper_state: String,
    pub shipper_zip: String,

    pub consignee_name: String,
    pub consignee_phone: String,
    pub consignee_email: Option<String>,
    pub consignee_address: String,
    pub consignee_city: String,
    pub consignee_state: String,
    pub consignee_zip: String,

    pub cargo_description: String,
    pub weight: f64,
    pub dimensions: Option<String>,
    pub vehicle_type: VehicleType,

    pub estimated_rate: f64,
    pub actual_rate: Option<f64>,
    pub currency: String,

    pub pickup_date: NaiveDate,
    pub estimated_delivery: NaiveDate,
    pub delivery_date: Option<NaiveDate>,

    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub driver_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully resolved insert payload: status, creator and tracking number are
/// already fixed by the service.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub id: Uuid,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub shipper_name: String,
    pub shipper_phone: String,
    pub shipper_email: Option<String>,
    pub shipper_address: String,
    pub shipper_city: String,
    pub shipper_state: String,
    pub shipper_zip: String,
    pub consignee_name: String,
    pub consignee_phone: String,
    pub consignee_email: Option<String>,
    pub consignee_address: String,
    pub consignee_city: String,
    pub consignee_state: String,
    pub consignee_zip: String,
    pub cargo_description: String,
    pub weight: f64,
    pub dimensions: Option<String>,
    pub vehicle_type: VehicleType,
    pub estimated_rate: f64,
    pub currency: String,
    pub pickup_date: NaiveDate,
    pub estimated_delivery: NaiveDate,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentChanges {
    pub status: Option<ShipmentStatus>,
    pub actual_rate: Option<f64>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub driver_id: Option<Uuid>,
}

impl ShipmentChanges {
    pub fn apply(&self, shipment: &mut Shipment) {
        if let Some(status) = self.status {
            shipment.status = status;
        }
        if let Some(rate) = self.actual_rate {
            shipment.actual_rate = Some(rate);
        }
        if let Some(date) = self.delivery_date {
            shipment.delivery_date = Some(date);
        }
        if let Some(notes) = &self.notes {
            shipment.notes = Some(notes.clone());
        }
        if let Some(driver_id) = self.driver_id {
            shipment.driver_id = Some(driver_id);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    pub created_by_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_type: Option<VehicleType>,
    pub shipper_city: Option<String>,
    pub consignee_city: Option<String>,
    /// Case-insensitive substring over tracking number, party names and cargo.
    pub search: Option<String>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl ShipmentFilter {
    pub fn matches(&self, shipment: &Shipment) -> bool {
        if self.status.is_some_and(|s| s != shipment.status) {
            return false;
        }
        if self
            .tracking_number
            .as_ref()
            .is_some_and(|t| *t != shipment.tracking_number)
        {
            return false;
        }
        if self.created_by_id.is_some_and(|id| id != shipment.created_by_id) {
            return false;
        }
        if self.driver_id.is_some_and(|id| Some(id) != shipment.driver_id) {
            return false;
        }
        if self.vehicle_type.is_some_and(|v| v != shipment.vehicle_type) {
            return false;
        }
        if let Some(city) = &self.shipper_city {
            if !contains_ci(&shipment.shipper_city, city) {
                return false;
            }
        }
        if let Some(city) = &self.consignee_city {
            if !contains_ci(&shipment.consignee_city, city) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            return [
                &shipment.tracking_number,
                &shipment.shipper_name,
                &shipment.consignee_name,
                &shipment.cargo_description,
            ]
            .iter()
            .any(|field| contains_ci(field, search));
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentSortField {
    CreatedAt,
    UpdatedAt,
    TrackingNumber,
    Status,
    PickupDate,
    EstimatedDelivery,
    Weight,
    EstimatedRate,
}

impl SortField for ShipmentSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(ShipmentSortField::CreatedAt),
            "updatedAt" => Some(ShipmentSortField::UpdatedAt),
            "trackingNumber" => Some(ShipmentSortField::TrackingNumber),
            "status" => Some(ShipmentSortField::Status),
            "pickupDate" => Some(ShipmentSortField::PickupDate),
            "estimatedDelivery" => Some(ShipmentSortField::EstimatedDelivery),
            "weight" => Some(ShipmentSortField::Weight),
            "estimatedRate" => Some(ShipmentSortField::EstimatedRate),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ShipmentSortField::CreatedAt => "created_at",
            ShipmentSortField::UpdatedAt => "updated_at",
            ShipmentSortField::TrackingNumber => "tracking_number",
            ShipmentSortField::Status => "status",
            ShipmentSortField::PickupDate => "pickup_date",
            ShipmentSortField::EstimatedDelivery => "estimated_delivery",
            ShipmentSortField::Weight => "weight",
            ShipmentSortField::EstimatedRate => "estimated_rate",
        }
    }
}

impl ShipmentSortField {
    pub fn compare(&self, a: &Shipment, b: &Shipment) -> Ordering {
        match self {
            ShipmentSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            ShipmentSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            ShipmentSortField::TrackingNumber => a.tracking_number.cmp(&b.tracking_number),
            ShipmentSortField::Status => (a.status as u8).cmp(&(b.status as u8)),
            ShipmentSortField::PickupDate => a.pickup_date.cmp(&b.pickup_date),
            ShipmentSortField::EstimatedDelivery => {
                a.estimated_delivery.cmp(&b.estimated_delivery)
            }
            ShipmentSortField::Weight => a.weight.total_cmp(&b.weight),
            ShipmentSortField::EstimatedRate => a.estimated_rate.total_cmp(&b.estimated_rate),
        }
    }
}

/// Appends a review marker line, keeping whatever notes were there before.
pub fn flagged_notes(existing: Option<&str>, marker: &str) -> String {
    match existing {
        Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, marker),
        _ => marker.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_value(ShipmentStatus::PickedUp).unwrap(),
            "PICKED_UP"
        );
        let parsed: ShipmentStatus = serde_json::from_str("\"IN_TRANSIT\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::InTransit);
    }

    #[test]
    fn flag_marker_is_appended_on_new_line() {
        assert_eq!(flagged_notes(None, "[F]"), "[F]");
        assert_eq!(flagged_notes(Some("fragile"), "[F]"), "fragile\n[F]");
        assert_eq!(flagged_notes(Some(""), "[F]"), "[F]");
    }
}
