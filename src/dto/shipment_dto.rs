use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::shipment::{
    Shipment, ShipmentChanges, ShipmentFilter, ShipmentStatus, VehicleType, DEFAULT_CURRENCY,
};
use crate::pagination::{Paginated, PaginationParams};

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentPayload {
    /// Optional; generated when absent.
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: Option<String>,
    /// Accepted for compatibility and ignored: new shipments start PENDING.
    pub status: Option<ShipmentStatus>,

    #[validate(length(min = 1, max = 255, message = "Shipper name is required"))]
    pub shipper_name: String,
    #[validate(length(min = 1, max = 50, message = "Shipper phone is required"))]
    pub shipper_phone: String,
    #[validate(email, length(max = 255))]
    pub shipper_email: Option<String>,
    #[validate(length(min = 1, message = "Shipper address is required"))]
    pub shipper_address: String,
    #[validate(length(min = 1, max = 100, message = "Shipper city is required"))]
    pub shipper_city: String,
    #[validate(length(min = 1, max = 100, message = "Shipper state is required"))]
    pub shipper_state: String,
    #[validate(length(min = 1, max = 20, message = "Shipper zip is required"))]
    pub shipper_zip: String,

    #[validate(length(min = 1, max = 255, message = "Consignee name is required"))]
    pub consignee_name: String,
    #[validate(length(min = 1, max = 50, message = "Consignee phone is required"))]
    pub consignee_phone: String,
    #[validate(email, length(max = 255))]
    pub consignee_email: Option<String>,
    #[validate(length(min = 1, message = "Consignee address is required"))]
    pub consignee_address: String,
    #[validate(length(min = 1, max = 100, message = "Consignee city is required"))]
    pub consignee_city: String,
    #[validate(length(min = 1, max = 100, message = "Consignee state is required"))]
    pub consignee_state: String,
    #[validate(length(min = 1, max = 20, message = "Consignee zip is required"))]
    pub consignee_zip: String,

    #[validate(length(min = 1, message = "Cargo description is required"))]
    pub cargo_description: String,
    #[validate(range(exclusive_min = 0.0, message = "Weight must be positive"))]
    pub weight: f64,
    #[validate(length(max = 100))]
    pub dimensions: Option<String>,
    pub vehicle_type: VehicleType,

    #[validate(range(exclusive_min = 0.0, message = "Estimated rate must be positive"))]
    pub estimated_rate: f64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,

    pub pickup_date: NaiveDate,
    pub estimated_delivery: NaiveDate,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipmentPayload {
    pub status: Option<ShipmentStatus>,
    #[validate(range(exclusive_min = 0.0, message = "Actual rate must be positive"))]
    pub actual_rate: Option<f64>,
    pub delivery_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<UpdateShipmentPayload> for ShipmentChanges {
    fn from(value: UpdateShipmentPayload) -> Self {
        Self {
            status: value.status,
            actual_rate: value.actual_rate,
            delivery_date: value.delivery_date,
            notes: value.notes,
            driver_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriverPayload {
    pub driver_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ShipmentListQuery {
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    pub created_by_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_type: Option<VehicleType>,
    pub shipper_city: Option<String>,
    pub consignee_city: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.is_empty())
}

impl ShipmentListQuery {
    pub fn filter(&self) -> ShipmentFilter {
        ShipmentFilter {
            status: self.status,
            tracking_number: non_empty(&self.tracking_number),
            created_by_id: self.created_by_id,
            driver_id: self.driver_id,
            vehicle_type: self.vehicle_type,
            shipper_city: non_empty(&self.shipper_city),
            consignee_city: non_empty(&self.consignee_city),
            search: non_empty(&self.search),
        }
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
        }
    }
}

pub type ShipmentListResponse = Paginated<Shipment>;
