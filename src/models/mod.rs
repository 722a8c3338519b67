pub mod shipment;
pub mod user;
