pub mod auth_dto;
pub mod shipment_dto;
pub mod user_dto;
