pub mod memory;
pub mod pool;
pub mod shipment_store;
pub mod user_store;

pub use shipment_store::{PgShipmentStore, ShipmentStore};
pub use user_store::{PgUserStore, UserStore};
