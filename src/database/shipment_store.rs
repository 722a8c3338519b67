use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::Result;
use crate::models::shipment::{
    NewShipment, Shipment, ShipmentChanges, ShipmentFilter, ShipmentSortField,
};
use crate::pagination::{like_pattern, PageRequest, SortField};

/// Persistence port for shipments.
///
/// Tracking numbers are unique at this layer; timestamps are stamped here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn insert(&self, shipment: NewShipment) -> Result<Shipment>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shipment>>;

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Shipment>>;

    async fn list(
        &self,
        filter: &ShipmentFilter,
        page: &PageRequest<ShipmentSortField>,
    ) -> Result<(Vec<Shipment>, i64)>;

    async fn update(&self, id: Uuid, changes: ShipmentChanges) -> Result<Option<Shipment>>;

    /// Appends `line` to the notes in one write, newline-separated.
    async fn append_note(&self, id: Uuid, line: &str) -> Result<Option<Shipment>>;

    async fn delete(&self, id: Uuid) -> Result<Option<Shipment>>;
}

const SHIPMENT_COLUMNS: &str = "id, tracking_number, status, \
    shipper_name, shipper_phone, shipper_email, shipper_address, shipper_city, shipper_state, shipper_zip, \
    consignee_name, consignee_phone, consignee_email, consignee_address, consignee_city, consignee_state, consignee_zip, \
    cargo_description, weight, dimensions, vehicle_type, \
    estimated_rate, actual_rate, currency, \
    pickup_date, estimated_delivery, delivery_date, \
    notes, created_by_id, driver_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgShipmentStore {
    pool: PgPool,
}

impl PgShipmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ShipmentFilter) {
    let mut keyword = " WHERE ";
    if let Some(status) = filter.status {
        builder.push(keyword).push("status = ").push_bind(status);
        keyword = " AND ";
    }
    if let Some(tracking_number) = &filter.tracking_number {
        builder
            .push(keyword)
            .push("tracking_number = ")
            .push_bind(tracking_number.clone());
        keyword = " AND ";
    }
    if let Some(created_by_id) = filter.created_by_id {
        builder
            .push(keyword)
            .push("created_by_id = ")
            .push_bind(created_by_id);
        keyword = " AND ";
    }
    if let Some(driver_id) = filter.driver_id {
        builder.push(keyword).push("driver_id = ").push_bind(driver_id);
        keyword = " AND ";
    }
    if let Some(vehicle_type) = filter.vehicle_type {
        builder
            .push(keyword)
            .push("vehicle_type = ")
            .push_bind(vehicle_type);
        keyword = " AND ";
    }
    if let Some(city) = &filter.shipper_city {
        builder
            .push(keyword)
            .push("shipper_city ILIKE ")
            .push_bind(like_pattern(city));
        keyword = " AND ";
    }
    if let Some(city) = &filter.consignee_city {
        builder
            .push(keyword)
            .push("consignee_city ILIKE ")
            .push_bind(like_pattern(city));
        keyword = " AND ";
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(keyword)
            .push("(tracking_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR shipper_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR consignee_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cargo_description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ShipmentStore for PgShipmentStore {
    async fn insert(&self, shipment: NewShipment) -> Result<Shipment> {
        let sql = format!(
            r#"
            INSERT INTO shipments (
                id, tracking_number, status,
                shipper_name, shipper_phone, shipper_email, shipper_address, shipper_city, shipper_state, shipper_zip,
                consignee_name, consignee_phone, consignee_email, consignee_address, consignee_city, consignee_state, consignee_zip,
                cargo_description, weight, dimensions, vehicle_type,
                estimated_rate, currency, pickup_date, estimated_delivery,
                notes, created_by_id
            ) VALUES (
                $1, $2, $3,
                $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21,
                $22, $23, $24, $25,
                $26, $27
            )
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        );
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(shipment.id)
            .bind(shipment.tracking_number)
            .bind(shipment.status)
            .bind(shipment.shipper_name)
            .bind(shipment.shipper_phone)
            .bind(shipment.shipper_email)
            .bind(shipment.shipper_address)
            .bind(shipment.shipper_city)
            .bind(shipment.shipper_state)
            .bind(shipment.shipper_zip)
            .bind(shipment.consignee_name)
            .bind(shipment.consignee_phone)
            .bind(shipment.consignee_email)
            .bind(shipment.consignee_address)
            .bind(shipment.consignee_city)
            .bind(shipment.consignee_state)
            .bind(shipment.consignee_zip)
            .bind(shipment.cargo_description)
            .bind(shipment.weight)
            .bind(shipment.dimensions)
            .bind(shipment.vehicle_type)
            .bind(shipment.estimated_rate)
            .bind(shipment.currency)
            .bind(shipment.pickup_date)
            .bind(shipment.estimated_delivery)
            .bind(shipment.notes)
            .bind(shipment.created_by_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shipment>> {
        let sql = format!("SELECT {} FROM shipments WHERE id = $1", SHIPMENT_COLUMNS);
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        let sql = format!(
            "SELECT {} FROM shipments WHERE tracking_number = $1",
            SHIPMENT_COLUMNS
        );
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(tracking_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list(
        &self,
        filter: &ShipmentFilter,
        page: &PageRequest<ShipmentSortField>,
    ) -> Result<(Vec<Shipment>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shipments");
        push_filters(&mut count, filter);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut items =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM shipments", SHIPMENT_COLUMNS));
        push_filters(&mut items, filter);
        items
            .push(" ORDER BY ")
            .push(page.sort_by.column())
            .push(" ")
            .push(page.order.sql())
            .push(", id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let records = items
            .build_query_as::<Shipment>()
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }

    async fn update(&self, id: Uuid, changes: ShipmentChanges) -> Result<Option<Shipment>> {
        let sql = format!(
            r#"
            UPDATE shipments
            SET
                status = COALESCE($2, status),
                actual_rate = COALESCE($3, actual_rate),
                delivery_date = COALESCE($4, delivery_date),
                notes = COALESCE($5, notes),
                driver_id = COALESCE($6, driver_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        );
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .bind(changes.status)
            .bind(changes.actual_rate)
            .bind(changes.delivery_date)
            .bind(changes.notes)
            .bind(changes.driver_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn append_note(&self, id: Uuid, line: &str) -> Result<Option<Shipment>> {
        let sql = format!(
            r#"
            UPDATE shipments
            SET
                notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN $2
                    ELSE notes || E'\n' || $2
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        );
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .bind(line)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Shipment>> {
        let sql = format!(
            "DELETE FROM shipments WHERE id = $1 RETURNING {}",
            SHIPMENT_COLUMNS
        );
        let record = sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}
