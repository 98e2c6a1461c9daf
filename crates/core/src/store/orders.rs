//! Order CRUD operations.
//!
//! Provides functions for creating, reading, updating and deleting order
//! rows, plus the filtered listings the sync and import paths run on.

use super::connection::StoreDb;
use crate::Error;
use crate::model::{Order, Status};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use tokio_rusqlite::rusqlite::params_from_iter;

/// Filters for [`StoreDb::list_orders`].
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Exclude delivered orders when false.
    pub include_delivered: bool,
    /// LIKE search over description, seller and notes.
    pub search: Option<String>,
    /// Exact platform match.
    pub platform: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
}

impl OrderFilter {
    /// Everything in the store, no filtering.
    pub fn all() -> Self {
        Self { include_delivered: true, ..Default::default() }
    }

    /// Only orders still in flight. This is the candidate set the
    /// reconciliation engine matches signals against.
    pub fn active() -> Self {
        Self { include_delivered: false, ..Default::default() }
    }
}

const ORDER_COLUMNS: &str = "id, order_date, platform, seller, destination, description, link, quantity,
    estimated_delivery, alarm_enabled, is_delivered, position, notes, category,
    last_email_id, last_sync_at, tracking_number, carrier, last_mile_carrier,
    site_order_id, status, price, image_url, created_at, updated_at";

fn order_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let status_label: String = row.get(20)?;
    Ok(Order {
        id: row.get(0)?,
        order_date: row.get(1)?,
        platform: row.get(2)?,
        seller: row.get(3)?,
        destination: row.get(4)?,
        description: row.get(5)?,
        link: row.get(6)?,
        quantity: row.get::<_, i64>(7)? as u32,
        estimated_delivery: row.get(8)?,
        alarm_enabled: row.get::<_, i64>(9)? == 1,
        is_delivered: row.get::<_, i64>(10)? == 1,
        position: row.get(11)?,
        notes: row.get(12)?,
        category: row.get(13)?,
        last_email_id: row.get(14)?,
        last_sync_at: row.get(15)?,
        tracking_number: row.get(16)?,
        carrier: row.get(17)?,
        last_mile_carrier: row.get(18)?,
        site_order_id: row.get(19)?,
        status: Status::from_label(&status_label).unwrap_or_default(),
        price: row.get(21)?,
        image_url: row.get(22)?,
        created_at: row.get(23)?,
        updated_at: row.get(24)?,
    })
}

fn validate(order: &Order) -> Result<(), Error> {
    if order.description.trim().is_empty() {
        return Err(Error::InvalidInput("description must not be empty".into()));
    }
    if order.order_date.trim().is_empty() {
        return Err(Error::InvalidInput("order_date must not be empty".into()));
    }
    if order.quantity < 1 {
        return Err(Error::InvalidInput("quantity must be at least 1".into()));
    }
    if let Some(price) = order.price
        && price < 0.0
    {
        return Err(Error::InvalidInput("price must not be negative".into()));
    }
    Ok(())
}

impl StoreDb {
    /// Insert a new order and return its assigned id.
    ///
    /// The `id`, `created_at` and `updated_at` fields of the argument are
    /// ignored; `is_delivered` is re-derived from the status so the two can
    /// never disagree on disk.
    pub async fn insert_order(&self, order: &Order) -> Result<i64, Error> {
        validate(order)?;
        let order = order.clone();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO orders (
                        order_date, platform, seller, destination, description, link, quantity,
                        estimated_delivery, alarm_enabled, is_delivered, position, notes, category,
                        last_email_id, last_sync_at, tracking_number, carrier, last_mile_carrier,
                        site_order_id, status, price, image_url
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                              ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
                    params![
                        &order.order_date,
                        &order.platform,
                        &order.seller,
                        &order.destination,
                        &order.description,
                        &order.link,
                        order.quantity as i64,
                        &order.estimated_delivery,
                        order.alarm_enabled as i32,
                        (order.status == Status::Delivered) as i32,
                        &order.position,
                        &order.notes,
                        &order.category,
                        &order.last_email_id,
                        &order.last_sync_at,
                        &order.tracking_number,
                        &order.carrier,
                        &order.last_mile_carrier,
                        &order.site_order_id,
                        order.status.as_label(),
                        &order.price,
                        &order.image_url,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an order by id. Returns None if the id doesn't exist.
    pub async fn get_order(&self, id: i64) -> Result<Option<Order>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<Order>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))?;
                let result = stmt.query_row(params![id], order_from_row);
                match result {
                    Ok(order) => Ok(Some(order)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Update an existing order in full.
    ///
    /// Returns false if the id doesn't exist. As with insert, the delivered
    /// flag is re-derived from the status.
    pub async fn update_order(&self, id: i64, order: &Order) -> Result<bool, Error> {
        validate(order)?;
        let order = order.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute(
                    "UPDATE orders SET
                        order_date = ?1, platform = ?2, seller = ?3, destination = ?4,
                        description = ?5, link = ?6, quantity = ?7, estimated_delivery = ?8,
                        alarm_enabled = ?9, is_delivered = ?10, position = ?11, notes = ?12,
                        category = ?13, last_email_id = ?14, last_sync_at = ?15,
                        tracking_number = ?16, carrier = ?17, last_mile_carrier = ?18,
                        site_order_id = ?19, status = ?20, price = ?21, image_url = ?22,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?23",
                    params![
                        &order.order_date,
                        &order.platform,
                        &order.seller,
                        &order.destination,
                        &order.description,
                        &order.link,
                        order.quantity as i64,
                        &order.estimated_delivery,
                        order.alarm_enabled as i32,
                        (order.status == Status::Delivered) as i32,
                        &order.position,
                        &order.notes,
                        &order.category,
                        &order.last_email_id,
                        &order.last_sync_at,
                        &order.tracking_number,
                        &order.carrier,
                        &order.last_mile_carrier,
                        &order.site_order_id,
                        order.status.as_label(),
                        &order.price,
                        &order.image_url,
                        id,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an order. Returns false if the id doesn't exist.
    pub async fn delete_order(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Mark an order delivered (or not), keeping status and flag in step.
    ///
    /// Delivering moves the status to Consegnato; un-delivering resets a
    /// Consegnato status back to In Attesa and leaves any other status alone.
    pub async fn mark_delivered(&self, id: i64, delivered: bool) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute(
                    "UPDATE orders SET
                        is_delivered = ?1,
                        status = CASE
                            WHEN ?1 THEN 'Consegnato'
                            WHEN status = 'Consegnato' THEN 'In Attesa'
                            ELSE status
                        END,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?2",
                    params![delivered as i32, id],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List orders matching the filter, newest first then soonest delivery.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<Order>, Error> {
                let mut query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
                let mut args: Vec<String> = Vec::new();

                if !filter.include_delivered {
                    query.push_str(" AND is_delivered = 0");
                }
                if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
                    query.push_str(" AND (description LIKE ? OR seller LIKE ? OR notes LIKE ?)");
                    let like = format!("%{search}%");
                    args.extend([like.clone(), like.clone(), like]);
                }
                if let Some(platform) = filter.platform.filter(|p| !p.is_empty()) {
                    query.push_str(" AND platform = ?");
                    args.push(platform);
                }
                if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
                    query.push_str(" AND category = ?");
                    args.push(category);
                }
                query.push_str(" ORDER BY created_at DESC, estimated_delivery ASC");

                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(params_from_iter(args.iter()), order_from_row)?;
                let mut orders = Vec::new();
                for row in rows {
                    orders.push(row?);
                }
                Ok(orders)
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct platform names across all orders.
    pub async fn platforms(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT DISTINCT platform FROM orders WHERE platform != '' ORDER BY platform")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut platforms = Vec::new();
                for row in rows {
                    platforms.push(row?);
                }
                Ok(platforms)
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct platforms that still have undelivered orders.
    ///
    /// Drives the mailbox folder selection: only folders for platforms with
    /// something in flight are worth scanning.
    pub async fn active_platforms(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT platform FROM orders
                     WHERE is_delivered = 0 AND platform != '' ORDER BY platform",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut platforms = Vec::new();
                for row in rows {
                    platforms.push(row?);
                }
                Ok(platforms)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order(description: &str) -> Order {
        Order {
            order_date: "2026-01-10".to_string(),
            platform: "Amazon".to_string(),
            description: description.to_string(),
            quantity: 1,
            alarm_enabled: true,
            status: Status::Pending,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let id = db.insert_order(&make_order("Cavo USB-C 2m")).await.unwrap();

        let order = db.get_order(id).await.unwrap().unwrap();
        assert_eq!(order.description, "Cavo USB-C 2m");
        assert_eq!(order.quantity, 1);
        assert_eq!(order.status, Status::Pending);
        assert!(!order.is_delivered);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = StoreDb::open_in_memory().await.unwrap();
        assert!(db.get_order(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_zero_quantity() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let order = Order { quantity: 0, ..make_order("Qualcosa") };
        let result = db.insert_order(&order).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_insert_derives_delivered_flag() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let mut order = make_order("Lampada da scrivania");
        order.status = Status::Delivered;
        order.is_delivered = false; // deliberately out of step
        let id = db.insert_order(&order).await.unwrap();

        let stored = db.get_order(id).await.unwrap().unwrap();
        assert!(stored.is_delivered);
    }

    #[tokio::test]
    async fn test_update_order() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let id = db.insert_order(&make_order("Custodia telefono")).await.unwrap();

        let mut order = db.get_order(id).await.unwrap().unwrap();
        order.tracking_number = "1Z999AA10123456784".to_string();
        order.set_status(Status::Shipped);
        assert!(db.update_order(id, &order).await.unwrap());

        let stored = db.get_order(id).await.unwrap().unwrap();
        assert_eq!(stored.tracking_number, "1Z999AA10123456784");
        assert_eq!(stored.status, Status::Shipped);
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let db = StoreDb::open_in_memory().await.unwrap();
        assert!(!db.update_order(99, &make_order("Fantasma")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_order() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let id = db.insert_order(&make_order("Da cancellare")).await.unwrap();
        assert!(db.delete_order(id).await.unwrap());
        assert!(db.get_order(id).await.unwrap().is_none());
        assert!(!db.delete_order(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_delivered_syncs_status() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let id = db.insert_order(&make_order("Zaino")).await.unwrap();

        db.mark_delivered(id, true).await.unwrap();
        let order = db.get_order(id).await.unwrap().unwrap();
        assert!(order.is_delivered);
        assert_eq!(order.status, Status::Delivered);

        db.mark_delivered(id, false).await.unwrap();
        let order = db.get_order(id).await.unwrap().unwrap();
        assert!(!order.is_delivered);
        assert_eq!(order.status, Status::Pending);
    }

    #[tokio::test]
    async fn test_list_filters_delivered() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.insert_order(&make_order("In arrivo")).await.unwrap();
        let delivered_id = db.insert_order(&make_order("Arrivato")).await.unwrap();
        db.mark_delivered(delivered_id, true).await.unwrap();

        let all = db.list_orders(OrderFilter::all()).await.unwrap();
        assert_eq!(all.len(), 2);

        let active = db.list_orders(OrderFilter::active()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].description, "In arrivo");
    }

    #[tokio::test]
    async fn test_list_search_and_platform_filter() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.insert_order(&make_order("Tastiera meccanica")).await.unwrap();
        let mut temu = make_order("Mouse wireless");
        temu.platform = "Temu".to_string();
        db.insert_order(&temu).await.unwrap();

        let filter = OrderFilter { search: Some("meccanica".into()), ..OrderFilter::all() };
        let hits = db.list_orders(filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "Tastiera meccanica");

        let filter = OrderFilter { platform: Some("Temu".into()), ..OrderFilter::all() };
        let hits = db.list_orders(filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].platform, "Temu");
    }

    #[tokio::test]
    async fn test_active_platforms() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let mut amazon = make_order("Libro");
        amazon.platform = "Amazon".to_string();
        let delivered_id = db.insert_order(&amazon).await.unwrap();
        db.mark_delivered(delivered_id, true).await.unwrap();

        let mut temu = make_order("Portachiavi");
        temu.platform = "Temu".to_string();
        db.insert_order(&temu).await.unwrap();

        assert_eq!(db.active_platforms().await.unwrap(), vec!["Temu".to_string()]);
        assert_eq!(db.platforms().await.unwrap(), vec!["Amazon".to_string(), "Temu".to_string()]);
    }
}
