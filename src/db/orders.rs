use super::{json_column, to_json, Database};
use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderOwner, STATUS_DELIVERED, STATUS_PROCESSING};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::{info, warn};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, shipping_info, order_items, payment_info, items_price, \
     tax_price, shipping_price, total_price, paid_at, order_status, delivered_at, created_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        user: row.get(1)?,
        shipping_info: json_column(row, 2)?,
        order_items: json_column(row, 3)?,
        payment_info: json_column(row, 4)?,
        items_price: row.get(5)?,
        tax_price: row.get(6)?,
        shipping_price: row.get(7)?,
        total_price: row.get(8)?,
        paid_at: row.get(9)?,
        order_status: row.get(10)?,
        delivered_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

impl Database {
    pub async fn insert_order(&self, user_id: &str, new: &NewOrder) -> Result<Order, AppError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user: user_id.to_string(),
            shipping_info: new.shipping_info.clone(),
            order_items: new.order_items.clone(),
            payment_info: new.payment_info.clone(),
            items_price: new.items_price,
            tax_price: new.tax_price,
            shipping_price: new.shipping_price,
            total_price: new.total_price,
            paid_at: now,
            order_status: STATUS_PROCESSING.to_string(),
            delivered_at: None,
            created_at: now,
        };

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ORDER_COLUMNS
            ),
            params![
                &order.id,
                &order.user,
                to_json(&order.shipping_info)?,
                to_json(&order.order_items)?,
                to_json(&order.payment_info)?,
                order.items_price,
                order.tax_price,
                order.shipping_price,
                order.total_price,
                order.paid_at,
                &order.order_status,
                order.delivered_at,
                order.created_at,
            ],
        )?;
        info!(
            "[DB] Order {} placed by {} ({} items, total {:.2})",
            order.id,
            order.user,
            order.order_items.len(),
            order.total_price
        );
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        let conn = self.conn.lock().await;
        let order = conn
            .query_row(
                &format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS),
                [id],
                order_from_row,
            )
            .optional()?;
        Ok(order)
    }

    /// Name and email of the order's owner, if the account still exists.
    pub async fn get_order_owner(&self, order: &Order) -> Result<Option<OrderOwner>, AppError> {
        Ok(self.get_user(&order.user).await?.map(|u| OrderOwner {
            id: u.id,
            name: u.name,
            email: u.email,
        }))
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY rowid ASC",
            ORDER_COLUMNS
        ))?;
        let orders = stmt
            .query_map([user_id], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM orders ORDER BY rowid ASC", ORDER_COLUMNS))?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// Moves an order to `status`. Entering Delivered takes each item's
    /// quantity out of product stock; the whole change commits or none of it.
    pub async fn update_order_status(&self, id: &str, status: &str) -> Result<Option<Order>, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                &format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS),
                [id],
                order_from_row,
            )
            .optional()?;
        let Some(mut order) = current else {
            return Ok(None);
        };

        if order.order_status == STATUS_DELIVERED {
            return Err(AppError::BadRequest(
                "You have already delivered this order".into(),
            ));
        }

        if status == STATUS_DELIVERED {
            for item in &order.order_items {
                let changed = tx.execute(
                    "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
                    params![item.quantity, &item.product],
                )?;
                if changed == 0 {
                    let exists: Option<i64> = tx
                        .query_row("SELECT stock FROM products WHERE id = ?", [&item.product], |row| {
                            row.get(0)
                        })
                        .optional()?;
                    return Err(match exists {
                        Some(stock) => {
                            warn!(
                                "[DB] Order {}: {} has {} in stock, {} requested",
                                id, item.product, stock, item.quantity
                            );
                            AppError::BadRequest(format!("Not enough stock for {}", item.name))
                        }
                        None => AppError::NotFound(format!("Product not found: {}", item.product)),
                    });
                }
            }
            order.delivered_at = Some(Utc::now());
        }

        order.order_status = status.to_string();
        tx.execute(
            "UPDATE orders SET order_status = ?, delivered_at = ? WHERE id = ?",
            params![&order.order_status, order.delivered_at, id],
        )?;
        tx.commit()?;

        info!("[DB] Order {} moved to {}", id, order.order_status);
        Ok(Some(order))
    }

    pub async fn delete_order(&self, id: &str) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM orders WHERE id = ?", [id])?;
        info!("[DB] Order deleted: {} ({} rows)", id, deleted);
        Ok(deleted > 0)
    }
}
