use crate::error::AppError;
use rusqlite::{types::Type, Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

mod orders;
mod products;
mod users;


// Define a struct to represent a database connection
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Create a new database connection
    pub fn new(db_path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(db_path)?;
        info!("[DB] Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().await;

        // 1. Users table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                avatar TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                reset_password_token TEXT,
                reset_password_expire TEXT,
                created_at TEXT NOT NULL
            );",
        )
        .map_err(|e| {
            tracing::error!("[DB] Failed creating users table: {}", e);
            e
        })?;

        // 2. Products table; reviews are kept as a JSON document next to
        //    the aggregate columns derived from them
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price REAL NOT NULL DEFAULT 0,
                description TEXT NOT NULL,
                ratings REAL NOT NULL DEFAULT 0,
                images TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL,
                seller TEXT NOT NULL,
                stock INTEGER NOT NULL DEFAULT 0,
                num_of_reviews INTEGER NOT NULL DEFAULT 0,
                reviews TEXT NOT NULL DEFAULT '[]',
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);",
        )
        .map_err(|e| {
            tracing::error!("[DB] Failed creating products table: {}", e);
            e
        })?;

        // 3. Orders table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                shipping_info TEXT NOT NULL,
                order_items TEXT NOT NULL,
                payment_info TEXT NOT NULL,
                items_price REAL NOT NULL DEFAULT 0,
                tax_price REAL NOT NULL DEFAULT 0,
                shipping_price REAL NOT NULL DEFAULT 0,
                total_price REAL NOT NULL DEFAULT 0,
                paid_at TEXT NOT NULL,
                order_status TEXT NOT NULL DEFAULT 'Processing',
                delivered_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);",
        )
        .map_err(|e| {
            tracing::error!("[DB] Failed creating orders table: {}", e);
            e
        })?;

        info!("[DB] Schema ready");
        Ok(())
    }
}

/// Reads a JSON document column, surfacing decode failures as a column conversion error.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}
