use super::{json_column, to_json, Database};
use crate::error::AppError;
use crate::models::product::{NewProduct, Product, ProductPage, ProductQuery, ProductUpdate, RES_PER_PAGE};
use crate::models::review::Review;
use crate::models::user::User;
use crate::reviews::{self, ReviewAggregate};
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, price, description, ratings, images, category, seller, \
     stock, num_of_reviews, reviews, user_id, created_at";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
        ratings: row.get(4)?,
        images: json_column(row, 5)?,
        category: row.get(6)?,
        seller: row.get(7)?,
        stock: row.get(8)?,
        num_of_reviews: row.get(9)?,
        reviews: json_column(row, 10)?,
        user: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn load_reviews(tx: &Transaction<'_>, product_id: &str) -> Result<Option<Vec<Review>>, AppError> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT reviews FROM products WHERE id = ?",
            [product_id],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn store_aggregate(tx: &Transaction<'_>, product_id: &str, agg: &ReviewAggregate) -> Result<(), AppError> {
    tx.execute(
        "UPDATE products SET reviews = ?, num_of_reviews = ?, ratings = ? WHERE id = ?",
        params![to_json(&agg.reviews)?, agg.num_of_reviews, agg.ratings, product_id],
    )?;
    Ok(())
}

impl Database {
    pub async fn insert_product(&self, creator_id: &str, new: &NewProduct) -> Result<Product, AppError> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            price: new.price,
            description: new.description.clone(),
            ratings: 0.0,
            images: new.images.clone(),
            category: new.category.clone(),
            seller: new.seller.clone(),
            stock: new.stock,
            num_of_reviews: 0,
            reviews: Vec::new(),
            user: creator_id.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO products ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)", PRODUCT_COLUMNS),
            params![
                &product.id,
                &product.name,
                product.price,
                &product.description,
                product.ratings,
                to_json(&product.images)?,
                &product.category,
                &product.seller,
                product.stock,
                product.num_of_reviews,
                to_json(&product.reviews)?,
                &product.user,
                product.created_at,
            ],
        )?;
        info!("[DB] Product created: {} ({})", product.name, product.id);
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        let conn = self.conn.lock().await;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
                [id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    /// Keyword/category/price/rating filtering with fixed-size pages.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, AppError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            clauses.push("instr(lower(name), lower(?)) > 0");
            args.push(Value::Text(keyword.to_string()));
        }
        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            clauses.push("category = ?");
            args.push(Value::Text(category.to_string()));
        }
        if let Some(min) = query.min_price {
            clauses.push("price >= ?");
            args.push(Value::Real(min));
        }
        if let Some(max) = query.max_price {
            clauses.push("price <= ?");
            args.push(Value::Real(max));
        }
        if let Some(min) = query.min_ratings {
            clauses.push("ratings >= ?");
            args.push(Value::Real(min));
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock().await;
        let products_count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        let filtered_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM products{}", filter),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let offset = (i64::from(query.page()) - 1) * i64::from(RES_PER_PAGE);
        let mut page_args = args.clone();
        page_args.push(Value::Integer(i64::from(RES_PER_PAGE)));
        page_args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products{} ORDER BY rowid ASC LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS, filter
        ))?;
        let products = stmt
            .query_map(params_from_iter(page_args.iter()), product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "[DB] Product page {}: {} of {} matching ({} total)",
            query.page(),
            products.len(),
            filtered_count,
            products_count
        );

        Ok(ProductPage {
            products_count,
            filtered_count,
            res_per_page: RES_PER_PAGE,
            products,
        })
    }

    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<Option<Product>, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
                [id],
                product_from_row,
            )
            .optional()?;
        let Some(mut product) = current else {
            return Ok(None);
        };

        update.apply(&mut product);
        tx.execute(
            "UPDATE products SET name = ?, price = ?, description = ?, images = ?,
                category = ?, seller = ?, stock = ?
             WHERE id = ?",
            params![
                &product.name,
                product.price,
                &product.description,
                to_json(&product.images)?,
                &product.category,
                &product.seller,
                product.stock,
                id,
            ],
        )?;
        tx.commit()?;
        info!("[DB] Product updated: {}", id);
        Ok(Some(product))
    }

    pub async fn delete_product(&self, id: &str) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM products WHERE id = ?", [id])?;
        info!("[DB] Product deleted: {} ({} rows)", id, deleted);
        Ok(deleted > 0)
    }

    pub async fn get_reviews(&self, product_id: &str) -> Result<Option<Vec<Review>>, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let reviews = load_reviews(&tx, product_id)?;
        tx.commit()?;
        Ok(reviews)
    }

    /// Reads, reconciles and writes back the product's reviews inside one
    /// IMMEDIATE transaction. `None` when the product does not exist.
    pub async fn upsert_review(
        &self,
        product_id: &str,
        author: &User,
        rating: u8,
        comment: &str,
    ) -> Result<Option<ReviewAggregate>, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(existing) = load_reviews(&tx, product_id)? else {
            return Ok(None);
        };
        let agg = reviews::upsert_review(&existing, &author.id, &author.name, rating, comment);
        store_aggregate(&tx, product_id, &agg)?;
        tx.commit()?;

        info!(
            "[DB] Review by {} saved on {}: {} reviews, rating {:.2}",
            author.id, product_id, agg.num_of_reviews, agg.ratings
        );
        Ok(Some(agg))
    }

    /// Removes a review on behalf of `requester`, who must be its author or an admin.
    /// An unknown review id leaves the product untouched.
    pub async fn remove_review(
        &self,
        product_id: &str,
        review_id: &str,
        requester: &User,
    ) -> Result<Option<ReviewAggregate>, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(existing) = load_reviews(&tx, product_id)? else {
            return Ok(None);
        };
        if let Some(target) = existing.iter().find(|r| r.id == review_id) {
            if target.user != requester.id && !requester.is_admin() {
                return Err(AppError::Forbidden(
                    "You can only delete your own reviews".into(),
                ));
            }
        }

        let agg = reviews::remove_review(&existing, review_id);
        store_aggregate(&tx, product_id, &agg)?;
        tx.commit()?;

        info!(
            "[DB] Review {} removed from {}: {} reviews left",
            review_id, product_id, agg.num_of_reviews
        );
        Ok(Some(agg))
    }
}
