use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_PROCESSING: &str = "Processing";
pub const STATUS_SHIPPED: &str = "Shipped";
pub const STATUS_DELIVERED: &str = "Delivered";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub phone_no: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub image: String,
    pub price: f64,
    pub product: String, // ID of the ordered product
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Order {
    pub id: String,
    pub user: String,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    pub payment_info: PaymentInfo,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub paid_at: DateTime<Utc>,
    pub order_status: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Owner summary attached to a single-order lookup.
#[derive(Serialize, Debug, Clone)]
pub struct OrderOwner {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewOrder {
    pub order_items: Vec<OrderItem>,
    pub shipping_info: ShippingInfo,
    pub payment_info: PaymentInfo,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), String> {
        if self.order_items.is_empty() {
            return Err("Order must contain at least one item".into());
        }
        for item in &self.order_items {
            if item.quantity == 0 {
                return Err(format!("Quantity for {} must be at least 1", item.name));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(format!("Price for {} must not be negative", item.name));
            }
            if item.product.trim().is_empty() {
                return Err(format!("Item {} is missing its product id", item.name));
            }
        }
        for (label, amount) in [
            ("items price", self.items_price),
            ("tax price", self.tax_price),
            ("shipping price", self.shipping_price),
            ("total price", self.total_price),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!("The {} must not be negative", label));
            }
        }
        let info = &self.shipping_info;
        if [
            &info.address,
            &info.city,
            &info.phone_no,
            &info.postal_code,
            &info.country,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err("Please enter complete shipping info".into());
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct OrderStatusUpdate {
    pub status: String,
}

impl OrderStatusUpdate {
    pub fn validate(&self) -> Result<(), String> {
        match self.status.as_str() {
            STATUS_PROCESSING | STATUS_SHIPPED | STATUS_DELIVERED => Ok(()),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}
