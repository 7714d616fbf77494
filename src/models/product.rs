use crate::models::review::Review;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RES_PER_PAGE: u32 = 8;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PRICE: f64 = 99_999.99;
pub const MAX_STOCK: i64 = 99_999;

pub const CATEGORIES: [&str; 12] = [
    "Electronics",
    "Cameras",
    "Laptops",
    "Accessories",
    "Headphones",
    "Food",
    "Books",
    "Clothes/Shoes",
    "Beauty/Health",
    "Sports",
    "Outdoor",
    "Home",
];

/// An already-hosted image, as returned by the media host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Image {
    pub public_id: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub ratings: f64,
    pub images: Vec<Image>,
    pub category: String,
    pub seller: String,
    pub stock: i64,
    pub num_of_reviews: u32,
    pub reviews: Vec<Review>,
    pub user: String, // ID of the admin who created the product
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/admin/product/new`.
#[derive(Deserialize, Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub category: String,
    pub seller: String,
    #[serde(default)]
    pub stock: i64,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        if self.description.trim().is_empty() {
            return Err("Please enter product description".into());
        }
        validate_category(&self.category)?;
        if self.seller.trim().is_empty() {
            return Err("Please enter product seller".into());
        }
        validate_stock(self.stock)
    }
}

/// Body of `PUT /api/v1/admin/product/{id}`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub images: Option<Vec<Image>>,
    pub category: Option<String>,
    pub seller: Option<String>,
    pub stock: Option<i64>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(seller) = self.seller {
            product.seller = seller;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Query of `GET /api/v1/products`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_ratings: Option<f64>,
    pub page: Option<u32>,
}

impl ProductQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Serialize, Debug)]
pub struct ProductPage {
    pub products_count: i64,
    pub filtered_count: i64,
    pub res_per_page: u32,
    pub products: Vec<Product>,
}

fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please enter product name".into());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Product name cannot exceed {} characters",
            MAX_NAME_LEN
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || !(0.0..=MAX_PRICE).contains(&price) {
        return Err(format!("Product price must be between 0 and {}", MAX_PRICE));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), String> {
    if CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err("Please select correct category for product".into())
    }
}

fn validate_stock(stock: i64) -> Result<(), String> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(format!("Product stock must be between 0 and {}", MAX_STOCK));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            name: "SanDisk Ultra 128GB".into(),
            price: 45.89,
            description: "Memory card".into(),
            images: vec![],
            category: "Electronics".into(),
            seller: "Ebay".into(),
            stock: 50,
        }
    }

    #[test]
    fn accepts_valid_product() {
        assert!(new_product().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_category() {
        let mut p = new_product();
        p.category = "Toys".into();
        assert_eq!(
            p.validate().unwrap_err(),
            "Please select correct category for product"
        );
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let mut p = new_product();
        p.price = 100_000.0;
        assert!(p.validate().is_err());

        let mut p = new_product();
        p.stock = -1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut product = Product {
            id: "p1".into(),
            name: "Old".into(),
            price: 10.0,
            description: "d".into(),
            ratings: 0.0,
            images: vec![],
            category: "Books".into(),
            seller: "s".into(),
            stock: 3,
            num_of_reviews: 0,
            reviews: vec![],
            user: "admin".into(),
            created_at: Utc::now(),
        };
        let update = ProductUpdate {
            price: Some(12.5),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        update.apply(&mut product);
        assert_eq!(product.price, 12.5);
        assert_eq!(product.name, "Old");
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(ProductQuery::default().page(), 1);
        let q = ProductQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(q.page(), 1);
    }
}
