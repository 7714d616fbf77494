//! ShopIT: a storefront backend with accounts, a product catalogue with
//! reviews, and order processing, served as a JSON API over actix-web and
//! persisted in SQLite.
use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod reviews;

pub mod models {
    pub mod order;
    pub mod product;
    pub mod review;
    pub mod user;
}

use config::Config;
use db::Database;
use mailer::Mailer;

/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: Database, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, config, mailer }
    }
}
