use crate::error::AppError;
use actix_web::{error::JsonPayloadError, error::QueryPayloadError, web, HttpRequest};

pub mod auth;
pub mod orders;
pub mod products;
pub mod users;

/// Registers every route under `/api/v1`, plus body and query error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api/v1")
                // auth
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::get().to(auth::logout))
                .route("/me", web::get().to(auth::profile))
                .route("/me/update", web::put().to(auth::update_profile))
                .route("/password/update", web::put().to(auth::update_password))
                .route("/password/forgot", web::post().to(auth::forgot_password))
                .route("/password/reset/{token}", web::put().to(auth::reset_password))
                // products and reviews
                .route("/products", web::get().to(products::list_products))
                .route("/product/{id}", web::get().to(products::get_product))
                .route("/admin/product/new", web::post().to(products::create_product))
                .route("/admin/product/{id}", web::put().to(products::update_product))
                .route("/admin/product/{id}", web::delete().to(products::delete_product))
                .route("/review", web::put().to(products::upsert_review))
                .route("/reviews", web::get().to(products::get_reviews))
                .route("/reviews", web::delete().to(products::delete_review))
                // orders
                .route("/order/new", web::post().to(orders::create_order))
                .route("/order/{id}", web::get().to(orders::get_order))
                .route("/orders/me", web::get().to(orders::my_orders))
                .route("/admin/orders", web::get().to(orders::all_orders))
                .route("/admin/order/{id}", web::put().to(orders::update_order))
                .route("/admin/order/{id}", web::delete().to(orders::delete_order))
                // user administration
                .route("/admin/users", web::get().to(users::all_users))
                .route("/admin/user/{id}", web::get().to(users::get_user))
                .route("/admin/user/{id}", web::put().to(users::update_user))
                .route("/admin/user/{id}", web::delete().to(users::delete_user)),
        );
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}
