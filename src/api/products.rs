use crate::auth::{AdminUser, AuthUser};
use crate::error::AppError;
use crate::models::product::{NewProduct, ProductQuery, ProductUpdate};
use crate::models::review::{DeleteReviewQuery, ProductReviewsQuery, ReviewRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".into())
}

// create new product => /api/v1/admin/product/new
pub async fn create_product(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
    let new = body.into_inner();
    new.validate().map_err(AppError::Validation)?;

    let product = state.db.insert_product(&admin.id, &new).await?;
    info!("[API] Product {} created by {}", product.id, admin.id);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "product": product,
    })))
}

// get all products => /api/v1/products?keyword=apple
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
    let page = state.db.list_products(&query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "products_count": page.products_count,
        "filtered_count": page.filtered_count,
        "res_per_page": page.res_per_page,
        "products": page.products,
    })))
}

// get single product details => /api/v1/product/{id}
pub async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product = state.db.get_product(&id).await?.ok_or_else(product_not_found)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "product": product,
    })))
}

// update product => /api/v1/admin/product/{id}
pub async fn update_product(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<String>,
    body: web::Json<ProductUpdate>,
) -> Result<HttpResponse, AppError> {
    let update = body.into_inner();
    update.validate().map_err(AppError::Validation)?;

    let product = state
        .db
        .update_product(&id, update)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "product": product,
    })))
}

// delete product => /api/v1/admin/product/{id}
pub async fn delete_product(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if !state.db.delete_product(&id).await? {
        return Err(product_not_found());
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Product is deleted",
    })))
}

// create or update the caller's review => /api/v1/review
pub async fn upsert_review(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let review = body.into_inner();
    review.validate().map_err(AppError::Validation)?;

    let agg = state
        .db
        .upsert_review(&review.product_id, &user, review.rating, review.comment.trim())
        .await?
        .ok_or_else(product_not_found)?;

    info!(
        "[API] Review by {} on {}: {} reviews, rating {:.2}",
        user.id, review.product_id, agg.num_of_reviews, agg.ratings
    );
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "num_of_reviews": agg.num_of_reviews,
        "ratings": agg.ratings,
    })))
}

// get product reviews => /api/v1/reviews?id=
pub async fn get_reviews(
    state: web::Data<AppState>,
    query: web::Query<ProductReviewsQuery>,
) -> Result<HttpResponse, AppError> {
    let reviews = state
        .db
        .get_reviews(&query.id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "reviews": reviews,
    })))
}

// delete a review => /api/v1/reviews?product_id=&id=
pub async fn delete_review(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<DeleteReviewQuery>,
) -> Result<HttpResponse, AppError> {
    let agg = state
        .db
        .remove_review(&query.product_id, &query.id, &user)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "num_of_reviews": agg.num_of_reviews,
        "ratings": agg.ratings,
    })))
}
