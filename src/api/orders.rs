use crate::auth::{AdminUser, AuthUser};
use crate::error::AppError;
use crate::models::order::{NewOrder, OrderStatusUpdate};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

fn order_not_found() -> AppError {
    AppError::NotFound("No Order found with this ID".into())
}

// create a new order => /api/v1/order/new
pub async fn create_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<NewOrder>,
) -> Result<HttpResponse, AppError> {
    let new = body.into_inner();
    new.validate().map_err(AppError::Validation)?;

    let order = state.db.insert_order(&user.id, &new).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "order": order,
    })))
}

// single order => /api/v1/order/{id}
pub async fn get_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order = state.db.get_order(&id).await?.ok_or_else(order_not_found)?;
    // other users' orders are reported as missing
    if order.user != user.id && !user.is_admin() {
        return Err(order_not_found());
    }
    let owner = state.db.get_order_owner(&order).await?;

    let mut body = serde_json::to_value(&order)?;
    body["user"] = json!(owner);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "order": body,
    })))
}

// logged in user's orders => /api/v1/orders/me
pub async fn my_orders(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
) -> Result<HttpResponse, AppError> {
    let orders = state.db.orders_for_user(&user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "orders": orders,
    })))
}

// all orders => /api/v1/admin/orders
pub async fn all_orders(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let orders = state.db.all_orders().await?;
    let total_amount: f64 = orders.iter().map(|o| o.total_price).sum();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total_amount": total_amount,
        "orders": orders,
    })))
}

// process order => /api/v1/admin/order/{id}
pub async fn update_order(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    id: web::Path<String>,
    body: web::Json<OrderStatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let update = body.into_inner();
    update.validate().map_err(AppError::Validation)?;

    let order = state
        .db
        .update_order_status(&id, &update.status)
        .await?
        .ok_or_else(order_not_found)?;

    info!("[API] Admin {} set order {} to {}", admin.id, order.id, order.order_status);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "order": order,
    })))
}

// delete order => /api/v1/admin/order/{id}
pub async fn delete_order(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if !state.db.delete_order(&id).await? {
        return Err(order_not_found());
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
