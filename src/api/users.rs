use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::user::AdminUpdateUserRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

fn user_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("User was not found with id: {}", id))
}

// all users => /api/v1/admin/users
pub async fn all_users(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let users = state.db.list_users().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "users": users,
    })))
}

// user details => /api/v1/admin/user/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| user_not_found(&id))?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
    })))
}

// update user => /api/v1/admin/user/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    id: web::Path<String>,
    body: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    let user = state
        .db
        .update_user(&id, &req.name, &req.email, Some(&req.role))
        .await?
        .ok_or_else(|| user_not_found(&id))?;

    info!("[API] Admin {} updated user {} (role {})", admin.id, user.id, user.role);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
    })))
}

// delete user => /api/v1/admin/user/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if !state.db.delete_user(&id).await? {
        return Err(user_not_found(&id));
    }
    info!("[API] Admin {} deleted user {}", admin.id, id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
