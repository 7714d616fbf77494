use crate::auth::{self as session, AuthUser, RESET_TOKEN_MINUTES};
use crate::error::AppError;
use crate::mailer::Email;
use crate::models::user::{
    validate_password, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdatePasswordRequest, UpdateProfileRequest,
};
use crate::AppState;
use actix_web::{http::StatusCode, web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{error, info, warn};

// register a user => /api/v1/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    let hash =
        session::hash_password_async(req.password.clone(), state.config.password_iterations)
            .await?;
    let user = state
        .db
        .insert_user(&req.name, &req.email, &hash, req.avatar.as_ref())
        .await?;

    info!("[API] Registered user {}", user.id);
    session::send_token(&user, StatusCode::CREATED, &state)
}

// login user => /api/v1/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = body.into_inner();
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Please enter email & password".into(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid Email or Password".into());
    let creds = state
        .db
        .find_credentials_by_email(&email)
        .await?
        .ok_or_else(invalid)?;
    if !session::verify_password_async(password, creds.password_hash.clone()).await? {
        warn!("[API] Failed login for {}", creds.user.id);
        return Err(invalid());
    }

    session::send_token(&creds.user, StatusCode::OK, &state)
}

// logout user => /api/v1/logout
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(session::clear_token_cookie())
        .json(json!({
            "success": true,
            "message": "Logged out",
        }))
}

// currently logged in user => /api/v1/me
pub async fn profile(AuthUser(user): AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
    }))
}

// change password => /api/v1/password/update
pub async fn update_password(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let creds = state
        .db
        .get_credentials(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !session::verify_password_async(req.old_password.clone(), creds.password_hash.clone()).await? {
        return Err(AppError::Unauthorized("Old password is incorrect".into()));
    }
    validate_password(&req.password).map_err(AppError::Validation)?;

    let hash =
        session::hash_password_async(req.password.clone(), state.config.password_iterations)
            .await?;
    state.db.set_password(&user.id, &hash).await?;
    session::send_token(&creds.user, StatusCode::OK, &state)
}

// update profile => /api/v1/me/update
pub async fn update_profile(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    let updated = state
        .db
        .update_user(&user.id, &req.name, &req.email, None)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": updated,
    })))
}

// forgot password => /api/v1/password/forgot
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .db
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found with this email".into()))?;

    let (token, digest) = session::new_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_MINUTES);
    state.db.set_reset_token(&user.id, &digest, expires_at).await?;

    let reset_url = format!(
        "{}/password/reset/{}",
        state.config.frontend_url.trim_end_matches('/'),
        token
    );
    let email = Email {
        to: user.email.clone(),
        subject: "ShopIT Password Recovery".into(),
        body: format!(
            "Your password reset token is as follows:\n\n{}\n\nIf you have not requested this email, then ignore it.",
            reset_url
        ),
    };

    if let Err(e) = state.mailer.send(&email) {
        error!("[API] Reset email to {} failed: {}", user.email, e);
        state.db.clear_reset_token(&user.id).await?;
        return Err(e);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Email sent to: {}", user.email),
    })))
}

// reset password => /api/v1/password/reset/{token}
pub async fn reset_password(
    state: web::Data<AppState>,
    token: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let digest = session::hash_reset_token(&token);
    let user = state
        .db
        .find_user_by_reset_token(&digest, Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Password reset token is invalid or has been expired".into())
        })?;

    let req = body.into_inner();
    if req.password != req.confirm_password {
        return Err(AppError::BadRequest("Password does not match".into()));
    }
    validate_password(&req.password).map_err(AppError::Validation)?;

    let hash =
        session::hash_password_async(req.password.clone(), state.config.password_iterations)
            .await?;
    // also clears the reset token
    state.db.set_password(&user.id, &hash).await?;

    info!("[API] Password reset for {}", user.id);
    session::send_token(&user, StatusCode::OK, &state)
}
