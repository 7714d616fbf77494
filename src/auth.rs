//! Credentials, session tokens and the request extractors built on them.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 strings of the form
//! `pbkdf2$<iterations>$<salt hex>$<hash hex>`. Session tokens are
//! `<user id>.<expiry unix seconds>.<hmac hex>` and travel in the `token`
//! cookie or an `Authorization: Bearer` header.
use crate::error::AppError;
use crate::models::user::User;
use crate::AppState;
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie},
    dev::Payload,
    http::{header, StatusCode},
    web, FromRequest, HttpRequest, HttpResponse,
};
use chrono::{DateTime, Duration, Utc};
use futures::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde_json::json;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_COOKIE: &str = "token";
pub const RESET_TOKEN_MINUTES: i64 = 30;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const RESET_TOKEN_LEN: usize = 20;

fn keyed(key: &[u8]) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(key).map_err(|e| AppError::Internal(e.to_string()))
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

pub fn hash_password(plain: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt: [u8; SALT_LEN] = rand::random();
    let hash = pbkdf2_sha256(plain.as_bytes(), &salt, iterations);
    format!(
        "pbkdf2${}${}${}",
        iterations,
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// False for a wrong password and for any stored value that does not parse.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != "pbkdf2" {
        return false;
    }
    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iterations.parse::<u32>(), hex::decode(salt), hex::decode(hash))
    else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let actual = pbkdf2_sha256(plain.as_bytes(), &salt, iterations);
    actual[..].ct_eq(&expected[..]).into()
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_async(plain: String, iterations: u32) -> Result<String, AppError> {
    web::block(move || hash_password(&plain, iterations))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_async(plain: String, stored: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&plain, &stored))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn issue_token(user_id: &str, secret: &str, expires_at: DateTime<Utc>) -> Result<String, AppError> {
    let payload = format!("{}.{}", user_id, expires_at.timestamp());
    let mut mac = keyed(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    Ok(format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes())))
}

/// Returns the user id carried by a valid, unexpired token.
pub fn verify_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    let invalid = || AppError::Unauthorized("JSON web token is invalid, Try again".into());

    let (payload, signature) = token.rsplit_once('.').ok_or_else(invalid)?;
    let (user_id, expires) = payload.rsplit_once('.').ok_or_else(invalid)?;
    let signature = hex::decode(signature).map_err(|_| invalid())?;

    let mut mac = keyed(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).map_err(|_| invalid())?;

    let expires: i64 = expires.parse().map_err(|_| invalid())?;
    if expires <= now.timestamp() {
        return Err(AppError::Unauthorized(
            "JSON web token is Expired, Try again".into(),
        ));
    }
    if user_id.is_empty() {
        return Err(invalid());
    }
    Ok(user_id.to_string())
}

/// Returns `(plain, sha256 hex)`. Only the digest is stored.
pub fn new_reset_token() -> (String, String) {
    let raw: [u8; RESET_TOKEN_LEN] = rand::random();
    let plain = hex::encode(raw);
    let digest = hash_reset_token(&plain);
    (plain, digest)
}

pub fn hash_reset_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

/// Session response: sets the cookie and returns `{success, user, token}`.
pub fn send_token(user: &User, status: StatusCode, state: &AppState) -> Result<HttpResponse, AppError> {
    let expires_at = Utc::now() + Duration::hours(state.config.token_expires_hours);
    let token = issue_token(&user.id, &state.config.token_secret, expires_at)?;

    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::days(state.config.cookie_expires_days))
        .finish();

    Ok(HttpResponse::build(status).cookie(cookie).json(json!({
        "success": true,
        "user": user,
        "token": token,
    })))
}

pub fn clear_token_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = token_from_request(req);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| AppError::Internal("application state not registered".into()))?;
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Login first to access this resource".into())
            })?;
            let user_id = verify_token(&token, &state.config.token_secret, Utc::now())?;

            match state.db.get_user(&user_id).await? {
                Some(user) => {
                    debug!("[AUTH] Authenticated user {}", user.id);
                    Ok(AuthUser(user))
                }
                None => {
                    warn!("[AUTH] Token for unknown user {}", user_id);
                    Err(AppError::Unauthorized(
                        "Login first to access this resource".into(),
                    ))
                }
            }
        })
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth = AuthUser::from_request(req, payload);

        Box::pin(async move {
            let AuthUser(user) = auth.await?;
            if !user.is_admin() {
                return Err(AppError::Forbidden(format!(
                    "Role ({}) is not allowed to access this resource",
                    user.role
                )));
            }
            Ok(AdminUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn password_round_trip() {
        let stored = hash_password("secret1", 10);
        assert!(stored.starts_with("pbkdf2$10$"));
        assert!(verify_password("secret1", &stored));
        assert!(!verify_password("secret2", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret1", 10);
        let b = hash_password("secret1", 10);
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "bcrypt$10$aa$bb"));
        assert!(!verify_password("x", "pbkdf2$ten$aa$bb"));
        assert!(!verify_password("x", "pbkdf2$0$aa$bb"));
    }

    #[test]
    fn truncated_hash_never_verifies() {
        let stored = hash_password("secret1", 10);
        let truncated = &stored[..stored.len() - 2];
        assert!(!verify_password("secret1", truncated));
    }

    #[test]
    fn pbkdf2_matches_known_vectors() {
        // PBKDF2-HMAC-SHA256, P="passwd", S="salt", c=1 (RFC 7914)
        let out = pbkdf2_sha256(b"passwd", b"salt", 1);
        assert_eq!(
            hex::encode(&out[..16]),
            "55ac046e56e3089fec1691c22544b605"
        );

        // P="password", S="salt", dkLen=32
        assert_eq!(
            hex::encode(pbkdf2_sha256(b"password", b"salt", 2)),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
        assert_eq!(
            hex::encode(pbkdf2_sha256(b"password", b"salt", 4096)),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[actix_web::test]
    async fn pooled_hashing_round_trips() {
        let stored = hash_password_async("secret1".into(), 10).await.unwrap();
        assert!(verify_password_async("secret1".into(), stored.clone())
            .await
            .unwrap());
        assert!(!verify_password_async("secret2".into(), stored)
            .await
            .unwrap());
    }

    #[test]
    fn token_round_trip() {
        let now = Utc::now();
        let token = issue_token("user-1", SECRET, now + Duration::hours(1)).unwrap();
        assert_eq!(verify_token(&token, SECRET, now).unwrap(), "user-1");
    }

    #[test]
    fn token_rejects_tampering_and_expiry() {
        let now = Utc::now();
        let token = issue_token("user-1", SECRET, now + Duration::hours(1)).unwrap();

        assert!(verify_token(&token, "other-secret", now).is_err());

        let forged = token.replacen("user-1", "user-2", 1);
        assert!(verify_token(&forged, SECRET, now).is_err());

        match verify_token(&token, SECRET, now + Duration::hours(2)) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("Expired")),
            other => panic!("expected expiry, got {:?}", other),
        }

        assert!(verify_token("not-a-token", SECRET, now).is_err());
    }

    #[test]
    fn reset_token_digest_matches() {
        let (plain, digest) = new_reset_token();
        assert_eq!(plain.len(), RESET_TOKEN_LEN * 2);
        assert_eq!(hash_reset_token(&plain), digest);
    }
}
