use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::{Query, State}, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::info;

use reels_db::{Database, is_constraint_violation, users};
use reels_notify::Dispatcher;
use reels_payments::PaymentGateway;
use reels_types::api::{
    Claims, LoginRequest, LoginResponse, MessageResponse, RegisterCreatorRequest, RegisterRequest,
    RegisterResponse, VerifyEmailQuery,
};
use reels_types::events::Intent;
use reels_types::models::Role;

use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub dispatcher: Dispatcher,
    /// Absent when no payment provider is configured
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub frontend_url: String,
    pub currency: String,
    pub require_verified_email: bool,
}

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 100;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role: Role = req
        .role
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid role selected."))?;

    create_account(state, req.name, req.email, req.password, role).await
}

pub async fn register_creator(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterCreatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    create_account(state, req.name, req.email, req.password, Role::Creator).await
}

async fn create_account(
    state: AppState,
    name: String,
    email: String,
    password: String,
    role: Role,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let name = name.trim().to_string();
    let email = email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required."));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::bad_request("Name must be at most 100 characters."));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required."));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request("Password must be at least 8 characters."));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();

    let token = verification_token();
    let token_hash = hash_token(&token);

    let (n, e) = (name.clone(), email.clone());
    let id = blocking(&state, move |db| {
        db.with_conn(|conn| users::insert(conn, &n, &e, &password_hash, role, Some(token_hash.as_str())))
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    ApiError::bad_request("Email already exists.")
                } else {
                    ApiError::Internal(e)
                }
            })
    })
    .await?;

    info!("Registered {} user {}", role, id);

    let link = format!("{}/verify-email?token={}", state.frontend_url, token);
    state
        .dispatcher
        .dispatch(vec![Intent::Email {
            user_id: id,
            subject: "Verify your email".to_string(),
            html: format!(
                "<p>Welcome to Make me reels!</p><p><a href=\"{link}\">Confirm your email address</a></p>"
            ),
        }])
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { id, name, email, role }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::bad_request("Invalid email or password");

    let email = req.email.trim().to_lowercase();
    let user = blocking(&state, move |db| Ok(db.with_conn(|conn| users::by_email(conn, &email))?))
        .await?
        .ok_or_else(invalid)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("Stored password hash unreadable: {}", e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    if state.require_verified_email && !user.verified {
        return Err(ApiError::Forbidden("Please verify your email before logging in.".into()));
    }

    let token = create_token(&state.jwt_secret, state.token_ttl, user.id, &user.name, user.role)?;

    Ok(Json(LoginResponse {
        token,
        name: user.name,
        role: user.role,
        id: user.id,
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let token_hash = hash_token(&query.token);
    let verified = blocking(&state, move |db| Ok(db.with_conn(|conn| users::verify(conn, &token_hash))?)).await?;

    if !verified {
        return Err(ApiError::bad_request("Invalid or expired verification token."));
    }
    Ok(Json(MessageResponse::new("Email verified successfully.")))
}

pub fn create_token(
    secret: &str,
    ttl: chrono::Duration,
    user_id: i64,
    name: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// 32 random bytes, URL-safe. Only the digest is stored.
fn verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_tokens_are_unique_and_url_safe() {
        let a = verification_token();
        let b = verification_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let h = hash_token("abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
