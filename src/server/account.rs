use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireUser, SessionTokenGenerator, hash_password, verify_password};
use crate::server::AppState;
use crate::server::dto::{LoginRequest, RegisterRequest, SessionResponse};
use crate::server::response::{ApiError, ApiResponse, FieldErrors, StoreResultExt};
use crate::server::validation::{validate_email, validate_password};
use crate::types::{Session, User};

const DISPLAY_NAME_SUFFIX_LEN: usize = 8;

/// Registered accounts get a generated display name rather than asking for one.
fn generate_display_name() -> String {
    let uuid = Uuid::new_v4().to_string();
    format!("user_{}", &uuid[..DISPLAY_NAME_SUFFIX_LEN])
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut errors = FieldErrors::new();
    if let Err(message) = validate_email(&req.email) {
        errors.insert("email", message);
    } else if store
        .get_user_by_email(&req.email)
        .api_err("Failed to check email")?
        .is_some()
    {
        errors.insert("email", "Email is already taken".to_string());
    }
    errors.extend(validate_password(&req.password, &req.password_confirmation));
    if state.require_terms && !req.terms {
        errors.insert("terms", "The terms must be accepted".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        display_name: generate_display_name(),
        password_hash: hash_password(&req.password).api_err("Failed to hash password")?,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).api_err("Failed to create user")?;

    let token = start_session(&state, &user.id)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionResponse { token, user })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user_by_email(&req.email)
        .api_err("Failed to look up account")?;

    // Same response for unknown email and wrong password.
    let invalid = || {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email",
            "These credentials do not match our records".to_string(),
        );
        ApiError::validation(errors)
    };

    let user = user.ok_or_else(invalid)?;
    let verified = verify_password(&req.password, &user.password_hash)
        .api_err("Failed to verify password")?;
    if !verified {
        return Err(invalid());
    }

    let token = start_session(&state, &user.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(SessionResponse { token, user })))
}

pub async fn logout(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    state
        .store
        .delete_session(&auth.session.id)
        .api_err("Failed to delete session")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(auth.user))
}

fn start_session(state: &Arc<AppState>, user_id: &str) -> Result<String, ApiError> {
    let generator = SessionTokenGenerator::new();
    let (raw_token, lookup, hash) = generator
        .generate()
        .map_err(|_| ApiError::internal("Failed to generate session token"))?;

    let session = Session {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    state
        .store
        .create_session(&session)
        .map_err(|_| ApiError::internal("Failed to create session"))?;

    Ok(raw_token)
}
