//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use postline_core::domain::{NewUser, User};
use postline_core::ports::{PasswordService, TokenService};
use postline_shared::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=64;
const MIN_PASSWORD_LEN: usize = 8;

fn issue_token(token_service: &dyn TokenService, user: User) -> AppResult<AuthResponse> {
    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(token_service.expiration_seconds()).unwrap_or_default(),
        user: UserResponse {
            id: user.id,
            username: user.username,
        },
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let username = req.username.trim().to_string();

    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::BadRequest(
            "Username must be between 3 and 64 characters".to_string(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;

    // A concurrent registration surfaces here as a constraint violation (409).
    let user = state
        .users
        .create(NewUser {
            username,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), user)?))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
