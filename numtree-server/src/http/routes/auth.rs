//! Account and session endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, verify_unknown_user};
use crate::db::{SessionRepo, User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidJson};
use crate::http::server::AppState;
use crate::models::{Password, Username};

/// Signup / login request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// User as exposed over the API (never includes the password hash)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /auth/signup - create an account
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let username = Username::new(&req.username)?;
    let password = Password::new(&req.password)?;

    let hash = hash_password(&password).await?;
    let user = UserRepo::new(&state.pool).create(&username, &hash).await?;

    tracing::info!(user = %user.id, username = %user.username, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            user: user.into(),
        }),
    ))
}

/// POST /auth/login - verify credentials and open a session
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<UserEnvelope>), ApiError> {
    let Some(user) = UserRepo::new(&state.pool)
        .find_by_username(&req.username)
        .await?
    else {
        verify_unknown_user(req.password).await?;
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::debug!(username = %user.username, "password rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let session = SessionRepo::new(&state.pool)
        .create(user.id, state.session.ttl())
        .await?;

    tracing::info!(user = %user.id, "session opened");
    let jar = jar.add(state.session.cookie(session.token));
    Ok((
        jar,
        Json(UserEnvelope {
            user: user.into(),
        }),
    ))
}

/// POST /auth/logout - revoke the current session
async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    SessionRepo::new(&state.pool).revoke(&current.token).await?;

    tracing::info!(user = %current.user.id, "session closed");
    let jar = jar.remove(state.session.removal_cookie());
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

/// GET /auth/me - the logged-in user
async fn me(current: CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: current.user.into(),
    })
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
