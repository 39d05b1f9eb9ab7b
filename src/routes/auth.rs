// ABOUTME: Authentication route handlers for registration and login
// ABOUTME: Issues JWT tokens and manages bcrypt-verified credentials

//! Registration and login endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ServerResources;
use crate::auth::{hash_password, verify_password};
use crate::errors::AppError;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// User info embedded in auth responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for both registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub jwt_token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

/// Authentication route handlers
pub struct AuthRoutes;

impl AuthRoutes {
    /// Build the auth router
    #[must_use]
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::register))
            .route("/auth/login", post(Self::login))
            .with_state(resources)
    }

    /// Register a new user and issue a token
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
        info!("User registration attempt for email: {}", request.email);

        if !is_valid_email(&request.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // Hash on a blocking thread; bcrypt is deliberately slow
        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(e.to_string()))?;

        let user = resources
            .database
            .users()
            .create_user(&request.email, request.display_name.as_deref(), &password_hash)
            .await?;

        info!("User registered successfully: {} ({})", user.email, user.id);

        let response = build_auth_response(&resources, &user)?;
        Ok((StatusCode::CREATED, Json(response)))
    }

    /// Authenticate an existing user and issue a token
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<AuthResponse>, AppError> {
        info!("User login attempt for email: {}", request.email);

        let user = resources
            .database
            .users()
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        let password = request.password.clone();
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(e.to_string()))?;

        if !is_valid {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        info!("User logged in successfully: {} ({})", user.email, user.id);

        Ok(Json(build_auth_response(&resources, &user)?))
    }
}

fn build_auth_response(
    resources: &ServerResources,
    user: &crate::models::User,
) -> Result<AuthResponse, AppError> {
    let jwt_token = resources
        .auth_manager
        .generate_token(user)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    let expires_at = chrono::Utc::now()
        + chrono::Duration::hours(resources.auth_manager.token_expiry_hours());

    Ok(AuthResponse {
        jwt_token,
        expires_at: expires_at.to_rfc3339(),
        user: UserInfo {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        },
    })
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
