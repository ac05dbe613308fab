use crate::{
    db::users as db_users,
    error::AppError,
    middleware::auth::{
        create_access_token, create_refresh_token, hash_token, verify_refresh_token, AuthUser,
        REFRESH_TOKEN_TTL_DAYS,
    },
    models::user::*,
    routes::AppState,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

const EXPIRES_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::InvalidInput("Password must be at least 8 characters".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }

    if db_users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    let user_id = uuid::Uuid::now_v7().to_string();
    let user = db_users::create_user(&state.pool, &user_id, name, &email, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Registered new user");

    issue_tokens(&state, user).await.map(Json)
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = db_users::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password hash parse error: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    issue_tokens(&state, user).await.map(Json)
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    verify_refresh_token(&req.refresh_token, &state.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    // Refresh tokens are single use: the stored hash must still exist
    let token_hash = hash_token(&req.refresh_token);
    let (user_id, expires_at) = db_users::find_refresh_token(&state.pool, &token_hash)
        .await?
        .ok_or(AppError::Unauthorized("Refresh token not found or revoked".to_string()))?;

    let expires = chrono::NaiveDateTime::parse_from_str(&expires_at, EXPIRES_AT_FORMAT)
        .map_err(|e| AppError::Internal(format!("Date parse error: {}", e)))?;
    if expires.and_utc() < Utc::now() {
        db_users::delete_refresh_token(&state.pool, &token_hash).await?;
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db_users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::Unauthorized("User not found".to_string()))?;

    db_users::delete_refresh_token(&state.pool, &token_hash).await?;

    issue_tokens(&state, user).await.map(Json)
}

pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    db_users::delete_user_refresh_tokens(&state.pool, &auth_user.user_id).await?;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

/// Mints a new access/refresh pair and stores the refresh token's hash.
async fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let access_token = create_access_token(&user.id, &state.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
    let refresh_token = create_refresh_token(&user.id, &state.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    let token_id = uuid::Uuid::now_v7().to_string();
    let expires_at = (Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS))
        .format(EXPIRES_AT_FORMAT)
        .to_string();

    db_users::store_refresh_token(
        &state.pool,
        &token_id,
        &user.id,
        &hash_token(&refresh_token),
        &expires_at,
    )
    .await?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn register_body(email: &str) -> Value {
        json!({ "name": "수면러", "email": email, "password": "correct-horse" })
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let app = TestApp::new(None).await;

        let (status, registered) = app
            .send(Method::POST, "/auth/register", None, Some(register_body("Sleeper@Example.com")))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(registered["user"]["email"], "sleeper@example.com");
        assert!(registered["user"].get("password_hash").is_none());

        let (status, logged_in) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "sleeper@example.com", "password": "correct-horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let token = logged_in["access_token"].as_str().unwrap();
        let (status, me) = app.send(Method::GET, "/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["name"], "수면러");
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let app = TestApp::new(None).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "name": "a", "email": "a@example.com", "password": "short" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_input");

        app.send(Method::POST, "/auth/register", None, Some(register_body("dup@example.com")))
            .await;
        let (status, body) = app
            .send(Method::POST, "/auth/register", None, Some(register_body("dup@example.com")))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = TestApp::new(None).await;
        app.send(Method::POST, "/auth/register", None, Some(register_body("a@example.com")))
            .await;

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "a@example.com", "password": "wrong-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_reuse_or_access_tokens() {
        let app = TestApp::new(None).await;
        let (_, registered) = app
            .send(Method::POST, "/auth/register", None, Some(register_body("a@example.com")))
            .await;
        let access = registered["access_token"].as_str().unwrap();
        let refresh = registered["refresh_token"].as_str().unwrap();

        let (status, _) = app
            .send(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": access })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, rotated) = app
            .send(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(rotated["refresh_token"], refresh);

        let (status, _) = app
            .send(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_refresh_tokens() {
        let app = TestApp::new(None).await;
        let (_, registered) = app
            .send(Method::POST, "/auth/register", None, Some(register_body("a@example.com")))
            .await;
        let access = registered["access_token"].as_str().unwrap();
        let refresh = registered["refresh_token"].as_str().unwrap();

        let (status, _) = app.send(Method::POST, "/auth/logout", Some(access), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
