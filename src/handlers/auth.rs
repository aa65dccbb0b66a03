use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::dto::{
    ConfirmQuery, LoginRequest, MessageResponse, RefreshRequest, ResendConfirmationRequest,
    SignupRequest, UserResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, User};
use crate::store::{Gateway, StoreError};
use crate::AppState;

/// Random confirmation token; only its hash is stored.
fn new_confirm_token() -> String {
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

async fn persist_refresh_token(
    db: &sqlx::PgPool,
    user_id: Uuid,
    raw_refresh_token: &str,
    ttl_secs: i64,
    parent_token_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let token_hash = hash_token(raw_refresh_token);
    let expires_at = Utc::now() + Duration::seconds(ttl_secs);
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&token_hash)
    .bind(expires_at)
    .bind(parent_token_id)
    .execute(db)
    .await
    .map_err(StoreError::from)?;

    Ok(id)
}

/// Create a token pair and persist the refresh token hash.
async fn issue_token_pair(
    db: &sqlx::PgPool,
    user_id: Uuid,
    email: &str,
    config: &crate::config::Config,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user_id, email, config)?;
    persist_refresh_token(
        db,
        user_id,
        &tokens.refresh_token,
        config.jwt_refresh_ttl_secs,
        parent_token_id,
    )
    .await?;
    Ok(tokens)
}

async fn revoke_all_user_tokens(db: &sqlx::PgPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE user_id = $1 AND revoked = false
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await
    .map_err(StoreError::from)?;
    Ok(())
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<Json<MessageResponse>> {
    body.validate()?;

    let confirm_token = new_confirm_token();
    let user = state
        .store
        .create_user(NewUser {
            id: Uuid::new_v4(),
            email: body.email.clone(),
            password_hash: hash_password(&body.password)?,
            name: body.name,
            height_cm: body.height_cm,
            start_weight_kg: body.start_weight_kg,
            target_weight_kg: body.target_weight_kg,
            age: body.age,
            confirm_token_hash: hash_token(&confirm_token),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => AppError::Conflict("Email already registered".into()),
            other => other.into(),
        })?;

    // TODO: hand the confirmation link to the mailer service once it exists;
    // until then operators pick it out of the logs.
    tracing::info!(
        user_id = %user.id,
        confirmation_url = %format!("{}/email-confirmed?token={}", state.config.frontend_url, confirm_token),
        "User registered, confirmation pending"
    );

    Ok(Json(MessageResponse::new(
        "Registration successful. Check your email to confirm your address before signing in.",
    )))
}

pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<MessageResponse>> {
    let token_hash = hash_token(&query.token);

    let confirmed = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE users
        SET email_confirmed_at = NOW(), confirm_token_hash = NULL, updated_at = NOW()
        WHERE confirm_token_hash = $1 AND email_confirmed_at IS NULL
        RETURNING id
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.db)
    .await
    .map_err(StoreError::from)?;

    let user_id = confirmed.ok_or_else(|| {
        AppError::NotFound("Invalid or already used confirmation token".into())
    })?;

    tracing::info!(user_id = %user_id, "Email confirmed");
    Ok(Json(MessageResponse::new(
        "Email confirmed. You can sign in now.",
    )))
}

pub async fn resend_confirmation(
    State(state): State<AppState>,
    Json(body): Json<ResendConfirmationRequest>,
) -> AppResult<Json<MessageResponse>> {
    body.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await
        .map_err(StoreError::from)?
        .ok_or_else(|| AppError::NotFound("No account for this email".into()))?;

    if user.is_confirmed() {
        return Err(AppError::Conflict("Email already confirmed".into()));
    }

    let confirm_token = new_confirm_token();
    sqlx::query(
        "UPDATE users SET confirm_token_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .bind(hash_token(&confirm_token))
    .execute(&state.db)
    .await
    .map_err(StoreError::from)?;

    tracing::info!(
        user_id = %user.id,
        confirmation_url = %format!("{}/email-confirmed?token={}", state.config.frontend_url, confirm_token),
        "Confirmation email re-requested"
    );

    Ok(Json(MessageResponse::new(
        "Confirmation email sent. Check your inbox.",
    )))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    body.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await
        .map_err(StoreError::from)?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    // Distinct from Unauthorized so the client can offer a resend.
    if !user.is_confirmed() {
        return Err(AppError::EmailNotConfirmed);
    }

    let tokens = issue_token_pair(&state.db, user.id, &user.email, &state.config, None).await?;
    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let token_data = verify_token(&body.refresh_token, &state.config)?;

    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let token_hash = hash_token(&body.refresh_token);

    let stored = sqlx::query_as::<_, (Uuid, Uuid, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.db)
    .await
    .map_err(StoreError::from)?
    .ok_or(AppError::Unauthorized)?;

    let (stored_id, stored_user_id, revoked) = stored;

    // A revoked token coming back means the refresh token leaked somewhere:
    // cut the whole family loose.
    if revoked {
        tracing::warn!(
            user_id = %stored_user_id,
            token_id = %stored_id,
            "Refresh token reuse detected, revoking all tokens for user"
        );
        revoke_all_user_tokens(&state.db, stored_user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored_user_id != token_data.claims.sub {
        return Err(AppError::Unauthorized);
    }

    // Single-use rotation.
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(stored_id)
    .execute(&state.db)
    .await
    .map_err(StoreError::from)?;

    let tokens = issue_token_pair(
        &state.db,
        token_data.claims.sub,
        &token_data.claims.email,
        &state.config,
        Some(stored_id),
    )
    .await?;
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    revoke_all_user_tokens(&state.db, auth_user.id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .store
        .get_user(auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}
