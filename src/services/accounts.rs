//! # 로컬 계정 서비스
//!
//! 회원가입, 이메일/비밀번호 로그인, 비밀번호 재설정(토큰 발급과 사용)을 담당합니다.
//! 실패는 모두 사용자에게 그대로 보여줄 수 있는 메시지를 가진 `AppError`로 돌려줍니다.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::db::{self, users as db_users};
use crate::error::AppError;
use crate::models::{RegisterForm, ResetForm, User};
use crate::services::password::{generate_reset_token, hash_password, verify_password};
use crate::services::validation::validate_registration;

pub const INVALID_RESET_TOKEN: &str = "Password reset token is invalid or has expired";

/// 재설정 토큰 유효 시간
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// 새 로컬 계정을 만듭니다.
///
/// 검증 실패 시 DB에 접근하지 않고 `Validation`을, 이메일이 이미 있으면 `Conflict`를 돌려줍니다.
pub async fn register(pool: &SqlitePool, form: &RegisterForm) -> Result<User, AppError> {
    let errors = validate_registration(form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let email = form.email.trim();
    if db_users::find_by_email(pool, email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&form.password)?;
    let user_id = uuid::Uuid::now_v7().to_string();
    // 동시에 같은 이메일로 가입하면 UNIQUE 제약이 Conflict로 바뀌어 돌아옵니다.
    let user =
        db_users::create_local_user(pool, &user_id, form.name.trim(), email, &password_hash).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// 이메일/비밀번호를 확인합니다.
///
/// OAuth 전용 계정(비밀번호 없음)은 비밀번호 불일치와 같은 메시지로 거절합니다.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<User, AppError> {
    let user = db_users::find_by_email(pool, email.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("That email is not registered".to_string()))?;

    if user.is_oauth_only() {
        tracing::debug!(user_id = %user.id, "password login attempted on oauth-only account");
    }
    let matches = match user.password_hash.as_deref() {
        Some(hash) => verify_password(password, hash)?,
        None => false,
    };
    if !matches {
        return Err(AppError::Unauthorized("Password incorrect".to_string()));
    }

    Ok(user)
}

/// 재설정 토큰을 발급해 사용자 레코드에 저장하고 토큰을 돌려줍니다.
pub async fn request_password_reset(
    pool: &SqlitePool,
    email: &str,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let user = db_users::find_by_email(pool, email.trim())
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("No account with that email address exists".to_string())
        })?;

    let token = generate_reset_token();
    let expires_at = db::timestamp(now + reset_token_ttl());
    db_users::set_reset_token(pool, &user.id, &token, &expires_at).await?;

    tracing::info!(user_id = %user.id, "password reset requested");
    Ok(token)
}

/// 토큰이 일치하고 아직 만료되지 않은 사용자. 틀린 토큰과 만료된 토큰을 구분하지 않습니다.
pub async fn find_user_by_reset_token(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    db_users::find_by_valid_reset_token(pool, token, &db::timestamp(now))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_RESET_TOKEN.to_string()))
}

/// 토큰으로 비밀번호를 바꿉니다. 성공하면 토큰과 만료 시각이 지워져 다시 쓸 수 없습니다.
///
/// - 토큰이 틀리거나 만료됨: `Unauthorized`
/// - 두 비밀번호가 다름: `BadRequest`
pub async fn reset_password(
    pool: &SqlitePool,
    token: &str,
    form: &ResetForm,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let user = find_user_by_reset_token(pool, token, now).await?;

    if form.password != form.confirm {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let password_hash = hash_password(&form.password)?;
    if !db_users::complete_password_reset(pool, &user.id, token, &password_hash).await? {
        // 조회와 갱신 사이에 같은 토큰이 먼저 사용됨
        return Err(AppError::Unauthorized(INVALID_RESET_TOKEN.to_string()));
    }

    tracing::info!(user_id = %user.id, "password reset completed");
    Ok(user)
}
