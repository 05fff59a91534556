//! # 세션 기반 인증
//!
//! 쿠키 `daysave.sid`에는 임의 토큰이 들어가고, DB에는 `SESSION_SECRET`으로 만든
//! HMAC-SHA256 값만 저장됩니다. 매 요청마다 세션 → 사용자 기본키 → 사용자 레코드를
//! 새로 조회하므로, 세션 도중 사용자가 삭제되면 그 요청은 익명으로 처리됩니다.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::SqlitePool;

use super::flash::{flash_redirect, Flash};
use super::{build_cookie, expire_cookie, read_cookie, SameSite};
use crate::config::Config;
use crate::db::{self, sessions as db_sessions, users as db_users};
use crate::error::AppError;
use crate::models::User;
use crate::routes::AppState;
use crate::services::password::random_bytes;

pub const SESSION_COOKIE: &str = "daysave.sid";

pub const LOGIN_REQUIRED: &str = "Please log in to view that resource";

type HmacSha256 = Hmac<Sha256>;

/// 쿠키 토큰을 저장용 키로 바꿉니다.
pub fn hash_session_token(token: &str, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Session key error: {}", e)))?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn generate_session_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(32))
}

/// 로그인 세션을 만들고, 응답에 실을 `Set-Cookie` 값을 돌려줍니다.
pub async fn start_session(pool: &SqlitePool, config: &Config, user_id: &str) -> Result<String, AppError> {
    let token = generate_session_token();
    let expires_at = db::timestamp(Utc::now() + config.session_ttl);
    db_sessions::create_session(
        pool,
        &hash_session_token(&token, &config.session_secret)?,
        user_id,
        &expires_at,
    )
    .await?;

    tracing::debug!(user_id, "session started");
    Ok(build_cookie(
        SESSION_COOKIE,
        &token,
        config.session_ttl.num_seconds(),
        SameSite::Lax,
    ))
}

/// 요청의 세션을 삭제하고 쿠키를 만료시키는 `Set-Cookie` 값을 돌려줍니다.
/// 세션이 없어도 성공합니다.
pub async fn end_session(pool: &SqlitePool, config: &Config, headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(token) = read_cookie(headers, SESSION_COOKIE) {
        let token_hash = hash_session_token(&token, &config.session_secret)?;
        db_sessions::delete_session(pool, &token_hash).await?;
    }
    Ok(expire_cookie(SESSION_COOKIE))
}

/// 쿠키 → 세션 → 사용자. 어느 단계든 없으면 `None`.
async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    let Some(token) = read_cookie(headers, SESSION_COOKIE) else {
        return Ok(None);
    };

    let token_hash = hash_session_token(&token, &state.config.session_secret)?;
    let now = db::timestamp(Utc::now());
    let Some(user_id) = db_sessions::find_session_user_id(&state.pool, &token_hash, &now).await? else {
        return Ok(None);
    };

    db_users::find_by_id(&state.pool, &user_id).await
}

/// 현재 사용자 (익명이면 `None`). 공개 페이지의 내비게이션 등에 사용합니다.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_user(state, &parts.headers).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(err) => {
                // 저장소 오류로 세션을 확인할 수 없으면 익명으로 처리합니다.
                tracing::error!(error = %err, "failed to resolve session");
                Ok(CurrentUser(None))
            }
        }
    }
}

/// 로그인이 필요한 핸들러용 추출기. 익명이면 로그인 페이지로 리다이렉트합니다.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = match CurrentUser::from_request_parts(parts, state).await {
            Ok(current) => current,
            Err(never) => match never {},
        };

        user.map(AuthUser).ok_or_else(|| {
            tracing::debug!(path = %parts.uri.path(), "anonymous request to protected page");
            flash_redirect("/users/login", Flash::error(LOGIN_REQUIRED))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hash_depends_on_secret() {
        let a = hash_session_token("token", "secret-a").unwrap();
        let b = hash_session_token("token", "secret-b").unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, hash_session_token("token", "secret-a").unwrap());
    }

    #[test]
    fn session_tokens_are_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
    }
}
