//! OAuth 프로필 → 로컬 사용자 식별
//!
//! 모든 제공자가 이 알고리즘 하나를 공유합니다.
//! 1. 이 제공자 ID를 가진 사용자가 있으면 그 사용자
//! 2. 프로필에 이메일이 있고 같은 이메일의 사용자가 있으면 제공자 ID를 연결(계정 연결)
//! 3. 그 외에는 비밀번호 없는(OAuth 전용) 새 사용자를 생성

use sqlx::SqlitePool;

use crate::db::users as db_users;
use crate::error::AppError;
use crate::models::User;
use crate::services::oauth::{OAuthProfile, Provider};

pub async fn resolve_oauth_user(
    pool: &SqlitePool,
    provider: Provider,
    profile: &OAuthProfile,
) -> Result<User, AppError> {
    if let Some(user) = db_users::find_by_provider_id(pool, provider, &profile.provider_id).await? {
        return Ok(user);
    }

    if let Some(email) = profile.email.as_deref() {
        if let Some(user) = db_users::find_by_email(pool, email).await? {
            db_users::link_provider(pool, &user.id, provider, &profile.provider_id).await?;
            tracing::info!(user_id = %user.id, %provider, "linked provider to existing account");
            return db_users::find_by_id(pool, &user.id)
                .await?
                .ok_or(AppError::Internal("Linked user disappeared".to_string()));
        }
    }

    let email = profile
        .email
        .clone()
        .unwrap_or_else(|| placeholder_email(provider, &profile.provider_id));
    let name = display_name(provider, profile, &email);
    let user_id = uuid::Uuid::now_v7().to_string();

    match db_users::create_oauth_user(pool, &user_id, &name, &email, provider, &profile.provider_id)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, %provider, "created oauth account");
            Ok(user)
        }
        // 같은 프로필로 동시에 로그인한 요청이 먼저 만들었을 수 있습니다.
        Err(AppError::Conflict(msg)) => db_users::find_by_provider_id(pool, provider, &profile.provider_id)
            .await?
            .ok_or(AppError::Conflict(msg)),
        Err(err) => Err(err),
    }
}

/// 이메일을 주지 않는 제공자용 자리표시 주소 (`{id}@{provider}.com`)
pub fn placeholder_email(provider: Provider, provider_id: &str) -> String {
    format!("{}@{}.com", provider_id, provider.slug())
}

fn display_name(provider: Provider, profile: &OAuthProfile, email: &str) -> String {
    profile
        .name
        .clone()
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{} user", provider.display_name()))
}
