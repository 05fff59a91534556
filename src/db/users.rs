use crate::db::is_unique_violation;
use crate::error::AppError;
use crate::models::user::User;
use crate::services::oauth::Provider;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash,
    google_id, facebook_id, twitter_id, microsoft_id, apple_id,
    reset_password_token, reset_password_expires,
    created_at, updated_at
"#;

fn select_user_where(condition: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE {condition}")
}

fn map_insert_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Email already registered".to_string())
    } else {
        AppError::Database(err)
    }
}

pub async fn create_local_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await
    .map_err(map_insert_error)?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

/// 비밀번호 없이(OAuth 전용) 사용자를 만들고 제공자 ID를 기록합니다.
pub async fn create_oauth_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: &str,
    provider: Provider,
    provider_id: &str,
) -> Result<User, AppError> {
    // 컬럼 이름은 닫힌 enum에서만 나오므로 문자열 조립이 안전합니다.
    let sql = format!(
        "INSERT INTO users (id, name, email, {}) VALUES (?, ?, ?, ?)",
        provider.id_column()
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(provider_id)
        .execute(pool)
        .await
        .map_err(map_insert_error)?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&select_user_where("id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&select_user_where("email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_provider_id(
    pool: &SqlitePool,
    provider: Provider,
    provider_id: &str,
) -> Result<Option<User>, AppError> {
    let condition = format!("{} = ?", provider.id_column());
    let user = sqlx::query_as::<_, User>(&select_user_where(&condition))
        .bind(provider_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// 기존 계정에 제공자 ID를 연결합니다 (계정 연결).
pub async fn link_provider(
    pool: &SqlitePool,
    user_id: &str,
    provider: Provider,
    provider_id: &str,
) -> Result<(), AppError> {
    let sql = format!(
        "UPDATE users SET {} = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
        provider.id_column()
    );
    sqlx::query(&sql)
        .bind(provider_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_reset_token(
    pool: &SqlitePool,
    user_id: &str,
    token: &str,
    expires_at: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = ?, reset_password_expires = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(token)
    .bind(expires_at)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// 토큰이 일치하고 만료 시각이 `now` 이후인 사용자를 찾습니다.
/// 토큰이 틀린 경우와 만료된 경우를 구분하지 않습니다.
pub async fn find_by_valid_reset_token(
    pool: &SqlitePool,
    token: &str,
    now: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&select_user_where(
        "reset_password_token = ? AND reset_password_expires > ?",
    ))
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// 새 비밀번호 해시를 저장하고 재설정 토큰/만료 시각을 지웁니다 (토큰 1회용).
/// 토큰 조건을 WHERE에 다시 넣어 같은 토큰으로 두 번 재설정되지 않게 합니다.
pub async fn complete_password_reset(
    pool: &SqlitePool,
    user_id: &str,
    token: &str,
    password_hash: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, reset_password_token = NULL, reset_password_expires = NULL,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND reset_password_token = ?
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 만료된 재설정 토큰을 일괄 정리합니다. 정리된 행 수를 반환합니다.
pub async fn clear_expired_reset_tokens(pool: &SqlitePool, now: &str) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = NULL, reset_password_expires = NULL
        WHERE reset_password_expires IS NOT NULL AND reset_password_expires <= ?
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
