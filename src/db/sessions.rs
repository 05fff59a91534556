//! # 로그인 세션 저장소
//!
//! 쿠키에는 임의 토큰이, 이 테이블에는 그 토큰의 HMAC 값(`id`)과 사용자 기본키만 저장됩니다.
//! 해싱은 `middleware::auth`가 담당하고, 여기서는 이미 해시된 값만 다룹니다.

use crate::error::AppError;
use sqlx::SqlitePool;

pub async fn create_session(
    pool: &SqlitePool,
    token_hash: &str,
    user_id: &str,
    expires_at: &str,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO login_sessions (id, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// 만료되지 않은 세션의 사용자 ID를 반환합니다.
pub async fn find_session_user_id(
    pool: &SqlitePool,
    token_hash: &str,
    now: &str,
) -> Result<Option<String>, AppError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM login_sessions WHERE id = ? AND expires_at > ?",
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}

/// 세션을 삭제합니다. 없는 세션이어도 성공입니다 (로그아웃은 멱등).
pub async fn delete_session(pool: &SqlitePool, token_hash: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM login_sessions WHERE id = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_expired_sessions(pool: &SqlitePool, now: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM login_sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;

    #[sqlx::test]
    async fn expired_sessions_do_not_resolve(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        create_session(&pool, "live", &alice.id, "2999-01-01T00:00:00.000Z").await.unwrap();
        create_session(&pool, "stale", &alice.id, "2000-01-01T00:00:00.000Z").await.unwrap();

        let now = "2026-01-01T00:00:00.000Z";
        assert_eq!(
            find_session_user_id(&pool, "live", now).await.unwrap(),
            Some(alice.id.clone())
        );
        assert_eq!(find_session_user_id(&pool, "stale", now).await.unwrap(), None);

        assert_eq!(delete_expired_sessions(&pool, now).await.unwrap(), 1);
        delete_session(&pool, "live").await.unwrap();
        delete_session(&pool, "live").await.unwrap();
        assert_eq!(find_session_user_id(&pool, "live", now).await.unwrap(), None);
    }
}
