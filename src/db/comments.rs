//! # 코멘트 쿼리
//!
//! 현재 코멘트를 만드는 화면은 없습니다. 삭제 정책(작성자/대상 북마크 삭제 시 CASCADE)을
//! 검증하고, 북마크 삭제 시 함께 지워지는 코멘트 수를 기록하는 데 사용합니다.

use crate::error::AppError;
use sqlx::SqlitePool;

// 코멘트 작성 화면이 생기기 전까지는 삭제 정책 테스트에서만 씁니다.
#[cfg(test)]
pub async fn create_comment(
    pool: &SqlitePool,
    user_id: &str,
    content_id: &str,
    text: &str,
) -> Result<crate::models::Comment, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    let comment = sqlx::query_as::<_, crate::models::Comment>(
        r#"
        INSERT INTO comments (id, text, user_id, content_id)
        VALUES (?, ?, ?, ?)
        RETURNING id, text, user_id, content_id, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(text)
    .bind(user_id)
    .bind(content_id)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

/// 북마크에 달린 코멘트 수
pub async fn count_for_content(pool: &SqlitePool, content_id: &str) -> Result<i64, AppError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE content_id = ?")
        .bind(content_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::content::{create_content, delete_content};
    use crate::test_utils::create_test_user;

    async fn count_comments(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn comments_cascade_with_content(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let item = create_content(&pool, &alice.id, "Example", "https://example.com", None)
            .await
            .unwrap();
        create_comment(&pool, &alice.id, &item.id, "worth a reread").await.unwrap();
        assert_eq!(count_for_content(&pool, &item.id).await.unwrap(), 1);

        delete_content(&pool, &item.id, &alice.id).await.unwrap();
        assert_eq!(count_comments(&pool).await, 0);
    }

    #[sqlx::test]
    async fn comments_and_content_cascade_with_author(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let item = create_content(&pool, &alice.id, "Example", "https://example.com", None)
            .await
            .unwrap();
        create_comment(&pool, &bob.id, &item.id, "nice find").await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&bob.id)
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(count_comments(&pool).await, 0);

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&alice.id)
            .execute(&pool)
            .await
            .unwrap();
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
