//! # 북마크(콘텐츠) 데이터베이스 쿼리 모듈
//!
//! 모든 조회/수정/삭제 쿼리는 `id`와 함께 `user_id` 조건을 포함합니다.
//! 따라서 다른 사용자의 북마크는 "존재하지 않는 것"과 똑같이 보입니다.
//! (`None` 또는 `false` 반환, 행은 변경되지 않음)

use crate::error::AppError;
use crate::models::ContentItem;
use sqlx::SqlitePool;

const CONTENT_COLUMNS: &str =
    "id, user_id, title, url, comment, is_archived, created_at, updated_at";

/// 사용자의 북마크 목록을 최신순으로 조회합니다.
///
/// `archived`와 보관 여부가 정확히 일치하는 항목만 돌려줍니다.
/// 제목 검색과 태그 필터는 유니코드 대소문자 규칙이 필요하므로 서비스 계층에서 적용합니다.
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    archived: bool,
) -> Result<Vec<ContentItem>, AppError> {
    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM content_items \
         WHERE user_id = ? AND is_archived = ? \
         ORDER BY created_at DESC, id DESC"
    );
    let items = sqlx::query_as::<_, ContentItem>(&sql)
        .bind(user_id)
        .bind(archived)
        .fetch_all(pool)
        .await?;

    Ok(items)
}

/// 소유자가 일치하는 북마크 하나를 조회합니다.
pub async fn get_owned(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<ContentItem>, AppError> {
    let sql = format!("SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = ? AND user_id = ?");
    let item = sqlx::query_as::<_, ContentItem>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(item)
}

pub async fn create_content(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    url: &str,
    comment: Option<&str>,
) -> Result<ContentItem, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO content_items (id, user_id, title, url, comment)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(url)
    .bind(comment)
    .execute(pool)
    .await?;

    get_owned(pool, &id, user_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created content".to_string()))
}

/// 제목/URL/코멘트를 덮어씁니다. 소유한 행이 없으면 `false`.
pub async fn update_content(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    title: &str,
    url: &str,
    comment: Option<&str>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE content_items
        SET title = ?, url = ?, comment = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(title)
    .bind(url)
    .bind(comment)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 보관 플래그를 뒤집고 바뀐 값을 반환합니다. 소유한 행이 없으면 `None`.
///
/// 읽고-쓰기를 한 문장(`NOT is_archived ... RETURNING`)으로 처리하므로
/// 동시에 두 번 요청되어도 두 번 뒤집힙니다.
pub async fn toggle_archived(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<bool>, AppError> {
    let archived = sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE content_items
        SET is_archived = NOT is_archived,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        RETURNING is_archived
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(archived)
}

/// 북마크를 영구 삭제합니다. `content_tags`, `comments` 행은 CASCADE로 함께 삭제됩니다.
pub async fn delete_content(pool: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM content_items WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
