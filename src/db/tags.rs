//! # 태그 데이터베이스 쿼리 모듈
//!
//! 태그 조회, 이름 기반 find-or-create, 북마크-태그 관계를 관리합니다.
//!
//! ## 테이블 구조
//! - `tags`: 태그 엔티티 (id, name). `name`은 `UNIQUE COLLATE NOCASE`
//! - `content_tags`: 북마크와 태그의 다대다(N:M) 관계 테이블

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{ContentTagRow, Tag};
use sqlx::SqlitePool;

/// 모든 태그를 이름순으로 조회합니다 (목록 화면의 필터 선택지, 추가/수정 폼의 체크박스).
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name COLLATE NOCASE")
        .fetch_all(pool)
        .await?;

    Ok(tags)
}

/// 이름으로 태그를 찾고, 없으면 만듭니다.
///
/// 먼저 확인하고 INSERT하면 동시 요청끼리 경쟁하므로,
/// `ON CONFLICT DO NOTHING`으로 INSERT를 시도한 뒤 항상 다시 SELECT 합니다.
/// 이름 비교는 컬럼의 `COLLATE NOCASE`를 따르므로 "Rust"와 "rust"는 같은 태그입니다.
pub async fn find_or_create_tag(pool: &SqlitePool, name: &str) -> Result<Tag, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(&id)
        .bind(name)
        .execute(pool)
        .await?;

    let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(tag)
}

/// 북마크의 태그 관계를 `tag_ids`로 통째로 교체합니다. 빈 목록이면 모두 해제됩니다.
///
/// 존재하지 않는 태그 ID는 조용히 무시합니다.
pub async fn set_content_tags(
    pool: &SqlitePool,
    content_id: &str,
    tag_ids: &[String],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM content_tags WHERE content_id = ?")
        .bind(content_id)
        .execute(pool)
        .await?;

    for tag_id in tag_ids {
        add_tag_to_content(pool, content_id, tag_id).await?;
    }

    Ok(())
}

/// 관계 하나를 추가합니다. 이미 붙어 있거나 태그가 없으면 아무 일도 하지 않습니다.
pub async fn add_tag_to_content(
    pool: &SqlitePool,
    content_id: &str,
    tag_id: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO content_tags (content_id, tag_id)
        SELECT ?, id FROM tags WHERE id = ?
        "#,
    )
    .bind(content_id)
    .bind(tag_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// 북마크 하나에 붙은 태그를 이름순으로 조회합니다.
pub async fn tags_for_content(pool: &SqlitePool, content_id: &str) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name
        FROM tags t
        INNER JOIN content_tags ct ON ct.tag_id = t.id
        WHERE ct.content_id = ?
        ORDER BY t.name COLLATE NOCASE
        "#,
    )
    .bind(content_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// 한 사용자의 모든 북마크에 대한 태그를 한 번에 조회해 북마크 ID별로 묶습니다.
/// 목록 화면에서 북마크마다 쿼리를 날리지 않기 위해 사용합니다.
pub async fn tags_by_content_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<HashMap<String, Vec<Tag>>, AppError> {
    let rows = sqlx::query_as::<_, ContentTagRow>(
        r#"
        SELECT ct.content_id, t.id, t.name
        FROM content_tags ct
        INNER JOIN tags t ON t.id = ct.tag_id
        INNER JOIN content_items c ON c.id = ct.content_id
        WHERE c.user_id = ?
        ORDER BY t.name COLLATE NOCASE
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<String, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.content_id.clone())
            .or_default()
            .push(Tag::from(row));
    }

    Ok(grouped)
}
