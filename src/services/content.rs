//! # 북마크 서비스
//!
//! 목록(검색/보관/태그 필터), 추가, 편집, 보관 토글, 삭제를 담당합니다.
//! 모든 작업은 요청한 사용자의 ID를 입력으로 받고, 소유하지 않은 북마크는
//! 존재하지 않는 북마크와 똑같이 `NotFound("Content")`로 처리합니다.
//!
//! ## 태그 규칙
//! - 제출된 기존 태그 ID 목록으로 관계를 **교체**합니다. 목록이 비어 있으면 모두 해제됩니다.
//! - 그 다음 쉼표로 구분된 새 태그 이름을 find-or-create 하여 **추가**합니다.
//!
//! 여러 문장에 걸친 작업은 트랜잭션으로 묶지 않습니다. 북마크 저장 후 태그 저장이 실패하면
//! 태그 없이 저장된 북마크가 남을 수 있습니다.

use sqlx::SqlitePool;

use crate::db::{self, comments as db_comments};
use crate::error::AppError;
use crate::models::{ContentFilter, ContentForm, ContentItem, ContentWithTags, Tag};
use crate::services::validation::{split_tag_names, validate_content};

/// 목록 화면에 필요한 데이터: 필터를 통과한 북마크와 전체 태그 목록
#[derive(Debug, Clone)]
pub struct ContentListing {
    pub items: Vec<ContentWithTags>,
    pub tags: Vec<Tag>,
}

pub async fn list_content(
    pool: &SqlitePool,
    user_id: &str,
    filter: &ContentFilter,
) -> Result<ContentListing, AppError> {
    let rows = db::list_for_user(pool, user_id, filter.archived()).await?;
    let mut tags_by_content = db::tags_by_content_for_user(pool, user_id).await?;

    let mut items: Vec<ContentWithTags> = rows
        .into_iter()
        .map(|item| {
            let tags = tags_by_content.remove(&item.id).unwrap_or_default();
            ContentWithTags { item, tags }
        })
        .collect();

    // 제목 검색과 태그 필터는 쿼리 이후에 적용합니다. 둘 다 유니코드 대소문자를 무시합니다.
    if let Some(search) = filter.search() {
        let needle = search.to_lowercase();
        items.retain(|content| content.item.title.to_lowercase().contains(&needle));
    }
    if let Some(tag) = filter.tag() {
        items.retain(|content| content.has_tag_named(tag));
    }

    let tags = db::list_tags(pool).await?;
    Ok(ContentListing { items, tags })
}

pub async fn create_content(
    pool: &SqlitePool,
    user_id: &str,
    form: &ContentForm,
) -> Result<ContentItem, AppError> {
    let errors = validate_content(form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let item = db::create_content(pool, user_id, form.title.trim(), form.url.trim(), form.comment())
        .await?;
    apply_tags(pool, &item.id, form).await?;

    tracing::info!(user_id, content_id = %item.id, "content created");
    Ok(item)
}

/// 편집 화면용으로 소유한 북마크와 태그를 불러옵니다.
pub async fn get_owned_content(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<ContentWithTags, AppError> {
    let item = db::get_owned(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound("Content"))?;
    let tags = db::tags_for_content(pool, &item.id).await?;

    Ok(ContentWithTags { item, tags })
}

pub async fn update_content(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    form: &ContentForm,
) -> Result<(), AppError> {
    let errors = validate_content(form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let updated = db::update_content(
        pool,
        id,
        user_id,
        form.title.trim(),
        form.url.trim(),
        form.comment(),
    )
    .await?;
    if !updated {
        return Err(AppError::NotFound("Content"));
    }
    apply_tags(pool, id, form).await?;

    tracing::info!(user_id, content_id = id, "content updated");
    Ok(())
}

/// 보관 상태를 뒤집고, 바뀐 상태(`true`면 보관됨)를 반환합니다.
pub async fn toggle_archive(pool: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let archived = db::toggle_archived(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound("Content"))?;

    tracing::info!(user_id, content_id = id, archived, "content archive toggled");
    Ok(archived)
}

/// 북마크를 영구 삭제합니다. 태그 관계와 코멘트는 CASCADE로 함께 사라집니다.
pub async fn delete_content(pool: &SqlitePool, id: &str, user_id: &str) -> Result<(), AppError> {
    let item = db::get_owned(pool, id, user_id)
        .await?
        .ok_or(AppError::NotFound("Content"))?;
    let comments = db_comments::count_for_content(pool, &item.id).await?;

    if !db::delete_content(pool, &item.id, user_id).await? {
        return Err(AppError::NotFound("Content"));
    }

    tracing::info!(
        user_id,
        content_id = id,
        comments_removed = comments,
        "content deleted"
    );
    Ok(())
}

/// 기존 태그 ID로 관계를 교체한 뒤, 새 태그 이름을 추가합니다.
async fn apply_tags(pool: &SqlitePool, content_id: &str, form: &ContentForm) -> Result<(), AppError> {
    db::set_content_tags(pool, content_id, &form.tag_ids).await?;

    for name in split_tag_names(&form.new_tags) {
        let tag = db::find_or_create_tag(pool, &name).await?;
        db::add_tag_to_content(pool, content_id, &tag.id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;

    fn form(title: &str, url: &str, new_tags: &str) -> ContentForm {
        ContentForm {
            title: title.into(),
            url: url.into(),
            new_tags: new_tags.into(),
            ..Default::default()
        }
    }

    fn names(content: &ContentWithTags) -> Vec<String> {
        let mut names = content.tag_names();
        names.sort();
        names
    }

    async fn count_content(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM content_items")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn invalid_content_is_not_stored(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;

        for bad in [form("", "https://example.com", ""), form("Example", "example", "")] {
            let err = create_content(&pool, &alice.id, &bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(count_content(&pool).await, 0);
    }

    #[sqlx::test]
    async fn tag_roundtrip_through_edit(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let item = create_content(&pool, &alice.id, &form("Example", "https://example.com", "x, y"))
            .await
            .unwrap();

        let loaded = get_owned_content(&pool, &item.id, &alice.id).await.unwrap();
        assert_eq!(names(&loaded), vec!["x", "y"]);

        let x_id = loaded.tags.iter().find(|t| t.name == "x").unwrap().id.clone();
        let mut edit = ContentForm::from_item(&loaded);
        edit.tag_ids = vec![x_id];
        update_content(&pool, &item.id, &alice.id, &edit).await.unwrap();

        let reloaded = get_owned_content(&pool, &item.id, &alice.id).await.unwrap();
        assert_eq!(names(&reloaded), vec!["x"]);
    }

    #[sqlx::test]
    async fn update_without_ids_clears_before_adding_new_names(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let item = create_content(&pool, &alice.id, &form("Example", "https://example.com", "old"))
            .await
            .unwrap();

        update_content(
            &pool,
            &item.id,
            &alice.id,
            &form("Example", "https://example.com", "new"),
        )
        .await
        .unwrap();

        let reloaded = get_owned_content(&pool, &item.id, &alice.id).await.unwrap();
        assert_eq!(names(&reloaded), vec!["new"]);
    }

    #[sqlx::test]
    async fn listing_filters_by_tag_case_insensitively(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        create_content(&pool, &alice.id, &form("Example", "https://example.com", "reading"))
            .await
            .unwrap();
        create_content(&pool, &alice.id, &form("Other", "https://other.example", "cooking"))
            .await
            .unwrap();

        let filter = ContentFilter {
            tag: Some("READING".into()),
            ..Default::default()
        };
        let listing = list_content(&pool, &alice.id, &filter).await.unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].item.title, "Example");
        let catalog: Vec<&str> = listing.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(catalog, vec!["cooking", "reading"]);
    }

    #[sqlx::test]
    async fn alice_scenario_search_finds_tagged_item(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        create_content(&pool, &alice.id, &form("Example", "https://example.com", "reading"))
            .await
            .unwrap();

        let filter = ContentFilter {
            search: Some("Example".into()),
            ..Default::default()
        };
        let listing = list_content(&pool, &alice.id, &filter).await.unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].tag_names(), vec!["reading"]);
        assert!(!listing.items[0].item.is_archived);
    }

    #[sqlx::test]
    async fn search_ignores_case_beyond_ascii(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        create_content(&pool, &alice.id, &form("Über Rust", "https://example.com/uber", ""))
            .await
            .unwrap();
        create_content(&pool, &alice.id, &form("50% off_sale", "https://example.com/sale", ""))
            .await
            .unwrap();

        for (search, expected) in [("über", "Über Rust"), ("ÜBER", "Über Rust"), ("% OFF_", "50% off_sale")] {
            let filter = ContentFilter {
                search: Some(search.into()),
                ..Default::default()
            };
            let listing = list_content(&pool, &alice.id, &filter).await.unwrap();
            let titles: Vec<&str> = listing.items.iter().map(|c| c.item.title.as_str()).collect();
            assert_eq!(titles, vec![expected], "search {search:?}");
        }
    }

    #[sqlx::test]
    async fn foreign_ids_look_like_missing_ids(pool: SqlitePool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let item = create_content(&pool, &alice.id, &form("Example", "https://example.com", "keep"))
            .await
            .unwrap();

        let messages = [
            get_owned_content(&pool, &item.id, &bob.id).await.unwrap_err().user_message(),
            update_content(&pool, &item.id, &bob.id, &form("Mine", "https://bob.example", ""))
                .await
                .unwrap_err()
                .user_message(),
            toggle_archive(&pool, &item.id, &bob.id).await.unwrap_err().user_message(),
            delete_content(&pool, &item.id, &bob.id).await.unwrap_err().user_message(),
            delete_content(&pool, "no-such-id", &alice.id).await.unwrap_err().user_message(),
        ];
        assert!(messages.iter().all(|m| m == "Content not found"));

        let untouched = get_owned_content(&pool, &item.id, &alice.id).await.unwrap();
        assert_eq!(untouched.item.title, "Example");
        assert!(!untouched.item.is_archived);
        assert_eq!(untouched.tag_names(), vec!["keep"]);
    }
}
