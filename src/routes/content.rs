//! # 북마크 라우트
//!
//! 모든 핸들러는 로그인이 필요합니다(`AuthUser`). 다른 사용자의 북마크 ID는
//! 존재하지 않는 ID와 같게 취급되어 "Content not found"와 함께 목록으로 돌아갑니다.

use axum::{
    extract::{Path, RawForm, RawQuery, State},
    response::Response,
};

use crate::db;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::middleware::flash::{flash_redirect, Flash, IncomingFlash};
use crate::models::{ContentFilter, ContentForm};
use crate::routes::AppState;
use crate::services::content as content_service;
use crate::views::{
    render_page, tag_options, ContentAddPage, ContentEditPage, ContentIndexPage, PageContext,
};

fn edit_path(id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/content/edit/{}", encoded)
}

/// `GET /content?search=&tag=&archived=`
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: IncomingFlash,
    RawQuery(query): RawQuery,
) -> Response {
    let filter = ContentFilter::from_query(query.as_deref());
    let listing = match content_service::list_content(&state.pool, &user.id, &filter).await {
        Ok(listing) => listing,
        Err(err) => return err.redirect_to("/dashboard"),
    };

    let title = if filter.archived() {
        "Archived Content"
    } else {
        "Your Content"
    };
    let page = ContentIndexPage::new(
        PageContext::new(title, Some(&user), &flash),
        &listing.items,
        &listing.tags,
        filter.search().unwrap_or_default(),
        filter.tag().unwrap_or_default(),
        filter.archived(),
    );
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/dashboard"))
}

/// `GET /content/add`
pub async fn add_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: IncomingFlash,
) -> Response {
    let catalog = match db::list_tags(&state.pool).await {
        Ok(tags) => tags,
        Err(err) => return err.redirect_to("/content"),
    };

    let page = ContentAddPage {
        page: PageContext::new("Add Content", Some(&user), &flash),
        errors: Vec::new(),
        form: ContentForm::default(),
        tags: tag_options(&catalog, &[]),
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/content"))
}

/// `POST /content`
///
/// 검증에 실패하면 저장하지 않고, 입력값을 유지한 채 추가 폼을 다시 보여줍니다.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: IncomingFlash,
    RawForm(body): RawForm,
) -> Response {
    let form = ContentForm::from_urlencoded(&body);

    let errors = match content_service::create_content(&state.pool, &user.id, &form).await {
        Ok(_) => return flash_redirect("/content", Flash::success("Content added successfully")),
        Err(AppError::Validation(errors)) => errors,
        Err(err) => return err.redirect_to("/content/add"),
    };

    let catalog = match db::list_tags(&state.pool).await {
        Ok(tags) => tags,
        Err(err) => return err.redirect_to("/content/add"),
    };
    let page = ContentAddPage {
        page: PageContext::new("Add Content", Some(&user), &flash),
        errors: errors.into_iter().map(|e| e.message).collect(),
        tags: tag_options(&catalog, &form.tag_ids),
        form,
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/content/add"))
}

/// `GET /content/edit/{id}`
pub async fn edit_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: IncomingFlash,
    Path(id): Path<String>,
) -> Response {
    let content = match content_service::get_owned_content(&state.pool, &id, &user.id).await {
        Ok(content) => content,
        Err(err) => return err.redirect_to("/content"),
    };
    let catalog = match db::list_tags(&state.pool).await {
        Ok(tags) => tags,
        Err(err) => return err.redirect_to("/content"),
    };

    let form = ContentForm::from_item(&content);
    let page = ContentEditPage {
        page: PageContext::new("Edit Content", Some(&user), &flash),
        tags: tag_options(&catalog, &form.tag_ids),
        id: content.item.id,
        form,
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/content"))
}

/// `PUT /content/{id}`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Response {
    let form = ContentForm::from_urlencoded(&body);

    match content_service::update_content(&state.pool, &id, &user.id, &form).await {
        Ok(()) => flash_redirect("/content", Flash::success("Content updated successfully")),
        Err(err @ AppError::NotFound(_)) => err.redirect_to("/content"),
        Err(err) => err.redirect_to(&edit_path(&id)),
    }
}

/// `PUT /content/archive/{id}`
pub async fn toggle_archive(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Response {
    match content_service::toggle_archive(&state.pool, &id, &user.id).await {
        Ok(true) => flash_redirect("/content", Flash::success("Content archived successfully")),
        Ok(false) => flash_redirect("/content", Flash::success("Content unarchived successfully")),
        Err(err) => err.redirect_to("/content"),
    }
}

/// `DELETE /content/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Response {
    match content_service::delete_content(&state.pool, &id, &user.id).await {
        Ok(()) => flash_redirect("/content", Flash::success("Content deleted successfully")),
        Err(err) => err.redirect_to("/content"),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_server, location, login, set_cookies};
    use axum::http::{header::COOKIE, StatusCode};
    use sqlx::SqlitePool;

    fn flash_of(response: &axum_test::TestResponse) -> String {
        set_cookies(response)
            .into_iter()
            .find(|c| c.starts_with("daysave.flash="))
            .unwrap_or_default()
    }

    async fn only_content_id(pool: &SqlitePool) -> String {
        sqlx::query_scalar("SELECT id FROM content_items")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn anonymous_requests_are_sent_to_login(pool: SqlitePool) {
        let server = create_test_server(pool).await;

        for path in ["/content", "/content/add", "/dashboard"] {
            let response = server.get(path).await;
            assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/users/login");
            assert!(flash_of(&response).contains("Please+log+in+to+view+that+resource"));
        }
    }

    #[sqlx::test]
    async fn create_list_archive_and_delete(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let cookie = login(&server, &pool, "alice@example.com").await;

        let created = server
            .post("/content")
            .add_header(COOKIE, cookie.clone())
            .text("title=Example&url=https%3A%2F%2Fexample.com&newTags=reading")
            .content_type("application/x-www-form-urlencoded")
            .await;
        assert_eq!(location(&created), "/content");
        assert!(flash_of(&created).contains("Content+added+successfully"));

        let listing = server
            .get("/content?search=Example")
            .add_header(COOKIE, cookie.clone())
            .await;
        listing.assert_status_ok();
        let html = listing.text();
        assert!(html.contains("example.com"));
        assert!(html.contains(">reading</a>"));

        let id = only_content_id(&pool).await;

        // HTML 폼은 POST + _method 쿼리로 보냅니다.
        let archived = server
            .post(&format!("/content/archive/{id}?_method=PUT"))
            .add_header(COOKIE, cookie.clone())
            .await;
        assert!(flash_of(&archived).contains("Content+archived+successfully"));

        let active = server.get("/content").add_header(COOKIE, cookie.clone()).await;
        assert!(!active.text().contains("example.com"));
        let archive = server
            .get("/content?archived=true")
            .add_header(COOKIE, cookie.clone())
            .await;
        assert!(archive.text().contains("example.com"));

        let deleted = server
            .post(&format!("/content/{id}?_method=DELETE"))
            .add_header(COOKIE, cookie.clone())
            .await;
        assert!(flash_of(&deleted).contains("Content+deleted+successfully"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn odd_query_strings_still_render_list(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let cookie = login(&server, &pool, "alice@example.com").await;

        for path in ["/content?search=a&search=b", "/content?archived=yes&tag=%ZZ", "/content?"] {
            let response = server.get(path).add_header(COOKIE, cookie.clone()).await;
            response.assert_status_ok();
        }
    }

    #[sqlx::test]
    async fn invalid_create_rerenders_form(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let cookie = login(&server, &pool, "alice@example.com").await;

        let response = server
            .post("/content")
            .add_header(COOKIE, cookie)
            .text("title=Example&url=example")
            .content_type("application/x-www-form-urlencoded")
            .await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Valid URL is required"));
        assert!(html.contains(r#"value="Example""#));
    }

    #[sqlx::test]
    async fn other_users_content_is_not_found(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let alice = login(&server, &pool, "alice@example.com").await;
        let bob = login(&server, &pool, "bob@example.com").await;

        server
            .post("/content")
            .add_header(COOKIE, alice.clone())
            .text("title=Example&url=https%3A%2F%2Fexample.com")
            .content_type("application/x-www-form-urlencoded")
            .await;
        let id = only_content_id(&pool).await;

        let edit = server
            .get(&format!("/content/edit/{id}"))
            .add_header(COOKIE, bob.clone())
            .await;
        assert_eq!(location(&edit), "/content");
        assert!(flash_of(&edit).contains("Content+not+found"));

        let update = server
            .put(&format!("/content/{id}"))
            .add_header(COOKIE, bob.clone())
            .text("title=Mine&url=https%3A%2F%2Fbob.example")
            .content_type("application/x-www-form-urlencoded")
            .await;
        assert_eq!(location(&update), "/content");
        assert!(flash_of(&update).contains("Content+not+found"));

        let delete = server
            .delete(&format!("/content/{id}"))
            .add_header(COOKIE, bob)
            .await;
        assert!(flash_of(&delete).contains("Content+not+found"));

        let title: String = sqlx::query_scalar("SELECT title FROM content_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "Example");
    }

    #[sqlx::test]
    async fn invalid_update_returns_to_edit_form(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let cookie = login(&server, &pool, "alice@example.com").await;

        server
            .post("/content")
            .add_header(COOKIE, cookie.clone())
            .text("title=Example&url=https%3A%2F%2Fexample.com")
            .content_type("application/x-www-form-urlencoded")
            .await;
        let id = only_content_id(&pool).await;

        let response = server
            .post(&format!("/content/{id}?_method=PUT"))
            .add_header(COOKIE, cookie)
            .text("title=&url=https%3A%2F%2Fexample.com")
            .content_type("application/x-www-form-urlencoded")
            .await;
        assert_eq!(location(&response), format!("/content/edit/{id}"));
        assert!(flash_of(&response).contains("Title+is+required"));
    }

    #[sqlx::test]
    async fn deleted_user_session_becomes_anonymous(pool: SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        let cookie = login(&server, &pool, "alice@example.com").await;

        sqlx::query("DELETE FROM users").execute(&pool).await.unwrap();

        let response = server.get("/content").add_header(COOKIE, cookie).await;
        assert_eq!(location(&response), "/users/login");
    }
}
