//! # 화면(askama 템플릿) 정의
//!
//! 템플릿 파일은 `templates/` 아래에 있고 컴파일 시점에 검사됩니다.
//! 모든 페이지는 공통 `PageContext`(제목, 로그인 사용자, 플래시 메시지)를 가집니다.

use askama::Template;
use axum::{
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;
use crate::middleware::flash::IncomingFlash;
use crate::models::{ContentForm, ContentWithTags, Tag, User};
use crate::services::oauth::Provider;

/// 레이아웃(`base.html`)이 쓰는 공통 값
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub title: String,
    pub signed_in: bool,
    pub user_name: String,
    pub success: String,
    pub error: String,
}

impl PageContext {
    pub fn new(title: &str, user: Option<&User>, flash: &IncomingFlash) -> Self {
        Self {
            title: title.to_string(),
            signed_in: user.is_some(),
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            success: flash.success(),
            error: flash.error(),
        }
    }
}

/// 템플릿을 렌더링하고, 읽은 플래시 쿠키가 있으면 지웁니다.
pub fn render_page<T: Template>(template: &T, flash: &IncomingFlash) -> Result<Response, AppError> {
    let html = Html(template.render()?);
    Ok(match flash.clear_cookie() {
        Some(cookie) => ([(SET_COOKIE, cookie)], html).into_response(),
        None => html.into_response(),
    })
}

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage {
    pub page: PageContext,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub page: PageContext,
}

/// 로그인 화면의 OAuth 버튼
#[derive(Debug, Clone)]
pub struct ProviderLink {
    pub slug: &'static str,
    pub name: &'static str,
}

impl From<Provider> for ProviderLink {
    fn from(provider: Provider) -> Self {
        Self {
            slug: provider.slug(),
            name: provider.display_name(),
        }
    }
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginPage {
    pub page: PageContext,
    pub providers: Vec<ProviderLink>,
}

#[derive(Template)]
#[template(path = "users/register.html")]
pub struct RegisterPage {
    pub page: PageContext,
    pub errors: Vec<String>,
    pub name: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "users/forgot.html")]
pub struct ForgotPage {
    pub page: PageContext,
}

#[derive(Template)]
#[template(path = "users/reset.html")]
pub struct ResetPage {
    pub page: PageContext,
    pub token: String,
}

/// 목록의 한 줄
#[derive(Debug, Clone)]
pub struct ContentRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub comment: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub created_on: String,
}

impl From<&ContentWithTags> for ContentRow {
    fn from(content: &ContentWithTags) -> Self {
        Self {
            id: content.item.id.clone(),
            title: content.item.title.clone(),
            url: content.item.url.clone(),
            comment: content.item.comment.clone().unwrap_or_default(),
            tags: content.tag_names(),
            is_archived: content.item.is_archived,
            created_on: content.item.created_at.chars().take(10).collect(),
        }
    }
}

/// 태그 필터 드롭다운 항목
#[derive(Debug, Clone)]
pub struct TagChoice {
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "content/index.html")]
pub struct ContentIndexPage {
    pub page: PageContext,
    pub items: Vec<ContentRow>,
    pub tags: Vec<TagChoice>,
    pub search: String,
    pub tag: String,
    pub archived: bool,
}

impl ContentIndexPage {
    pub fn new(
        page: PageContext,
        items: &[ContentWithTags],
        catalog: &[Tag],
        search: &str,
        tag: &str,
        archived: bool,
    ) -> Self {
        Self {
            page,
            items: items.iter().map(ContentRow::from).collect(),
            tags: catalog
                .iter()
                .map(|t| TagChoice {
                    name: t.name.clone(),
                    selected: t.name.eq_ignore_ascii_case(tag),
                })
                .collect(),
            search: search.to_string(),
            tag: tag.to_string(),
            archived,
        }
    }
}

/// 추가/수정 폼의 태그 체크박스
#[derive(Debug, Clone)]
pub struct TagOption {
    pub id: String,
    pub name: String,
    pub checked: bool,
}

pub fn tag_options(catalog: &[Tag], selected_ids: &[String]) -> Vec<TagOption> {
    catalog
        .iter()
        .map(|t| TagOption {
            id: t.id.clone(),
            name: t.name.clone(),
            checked: selected_ids.contains(&t.id),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "content/add.html")]
pub struct ContentAddPage {
    pub page: PageContext,
    pub errors: Vec<String>,
    pub form: ContentForm,
    pub tags: Vec<TagOption>,
}

#[derive(Template)]
#[template(path = "content/edit.html")]
pub struct ContentEditPage {
    pub page: PageContext,
    pub id: String,
    pub form: ContentForm,
    pub tags: Vec<TagOption>,
}
