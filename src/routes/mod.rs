//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 받아 서비스 계층을 호출하고, 페이지를 렌더링하거나
//! 플래시 메시지와 함께 리다이렉트합니다. 사용자에게 프로토콜 수준의 에러를
//! 보여주는 대신 항상 사람이 읽을 수 있는 메시지로 돌려보냅니다.
//!
//! 각 하위 모듈:
//! - `index`: 랜딩 페이지, 대시보드
//! - `users`: 회원가입, 로그인/로그아웃, 비밀번호 재설정
//! - `oauth`: 제공자 로그인 시작과 콜백
//! - `content`: 북마크 목록/추가/편집/보관/삭제

pub mod content;
pub mod index;
pub mod oauth;
pub mod users;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::method_override::method_override;
use crate::services::oauth::OAuthRegistry;

/// 모든 핸들러가 공유하는 애플리케이션 상태
///
/// `SqlitePool`은 내부적으로 `Arc`라서 clone해도 같은 풀을 가리킵니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub oauth: Arc<OAuthRegistry>,
}

/// 전체 라우터를 만듭니다.
///
/// 메서드 오버라이드는 라우팅 전에 실행되어야 하므로, 실제 라우터를 바깥 라우터의
/// fallback 서비스로 감싸고 그 바깥에 미들웨어를 붙입니다.
pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    let routes = Router::new()
        .route("/", get(index::landing))
        .route("/dashboard", get(index::dashboard))
        // 사용자 계정
        .route("/users/login", get(users::login_page).post(users::login))
        .route("/users/register", get(users::register_page).post(users::register))
        .route("/users/logout", get(users::logout))
        .route("/users/forgot", get(users::forgot_page).post(users::forgot))
        .route("/users/reset/{token}", get(users::reset_page).post(users::reset))
        // OAuth (Apple은 콜백을 form_post로 보냄)
        .route("/users/auth/{provider}", get(oauth::start))
        .route(
            "/users/auth/{provider}/callback",
            get(oauth::callback_query).post(oauth::callback_form),
        )
        // 북마크
        .route("/content", get(content::index).post(content::create))
        .route("/content/add", get(content::add_page))
        .route("/content/edit/{id}", get(content::edit_page))
        .route("/content/{id}", put(content::update).delete(content::destroy))
        .route("/content/archive/{id}", put(content::toggle_archive))
        .nest_service("/public", static_dir)
        .with_state(state);

    Router::new()
        .fallback_service(routes)
        .layer(middleware::from_fn(method_override))
        .layer(TraceLayer::new_for_http())
}
