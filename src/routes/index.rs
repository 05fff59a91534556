use axum::response::{IntoResponse, Response};

use crate::middleware::auth::{AuthUser, CurrentUser};
use crate::middleware::flash::IncomingFlash;
use crate::views::{render_page, DashboardPage, LandingPage, PageContext};

/// `GET /` 공개 랜딩 페이지
pub async fn landing(CurrentUser(user): CurrentUser, flash: IncomingFlash) -> Response {
    let page = LandingPage {
        page: PageContext::new("Welcome to DaySave", user.as_ref(), &flash),
    };
    render_page(&page, &flash).unwrap_or_else(IntoResponse::into_response)
}

/// `GET /dashboard` 로그인 필요
pub async fn dashboard(AuthUser(user): AuthUser, flash: IncomingFlash) -> Response {
    let page = DashboardPage {
        page: PageContext::new("Dashboard", Some(&user), &flash),
    };
    render_page(&page, &flash).unwrap_or_else(IntoResponse::into_response)
}
