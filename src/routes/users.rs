//! # 사용자 계정 라우트
//!
//! `/users/login`, `/users/register`, `/users/logout`, `/users/forgot`, `/users/reset/{token}`

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    Form,
};
use chrono::Utc;

use crate::error::AppError;
use crate::middleware::append_cookie;
use crate::middleware::auth::{end_session, start_session, CurrentUser};
use crate::middleware::flash::{flash_redirect, redirect, Flash, IncomingFlash};
use crate::models::{ForgotForm, LoginForm, RegisterForm, ResetForm};
use crate::routes::AppState;
use crate::services::accounts;
use crate::views::{
    render_page, ForgotPage, LoginPage, PageContext, ProviderLink, RegisterPage, ResetPage,
};

/// `GET /users/login`
pub async fn login_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Response {
    let page = LoginPage {
        page: PageContext::new("Login", user.as_ref(), &flash),
        providers: state.oauth.enabled().into_iter().map(ProviderLink::from).collect(),
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/"))
}

/// `POST /users/login` 성공 시 `/dashboard`, 실패 시 이유와 함께 `/users/login`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match accounts::authenticate(&state.pool, &form.email, &form.password).await {
        Ok(user) => user,
        Err(err) => return err.redirect_to("/users/login"),
    };

    // 로그인 전에 쓰던 세션이 있으면 버리고 새로 발급합니다.
    if let Err(err) = end_session(&state.pool, &state.config, &headers).await {
        return err.redirect_to("/users/login");
    }
    match start_session(&state.pool, &state.config, &user.id).await {
        Ok(cookie) => {
            tracing::info!(user_id = %user.id, "local login");
            append_cookie(redirect("/dashboard"), &cookie)
        }
        Err(err) => err.redirect_to("/users/login"),
    }
}

/// `GET /users/logout` 항상 성공합니다.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let response = flash_redirect("/users/login", Flash::success("You are logged out"));
    match end_session(&state.pool, &state.config, &headers).await {
        Ok(cookie) => append_cookie(response, &cookie),
        Err(err) => {
            err.log();
            append_cookie(
                response,
                &crate::middleware::expire_cookie(crate::middleware::auth::SESSION_COOKIE),
            )
        }
    }
}

/// `GET /users/register`
pub async fn register_page(CurrentUser(user): CurrentUser, flash: IncomingFlash) -> Response {
    let page = RegisterPage {
        page: PageContext::new("Register", user.as_ref(), &flash),
        errors: Vec::new(),
        name: String::new(),
        email: String::new(),
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/"))
}

/// `POST /users/register`
///
/// 검증 실패와 중복 이메일은 입력값(비밀번호 제외)을 유지한 채 폼을 다시 보여줍니다.
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Form(form): Form<RegisterForm>,
) -> Response {
    let err = match accounts::register(&state.pool, &form).await {
        Ok(_) => {
            return flash_redirect(
                "/users/login",
                Flash::success("You are now registered and can log in"),
            )
        }
        Err(err) => err,
    };

    err.log();
    let errors = match &err {
        AppError::Validation(errors) => errors.iter().map(|e| e.message.clone()).collect(),
        other => vec![other.user_message()],
    };
    let page = RegisterPage {
        page: PageContext::new("Register", user.as_ref(), &flash),
        errors,
        name: form.name,
        email: form.email,
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/users/register"))
}

/// `GET /users/forgot`
pub async fn forgot_page(CurrentUser(user): CurrentUser, flash: IncomingFlash) -> Response {
    let page = ForgotPage {
        page: PageContext::new("Forgot Password", user.as_ref(), &flash),
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/"))
}

/// `POST /users/forgot`
///
/// 메일 발송은 하지 않고, 재설정 링크를 플래시 메시지로 바로 보여줍니다.
pub async fn forgot(State(state): State<AppState>, Form(form): Form<ForgotForm>) -> Response {
    match accounts::request_password_reset(&state.pool, &form.email, Utc::now()).await {
        Ok(token) => {
            let link = format!("{}/users/reset/{}", state.config.app_url, token);
            flash_redirect(
                "/users/forgot",
                Flash::success(format!("Password reset link: {}", link)),
            )
        }
        Err(err) => err.redirect_to("/users/forgot"),
    }
}

/// `GET /users/reset/{token}` 토큰이 유효할 때만 새 비밀번호 폼을 보여줍니다.
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Response {
    if let Err(err) = accounts::find_user_by_reset_token(&state.pool, &token, Utc::now()).await {
        return err.redirect_to("/users/forgot");
    }

    let page = ResetPage {
        page: PageContext::new("Reset Password", user.as_ref(), &flash),
        token,
    };
    render_page(&page, &flash).unwrap_or_else(|err| err.redirect_to("/users/forgot"))
}

/// `POST /users/reset/{token}`
pub async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Response {
    match accounts::reset_password(&state.pool, &token, &form, Utc::now()).await {
        Ok(_) => flash_redirect("/users/login", Flash::success("Password has been reset")),
        // 토큰이 틀렸거나 만료됨
        Err(err @ AppError::Unauthorized(_)) => err.redirect_to("/users/forgot"),
        // 비밀번호 불일치나 저장 실패는 같은 토큰의 폼으로 되돌아갑니다.
        Err(err) => err.redirect_to(&reset_path(&token)),
    }
}

fn reset_path(token: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!("/users/reset/{}", encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cookie_header, create_test_server, location, set_cookies};
    use axum::http::{header::COOKIE, StatusCode};

    fn flash_of(response: &axum_test::TestResponse) -> String {
        set_cookies(response)
            .into_iter()
            .find(|c| c.starts_with("daysave.flash="))
            .unwrap_or_default()
    }

    #[sqlx::test]
    async fn register_then_login_reaches_dashboard(pool: sqlx::SqlitePool) {
        let server = create_test_server(pool).await;

        let response = server
            .post("/users/register")
            .form(&RegisterForm {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password: "hunter12".into(),
            })
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/users/login");
        assert!(flash_of(&response).contains("You+are+now+registered"));

        let response = server
            .post("/users/login")
            .form(&LoginForm {
                email: "alice@example.com".into(),
                password: "hunter12".into(),
            })
            .await;
        assert_eq!(location(&response), "/dashboard");

        let dashboard = server
            .get("/dashboard")
            .add_header(COOKIE, cookie_header(&response))
            .await;
        dashboard.assert_status_ok();
        assert!(dashboard.text().contains("Welcome, Alice"));
    }

    #[sqlx::test]
    async fn failed_login_flashes_reason(pool: sqlx::SqlitePool) {
        let server = create_test_server(pool).await;

        let response = server
            .post("/users/login")
            .form(&LoginForm {
                email: "ghost@example.com".into(),
                password: "whatever".into(),
            })
            .await;
        assert_eq!(location(&response), "/users/login");
        assert!(flash_of(&response).contains("That+email+is+not+registered"));
        assert!(!set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("daysave.sid=") && !c.contains("Max-Age=0")));
    }

    #[sqlx::test]
    async fn invalid_registration_rerenders_with_errors(pool: sqlx::SqlitePool) {
        let server = create_test_server(pool).await;

        let response = server
            .post("/users/register")
            .form(&RegisterForm {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password: "123".into(),
            })
            .await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Password must be at least 6 characters"));
        assert!(html.contains(r#"value="alice@example.com""#));
    }

    #[sqlx::test]
    async fn logout_is_idempotent(pool: sqlx::SqlitePool) {
        let server = create_test_server(pool).await;

        for _ in 0..2 {
            let response = server.get("/users/logout").await;
            assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/users/login");
            assert!(flash_of(&response).contains("You+are+logged+out"));
            assert!(set_cookies(&response)
                .iter()
                .any(|c| c.starts_with("daysave.sid=;") && c.contains("Max-Age=0")));
        }
    }

    #[sqlx::test]
    async fn forgot_and_reset_flow(pool: sqlx::SqlitePool) {
        let server = create_test_server(pool.clone()).await;
        crate::test_utils::create_test_user(&pool, "alice@example.com").await;

        let response = server
            .post("/users/forgot")
            .form(&ForgotForm {
                email: "alice@example.com".into(),
            })
            .await;
        assert_eq!(location(&response), "/users/forgot");

        let token: String = sqlx::query_scalar("SELECT reset_password_token FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(flash_of(&response).contains(&token));

        let form = server.get(&format!("/users/reset/{token}")).await;
        form.assert_status_ok();

        let mismatch = server
            .post(&format!("/users/reset/{token}"))
            .form(&ResetForm {
                password: "newpass1".into(),
                confirm: "newpass2".into(),
            })
            .await;
        assert_eq!(location(&mismatch), format!("/users/reset/{token}"));

        let done = server
            .post(&format!("/users/reset/{token}"))
            .form(&ResetForm {
                password: "newpass1".into(),
                confirm: "newpass1".into(),
            })
            .await;
        assert_eq!(location(&done), "/users/login");

        let reused = server.get(&format!("/users/reset/{token}")).await;
        assert_eq!(location(&reused), "/users/forgot");
        assert!(flash_of(&reused).contains("invalid+or+has+expired"));
    }
}
