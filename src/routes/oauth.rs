//! # OAuth 로그인 라우트
//!
//! `GET /users/auth/{provider}`에서 `state`와 PKCE verifier를 만들어 짧게 사는 쿠키에 담고
//! 제공자로 보냅니다. 콜백(`GET`, Apple은 `POST`)에서 쿠키 값과 비교한 뒤
//! 코드를 교환하고 로컬 사용자로 로그인시킵니다.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::auth::start_session;
use crate::middleware::flash::redirect;
use crate::middleware::{append_cookie, build_cookie, expire_cookie, read_cookie, SameSite};
use crate::routes::AppState;
use crate::services::identity::resolve_oauth_user;
use crate::services::oauth::{generate_state, Pkce, Provider};

pub const OAUTH_COOKIE: &str = "daysave.oauth";

/// 핸드셰이크 쿠키 유지 시간 (초)
const HANDSHAKE_MAX_AGE: i64 = 600;

/// 제공자가 콜백에 실어 보내는 값
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// 쿠키에 보관하는 핸드셰이크 값 `{provider}.{state}.{verifier}`
///
/// state와 verifier는 base64url(패딩 없음)이라 `.`을 포함하지 않습니다.
#[derive(Debug, PartialEq, Eq)]
struct Handshake {
    provider: Provider,
    state: String,
    verifier: String,
}

impl Handshake {
    fn encode(&self) -> String {
        format!("{}.{}.{}", self.provider.slug(), self.state, self.verifier)
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, '.');
        Some(Self {
            provider: Provider::from_slug(parts.next()?)?,
            state: parts.next()?.to_string(),
            verifier: parts.next()?.to_string(),
        })
    }
}

fn enabled_provider(state: &AppState, slug: &str) -> Option<Provider> {
    Provider::from_slug(slug).filter(|provider| state.oauth.get(*provider).is_some())
}

/// `GET /users/auth/{provider}`
pub async fn start(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(client) = Provider::from_slug(&slug).and_then(|p| state.oauth.get(p)) else {
        return AppError::NotFound("Provider").into_response();
    };
    let provider = client.provider();

    let pkce = Pkce::generate();
    let handshake = Handshake {
        provider,
        state: generate_state(),
        verifier: pkce.verifier,
    };
    let same_site = if provider.uses_form_post() {
        SameSite::None
    } else {
        SameSite::Lax
    };

    tracing::debug!(%provider, "redirecting to provider");
    let cookie = build_cookie(OAUTH_COOKIE, &handshake.encode(), HANDSHAKE_MAX_AGE, same_site);
    append_cookie(
        redirect(&client.authorize_url(&handshake.state, &pkce.challenge)),
        &cookie,
    )
}

/// `GET /users/auth/{provider}/callback`
pub async fn callback_query(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    finish(&state, &slug, &headers, params).await
}

/// `POST /users/auth/{provider}/callback` (`response_mode=form_post`)
pub async fn callback_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(params): Form<CallbackParams>,
) -> Response {
    finish(&state, &slug, &headers, params).await
}

async fn finish(state: &AppState, slug: &str, headers: &HeaderMap, params: CallbackParams) -> Response {
    let Some(provider) = enabled_provider(state, slug) else {
        return AppError::NotFound("Provider").into_response();
    };

    let response = match complete_login(state, provider, headers, params).await {
        Ok(session_cookie) => append_cookie(redirect("/dashboard"), &session_cookie),
        Err(err) => err.redirect_to("/users/login"),
    };
    // 성공이든 실패든 핸드셰이크는 한 번만 씁니다.
    append_cookie(response, &expire_cookie(OAUTH_COOKIE))
}

async fn complete_login(
    state: &AppState,
    provider: Provider,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<String, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::OAuth(format!("{} returned error: {}", provider, error)));
    }

    let handshake = read_cookie(headers, OAUTH_COOKIE)
        .as_deref()
        .and_then(Handshake::decode)
        .ok_or_else(|| AppError::OAuth("missing handshake cookie".to_string()))?;
    if handshake.provider != provider {
        return Err(AppError::OAuth("handshake started with another provider".to_string()));
    }
    if params.state.as_deref() != Some(handshake.state.as_str()) {
        return Err(AppError::OAuth("state mismatch".to_string()));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::OAuth("missing authorization code".to_string()))?;

    let client = state
        .oauth
        .get(provider)
        .ok_or(AppError::NotFound("Provider"))?;
    let profile = client.exchange(&code, &handshake.verifier).await?;
    let user = resolve_oauth_user(&state.pool, provider, &profile).await?;

    tracing::info!(user_id = %user.id, %provider, "oauth login");
    start_session(&state.pool, &state.config, &user.id).await
}
