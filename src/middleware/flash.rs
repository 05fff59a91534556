//! # 플래시 메시지
//!
//! 리다이렉트 직전에 `daysave.flash` 쿠키에 메시지를 담고,
//! 다음에 렌더링되는 페이지가 그것을 읽어 보여준 뒤 쿠키를 만료시킵니다.
//! 쿠키 값은 `kind=success&msg=...` 형태의 URL 인코딩 문자열입니다.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        header::{LOCATION, SET_COOKIE},
        request::Parts,
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};

use super::{build_cookie, expire_cookie, read_cookie, SameSite};

pub const FLASH_COOKIE: &str = "daysave.flash";

/// 플래시 쿠키 유지 시간 (초)
const FLASH_MAX_AGE: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("kind", self.kind.as_str())
            .append_pair("msg", &self.message)
            .finish()
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut kind = None;
        let mut message = None;
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "kind" => {
                    kind = match value.as_ref() {
                        "success" => Some(FlashKind::Success),
                        "error" => Some(FlashKind::Error),
                        _ => None,
                    }
                }
                "msg" => message = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            kind: kind?,
            message: message?,
        })
    }

    pub fn cookie(&self) -> String {
        build_cookie(FLASH_COOKIE, &self.encode(), FLASH_MAX_AGE, SameSite::Lax)
    }
}

/// `303 See Other`로 `to`에 보내면서 플래시 메시지를 남깁니다.
pub fn flash_redirect(to: &str, flash: Flash) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(LOCATION, to.to_string()), (SET_COOKIE, flash.cookie())],
    )
        .into_response()
}

/// 메시지 없이 `303 See Other` 리다이렉트
pub fn redirect(to: &str) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, to.to_string())]).into_response()
}

/// 요청에 실려 온 플래시 메시지. 쿠키가 있었는지도 기억해서 응답에서 지울 수 있게 합니다.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash {
    pub flash: Option<Flash>,
    present: bool,
}

impl IncomingFlash {
    /// 요청 헤더의 플래시 쿠키를 읽습니다. 해석할 수 없는 값이어도 지울 대상으로 기억합니다.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let raw = read_cookie(headers, FLASH_COOKIE);
        Self {
            flash: raw.as_deref().and_then(Flash::decode),
            present: raw.is_some(),
        }
    }

    pub fn success(&self) -> String {
        self.message_of(FlashKind::Success)
    }

    pub fn error(&self) -> String {
        self.message_of(FlashKind::Error)
    }

    fn message_of(&self, kind: FlashKind) -> String {
        self.flash
            .as_ref()
            .filter(|f| f.kind == kind)
            .map(|f| f.message.clone())
            .unwrap_or_default()
    }

    /// 소비한 플래시 쿠키를 지우는 `Set-Cookie` 값 (쿠키가 없었으면 `None`)
    pub fn clear_cookie(&self) -> Option<String> {
        self.present.then(|| expire_cookie(FLASH_COOKIE))
    }
}

impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
