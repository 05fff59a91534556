//! # 요청 전처리 계층
//!
//! - `auth`: 세션 쿠키 → 현재 사용자 추출기 (`CurrentUser`, `AuthUser`)
//! - `flash`: 다음 화면에 한 번 보여줄 메시지 쿠키
//! - `method_override`: HTML 폼의 `POST ?_method=PUT|DELETE`를 실제 메서드로 바꿈
//!
//! 쿠키는 `Cookie` 헤더를 직접 나누어 읽고, `Set-Cookie` 값은 문자열로 조립합니다.

pub mod auth;
pub mod flash;
pub mod method_override;

use axum::{
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::Response,
};

/// 요청의 `Cookie` 헤더(여러 개일 수 있음)에서 `name` 쿠키 값을 찾습니다.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `SameSite` 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    /// 다른 사이트에서 POST로 돌아오는 OAuth 콜백(Apple)용. `Secure`가 함께 붙습니다.
    None,
}

/// `Set-Cookie` 헤더 값을 만듭니다.
pub fn build_cookie(name: &str, value: &str, max_age_secs: i64, same_site: SameSite) -> String {
    match same_site {
        SameSite::Lax => format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            name, value, max_age_secs
        ),
        SameSite::None => format!(
            "{}={}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={}",
            name, value, max_age_secs
        ),
    }
}

/// 쿠키를 즉시 만료시키는 `Set-Cookie` 값
pub fn expire_cookie(name: &str) -> String {
    build_cookie(name, "", 0, SameSite::Lax)
}

/// 응답에 `Set-Cookie` 헤더를 하나 더 붙입니다.
pub fn append_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => tracing::error!(error = %err, "dropping malformed cookie"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; daysave.sid=abc"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(read_cookie(&headers, "daysave.sid").as_deref(), Some("abc"));
        assert_eq!(read_cookie(&headers, "other").as_deref(), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cross_site_cookie_is_secure() {
        let cookie = build_cookie("x", "y", 60, SameSite::None);
        assert!(cookie.contains("Secure; SameSite=None"));
        assert!(expire_cookie("x").ends_with("Max-Age=0"));
    }
}
