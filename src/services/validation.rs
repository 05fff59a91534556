//! # 입력 검증
//!
//! 저장소에 접근하기 전에 폼 값을 검사하고, 필드별 에러 목록을 만듭니다.
//! 에러 목록이 비어 있지 않으면 호출자는 DB를 건드리지 않아야 합니다.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Host;

use crate::models::{ContentForm, RegisterForm};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// 필드 하나에 대한 검증 실패
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 북마크 URL 검사
///
/// - 스킴은 생략할 수 있고(`example.com`), 생략하면 `http://`로 간주합니다.
/// - 스킴이 있다면 `http`, `https`, `ftp`만 허용합니다.
/// - 호스트는 IP 주소이거나, 점으로 구분되고 최상위 도메인이 있는 도메인이어야 합니다
///   (`localhost`는 거부).
pub fn is_valid_url(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return false;
    }

    let has_scheme = raw.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    let candidate = if has_scheme {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let Ok(parsed) = url::Url::parse(&candidate) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https" | "ftp") {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => is_fqdn(domain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

/// 라벨이 둘 이상이고, 최상위 도메인이 두 글자 이상의 문자(또는 `xn--` 퓨니코드)인 도메인
fn is_fqdn(domain: &str) -> bool {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    let tld_ok = (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        || (tld.starts_with("xn--") && tld.len() > 4);

    labels_ok && tld_ok
}

/// 회원가입 폼: 이름 필수, 이메일 형식, 비밀번호 6자 이상
pub fn validate_registration(form: &RegisterForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !is_valid_email(form.email.trim()) {
        errors.push(FieldError::new("email", "Please include a valid email"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    errors
}

/// 북마크 추가/수정 폼: 제목 필수, 올바른 URL
pub fn validate_content(form: &ContentForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if form.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if !is_valid_url(&form.url) {
        errors.push(FieldError::new("url", "Valid URL is required"));
    }
    errors
}

/// 쉼표로 구분된 새 태그 이름을 나누고, 공백을 다듬고, 빈 항목을 버립니다.
/// 같은 이름(대소문자 무시)이 여러 번 오면 처음 것만 남깁니다.
pub fn split_tag_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    names
}
