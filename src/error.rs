//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 앱은 JSON API가 아니라 서버 렌더링 페이지이므로, 대부분의 에러는
//! 상태 코드가 아니라 "플래시 메시지 + 리다이렉트"로 사용자에게 전달됩니다.
//! - `AppError::redirect_to()`: 라우트 경계에서 에러를 플래시 리다이렉트로 변환
//! - `IntoResponse` 구현: 추출기 단계 등에서 쓰이는 최후의 수단

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::middleware::flash::{flash_redirect, Flash};
use crate::services::validation::FieldError;

/// 사용자에게 내부 사정을 드러내지 않는 일반 메시지
pub const GENERIC_ERROR: &str = "An error occurred";

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
#[derive(Debug, Error)]
pub enum AppError {
    /// 대상이 없거나 요청한 사용자의 소유가 아님 (둘은 의도적으로 구분하지 않음)
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 저장소에 접근하기 전에 발견된 입력 오류
    #[error("Validation failed: {}", first_message(.0))]
    Validation(Vec<FieldError>),

    /// 잘못된 자격 증명, 만료된 재설정 토큰 등
    #[error("{0}")]
    Unauthorized(String),

    /// 이미 가입된 이메일 등
    #[error("{0}")]
    Conflict(String),

    /// OAuth 핸드셰이크 실패 (state 불일치, 토큰 교환 실패, 프로필 해석 실패)
    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn first_message(errors: &[FieldError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("invalid input")
}

impl AppError {
    /// 저장소/내부 오류인지 여부. 이 경우에만 error 레벨로 기록합니다.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_)
        )
    }

    /// 사용자에게 보여줄 사람이 읽을 수 있는 메시지
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::Unauthorized(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::NotFound(_) => self.to_string(),
            AppError::Validation(errors) => first_message(errors).to_string(),
            AppError::OAuth(_) => "Authentication failed".to_string(),
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                GENERIC_ERROR.to_string()
            }
        }
    }

    /// 에러를 기록하고, 플래시 메시지와 함께 `to`로 리다이렉트합니다.
    pub fn redirect_to(self, to: &str) -> Response {
        self.log();
        flash_redirect(to, Flash::error(self.user_message()))
    }

    /// 에러 종류에 맞는 레벨로 기록합니다. 리다이렉트 없이 폼을 다시 보여줄 때 직접 호출합니다.
    pub fn log(&self) {
        match self {
            err if err.is_infrastructure() => tracing::error!(error = %err, "request failed"),
            AppError::OAuth(msg) => tracing::warn!(reason = %msg, "oauth handshake failed"),
            err => tracing::debug!(error = %err, "request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::OAuth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = escape_html(&self.user_message());
        let body = Html(format!(
            "<!doctype html><title>{message}</title><p>{message}</p><p><a href=\"/\">Home</a></p>"
        ));
        (status, body).into_response()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
