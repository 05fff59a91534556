//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `user`: 사용자 행과 인증 관련 폼
//! - `content`: 북마크(콘텐츠 항목) 행과 추가/수정 폼, 목록 필터
//! - `tag`: 태그 행
//! - `comment`: 코멘트 행 (현재 라우트에서 생성/표시하지 않음)

pub mod comment;
pub mod content;
pub mod tag;
pub mod user;

pub use comment::*;
pub use content::*;
pub use tag::*;
pub use user::*;
