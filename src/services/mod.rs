//! # 비즈니스 로직 서비스
//!
//! - `validation`: 폼 입력 검증 (DB 접근 전)
//! - `password`: Argon2id 해싱, 재설정 토큰 생성
//! - `accounts`: 회원가입, 로컬 로그인, 비밀번호 재설정
//! - `oauth`: OAuth 제공자 레지스트리와 공통 OAuth2 클라이언트
//! - `identity`: OAuth 프로필을 로컬 사용자로 식별/연결/생성
//! - `content`: 북마크 목록/추가/편집/보관/삭제와 태그 규칙

pub mod accounts;
pub mod content;
pub mod identity;
pub mod oauth;
pub mod password;
pub mod validation;
