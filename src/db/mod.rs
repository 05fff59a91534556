//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출합니다.
//!
//! 각 하위 모듈:
//! - `users`: 사용자, OAuth 제공자 ID, 비밀번호 재설정 토큰
//! - `content`: 북마크 CRUD (모든 쿼리에 소유자 조건 포함)
//! - `tags`: 태그 find-or-create 및 북마크-태그 관계
//! - `comments`: 코멘트 조회
//! - `sessions`: 서버 측 로그인 세션

pub mod comments;
pub mod content;
pub mod sessions;
pub mod tags;
pub mod users;

pub use content::*;
pub use tags::*;

use chrono::{DateTime, Utc};

/// SQLite의 `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`와 같은 형식의 타임스탬프.
/// 형식이 같으므로 문자열 비교가 곧 시간 비교입니다.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// UNIQUE 제약 위반인지 확인합니다.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_matches_sqlite_format() {
        let at = Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(timestamp(at), "2026-02-03T04:05:06.000Z");
    }
}
