//! # 태그 모델 정의
//!
//! 태그는 여러 북마크에 붙일 수 있는 전역 라벨입니다.
//! 이름으로 "찾거나 만들기(find-or-create)" 방식으로 생성되며 자동으로 삭제되지 않습니다.

/// 태그 엔티티. DB의 `tags` 테이블 한 행(row)에 대응합니다.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    /// 태그 고유 식별자 (UUIDv7 문자열)
    pub id: String,
    /// 태그 이름 (대소문자 구분 없이 유일)
    pub name: String,
}

/// 여러 북마크의 태그를 한 번에 조회할 때 쓰는 행 (`content_tags` JOIN `tags`)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentTagRow {
    pub content_id: String,
    pub id: String,
    pub name: String,
}

impl From<ContentTagRow> for Tag {
    fn from(row: ContentTagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}
