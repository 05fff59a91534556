//! # 콘텐츠(북마크) 모델 정의
//!
//! - `ContentItem`: `content_items` 테이블 한 행
//! - `ContentWithTags`: 목록/편집 화면에서 쓰는, 태그가 붙은 북마크
//! - `ContentForm`: 추가/수정 폼 (같은 이름의 `tags` 필드가 여러 번 올 수 있음)
//! - `ContentFilter`: `GET /content`의 쿼리 파라미터

use super::tag::Tag;

/// 저장된 북마크. 항상 정확히 한 사용자(`user_id`)에게 속합니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentItem {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub comment: Option<String>,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ContentWithTags {
    pub item: ContentItem,
    pub tags: Vec<Tag>,
}

impl ContentWithTags {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// 대소문자를 무시하고 이름이 정확히 같은 태그가 하나라도 있는지 확인합니다.
    pub fn has_tag_named(&self, name: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.name.to_lowercase() == name.to_lowercase())
    }
}

/// 북마크 추가/수정 폼
///
/// HTML 체크박스는 `tags=<id>&tags=<id>`처럼 같은 키를 반복해서 보내므로,
/// `serde_urlencoded` 대신 키-값 쌍을 직접 순회하며 채웁니다.
#[derive(Debug, Default, Clone)]
pub struct ContentForm {
    pub title: String,
    pub url: String,
    pub comment: String,
    /// 이미 존재하는 태그의 ID 목록
    pub tag_ids: Vec<String>,
    /// 쉼표로 구분된 새 태그 이름 문자열
    pub new_tags: String,
}

impl ContentForm {
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = ContentForm::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "title" => form.title = value.into_owned(),
                "url" => form.url = value.into_owned(),
                "comment" => form.comment = value.into_owned(),
                "tags" | "tags[]" => {
                    let id = value.trim();
                    if !id.is_empty() {
                        form.tag_ids.push(id.to_string());
                    }
                }
                "newTags" | "new_tags" => form.new_tags = value.into_owned(),
                _ => {}
            }
        }
        form
    }

    /// 비어 있는 코멘트는 저장하지 않습니다.
    pub fn comment(&self) -> Option<&str> {
        let trimmed = self.comment.trim();
        (!trimmed.is_empty()).then_some(self.comment.as_str())
    }

    /// 기존 북마크 값으로 폼을 미리 채웁니다 (편집 화면용).
    pub fn from_item(content: &ContentWithTags) -> Self {
        Self {
            title: content.item.title.clone(),
            url: content.item.url.clone(),
            comment: content.item.comment.clone().unwrap_or_default(),
            tag_ids: content.tags.iter().map(|t| t.id.clone()).collect(),
            new_tags: String::new(),
        }
    }
}

/// `GET /content?search=&tag=&archived=`
#[derive(Debug, Default, Clone)]
pub struct ContentFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub archived: Option<String>,
}

impl ContentFilter {
    /// 쿼리 문자열을 관대하게 해석합니다. 같은 키가 반복되면 마지막 값을 쓰고,
    /// 모르는 키와 잘못된 인코딩은 무시합니다.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filter = ContentFilter::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "search" => filter.search = Some(value.into_owned()),
                "tag" => filter.tag = Some(value.into_owned()),
                "archived" => filter.archived = Some(value.into_owned()),
                _ => {}
            }
        }
        filter
    }

    /// `archived=true`일 때만 보관된 항목을, 그 외(값이 없을 때 포함)에는 활성 항목을 보여줍니다.
    pub fn archived(&self) -> bool {
        self.archived.as_deref() == Some("true")
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }

    pub fn tag(&self) -> Option<&str> {
        non_empty(self.tag.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
