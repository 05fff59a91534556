/// 북마크에 대한 코멘트. 작성자(`user_id`)와 대상(`content_id`) 둘 다 참조하며,
/// 어느 쪽이 삭제되어도 `ON DELETE CASCADE`로 함께 삭제됩니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub content_id: String,
    pub created_at: String,
    pub updated_at: String,
}
