use serde::{Deserialize, Serialize};

/// 사용자 엔티티. DB의 `users` 테이블 한 행에 대응합니다.
///
/// `password_hash`가 `None`이면 OAuth 전용 계정입니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,
    pub microsoft_id: Option<String>,
    pub apple_id: Option<String>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_oauth_only(&self) -> bool {
        self.password_hash.is_none()
    }
}

/// `POST /users/register` 폼
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /users/login` 폼
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `POST /users/forgot` 폼
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotForm {
    pub email: String,
}

/// `POST /users/reset/{token}` 폼. 두 비밀번호 필드가 정확히 같아야 합니다.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetForm {
    pub password: String,
    pub confirm: String,
}
