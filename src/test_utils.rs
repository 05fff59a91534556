//! 테스트 공용 도우미: 사용자 생성, 테스트 서버, 가짜 OAuth 제공자, 쿠키 처리

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{
    header::{LOCATION, SET_COOKIE},
    HeaderValue,
};
use axum_test::{TestResponse, TestServer};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::users as db_users;
use crate::error::AppError;
use crate::models::{LoginForm, User};
use crate::routes::{self, AppState};
use crate::services::oauth::{IdentityProvider, OAuthProfile, OAuthRegistry, Provider};
use crate::services::password::hash_password;

pub const TEST_PASSWORD: &str = "password123";

/// 로컬 계정을 하나 만듭니다. 이름은 이메일의 `@` 앞부분입니다.
pub async fn create_test_user(pool: &SqlitePool, email: &str) -> User {
    let name = email.split('@').next().unwrap_or(email);
    let hash = hash_password(TEST_PASSWORD).expect("hash test password");
    db_users::create_local_user(pool, &uuid::Uuid::now_v7().to_string(), name, email, &hash)
        .await
        .expect("create test user")
}

pub fn create_test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SESSION_SECRET" => Some("test-session-secret".to_string()),
        "APP_URL" => Some("http://daysave.test".to_string()),
        _ => None,
    })
}

pub async fn create_test_server(pool: SqlitePool) -> TestServer {
    create_test_server_with(pool, Vec::new()).await
}

/// 주어진 가짜 제공자들만 활성화된 테스트 서버
pub async fn create_test_server_with(pool: SqlitePool, providers: Vec<FakeProvider>) -> TestServer {
    let mut oauth = OAuthRegistry::new();
    for provider in providers {
        oauth.register(Arc::new(provider));
    }

    let state = AppState {
        pool,
        config: Arc::new(create_test_config()),
        oauth: Arc::new(oauth),
    };
    TestServer::new(routes::router(state)).expect("Failed to create test server")
}

/// 사용자를 만들고 로그인한 뒤, 다음 요청에 실을 `Cookie` 헤더 값을 돌려줍니다.
pub async fn login(server: &TestServer, pool: &SqlitePool, email: &str) -> HeaderValue {
    create_test_user(pool, email).await;
    let response = server
        .post("/users/login")
        .form(&LoginForm {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await;
    assert_eq!(location(&response), "/dashboard", "login failed for {email}");
    cookie_header(&response)
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// 응답이 설정한 (만료되지 않은) 쿠키들을 브라우저처럼 `Cookie` 헤더 하나로 합칩니다.
pub fn cookie_header(response: &TestResponse) -> HeaderValue {
    let pairs: Vec<String> = set_cookies(response)
        .into_iter()
        .filter(|c| !c.contains("Max-Age=0"))
        .filter_map(|c| c.split(';').next().map(str::to_string))
        .collect();
    HeaderValue::from_str(&pairs.join("; ")).expect("cookie header is ascii")
}

/// 네트워크 없이 정해진 프로필을 돌려주는 제공자
#[derive(Debug, Clone)]
pub struct FakeProvider {
    provider: Provider,
    profile: OAuthProfile,
}

impl FakeProvider {
    pub fn new(provider: Provider, provider_id: &str, email: Option<&str>, name: Option<&str>) -> Self {
        Self {
            provider,
            profile: OAuthProfile {
                provider_id: provider_id.to_string(),
                email: email.map(str::to_string),
                name: name.map(str::to_string),
            },
        }
    }

    pub fn google(provider_id: &str, email: Option<&str>) -> Self {
        Self::new(Provider::Google, provider_id, email, Some("Pat Google"))
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorize_url(&self, state: &str, pkce_challenge: &str) -> String {
        format!("https://provider.test/authorize?state={state}&code_challenge={pkce_challenge}")
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<OAuthProfile, AppError> {
        if code.is_empty() || pkce_verifier.is_empty() {
            return Err(AppError::OAuth("fake exchange rejected".to_string()));
        }
        Ok(self.profile.clone())
    }
}
