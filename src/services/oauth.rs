//! # OAuth 제공자 레지스트리
//!
//! 다섯 제공자(Google, Facebook, Twitter, Microsoft, Apple)를 하나의 OAuth2 구현으로 다룹니다.
//! 제공자마다 다른 것은 정적 엔드포인트 표(`Endpoints`)와 프로필 JSON 매핑뿐이고,
//! 로그인 흐름과 사용자 식별 알고리즘(`services::identity`)은 모두 공유합니다.
//!
//! ## 흐름
//! 1. `authorize_url(state, challenge)` → 사용자를 제공자 로그인 화면으로 보냄
//! 2. 콜백에서 `exchange(code, verifier)` → 토큰 교환 후 `OAuthProfile` 반환
//!
//! 자격 증명(ID/비밀키 쌍)이 설정된 제공자만 `OAuthRegistry`에 등록됩니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{Config, OAuthCredentials};
use crate::error::AppError;
use crate::services::password::random_bytes;

/// 지원하는 OAuth 제공자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    Facebook,
    Twitter,
    Microsoft,
    Apple,
}

/// 제공자별 정적 엔드포인트 정보
struct Endpoints {
    authorize_url: &'static str,
    token_url: &'static str,
    /// `None`이면 토큰 응답의 `id_token`에서 프로필을 읽습니다 (Apple).
    profile_url: Option<&'static str>,
    scopes: &'static [&'static str],
    extra_params: &'static [(&'static str, &'static str)],
    /// 토큰 요청에서 클라이언트 인증을 HTTP Basic으로 보낼지 여부
    basic_auth: bool,
}

const GOOGLE: Endpoints = Endpoints {
    authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    profile_url: Some("https://openidconnect.googleapis.com/v1/userinfo"),
    scopes: &["openid", "profile", "email"],
    extra_params: &[],
    basic_auth: false,
};

const FACEBOOK: Endpoints = Endpoints {
    authorize_url: "https://www.facebook.com/v19.0/dialog/oauth",
    token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
    profile_url: Some("https://graph.facebook.com/me?fields=id,name,email"),
    scopes: &["email"],
    extra_params: &[],
    basic_auth: false,
};

const TWITTER: Endpoints = Endpoints {
    authorize_url: "https://twitter.com/i/oauth2/authorize",
    token_url: "https://api.twitter.com/2/oauth2/token",
    profile_url: Some("https://api.twitter.com/2/users/me"),
    scopes: &["users.read", "tweet.read"],
    extra_params: &[],
    basic_auth: true,
};

const MICROSOFT: Endpoints = Endpoints {
    authorize_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
    token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
    profile_url: Some("https://graph.microsoft.com/v1.0/me"),
    scopes: &["user.read"],
    extra_params: &[],
    basic_auth: false,
};

const APPLE: Endpoints = Endpoints {
    authorize_url: "https://appleid.apple.com/auth/authorize",
    token_url: "https://appleid.apple.com/auth/token",
    profile_url: None,
    scopes: &["name", "email"],
    // 이름/이메일 스코프를 요청하면 Apple은 form_post 응답만 허용합니다.
    extra_params: &[("response_mode", "form_post")],
    basic_auth: false,
};

const APPLE_ISSUER: &str = "https://appleid.apple.com";

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Google,
        Provider::Facebook,
        Provider::Twitter,
        Provider::Microsoft,
        Provider::Apple,
    ];

    /// URL 경로에 쓰이는 이름 (`/users/auth/{slug}`)
    pub fn slug(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
            Provider::Twitter => "twitter",
            Provider::Microsoft => "microsoft",
            Provider::Apple => "apple",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Facebook => "Facebook",
            Provider::Twitter => "Twitter",
            Provider::Microsoft => "Microsoft",
            Provider::Apple => "Apple",
        }
    }

    /// (클라이언트 ID, 비밀키) 환경변수 이름
    pub fn credential_keys(self) -> (&'static str, &'static str) {
        match self {
            Provider::Google => ("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            Provider::Facebook => ("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET"),
            Provider::Twitter => ("TWITTER_CLIENT_ID", "TWITTER_CLIENT_SECRET"),
            Provider::Microsoft => ("MICROSOFT_CLIENT_ID", "MICROSOFT_CLIENT_SECRET"),
            Provider::Apple => ("APPLE_CLIENT_ID", "APPLE_CLIENT_SECRET"),
        }
    }

    /// 이 제공자의 사용자 ID를 저장하는 `users` 컬럼
    pub fn id_column(self) -> &'static str {
        match self {
            Provider::Google => "google_id",
            Provider::Facebook => "facebook_id",
            Provider::Twitter => "twitter_id",
            Provider::Microsoft => "microsoft_id",
            Provider::Apple => "apple_id",
        }
    }

    /// 콜백이 POST로 돌아오는 제공자 (상태 쿠키에 `SameSite=None`이 필요)
    pub fn uses_form_post(self) -> bool {
        self.endpoints()
            .extra_params
            .iter()
            .any(|&(key, value)| key == "response_mode" && value == "form_post")
    }

    fn endpoints(self) -> &'static Endpoints {
        match self {
            Provider::Google => &GOOGLE,
            Provider::Facebook => &FACEBOOK,
            Provider::Twitter => &TWITTER,
            Provider::Microsoft => &MICROSOFT,
            Provider::Apple => &APPLE,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// 제공자가 돌려준 사용자 정보 중 식별에 필요한 부분
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// 로그인 시작과 콜백 처리를 담당하는 제공자 하나
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// 사용자를 보낼 제공자 로그인 URL
    fn authorize_url(&self, state: &str, pkce_challenge: &str) -> String;

    /// 인가 코드를 토큰으로 교환하고 프로필을 가져옵니다.
    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<OAuthProfile, AppError>;
}

/// PKCE verifier/challenge 쌍 (S256)
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = URL_SAFE_NO_PAD.encode(random_bytes(32));
        let challenge = pkce_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// CSRF 방지용 `state` 값
pub fn generate_state() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(24))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// 모든 제공자에 공통인 Authorization Code + PKCE 클라이언트
pub struct OAuth2Client {
    provider: Provider,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl OAuth2Client {
    pub fn new(credentials: &OAuthCredentials, app_url: &str, http: reqwest::Client) -> Self {
        Self {
            provider: credentials.provider,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: callback_url(app_url, credentials.provider),
            http,
        }
    }

    async fn request_token(&self, code: &str, pkce_verifier: &str) -> Result<TokenResponse, AppError> {
        let endpoints = self.provider.endpoints();
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", pkce_verifier),
        ];
        let mut request = self.http.post(endpoints.token_url);
        if endpoints.basic_auth {
            request = request.basic_auth(&self.client_id, Some(&self.client_secret));
        } else {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::OAuth(format!("invalid token response: {}", e)))
    }

    async fn fetch_profile(&self, url: &str, access_token: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("profile request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!(
                "profile endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::OAuth(format!("invalid profile response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for OAuth2Client {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorize_url(&self, state: &str, pkce_challenge: &str) -> String {
        let endpoints = self.provider.endpoints();
        let scope = endpoints.scopes.join(" ");
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", pkce_challenge),
            ("code_challenge_method", "S256"),
        ];
        params.extend_from_slice(endpoints.extra_params);

        match url::Url::parse_with_params(endpoints.authorize_url, &params) {
            Ok(url) => url.into(),
            // 엔드포인트는 상수이므로 실패하지 않습니다.
            Err(_) => endpoints.authorize_url.to_string(),
        }
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<OAuthProfile, AppError> {
        let token = self.request_token(code, pkce_verifier).await?;

        match self.provider.endpoints().profile_url {
            Some(url) => {
                let json = self.fetch_profile(url, &token.access_token).await?;
                profile_from_json(self.provider, &json).ok_or_else(|| {
                    AppError::OAuth(format!("{} profile has no id", self.provider))
                })
            }
            None => {
                let id_token = token
                    .id_token
                    .ok_or_else(|| AppError::OAuth("token response has no id_token".to_string()))?;
                profile_from_id_token(&id_token, &self.client_id)
            }
        }
    }
}

/// `{APP_URL}/users/auth/{provider}/callback`
pub fn callback_url(app_url: &str, provider: Provider) -> String {
    format!("{}/users/auth/{}/callback", app_url.trim_end_matches('/'), provider.slug())
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 제공자별 프로필 JSON을 공통 형태로 변환합니다. ID가 없으면 `None`.
fn profile_from_json(provider: Provider, json: &Value) -> Option<OAuthProfile> {
    let profile = match provider {
        Provider::Google => OAuthProfile {
            provider_id: string_field(json, "sub")?,
            email: string_field(json, "email"),
            name: string_field(json, "name"),
        },
        Provider::Facebook => OAuthProfile {
            provider_id: string_field(json, "id")?,
            email: string_field(json, "email"),
            name: string_field(json, "name"),
        },
        Provider::Twitter => {
            // Twitter v2는 `{"data": {...}}`로 감싸서 보내고 이메일은 주지 않습니다.
            let data = json.get("data")?;
            OAuthProfile {
                provider_id: string_field(data, "id")?,
                email: None,
                name: string_field(data, "name").or_else(|| string_field(data, "username")),
            }
        }
        Provider::Microsoft => OAuthProfile {
            provider_id: string_field(json, "id")?,
            email: string_field(json, "mail").or_else(|| string_field(json, "userPrincipalName")),
            name: string_field(json, "displayName"),
        },
        Provider::Apple => OAuthProfile {
            provider_id: string_field(json, "sub")?,
            email: string_field(json, "email"),
            name: None,
        },
    };
    Some(profile)
}

/// Apple `id_token`의 클레임을 읽습니다.
///
/// 토큰은 TLS로 토큰 엔드포인트에서 직접 받은 것이므로 서명은 검사하지 않고,
/// 발급자(`iss`), 대상(`aud`), 만료(`exp`)만 확인합니다.
fn profile_from_id_token(id_token: &str, client_id: &str) -> Result<OAuthProfile, AppError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.set_audience(&[client_id]);
    validation.set_issuer(&[APPLE_ISSUER]);

    let data = jsonwebtoken::decode::<AppleClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AppError::OAuth(format!("invalid id_token: {}", e)))?;

    Ok(OAuthProfile {
        provider_id: data.claims.sub,
        email: data.claims.email.filter(|e| !e.trim().is_empty()),
        name: None,
    })
}

/// 설정된 제공자만 담는 레지스트리
#[derive(Clone, Default)]
pub struct OAuthRegistry {
    providers: HashMap<Provider, Arc<dyn IdentityProvider>>,
}

impl OAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 자격 증명이 설정된 제공자마다 `OAuth2Client`를 등록합니다.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("daysave/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client init failed: {}", e)))?;

        let mut registry = Self::new();
        for credentials in &config.oauth {
            registry.register(Arc::new(OAuth2Client::new(
                credentials,
                &config.app_url,
                http.clone(),
            )));
        }
        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.provider(), provider);
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(&provider).cloned()
    }

    /// 등록된 제공자 목록 (`Provider::ALL` 순서)
    pub fn enabled(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.providers.contains_key(p))
            .collect()
    }
}
