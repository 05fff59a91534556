//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져오며, 모든 항목에 기본값이 있습니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로
//! - `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS`: 연결 풀 크기와 대기 한도
//! - `SESSION_SECRET`: 세션 토큰 해싱에 사용할 비밀키
//! - `SESSION_TTL_HOURS`: 로그인 세션 유지 시간
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `APP_URL`: 외부에서 보이는 서비스 주소 (OAuth 콜백, 재설정 링크)
//! - `STATIC_DIR`: 정적 파일 디렉토리
//! - 제공자별 OAuth 클라이언트 ID/비밀키 쌍 (둘 다 있어야 해당 제공자가 활성화됨)

use std::env;
use std::time::Duration;

use crate::services::oauth::Provider;

/// 하나의 OAuth 제공자에 대한 클라이언트 자격 증명
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
}

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// `AppState`를 통해 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/daysave.db?mode=rwc")
    pub database_url: String,
    /// 연결 풀의 최대 동시 연결 수
    pub db_max_connections: u32,
    /// 풀에서 연결을 얻기까지 기다리는 최대 시간
    pub db_acquire_timeout: Duration,
    /// 세션 토큰 HMAC 키
    pub session_secret: String,
    /// 로그인 세션 유지 시간
    pub session_ttl: chrono::Duration,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 5001)
    pub port: u16,
    /// 외부 기준 URL, 끝의 `/`는 제거된 상태
    pub app_url: String,
    /// 정적 파일 디렉토리
    pub static_dir: String,
    /// 자격 증명이 모두 설정된 OAuth 제공자 목록
    pub oauth: Vec<OAuthCredentials>,
}

pub const DEFAULT_SESSION_SECRET: &str = "secret";

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 키-값 조회 함수로 설정을 만듭니다. 테스트에서 환경변수 없이 사용합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 빈 문자열은 설정되지 않은 것으로 취급합니다.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = get("PORT").and_then(|v| v.parse().ok()).unwrap_or(5001);

        let app_url = get("APP_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let oauth = Provider::ALL
            .iter()
            .filter_map(|&provider| {
                let (id_key, secret_key) = provider.credential_keys();
                Some(OAuthCredentials {
                    provider,
                    client_id: get(id_key)?,
                    client_secret: get(secret_key)?,
                })
            })
            .collect();

        Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:data/daysave.db?mode=rwc".to_string()),
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            db_acquire_timeout: Duration::from_secs(
                get("DB_ACQUIRE_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            session_secret: get("SESSION_SECRET")
                .unwrap_or_else(|| DEFAULT_SESSION_SECRET.to_string()),
            session_ttl: chrono::Duration::hours(
                get("SESSION_TTL_HOURS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24 * 7),
            ),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            app_url,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "public".to_string()),
            oauth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.port, 5001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.app_url, "http://localhost:5001");
        assert_eq!(config.session_secret, DEFAULT_SESSION_SECRET);
        assert_eq!(config.db_max_connections, 5);
        assert!(config.oauth.is_empty());
    }

    #[test]
    fn provider_needs_both_id_and_secret() {
        let config = config_from(&[
            ("GOOGLE_CLIENT_ID", "gid"),
            ("GOOGLE_CLIENT_SECRET", "gsecret"),
            ("FACEBOOK_APP_ID", "fid"),
            ("TWITTER_CLIENT_ID", "tid"),
            ("TWITTER_CLIENT_SECRET", "  "),
        ]);

        let providers: Vec<Provider> = config.oauth.iter().map(|c| c.provider).collect();
        assert_eq!(providers, vec![Provider::Google]);
        assert_eq!(config.oauth[0].client_id, "gid");
    }

    #[test]
    fn app_url_drops_trailing_slash_and_bad_port_falls_back() {
        let config = config_from(&[("APP_URL", "https://save.example.com/"), ("PORT", "nope")]);
        assert_eq!(config.app_url, "https://save.example.com");
        assert_eq!(config.port, 5001);
    }
}
