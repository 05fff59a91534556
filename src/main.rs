//! # daysave 웹 서버 진입점
//!
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. 만료된 세션/재설정 토큰 정리
//! 5. OAuth 제공자 등록, 라우터 구성, HTTP 서버 시작
//!
//! 아래 `main()`의 단계 주석은 이 순서를 더 잘게 나눈 것입니다.

// ── 모듈 선언 ──
// 파일 구조가 곧 모듈 구조입니다. `routes`, `services`, `db`는 디렉토리 모듈입니다.
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod views;

#[cfg(test)]
pub mod test_utils;

// ── 외부 크레이트 및 모듈에서 필요한 항목 가져오기 ──
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, DEFAULT_SESSION_SECRET};
use routes::AppState;
use services::oauth::OAuthRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 그대로 진행합니다. (운영 환경은 실제 환경변수를 씀)
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    tracing_subscriber::registry()
        .with(
            // RUST_LOG가 없으면 daysave와 tower_http는 debug, axum은 info
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daysave=debug,tower_http=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer()) // 터미널 출력 포맷터
        .init();

    // ── 3단계: 설정 로딩 ──
    // 값이 없거나 해석할 수 없으면 기본값을 씁니다. 이 단계는 실패하지 않습니다.
    let config = Config::from_env();
    tracing::info!("Starting daysave on {}:{}", config.host, config.port);
    if config.session_secret == DEFAULT_SESSION_SECRET {
        tracing::warn!("SESSION_SECRET is not set; using the insecure default");
    }

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 파일이 없으면 새로 만들고, 연결마다 외래키 제약(ON DELETE CASCADE)을 켭니다.
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    // 파일 기반 DB라면 상위 디렉토리를 먼저 만듭니다. (`sqlite::memory:`는 부모가 빈 경로)
    if let Some(dir) = Path::new(options.get_filename()).parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
            tracing::info!("Created database directory: {}", dir.display());
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect_with(options)
        .await?;

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    // ./migrations 의 SQL 파일은 컴파일 시점에 바이너리에 포함됩니다.
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool) // 아직 적용되지 않은 것만 순서대로
        .await?;

    // ── 6단계: 만료 데이터 정리 ──
    // 지난 실행에서 남은 세션과 비밀번호 재설정 토큰을 지웁니다.
    let now = db::timestamp(Utc::now());
    let sessions = db::sessions::delete_expired_sessions(&pool, &now).await?;
    let tokens = db::users::clear_expired_reset_tokens(&pool, &now).await?;
    tracing::info!(sessions, tokens, "Purged expired sessions and reset tokens");

    // ── 7단계: OAuth 제공자 등록 ──
    // 클라이언트 ID와 시크릿이 모두 설정된 제공자만 활성화됩니다.
    let oauth = OAuthRegistry::from_config(&config)?;
    let enabled: Vec<&str> = oauth.enabled().into_iter().map(|p| p.slug()).collect();
    tracing::info!(providers = ?enabled, "OAuth providers enabled");

    // ── 8단계: 애플리케이션 상태와 라우터 구성 ──
    // AppState는 핸들러마다 복제되므로 설정과 레지스트리는 Arc로 공유합니다.
    // SqlitePool은 내부적으로 이미 Arc라서 그대로 넣습니다.
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        pool,
        config: Arc::new(config),
        oauth: Arc::new(oauth),
    };
    let app = routes::router(state);

    // ── 9단계: HTTP 서버 시작 ──
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
