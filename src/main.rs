//! # Sleep Insight 웹 서버 진입점
//!
//! 수면 기록을 저장하고, 기록 전체를 집계한 수면 인사이트와
//! 외부 AI 기반 수면 진단을 제공하는 API 서버의 시작점입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성과 마이그레이션
//! 4. AI 진단 클라이언트 준비 (API 키가 있을 때만)
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작

// ── 모듈 선언 ──
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result; // main에서는 어떤 에러든 담을 수 있는 anyhow::Result를 사용
use axum::Router;
use config::Config;
use routes::{api_router, AppState};
use services::diagnosis::{DiagnosisClient, GeminiDiagnosisClient};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},         // CORS 설정
    services::{ServeDir, ServeFile}, // 프론트엔드 정적 파일 서빙
    trace::TraceLayer,               // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FRONTEND_DIST: &str = "../frontend/dist";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http, axum을 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sleep_insight=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting Sleep Insight server on {}:{}", config.host, config.port);

    // ── 4단계: SQLite 연결 풀 생성 + 마이그레이션 ──
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    // ── 5단계: AI 진단 클라이언트 ──
    // API 키가 없으면 진단 기능만 꺼지고 나머지 API는 그대로 동작합니다.
    let diagnosis: Option<Arc<dyn DiagnosisClient>> = match &config.diagnosis {
        Some(diagnosis_config) => {
            let client = GeminiDiagnosisClient::new(diagnosis_config)?;
            tracing::info!(
                "Sleep diagnosis enabled (model: {}, timeout: {:?})",
                diagnosis_config.model,
                diagnosis_config.timeout
            );
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, sleep diagnosis is disabled");
            None
        }
    };

    // ── 6단계: 애플리케이션 상태와 라우터 ──
    let state = AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        diagnosis,
    };
    let api_routes = api_router(state);

    // 개발 환경용: 모든 출처/메서드/헤더 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 7단계: 프론트엔드 정적 파일 서빙 (빌드 결과가 있을 때만) ──
    // SPA이므로 찾을 수 없는 경로는 index.html로 돌려보냅니다.
    let app = if Path::new(FRONTEND_DIST).exists() {
        tracing::info!("Serving frontend static files from {}", FRONTEND_DIST);

        let serve_dir = ServeDir::new(FRONTEND_DIST)
            .not_found_service(ServeFile::new(format!("{FRONTEND_DIST}/index.html")));

        Router::new()
            .nest("/api/v1", api_routes)
            .fallback_service(serve_dir)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Frontend dist directory not found, serving API only");

        Router::new()
            .nest("/api/v1", api_routes)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    };

    // ── 8단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
