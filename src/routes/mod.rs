//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `auth`: 인증 관련 (회원가입, 로그인, 토큰 갱신, 로그아웃, 내 정보)
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `sleep`: 수면 기록 CRUD, 인사이트 조회, AI 진단

pub mod auth;
pub mod health;
pub mod sleep;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;

use crate::services::diagnosis::DiagnosisClient;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// Axum의 State Extractor가 요청마다 clone하므로 필드는 모두 값싸게 복제되어야 합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// AI 진단 제공자. API 키가 설정되지 않았으면 None
    pub diagnosis: Option<Arc<dyn DiagnosisClient>>,
}

/// `/api/v1` 아래에 붙는 API 라우터를 만듭니다.
///
/// main.rs와 라우트 테스트가 같은 라우터를 사용합니다.
pub fn api_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    Router::new()
        .merge(auth_routes)
        .route("/sleep", get(sleep::list_records).post(sleep::create_record))
        // 고정 경로(/sleep/insights)는 `{id}` 파라미터보다 우선 매칭됩니다.
        .route("/sleep/insights", get(sleep::get_insights))
        .route("/sleep/diagnosis", post(sleep::diagnose))
        .route(
            "/sleep/{id}",
            get(sleep::get_record)
                .put(sleep::update_record)
                .delete(sleep::delete_record),
        )
        .route("/health", get(health::health_check))
        .with_state(state)
}
