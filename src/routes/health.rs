//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "diagnosis": "enabled" | "disabled" }`
//!
//! 인증 없이 호출할 수 있으며, AI 진단 제공자 설정 여부도 함께 알려줍니다.
//! 진단이 꺼져 있어도 서버 자체는 정상이므로 항상 200입니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

/// `GET /health`: 서버 상태를 확인합니다.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let diagnosis = if state.diagnosis.is_some() {
        "enabled"
    } else {
        "disabled"
    };

    Json(json!({
        "status": "ok",
        "diagnosis": diagnosis
    }))
}
