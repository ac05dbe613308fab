//! # 에러 처리 모듈
//!
//! 수면 기록 API에서 발생할 수 있는 모든 에러 종류를 하나의 `AppError`로 모읍니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 잘못된 입력, 없는 기록, AI 진단 실패 등을 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 인사이트 계산과 AI 진단은 서로 독립된 결과입니다.
//! `DiagnosisUnavailable`은 진단 엔드포인트에서만 나오며,
//! 인사이트 조회는 AI 호출 성공 여부와 상관없이 응답할 수 있어야 합니다.

use axum::{
    http::StatusCode,                     // HTTP 상태 코드 (200, 404, 503 등)
    response::{IntoResponse, Response},   // Axum의 응답 변환 트레이트
    Json,                                 // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로
use thiserror::Error; // std::error::Error + Display 자동 구현

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 variant는 적절한 HTTP 상태 코드와 `{ "error": { "code", "message" } }`
/// 형태의 JSON 본문으로 변환됩니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 잘못된 입력 (HTTP 400)
    ///
    /// "HH:MM" 형식이 아닌 시각, 1~5 범위를 벗어난 품질 점수 등.
    /// 재시도해도 같은 결과이므로 클라이언트가 입력을 고쳐야 합니다.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 해당 사용자에게 그런 기록이 없음 (HTTP 404)
    ///
    /// 다른 사용자의 기록 ID로 접근한 경우도 여기에 해당합니다.
    #[error("Resource not found")]
    NotFound,

    /// 외부 AI 진단을 받을 수 없음 (HTTP 503)
    ///
    /// 호출 실패, 시간 초과, 빈 응답, JSON 파싱 실패, API 키 미설정을 모두 포함합니다.
    #[error("Diagnosis unavailable: {0}")]
    DiagnosisUnavailable(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수에서 `?`를 쓰면 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 리소스 충돌 (HTTP 409): 이미 가입된 이메일 등
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// 응답 본문에 들어가는 기계용 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound => "not_found",
            AppError::DiagnosisUnavailable(_) => "diagnosis_unavailable",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) => "database_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)와 AI 진단 실패의 상세 원인은 로그에만 남기고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::DiagnosisUnavailable(ref reason) => {
                tracing::warn!("Diagnosis unavailable: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Sleep diagnosis is currently unavailable".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        let cases = [
            (AppError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (
                AppError::DiagnosisUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn invalid_input_keeps_its_message_in_display() {
        let err = AppError::InvalidInput("quality must be between 1 and 5".into());
        assert_eq!(err.to_string(), "Invalid input: quality must be between 1 and 5");
        assert_eq!(err.code(), "invalid_input");
    }
}
