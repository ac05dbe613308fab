//! # 수면 기록 라우트 핸들러
//!
//! 수면 기록 CRUD와, 저장된 기록 전체를 집계하는 인사이트/AI 진단 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET    /api/v1/sleep`           → 내 수면 기록 목록 (최신순)
//! - `POST   /api/v1/sleep`           → 새 기록 생성 (201)
//! - `GET    /api/v1/sleep/{id}`      → 단일 기록 조회
//! - `PUT    /api/v1/sleep/{id}`      → 기록 수정 (보낸 필드만 반영)
//! - `DELETE /api/v1/sleep/{id}`      → 기록 삭제 (204)
//! - `GET    /api/v1/sleep/insights`  → 수면 통계 집계
//! - `POST   /api/v1/sleep/diagnosis` → 통계를 바탕으로 한 AI 진단
//!
//! 모든 핸들러는 `AuthUser`를 받으므로 유효한 액세스 토큰이 필요합니다.
//! 기록의 소유자는 요청 본문이 아니라 항상 토큰의 사용자입니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::{insights::compute_insights, sleep_window},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// `GET /sleep`: 내 수면 기록 목록
///
/// `{ "records": [...] }` 형태로 반환합니다.
pub async fn list_records(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let records = db::list_sleep_records(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "records": records })))
}

/// `POST /sleep`: 새 수면 기록 생성
///
/// 시각 토큰 해석, 자정 넘김 보정, 수면 시간 계산은
/// `sleep_window::fields_for_create()`가 담당합니다.
/// 클라이언트는 수면 시간을 보내지 않으며 서버 계산값만 저장됩니다.
pub async fn create_record(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateSleepRecordRequest>,
) -> Result<(StatusCode, Json<SleepRecord>), AppError> {
    let fields = sleep_window::fields_for_create(&req)?;

    let id = uuid::Uuid::now_v7().to_string();
    let record = db::create_sleep_record(&state.pool, &id, &auth_user.user_id, &fields).await?;

    tracing::debug!(
        record_id = %record.id,
        hours = record.total_sleep_hours,
        "Created sleep record"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /sleep/{id}`: 단일 기록 조회
pub async fn get_record(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SleepRecord>, AppError> {
    let record = db::get_sleep_record(&state.pool, &auth_user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(record))
}

/// `PUT /sleep/{id}`: 기록 수정
///
/// 날짜나 시각이 바뀌면 수면 구간 전체를 다시 계산합니다.
pub async fn update_record(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateSleepRecordRequest>,
) -> Result<Json<SleepRecord>, AppError> {
    let existing = db::get_sleep_record(&state.pool, &auth_user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let fields = sleep_window::fields_for_update(&existing, &req)?;

    // 조회와 수정 사이에 삭제됐을 수도 있으므로 여기서도 None을 NotFound로 처리
    let record = db::update_sleep_record(&state.pool, &auth_user.user_id, &id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(record))
}

/// `DELETE /sleep/{id}`: 기록 삭제 (성공 시 204 No Content)
pub async fn delete_record(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if db::delete_sleep_record(&state.pool, &auth_user.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// `GET /sleep/insights`: 내 기록 전체의 수면 통계
///
/// AI 진단과 무관하게 항상 계산됩니다. 기록이 없으면 0/null/빈 배열입니다.
pub async fn get_insights(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<SleepInsights>, AppError> {
    let records = db::list_sleep_records(&state.pool, &auth_user.user_id).await?;
    let insights = compute_insights(&records)?;
    Ok(Json(insights))
}

/// `POST /sleep/diagnosis`: 수면 통계를 AI에 보내 진단을 받습니다.
///
/// 진단 제공자가 없거나 호출이 실패하면 503(`diagnosis_unavailable`)입니다.
pub async fn diagnose(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<SleepDiagnosis>, AppError> {
    let client = state.diagnosis.as_ref().ok_or_else(|| {
        AppError::DiagnosisUnavailable("no diagnosis provider is configured".to_string())
    })?;

    let records = db::list_sleep_records(&state.pool, &auth_user.user_id).await?;
    let insights = compute_insights(&records)?;

    let diagnosis = client.diagnose(&insights).await?;
    tracing::info!(
        user_id = %auth_user.user_id,
        score = diagnosis.sleep_score,
        "Sleep diagnosis completed"
    );

    Ok(Json(diagnosis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use crate::services::diagnosis::DiagnosisClient;
    use async_trait::async_trait;
    use axum::http::Method;
    use std::sync::Arc;

    struct FixedDiagnosis;

    #[async_trait]
    impl DiagnosisClient for FixedDiagnosis {
        async fn diagnose(&self, insights: &SleepInsights) -> Result<SleepDiagnosis, AppError> {
            Ok(SleepDiagnosis {
                diagnosis: format!("{}일 기록 분석", insights.total_records),
                recommendations: vec!["일정한 시간에 잠들기".to_string()],
                risk_level: RiskLevel::Low,
                sleep_score: 88,
            })
        }
    }

    struct FailingDiagnosis;

    #[async_trait]
    impl DiagnosisClient for FailingDiagnosis {
        async fn diagnose(&self, _insights: &SleepInsights) -> Result<SleepDiagnosis, AppError> {
            Err(AppError::DiagnosisUnavailable("request timed out".to_string()))
        }
    }

    fn record_body(date: &str, start: &str, end: &str, quality: i64) -> Value {
        json!({
            "date": date,
            "sleepStartTime": start,
            "sleepEndTime": end,
            "quality": quality,
        })
    }

    #[tokio::test]
    async fn create_applies_midnight_rollover() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        let (status, body) = app
            .send(Method::POST, "/sleep", Some(&token), Some(record_body("2024-03-20", "23:30", "07:00", 4)))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["date"], "2024-03-20");
        assert_eq!(body["sleepStartTime"], "2024-03-20T23:30:00");
        assert_eq!(body["sleepEndTime"], "2024-03-21T07:00:00");
        assert_eq!(body["totalSleepHours"], 8.0);
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["notes"], "");
    }

    #[tokio::test]
    async fn create_rejects_bad_tokens_and_quality() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        for body in [
            record_body("2024-03-20", "25:00", "07:00", 3),
            record_body("2024-03-20", "23:00", "late", 3),
            record_body("not-a-date", "23:00", "07:00", 3),
            record_body("2024-03-20", "23:00", "07:00", 0),
            record_body("2024-03-20", "23:00", "07:00", 6),
        ] {
            let (status, json) = app.send(Method::POST, "/sleep", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"], "invalid_input");
        }
    }

    #[tokio::test]
    async fn requires_access_token() {
        let app = TestApp::new(None).await;

        let (status, body) = app.send(Method::GET, "/sleep", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "missing_token");

        let (status, _) = app.send(Method::GET, "/sleep/insights", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn records_of_other_users_are_not_found() {
        let app = TestApp::new(None).await;
        let owner = app.user("owner").await;
        let intruder = app.user("intruder").await;

        let (_, created) = app
            .send(Method::POST, "/sleep", Some(&owner), Some(record_body("2024-03-20", "23:00", "07:00", 4)))
            .await;
        let uri = format!("/sleep/{}", created["id"].as_str().unwrap());

        let (status, _) = app.send(Method::GET, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .send(Method::PUT, &uri, Some(&intruder), Some(json!({ "quality": 1 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.send(Method::DELETE, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = app.send(Method::GET, "/sleep", Some(&intruder), None).await;
        assert_eq!(list["records"].as_array().unwrap().len(), 0);

        let (status, unchanged) = app.send(Method::GET, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unchanged["quality"], 4);
    }

    #[tokio::test]
    async fn update_recomputes_window_and_keeps_untouched_fields() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        let mut body = record_body("2024-03-20", "22:00", "06:00", 3);
        body["notes"] = json!("야식 먹음");
        let (_, created) = app.send(Method::POST, "/sleep", Some(&token), Some(body)).await;
        let uri = format!("/sleep/{}", created["id"].as_str().unwrap());

        let (status, updated) = app
            .send(Method::PUT, &uri, Some(&token), Some(json!({ "sleepEndTime": "07:00" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["sleepStartTime"], "2024-03-20T22:00:00");
        assert_eq!(updated["sleepEndTime"], "2024-03-21T07:00:00");
        assert_eq!(updated["totalSleepHours"], 9.0);
        assert_eq!(updated["quality"], 3);
        assert_eq!(updated["notes"], "야식 먹음");

        let (status, json) = app
            .send(Method::PUT, &uri, Some(&token), Some(json!({ "quality": 9 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_input");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        let (_, created) = app
            .send(Method::POST, "/sleep", Some(&token), Some(record_body("2024-03-20", "23:00", "07:00", 4)))
            .await;
        let uri = format!("/sleep/{}", created["id"].as_str().unwrap());

        let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn insights_aggregate_only_own_records() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;
        let other = app.user("u2").await;

        // 2024-03-17은 일요일, 2024-03-18은 월요일
        for body in [
            record_body("2024-03-17", "23:00", "07:00", 3),
            record_body("2024-03-18", "23:00", "06:00", 3),
            record_body("2024-03-24", "22:00", "07:00", 5),
        ] {
            app.send(Method::POST, "/sleep", Some(&token), Some(body)).await;
        }
        app.send(Method::POST, "/sleep", Some(&other), Some(record_body("2024-03-17", "20:00", "10:00", 1)))
            .await;

        let (status, insights) = app.send(Method::GET, "/sleep/insights", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(insights["totalRecords"], 3);
        assert_eq!(insights["averageSleepHours"], 8.0);
        assert_eq!(insights["averageWakeTime"], "06:40");

        let weekly = insights["weeklyAverages"].as_array().unwrap();
        assert_eq!(weekly.len(), 7);
        assert_eq!(weekly[0]["day"], "Sunday");
        assert_eq!(weekly[0]["averageHours"], 8.5);
        assert_eq!(weekly[0]["recordCount"], 2);
        assert_eq!(weekly[1]["day"], "Monday");
        assert_eq!(weekly[1]["averageHours"], 7.0);

        assert_eq!(
            insights["qualityDistribution"],
            json!([
                { "quality": 3, "count": 2, "percentage": 67 },
                { "quality": 5, "count": 1, "percentage": 33 }
            ])
        );
    }

    #[tokio::test]
    async fn insights_for_no_records_are_empty() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        let (status, insights) = app.send(Method::GET, "/sleep/insights", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            insights,
            json!({
                "totalRecords": 0,
                "averageSleepHours": 0.0,
                "averageBedtime": null,
                "averageWakeTime": null,
                "weeklyAverages": [],
                "qualityDistribution": []
            })
        );
    }

    #[tokio::test]
    async fn diagnosis_uses_configured_client() {
        let app = TestApp::new(Some(Arc::new(FixedDiagnosis))).await;
        let token = app.user("u1").await;
        app.send(Method::POST, "/sleep", Some(&token), Some(record_body("2024-03-20", "23:00", "07:00", 4)))
            .await;

        let (status, body) = app.send(Method::POST, "/sleep/diagnosis", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["diagnosis"], "1일 기록 분석");
        assert_eq!(body["riskLevel"], "low");
        assert_eq!(body["sleepScore"], 88);
    }

    #[tokio::test]
    async fn failing_diagnosis_is_503_while_insights_still_work() {
        let app = TestApp::new(Some(Arc::new(FailingDiagnosis))).await;
        let token = app.user("u1").await;
        app.send(Method::POST, "/sleep", Some(&token), Some(record_body("2024-03-20", "23:00", "07:00", 4)))
            .await;

        let (status, body) = app.send(Method::POST, "/sleep/diagnosis", Some(&token), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "diagnosis_unavailable");

        let (status, insights) = app.send(Method::GET, "/sleep/insights", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(insights["totalRecords"], 1);
    }

    #[tokio::test]
    async fn diagnosis_without_provider_is_503() {
        let app = TestApp::new(None).await;
        let token = app.user("u1").await;

        let (status, body) = app.send(Method::POST, "/sleep/diagnosis", Some(&token), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "diagnosis_unavailable");
    }
}
