//! # 수면 기록 모델 정의
//!
//! 하룻밤의 수면을 나타내는 `SleepRecord`와, 기록 생성/수정 요청 구조체를 정의합니다.
//!
//! ## 필드 이름 규칙
//! 프론트엔드와 주고받는 JSON은 camelCase(`sleepStartTime`)를 사용하고,
//! DB 컬럼은 snake_case(`sleep_start_time`)를 사용합니다.
//! `#[serde(rename_all = "camelCase")]`가 이 변환을 담당합니다.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 수면 기록 엔티티: DB의 `sleep_records` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// 기록 고유 식별자 (UUIDv7)
    pub id: String,
    /// 기록 소유자 ID
    pub user_id: String,
    /// 이 수면이 속한 날짜 (보통 잠들기 시작한 날의 저녁)
    pub date: NaiveDate,
    /// 잠든 시각 (절대 시각)
    pub sleep_start_time: NaiveDateTime,
    /// 깬 시각: 항상 `sleep_start_time`보다 뒤입니다.
    /// 자정을 넘긴 수면이면 `date`의 다음 날 날짜를 가집니다.
    pub sleep_end_time: NaiveDateTime,
    /// 총 수면 시간. 저장할 때마다 시작/종료 시각에서 다시 계산합니다.
    /// 과거 데이터에는 소수 값이 있을 수 있으므로 f64입니다.
    pub total_sleep_hours: f64,
    /// 주관적 수면 품질 (1~5)
    pub quality: i64,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 기록 생성 요청: `POST /api/v1/sleep`의 요청 본문
///
/// 시각은 `"23:30"` 같은 "HH:MM" 문자열이나
/// `"2024-03-20T23:30:00"` 같은 절대 시각 문자열 모두 받을 수 있습니다.
/// `totalSleepHours`는 받지 않습니다. 서버가 항상 직접 계산합니다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSleepRecordRequest {
    pub date: String,
    pub sleep_start_time: String,
    pub sleep_end_time: String,
    pub quality: i64,
    pub notes: Option<String>,
}

/// 기록 수정 요청: `PUT /api/v1/sleep/{id}`의 요청 본문
///
/// 모든 필드가 선택 항목입니다. None인 필드는 기존 값을 유지합니다.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSleepRecordRequest {
    pub date: Option<String>,
    pub sleep_start_time: Option<String>,
    pub sleep_end_time: Option<String>,
    pub quality: Option<i64>,
    pub notes: Option<String>,
}

impl UpdateSleepRecordRequest {
    /// 날짜나 시작/종료 시각 중 하나라도 바뀌는지 여부
    /// (true면 수면 구간과 총 수면 시간을 다시 계산해야 합니다)
    pub fn touches_window(&self) -> bool {
        self.date.is_some() || self.sleep_start_time.is_some() || self.sleep_end_time.is_some()
    }
}

/// 검증과 계산을 마친, DB에 그대로 쓸 수 있는 기록 내용
///
/// 생성과 수정 모두 이 구조체를 거쳐 저장되므로,
/// `total_sleep_hours`가 클라이언트 값으로 저장되는 경로는 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepRecordFields {
    pub date: NaiveDate,
    pub sleep_start_time: NaiveDateTime,
    pub sleep_end_time: NaiveDateTime,
    pub total_sleep_hours: f64,
    pub quality: i64,
    pub notes: String,
}
