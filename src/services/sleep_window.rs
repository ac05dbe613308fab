//! # 수면 구간 / 수면 시간 계산 서비스
//!
//! 기록 날짜(base date)와 잠든 시각/깬 시각 토큰으로부터
//! 절대 시작·종료 시각과 정수 단위 총 수면 시간을 만들어냅니다.
//!
//! ## 규칙
//! - `"HH:MM"` 토큰은 기록 날짜의 연/월/일과 합쳐집니다. 초 이하는 0입니다.
//! - 이미 절대 시각(`2024-03-20T23:30:00`, RFC 3339 등)이면 그대로 사용합니다.
//! - **자정 넘김(rollover)**: 종료 시각이 시작 시각보다 늦지 않으면 종료 날짜를 하루 뒤로 미룹니다.
//!   예: 23:30 → 07:00 은 다음 날 07:00으로 보정되어 8시간이 됩니다.
//! - 총 수면 시간 = `round((종료 - 시작)ms / 3,600,000)` → 가장 가까운 정수 시간
//!
//! 파싱할 수 없는 시각은 자정(00:00)으로 대체하지 않고 항상 `InvalidInput`으로 실패합니다.
//!
//! 이 모듈의 함수들은 모두 I/O가 없는 순수 함수입니다.
//! DB 저장은 라우트 핸들러가 `db::sleep_records`를 통해 처리합니다.

use crate::error::AppError;
use crate::models::{CreateSleepRecordRequest, SleepRecord, SleepRecordFields, UpdateSleepRecordRequest};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// 시각 토큰이 "HH:MM"이 아닐 때 시도하는 절대 시각 형식들
/// (`%.f`는 소수 초가 없어도 매칭됩니다)
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub const MIN_QUALITY: i64 = 1;
pub const MAX_QUALITY: i64 = 5;

/// 보정이 끝난 하나의 수면 구간
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepWindow {
    pub start: NaiveDateTime,
    /// 항상 `start`보다 뒤
    pub end: NaiveDateTime,
    /// 정수로 반올림된 시간 (f64로 보관)
    pub total_sleep_hours: f64,
}

impl SleepWindow {
    /// 날짜와 두 개의 시각 토큰으로 수면 구간을 계산합니다.
    ///
    /// # 예시
    /// ```text
    /// resolve(2024-03-20, "23:30", "07:00") → 2024-03-20 23:30 ~ 2024-03-21 07:00, 8시간
    /// resolve(2024-03-20, "09:00", "17:00") → 2024-03-20 09:00 ~ 2024-03-20 17:00, 8시간
    /// ```
    pub fn resolve(base_date: NaiveDate, start: &str, end: &str) -> Result<Self, AppError> {
        let start = parse_time_token(base_date, start)?;
        let end = parse_time_token(base_date, end)?;
        Self::from_bounds(start, end)
    }

    /// 이미 날짜가 붙은 시작/종료 시각에 자정 넘김 보정을 적용하고 수면 시간을 계산합니다.
    ///
    /// 종료 시각이 시작 시각 이하이면 정확히 하루를 더합니다.
    /// 하루를 더해도 여전히 시작보다 이르면(절대 시각 입력이 이틀 이상 어긋난 경우) 실패합니다.
    pub fn from_bounds(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AppError> {
        let end = if end <= start {
            end.checked_add_days(Days::new(1)).ok_or_else(|| {
                AppError::InvalidInput(format!("sleep end time {end} is out of range"))
            })?
        } else {
            end
        };

        if end <= start {
            return Err(AppError::InvalidInput(format!(
                "sleep end time {end} must be after start time {start}"
            )));
        }

        Ok(Self {
            start,
            end,
            total_sleep_hours: whole_hours_between(start, end),
        })
    }
}

/// 두 시각 사이를 가장 가까운 정수 시간으로 반올림합니다.
pub fn whole_hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let millis = (end - start).num_milliseconds() as f64;
    (millis / MILLIS_PER_HOUR).round()
}

/// 기록 날짜 문자열을 파싱합니다.
///
/// `"2024-03-20"` 형식이 기본이며, 브라우저의 `Date.toISOString()` 결과처럼
/// 시각이 붙은 문자열이 오면 날짜 부분만 사용합니다.
pub fn parse_base_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("invalid date `{value}`: expected YYYY-MM-DD"))
        })
}

/// 시각 토큰 하나를 기록 날짜 기준의 절대 시각으로 바꿉니다.
pub fn parse_time_token(base_date: NaiveDate, token: &str) -> Result<NaiveDateTime, AppError> {
    let token = token.trim();

    // "HH:MM" → 기록 날짜 + 해당 시각 (초 = 0)
    if let Ok(time) = NaiveTime::parse_from_str(token, "%H:%M") {
        return Ok(base_date.and_time(time));
    }

    parse_timestamp(token).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "invalid time `{token}`: expected HH:MM or an ISO-8601 timestamp"
        ))
    })
}

/// 절대 시각 문자열 파싱. RFC 3339(오프셋 포함)는 그 오프셋 기준의 벽시계 시각을 사용합니다.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

pub fn validate_quality(quality: i64) -> Result<i64, AppError> {
    if (MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        Ok(quality)
    } else {
        Err(AppError::InvalidInput(format!(
            "quality must be between {MIN_QUALITY} and {MAX_QUALITY}, got {quality}"
        )))
    }
}

/// 생성 요청을 검증하고 저장할 내용을 만듭니다.
pub fn fields_for_create(req: &CreateSleepRecordRequest) -> Result<SleepRecordFields, AppError> {
    let date = parse_base_date(&req.date)?;
    let window = SleepWindow::resolve(date, &req.sleep_start_time, &req.sleep_end_time)?;
    let quality = validate_quality(req.quality)?;

    Ok(SleepRecordFields {
        date,
        sleep_start_time: window.start,
        sleep_end_time: window.end,
        total_sleep_hours: window.total_sleep_hours,
        quality,
        notes: req.notes.clone().unwrap_or_default(),
    })
}

/// 기존 기록에 수정 요청을 합쳐 저장할 내용을 만듭니다.
///
/// 날짜나 시각이 하나라도 바뀌면 두 경계를 모두 (새) 기록 날짜에 다시 붙이고
/// 자정 넘김 보정과 수면 시간 계산을 처음부터 다시 합니다.
/// - 바뀐 쪽: 요청 토큰을 파싱
/// - 안 바뀐 쪽: 저장돼 있던 시각(시:분:초)을 기록 날짜에 다시 붙임
///
/// 품질/메모만 바뀌면 기존 수면 구간과 수면 시간은 건드리지 않습니다.
pub fn fields_for_update(
    existing: &SleepRecord,
    req: &UpdateSleepRecordRequest,
) -> Result<SleepRecordFields, AppError> {
    let quality = match req.quality {
        Some(q) => validate_quality(q)?,
        None => existing.quality,
    };
    let notes = req.notes.clone().unwrap_or_else(|| existing.notes.clone());

    if !req.touches_window() {
        return Ok(SleepRecordFields {
            date: existing.date,
            sleep_start_time: existing.sleep_start_time,
            sleep_end_time: existing.sleep_end_time,
            total_sleep_hours: existing.total_sleep_hours,
            quality,
            notes,
        });
    }

    let date = match &req.date {
        Some(d) => parse_base_date(d)?,
        None => existing.date,
    };
    let start = match &req.sleep_start_time {
        Some(token) => parse_time_token(date, token)?,
        None => date.and_time(existing.sleep_start_time.time()),
    };
    let end = match &req.sleep_end_time {
        Some(token) => parse_time_token(date, token)?,
        None => date.and_time(existing.sleep_end_time.time()),
    };
    let window = SleepWindow::from_bounds(start, end)?;

    Ok(SleepRecordFields {
        date,
        sleep_start_time: window.start,
        sleep_end_time: window.end,
        total_sleep_hours: window.total_sleep_hours,
        quality,
        notes,
    })
}
