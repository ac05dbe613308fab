//! # 수면 인사이트 집계 서비스
//!
//! 한 사용자의 수면 기록 목록을 `SleepInsights` 하나로 요약합니다.
//! 결과는 통계 화면의 차트와 AI 진단 프롬프트에 함께 쓰입니다.
//!
//! ## 계산 순서
//! 1. 기록이 없으면 즉시 0 값을 반환합니다 (이후 단계의 0 나누기를 구조적으로 차단).
//! 2. 평균 수면 시간 = 산술 평균을 소수점 첫째 자리로 반올림.
//! 3. 평균 취침/기상 시각 = 자정 기준 분(minute)의 **단순 산술 평균**.
//! 4. 요일별 평균 = `date`의 요일로 분류, 항상 일요일부터 7개.
//! 5. 품질 분포 = 나온 점수만, 점수 오름차순, 비율은 정수 반올림.
//!
//! ## 알려진 한계: 자정을 감싸는 시각 평균
//! 3번은 24시간 원형(circular) 평균이 아닙니다.
//! 예를 들어 취침 시각 {23:50, 00:10}의 평균은 00:00이 아니라 12:00이 됩니다.
//!
//! 모든 함수는 I/O가 없는 순수 함수이며, 같은 입력에는 항상 같은 결과를 돌려줍니다.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::AppError;
use crate::models::{QualityShare, SleepInsights, SleepRecord, WeeklyAverage};

/// 요일 이름 표: 인덱스는 `num_days_from_sunday()` (0 = 일요일)
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MINUTES_PER_HOUR: f64 = 60.0;

/// 수면 기록 목록으로 인사이트를 계산합니다.
///
/// 기록 순서는 결과에 영향을 주지 않습니다.
///
/// # 에러
/// 저장소에서 온 기록의 `total_sleep_hours`가 NaN/무한대이면 값을 고치지 않고
/// `AppError::Internal`로 돌려줍니다.
pub fn compute_insights(records: &[SleepRecord]) -> Result<SleepInsights, AppError> {
    if records.is_empty() {
        return Ok(SleepInsights::empty());
    }

    if let Some(bad) = records.iter().find(|r| !r.total_sleep_hours.is_finite()) {
        return Err(AppError::Internal(format!(
            "sleep record {} has a non-finite totalSleepHours ({})",
            bad.id, bad.total_sleep_hours
        )));
    }

    let total = records.len();
    let hours_sum: f64 = records.iter().map(|r| r.total_sleep_hours).sum();

    Ok(SleepInsights {
        total_records: total,
        average_sleep_hours: round_to_tenth(hours_sum / total as f64),
        average_bedtime: Some(average_clock_time(records.iter().map(|r| r.sleep_start_time))),
        average_wake_time: Some(average_clock_time(records.iter().map(|r| r.sleep_end_time))),
        weekly_averages: weekly_averages(records),
        quality_distribution: quality_distribution(records),
    })
}

/// 소수점 첫째 자리 반올림: `round(x * 10) / 10`
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 날짜를 무시한 "자정 이후 몇 분" 값 (0 이상 1440 미만)
pub fn minutes_since_midnight(timestamp: NaiveDateTime) -> f64 {
    f64::from(timestamp.hour() * 60 + timestamp.minute())
}

/// 시각들의 평균을 "HH:MM"으로 만듭니다. 호출하는 쪽에서 비어 있지 않음을 보장합니다.
fn average_clock_time(times: impl Iterator<Item = NaiveDateTime>) -> String {
    let (sum, count) = times.fold((0.0, 0usize), |(sum, count), ts| {
        (sum + minutes_since_midnight(ts), count + 1)
    });
    format_clock_minutes(sum / count as f64)
}

/// 분 값을 "HH:MM"으로 포맷합니다.
///
/// `hours = floor(m / 60) mod 24`, `mins = round(m mod 60)`
///
/// 분은 시와 따로 반올림하므로 정시 직전 30초 이내의 값(예: 59.6분)은
/// 다음 시로 올라가지 않고 `"HH:60"`이 됩니다.
pub fn format_clock_minutes(minutes: f64) -> String {
    let hours = ((minutes / MINUTES_PER_HOUR).floor() as i64).rem_euclid(24);
    let mins = (minutes % MINUTES_PER_HOUR).round() as i64;
    format!("{hours:02}:{mins:02}")
}

/// 요일별 평균 수면 시간. 기록이 없는 요일도 `0 / 0`으로 포함합니다.
///
/// 전체 평균과 달리 반올림하지 않은 산술 평균 그대로입니다.
fn weekly_averages(records: &[SleepRecord]) -> Vec<WeeklyAverage> {
    let mut sums = [0.0_f64; 7];
    let mut counts = [0usize; 7];

    for record in records {
        let idx = record.date.weekday().num_days_from_sunday() as usize;
        sums[idx] += record.total_sleep_hours;
        counts[idx] += 1;
    }

    WEEKDAY_NAMES
        .iter()
        .enumerate()
        .map(|(idx, day)| WeeklyAverage {
            day: (*day).to_string(),
            average_hours: if counts[idx] == 0 {
                0.0
            } else {
                sums[idx] / counts[idx] as f64
            },
            record_count: counts[idx],
        })
        .collect()
}

/// 품질 점수별 빈도와 비율. BTreeMap이라 점수 오름차순으로 나옵니다.
fn quality_distribution(records: &[SleepRecord]) -> Vec<QualityShare> {
    let total = records.len() as f64;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.quality).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(quality, count)| QualityShare {
            quality,
            count,
            percentage: (count as f64 / total * 100.0).round() as u32,
        })
        .collect()
}
