//! # 수면 인사이트 / AI 진단 모델
//!
//! `SleepInsights`는 저장되지 않는 계산 결과입니다. 요청마다 현재 기록으로 새로 만들고,
//! 차트 렌더링과 AI 진단 프롬프트의 입력으로 쓰인 뒤 버려집니다.
//!
//! JSON 필드 이름(`totalRecords`, `weeklyAverages` 등)은 프론트엔드 차트와
//! 진단 프롬프트가 함께 의존하는 계약이므로 바꾸면 안 됩니다.

use serde::{Deserialize, Serialize};

/// 한 사용자의 수면 기록 전체에 대한 집계 통계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepInsights {
    pub total_records: usize,
    /// 평균 수면 시간 (소수점 첫째 자리까지 반올림)
    pub average_sleep_hours: f64,
    /// 평균 취침 시각 "HH:MM": 기록이 없으면 null
    pub average_bedtime: Option<String>,
    /// 평균 기상 시각 "HH:MM": 기록이 없으면 null
    pub average_wake_time: Option<String>,
    /// 기록이 있으면 항상 7개(일요일부터), 기록이 없으면 빈 배열
    pub weekly_averages: Vec<WeeklyAverage>,
    /// 실제로 나온 품질 점수만, 점수 오름차순
    pub quality_distribution: Vec<QualityShare>,
}

impl SleepInsights {
    /// 기록이 하나도 없을 때의 결과
    pub fn empty() -> Self {
        Self {
            total_records: 0,
            average_sleep_hours: 0.0,
            average_bedtime: None,
            average_wake_time: None,
            weekly_averages: Vec::new(),
            quality_distribution: Vec::new(),
        }
    }
}

/// 요일별 평균 수면 시간
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAverage {
    /// 요일 이름 ("Sunday" ~ "Saturday")
    pub day: String,
    /// 해당 요일 기록이 없으면 0
    pub average_hours: f64,
    pub record_count: usize,
}

/// 수면 품질 점수 하나의 빈도
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityShare {
    pub quality: i64,
    pub count: usize,
    /// 전체 기록 대비 비율(%)을 정수로 반올림한 값.
    /// 항목별로 따로 반올림하므로 합이 정확히 100이 아닐 수 있습니다.
    pub percentage: u32,
}

/// 외부 AI가 돌려주는 수면 진단 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepDiagnosis {
    pub diagnosis: String,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
    /// 0~100 사이의 수면 점수
    pub sleep_score: u8,
}

/// 진단 위험도: JSON에서는 "low" / "medium" / "high"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}
