//! # AI 수면 진단 서비스
//!
//! `SleepInsights`를 고정된 한국어 프롬프트로 만들어 외부 생성형 AI(Gemini)에 보내고,
//! JSON으로 돌아온 답을 `SleepDiagnosis`로 파싱합니다.
//!
//! ## 구성
//! - `DiagnosisClient` 트레이트: 진단 제공자를 추상화합니다.
//!   라우트와 테스트는 이 트레이트에만 의존하므로 네트워크 없이 테스트할 수 있습니다.
//! - `GeminiDiagnosisClient`: Gemini `generateContent` REST API 구현
//! - `build_prompt()` / `parse_diagnosis()`: 프롬프트 생성과 응답 파싱 (순수 함수)
//!
//! 호출 실패, 시간 초과, 빈 응답, 형식이 맞지 않는 응답은 모두
//! `AppError::DiagnosisUnavailable`이 됩니다. 이미 계산된 인사이트에는 영향이 없습니다.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::DiagnosisConfig;
use crate::error::AppError;
use crate::models::{SleepDiagnosis, SleepInsights};

const MAX_SLEEP_SCORE: u8 = 100;

/// 수면 진단 제공자
///
/// `Arc<dyn DiagnosisClient>`로 `AppState`에 보관되므로 `Send + Sync`가 필요합니다.
#[async_trait]
pub trait DiagnosisClient: Send + Sync {
    async fn diagnose(&self, insights: &SleepInsights) -> Result<SleepDiagnosis, AppError>;
}

// ── Gemini API 요청/응답 타입 ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// JSON 모드: 모델이 JSON 본문만 돌려주도록 요청
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Gemini 기반 진단 클라이언트
pub struct GeminiDiagnosisClient {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
}

impl GeminiDiagnosisClient {
    /// 설정의 제한 시간을 적용한 HTTP 클라이언트를 만듭니다.
    pub fn new(config: &DiagnosisConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url, self.model)
    }
}

#[async_trait]
impl DiagnosisClient for GeminiDiagnosisClient {
    #[instrument(skip(self, insights), fields(model = %self.model, records = insights.total_records))]
    async fn diagnose(&self, insights: &SleepInsights) -> Result<SleepDiagnosis, AppError> {
        let prompt = build_prompt(insights);
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!("Sending sleep diagnosis request to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "failed" };
                error!(error = %e, "Gemini request {}", reason);
                AppError::DiagnosisUnavailable(format!("Gemini request {reason}: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::DiagnosisUnavailable(format!("Failed to read Gemini response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(AppError::DiagnosisUnavailable(format!(
                "Gemini API returned {status}"
            )));
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::DiagnosisUnavailable(format!("Unexpected Gemini response envelope: {e}"))
        })?;

        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        parse_diagnosis(&text)
    }
}

/// 진단 요청 프롬프트를 만듭니다.
///
/// 총 기록 수, 평균값, 요일별 평균, 품질 분포를 항목별로 나열하고
/// 마지막에 기대하는 JSON 응답 형태를 명시합니다.
pub fn build_prompt(insights: &SleepInsights) -> String {
    let weekly = insights
        .weekly_averages
        .iter()
        .map(|w| {
            format!(
                "- {}: {}시간 ({}일 기록)",
                w.day, w.average_hours, w.record_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let quality = insights
        .quality_distribution
        .iter()
        .map(|q| format!("- {}점: {}% ({}회)", q.quality, q.percentage, q.count))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"당신은 수면 의학 전문가입니다. 아래 사용자의 수면 통계를 보고 수면 상태를 진단한 뒤 개선 방법을 제안해 주세요.

[수면 통계 요약]
- 총 기록 수: {total}일
- 평균 수면 시간: {avg_hours}시간
- 평균 취침 시각: {bedtime}
- 평균 기상 시각: {wake_time}

[요일별 평균 수면 시간]
{weekly}

[수면 품질 분포]
{quality}

다음 내용을 포함해 주세요.
1. diagnosis: 수면 상태에 대한 전문적인 분석
2. recommendations: 바로 실천할 수 있는 개선 방법 3가지 이상
3. riskLevel: "low", "medium", "high" 중 하나
4. sleepScore: 0~100 사이의 정수 점수

반드시 아래 형태의 JSON 객체 하나로만 답해 주세요.
{{
  "diagnosis": "진단 내용",
  "recommendations": ["개선 방법 1", "개선 방법 2", "개선 방법 3"],
  "riskLevel": "low",
  "sleepScore": 85
}}"#,
        total = insights.total_records,
        avg_hours = insights.average_sleep_hours,
        bedtime = insights.average_bedtime.as_deref().unwrap_or("기록 없음"),
        wake_time = insights.average_wake_time.as_deref().unwrap_or("기록 없음"),
    )
}

/// AI 응답 텍스트를 `SleepDiagnosis`로 파싱합니다.
///
/// 순수 JSON 객체뿐 아니라 ```` ```json ... ``` ```` 코드 블록으로 감싼 답도 받습니다.
pub fn parse_diagnosis(text: &str) -> Result<SleepDiagnosis, AppError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(AppError::DiagnosisUnavailable(
            "AI response was empty".to_string(),
        ));
    }

    let diagnosis: SleepDiagnosis = serde_json::from_str(body).map_err(|e| {
        AppError::DiagnosisUnavailable(format!("AI response is not a valid diagnosis: {e}"))
    })?;

    if diagnosis.sleep_score > MAX_SLEEP_SCORE {
        return Err(AppError::DiagnosisUnavailable(format!(
            "sleepScore {} is outside 0..=100",
            diagnosis.sleep_score
        )));
    }

    Ok(diagnosis)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
