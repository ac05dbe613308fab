//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 서명에 사용할 비밀키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소와 포트
//! - `GEMINI_API_KEY`: AI 수면 진단용 API 키 (없으면 진단 기능만 꺼짐)
//! - `GEMINI_MODEL`, `GEMINI_API_BASE_URL`: 진단에 사용할 모델과 API 주소
//! - `DIAGNOSIS_TIMEOUT_SECS`: AI 호출 제한 시간(초)

use std::env;
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DIAGNOSIS_TIMEOUT_SECS: u64 = 30;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/sleep.db?mode=rwc")
    pub database_url: String,
    /// JWT 토큰 서명/검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// AI 진단 설정. API 키가 없으면 None이고, 진단 엔드포인트는 503을 반환합니다.
    pub diagnosis: Option<DiagnosisConfig>,
}

/// 외부 생성형 AI(Gemini) 호출 설정
#[derive(Debug, Clone)]
pub struct DiagnosisConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    /// 한 번의 진단 호출에 허용하는 최대 시간
    pub timeout: Duration,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            diagnosis: DiagnosisConfig::from_env(),
        })
    }
}

impl DiagnosisConfig {
    /// `GEMINI_API_KEY`가 비어 있거나 없으면 None을 반환합니다.
    fn from_env() -> Option<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;

        let timeout_secs = env::var("DIAGNOSIS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_DIAGNOSIS_TIMEOUT_SECS);

        Some(Self {
            api_key,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            api_base_url: env::var("GEMINI_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
