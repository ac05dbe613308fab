//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `sleep`: 수면 기록(SleepRecord)과 생성/수정 요청
//! - `insights`: 집계 결과(SleepInsights)와 AI 진단(SleepDiagnosis)
//! - `user`: 사용자(User)와 인증 요청/응답
//!
//! `pub use X::*;`로 재공개하여 `crate::models::SleepRecord`처럼 짧게 접근합니다.

pub mod insights;
pub mod sleep;
pub mod user;

pub use insights::*;
pub use sleep::*;
pub use user::*;
