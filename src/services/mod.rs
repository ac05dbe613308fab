//! # 비즈니스 로직 모듈
//!
//! - `sleep_window`: 입력 시각 해석, 자정 넘김 처리, 수면 시간 계산
//! - `insights`: 수면 기록 집계 (평균, 요일별, 품질 분포)
//! - `diagnosis`: 외부 AI 수면 진단

pub mod diagnosis;
pub mod insights;
pub mod sleep_window;
