//! # 수면 기록 데이터베이스 쿼리 모듈
//!
//! `sleep_records` 테이블의 CRUD 쿼리입니다.
//!
//! 모든 쿼리는 `id`와 함께 `user_id`로 범위를 제한합니다.
//! 다른 사용자의 기록은 "없는 기록"과 똑같이 보입니다 (조회 None, 삭제 false).
//!
//! 이 모듈은 값을 검증하거나 계산하지 않습니다.
//! 저장되는 `SleepRecordFields`는 항상 `services::sleep_window`를 거쳐 만들어집니다.

use crate::error::AppError;
use crate::models::{SleepRecord, SleepRecordFields};
use sqlx::SqlitePool;

/// 사용자의 수면 기록 전체를 최신 날짜 순으로 조회합니다.
pub async fn list_sleep_records(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<SleepRecord>, AppError> {
    let records = sqlx::query_as::<_, SleepRecord>(
        r#"
        SELECT id, user_id, date, sleep_start_time, sleep_end_time,
               total_sleep_hours, quality, notes, created_at, updated_at
        FROM sleep_records
        WHERE user_id = ?
        ORDER BY date DESC, sleep_start_time DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool) // 여러 행 → Vec
    .await?;

    Ok(records)
}

/// 사용자의 기록 하나를 조회합니다. 없거나 다른 사용자의 기록이면 `None`.
pub async fn get_sleep_record(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<SleepRecord>, AppError> {
    let record = sqlx::query_as::<_, SleepRecord>(
        r#"
        SELECT id, user_id, date, sleep_start_time, sleep_end_time,
               total_sleep_hours, quality, notes, created_at, updated_at
        FROM sleep_records
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// 새 수면 기록을 저장합니다.
///
/// 저장 직후 다시 조회해 DB 기본값(`created_at`, `updated_at`)이 채워진 기록을 반환합니다.
pub async fn create_sleep_record(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    fields: &SleepRecordFields,
) -> Result<SleepRecord, AppError> {
    sqlx::query(
        r#"
        INSERT INTO sleep_records
            (id, user_id, date, sleep_start_time, sleep_end_time,
             total_sleep_hours, quality, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(fields.date)
    .bind(fields.sleep_start_time)
    .bind(fields.sleep_end_time)
    .bind(fields.total_sleep_hours)
    .bind(fields.quality)
    .bind(&fields.notes)
    .execute(pool)
    .await?;

    get_sleep_record(pool, user_id, id)
        .await?
        .ok_or(AppError::Internal(
            "Failed to retrieve created sleep record".to_string(),
        ))
}

/// 기록 전체 내용을 덮어쓰고 `updated_at`을 현재 시각으로 바꿉니다.
///
/// 대상 기록이 없으면 `None`을 반환합니다.
pub async fn update_sleep_record(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    fields: &SleepRecordFields,
) -> Result<Option<SleepRecord>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE sleep_records
        SET date = ?,
            sleep_start_time = ?,
            sleep_end_time = ?,
            total_sleep_hours = ?,
            quality = ?,
            notes = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(fields.date)
    .bind(fields.sleep_start_time)
    .bind(fields.sleep_end_time)
    .bind(fields.total_sleep_hours)
    .bind(fields.quality)
    .bind(&fields.notes)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_sleep_record(pool, user_id, id).await
}

/// 기록을 삭제합니다. 실제로 지워졌으면 true.
pub async fn delete_sleep_record(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM sleep_records WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
