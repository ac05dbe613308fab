//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `sleep_records`: 수면 기록 CRUD 쿼리 (모두 사용자 단위로 제한)
//! - `users`: 사용자 계정과 리프레시 토큰 쿼리

pub mod sleep_records;
pub mod users;

// `crate::db::list_sleep_records`처럼 바로 접근할 수 있게 재공개합니다.
// users는 `find_by_id` 같은 일반적인 이름이 많아 `db::users::`로 구분해 씁니다.
pub use sleep_records::*;

/// 테스트용 인메모리 SQLite 풀
///
/// `sqlite::memory:`는 연결마다 별도 DB가 생기므로 연결을 하나로 고정하고,
/// 그 연결이 닫히지 않도록 유휴/수명 제한을 끕니다.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}
