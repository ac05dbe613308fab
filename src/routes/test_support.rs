//! 라우트 테스트 공용 도구: 인메모리 DB로 만든 라우터에 요청을 한 건씩 보냅니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use crate::{
    db,
    middleware::auth::create_access_token,
    routes::{api_router, AppState},
    services::diagnosis::DiagnosisClient,
};

pub const TEST_SECRET: &str = "route-test-secret";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn new(diagnosis: Option<Arc<dyn DiagnosisClient>>) -> Self {
        let pool = db::test_pool().await;
        let state = AppState {
            pool: pool.clone(),
            jwt_secret: TEST_SECRET.to_string(),
            diagnosis,
        };

        Self {
            router: api_router(state),
            pool,
        }
    }

    /// 사용자를 만들고 그 사용자의 액세스 토큰을 돌려줍니다.
    pub async fn user(&self, id: &str) -> String {
        db::users::create_user(&self.pool, id, id, &format!("{id}@example.com"), "unused-hash")
            .await
            .unwrap();
        create_access_token(id, TEST_SECRET).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }
}
