//! # 계정 모델
//!
//! 수면 기록의 소유자가 되는 사용자 계정입니다.
//! 로그인 식별자는 이메일 하나이며, `name`은 화면과 진단 결과에 표시되는 이름일 뿐
//! 중복을 허용합니다. 이메일은 가입/로그인 시 소문자로 정규화되어 저장·비교됩니다.
//!
//! 수면 기록 JSON과 달리 인증 API의 필드 이름은 snake_case(`access_token`)입니다.

use serde::{Deserialize, Serialize};

/// `users` 테이블 한 행
///
/// 비밀번호는 Argon2id PHC 문자열로만 보관하며 어떤 응답에도 직렬화되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    /// 로그인 식별자 (UNIQUE, 소문자)
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 클라이언트에 돌려주는 공개 계정 정보 (`GET /auth/me`, 인증 응답의 `user`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let User {
            id,
            name,
            email,
            created_at,
            updated_at,
            ..
        } = user;
        Self {
            id,
            name,
            email,
            created_at,
            updated_at,
        }
    }
}

/// `POST /auth/register`: 이름은 공백 제외 1자 이상, 비밀번호는 8자 이상
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login`: 이메일 + 비밀번호
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/refresh`: 한 번 쓰면 폐기되는 리프레시 토큰
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 가입·로그인·토큰 갱신의 공통 응답
///
/// `access_token`은 15분, `refresh_token`은 7일 동안 유효합니다.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}
