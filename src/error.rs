//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 `{ success: false, ... }` JSON 응답으로 자동 변환
//!
//! 모든 에러 응답은 성공 응답과 같은 봉투(envelope)를 사용합니다:
//! `{ "success": false, "error": "...", "errors": [ { field, message } ]? }`

use axum::{
    http::{header, StatusCode},         // HTTP 상태 코드와 표준 헤더 이름
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use once_cell::sync::OnceCell;
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: 커스텀 에러 타입을 쉽게 만들어주는 매크로 크레이트

use crate::validation::FieldError;

// 500 응답에 실제 에러 내용을 실을지 여부. 서버 시작 시 한 번 설정됩니다.
// 프로덕션에서는 내부 구현이 노출되지 않도록 일반 메시지만 내보내고,
// 개발 환경에서는 디버깅을 위해 상세 메시지를 포함합니다.
static EXPOSE_ERROR_DETAILS: OnceCell<bool> = OnceCell::new();

/// 500 응답의 상세 메시지 노출 여부를 설정합니다. (서버 시작 시 1회 호출)
///
/// 이미 설정된 뒤의 호출은 무시됩니다.
pub fn expose_error_details(expose: bool) {
    let _ = EXPOSE_ERROR_DETAILS.set(expose);
}

fn details_exposed() -> bool {
    // 설정 전(예: 단위 테스트)에는 안전한 쪽인 false로 동작합니다.
    *EXPOSE_ERROR_DETAILS.get().unwrap_or(&false)
}

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    // #[error("...")]: 이 variant의 Display 메시지를 정의합니다.

    /// 요청 본문이 필드 수준 규칙을 위반함 (HTTP 400)
    /// 어떤 필드가 왜 거부되었는지 errors 배열로 전달합니다.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// 잘못된 요청 (HTTP 400)
    /// String을 포함하여 구체적인 에러 메시지를 전달합니다.
    /// {0}은 첫 번째 필드(String)를 참조하는 포맷 문법입니다.
    #[error("{0}")]
    BadRequest(String),

    /// 인증 실패 (HTTP 401)
    #[error("{0}")]
    Unauthorized(String),

    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    /// 존재하지 않는 경우와 다른 사용자의 소유인 경우를 구분하지 않습니다.
    /// (구분하면 다른 사용자의 노트 id가 유효한지 알아낼 수 있게 됩니다)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 요청 한도 초과 (HTTP 429)
    /// retry_after_secs는 현재 윈도우가 리셋될 때까지 남은 시간(초, 올림)입니다.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error를 AppError로 자동 변환하는 From 트레이트를 구현합니다.
    /// 이를 통해 sqlx 함수에서 반환된 에러에 `?` 연산자를 사용하면
    /// 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),
}

// impl IntoResponse for AppError:
// 핸들러가 Err(AppError)를 반환하면 Axum이 이 메서드를 호출하여
// 적절한 HTTP 응답을 생성합니다.
impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다 (프로덕션 기준).
    fn into_response(self) -> Response {
        // match: 패턴 매칭. enum의 각 variant에 대해 다른 처리를 합니다.
        match self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "success": false,
                    "error": "Validation failed",
                    "errors": errors,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }

            AppError::BadRequest(msg) => {
                let body = Json(json!({ "success": false, "error": msg }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }

            AppError::Unauthorized(msg) => {
                let body = Json(json!({ "success": false, "error": msg }));
                (StatusCode::UNAUTHORIZED, body).into_response()
            }

            AppError::NotFound(_) => {
                let body = Json(json!({ "success": false, "error": self.to_string() }));
                (StatusCode::NOT_FOUND, body).into_response()
            }

            AppError::RateLimited {
                message,
                retry_after_secs,
            } => {
                // Retry-After 헤더: 클라이언트가 얼마나 기다렸다 재시도해야 하는지(초).
                // 본문에도 같은 값을 retryAfter 필드로 실어 보냅니다.
                let body = Json(json!({
                    "success": false,
                    "error": message,
                    "retryAfter": retry_after_secs,
                }));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    body,
                )
                    .into_response()
            }

            AppError::Database(ref e) => {
                // 내부 에러는 로그에 기록 (서버 관리자용)
                tracing::error!("Database error: {}", e);
                internal_response(self.to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_response(self.to_string())
            }
        }
    }
}

/// 500 응답 본문을 생성합니다.
///
/// 상세 메시지는 개발 환경에서만 포함됩니다. (`expose_error_details` 참고)
fn internal_response(detail: String) -> Response {
    let message = if details_exposed() {
        detail
    } else {
        "An internal error occurred".to_string()
    };
    let body = Json(json!({ "success": false, "error": message }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
