//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `auth`: 인증 관련 (회원가입, 로그인, 토큰 갱신, 비밀번호/이메일 변경)
//! - `notes`: 노트 CRUD + 휴지통 복구 핸들러 (공유 상태 AppState도 여기 정의)
//! - `versions`: 노트 버전 스냅샷 핸들러
//! - `health`: 서버 상태 확인 (헬스체크)
//!
//! `api_router()`가 전체 API 라우터를 조립합니다. main과 통합 테스트가
//! 같은 라우터를 쓰도록 여기에 둡니다.

pub mod auth;
pub mod health;
pub mod notes;
pub mod versions;

// 각 모듈의 핸들러 함수들을 재공개하여
// `routes::list_notes`처럼 바로 접근 가능하게 합니다.
pub use health::*;
pub use notes::*;
pub use versions::*;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::middleware::rate_limit::{api_rate_limit, auth_rate_limit};

/// `/api` 아래에 중첩될 전체 API 라우터를 조립합니다.
///
/// 라우트는 두 그룹으로 나뉘어 서로 다른 속도 제한을 받습니다:
/// - 자격 증명을 다루는 엔드포인트: 15분에 5회 (무차별 대입 방지)
/// - 나머지 API: 1분에 100회
///
/// `.layer()`는 호출 시점까지 등록된 라우트에만 적용되므로,
/// 라우트를 먼저 추가하고 마지막에 미들웨어를 겹칩니다.
pub fn api_router(state: AppState) -> Router {
    // 인증 계열 라우트 (회원가입, 로그인, 토큰 갱신, 비밀번호 변경)
    let auth_limited = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password", put(auth::change_password))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    // 일반 API 라우트 (노트, 버전, 세션 관리)
    let api_limited = Router::new()
        .route("/auth/signout", post(auth::signout))
        .route("/auth/user", get(auth::current_user))
        .route("/auth/email", put(auth::change_email))
        // .post()를 .route()에 체이닝하면 같은 경로에 여러 HTTP 메서드를 매핑할 수 있습니다.
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        // {id}는 URL 경로 파라미터 (Path<String>으로 핸들러에서 추출)
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/{id}/restore", post(notes::restore_note))
        .route(
            "/versions/note/{note_id}",
            get(versions::list_note_versions).post(versions::create_version),
        )
        .route(
            "/versions/{id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .layer(middleware::from_fn_with_state(state.clone(), api_rate_limit));

    Router::new()
        .merge(auth_limited)
        .merge(api_limited)
        // 헬스체크는 인증도 속도 제한도 없이 열어둡니다.
        .route("/health", get(health::health_check))
        // .with_state(): 이 라우터의 모든 핸들러에서 AppState를 사용할 수 있게 합니다.
        .with_state(state)
}
