//! # notemark 라이브러리 루트
//!
//! 마크다운 노트 앱의 백엔드와, 브라우저 에디터의 상태 로직을
//! 하나의 크레이트로 제공합니다.
//!
//! - HTTP API: 인증, 노트 CRUD(soft delete 포함), 버전 스냅샷
//! - `editor`: 자동 저장 디바운스/버전 보기 등 클라이언트 세션 상태 기계
//!
//! 바이너리(main.rs)는 이 라이브러리를 조립해 서버를 띄우기만 하고,
//! 통합 테스트(tests/)는 같은 라이브러리를 직접 불러 사용합니다.

// ── 모듈 선언 ──
// `mod` 키워드는 다른 파일을 모듈로 가져옵니다.
// 예: `pub mod config;`는 같은 디렉토리의 `config.rs` 또는 `config/mod.rs`를 가져옵니다.
// Rust에서는 파일 시스템 구조가 곧 모듈 구조입니다.
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod validation;
