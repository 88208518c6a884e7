//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `notes`: 노트 CRUD(생성/조회/수정/soft delete/복구) 쿼리
//! - `users`: 사용자 계정과 refresh 토큰 쿼리
//! - `versions`: 노트 버전 스냅샷 쿼리
//!
//! 노트/버전 쿼리는 전부 user_id로 범위를 한정합니다.

pub mod notes;
pub mod users;
pub mod versions;

// 하위 모듈의 모든 공개 함수를 재공개(re-export)하여
// `crate::db::list_notes`처럼 바로 접근할 수 있게 합니다.
pub use notes::*;
pub use users::*;
pub use versions::*;
