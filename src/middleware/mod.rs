//! # 미들웨어 모듈
//!
//! 핸들러 앞단에서 요청을 가로채 처리하는 계층입니다.
//!
//! - `auth`: Bearer 토큰을 검증해 현재 사용자(AuthUser)를 추출하는 extractor
//! - `rate_limit`: 클라이언트(IP)별 고정 윈도우 요청 제한

pub mod auth;
pub mod rate_limit;
