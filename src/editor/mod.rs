//! # 에디터 세션 모듈
//!
//! 브라우저 쪽 노트 에디터의 동작을 상태 기계로 모델링한 모듈입니다.
//! UI 프레임워크와 네트워크에서 완전히 분리된 순수 로직이라,
//! 서버와 같은 테스트 도구로 결정적으로 검증할 수 있습니다.
//!
//! 각 하위 모듈:
//! - `session`: 에디터 세션 상태 기계 (자동 저장 디바운스, 버전 보기, 삭제/복구)
//! - `markdown`: 마크다운 → HTML 미리보기 렌더링
//! - `route`: `#note/{id}` 해시 주소 해석/생성
//!
//! 상태 전이 메서드는 부수 효과를 직접 일으키는 대신 `Effect` 목록을
//! 반환합니다. 호스트(브라우저 셸)가 이 목록을 읽어 네트워크 요청이나
//! 화면 갱신을 수행하고, 그 결과를 다시 `*_completed` 류 메서드로
//! 되돌려줍니다.

pub mod markdown;
pub mod route;
pub mod session;

pub use markdown::render_preview;
pub use route::{note_hash, parse_hash};
pub use session::*;
