//! `#note/{id}` 해시 주소 체계
//!
//! 노트 하나를 주소로 가리키는 딥링크입니다. 해시가 없거나 `#`뿐이면
//! 빈 상태(노트 미선택)를 뜻합니다. 브라우저의 뒤로/앞으로 이동이
//! hashchange 이벤트로 들어오면 세션이 이 모듈로 해석해 다시 로드합니다.

/// 해시 문자열에서 노트 id를 꺼냅니다.
///
/// 선행 `#`는 있어도 되고 없어도 됩니다. (`location.hash`는 `#`를 포함합니다)
/// `#note/` 뒤가 비어 있으면 None입니다.
pub fn parse_hash(hash: &str) -> Option<&str> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    let id = hash.strip_prefix("note/")?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// 노트 id를 해시 주소로 만듭니다.
pub fn note_hash(note_id: &str) -> String {
    format!("#note/{}", note_id)
}
