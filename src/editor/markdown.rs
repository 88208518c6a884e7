//! 마크다운 미리보기 렌더링
//!
//! 에디터의 "Preview" 모드가 현재 버퍼를 HTML로 바꿀 때 사용합니다.
//! 렌더링은 순수 변환이며, 모드를 전환해도 저장이 일어나지 않습니다.

use pulldown_cmark::{html, Options, Parser};

/// 마크다운 문자열을 HTML 조각으로 변환합니다.
///
/// GitHub 스타일 확장(표, 취소선, 체크리스트)을 켭니다.
/// pulldown-cmark는 태그를 이스케이프하지 않고 통과시키므로,
/// 결과를 문서에 꽂는 쪽에서 신뢰 경계를 관리해야 합니다.
pub fn render_preview(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}
