//! # 요청 검증(Validation) 모듈
//!
//! 요청 본문과 경로 파라미터를 검증하는 순수 함수 모음입니다.
//! I/O가 전혀 없으므로 어디서든(서버 핸들러, 테스트) 그대로 호출할 수 있습니다.
//!
//! 각 검증 함수는 `Vec<FieldError>`를 반환합니다.
//! 빈 벡터면 통과, 아니면 핸들러가 `AppError::Validation`으로 감싸
//! 400 응답(`{ success: false, error: "Validation failed", errors: [...] }`)을 만듭니다.
//!
//! 비밀번호가 실제로 맞는지 같은 **자격 증명 검증은 여기서 하지 않습니다.**
//! 여기서는 모양(길이, 형식, 존재 여부)만 봅니다.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// 노트 제목의 최대 길이 (문자 수)
pub const MAX_TITLE_LENGTH: usize = 200;
/// 노트 본문의 최대 길이 (문자 수)
pub const MAX_CONTENT_LENGTH: usize = 1_000_000;
/// 비밀번호 최소 길이
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// 비밀번호 최대 길이
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// 이메일 최대 길이
pub const MAX_EMAIL_LENGTH: usize = 255;
/// 버전 주석(annotation)의 최대 길이
pub const MAX_ANNOTATION_LENGTH: usize = 500;

// RFC 5322를 실용 범위로 줄인 이메일 패턴.
// 로컬 파트는 허용 특수문자를 명시하고, 도메인 라벨은 영숫자로 시작/끝나야 하며
// 라벨당 63자(첫 글자 + 최대 61자 + 끝 글자)를 넘지 못합니다.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

// 하이픈으로 구분된 8-4-4-4-12 16진수 형태만 UUID로 인정합니다.
// 스토어 조회 전에 경로 파라미터를 걸러내는 용도입니다.
static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// 필드 단위 검증 오류
///
/// 응답의 errors 배열에 `{ "field": "...", "message": "..." }` 형태로 실립니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// 노트 생성/수정 본문을 검증합니다. 두 필드 모두 선택(partial update)입니다.
///
/// 길이는 바이트가 아닌 **문자 수** 기준입니다. (한글 제목 200자도 통과해야 합니다)
pub fn validate_note_payload(title: Option<&str>, content: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(title) = title {
        if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(FieldError::new(
                "title",
                format!("Title must not exceed {} characters", MAX_TITLE_LENGTH),
            ));
        }
    }

    if let Some(content) = content {
        if content.chars().count() > MAX_CONTENT_LENGTH {
            errors.push(FieldError::new(
                "content",
                format!("Content must not exceed {} characters", MAX_CONTENT_LENGTH),
            ));
        }
    }

    errors
}

/// 회원가입/로그인 본문(email + password)을 검증합니다.
pub fn validate_credentials(email: Option<&str>, password: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_email_into("email", email, "Email is required", &mut errors);
    validate_password_into("password", password, "Password", &mut errors);
    errors
}

/// 비밀번호 변경 본문(currentPassword + newPassword)을 검증합니다.
pub fn validate_password_change(
    current_password: Option<&str>,
    new_password: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match current_password {
        None => errors.push(FieldError::new(
            "currentPassword",
            "Current password is required",
        )),
        Some(p) if p.is_empty() => errors.push(FieldError::new(
            "currentPassword",
            "Current password is required",
        )),
        Some(p) if p.chars().count() > MAX_PASSWORD_LENGTH => errors.push(FieldError::new(
            "currentPassword",
            "Current password is too long",
        )),
        Some(_) => {}
    }

    validate_password_into("newPassword", new_password, "New password", &mut errors);
    errors
}

/// 이메일 변경 본문(newEmail)을 검증합니다.
///
/// 호출 전에 소문자/trim 정규화를 끝낸 값을 넘겨야 합니다.
pub fn validate_email_change(new_email: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_email_into("newEmail", new_email, "New email is required", &mut errors);
    errors
}

/// 경로 파라미터가 UUID 형태인지 확인합니다.
///
/// 형태만 보고 거르는 용도라 대소문자는 구분하지 않습니다.
pub fn is_valid_uuid(id: &str) -> bool {
    UUID_REGEX.is_match(id)
}

fn validate_email_into(
    field: &'static str,
    email: Option<&str>,
    required_message: &str,
    errors: &mut Vec<FieldError>,
) {
    match email {
        None => errors.push(FieldError::new(field, required_message)),
        Some(e) if e.is_empty() => errors.push(FieldError::new(field, required_message)),
        Some(e) if !EMAIL_REGEX.is_match(e) => {
            errors.push(FieldError::new(field, "Invalid email format"));
        }
        Some(e) if e.chars().count() > MAX_EMAIL_LENGTH => {
            errors.push(FieldError::new(field, "Email is too long"));
        }
        Some(_) => {}
    }
}

fn validate_password_into(
    field: &'static str,
    password: Option<&str>,
    label: &str,
    errors: &mut Vec<FieldError>,
) {
    match password {
        None => errors.push(FieldError::new(field, format!("{} is required", label))),
        Some(p) if p.is_empty() => {
            errors.push(FieldError::new(field, format!("{} is required", label)));
        }
        Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => errors.push(FieldError::new(
            field,
            format!(
                "{} must be at least {} characters",
                label, MIN_PASSWORD_LENGTH
            ),
        )),
        Some(p) if p.chars().count() > MAX_PASSWORD_LENGTH => {
            errors.push(FieldError::new(field, format!("{} is too long", label)));
        }
        Some(_) => {}
    }
}
