//! # 에디터 세션 상태 기계
//!
//! 노트 에디터 한 화면의 수명을 네 국면으로 모델링합니다.
//!
//! ```text
//!              load_note                    view_version
//!   Empty ───────────────▶ Editing ◀──────────────────▶ ViewingVersion
//!     ▲                      │  ▲                          (읽기 전용)
//!     │ hash 제거            │  │ restore_completed
//!     │                      ▼  │
//!     └─────────────────── Deleted (복구 안내)
//! ```
//!
//! 시간은 밀리초 값으로 메서드에 직접 전달합니다. 시계를 내장하지 않으니
//! 디바운스와 타이머 동작을 실제 대기 없이 그대로 검증할 수 있습니다.
//! 네트워크 응답은 `*_completed`, `*_loaded` 메서드로 되돌아오며,
//! 그 사이 사용자가 다른 노트로 이동했으면 화면 상태를 건드리지 않습니다.

use crate::models::{Note, NoteVersion};
use crate::validation::MAX_ANNOTATION_LENGTH;

use super::{markdown, route};

/// 마지막 입력 후 자동 저장까지의 대기 시간
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 2_000;

/// 에디터가 아직 초기화되지 않았을 때 로드를 다시 시도할 지연
pub const EDITOR_RETRY_DELAY_MS: u64 = 100;

/// 저장 표시기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
    Error,
}

/// 본문 영역 표시 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Edit,
    Preview,
}

/// 사이드 패널에 열려 있는 목록
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidePanel {
    Notes,
    Versions,
}

/// 세션의 현재 국면
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// 열린 노트 없음
    Empty,
    /// 노트를 편집 중
    Editing { note_id: String, status: SaveStatus },
    /// 과거 버전 스냅샷을 읽기 전용으로 보는 중
    ViewingVersion { note_id: String, version_id: String },
    /// 방금 삭제됨. `title`은 복구 안내 문구에, `note_id`는 복구 요청에 씁니다.
    Deleted { note_id: String, title: String },
}

/// 상태 전이가 호스트(브라우저 셸)에 요구하는 일
///
/// 세션은 네트워크도 DOM도 직접 만지지 않습니다. 전이 메서드가 반환한
/// 효과를 호스트가 수행하고, 결과를 다시 세션에 알려주는 구조입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /api/notes` 로 목록 가져오기
    FetchNotes,
    /// `PUT /api/notes/{note_id}`
    SaveNote {
        note_id: String,
        title: String,
        content: String,
    },
    /// `DELETE /api/notes/{note_id}`
    DeleteNote { note_id: String },
    /// `POST /api/notes/{note_id}/restore`
    RestoreNote { note_id: String },
    /// `GET /api/versions/{version_id}`
    FetchVersion { version_id: String },
    /// `POST /api/versions/note/{note_id}`
    CreateVersion { note_id: String, annotation: String },
    /// `GET /api/versions/note/{note_id}` 로 버전 목록을 다시 가져오기
    RefreshVersions { note_id: String },
    /// `location.hash` 를 이 값으로 교체
    UpdateHash { hash: String },
    /// 에디터가 아직 없으니 `delay_ms` 뒤에 `load_note(note_id)` 재호출
    RetryLoad { note_id: String, delay_ms: u64 },
    /// 미리보기 영역에 넣을 HTML
    RenderPreview { html: String },
    /// 사용자에게 보여줄 알림
    Alert { message: String },
}

/// 에디터 세션.
///
/// 노트 목록과 현재 노트의 버전 목록을 캐시로 들고,
/// 제목/본문 입력 버퍼와 자동 저장 타이머를 관리합니다.
pub struct EditorSession {
    state: SessionState,
    mode: ViewMode,
    side_panel: SidePanel,
    /// 서버에서 받은 노트 목록 (최근 수정순)
    notes: Vec<Note>,
    /// 현재 노트의 버전 목록 (최신 번호 먼저)
    versions: Vec<NoteVersion>,
    title_buffer: String,
    content_buffer: String,
    /// 자동 저장이 발사될 시각. 입력이 올 때마다 뒤로 밀립니다.
    autosave_deadline_ms: Option<u64>,
    /// 진행 중인 저장이 겨냥한 노트 id. 하나만 허용합니다.
    save_in_flight: Option<String>,
    /// 마지막으로 저장이 확인된 시각 (서버의 updated_at)
    last_saved_at: Option<String>,
    editor_ready: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Empty,
            mode: ViewMode::Edit,
            side_panel: SidePanel::Notes,
            notes: Vec::new(),
            versions: Vec::new(),
            title_buffer: String::new(),
            content_buffer: String::new(),
            autosave_deadline_ms: None,
            save_in_flight: None,
            last_saved_at: None,
            editor_ready: false,
        }
    }

    // ── 호스트 이벤트 ──────────────────────────────────────────────

    /// 세션 시작. 로그인 확인 직후 호스트가 호출합니다.
    ///
    /// 남아 있던 화면 상태를 비우고 노트 목록을 요청합니다.
    /// 목록이 도착한 뒤 호스트가 현재 해시를 `hash_changed`로 넘기면
    /// 딥링크가 복원됩니다.
    pub fn start(&mut self) -> Vec<Effect> {
        self.clear();
        vec![Effect::FetchNotes]
    }

    /// 에디터 컴포넌트 초기화 완료 통지
    pub fn editor_initialized(&mut self) {
        self.editor_ready = true;
    }

    /// 서버에서 받은 노트 목록으로 캐시를 교체합니다.
    pub fn notes_loaded(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    /// 노트를 엽니다.
    ///
    /// 에디터가 아직 준비 전이면 잠시 뒤 재시도를 요청하고,
    /// 캐시에 없는 id면 아무 일도 하지 않습니다.
    /// 열기에 성공하면 대기 중이던 자동 저장 타이머는 취소되고
    /// 모드는 편집으로 돌아갑니다.
    pub fn load_note(&mut self, note_id: &str) -> Vec<Effect> {
        if !self.editor_ready {
            return vec![Effect::RetryLoad {
                note_id: note_id.to_string(),
                delay_ms: EDITOR_RETRY_DELAY_MS,
            }];
        }

        let Some(note) = self.notes.iter().find(|n| n.id == note_id).cloned() else {
            return Vec::new();
        };

        self.title_buffer = note.title;
        self.content_buffer = note.content;
        self.last_saved_at = Some(note.updated_at);
        self.autosave_deadline_ms = None;
        self.versions.clear();
        self.mode = ViewMode::Edit;
        self.state = SessionState::Editing {
            note_id: note.id,
            status: SaveStatus::Saved,
        };

        vec![Effect::UpdateHash {
            hash: route::note_hash(note_id),
        }]
    }

    /// 주소창 해시 변경 통지 (딥링크 진입, 뒤로/앞으로 이동)
    pub fn hash_changed(&mut self, hash: &str) -> Vec<Effect> {
        match route::parse_hash(hash) {
            Some(note_id) => {
                // 이미 그 노트를 편집 중이면 다시 로드하지 않습니다.
                let already_open = matches!(
                    &self.state,
                    SessionState::Editing { note_id: current, .. } if current == note_id
                );
                if already_open {
                    return Vec::new();
                }
                let note_id = note_id.to_string();
                self.load_note(&note_id)
            }
            None => {
                self.clear();
                Vec::new()
            }
        }
    }

    /// 빈 상태로 되돌립니다. (해시 제거, 로그아웃 직전)
    pub fn clear(&mut self) {
        self.state = SessionState::Empty;
        self.mode = ViewMode::Edit;
        self.title_buffer.clear();
        self.content_buffer.clear();
        self.versions.clear();
        self.autosave_deadline_ms = None;
        self.last_saved_at = None;
    }

    // ── 입력과 자동 저장 ──────────────────────────────────────────

    /// 제목 입력. 편집 중일 때만 반영됩니다.
    pub fn edit_title(&mut self, text: &str, now_ms: u64) {
        if let SessionState::Editing { status, .. } = &mut self.state {
            *status = SaveStatus::Unsaved;
            self.title_buffer = text.to_string();
            self.autosave_deadline_ms = Some(now_ms + AUTOSAVE_DEBOUNCE_MS);
        }
    }

    /// 본문 입력. 편집 중일 때만 반영됩니다.
    pub fn edit_content(&mut self, text: &str, now_ms: u64) {
        if let SessionState::Editing { status, .. } = &mut self.state {
            *status = SaveStatus::Unsaved;
            self.content_buffer = text.to_string();
            self.autosave_deadline_ms = Some(now_ms + AUTOSAVE_DEBOUNCE_MS);
        }
    }

    /// 자동 저장 타이머가 발사돼야 하는 시점인지
    pub fn autosave_due(&self, now_ms: u64) -> bool {
        self.autosave_deadline_ms
            .is_some_and(|deadline| now_ms >= deadline)
    }

    /// 자동 저장 발사.
    ///
    /// 타이머는 발사로 소모됩니다. 재무장은 다음 입력이 합니다.
    /// 이미 저장이 진행 중이면 건너뛰고, 발사 시점의 노트 id를 붙잡아
    /// 효과에 싣습니다. 제목은 앞뒤 공백을 걷어내고 비어 있으면
    /// "Untitled"로 대체합니다.
    pub fn autosave_fire(&mut self) -> Vec<Effect> {
        self.autosave_deadline_ms = None;

        if self.save_in_flight.is_some() {
            return Vec::new();
        }

        let SessionState::Editing { note_id, status } = &mut self.state else {
            return Vec::new();
        };

        *status = SaveStatus::Saving;
        let target = note_id.clone();
        self.save_in_flight = Some(target.clone());

        let title = self.title_buffer.trim();
        let title = if title.is_empty() { "Untitled" } else { title };

        vec![Effect::SaveNote {
            note_id: target,
            title: title.to_string(),
            content: self.content_buffer.clone(),
        }]
    }

    /// 저장 응답 처리. `note_id`는 발사 때 붙잡았던 대상입니다.
    ///
    /// 성공한 노트는 항상 목록 캐시에 병합하지만, 저장 표시기와
    /// `last_saved_at`은 사용자가 아직 같은 노트를 편집 중일 때만
    /// 갱신합니다. 느리게 도착한 응답이 다른 노트의 화면을 바꾸면
    /// 안 됩니다.
    pub fn save_completed(&mut self, note_id: &str, saved: Option<Note>) {
        if self.save_in_flight.as_deref() == Some(note_id) {
            self.save_in_flight = None;
        }

        match saved {
            Some(note) => {
                if let Some(entry) = self.notes.iter_mut().find(|n| n.id == note.id) {
                    *entry = note.clone();
                }
                if let SessionState::Editing { note_id: current, status } = &mut self.state {
                    if current == note_id {
                        *status = SaveStatus::Saved;
                        self.last_saved_at = Some(note.updated_at);
                    }
                }
            }
            None => {
                if let SessionState::Editing { note_id: current, status } = &mut self.state {
                    if current == note_id {
                        *status = SaveStatus::Error;
                    }
                }
            }
        }
    }

    // ── 삭제와 복구 ───────────────────────────────────────────────

    /// 현재 노트 삭제 요청. 확인 대화상자는 호스트가 띄운 뒤 호출합니다.
    pub fn delete_current(&self) -> Vec<Effect> {
        match &self.state {
            SessionState::Editing { note_id, .. } => vec![Effect::DeleteNote {
                note_id: note_id.clone(),
            }],
            _ => Vec::new(),
        }
    }

    /// 삭제 응답 처리. 성공하면 목록에서 빼고 복구 안내 화면으로 갑니다.
    pub fn delete_completed(&mut self, note_id: &str, success: bool) -> Vec<Effect> {
        if !success {
            return vec![Effect::Alert {
                message: "Failed to delete note".to_string(),
            }];
        }

        let title = self
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .map(|n| n.title.clone())
            .unwrap_or_else(|| self.title_buffer.clone());
        self.notes.retain(|n| n.id != note_id);

        if self.current_note_id() == Some(note_id) {
            self.autosave_deadline_ms = None;
            self.state = SessionState::Deleted {
                note_id: note_id.to_string(),
                title,
            };
        }

        Vec::new()
    }

    /// 방금 삭제한 노트의 복구 요청. Deleted 상태에서만 동작합니다.
    pub fn recover(&self) -> Vec<Effect> {
        match &self.state {
            SessionState::Deleted { note_id, .. } => vec![Effect::RestoreNote {
                note_id: note_id.clone(),
            }],
            _ => Vec::new(),
        }
    }

    /// 복구 응답 처리. 성공하면 목록 맨 앞에 되살리고 곧바로 이어서
    /// 편집합니다. 복구 안내 화면을 벗어난 뒤 도착한 응답은 목록에만
    /// 반영합니다.
    pub fn restore_completed(&mut self, restored: Option<Note>) -> Vec<Effect> {
        let Some(note) = restored else {
            return vec![Effect::Alert {
                message: "Failed to restore note".to_string(),
            }];
        };

        self.notes.insert(0, note.clone());

        let was_waiting = matches!(
            &self.state,
            SessionState::Deleted { note_id, .. } if *note_id == note.id
        );
        if was_waiting {
            self.title_buffer = note.title;
            self.content_buffer = note.content;
            self.last_saved_at = Some(note.updated_at);
            self.mode = ViewMode::Edit;
            self.state = SessionState::Editing {
                note_id: note.id,
                status: SaveStatus::Saved,
            };
        }

        Vec::new()
    }

    // ── 버전 ─────────────────────────────────────────────────────

    /// 과거 버전 열람 요청
    pub fn view_version(&self, version_id: &str) -> Vec<Effect> {
        if self.current_note_id().is_none() {
            return Vec::new();
        }
        vec![Effect::FetchVersion {
            version_id: version_id.to_string(),
        }]
    }

    /// 버전 스냅샷 도착. 그 사이 다른 노트로 이동했으면 버립니다.
    ///
    /// 열람 중에는 입력과 자동 저장이 모두 막히므로, 스냅샷이 현재
    /// 노트를 덮어쓸 일은 없습니다.
    pub fn version_loaded(&mut self, version: NoteVersion) {
        if self.current_note_id() != Some(version.note_id.as_str()) {
            return;
        }

        self.autosave_deadline_ms = None;
        self.title_buffer = version.title;
        self.content_buffer = version.content;
        self.mode = ViewMode::Edit;
        self.state = SessionState::ViewingVersion {
            note_id: version.note_id,
            version_id: version.id,
        };
    }

    /// 현재 내용을 버전으로 저장합니다. 버전 열람 중에는 만들 수 없습니다.
    pub fn create_version(&self, annotation: &str) -> Vec<Effect> {
        let SessionState::Editing { note_id, .. } = &self.state else {
            return Vec::new();
        };

        let annotation = annotation.trim();
        if annotation.is_empty() {
            return vec![Effect::Alert {
                message: "Annotation is required".to_string(),
            }];
        }
        if annotation.chars().count() > MAX_ANNOTATION_LENGTH {
            return vec![Effect::Alert {
                message: "Annotation must not exceed 500 characters".to_string(),
            }];
        }

        vec![Effect::CreateVersion {
            note_id: note_id.clone(),
            annotation: annotation.to_string(),
        }]
    }

    /// 버전 생성 응답. 성공하면 사이드 패널을 버전 목록으로 돌리고
    /// 목록을 다시 가져옵니다.
    pub fn version_created(&mut self, note_id: &str, success: bool) -> Vec<Effect> {
        if !success {
            return vec![Effect::Alert {
                message: "Failed to create version".to_string(),
            }];
        }
        if self.current_note_id() != Some(note_id) {
            return Vec::new();
        }

        self.side_panel = SidePanel::Versions;
        vec![Effect::RefreshVersions {
            note_id: note_id.to_string(),
        }]
    }

    /// 버전 목록 도착. 여전히 같은 노트를 보고 있을 때만 반영합니다.
    pub fn versions_loaded(&mut self, note_id: &str, versions: Vec<NoteVersion>) {
        if self.current_note_id() == Some(note_id) {
            self.versions = versions;
        }
    }

    // ── 표시 모드 ────────────────────────────────────────────────

    /// 편집 ↔ 미리보기 전환. 전환은 저장을 일으키지 않습니다.
    pub fn switch_mode(&mut self, mode: ViewMode) -> Vec<Effect> {
        self.mode = mode;
        match mode {
            ViewMode::Preview => vec![Effect::RenderPreview {
                html: markdown::render_preview(&self.content_buffer),
            }],
            ViewMode::Edit => Vec::new(),
        }
    }

    /// 사이드 패널 전환
    pub fn switch_panel(&mut self, panel: SidePanel) {
        self.side_panel = panel;
    }

    // ── 조회 ─────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn side_panel(&self) -> SidePanel {
        self.side_panel
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn versions(&self) -> &[NoteVersion] {
        &self.versions
    }

    pub fn title(&self) -> &str {
        &self.title_buffer
    }

    pub fn content(&self) -> &str {
        &self.content_buffer
    }

    pub fn last_saved_at(&self) -> Option<&str> {
        self.last_saved_at.as_deref()
    }

    pub fn autosave_deadline_ms(&self) -> Option<u64> {
        self.autosave_deadline_ms
    }

    /// 편집 입력을 받지 않는 상태인지 (버전 열람, 삭제 안내, 빈 화면)
    pub fn is_read_only(&self) -> bool {
        !matches!(self.state, SessionState::Editing { .. })
    }

    /// 저장 표시기에 보여줄 상태. 편집 중이 아니면 표시기를 숨깁니다.
    pub fn save_status(&self) -> Option<SaveStatus> {
        match &self.state {
            SessionState::Editing { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 지금 가리키고 있는 노트 id. Deleted 상태도 복구 대상을 가리킵니다.
    pub fn current_note_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Editing { note_id, .. }
            | SessionState::ViewingVersion { note_id, .. }
            | SessionState::Deleted { note_id, .. } => Some(note_id),
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
