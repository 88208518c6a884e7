//! # 요청 속도 제한(Rate Limiting) 미들웨어
//!
//! 클라이언트(IP) 단위로 고정 윈도우(fixed window) 방식의 요청 횟수 제한을 겁니다.
//!
//! 동작 방식:
//! 1. 키(클라이언트 IP)별로 `count`와 `reset_at`(윈도우 만료 시각)을 기록합니다.
//! 2. 윈도우가 지났으면 카운터를 새로 시작합니다.
//! 3. 윈도우 안에서 `max_requests`에 도달한 뒤의 요청은 429로 거부하고,
//!    윈도우가 리셋될 때까지 남은 시간을 `Retry-After` 헤더(초, 올림)로 알려줍니다.
//!
//! 고정 윈도우의 한계: 윈도우 경계 직전/직후에 몰아치면 짧은 시간에
//! 최대 2배까지 통과할 수 있습니다. 인증 남용과 실수로 인한 폭주를 막는
//! 용도로는 충분해서 이 허용 오차를 그대로 둡니다. (정밀한 슬라이딩
//! 윈도우로 바꾸지 않습니다 — 테스트도 이 동작을 기준으로 작성돼 있습니다)
//!
//! 시간은 `Clock` 트레이트로 주입받습니다. 프로덕션은 `SystemClock`,
//! 테스트는 가짜 시계를 꽂아 윈도우 경계를 결정적으로 검증합니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::routes::notes::AppState;

/// 만료된 카운터 항목을 청소하는 주기(초). main에서 백그라운드 태스크로 돌립니다.
pub const SWEEP_INTERVAL_SECS: u64 = 300;

/// 현재 시각(epoch 기준 밀리초)을 제공하는 시계 추상화
///
/// 속도 제한 로직이 벽시계를 직접 읽지 않게 하여,
/// 테스트에서 시간을 마음대로 전진시킬 수 있습니다.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// 실제 시스템 시계
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // 시스템 시계가 epoch 이전이면(사실상 불가능) 0으로 취급합니다.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// 속도 제한 정책: 윈도우 길이, 허용 요청 수, 거부 시 안내 메시지
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub window_ms: u64,
    pub max_requests: u64,
    pub message: &'static str,
}

impl RateLimitPolicy {
    /// 인증 엔드포인트용: 15분에 5회
    /// 로그인/가입 시도는 무차별 대입 공격의 표적이라 훨씬 좁게 잡습니다.
    pub fn auth() -> Self {
        Self {
            window_ms: 15 * 60 * 1000,
            max_requests: 5,
            message: "Too many login attempts, please try again later",
        }
    }

    /// 일반 API 엔드포인트용: 1분에 100회
    pub fn api() -> Self {
        Self {
            window_ms: 60 * 1000,
            max_requests: 100,
            message: "Too many requests, please slow down",
        }
    }
}

/// check()의 판정 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// retry_after_secs: 윈도우 리셋까지 남은 시간(초, 올림)
    Deny { retry_after_secs: u64 },
}

/// 키 하나의 현재 윈도우 상태
struct Entry {
    count: u64,
    reset_at_ms: u64,
}

/// 고정 윈도우 카운터
///
/// 정책(프리셋)마다 인스턴스를 하나씩 만들어 각자 자기 카운터 맵을 가집니다.
/// 맵은 Mutex로 보호됩니다. 임계 구역이 해시맵 조회+증가 한 번이라
/// async 코드에서도 std Mutex로 충분합니다. (await를 건너 들고 있지 않음)
pub struct RateLimiter {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// 키 하나의 요청을 판정합니다.
    ///
    /// - 해당 키의 윈도우가 없거나 이미 지났으면: 새 윈도우를 열고 허용 (count = 1)
    /// - 윈도우 안에서 count가 이미 max에 도달했으면: 거부 (카운터는 더 늘리지 않음)
    /// - 아니면: count를 올리고 허용
    ///
    /// reset_at 시각 정각까지는 기존 윈도우로 취급합니다.
    pub fn check(&self, key: &str) -> Decision {
        let now = self.clock.now_ms();
        // Mutex가 독살(poisoned)됐더라도 카운터 맵은 단순 데이터라 그대로 복구해 씁니다.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(key) {
            Some(entry) if entry.reset_at_ms >= now => {
                if entry.count >= self.policy.max_requests {
                    let remaining_ms = entry.reset_at_ms.saturating_sub(now);
                    Decision::Deny {
                        retry_after_secs: remaining_ms.div_ceil(1000),
                    }
                } else {
                    entry.count += 1;
                    Decision::Allow
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        reset_at_ms: now + self.policy.window_ms,
                    },
                );
                Decision::Allow
            }
        }
    }

    /// 만료된 윈도우의 항목을 제거합니다.
    ///
    /// 항목은 요청이 올 때마다 지연 생성되므로, 주기적으로 청소하지 않으면
    /// 한 번 들렀다 떠난 클라이언트의 항목이 맵에 계속 쌓입니다.
    pub fn sweep(&self) {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.reset_at_ms >= now);
    }

    /// 현재 추적 중인 키 개수 (sweep 동작 확인용)
    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

// ── axum 미들웨어 ──
// middleware::from_fn_with_state로 라우터 그룹에 겹칩니다.
// 인증 계열과 일반 API 계열이 서로 다른 정책 인스턴스를 사용합니다.

/// 인증 엔드포인트(가입/로그인/토큰 갱신/비밀번호 변경)용 속도 제한
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    enforce(&state.auth_limiter, req, next).await
}

/// 일반 API용 속도 제한
pub async fn api_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state.api_limiter, req, next).await
}

async fn enforce(limiter: &RateLimiter, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    match limiter.check(&key) {
        Decision::Allow => next.run(req).await,
        Decision::Deny { retry_after_secs } => {
            tracing::warn!("Rate limit exceeded for {}", key);
            AppError::RateLimited {
                message: limiter.policy().message.to_string(),
                retry_after_secs,
            }
            .into_response()
        }
    }
}

/// 클라이언트 식별 키를 뽑아냅니다.
///
/// 프록시 뒤에 있을 수 있으므로 X-Forwarded-For의 첫 주소를 우선 사용하고,
/// 없으면 TCP 피어 주소, 그것도 없으면(테스트 등) "unknown"을 씁니다.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
