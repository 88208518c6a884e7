//! # notemark 웹 서버 진입점
//!
//! 이 파일은 notemark 애플리케이션의 **시작점(entry point)**입니다.
//! Rust 프로그램은 항상 `main()` 함수에서 실행이 시작됩니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성
//! 4. 데이터베이스 마이그레이션 실행
//! 5. 속도 제한기 생성과 주기적 정리 태스크 시작
//! 6. API 라우터 + 정적 파일 서빙 설정
//! 7. HTTP 서버 시작
//!
//! 실제 애플리케이션 로직은 전부 라이브러리 크레이트(lib.rs) 쪽에 있고,
//! 이 바이너리는 그것을 조립해 서버로 띄우는 역할만 합니다.

// ── 외부 크레이트 및 모듈에서 필요한 항목 가져오기 ──
// `use` 키워드는 다른 모듈의 항목을 현재 스코프로 가져옵니다.
// Python의 `from X import Y`와 비슷합니다.
use anyhow::Result; // anyhow::Result: 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use axum::Router; // 라우터: URL 경로와 핸들러를 연결하는 구조체
use notemark::config::Config; // 우리가 만든 설정 모듈
use notemark::error;
use notemark::middleware::rate_limit::{RateLimitPolicy, RateLimiter, SWEEP_INTERVAL_SECS};
use notemark::routes::{api_router, notes::AppState};
use sqlx::sqlite::SqlitePoolOptions; // SQLite 연결 풀 설정 옵션
use std::net::SocketAddr; // 클라이언트 주소 타입 (속도 제한 키로 사용)
use std::path::Path; // 파일 경로를 다루는 표준 라이브러리 타입
use std::sync::Arc; // 참조 카운트 스마트 포인터 (리미터를 태스크들과 공유)
use std::time::Duration;
use tower_http::{
    // tower-http: HTTP 미들웨어 모음 크레이트
    cors::{Any, CorsLayer},          // CORS(Cross-Origin Resource Sharing) 설정
    services::{ServeDir, ServeFile}, // 정적 파일 서빙 서비스
    trace::TraceLayer,               // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // 로깅 초기화 유틸리티

// #[tokio::main]: 비동기 런타임을 시작하는 **어트리뷰트 매크로**
// Rust의 main() 함수는 기본적으로 동기(sync)이므로,
// async/await를 사용하려면 비동기 런타임(Tokio)이 필요합니다.
// 이 매크로가 내부적으로 tokio 런타임을 생성하고 main을 그 안에서 실행합니다.
#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일에서 환경변수를 읽어옵니다. (예: DATABASE_URL, JWT_SECRET 등)
    // .ok()는 Result를 Option으로 변환하여, .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // tracing은 Rust 생태계의 표준 로깅 프레임워크입니다.
    // registry(): 로그 수집기를 만들고
    // .with(): 필터와 포맷터를 레이어처럼 쌓아올립니다 (데코레이터 패턴)
    tracing_subscriber::registry()
        .with(
            // EnvFilter: RUST_LOG 환경변수로 로그 레벨을 제어합니다.
            // 환경변수가 없으면 기본값으로 notemark, tower_http, axum 모듈을 debug 레벨로 설정
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notemark=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer()) // 로그를 터미널에 출력하는 포맷터 레이어
        .init(); // 전역 로거로 등록

    // ── 3단계: 설정 로딩 ──
    // Config::from_env()로 환경변수에서 설정을 읽어옵니다.
    // `?` 연산자: Result가 Err이면 즉시 함수에서 반환(에러 전파).
    //            Ok이면 내부 값을 꺼냅니다. try-catch 없이 에러를 처리하는 Rust의 방식입니다.
    let config = Config::from_env()?;
    tracing::info!("Starting notemark server on {}:{}", config.host, config.port);

    // 프로덕션에서는 500 응답 본문에 내부 에러 상세를 싣지 않습니다.
    error::expose_error_details(!config.is_production());

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 연결 풀(Connection Pool): 데이터베이스 연결을 미리 여러 개 만들어두고 재사용하는 패턴.
    // 매 요청마다 새 연결을 만들면 느리므로, 풀에서 빌려 쓰고 반환합니다.
    // .await: 비동기 작업이 완료될 때까지 기다립니다. (스레드를 블로킹하지 않음)
    let pool = SqlitePoolOptions::new()
        .max_connections(5) // 최대 5개의 동시 연결을 유지
        .connect(&config.database_url) // 데이터베이스에 연결 (비동기)
        .await?; // 연결 실패 시 에러 전파

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    // 마이그레이션: 데이터베이스 스키마(테이블 구조)를 코드로 관리하는 방법
    // sqlx::migrate!는 컴파일 타임에 ./migrations 폴더의 SQL 파일들을 포함시키는 매크로
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool) // 아직 실행되지 않은 마이그레이션만 순서대로 실행
        .await?;

    // ── 6단계: 속도 제한기 생성 ──
    // 인증 엔드포인트(15분에 5회)와 일반 API(1분에 100회)가
    // 서로 다른 창/한도를 쓰므로 리미터도 두 개를 따로 만듭니다.
    // Arc로 감싸 핸들러들과 아래 정리 태스크가 같은 인스턴스를 공유합니다.
    let auth_limiter = Arc::new(RateLimiter::new(RateLimitPolicy::auth()));
    let api_limiter = Arc::new(RateLimiter::new(RateLimitPolicy::api()));

    // 만료된 속도 제한 창을 주기적으로 청소하는 백그라운드 태스크.
    // tokio::spawn은 런타임에 새 비동기 태스크를 등록합니다 (스레드가 아님).
    {
        let auth_limiter = Arc::clone(&auth_limiter);
        let api_limiter = Arc::clone(&api_limiter);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                auth_limiter.sweep();
                api_limiter.sweep();
            }
        });
    }

    // ── 7단계: 애플리케이션 상태(State) 생성 ──
    // AppState: 모든 라우트 핸들러가 공유하는 데이터를 담는 구조체
    // Axum에서는 State를 통해 핸들러에 의존성을 주입합니다.
    // SqlitePool은 내부적으로 Arc를 사용하므로 clone해도 같은 풀을 가리킵니다.
    let state = AppState {
        pool: pool.clone(),
        jwt_secret: config.jwt_secret.clone(),
        auth_limiter,
        api_limiter,
    };

    // ── 8단계: 라우터 조립 ──
    // API 전체(/api/...)는 routes::api_router가 만들고,
    // 여기서는 /api 아래에 중첩시키고 정적 파일 서빙을 붙입니다.

    // CORS: 브라우저의 보안 정책. 다른 도메인에서의 API 호출을 허용/차단합니다.
    // 개발 환경에서는 Any(모두 허용)로 설정합니다.
    // 프로덕션에서는 특정 도메인만 허용해야 합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any) // 모든 출처(origin) 허용
        .allow_methods(Any) // 모든 HTTP 메서드 허용
        .allow_headers(Any); // 모든 헤더 허용

    // 브라우저 클라이언트 정적 파일이 있으면 같은 서버에서 서빙합니다.
    // SPA(Single Page Application)이므로, 찾을 수 없는 경로는 index.html로 돌려보냅니다.
    let public_dir = Path::new(&config.public_dir);
    let app = if public_dir.exists() {
        tracing::info!("Serving client files from {}", config.public_dir);

        // ServeDir: 디렉토리의 파일을 HTTP로 서빙하는 서비스
        // not_found_service: 파일을 찾지 못하면 index.html을 반환 (SPA 라우팅 지원)
        let serve_dir = ServeDir::new(public_dir)
            .not_found_service(ServeFile::new(public_dir.join("index.html")));

        Router::new()
            // .nest(): API 라우트를 /api 경로 아래에 중첩시킵니다.
            // 예: /notes → /api/notes
            .nest("/api", api_router(state))
            // .fallback_service(): API 경로에 매칭되지 않는 모든 요청은 클라이언트로 전달
            .fallback_service(serve_dir)
            // .layer(): 미들웨어를 추가합니다. 미들웨어는 요청/응답을 가로채서 처리합니다.
            .layer(cors)
            .layer(TraceLayer::new_for_http()) // HTTP 요청/응답 자동 로깅
    } else {
        // 클라이언트 빌드가 없으면 API만 서빙합니다.
        tracing::warn!("Public directory not found, serving API only");

        Router::new()
            .nest("/api", api_router(state))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    };

    // ── 9단계: 서버 시작 ──
    // TcpListener: TCP 연결을 수신 대기하는 소켓
    // .bind(): 지정된 주소에 바인딩 (해당 포트에서 요청 대기 시작)
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // into_make_service_with_connect_info: 각 요청에 클라이언트 TCP 주소를
    // 실어줍니다. 속도 제한 미들웨어가 이 주소를 식별 키로 사용합니다.
    // 이 줄에서 서버가 영원히 실행됩니다 (Ctrl+C로 종료할 때까지).
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    // Ok(()): 성공을 나타내는 Result 값. ()는 "빈 값"(unit 타입)입니다.
    Ok(())
}
