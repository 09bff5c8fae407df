//! 투자자별 순매수 분석 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 일별/기간 랭킹 조회, 추세 분석, CSV 내보내기 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use flow_analytics::{RankingEngine, TrendAnalyzer};
use flow_api::openapi::swagger_ui_router;
use flow_api::routes::create_api_router;
use flow_api::state::AppState;
use flow_core::{init_logging, AppConfig, LogConfig, LogFormat, MarketDataSource};
use flow_data::{
    CachedNetPurchaseProvider, CsvFallback, KrxClient, PgNetPurchaseStore, PriceService,
    TradingCalendar,
};

/// AppState 초기화.
///
/// `DATABASE_URL`이 설정된 경우 1차 캐시 계층을 활성화하고,
/// 없으면 KRX 원격 조회와 로컬 CSV 폴백만으로 동작합니다.
async fn create_app_state(config: &AppConfig) -> AppState {
    let remote: Arc<dyn MarketDataSource> = Arc::new(KrxClient::new());
    let mut fetcher = CachedNetPurchaseProvider::new(
        Arc::clone(&remote),
        CsvFallback::new(&config.pipeline.fallback_dir),
    );

    // DB 연결 설정 (DATABASE_URL 환경변수에서)
    let mut db_pool = None;
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .connect(&database_url)
            .await
        {
            Ok(pool) => {
                // 연결 테스트
                if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                    info!("Connected to PostgreSQL successfully");

                    let store = PgNetPurchaseStore::new(pool.clone());
                    if let Err(e) = store.ensure_schema().await {
                        warn!(error = %e, "Failed to ensure cache schema, continuing anyway");
                    }
                    fetcher = fetcher.with_store(Arc::new(store));
                    db_pool = Some(pool);
                } else {
                    error!("Failed to verify database connection");
                }
            }
            Err(e) => {
                error!("Failed to connect to database: {}", e);
            }
        }
    } else {
        warn!("DATABASE_URL not set, cache tier will be disabled");
    }

    let fetcher = Arc::new(fetcher);
    let prices = Arc::new(PriceService::new(Arc::clone(&remote)).with_tuning(&config.pipeline));
    let ranking = Arc::new(
        RankingEngine::new(fetcher, Arc::clone(&prices), Arc::clone(&remote))
            .with_tuning(config.pipeline.clone()),
    );
    let trend = Arc::new(
        TrendAnalyzer::new(Arc::clone(&remote), prices).with_tuning(config.pipeline.clone()),
    );
    let calendar = Arc::new(TradingCalendar::new(remote).with_tuning(config.pipeline.clone()));

    let state = AppState::new(ranking, trend, calendar, config.pipeline.clone());
    match db_pool {
        Some(pool) => state.with_db_pool(pool),
        None => state,
    }
}

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
///
/// # 환경변수
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://dashboard.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            // 프로덕션: 특정 origin만 허용
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            // 개발: 모든 origin 허용
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        // 허용되는 HTTP 메서드
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        // 허용되는 헤더
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        // 자격 증명 포함 허용 (CORS_ORIGINS 설정 시에만)
        .allow_credentials(std::env::var("CORS_ORIGINS").is_ok())
        // preflight 요청 캐시 시간
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        // 요청 추적
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> anyhow::Result<()> {
    use flow_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec)?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // OpenAPI 내보내기 처리 (서버 시작 전)
    handle_export_openapi()?;

    // 설정 로드 (FLOW__* 환경변수 > config/default.toml > 기본값)
    let config = AppConfig::load_default()?;

    // tracing 초기화
    let format: LogFormat = config.logging.format.parse().unwrap_or_default();
    let log_config = LogConfig::new(&config.logging.level).with_format(format);
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting Investor Flow API server...");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // AppState 생성 (DB 연결 포함)
    let state = Arc::new(create_app_state(&config).await);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        fallback_dir = %state.tuning.fallback_dir,
        "Application state initialized"
    );

    // 라우터 생성
    let app = create_router(state);

    // 서버 시작
    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown 처리
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
