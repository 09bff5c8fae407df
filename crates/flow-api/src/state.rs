//! 애플리케이션 상태.
//!
//! 모든 핸들러가 공유하는 상태 컨테이너입니다. 엔진들은 `Arc`로 감싸
//! 요청 간에 공유되며 내부 가변 상태가 없으므로 락이 필요하지 않습니다.

use std::sync::Arc;

use flow_analytics::{RankingEngine, TrendAnalyzer};
use flow_core::PipelineTuning;
use flow_data::TradingCalendar;

/// 공유 애플리케이션 상태.
pub struct AppState {
    /// PostgreSQL 연결 풀 (없으면 캐시 계층 없이 동작)
    pub db_pool: Option<sqlx::PgPool>,
    /// 일별/기간 랭킹 엔진
    pub ranking: Arc<RankingEngine>,
    /// 추세 분석기
    pub trend: Arc<TrendAnalyzer>,
    /// 거래일 해석기
    pub calendar: Arc<TradingCalendar>,
    /// 파이프라인 튜닝 (폴백 디렉토리 등)
    pub tuning: PipelineTuning,
    /// 서버 시작 시각
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 애플리케이션 상태 생성.
    pub fn new(
        ranking: Arc<RankingEngine>,
        trend: Arc<TrendAnalyzer>,
        calendar: Arc<TradingCalendar>,
        tuning: PipelineTuning,
    ) -> Self {
        Self {
            db_pool: None,
            ranking,
            trend,
            calendar,
            tuning,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 데이터베이스 풀 설정.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        if let Some(pool) = &self.db_pool {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 애플리케이션 상태 생성.
///
/// 원격 호출 없이 구성만 하므로 파라미터 검증이나 헬스 체크처럼
/// 네트워크를 타지 않는 핸들러 테스트에 사용합니다.
pub fn create_test_state() -> AppState {
    use flow_core::MarketDataSource;
    use flow_data::{CachedNetPurchaseProvider, CsvFallback, KrxClient, PriceService};

    let tuning = PipelineTuning::default();
    let remote: Arc<dyn MarketDataSource> = Arc::new(KrxClient::new());
    let fetcher = Arc::new(CachedNetPurchaseProvider::new(
        Arc::clone(&remote),
        CsvFallback::new(&tuning.fallback_dir),
    ));
    let prices = Arc::new(PriceService::new(Arc::clone(&remote)));
    let ranking = Arc::new(RankingEngine::new(
        fetcher,
        Arc::clone(&prices),
        Arc::clone(&remote),
    ));
    let trend = Arc::new(TrendAnalyzer::new(Arc::clone(&remote), prices));
    let calendar = Arc::new(TradingCalendar::new(remote));

    AppState::new(ranking, trend, calendar, tuning)
}
