//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/ranking/daily` - 일별 순매수/순매도 Top-N
//! - `/api/ranking/aggregate` - 최근 N거래일 합산 Top-N
//! - `/api/analysis/trend` - 연속 순매수 / 신규 유입 분석
//! - `/api/export` - 일별 랭킹 CSV 다운로드

pub mod export;
pub mod health;
pub mod ranking;
pub mod trend;

pub use export::{export_router, ExportQuery};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use ranking::{ranking_router, AggregateRankingQuery, DailyRankingQuery};
pub use trend::{trend_router, TrendQuery};

use axum::http::StatusCode;
use axum::{Json, Router};
use std::str::FromStr;
use std::sync::Arc;

use flow_core::{InvestorClass, TradeDate};

use crate::error::{bad_request, ApiErrorResponse};
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/ranking", ranking_router())
        .nest("/api/analysis", trend_router())
        .nest("/api/export", export_router())
}

/// 투자자 구분 쿼리 파라미터 파싱. 생략 시 외국인.
pub(crate) fn parse_investor(
    raw: Option<&str>,
) -> Result<InvestorClass, (StatusCode, Json<ApiErrorResponse>)> {
    match raw {
        None => Ok(InvestorClass::Foreigner),
        Some(s) => InvestorClass::from_str(s).map_err(|_| {
            bad_request(
                "INVALID_INVESTOR",
                format!("알 수 없는 투자자 구분: {} (foreigner/individual/institution)", s),
            )
        }),
    }
}

/// 날짜 쿼리 파라미터 파싱. 생략 시 오늘(서울 기준).
pub(crate) fn parse_date(
    raw: Option<&str>,
) -> Result<TradeDate, (StatusCode, Json<ApiErrorResponse>)> {
    match raw {
        None => Ok(TradeDate::today_seoul()),
        Some(s) => TradeDate::parse(s)
            .map_err(|e| bad_request("INVALID_DATE", format!("잘못된 날짜 형식: {}", e))),
    }
}
